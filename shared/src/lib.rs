pub mod config;
pub mod error;
pub mod images;
pub mod state;
pub mod types;

pub use config::AppConfig;
pub use error::ApiError;
pub use images::EncodedImage;
pub use state::AppState;
pub use types::{Provider, Viewport};
