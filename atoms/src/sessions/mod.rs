// Re-export model types and service functions
pub mod http;
pub mod model;
pub mod service;

pub use model::{
    ClickClassification, ClickEvent, ClickKind, Confidence, InputFieldRegion, NavigationHint,
    Session, SessionState,
};
pub use service::*;
