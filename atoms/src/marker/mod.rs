pub mod service;

pub use service::{annotate, overlay_input_text};
