pub mod http;
pub mod service;
pub mod types;
