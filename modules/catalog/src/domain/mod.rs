pub mod error;
pub mod model;
pub mod service;

pub use service::DEFAULT_LIMIT;
