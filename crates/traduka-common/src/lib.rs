//! Common utilities shared by the Traduka translation layer

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{Result, TradukaError};
pub use logging::{init_default_logging, init_logging, init_test_logging, LoggingConfig};
