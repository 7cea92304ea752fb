pub mod error;
pub mod logging;

pub use error::{BatchError, BatchResult, ConfigError};
pub use logging::{setup_logging, LogFormat, LoggingConfig};
