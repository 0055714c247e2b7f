pub mod constants;
pub mod error;
pub mod status;
pub mod types;

pub use error::{Error, Result};
pub use status::StatusCode;
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
