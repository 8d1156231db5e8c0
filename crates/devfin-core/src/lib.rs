pub mod debt;
pub mod error;
pub mod scenario;
pub mod simulation;
pub mod time_value;
pub mod types;

pub use error::DevFinError;
pub use types::*;

/// Standard result type for all devfin operations
pub type DevFinResult<T> = Result<T, DevFinError>;
