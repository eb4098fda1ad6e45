pub mod core;

pub use core::CoreError;

/// Result alias used across the container
pub type CoreResult<T> = Result<T, CoreError>;
