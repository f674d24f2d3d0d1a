//! Shared building blocks for the Dear Loved One workspace: configuration,
//! the top-level error type, id and timestamp helpers, and input validation
//! used by every layer that accepts user-supplied values.

pub mod config;
pub mod error;
pub mod time;
pub mod types;
pub mod validate;

pub use config::DloConfig;
pub use error::{DloError, Result};
