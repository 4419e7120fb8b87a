//! # Tether Config
//!
//! Configuration file management for the Tether host application.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{
    ConfigValidator, FAILURE_POLICIES, ValidationError, ValidationResult, ValidationWarning,
};
