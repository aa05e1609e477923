//! # roomie-core
//!
//! Core crate for Roomie. Contains configuration schemas, typed
//! identifiers, the profile search filter record, profile summaries,
//! pagination types, the cache store trait, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Roomie crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
