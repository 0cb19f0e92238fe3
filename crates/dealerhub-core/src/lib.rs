//! # dealerhub-core
//!
//! Core crate for DealerHub. Contains configuration schemas, typed
//! identifiers, and the unified error system shared by every other crate
//! of the notification pipeline.
//!
//! This crate has **no** internal dependencies on other DealerHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
