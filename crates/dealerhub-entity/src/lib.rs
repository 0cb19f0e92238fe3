//! # dealerhub-entity
//!
//! Domain entity models for the DealerHub notification pipeline. Every
//! struct in this crate represents a database table row or a domain value
//! object. Database entities additionally derive `sqlx::FromRow`.

pub mod device;
pub mod notification;
pub mod permission;
pub mod push;
pub mod user;
