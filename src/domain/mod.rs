//! Domain layer for the claw control center
//!
//! This module contains core business logic and domain models.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
