//! facturas-core: Shared infrastructure for the facturas workspace.
pub mod config;
pub mod error;
pub mod observability;
pub mod retry;

pub use error::{AppError, FieldViolation, Violations};
