//! Shared types for the M-Pesa client crates

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
