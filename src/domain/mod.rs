//! Domain module
//!
//! Core domain types and business logic.

pub mod amount;
pub mod events;

pub use amount::{Amount, AmountError, Balance};
pub use events::AccountEvent;
