//! Command Handlers module
//!
//! Command handlers validate business rules against freshly loaded
//! aggregate state and append the resulting events. A handler's
//! load → validate → append sequence is one logical transaction per
//! aggregate: the optimistic-concurrency check on append guarantees
//! at most one winner per version, and the loser retries from a fresh
//! load.

mod account_handler;
mod commands;
mod transfer_handler;


pub use account_handler::{
    CloseAccountHandler, DepositHandler, OpenAccountHandler, WithdrawHandler,
};
pub use commands::*;
pub use transfer_handler::TransferHandler;

/// Maximum load → validate → append attempts before giving up on a
/// conflicted stream
pub(crate) const MAX_APPEND_RETRIES: u32 = 3;

/// Exponential backoff before retrying a conflicted append
pub(crate) fn retry_delay(attempt: u32) -> std::time::Duration {
    std::time::Duration::from_millis(50 * (attempt as u64 + 1))
}
