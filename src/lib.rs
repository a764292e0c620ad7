//! eventbank Library
//!
//! Event-sourced bank account ledger: append-only event storage, aggregate
//! reconstruction by replay, command validation, two-step transfers, and
//! point-in-time queries, exposed over HTTP for the account UI.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod event_store;
pub mod handlers;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use domain::{AccountEvent, Amount, AmountError, Balance};
