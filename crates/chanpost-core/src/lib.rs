//! Core domain + application logic for the chanpost channel-posting bot.
//!
//! This crate is intentionally framework-agnostic. Telegram lives behind
//! ports (traits) implemented in the adapter crate.

pub mod audit;
pub mod buttons;
pub mod config;
pub mod domain;
pub mod draft;
pub mod errors;
pub mod formatting;
pub mod limiter;
pub mod logging;
pub mod messaging;
pub mod publisher;
pub mod security;

pub use errors::{Error, Result};
