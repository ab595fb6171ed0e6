//! Core domain + application logic for the channel mirror bot.
//!
//! This crate is framework-agnostic. Telegram and the translation backend
//! live behind ports (traits) implemented in adapter crates.

pub mod channels;
pub mod cleaner;
pub mod config;
pub mod dedupe;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod filter;
pub mod formatting;
pub mod logging;
pub mod ports;
pub mod translator;
pub mod utils;

pub use errors::{Error, Result};
