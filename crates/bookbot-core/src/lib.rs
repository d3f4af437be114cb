//! Core domain + application logic for the book catalog Telegram bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the catalog
//! HTTP API live behind ports (traits) implemented in adapter crates.

pub mod analytics;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod delivery;
pub mod domain;
pub mod errors;
pub mod filename;
pub mod logging;
pub mod messaging;
pub mod pagination;
pub mod search;
pub mod settings;
pub mod strings;
pub mod text;
pub mod utils;

pub use errors::{Error, Result};
