//! Core domain + application logic for the YouTube DM-alert bot.
//!
//! This crate is intentionally framework-agnostic. Discord and the feed
//! endpoint live behind ports (traits) implemented in adapter crates.

pub mod alerting;
pub mod config;
pub mod domain;
pub mod errors;
pub mod fanout;
pub mod feed;
pub mod logging;
pub mod messaging;
pub mod poller;
pub mod presence;
pub mod store;
pub mod subscription;

pub use errors::{Error, Result};
