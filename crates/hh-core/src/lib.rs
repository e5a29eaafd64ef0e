//! Core domain + command handling for the Hyphen-ated helper bot.
//!
//! This crate is intentionally framework-agnostic. Discord lives behind the
//! `ChatGateway` port implemented in the adapter crate.

pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod moderation;
pub mod replies;
pub mod security;

pub use errors::{Error, Result};
