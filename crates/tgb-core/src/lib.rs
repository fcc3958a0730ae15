//! Core of the Telegram home-chat bridge.
//!
//! This crate is framework-agnostic. Telegram lives behind the ports in
//! [`messaging::port`], implemented in `tgb-telegram`; the UIs live in the `tgb` binary.

pub mod bridge;
pub mod clipboard;
pub mod config;
pub mod domain;
pub mod errors;
pub mod history;
pub mod listener;
pub mod logging;
pub mod messaging;

pub use errors::{Error, Result};
