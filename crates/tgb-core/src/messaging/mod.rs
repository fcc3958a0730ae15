//! Messenger abstractions: the outbound session port and the inbound update source.

pub mod port;
pub mod types;
