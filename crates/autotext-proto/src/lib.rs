//! Shared model and view-model for the autotext lead queue.
//!
//! Everything here is independent of the terminal: the dashboard binary and
//! the message-log service both build on it.

pub mod classify;
pub mod client;
pub mod config;
pub mod countdown;
pub mod error;
pub mod lead;
pub mod message_log;
pub mod platform;
pub mod queue;
pub mod schedule;
