#![deny(missing_docs)]
//! Wikipedia lookup bot for Telegram.
//!
//! Answers inline queries and direct messages with article summaries, serving
//! long summaries in chunks behind a "more" button.

/// Telegram handlers and views.
pub mod bot;
/// Configuration management.
pub mod config;
/// Per-user reading cursors.
pub mod pagination;
/// Telegram runtime entrypoint.
pub mod runner;
/// Utility functions.
pub mod utils;
/// Encyclopedia lookup.
pub mod wiki;

/// Mock providers for unit tests.
#[cfg(test)]
pub mod testing;
