#![deny(missing_docs)]
//! Uplink Bot
//!
//! A Telegram bot that accepts a direct download URL in a private chat,
//! streams the remote file to local storage, and re-uploads it to the chat
//! as a document, enforcing a configurable size limit.

/// Command and message handlers
pub mod bot;
/// Configuration management
pub mod config;
/// Streaming HTTP fetcher and filename handling
pub mod download;
/// The download-then-upload pipeline for one submitted link
pub mod pipeline;
