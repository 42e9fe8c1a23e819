//! # kisslight
//!
//! Command-line client for a kiss-light home-automation hub:
//! - Line protocol codec (`VERB ARGS... KL/<major>.<minor>`)
//! - RF code learning with ON/OFF pair derivation
//! - One short-lived TCP session per command
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        CLI (clap)                            │
//! │              (parsed once into a Command value)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       HubClient                              │
//! │            (per-verb success / rejection rules)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Learning  │          │  Protocol   │
//!   │   (SNIFF)   │─────────▶│   Codec     │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   Session   │
//!                           │ (TCP, Q on  │
//!                           │    drop)    │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod learn;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KlError, Result};
pub use config::Config;
pub use client::HubClient;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kisslight
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
