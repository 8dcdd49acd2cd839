//! In-process messaging between popups, the background hub and the browser.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  Request / Response   ┌──────────────────────┐
//! │  Client      │──────────────────────►│  Hub event loop      │
//! │  (popup)     │◄──────────────────────│                      │
//! └──────────────┘                       │  CaptureSession-     │
//! ┌──────────────┐  ListenerControl      │  Manager             │
//! │  Port        │──────────────────────►│                      │
//! │  (popup)     │  drop = disconnect    │  TabController ──────┼──► browser
//! └──────────────┘                       └──────────▲───────────┘
//!                                        tab events │
//!                                              browser
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `hub` | Event loop and [`TabController`] seam |
//! | `client` | Request client with timeout |
//! | `port` | Duplex port with disconnect on drop |

// ============================================================================
// Submodules
// ============================================================================

/// Request client.
pub mod client;

/// Background hub and event loop.
pub mod hub;

/// Duplex popup port.
pub mod port;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::Client;
pub use hub::{Hub, TabController};
pub use port::Port;
