#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

//! Send one transactional email through Resend or Postmark.
//!
//! Built to run as a single CI step: configuration comes from the
//! environment, one request is made, and failures are reported as
//! `::error::` lines.

pub mod client;
pub mod config;
pub mod message;
pub mod providers;

// Re-export the main types for convenience
pub use client::{EmailClient, SendError, report};
pub use config::{Config, Credentials};
pub use message::OutgoingMessage;
pub use providers::{EmailTransport, ProviderKind, Receipt};
