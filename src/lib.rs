//! Passrot: scheduled password rotation for protected content items.
//!
//! Each item in the encrypted catalog may carry a rotation interval in days.
//! An hourly job picks the items whose due date has passed, gives each a fresh
//! random password, re-arms its due date and notifies the configured recipient.
//! Operators can also rotate every protected item at once.
//!
//! The CLI is gated behind the `cli` feature and is private to the binary.
//!
//! # Quick start
//!
//! ```no_run
//! use passrot::api::PassrotClient;
//!
//! let client = PassrotClient::with_passphrase("my-catalog-passphrase")?;
//! client.init()?;
//! let id = client.add_item("Members area", "hunter2", Some("7"))?;
//! let outcome = client.tick()?;
//! println!("{:?} / item {}", outcome, id);
//! # Ok::<(), passrot::error::PassrotError>(())
//! ```

pub mod api;
pub mod audit;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod interval;
pub mod notify;
pub mod rotation;
pub mod schedule;
pub mod selector;
pub mod store;
pub mod trigger;
pub mod types;
