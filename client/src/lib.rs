//! Client-side core of the house and job marketplace.
//!
//! The crate keeps a locally persisted favorites set consistent with
//! optimistic UI updates and an optional remote favorites API, and decodes the
//! obfuscated role token issued at login so callers can gate affordances.
//!
//! - [`domain`] holds entity types, ports, and the services built on them.
//! - [`outbound`] provides adapters for the ports (file and memory stores,
//!   the reqwest favorites API, the notice queue).
//! - [`config`] loads [`config::ClientSettings`] through `ortho_config`.
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

pub mod config;
pub mod domain;
pub mod outbound;

pub use config::{ClientSettings, SettingsError};
