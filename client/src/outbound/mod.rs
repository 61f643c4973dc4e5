//! Outbound adapters implementing the domain ports.

pub mod favorites_api;
pub mod notices;
pub mod storage;
