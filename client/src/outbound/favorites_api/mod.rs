//! Backend favorites API adapter.
//!
//! This module provides a thin HTTP implementation of the `RemoteFavorites`
//! port.

mod dto;
mod http_source;

pub use http_source::HttpFavoritesApi;
