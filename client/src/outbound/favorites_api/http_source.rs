//! Reqwest-backed favorites API adapter.
//!
//! This adapter owns transport details only: endpoint construction, bearer
//! authentication, timeout and HTTP error mapping, and JSON decoding into
//! domain entries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{ErrorBodyDto, FavoritesListDto, ToggleRequestDto, ToggleResponseDto};
use crate::domain::ports::{RemoteFavorites, RemoteFavoritesError};
use crate::domain::{EntityId, FavoriteEntry, FavoriteKind};

const FETCH_FAILED: &str = "Failed to load favorites";
const TOGGLE_FAILED: &str = "Failed to update favorite";

/// Favorites API adapter talking to one backend base URL.
pub struct HttpFavoritesApi {
    client: Client,
    base_url: Url,
    bearer_token: Option<Zeroizing<String>>,
}

impl HttpFavoritesApi {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            bearer_token: None,
        })
    }

    /// Attach `token` as the `Authorization: Bearer` credential.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.bearer_token = (!token.trim().is_empty()).then(|| Zeroizing::new(token));
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteFavoritesError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                RemoteFavoritesError::transport(format!(
                    "base URL {} cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorise(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token.as_str()),
            None => request,
        }
    }
}

impl std::fmt::Debug for HttpFavoritesApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFavoritesApi")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.bearer_token.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RemoteFavorites for HttpFavoritesApi {
    async fn fetch_favorites(
        &self,
        kind: FavoriteKind,
    ) -> Result<Vec<FavoriteEntry>, RemoteFavoritesError> {
        let mut url = self.endpoint(&["favorites"])?;
        url.query_pairs_mut().append_pair("type", kind.as_remote_str());
        let response = self
            .authorise(self.client.get(url))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref(), FETCH_FAILED));
        }

        let decoded: FavoritesListDto = serde_json::from_slice(body.as_ref()).map_err(|error| {
            RemoteFavoritesError::decode(format!("invalid favorites list payload: {error}"))
        })?;
        let entries = decoded.into_domain_entries(kind);
        debug!(kind = %kind, count = entries.len(), "fetched remote favorites");
        Ok(entries)
    }

    async fn toggle(&self, id: &EntityId, kind: FavoriteKind) -> Result<bool, RemoteFavoritesError> {
        let url = self.endpoint(&["favorites", "toggle"])?;
        let response = self
            .authorise(self.client.post(url))
            .json(&ToggleRequestDto {
                item_id: id.as_str(),
                item_type: kind.as_remote_str(),
            })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref(), TOGGLE_FAILED));
        }

        let decoded: ToggleResponseDto = serde_json::from_slice(body.as_ref()).map_err(|error| {
            RemoteFavoritesError::decode(format!("invalid toggle payload: {error}"))
        })?;
        decoded
            .favorited()
            .ok_or_else(|| RemoteFavoritesError::decode("toggle payload lacks `favorited`"))
    }
}

fn map_transport_error(error: reqwest::Error) -> RemoteFavoritesError {
    if error.is_timeout() {
        RemoteFavoritesError::timeout(error.to_string())
    } else {
        RemoteFavoritesError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8], fallback: &str) -> RemoteFavoritesError {
    let message = serde_json::from_slice::<ErrorBodyDto>(body)
        .unwrap_or_default()
        .into_message()
        .unwrap_or_else(|| fallback.to_owned());

    match status {
        StatusCode::UNAUTHORIZED => RemoteFavoritesError::unauthorized(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            RemoteFavoritesError::timeout(message)
        }
        _ => RemoteFavoritesError::rejected(status.as_u16(), message),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network mapping helpers.

    use super::*;
    use rstest::rstest;

    fn api(base: &str) -> HttpFavoritesApi {
        let base = Url::parse(base).expect("fixture URL");
        HttpFavoritesApi::new(base, Duration::from_secs(1)).expect("client builds")
    }

    #[rstest]
    #[case::bare_host("http://api.test", "http://api.test/favorites/toggle")]
    #[case::prefix("http://api.test/api", "http://api.test/api/favorites/toggle")]
    #[case::trailing_slash("http://api.test/api/", "http://api.test/api/favorites/toggle")]
    fn endpoints_extend_the_base_path(#[case] base: &str, #[case] expected: &str) {
        let url = api(base)
            .endpoint(&["favorites", "toggle"])
            .expect("endpoint builds");
        assert_eq!(url.as_str(), expected);
    }

    #[test]
    fn opaque_base_urls_are_rejected() {
        let error = api("mailto:ops@example.test")
            .endpoint(&["favorites"])
            .expect_err("opaque URL cannot carry a path");
        assert!(matches!(error, RemoteFavoritesError::Transport { .. }));
    }

    #[test]
    fn blank_bearer_tokens_are_ignored() {
        let api = api("http://api.test").with_bearer_token("   ");
        assert!(api.bearer_token.is_none());
    }

    #[rstest]
    #[case::backend_message(
        StatusCode::NOT_FOUND,
        br#"{"success":false,"message":"Item not found"}"#.as_slice(),
        RemoteFavoritesError::rejected(404_u16, "Item not found")
    )]
    #[case::non_json_body(
        StatusCode::BAD_GATEWAY,
        b"<html>bad gateway</html>".as_slice(),
        RemoteFavoritesError::rejected(502_u16, TOGGLE_FAILED)
    )]
    #[case::unauthorized(
        StatusCode::UNAUTHORIZED,
        br#"{"message":"Token expired"}"#.as_slice(),
        RemoteFavoritesError::unauthorized("Token expired")
    )]
    #[case::gateway_timeout(
        StatusCode::GATEWAY_TIMEOUT,
        b"".as_slice(),
        RemoteFavoritesError::timeout(TOGGLE_FAILED)
    )]
    fn status_errors_prefer_the_backend_message(
        #[case] status: StatusCode,
        #[case] body: &[u8],
        #[case] expected: RemoteFavoritesError,
    ) {
        assert_eq!(map_status_error(status, body, TOGGLE_FAILED), expected);
    }
}
