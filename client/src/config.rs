//! Client configuration loaded via OrthoConfig.

use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::domain::DEFAULT_REMOTE_TIMEOUT;

const DEFAULT_STORAGE_DIR: &str = ".marketplace";

/// Configuration values for the favorites client.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MARKETPLACE")]
pub struct ClientSettings {
    /// Base URL of the backend API, e.g. `https://api.example.test/api`.
    pub api_base_url: Option<String>,
    /// Per-request timeout for backend calls, in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Directory holding persisted favorites and session keys.
    pub storage_dir: Option<String>,
    /// Bearer token overriding the one persisted at login.
    pub bearer_token: Option<String>,
}

/// Errors raised when configured values are unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// `api_base_url` is not an absolute `http` or `https` URL.
    #[error("api_base_url {value:?} is not a valid http(s) URL: {message}")]
    InvalidBaseUrl {
        /// Offending value.
        value: String,
        /// Parser or scheme diagnostic.
        message: String,
    },
}

impl ClientSettings {
    /// Return the parsed backend base URL, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidBaseUrl`] when the value does not parse
    /// or uses a scheme other than `http`/`https`.
    pub fn api_base_url(&self) -> Result<Option<Url>, SettingsError> {
        let Some(raw) = self
            .api_base_url
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
        else {
            return Ok(None);
        };
        let invalid = |message: String| SettingsError::InvalidBaseUrl {
            value: raw.to_owned(),
            message,
        };
        let url = Url::parse(raw).map_err(|error| invalid(error.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(Some(url)),
            other => Err(invalid(format!("unsupported scheme {other}"))),
        }
    }

    /// Return the configured request timeout, falling back to the default.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_REMOTE_TIMEOUT, Duration::from_secs)
    }

    /// Return the configured storage directory, falling back to the default.
    pub fn storage_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.storage_dir.as_deref().unwrap_or(DEFAULT_STORAGE_DIR))
    }

    /// Return the configured bearer token override, ignoring blank values.
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for client configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 4] = [
        "MARKETPLACE_API_BASE_URL",
        "MARKETPLACE_REQUEST_TIMEOUT_SECS",
        "MARKETPLACE_STORAGE_DIR",
        "MARKETPLACE_BEARER_TOKEN",
    ];

    fn load_from_empty_args() -> ClientSettings {
        ClientSettings::load_from_iter([OsString::from("favorites")]).expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.api_base_url(), Ok(None));
        assert_eq!(settings.request_timeout(), DEFAULT_REMOTE_TIMEOUT);
        assert_eq!(settings.storage_dir(), Utf8PathBuf::from(DEFAULT_STORAGE_DIR));
        assert_eq!(settings.bearer_token(), None);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("MARKETPLACE_API_BASE_URL", Some("https://api.test/api".to_owned())),
            ("MARKETPLACE_REQUEST_TIMEOUT_SECS", Some("3".to_owned())),
            ("MARKETPLACE_STORAGE_DIR", Some("/tmp/marketplace".to_owned())),
            ("MARKETPLACE_BEARER_TOKEN", Some("t0k3n".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.api_base_url().expect("valid URL").map(String::from),
            Some("https://api.test/api".to_owned())
        );
        assert_eq!(settings.request_timeout(), Duration::from_secs(3));
        assert_eq!(settings.storage_dir(), Utf8PathBuf::from("/tmp/marketplace"));
        assert_eq!(settings.bearer_token(), Some("t0k3n"));
    }

    #[rstest]
    #[case::not_a_url("api.test")]
    #[case::wrong_scheme("ftp://api.test")]
    fn invalid_base_urls_are_reported(#[case] raw: &str) {
        let settings = ClientSettings {
            api_base_url: Some(raw.to_owned()),
            request_timeout_secs: Some(0),
            storage_dir: None,
            bearer_token: Some("  ".to_owned()),
        };
        assert!(matches!(
            settings.api_base_url(),
            Err(SettingsError::InvalidBaseUrl { .. })
        ));
        assert_eq!(settings.request_timeout(), DEFAULT_REMOTE_TIMEOUT);
        assert_eq!(settings.bearer_token(), None);
    }
}
