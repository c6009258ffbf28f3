//! Client settings and the external configuration-store collaborator.
//!
//! [`ClientSettings`] controls endpoints and timeouts; [`ConfigStore`] is the
//! host application's credential storage, consumed but never implemented by
//! the core (an in-memory implementation is provided for embedding and
//! tests).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

use crate::auth::Credentials;
use crate::error::{Error, Result};

/// Default base URL of the cloud API.
pub const CLOUD_API: &str = "https://api.ionos.com/cloudapi/v6/";

/// Default base URL of the token-issuing auth API.
pub const AUTH_API: &str = "https://api.ionos.com/auth/v1/";

/// Settings for a [`crate::client::CloudClient`] instance.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClientSettings {
    /// Cloud API base URL (relative request paths are joined onto it).
    #[validate(url)]
    #[serde(default = "default_cloud_api")]
    pub cloud_api: String,

    /// Auth API base URL used for token generation.
    #[validate(url)]
    #[serde(default = "default_auth_api")]
    pub auth_api: String,

    /// Connect timeout in seconds; 0 leaves the connect unbounded.
    #[validate(range(min = 0, max = 300))]
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Overall per-request deadline in seconds; 0 disables it.
    #[validate(range(min = 0, max = 600))]
    #[serde(default = "default_request_deadline_secs")]
    pub request_deadline_secs: u64,

    /// Value of the `User-Agent` request header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Contract number sent as `X-Contract-Number` on token generation,
    /// required for accounts holding multiple contracts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_number: Option<String>,

    /// Renewal lookahead: a token expiring within this many months is
    /// regenerated at client construction.
    #[validate(range(min = 0, max = 12))]
    #[serde(default = "default_token_lookahead_months")]
    pub token_lookahead_months: u32,
}

fn default_cloud_api() -> String {
    CLOUD_API.to_string()
}

fn default_auth_api() -> String {
    AUTH_API.to_string()
}

const fn default_connect_timeout_secs() -> u64 {
    2
}

const fn default_request_deadline_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("ionoscloud-rs/", env!("CARGO_PKG_VERSION")).to_string()
}

const fn default_token_lookahead_months() -> u32 {
    2
}

impl ClientSettings {
    /// Create settings pointing at the production endpoints.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cloud_api: default_cloud_api(),
            auth_api: default_auth_api(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_deadline_secs: default_request_deadline_secs(),
            user_agent: default_user_agent(),
            contract_number: None,
            token_lookahead_months: default_token_lookahead_months(),
        }
    }

    /// Override the cloud API base URL.
    #[must_use]
    pub fn with_cloud_api(mut self, url: impl Into<String>) -> Self {
        self.cloud_api = url.into();
        self
    }

    /// Override the auth API base URL.
    #[must_use]
    pub fn with_auth_api(mut self, url: impl Into<String>) -> Self {
        self.auth_api = url.into();
        self
    }

    /// Set the connect timeout in seconds (0 = unbounded).
    #[must_use]
    pub const fn with_connect_timeout(mut self, seconds: u64) -> Self {
        self.connect_timeout_secs = seconds;
        self
    }

    /// Set the overall request deadline in seconds (0 = disabled).
    #[must_use]
    pub const fn with_request_deadline(mut self, seconds: u64) -> Self {
        self.request_deadline_secs = seconds;
        self
    }

    /// Set the contract number for token generation.
    #[must_use]
    pub fn with_contract_number(mut self, number: impl Into<String>) -> Self {
        self.contract_number = Some(number.into());
        self
    }

    /// Set the token renewal lookahead in months.
    #[must_use]
    pub const fn with_token_lookahead(mut self, months: u32) -> Self {
        self.token_lookahead_months = months;
        self
    }

    /// Connect timeout as a [`Duration`], `None` when unbounded.
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_secs > 0).then(|| Duration::from_secs(self.connect_timeout_secs))
    }

    /// Overall request deadline as a [`Duration`], `None` when disabled.
    #[must_use]
    pub fn request_deadline(&self) -> Option<Duration> {
        (self.request_deadline_secs > 0).then(|| Duration::from_secs(self.request_deadline_secs))
    }

    /// Parse and validate the cloud API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL cannot be parsed.
    pub fn cloud_api_url(&self) -> Result<Url> {
        parse_base_url(&self.cloud_api)
    }

    /// Parse and validate the auth API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL cannot be parsed.
    pub fn auth_api_url(&self) -> Result<Url> {
        parse_base_url(&self.auth_api)
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a base URL, forcing a trailing slash so `Url::join` appends
/// instead of replacing the last path segment.
fn parse_base_url(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized).map_err(|e| Error::Config(format!("invalid base URL '{raw}': {e}")))
}

/// Credential storage collaborator provided by the host application.
///
/// The core reads credentials once at construction and writes back through
/// [`ConfigStore::save`] when a token is issued or renewed (token stored,
/// password erased).
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read the stored credential set.
    async fn read(&self) -> Result<Credentials>;

    /// Persist one credential value; `None` erases the entry.
    async fn save(&self, key: &str, value: Option<String>) -> Result<()>;
}

/// Credential store keys used by the core.
pub mod store_keys {
    /// Username entry.
    pub const USERNAME: &str = "username";
    /// Password entry.
    pub const PASSWORD: &str = "password";
    /// Bearer token entry.
    pub const TOKEN: &str = "token";
}

/// In-memory [`ConfigStore`], for embedding without persistent storage and
/// for tests.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryConfigStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the given credentials.
    #[must_use]
    pub fn with_credentials(credentials: &Credentials) -> Self {
        let mut values = HashMap::new();
        if let Some(username) = &credentials.username {
            values.insert(store_keys::USERNAME.to_string(), username.clone());
        }
        if let Some(password) = &credentials.password {
            values.insert(
                store_keys::PASSWORD.to_string(),
                password.expose_secret().to_string(),
            );
        }
        if let Some(token) = &credentials.token {
            values.insert(store_keys::TOKEN.to_string(), token.clone());
        }
        Self {
            values: Mutex::new(values),
        }
    }

    /// Look up a stored value, mainly for test assertions.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().expect("store lock").get(key).cloned()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn read(&self) -> Result<Credentials> {
        let values = self.values.lock().expect("store lock");
        Ok(Credentials {
            username: values.get(store_keys::USERNAME).cloned(),
            password: values
                .get(store_keys::PASSWORD)
                .map(|p| SecretString::from(p.clone())),
            token: values.get(store_keys::TOKEN).cloned(),
        })
    }

    async fn save(&self, key: &str, value: Option<String>) -> Result<()> {
        let mut values = self.values.lock().expect("store lock");
        match value {
            Some(value) => {
                values.insert(key.to_string(), value);
            }
            None => {
                values.remove(key);
            }
        }
        Ok(())
    }
}
