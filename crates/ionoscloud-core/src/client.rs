//! The cloud API client: explicit context object for every call.
//!
//! [`CloudClient`] owns the endpoints, transport settings, credential state
//! and the configuration-store collaborator. Credential state is read by
//! every call and written only by the construction-time token renewal, which
//! holds the single writer lock.

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tracing::{debug, error, info, warn};
use url::Url;
use validator::Validate;

use crate::auth::{expires_within, token_expiry, Credentials};
use crate::config::{store_keys, ClientSettings, ConfigStore};
use crate::error::{Error, ErrorEnvelope, Result, GENERIC_ERROR_CODE};
use crate::query::{QueryParams, DEPTH};
use crate::resource::{Resource, ResourceClient};
use crate::response;
use crate::transport::{Method, Transport};

/// Interpreted response payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Empty body from a DELETE or a 204.
    Empty,
    /// Single resource (or token) envelope.
    Value(Value),
    /// Items of a collection envelope.
    Items(Vec<Value>),
}

impl Payload {
    /// The single value, if this payload carries one.
    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The collection items, if this payload carries them.
    #[must_use]
    pub fn into_items(self) -> Option<Vec<Value>> {
        match self {
            Self::Items(items) => Some(items),
            _ => None,
        }
    }
}

/// Client for the IONOS Cloud API.
pub struct CloudClient {
    cloud_api: Url,
    auth_api: Url,
    contract_number: Option<String>,
    token_lookahead_months: u32,
    request_deadline: Option<std::time::Duration>,
    transport: Transport,
    credentials: RwLock<Credentials>,
    store: Arc<dyn ConfigStore>,
}

impl CloudClient {
    /// Builds a client from stored credentials and runs the once-per-process
    /// token renewal check.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] for invalid settings or an unreadable store;
    /// persistence failures from the renewal propagate, while token
    /// *generation* failures only log and leave credentials untouched.
    pub async fn connect(settings: ClientSettings, store: Arc<dyn ConfigStore>) -> Result<Self> {
        let credentials = store.read().await?;
        let client = Self::with_credentials(settings, credentials, store)?;
        client.ensure_fresh_token().await?;
        Ok(client)
    }

    /// Builds a client with explicit credentials, skipping the renewal
    /// check.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when the settings fail validation.
    pub fn with_credentials(
        settings: ClientSettings,
        credentials: Credentials,
        store: Arc<dyn ConfigStore>,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            cloud_api: settings.cloud_api_url()?,
            auth_api: settings.auth_api_url()?,
            contract_number: settings.contract_number.clone(),
            token_lookahead_months: settings.token_lookahead_months,
            request_deadline: settings.request_deadline(),
            transport: Transport::new(settings.connect_timeout(), settings.user_agent.clone()),
            credentials: RwLock::new(credentials),
            store,
        })
    }

    /// Cloud API base URL.
    #[must_use]
    pub const fn cloud_api(&self) -> &Url {
        &self.cloud_api
    }

    /// Typed CRUD view onto one resource kind.
    #[must_use]
    pub fn resource<R: Resource>(&self) -> ResourceClient<'_, R> {
        ResourceClient::new(self)
    }

    /// Snapshot of the current credential state.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        self.lock_read().clone()
    }

    fn lock_read(&self) -> std::sync::RwLockReadGuard<'_, Credentials> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Performs one API call: auth header injection, transport, response
    /// parsing and envelope interpretation.
    ///
    /// `path` is joined onto the cloud API base unless it is already an
    /// absolute URL. When the caller supplies no `depth`, `depth=0` is
    /// appended.
    ///
    /// # Errors
    ///
    /// The full taxonomy: [`Error::ConfigurationRequired`] before any I/O
    /// when no credential is usable, [`Error::Transport`]/[`Error::Timeout`]
    /// from the socket, [`Error::MalformedResponse`] for broken envelopes
    /// and [`Error::Api`]/[`Error::NotFound`] for provider failures.
    pub async fn call(
        &self,
        path: &str,
        params: &QueryParams,
        method: Method,
        body: Option<&Value>,
        extra_headers: &[(String, String)],
    ) -> Result<Payload> {
        let mut url = if path.starts_with("https://") || path.starts_with("http://") {
            Url::parse(path)?
        } else {
            self.cloud_api
                .join(path)
                .map_err(|e| Error::Config(format!("invalid request path '{path}': {e}")))?
        };
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in params.pairs() {
                pairs.append_pair(name, value);
            }
            if !params.has(DEPTH) {
                pairs.append_pair(DEPTH, "0");
            }
        }

        let mut headers: Vec<(String, String)> = Vec::new();
        headers.push(("Authorization".to_string(), self.lock_read().auth_header()?));
        let body_bytes = match body {
            Some(value) if method.has_body() => {
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
                serde_json::to_vec(value)
                    .map_err(|e| Error::Config(format!("unserializable request body: {e}")))?
            }
            _ => Vec::new(),
        };
        headers.extend_from_slice(extra_headers);

        let fetch = self.transport.fetch(&url, method, &body_bytes, &headers);
        let raw = match self.request_deadline {
            Some(deadline) => tokio::time::timeout(deadline, fetch)
                .await
                .map_err(|_| Error::Timeout(format!("request to '{url}'")))??,
            None => fetch.await?,
        };

        let (response_body, response_headers) = response::parse(&raw).map_err(|e| {
            error!(target: "ionoscloud::client", url = %url, "unparseable response: {e}");
            e
        })?;
        debug!(
            target: "ionoscloud::client",
            url = %url,
            status = response_headers.status_line(),
            bytes = response_body.len(),
            "response received"
        );

        interpret(
            url.as_str(),
            method,
            response_headers.status_code(),
            response_headers.status_line(),
            &response_body,
        )
    }

    /// Generates or renews the bearer token when needed, persisting the new
    /// token and erasing the stored password.
    ///
    /// Runs once per client construction. Generation failures are logged and
    /// leave the credential state untouched; the next construction re-runs
    /// the check.
    ///
    /// # Errors
    ///
    /// Only persistence failures from the configuration store.
    pub async fn ensure_fresh_token(&self) -> Result<()> {
        let needs_renewal = {
            let credentials = self.lock_read();
            match &credentials.token {
                None => credentials.has_basic(),
                Some(token) => expires_within(token, self.token_lookahead_months).unwrap_or_else(|e| {
                    warn!(target: "ionoscloud::auth", "stored token is undecodable ({e}), renewing");
                    true
                }),
            }
        };
        if !needs_renewal {
            debug!(target: "ionoscloud::auth", "bearer token still fresh, no renewal");
            return Ok(());
        }

        let token = match self.generate_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(target: "ionoscloud::auth", "token generation failed, keeping credentials: {e}");
                return Ok(());
            }
        };
        self.store
            .save(store_keys::TOKEN, Some(token.clone()))
            .await?;
        self.store.save(store_keys::PASSWORD, None).await?;
        {
            let mut credentials = self
                .credentials
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            credentials.token = Some(token.clone());
            credentials.password = None;
        }
        match token_expiry(&token) {
            Ok(expiry) => {
                info!(target: "ionoscloud::auth", %expiry, "bearer token issued");
            }
            Err(_) => info!(target: "ionoscloud::auth", "bearer token issued"),
        }
        Ok(())
    }

    /// Calls the token-generation endpoint with the current auth header
    /// (Basic on first issuance, Bearer when renewing).
    async fn generate_token(&self) -> Result<String> {
        let url = self
            .auth_api
            .join("tokens/generate")
            .map_err(|e| Error::Config(format!("invalid auth API URL: {e}")))?;
        let headers: Vec<(String, String)> = self
            .contract_number
            .iter()
            .map(|n| ("X-Contract-Number".to_string(), n.clone()))
            .collect();
        let payload = self
            .call(url.as_str(), &QueryParams::new(), Method::Get, None, &headers)
            .await?;
        payload
            .into_value()
            .and_then(|v| v.get("token").and_then(Value::as_str).map(ToString::to_string))
            .ok_or_else(|| {
                Error::MalformedResponse("token endpoint returned no token".to_string())
            })
    }
}

/// Envelope interpretation: empty-body/status handling, `type`-or-`token`
/// check, collection unwrapping and provider error translation.
fn interpret(
    url: &str,
    method: Method,
    status: Option<u16>,
    status_line: &str,
    body: &[u8],
) -> Result<Payload> {
    if body.is_empty() {
        let ok = status.is_some_and(|s| (200..300).contains(&s));
        if !ok {
            error!(target: "ionoscloud::client", url, "request failed with {status_line}");
            return Err(Error::Api {
                status: status.unwrap_or(GENERIC_ERROR_CODE),
                message: format!("request to '{url}' failed with {status_line}"),
            });
        }
        if method == Method::Delete || status == Some(204) {
            return Ok(Payload::Empty);
        }
        return Err(Error::MalformedResponse(format!(
            "empty body from '{url}' with {status_line}"
        )));
    }

    let data: Value = serde_json::from_slice(body).map_err(|e| {
        error!(target: "ionoscloud::client", url, "response is not JSON: {e}");
        Error::MalformedResponse(format!("response from '{url}' is not JSON: {e}"))
    })?;
    let object = data.as_object().ok_or_else(|| {
        Error::MalformedResponse(format!("response from '{url}' is not an object"))
    })?;

    let non_empty_str = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty())
    };
    if !non_empty_str("type") && !non_empty_str("token") {
        if object.contains_key("messages") {
            let envelope: ErrorEnvelope = serde_json::from_value(data.clone())?;
            let err = envelope.into_error(url);
            error!(target: "ionoscloud::client", url, "{err}");
            return Err(err);
        }
        return Err(Error::MalformedResponse(format!(
            "response from '{url}' carries neither type nor token"
        )));
    }

    if object.get("type").and_then(Value::as_str) == Some("collection") {
        let items = object.get("items").and_then(Value::as_array).ok_or_else(|| {
            Error::MalformedResponse(format!(
                "collection from '{url}' has no well-formed items array"
            ))
        })?;
        return Ok(Payload::Items(items.clone()));
    }
    Ok(Payload::Value(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://api.example.test/cloudapi/v6/um/users";

    #[test]
    fn test_empty_body_non_2xx_is_api_error() {
        let err = interpret(
            URL,
            Method::Get,
            Some(500),
            "HTTP/1.1 500 Internal Server Error",
            b"",
        )
        .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("500 Internal Server Error"));
    }

    #[test]
    fn test_empty_body_delete_is_success() {
        let payload =
            interpret(URL, Method::Delete, Some(200), "HTTP/1.1 200 OK", b"").unwrap();
        assert_eq!(payload, Payload::Empty);
    }

    #[test]
    fn test_empty_body_204_is_success() {
        let payload =
            interpret(URL, Method::Get, Some(204), "HTTP/1.1 204 No Content", b"").unwrap();
        assert_eq!(payload, Payload::Empty);
    }

    #[test]
    fn test_empty_body_2xx_get_is_malformed() {
        let err = interpret(URL, Method::Get, Some(200), "HTTP/1.1 200 OK", b"").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_collection_unwraps_items() {
        let body = json!({
            "type": "collection",
            "items": [{"id": "a", "type": "user"}, {"id": "b", "type": "user"}]
        })
        .to_string();
        let payload =
            interpret(URL, Method::Get, Some(200), "HTTP/1.1 200 OK", body.as_bytes()).unwrap();
        assert_eq!(payload.into_items().unwrap().len(), 2);
    }

    #[test]
    fn test_collection_without_items_is_malformed() {
        let body = json!({"type": "collection"}).to_string();
        let err = interpret(URL, Method::Get, Some(200), "HTTP/1.1 200 OK", body.as_bytes())
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_single_resource_passes_through() {
        let body = json!({"type": "user", "id": "a", "properties": {}}).to_string();
        let payload =
            interpret(URL, Method::Get, Some(200), "HTTP/1.1 200 OK", body.as_bytes()).unwrap();
        assert_eq!(payload.into_value().unwrap()["id"], json!("a"));
    }

    #[test]
    fn test_token_response_passes_through() {
        let body = json!({"token": "eyJ..."}).to_string();
        let payload =
            interpret(URL, Method::Get, Some(200), "HTTP/1.1 200 OK", body.as_bytes()).unwrap();
        assert!(payload.into_value().is_some());
    }

    #[test]
    fn test_provider_error_envelope_is_translated() {
        let body = json!({
            "httpStatus": 422,
            "messages": [
                {"errorCode": "100", "message": "Attribute is required"},
                {"errorCode": "311", "message": "Value is invalid"}
            ]
        })
        .to_string();
        let err = interpret(
            URL,
            Method::Post,
            Some(422),
            "HTTP/1.1 422 Unprocessable Entity",
            body.as_bytes(),
        )
        .unwrap_err();
        assert_eq!(err.status(), Some(422));
        let message = err.to_string();
        assert!(message.contains("Attribute is required (100)"));
        assert!(message.contains("Value is invalid (311)"));
    }

    #[test]
    fn test_non_json_body_is_malformed() {
        let err = interpret(
            URL,
            Method::Get,
            Some(200),
            "HTTP/1.1 200 OK",
            b"<html>oops</html>",
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_object_without_type_or_token_is_malformed() {
        let body = json!({"id": "a"}).to_string();
        let err = interpret(URL, Method::Get, Some(200), "HTTP/1.1 200 OK", body.as_bytes())
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }
}
