//! Socket-level HTTP/1.1 transport.
//!
//! Each request opens one TCP or TLS connection, writes the hand-built
//! request in a single operation, drains the response to EOF and closes the
//! socket. No redirects, no retries, no keep-alive; retries are caller
//! policy.

use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tracing::{debug, error};
use url::Url;

use crate::error::{Error, Result};

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl Method {
    /// Wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// True for methods that carry a body (and a `Content-Length`).
    #[must_use]
    pub const fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root certificate store: platform native certs first, Mozilla roots as
/// fallback.
fn build_root_store() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    if let Ok(certs) = rustls_native_certs::load_native_certs() {
        for cert in certs {
            let _ = root_store.add(cert);
        }
    }
    if root_store.is_empty() {
        root_store.roots = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    }
    root_store
}

static TLS_CONNECTOR: OnceLock<TlsConnector> = OnceLock::new();

fn tls_connector() -> &'static TlsConnector {
    TLS_CONNECTOR.get_or_init(|| {
        let config = ClientConfig::builder()
            .with_root_certificates(build_root_store())
            .with_no_client_auth();
        TlsConnector::from(Arc::new(config))
    })
}

/// One response stream, plain or TLS. Closed when dropped.
pub enum ByteStream {
    /// Plain TCP.
    Plain(TcpStream),
    /// TLS over TCP.
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for ByteStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Plain(s) => Pin::new(s).poll_read(cx, buf),
            Self::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ByteStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(s) => Pin::new(s).poll_write(cx, buf),
            Self::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Plain(s) => Pin::new(s).poll_flush(cx),
            Self::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Plain(s) => Pin::new(s).poll_shutdown(cx),
            Self::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// One-socket-per-call HTTP transport.
#[derive(Debug, Clone)]
pub struct Transport {
    /// Connect ceiling; `None` leaves the connect unbounded.
    connect_timeout: Option<Duration>,
    /// `User-Agent` header value.
    user_agent: String,
}

impl Transport {
    /// Create a transport.
    #[must_use]
    pub fn new(connect_timeout: Option<Duration>, user_agent: impl Into<String>) -> Self {
        Self {
            connect_timeout,
            user_agent: user_agent.into(),
        }
    }

    /// Open a connection and write the framed request; the returned stream
    /// yields the raw response bytes.
    ///
    /// # Errors
    ///
    /// [`Error::Timeout`] when the connect deadline expires,
    /// [`Error::Transport`] on connect/handshake/write failure,
    /// [`Error::Config`] for unusable URLs.
    pub async fn open(
        &self,
        url: &Url,
        method: Method,
        body: &[u8],
        headers: &[(String, String)],
    ) -> Result<ByteStream> {
        let host = url
            .host_str()
            .ok_or_else(|| Error::Config(format!("URL '{url}' has no host")))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| Error::Config(format!("URL '{url}' has no port")))?;

        // GET/DELETE never carry a body.
        let body: &[u8] = if method.has_body() { body } else { &[] };
        let request = build_request(method, url, &self.user_agent, headers, body.len())?;
        debug!(target: "ionoscloud::transport", "{}", redact_authorization(&request));

        let connect = TcpStream::connect((host, port));
        let tcp = match self.connect_timeout {
            Some(ceiling) => tokio::time::timeout(ceiling, connect)
                .await
                .map_err(|_| Error::Timeout(format!("connect to {host}:{port}")))?,
            None => connect.await,
        }
        .map_err(|e| {
            error!(target: "ionoscloud::transport", url = %url, "connect failed: {e}");
            Error::Transport(format!("connect to {host}:{port} failed: {e}"))
        })?;

        let mut stream = match url.scheme() {
            "http" => ByteStream::Plain(tcp),
            "https" => {
                let server_name = ServerName::try_from(host.to_string())
                    .map_err(|_| Error::Config(format!("invalid TLS host name '{host}'")))?;
                let tls = tls_connector()
                    .connect(server_name, tcp)
                    .await
                    .map_err(|e| {
                        error!(target: "ionoscloud::transport", url = %url, "TLS handshake failed: {e}");
                        Error::Transport(format!("TLS handshake with {host} failed: {e}"))
                    })?;
                ByteStream::Tls(Box::new(tls))
            }
            other => {
                return Err(Error::Config(format!("unsupported URL scheme '{other}'")));
            }
        };

        // Header block and body leave in one write.
        let mut wire = Vec::with_capacity(request.len() + body.len());
        wire.extend_from_slice(request.as_bytes());
        wire.extend_from_slice(body);
        stream.write_all(&wire).await.map_err(|e| {
            error!(target: "ionoscloud::transport", url = %url, "request write failed: {e}");
            Error::Transport(format!("sending request to '{url}' failed: {e}"))
        })?;
        stream
            .flush()
            .await
            .map_err(|e| Error::Transport(format!("sending request to '{url}' failed: {e}")))?;

        Ok(stream)
    }

    /// Open, drain the full response and close the socket.
    ///
    /// # Errors
    ///
    /// As for [`Transport::open`]; read failures map to
    /// [`Error::Transport`].
    pub async fn fetch(
        &self,
        url: &Url,
        method: Method,
        body: &[u8],
        headers: &[(String, String)],
    ) -> Result<Vec<u8>> {
        let mut stream = self.open(url, method, body, headers).await?;
        let mut raw = BytesMut::with_capacity(8 * 1024);
        loop {
            match stream.read_buf(&mut raw).await {
                Ok(0) => break,
                Ok(_) => {}
                // Peers that skip close_notify surface as UnexpectedEof;
                // the response is delimited by Connection: close anyway.
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => {
                    return Err(Error::Transport(format!(
                        "reading response from '{url}' failed: {e}"
                    )));
                }
            }
        }
        Ok(raw.to_vec())
    }
}

/// Builds the request header block, terminated by the blank line.
pub(crate) fn build_request(
    method: Method,
    url: &Url,
    user_agent: &str,
    extra_headers: &[(String, String)],
    body_len: usize,
) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| Error::Config(format!("URL '{url}' has no host")))?;
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let mut request = format!("{} {} HTTP/1.1\r\n", method.as_str(), target);
    request.push_str("Host: ");
    request.push_str(host);
    if let Some(port) = url.port() {
        request.push_str(&format!(":{port}"));
    }
    request.push_str("\r\n");
    request.push_str(&format!("User-Agent: {user_agent}\r\n"));
    request.push_str("Accept: application/json\r\n");
    request.push_str("Cache-Control: no-cache\r\n");
    request.push_str("Pragma:no-cache\r\n");
    request.push_str("Connection: close\r\n");
    if method.has_body() {
        request.push_str(&format!("Content-Length: {body_len}\r\n"));
    }
    for (name, value) in extra_headers {
        request.push_str(&format!("{name}: {value}\r\n"));
    }
    request.push_str("\r\n");
    Ok(request)
}

/// Masks the credential part of Authorization headers before logging.
pub(crate) fn redact_authorization(request: &str) -> String {
    request
        .lines()
        .map(|line| {
            let lower = line.to_ascii_lowercase();
            if lower.starts_with("authorization:") {
                let scheme = line
                    .split_once(':')
                    .map(|(_, v)| v.trim())
                    .and_then(|v| v.split_whitespace().next())
                    .unwrap_or("");
                format!("Authorization: {scheme} ********")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\r\n")
}
