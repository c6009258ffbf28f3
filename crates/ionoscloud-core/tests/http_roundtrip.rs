//! End-to-end tests of the raw transport against a canned TCP server.
//!
//! A listener accepts exactly one connection, captures the request bytes and
//! replies with a fixed response, which exercises request framing, response
//! parsing and envelope interpretation over a real socket.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use ionoscloud_core::auth::Credentials;
use ionoscloud_core::query::QueryParams;
use ionoscloud_core::{ClientSettings, CloudClient, Error, MemoryConfigStore, Method, Payload};

/// Serves one connection with a fixed response; yields the captured request.
async fn canned_server(response: String) -> (SocketAddr, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 8192];
        let mut request = Vec::new();
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        let _ = tx.send(String::from_utf8_lossy(&request).to_string());
    });
    (addr, rx)
}

fn client_for(addr: SocketAddr) -> CloudClient {
    let settings = ClientSettings::new().with_cloud_api(format!("http://{addr}/cloudapi/v6"));
    CloudClient::with_credentials(
        settings,
        Credentials::bearer("test-token"),
        Arc::new(MemoryConfigStore::new()),
    )
    .unwrap()
}

#[tokio::test]
async fn chunked_collection_roundtrip() {
    let body = r#"{"type":"collection","items":[{"id":"a","type":"user"},{"id":"b","type":"user"}]}"#;
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nTransfer-Encoding: chunked\r\n\r\n{:x}\r\n{}\r\n0\r\n\r\n",
        body.len(),
        body
    );
    let (addr, request_rx) = canned_server(response).await;

    let client = client_for(addr);
    let payload = client
        .call("um/users", &QueryParams::depth(1), Method::Get, None, &[])
        .await
        .unwrap();

    let items = payload.into_items().unwrap();
    assert_eq!(items.len(), 2);

    let request = request_rx.await.unwrap();
    assert!(request.starts_with("GET /cloudapi/v6/um/users?depth=1 HTTP/1.1\r\n"));
    assert!(request.contains("Authorization: Bearer test-token\r\n"));
    assert!(request.contains("Accept: application/json\r\n"));
    assert!(request.contains("Connection: close\r\n"));
}

#[tokio::test]
async fn delete_with_204_is_success() {
    let (addr, request_rx) = canned_server("HTTP/1.1 204 No Content\r\n\r\n".to_string()).await;

    let client = client_for(addr);
    let payload = client
        .call(
            "um/users/15f67991-0f51-4efc-a8ad-ef1fb31a480c",
            &QueryParams::new(),
            Method::Delete,
            None,
            &[],
        )
        .await
        .unwrap();
    assert_eq!(payload, Payload::Empty);

    let request = request_rx.await.unwrap();
    assert!(request
        .starts_with("DELETE /cloudapi/v6/um/users/15f67991-0f51-4efc-a8ad-ef1fb31a480c?depth=0"));
    // DELETE carries no body and no Content-Length.
    assert!(!request.contains("Content-Length"));
}

#[tokio::test]
async fn empty_500_raises_status_500() {
    let (addr, _request_rx) =
        canned_server("HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\n\r\n".to_string())
            .await;

    let client = client_for(addr);
    let err = client
        .call("um/users", &QueryParams::new(), Method::Get, None, &[])
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn missing_credentials_fail_before_any_connection() {
    // No server: the call must not reach the network.
    let settings = ClientSettings::new().with_cloud_api("http://127.0.0.1:1/cloudapi/v6");
    let client = CloudClient::with_credentials(
        settings,
        Credentials::default(),
        Arc::new(MemoryConfigStore::new()),
    )
    .unwrap();

    let err = client
        .call("um/users", &QueryParams::new(), Method::Get, None, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ConfigurationRequired));
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    // Port 1 on localhost is essentially never listening.
    let settings = ClientSettings::new().with_cloud_api("http://127.0.0.1:1/cloudapi/v6");
    let client = CloudClient::with_credentials(
        settings,
        Credentials::bearer("t"),
        Arc::new(MemoryConfigStore::new()),
    )
    .unwrap();

    let err = client
        .call("um/users", &QueryParams::new(), Method::Get, None, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_) | Error::Timeout(_)));
}
