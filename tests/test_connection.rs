use std::fs;
use std::sync::Arc;
use std::time::Duration;

use lantern::config::StaticFilesConfig;
use lantern::http::connection::Connection;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const NOT_FOUND_PAGE: &str = "<h1>404</h1>\n";

fn site() -> (TempDir, Arc<StaticFilesConfig>) {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("index.html"), "<h1>Hi</h1>").unwrap();
    fs::write(root.path().join("404.html"), NOT_FOUND_PAGE).unwrap();
    let cfg = StaticFilesConfig {
        root: root.path().to_path_buf(),
        not_found_document: root.path().join("404.html"),
        server_name: "Lantern Test".to_string(),
        ..StaticFilesConfig::default()
    };
    (root, Arc::new(cfg))
}

/// Sends `request` over an in-memory stream and returns everything the
/// handler wrote before closing.
async fn exchange(cfg: Arc<StaticFilesConfig>, request: &[u8]) -> Vec<u8> {
    let (mut client, server) = tokio::io::duplex(16 * 1024);
    let handler = tokio::spawn(Connection::new(server, cfg).run());

    client.write_all(request).await.unwrap();
    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();

    handler.await.unwrap().unwrap();
    response
}

/// Splits a response at the blank line ending the header block.
fn split_response(response: &[u8]) -> (String, Vec<u8>) {
    let at = response
        .windows(2)
        .position(|w| w == b"\n\n")
        .expect("header terminator");
    let header = String::from_utf8(response[..at + 1].to_vec()).unwrap();
    (header, response[at + 2..].to_vec())
}

fn without_date(header: &str) -> String {
    header
        .lines()
        .filter(|line| !line.starts_with("Date: "))
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::test]
async fn test_root_serves_default_document() {
    let (_root, cfg) = site();

    let response = exchange(cfg, b"GET / HTTP/1.1\r\n\r\n").await;
    let (header, body) = split_response(&response);
    let lines: Vec<&str> = header.lines().collect();

    assert_eq!(lines[0], "HTTP/1.1 200 OK");
    assert!(lines[1].starts_with("Date: "));
    assert_eq!(lines[2], "Server: Lantern Test");
    assert_eq!(lines[3], "Connection: close");
    assert_eq!(lines[4], "Content-Type: text/html");
    assert_eq!(lines.len(), 5);
    assert_eq!(body, b"<h1>Hi</h1>\n");
}

#[tokio::test]
async fn test_root_equals_explicit_default_document() {
    let (_root, cfg) = site();

    let via_root = exchange(Arc::clone(&cfg), b"GET / HTTP/1.1\r\n\r\n").await;
    let explicit = exchange(cfg, b"GET /index.html HTTP/1.1\r\n\r\n").await;
    let (root_header, root_body) = split_response(&via_root);
    let (explicit_header, explicit_body) = split_response(&explicit);

    assert_eq!(without_date(&root_header), without_date(&explicit_header));
    assert_eq!(root_body, explicit_body);
}

#[tokio::test]
async fn test_missing_file_returns_404_document() {
    let (_root, cfg) = site();

    let response = exchange(cfg, b"GET /missing.html HTTP/1.1\r\nHost: x\r\n\r\n").await;
    let (header, body) = split_response(&response);

    assert!(header.starts_with("HTTP/1.1 404 ERROR\n"));
    assert!(header.contains("Content-Type: text/html\n"));
    assert_eq!(body, format!("HTTP/1.1 404: Not Found{}", NOT_FOUND_PAGE).into_bytes());
}

#[tokio::test]
async fn test_non_get_request_is_not_found() {
    let (_root, cfg) = site();

    let response = exchange(cfg, b"DELETE /index.html HTTP/1.1\r\n\r\n").await;
    let (header, _) = split_response(&response);

    assert!(header.starts_with("HTTP/1.1 404 ERROR\n"));
}

#[tokio::test]
async fn test_png_round_trips_byte_for_byte() {
    let (root, cfg) = site();
    let bytes: Vec<u8> = b"\x89PNG\r\n\x1a\n"
        .iter()
        .copied()
        .chain((0..4096u32).map(|i| (i % 251) as u8))
        .collect();
    fs::write(root.path().join("photo.png"), &bytes).unwrap();

    let response = exchange(cfg, b"GET /photo.png HTTP/1.1\r\n\r\n").await;
    let (header, body) = split_response(&response);

    assert!(header.starts_with("HTTP/1.1 200 OK\n"));
    assert!(header.contains("Content-Type: image/png\n"));
    assert_eq!(body, bytes);
}

#[tokio::test]
async fn test_tags_are_substituted_end_to_end() {
    let (root, cfg) = site();
    fs::write(
        root.path().join("about.html"),
        "Served by <cs371server> on <cs371date>\n",
    )
    .unwrap();

    let response = exchange(cfg, b"GET /about.html HTTP/1.1\r\n\r\n").await;
    let (_, body) = split_response(&response);
    let body = String::from_utf8(body).unwrap();

    assert!(body.starts_with("Served by Lantern 2.0 on "));
    assert!(!body.contains("<cs371"));
}

#[tokio::test]
async fn test_repeated_requests_are_identical_apart_from_date() {
    let (root, cfg) = site();
    fs::write(root.path().join("logo.gif"), b"GIF89a\x01\x00").unwrap();

    let first = exchange(Arc::clone(&cfg), b"GET /logo.gif HTTP/1.1\r\n\r\n").await;
    let second = exchange(cfg, b"GET /logo.gif HTTP/1.1\r\n\r\n").await;
    let (first_header, first_body) = split_response(&first);
    let (second_header, second_body) = split_response(&second);

    assert_eq!(without_date(&first_header), without_date(&second_header));
    assert_eq!(first_body, second_body);
}

#[tokio::test]
async fn test_missing_404_document_closes_connection() {
    let (_root, cfg) = site();
    let cfg = Arc::new(StaticFilesConfig {
        not_found_document: "/nonexistent/404.html".into(),
        ..(*cfg).clone()
    });

    let (mut client, server) = tokio::io::duplex(16 * 1024);
    let handler = tokio::spawn(Connection::new(server, cfg).run());

    client.write_all(b"GET /nope.html HTTP/1.1\r\n\r\n").await.unwrap();
    let result = handler.await.unwrap();

    assert!(result.is_err());
}

#[tokio::test]
async fn test_write_fault_fails_only_that_connection() {
    let (root, cfg) = site();
    let line = format!("{}\n", "x".repeat(80));
    fs::write(root.path().join("big.html"), line.repeat(2048)).unwrap();

    let (mut client, server) = tokio::io::duplex(1024);
    client.write_all(b"GET /big.html HTTP/1.1\r\n\r\n").await.unwrap();
    drop(client);

    let result = Connection::new(server, Arc::clone(&cfg)).run().await;
    assert!(result.is_err());

    let response = exchange(cfg, b"GET /index.html HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with(b"HTTP/1.1 200 OK\n"));
}

#[tokio::test]
async fn test_stalled_client_does_not_block_other_connections() {
    let (_root, cfg) = site();

    let (silent_client, silent_server) = tokio::io::duplex(1024);
    let stalled = tokio::spawn(Connection::new(silent_server, Arc::clone(&cfg)).run());

    let response = tokio::time::timeout(
        Duration::from_secs(5),
        exchange(cfg, b"GET /index.html HTTP/1.1\r\n\r\n"),
    )
    .await
    .expect("second connection finished");

    let (header, body) = split_response(&response);
    assert!(header.starts_with("HTTP/1.1 200 OK\n"));
    assert_eq!(body, b"<h1>Hi</h1>\n");
    assert!(!stalled.is_finished());

    stalled.abort();
    drop(silent_client);
}
