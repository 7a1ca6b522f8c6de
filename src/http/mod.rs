//! HTTP protocol implementation.
//!
//! One request per connection, GET only, always `Connection: close`.
//!
//! # Architecture
//!
//! - **`connection`**: Drives a single connection through the pipeline below
//! - **`parser`**: Consumes the request header block and extracts the GET path
//! - **`request`**: Resolves the path against the root into a `RequestContext`
//! - **`mime`**: Content type classification by extension token
//! - **`response`**: Status model and header emission
//! - **`writer`**: Body emission, tag substitution and the 404 fallback
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Consume lines up to the blank line
//!        └──────┬──────┘
//!               │ Raw path (possibly empty)
//!               ▼
//!        ┌──────────────────┐
//!        │    Resolving     │ ← Status and content type, decided once
//!        └──────┬───────────┘
//!               │ RequestContext
//!               ▼
//!        ┌──────────────────┐
//!        │     Writing      │ ← Header, then body or 404 document
//!        └──────┬───────────┘
//!               │
//!               ▼
//!             Closed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lantern::config::StaticFilesConfig;
//! use lantern::http::connection::Connection;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let config = Arc::new(StaticFilesConfig::default());
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         let config = Arc::clone(&config);
//!         tokio::spawn(async move {
//!             if let Err(e) = Connection::new(socket, config).run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
