use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

use crate::config::StaticFilesConfig;
use crate::http::parser::read_request;
use crate::http::request::RequestContext;
use crate::http::response::write_header;
use crate::http::writer::{write_body, BodyOutcome};

/// Handles exactly one request on a stream it owns, then closes it.
pub struct Connection<S> {
    stream: BufReader<S>,
    config: Arc<StaticFilesConfig>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Resolving(String),
    Writing(RequestContext),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, config: Arc<StaticFilesConfig>) -> Self {
        Self {
            stream: BufReader::new(stream),
            config,
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        tracing::debug!("Handling connection");

        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    let idle_timeout = self
                        .config
                        .request_idle_timeout_ms
                        .map(Duration::from_millis);
                    let parsed = read_request(&mut self.stream, idle_timeout).await;
                    tracing::debug!(path = %parsed.path, end = ?parsed.end, "Request read");
                    self.state = ConnectionState::Resolving(parsed.path);
                }

                ConnectionState::Resolving(path) => {
                    let ctx = RequestContext::resolve(&path, &self.config).await;
                    tracing::info!(
                        path = %ctx.path,
                        status = ctx.status.as_u16(),
                        content_type = ctx.content_type.as_str(),
                        "Resolved request"
                    );
                    if ctx.is_favicon {
                        tracing::debug!("Favicon requested");
                    }
                    self.state = ConnectionState::Writing(ctx);
                }

                ConnectionState::Writing(ctx) => {
                    let outcome = self.respond(&ctx).await?;
                    tracing::debug!(path = %ctx.path, ?outcome, "Response written");
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!(error = %e, "Shutdown after response failed");
        }

        tracing::debug!("Done handling connection");
        Ok(())
    }

    async fn respond(&mut self, ctx: &RequestContext) -> anyhow::Result<BodyOutcome> {
        let mut out = BufWriter::new(&mut self.stream);

        write_header(&mut out, ctx.status, ctx.content_type, &self.config.server_name).await?;
        let outcome = write_body(&mut out, ctx, &self.config).await?;

        out.flush().await.context("flushing response")?;
        Ok(outcome)
    }
}
