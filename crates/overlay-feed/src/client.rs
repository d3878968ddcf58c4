//! WebSocket client for the position feed.

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::decode::Envelope;
use crate::listener::{Disposition, FeedListener};

/// Connection settings for the feed endpoint.
#[derive(Debug, Clone)]
pub struct FeedClient {
    url: String,
    room: String,
    token: Option<String>,
}

/// An open, joined feed connection.
pub struct FeedSession {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

/// Per-session message counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub applied: u64,
    pub ignored: u64,
    pub rejected: u64,
    pub unrouted: u64,
}

impl FeedStats {
    fn record(&mut self, disposition: &Disposition) {
        match disposition {
            Disposition::Applied { .. } => self.applied += 1,
            Disposition::Ignored => self.ignored += 1,
            Disposition::Rejected(_) => self.rejected += 1,
            Disposition::Unrouted => self.unrouted += 1,
        }
    }
}

impl FeedClient {
    pub fn new(url: impl Into<String>, room: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            room: room.into(),
            token: None,
        }
    }

    /// Set the authentication credential sent on connect.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    /// Connect, authenticate and join the room.
    pub async fn connect(&self) -> Result<FeedSession> {
        let url = build_ws_url(&self.url, self.token.as_deref())?;
        let mut request = url.as_str().into_client_request()?;
        if let Some(token) = self.token.as_deref() {
            request.headers_mut().insert(
                "Authorization",
                HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }

        let (socket, _) = connect_async(request)
            .await
            .with_context(|| format!("Failed to connect to {}", self.url))?;
        let mut session = FeedSession { socket };
        session.send(&Envelope::join(&self.room)).await?;
        tracing::info!("Connected to feed at {}, joined room '{}'", self.url, self.room);
        Ok(session)
    }
}

impl FeedSession {
    pub async fn send(&mut self, envelope: &Envelope) -> Result<()> {
        let text = serde_json::to_string(envelope)?;
        self.socket
            .send(Message::Text(text))
            .await
            .context("Failed to send frame")?;
        Ok(())
    }

    /// Read the next text frame (returns None on close).
    pub async fn next_text(&mut self) -> Result<Option<String>> {
        while let Some(msg) = self.socket.next().await {
            match msg? {
                Message::Text(text) => return Ok(Some(text)),
                Message::Binary(data) => match String::from_utf8(data) {
                    Ok(text) => return Ok(Some(text)),
                    Err(_) => tracing::warn!("Dropping non UTF-8 binary frame"),
                },
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }
        Ok(None)
    }

    /// Feed every frame to the listener until the peer closes or the
    /// transport fails.
    pub async fn run(mut self, listener: &FeedListener) -> FeedStats {
        let mut stats = FeedStats::default();
        loop {
            match self.next_text().await {
                Ok(Some(text)) => stats.record(&listener.handle_frame(&text)),
                Ok(None) => {
                    tracing::info!("Feed connection closed");
                    break;
                }
                Err(e) => {
                    tracing::error!("Feed connection lost: {:#}", e);
                    break;
                }
            }
        }
        stats
    }

    pub async fn close(mut self) -> Result<()> {
        self.socket.close(None).await?;
        Ok(())
    }
}

/// Connect once and process messages until the session ends.
///
/// Connection failures are logged and reported as `None`; reconnecting is
/// left to the caller.
pub async fn listen(client: &FeedClient, listener: &FeedListener) -> Option<FeedStats> {
    let session = match client.connect().await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Connect error: {:#}", e);
            return None;
        }
    };
    let stats = session.run(listener).await;
    tracing::info!(
        "Feed session ended: {} applied, {} ignored, {} rejected",
        stats.applied,
        stats.ignored,
        stats.rejected
    );
    Some(stats)
}

fn build_ws_url(base: &str, token: Option<&str>) -> Result<Url> {
    let mut url = Url::parse(base).with_context(|| format!("Invalid feed URL '{}'", base))?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => other,
    }
    .to_string();

    url.set_scheme(&scheme)
        .map_err(|_| anyhow::anyhow!("Invalid feed URL scheme"))?;
    if let Some(token) = token {
        url.query_pairs_mut().append_pair("token", token);
    }
    Ok(url)
}
