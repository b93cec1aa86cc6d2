use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

use super::CloudApi;
use crate::error::{Error, Result};
use crate::query::QueryParams;
use crate::types::{ChangeFeedEvent, ChangeFeedSubscription};
use crate::wire::ACCEPT_VERSION;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// An open change-feed websocket.
pub struct ChangeFeed {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl ChangeFeed {
    /// Waits for the next event. `None` once the server closes the feed.
    ///
    /// # Errors
    ///
    /// Returns a `Transport` error if the socket fails, or `InvalidContent`
    /// for a frame that is not an event.
    pub async fn next_event(&mut self) -> Result<Option<ChangeFeedEvent>> {
        while let Some(msg) = self.ws.next().await {
            let msg = msg.map_err(|e| Error::transport(format!("change feed: {e}"), false))?;
            let event = match msg {
                Message::Text(text) => parse_event(text.as_bytes())?,
                Message::Binary(data) => parse_event(&data)?,
                Message::Close(frame) => {
                    debug!(?frame, "change feed closed by server");
                    self.closed = true;
                    return Ok(None);
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            };
            trace!(id = %event.changed_resource_id, "change feed event");
            return Ok(Some(event));
        }
        self.closed = true;
        Ok(None)
    }

    /// Closes the websocket with a normal close frame.
    pub async fn close(mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.ws
            .close(None)
            .await
            .map_err(|e| Error::transport(format!("closing change feed: {e}"), false))?;
        debug!("change feed closed");
        Ok(())
    }
}

fn parse_event(data: &[u8]) -> Result<ChangeFeedEvent> {
    serde_json::from_slice(data).map_err(|e| Error::InvalidContent {
        message: format!("invalid change feed frame: {e}"),
        original_body: Some(String::from_utf8_lossy(data).into_owned()),
    })
}

impl CloudApi {
    /// Opens `/<account>/changefeed` and sends `subscription`.
    ///
    /// The upgrade request carries the usual signed `Date`/`Authorization`
    /// headers.
    pub async fn changefeed(&self, subscription: &ChangeFeedSubscription) -> Result<ChangeFeed> {
        let mut url = self
            .wire()
            .url_for(&self.path(&["changefeed"]), &QueryParams::new())?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| Error::internal(format!("cannot use {url} as a websocket URL")))?;

        let auth = self.wire().auth_headers().await?;
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| Error::usage(format!("invalid change feed URL {url}: {e}")))?;
        let headers = request.headers_mut();
        for (name, value) in [
            ("date", auth.date.as_str()),
            ("authorization", auth.authorization.as_str()),
            (ACCEPT_VERSION, self.wire().accept_version()),
            ("user-agent", self.wire().user_agent()),
        ] {
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::internal(format!("invalid {name} header: {e}")))?;
            headers.insert(name, value);
        }

        let connector = if self.wire().insecure() {
            let tls = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .build()
                .map_err(|e| Error::internal(format!("failed to build TLS connector: {e}")))?;
            Some(Connector::NativeTls(tls))
        } else {
            None
        };

        debug!(url = %url, "connecting to change feed");
        let connect =
            tokio_tungstenite::connect_async_tls_with_config(request, None, false, connector);
        let (mut ws, _response) = timeout(CONNECT_TIMEOUT, connect)
            .await
            .map_err(|_| Error::transport("change feed connection timed out", true))?
            .map_err(|e| Error::transport(format!("change feed connect: {e}"), false))?;

        let text = serde_json::to_string(subscription)
            .map_err(|e| Error::internal(format!("cannot serialize subscription: {e}")))?;
        ws.send(Message::Text(text))
            .await
            .map_err(|e| Error::transport(format!("change feed subscribe: {e}"), false))?;
        debug!(sub_resources = ?subscription.sub_resources, "change feed subscribed");

        Ok(ChangeFeed { ws, closed: false })
    }
}
