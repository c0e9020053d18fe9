//! SSE subscriber sessions
//!
//! One session per `/api/meta?url=…` request: the handler registers a sink
//! with the pool registry and maps pool events onto the SSE wire format.
//! Dropping the session (client disconnect) unsubscribes promptly, which
//! is what eventually lets a pool release its upstream connection.

use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::Stream;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

use crate::registry::{PoolEvent, SubscriberId};

use super::{AppState, SharedRegistry};

/// Query parameters accepted by the subscription endpoint.
#[derive(Debug, Deserialize)]
pub struct MetaQuery {
    pub url: Option<String>,
}

/// `GET /api/meta?url=…` — subscribe to a stream's metadata events.
pub async fn meta_events(
    State(state): State<AppState>,
    Query(query): Query<MetaQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, &'static str)> {
    let Some(url) = query.url else {
        return Err((StatusCode::BAD_REQUEST, "Missing url parameter"));
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let id = state
        .registry
        .subscribe(&url, tx)
        .await
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid URL scheme"))?;

    tracing::debug!(stream = %url, "SSE session opened");

    // The guard travels with the event stream; when the client disconnects
    // axum drops the stream and the guard unsubscribes
    let guard = SessionGuard {
        registry: state.registry,
        url,
        id,
    };
    let events = UnboundedReceiverStream::new(rx).map(move |event| {
        let _ = &guard;
        Ok::<_, Infallible>(to_sse_event(&event))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Unsubscribes its sink when dropped.
struct SessionGuard {
    registry: SharedRegistry,
    url: String,
    id: SubscriberId,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let registry = self.registry.clone();
        let url = std::mem::take(&mut self.url);
        let id = self.id;
        tokio::spawn(async move {
            registry.unsubscribe(&url, id).await;
            tracing::debug!(stream = %url, "SSE session closed");
        });
    }
}

fn to_sse_event(event: &PoolEvent) -> Event {
    Event::default()
        .event(event.name())
        .data(sanitize(&event_payload(event)))
}

/// JSON payload for one pool event.
fn event_payload(event: &PoolEvent) -> String {
    match event {
        PoolEvent::Metadata(block) => serde_json::json!({
            "streamTitle": block.stream_title().unwrap_or(""),
            "raw": block.raw(),
        })
        .to_string(),
        PoolEvent::NoMetadata | PoolEvent::End | PoolEvent::Error => "{}".to_string(),
    }
}

/// Strip carriage returns and escape newlines so a hostile metadata string
/// can never corrupt the SSE framing.
fn sanitize(payload: &str) -> String {
    payload.replace('\r', "").replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use crate::protocol::MetadataBlock;

    use super::*;

    #[test]
    fn test_metadata_payload() {
        let block = MetadataBlock::parse("StreamTitle='Artist - Song';");
        let payload = event_payload(&PoolEvent::Metadata(block));

        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["streamTitle"], "Artist - Song");
        assert_eq!(value["raw"], "StreamTitle='Artist - Song';");
    }

    #[test]
    fn test_terminal_payloads_are_empty_objects() {
        assert_eq!(event_payload(&PoolEvent::NoMetadata), "{}");
        assert_eq!(event_payload(&PoolEvent::End), "{}");
        assert_eq!(event_payload(&PoolEvent::Error), "{}");
    }

    #[test]
    fn test_sanitize_strips_framing_hazards() {
        assert_eq!(sanitize("a\r\nb\nc"), "a\\nb\\nc");
        assert_eq!(sanitize("clean"), "clean");
    }
}
