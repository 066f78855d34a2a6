//! Live log stream (Server-Sent Events)

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::state::AppState;

const HEARTBEAT_SECS: u64 = 30;

/// Live tail of helper log lines as SSE `log` events. Subscribers joining
/// late see only subsequent lines; a client that falls behind the
/// broadcast buffer silently loses its oldest lines.
pub async fn stream_logs(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.inner.broadcaster.subscribe();
    tracing::debug!("[Stream] Log subscriber attached");

    let stream = BroadcastStream::new(rx).filter_map(|line| match line {
        Ok(line) => Some(Ok(Event::default().event("log").data(line))),
        // Lag means dropped lines, not a broken stream; keep going.
        Err(BroadcastStreamRecvError::Lagged(n)) => {
            tracing::debug!("[Stream] Subscriber lagged, {} lines dropped", n);
            None
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(HEARTBEAT_SECS))
            .text("heartbeat"),
    )
}
