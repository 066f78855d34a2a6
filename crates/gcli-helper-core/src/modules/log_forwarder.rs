//! Upstream log forwarding.
//!
//! Maintains one connection to the upstream's live log stream and
//! republishes every received line into the local broadcaster, where the
//! SSE tail and the model stats feed pick them up. The connection is
//! re-established with a fixed delay after it drops; an empty upstream
//! slot (not connected yet) is retried the same way.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use tokio::time::{sleep, Duration};

use gcli_helper_client::LogLineStream;

use super::broadcast::LogBroadcaster;
use super::upstream::SharedUpstream;

const RECONNECT_SECS: u64 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct LogForwarderStatus {
    /// Whether a stream connection is currently open.
    pub connected: bool,
    /// Lines republished since process start.
    pub lines_forwarded: u64,
}

pub struct LogForwarder {
    broadcaster: Arc<LogBroadcaster>,
    connected: AtomicBool,
    lines: AtomicU64,
}

impl LogForwarder {
    pub fn new(broadcaster: Arc<LogBroadcaster>) -> Self {
        Self {
            broadcaster,
            connected: AtomicBool::new(false),
            lines: AtomicU64::new(0),
        }
    }

    pub fn status(&self) -> LogForwarderStatus {
        LogForwarderStatus {
            connected: self.connected.load(Ordering::Relaxed),
            lines_forwarded: self.lines.load(Ordering::Relaxed),
        }
    }

    /// Spawn the forwarding loop. Runs until the returned handle is
    /// aborted (process shutdown).
    pub fn spawn(self: Arc<Self>, upstream: SharedUpstream) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("[Forwarder] Upstream log forwarder task started");
            loop {
                let Some(client) = upstream.read().await.clone() else {
                    sleep(Duration::from_secs(RECONNECT_SECS)).await;
                    continue;
                };

                match client.stream_logs().await {
                    Ok(stream) => {
                        tracing::info!("[Forwarder] Attached to upstream log stream");
                        self.connected.store(true, Ordering::Relaxed);
                        self.pump(stream).await;
                        self.connected.store(false, Ordering::Relaxed);
                        tracing::warn!(
                            "[Forwarder] Upstream log stream ended, reconnecting in {}s",
                            RECONNECT_SECS
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            "[Forwarder] Could not attach to upstream log stream: {}",
                            e
                        );
                    }
                }
                sleep(Duration::from_secs(RECONNECT_SECS)).await;
            }
        })
    }

    /// Drain one stream connection into the broadcaster.
    async fn pump(&self, mut stream: LogLineStream) {
        while let Some(item) = stream.next().await {
            match item {
                Ok(line) => {
                    self.lines.fetch_add(1, Ordering::Relaxed);
                    self.broadcaster.publish(line);
                }
                Err(e) => {
                    tracing::warn!("[Forwarder] Log stream error: {}", e);
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gcli_helper_client::{UpstreamError, VerifyResult};
    use gcli_helper_types::{Credential, CredentialQuota};
    use tokio::sync::RwLock;

    struct StreamingUpstream {
        lines: Vec<String>,
    }

    #[async_trait]
    impl crate::modules::upstream::UpstreamApi for StreamingUpstream {
        async fn list_credentials(&self) -> Result<Vec<Credential>, UpstreamError> {
            Ok(vec![])
        }

        async fn verify(&self, _filename: &str) -> Result<VerifyResult, UpstreamError> {
            Ok(VerifyResult { success: true, message: None })
        }

        async fn fetch_quotas(&self) -> Result<Vec<CredentialQuota>, UpstreamError> {
            Ok(vec![])
        }

        async fn probe(&self) -> Result<(), UpstreamError> {
            Ok(())
        }

        async fn stream_logs(&self) -> Result<LogLineStream, UpstreamError> {
            let items: Vec<Result<String, UpstreamError>> =
                self.lines.iter().cloned().map(Ok).collect();
            Ok(Box::pin(tokio_stream::iter(items)))
        }
    }

    #[tokio::test]
    async fn test_pump_republishes_lines_and_counts() {
        let broadcaster = Arc::new(LogBroadcaster::new());
        let forwarder = LogForwarder::new(Arc::clone(&broadcaster));
        let mut rx = broadcaster.subscribe();

        let items: Vec<Result<String, UpstreamError>> =
            vec![Ok("line one".to_string()), Ok("line two".to_string())];
        forwarder.pump(Box::pin(tokio_stream::iter(items))).await;

        assert_eq!(rx.try_recv().unwrap(), "line one");
        assert_eq!(rx.try_recv().unwrap(), "line two");
        assert_eq!(forwarder.status().lines_forwarded, 2);
    }

    #[tokio::test]
    async fn test_pump_stops_on_stream_error() {
        let broadcaster = Arc::new(LogBroadcaster::new());
        let forwarder = LogForwarder::new(Arc::clone(&broadcaster));
        let mut rx = broadcaster.subscribe();

        let items: Vec<Result<String, UpstreamError>> = vec![
            Ok("before".to_string()),
            Err(UpstreamError::InvalidResponse("truncated".to_string())),
            Ok("after".to_string()),
        ];
        forwarder.pump(Box::pin(tokio_stream::iter(items))).await;

        assert_eq!(rx.try_recv().unwrap(), "before");
        assert!(rx.try_recv().is_err());
        assert_eq!(forwarder.status().lines_forwarded, 1);
    }

    #[tokio::test]
    async fn test_spawn_forwards_from_upstream_slot() {
        let broadcaster = Arc::new(LogBroadcaster::new());
        let forwarder = Arc::new(LogForwarder::new(Arc::clone(&broadcaster)));
        let mut rx = broadcaster.subscribe();

        let upstream: SharedUpstream = Arc::new(RwLock::new(Some(Arc::new(StreamingUpstream {
            lines: vec!["Model: gemini-pro | Total: 42".to_string()],
        }) as Arc<dyn crate::modules::upstream::UpstreamApi>)));

        let handle = Arc::clone(&forwarder).spawn(upstream);
        let line = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("forwarded line")
            .unwrap();
        assert!(line.contains("Total: 42"));

        handle.abort();
    }
}
