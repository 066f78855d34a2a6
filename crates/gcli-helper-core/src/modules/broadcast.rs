//! Live log fan-out.
//!
//! Fan-out of log lines to dynamically subscribed live-tail consumers,
//! decoupled from the scheduler's execution. Built on a bounded
//! `tokio::sync::broadcast` channel: publishing never blocks, a consumer
//! that falls behind loses its oldest buffered lines (lag), and a consumer
//! that joins late sees only subsequent lines — no backlog replay.

use tokio::sync::broadcast;

/// Per-subscriber buffer size. A lagging subscriber drops its oldest
/// buffered lines once it falls this far behind.
const CHANNEL_CAPACITY: usize = 256;

/// Publish/subscribe registry for helper log lines.
pub struct LogBroadcaster {
    sender: broadcast::Sender<String>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Distribute a line to all current subscribers. Non-blocking; with no
    /// subscribers the line is dropped.
    pub fn publish(&self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!("{}", line);
        let _ = self.sender.send(line);
    }

    /// Subscribe to the live tail. The receiver only sees lines published
    /// after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
