//! Manual post triggers.
//!
//! Listeners only hold a `TriggerHandle` and push unit signals into a
//! channel. The poll loop is the single consumer and handles them at its next
//! interruption point, so all state changes stay on one task. Signals are not
//! deduplicated: two rapid presses mean two posts.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Sending side of the manual trigger. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TriggerHandle {
    tx: mpsc::UnboundedSender<()>,
}

impl TriggerHandle {
    /// Request a manual post. Returns false if the poll loop is gone.
    pub fn fire(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

/// Receiving side, owned by the poll loop.
#[derive(Debug)]
pub struct ManualTrigger {
    rx: mpsc::UnboundedReceiver<()>,
}

impl ManualTrigger {
    /// Creates a connected handle/trigger pair.
    pub fn channel() -> (TriggerHandle, ManualTrigger) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TriggerHandle { tx }, ManualTrigger { rx })
    }

    /// Wait for the next signal. `None` once every handle is dropped.
    pub async fn recv(&mut self) -> Option<()> {
        self.rx.recv().await
    }

    /// Take one already-queued signal without waiting.
    pub fn try_recv(&mut self) -> bool {
        self.rx.try_recv().is_ok()
    }
}

/// Returns true for input lines that request a manual post.
pub fn is_trigger_line(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "" | "p" | "post")
}

/// Fire `handle` for every trigger line read from `reader`.
///
/// Runs until EOF or until the poll loop goes away. Returns the number of
/// signals sent.
pub async fn listen_lines<R>(reader: R, handle: TriggerHandle) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut fired = 0;

    while let Some(line) = lines.next_line().await? {
        if !is_trigger_line(&line) {
            debug!(input = %line, "ignoring input line");
            continue;
        }

        info!("manual post requested from input");
        if !handle.fire() {
            break;
        }
        fired += 1;
    }

    Ok(fired)
}
