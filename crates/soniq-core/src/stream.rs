// ── Reactive status stream ──
//
// Subscription wrapper over the engine's status watch channel.

use tokio::sync::watch;

use crate::engine::PlayerStatus;

/// A subscription to player status updates.
pub struct StatusStream {
    receiver: watch::Receiver<PlayerStatus>,
}

impl StatusStream {
    pub(crate) fn new(receiver: watch::Receiver<PlayerStatus>) -> Self {
        Self { receiver }
    }

    /// Wait for the next update. `None` once the engine is gone.
    pub async fn changed(&mut self) -> Option<PlayerStatus> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}
