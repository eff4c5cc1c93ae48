//! Shared application state for the HTTP server.

use std::sync::Arc;

use scoreboard::Scoreboard;
use scoreboard::core::types::{AwardAmount, ParticipantId};
use tokio::sync::broadcast;
use tracing::debug;

/// Events broadcast to SSE clients after a committed change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    ParticipantRegistered {
        participant_id: ParticipantId,
    },
    PointsClaimed {
        participant_id: ParticipantId,
        amount: AwardAmount,
    },
}

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub scoreboard: Arc<Scoreboard>,
    /// Broadcast sender for change events.
    pub event_tx: Arc<broadcast::Sender<ChangeEvent>>,
}

impl AppState {
    pub fn new(scoreboard: Scoreboard) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            scoreboard: Arc::new(scoreboard),
            event_tx: Arc::new(event_tx),
        }
    }

    /// Send `event` to every connected client. Having no subscribers is fine.
    pub fn publish(&self, event: ChangeEvent) {
        debug!(?event, "broadcasting change");
        let _ = self.event_tx.send(event);
    }
}
