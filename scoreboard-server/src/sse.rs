//! Server-Sent Events stream of leaderboard changes.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::warn;

use scoreboard::core::types::{AwardAmount, ParticipantId};

use crate::state::{AppState, ChangeEvent};

#[derive(Debug, Serialize)]
struct SsePayload {
    #[serde(rename = "type")]
    event_type: &'static str,
    participant_id: ParticipantId,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<AwardAmount>,
}

impl From<&ChangeEvent> for SsePayload {
    fn from(event: &ChangeEvent) -> Self {
        match event {
            ChangeEvent::ParticipantRegistered { participant_id } => SsePayload {
                event_type: "participant_registered",
                participant_id: participant_id.clone(),
                amount: None,
            },
            ChangeEvent::PointsClaimed {
                participant_id,
                amount,
            } => SsePayload {
                event_type: "points_claimed",
                participant_id: participant_id.clone(),
                amount: Some(*amount),
            },
        }
    }
}

/// SSE endpoint handler.
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.event_tx.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("connected").data("{}"));

        loop {
            match rx.recv().await {
                Ok(change_event) => {
                    let payload = SsePayload::from(&change_event);
                    if let Ok(json) = serde_json::to_string(&payload) {
                        yield Ok(Event::default().event("change").data(json));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "SSE client lagged, some events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoreboard::test_support::amount;

    #[test]
    fn registration_payload_omits_amount() {
        let event = ChangeEvent::ParticipantRegistered {
            participant_id: ParticipantId::new("abc"),
        };
        let json = serde_json::to_value(SsePayload::from(&event)).expect("json");
        assert_eq!(
            json,
            serde_json::json!({ "type": "participant_registered", "participant_id": "abc" })
        );
    }

    #[test]
    fn claim_payload_carries_amount() {
        let event = ChangeEvent::PointsClaimed {
            participant_id: ParticipantId::new("abc"),
            amount: amount(6),
        };
        let json = serde_json::to_value(SsePayload::from(&event)).expect("json");
        assert_eq!(json["type"], "points_claimed");
        assert_eq!(json["amount"], 6);
    }
}
