//! In-process notification fan-out exposed as Server-Sent Events.

use std::{convert::Infallible, time::Duration};

use api_types::notification::NotificationView;
use axum::{
    extract::State,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
};
use chrono::Utc;
use engine::Notifier;
use futures::Stream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};

use crate::server::ServerState;

#[derive(Clone, Debug)]
pub struct ServerEvent {
    pub name: String,
    pub payload: NotificationView,
}

/// Lightweight broadcast bus that fans out events to any connected clients.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ServerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: ServerEvent) {
        // No subscribers is not an error.
        let _ = self.sender.send(event);
    }
}

impl Notifier for EventBus {
    fn broadcast(&self, event: &str, message: String) {
        self.publish(ServerEvent {
            name: event.to_string(),
            payload: NotificationView {
                message,
                time: Utc::now(),
            },
        });
    }
}

pub(crate) async fn stream(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let receiver = BroadcastStream::new(state.events.subscribe());
    let stream = tokio_stream::StreamExt::filter_map(receiver, |event| match event {
        Ok(evt) => match SseEvent::default().event(evt.name.as_str()).json_data(&evt.payload) {
            Ok(sse_event) => Some(Ok(sse_event)),
            Err(err) => {
                tracing::error!("failed to serialize SSE payload for {}: {err}", evt.name);
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "SSE subscriber lagged");
            None
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
