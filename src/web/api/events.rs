//! Server-sent stream of executed commands.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::core::Assistant;

/// Stream `command_response` events until the client disconnects.
pub async fn stream_events(
    State(assistant): State<Arc<Assistant>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!("Client connected");

    let stream = BroadcastStream::new(assistant.subscribe()).filter_map(|message| match message {
        Ok(event) => Event::default()
            .event("command_response")
            .json_data(&event)
            .ok()
            .map(Ok),
        Err(e) => {
            tracing::warn!("Event subscriber lagged: {}", e);
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
