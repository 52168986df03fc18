use crate::db::{self, Suggestion};
use crate::startup::AppState;
use axum::{
    extract::Extension,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use serde_json::json;
use std::{convert::Infallible, time::Duration};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct VoteUpdate {
    pub suggestion_id: i32,
    pub upvotes: i32,
    pub downvotes: i32,
}

#[derive(Debug, Clone)]
pub enum FeedEvent {
    SuggestionCreated(Suggestion),
    VoteUpdate(VoteUpdate),
    /// Server is shutting down; open streams end.
    Closing,
}

pub type FeedSender = tokio::sync::broadcast::Sender<FeedEvent>;

pub fn create_feed() -> FeedSender {
    tokio::sync::broadcast::channel(100).0
}

/// Sends to whoever is listening. Having no subscribers is normal.
pub fn publish(feed: &FeedSender, event: FeedEvent) {
    let _ = feed.send(event);
}

fn to_event(event: &FeedEvent) -> Option<Event> {
    let event = match event {
        FeedEvent::SuggestionCreated(suggestion) => Event::default()
            .event("suggestion_created")
            .data(json!({ "suggestion": suggestion }).to_string()),
        FeedEvent::VoteUpdate(update) => Event::default().event("vote_update").data(
            json!({
                "suggestion_id": update.suggestion_id,
                "upvotes": update.upvotes,
                "downvotes": update.downvotes,
            })
            .to_string(),
        ),
        FeedEvent::Closing => return None,
    };
    Some(event)
}

/// Live suggestion board: current list first, then changes as they commit.
pub async fn suggestions_sse(
    Extension(app_state): Extension<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = app_state.feed.subscribe();

    let stream = async_stream::stream! {
        match db::list_suggestions(&app_state.db, 0, 100).await {
            Ok(suggestions) => {
                yield Ok(Event::default()
                    .event("init")
                    .data(json!({ "suggestions": suggestions }).to_string()));
            }
            Err(e) => {
                warn!("Failed to load suggestions for stream: {e}");
                yield Ok(Event::default()
                    .event("error")
                    .data(json!({ "error": "Failed to load suggestions" }).to_string()));
            }
        }

        loop {
            match rx.recv().await {
                Ok(event) => match to_event(&event) {
                    Some(event) => {
                        yield Ok(event);
                    }
                    None => break,
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Suggestion stream lagged, skipped {skipped} events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keep-alive"),
    )
}
