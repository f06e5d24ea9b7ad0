//! Activity streams.
//!
//! The agent answers every conversation request with a server-sent event
//! stream. `activity` events carry one JSON activity each; the stream is
//! closed by an `end` event.

use std::sync::Arc;

use copilot_auth::SendError;
use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures::StreamExt;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;

use crate::client::ClientInner;
use crate::error::{Error, Result};
use crate::types::Activity;

/// Turn an event-stream response into activities.
///
/// Conversation ids seen on activities are remembered on the client. Once
/// `cancel` fires the stream yields a single cancellation error and ends.
pub(crate) fn activity_stream(
    response: reqwest::Response,
    inner: Arc<ClientInner>,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<Activity>> + Send + 'static {
    let activities = response
        .bytes_stream()
        .eventsource()
        .filter_map(move |result| futures::future::ready(decode(result, &inner)));

    futures::stream::unfold(
        (Box::pin(activities), cancel, false),
        |(mut activities, cancel, done)| async move {
            if done {
                return None;
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    Some((Err(Error::Send(SendError::Cancelled)), (activities, cancel, true)))
                }
                next = activities.next() => next.map(|item| (item, (activities, cancel, false))),
            }
        },
    )
}

fn decode(
    result: std::result::Result<Event, EventStreamError<reqwest::Error>>,
    inner: &ClientInner,
) -> Option<Result<Activity>> {
    let event = match result {
        Ok(event) => event,
        Err(e) => return Some(Err(Error::Stream(e.to_string()))),
    };

    match event.event.as_str() {
        "activity" | "message" | "" => {}
        "end" => {
            tracing::debug!("End of activity stream");
            return None;
        }
        other => {
            tracing::debug!(event = other, "Skipping event");
            return None;
        }
    }

    if event.data.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<Activity>(&event.data) {
        Ok(activity) => {
            if let Some(id) = activity.conversation_id() {
                inner.remember_conversation(id);
            }
            tracing::trace!(kind = %activity.kind, "Activity received");
            Some(Ok(activity))
        }
        Err(e) => {
            tracing::warn!(data = %event.data, error = %e, "Failed to parse activity");
            Some(Err(Error::Json(e)))
        }
    }
}

/// Drain `stream`, joining the non-empty activity texts with a single space.
pub async fn collect_answer<S>(stream: S) -> Result<String>
where
    S: Stream<Item = Result<Activity>>,
{
    let mut stream = std::pin::pin!(stream);
    let mut parts = Vec::new();
    while let Some(activity) = stream.next().await {
        if let Some(text) = activity?.text() {
            parts.push(text.to_string());
        }
    }
    Ok(parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(kind: &str, text: Option<&str>) -> Activity {
        let mut value = serde_json::json!({ "type": kind });
        if let Some(text) = text {
            value["text"] = text.into();
        }
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_collect_answer_joins_texts() {
        let stream = futures::stream::iter(vec![
            Ok(activity("typing", None)),
            Ok(activity("message", Some("The Adventure Dining Table"))),
            Ok(activity("message", Some(""))),
            Ok(activity("message", Some("is $90."))),
        ]);
        let answer = collect_answer(stream).await.unwrap();
        assert_eq!(answer, "The Adventure Dining Table is $90.");
    }

    #[tokio::test]
    async fn test_collect_answer_empty_stream() {
        let stream = futures::stream::iter(Vec::<Result<Activity>>::new());
        assert_eq!(collect_answer(stream).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_collect_answer_propagates_errors() {
        let stream = futures::stream::iter(vec![
            Ok(activity("message", Some("partial"))),
            Err(Error::Stream("connection reset".into())),
        ]);
        let err = collect_answer(stream).await.unwrap_err();
        assert!(matches!(err, Error::Stream(_)));
    }
}
