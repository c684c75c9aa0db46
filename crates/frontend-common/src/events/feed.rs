//! Build status notifications pushed by the server over a websocket

use super::{Event, EventBus, EventType};
use futures::StreamExt;
use gloo_net::websocket::futures::WebSocket;
use gloo_net::websocket::Message;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Notification {
    event_type: String,
    #[serde(default)]
    payload: Payload,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Payload {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    build_coordination_status: Option<String>,
    #[serde(default)]
    build_status: Option<String>,
}

fn build_event(status: &str) -> Option<EventType> {
    match status {
        "BUILDING" => Some(EventType::BuildStarted),
        "DONE" | "DONE_WITH_ERRORS" | "REJECTED" | "REJECTED_FAILED_DEPENDENCIES"
        | "REJECTED_ALREADY_BUILT" | "SYSTEM_ERROR" | "CANCELLED" => {
            Some(EventType::BuildFinished)
        }
        _ => None,
    }
}

fn build_set_event(status: &str) -> Option<EventType> {
    match status {
        "RUNNING" => Some(EventType::BuildSetStarted),
        "SUCCESS" | "FAILED" | "REJECTED" | "CANCELLED" | "SYSTEM_ERROR" => {
            Some(EventType::BuildSetFinished)
        }
        _ => None,
    }
}

/// Translate one websocket message into a bus event.
///
/// Messages about intermediate states, and messages that fail to parse,
/// yield `None`.
pub fn parse_notification(text: &str) -> Option<Event> {
    let notification: Notification = match serde_json::from_str(text) {
        Ok(notification) => notification,
        Err(error) => {
            tracing::debug!(%error, "ignoring malformed notification");
            return None;
        }
    };

    let payload = notification.payload;
    let kind = match notification.event_type.as_str() {
        "BUILD_STATUS_CHANGED" => payload.build_coordination_status.as_deref().and_then(build_event),
        "BUILD_SET_STATUS_CHANGED" => payload.build_status.as_deref().and_then(build_set_event),
        _ => None,
    }?;

    Some(Event {
        kind,
        id: payload.id,
    })
}

/// Forward notifications from `url` into `bus` until the socket closes
pub async fn run(url: &str, bus: EventBus) {
    let socket = match WebSocket::open(url) {
        Ok(socket) => socket,
        Err(error) => {
            tracing::warn!(%error, url, "cannot open notification socket");
            return;
        }
    };
    tracing::info!(url, "listening for build notifications");

    let (_sink, mut stream) = socket.split();
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if let Some(event) = parse_notification(&text) {
                    bus.publish(event);
                }
            }
            Ok(Message::Bytes(_)) => {}
            Err(error) => {
                tracing::warn!(%error, "notification socket closed");
                break;
            }
        }
    }
}
