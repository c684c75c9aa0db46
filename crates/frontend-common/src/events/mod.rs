//! Build lifecycle event bus
//!
//! Components subscribe and pick the topics they care about; the websocket
//! [`feed`] publishes into the bus. Events carry no payload contract beyond
//! the topic and the id of the record that changed.

pub mod feed;

use std::fmt;
use tokio::sync::broadcast;

/// Events buffered per subscriber before the slowest one starts missing them
const CHANNEL_CAPACITY: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    BuildStarted,
    BuildFinished,
    BuildSetStarted,
    BuildSetFinished,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BuildStarted => "BUILD_STARTED",
            Self::BuildFinished => "BUILD_FINISHED",
            Self::BuildSetStarted => "BUILD_SET_STARTED",
            Self::BuildSetFinished => "BUILD_SET_FINISHED",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub kind: EventType,
    /// Id of the build record or build set record concerned
    pub id: Option<i64>,
}

/// Fan-out of build lifecycle events to every subscriber
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Receive every event published from now on; filter by [`Event::kind`]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: Event) {
        tracing::debug!(kind = %event.kind, id = ?event.id, "publishing event");
        // Nobody listening is not an error
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
