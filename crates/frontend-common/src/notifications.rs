//! User-facing notifications
//!
//! Anything can raise a notification through a cloned [`Notifications`]
//! handle; the `NotificationList` component renders them.

use std::cell::Cell;
use std::rc::Rc;
use tokio::sync::watch;

/// Oldest notifications are dropped beyond this many
const MAX_NOTIFICATIONS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Success,
    Info,
}

impl Level {
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Error => "bg-red-50 text-red-700 border-red-200",
            Self::Warning => "bg-yellow-50 text-yellow-700 border-yellow-200",
            Self::Success => "bg-green-50 text-green-700 border-green-200",
            Self::Info => "bg-blue-50 text-blue-700 border-blue-200",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub level: Level,
    pub message: String,
}

#[derive(Clone)]
pub struct Notifications {
    items: Rc<watch::Sender<Vec<Notification>>>,
    next_id: Rc<Cell<u64>>,
}

impl Notifications {
    pub fn new() -> Self {
        let (items, _) = watch::channel(Vec::new());
        Self {
            items: Rc::new(items),
            next_id: Rc::new(Cell::new(0)),
        }
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Level::Error, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.push(Level::Warning, message.into());
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(Level::Success, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(Level::Info, message.into());
    }

    fn push(&self, level: Level, message: String) {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.items.send_modify(|items| {
            items.push(Notification { id, level, message });
            if items.len() > MAX_NOTIFICATIONS {
                let excess = items.len() - MAX_NOTIFICATIONS;
                items.drain(..excess);
            }
        });
    }

    pub fn dismiss(&self, id: u64) {
        self.items.send_if_modified(|items| {
            let before = items.len();
            items.retain(|item| item.id != id);
            before != items.len()
        });
    }

    /// Notifications currently shown, oldest first
    pub fn current(&self) -> Vec<Notification> {
        self.items.borrow().clone()
    }

    /// Observe the shown list; only real changes wake the receiver
    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.items.subscribe()
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Notifications {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.items, &other.items)
    }
}
