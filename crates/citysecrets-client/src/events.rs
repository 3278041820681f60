use serde::Serialize;
use tokio::sync::broadcast;

use citysecrets_shared::Address;

pub const EVENT_NOTIFICATION: &str = "notification";
pub const EVENT_SESSION_CHANGED: &str = "session-changed";
pub const EVENT_SPOTS_UPDATED: &str = "spots-updated";
pub const EVENT_USER_UPDATED: &str = "user-updated";

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Which state collection a refresh replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotCollection {
    Spots,
    UserSpots,
    Detail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum ClientEvent {
    Notification(Notification),
    SessionChanged { address: Option<Address> },
    SpotsUpdated { collection: SpotCollection, count: usize },
    UserUpdated { is_registered: bool },
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Notification(_) => EVENT_NOTIFICATION,
            Self::SessionChanged { .. } => EVENT_SESSION_CHANGED,
            Self::SpotsUpdated { .. } => EVENT_SPOTS_UPDATED,
            Self::UserUpdated { .. } => EVENT_USER_UPDATED,
        }
    }
}

/// Fan-out of client events to any number of views.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: ClientEvent) {
        let name = event.name();
        if self.tx.send(event).is_err() {
            tracing::trace!(event = name, "No event subscribers");
        }
    }

    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.emit(ClientEvent::Notification(Notification {
            level,
            message: message.into(),
        }));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
