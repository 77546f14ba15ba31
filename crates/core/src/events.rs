use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::flows::state::StateSnapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<NotificationKind>,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self { message: message.into(), kind: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { message: message.into(), kind: Some(NotificationKind::Error) }
    }
}

/// Everything the orchestrator tells the outside world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum OutboundEvent {
    StateChanged(StateSnapshot),
    ShowNotification(Notification),
}

impl OutboundEvent {
    pub fn topic(&self) -> &'static str {
        match self {
            Self::StateChanged(_) => "stateChanged",
            Self::ShowNotification(_) => "showNotification",
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &OutboundEvent);
}

impl<F> EventSink for F
where
    F: Fn(&OutboundEvent) + Send + Sync,
{
    fn emit(&self, event: &OutboundEvent) {
        self(event)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryEventSink {
    events: Arc<Mutex<Vec<OutboundEvent>>>,
}

impl InMemoryEventSink {
    pub fn events(&self) -> Vec<OutboundEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn snapshots(&self) -> Vec<StateSnapshot> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                OutboundEvent::StateChanged(snapshot) => Some(snapshot),
                OutboundEvent::ShowNotification(_) => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                OutboundEvent::ShowNotification(notification) => Some(notification),
                OutboundEvent::StateChanged(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut events) => events.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl EventSink for InMemoryEventSink {
    fn emit(&self, event: &OutboundEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

/// Synchronous in-process multicast. Subscribers see events in publish order.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Vec<Arc<dyn EventSink>>,
}

impl EventBus {
    pub fn subscribe(&mut self, sink: Arc<dyn EventSink>) {
        self.subscribers.push(sink);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn publish(&self, event: OutboundEvent) {
        for subscriber in &self.subscribers {
            subscriber.emit(&event);
        }
    }
}
