use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Events delivered back to panels through the hub.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HubEvent {
    /// A transport request completed. Non-2xx statuses land here too.
    Response {
        request_id: Uuid,
        method: String,
        url: String,
        status: u16,
        body: Value,
    },
    /// A transport request could not be completed at all.
    Failure {
        request_id: Uuid,
        url: String,
        reason: String,
    },
    /// Application-level event, typically posted by a DOM event handler.
    App { name: String, payload: Value },
}

impl HubEvent {
    pub fn app(name: impl Into<String>, payload: Value) -> Self {
        Self::App {
            name: name.into(),
            payload,
        }
    }
}

/// Sending half of the event hub. Cheap to clone; handed to transports and
/// captured by event handlers.
#[derive(Clone, Debug)]
pub struct EventHub {
    tx: mpsc::UnboundedSender<HubEvent>,
}

/// Receiving half of the event hub, owned by the controller.
#[derive(Debug)]
pub struct HubReceiver {
    rx: mpsc::UnboundedReceiver<HubEvent>,
}

impl EventHub {
    pub fn channel() -> (Self, HubReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, HubReceiver { rx })
    }

    pub fn publish(&self, event: HubEvent) {
        // Ignore error - means the controller is gone
        let _ = self.tx.send(event);
    }
}

impl HubReceiver {
    /// Wait for the next event. Returns `None` once every hub handle is dropped.
    pub async fn recv(&mut self) -> Option<HubEvent> {
        self.rx.recv().await
    }

    /// Take the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<HubEvent> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publish_then_try_recv() {
        let (hub, mut rx) = EventHub::channel();
        hub.publish(HubEvent::app("open", json!({"id": 3})));

        assert_eq!(rx.try_recv(), Some(HubEvent::app("open", json!({"id": 3}))));
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn test_publish_without_receiver_is_ignored() {
        let (hub, rx) = EventHub::channel();
        drop(rx);
        hub.publish(HubEvent::app("dropped", Value::Null));
    }

    #[tokio::test]
    async fn test_recv_ends_when_all_hubs_dropped() {
        let (hub, mut rx) = EventHub::channel();
        let clone = hub.clone();
        clone.publish(HubEvent::app("a", Value::Null));
        drop(hub);
        drop(clone);

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_event_serialization() {
        let event = HubEvent::app("select", json!(7));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, json!({"event": "app", "name": "select", "payload": 7}));
    }
}
