use serde_json::{Map, Value};

use crate::hub::HubEvent;
use crate::panel::PanelOwner;

/// Maps transport results for one URL straight into the store.
///
/// A JSON object body is spread into store keys; any other body lands under
/// `body`. The response status goes to `status`, a transport failure to
/// `error`. Events for other URLs are ignored.
#[derive(Debug, Clone)]
pub struct JsonResponseOwner {
    url: String,
}

impl JsonResponseOwner {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl PanelOwner for JsonResponseOwner {
    fn map(&self, event: &HubEvent, _snapshot: Option<&Map<String, Value>>) -> Map<String, Value> {
        let mut out = Map::new();
        match event {
            HubEvent::Response {
                url, status, body, ..
            } if *url == self.url => {
                match body {
                    Value::Object(fields) => out.extend(fields.clone()),
                    other => {
                        out.insert("body".into(), other.clone());
                    }
                }
                out.insert("status".into(), Value::from(*status));
            }
            HubEvent::Failure { url, reason, .. } if *url == self.url => {
                out.insert("error".into(), Value::String(reason.clone()));
            }
            _ => {}
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn response(url: &str, status: u16, body: Value) -> HubEvent {
        HubEvent::Response {
            request_id: Uuid::new_v4(),
            method: "GET".into(),
            url: url.into(),
            status,
            body,
        }
    }

    #[test]
    fn test_object_body_is_spread() {
        let owner = JsonResponseOwner::new("/a");
        let out = owner.map(&response("/a", 200, json!({"x": 1, "y": [2]})), None);
        assert_eq!(Value::Object(out), json!({"x": 1, "y": [2], "status": 200}));
    }

    #[test]
    fn test_non_object_body_goes_under_body() {
        let owner = JsonResponseOwner::new("/a");
        let out = owner.map(&response("/a", 404, json!("not found")), None);
        assert_eq!(Value::Object(out), json!({"body": "not found", "status": 404}));
    }

    #[test]
    fn test_failure_maps_to_error() {
        let owner = JsonResponseOwner::new("/a");
        let event = HubEvent::Failure {
            request_id: Uuid::new_v4(),
            url: "/a".into(),
            reason: "connection refused".into(),
        };
        assert_eq!(
            Value::Object(owner.map(&event, None)),
            json!({"error": "connection refused"})
        );
    }

    #[test]
    fn test_other_urls_and_app_events_ignored() {
        let owner = JsonResponseOwner::new("/a");
        assert!(owner.map(&response("/b", 200, json!({"x": 1})), None).is_empty());
        assert!(owner.map(&HubEvent::app("x", Value::Null), None).is_empty());
    }
}
