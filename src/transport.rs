use bytes::Bytes;
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::hub::{EventHub, HubEvent};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no async runtime available to issue the request")]
    NoRuntime,
}

/// A concrete request ready to be issued.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: Uuid,
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            url: url.into(),
            body,
        }
    }

    fn failure(&self, reason: impl ToString) -> HubEvent {
        HubEvent::Failure {
            request_id: self.id,
            url: self.url.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Fire-and-forget request issuer. The outcome is published on `hub` later;
/// nothing is returned to the caller.
pub trait Transport {
    fn issue(&self, hub: &EventHub, request: Request);
}

/// [`Transport`] over HTTP, spawning each request on the current tokio runtime.
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn issue(&self, hub: &EventHub, request: Request) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::error!(url = %request.url, "{}", TransportError::NoRuntime);
            hub.publish(request.failure(TransportError::NoRuntime));
            return;
        };

        let client = self.client.clone();
        let hub = hub.clone();
        tracing::debug!(id = %request.id, method = %request.method, url = %request.url, "issuing request");
        handle.spawn(async move {
            let event = match send(&client, &request).await {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(id = %request.id, url = %request.url, "request failed: {}", e);
                    request.failure(e)
                }
            };
            hub.publish(event);
        });
    }
}

async fn send(client: &reqwest::Client, request: &Request) -> Result<HubEvent, TransportError> {
    let mut builder = client.request(request.method.clone(), &request.url);
    if let Some(body) = &request.body {
        builder = builder.json(body);
    }
    let response = builder.send().await?;
    let status = response.status().as_u16();
    let body = decode_body(response.bytes().await?);

    Ok(HubEvent::Response {
        request_id: request.id,
        method: request.method.to_string(),
        url: request.url.clone(),
        status,
        body,
    })
}

/// JSON when it parses, the raw text otherwise, `Null` when empty.
fn decode_body(bytes: Bytes) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(Bytes::new()), Value::Null);
        assert_eq!(decode_body(Bytes::from(r#"{"a":1}"#)), json!({"a": 1}));
        assert_eq!(decode_body(Bytes::from("plain")), json!("plain"));
    }

    #[test]
    fn test_requests_get_distinct_ids() {
        let a = Request::new(Method::GET, "/a", None);
        let b = Request::new(Method::GET, "/a", None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_issue_without_runtime_reports_failure() {
        let (hub, mut rx) = EventHub::channel();
        let request = Request::new(Method::GET, "http://127.0.0.1:9/", None);
        let id = request.id;

        HttpTransport::default().issue(&hub, request);

        match rx.try_recv() {
            Some(HubEvent::Failure { request_id, url, .. }) => {
                assert_eq!(request_id, id);
                assert_eq!(url, "http://127.0.0.1:9/");
            }
            other => panic!("expected Failure, got {:?}", other),
        }
    }
}
