use std::fmt;

use reqwest::Method;
use serde_json::Value;

use crate::transport::Request;

/// Where a panel's data comes from. The method defaults to `GET`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestDescriptor {
    pub method: Option<Method>,
    pub url: String,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: None,
            url: url.into(),
            body: None,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn into_request(self) -> Request {
        Request::new(self.method.unwrap_or(Method::GET), self.url, self.body)
    }
}

/// A panel's data request: fixed, or produced fresh on every fetch.
///
/// A `Dynamic` spec is treated as possibly stale, so it is re-fetched on every
/// activation. A `Static` spec is fetched only while the store is empty.
pub enum FetchSpec {
    Static(RequestDescriptor),
    Dynamic(Box<dyn Fn() -> RequestDescriptor>),
}

impl FetchSpec {
    pub fn dynamic(factory: impl Fn() -> RequestDescriptor + 'static) -> Self {
        FetchSpec::Dynamic(Box::new(factory))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, FetchSpec::Dynamic(_))
    }

    pub fn resolve(&self) -> Request {
        match self {
            FetchSpec::Static(descriptor) => descriptor.clone().into_request(),
            FetchSpec::Dynamic(factory) => factory().into_request(),
        }
    }
}

impl From<RequestDescriptor> for FetchSpec {
    fn from(descriptor: RequestDescriptor) -> Self {
        FetchSpec::Static(descriptor)
    }
}

impl fmt::Debug for FetchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchSpec::Static(d) => f.debug_tuple("Static").field(d).finish(),
            FetchSpec::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}
