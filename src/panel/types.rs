use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dom::{DomEvent, Element};
use crate::hub::HubEvent;

/// One identifier in a panel's identity sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Num(i64),
    Text(String),
}

impl From<i64> for Id {
    fn from(v: i64) -> Self {
        Id::Num(v)
    }
}

impl From<&str> for Id {
    fn from(v: &str) -> Self {
        Id::Text(v.to_string())
    }
}

impl From<String> for Id {
    fn from(v: String) -> Self {
        Id::Text(v)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Num(n) => write!(f, "{n}"),
            Id::Text(s) => f.write_str(s),
        }
    }
}

/// What a render function sees: the identity of the current activation and
/// the store payload.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RenderContext<'a> {
    pub ids: &'a [Id],
    pub data: Option<&'a Map<String, Value>>,
}

/// Called with the fired event and the element the binding matched.
pub type Handler = Rc<dyn Fn(&DomEvent, &Element)>;

/// Declares that every element matching `selector` gets `handler` for `event`
/// after each render.
#[derive(Clone)]
pub struct EventBinding {
    pub selector: String,
    pub event: String,
    pub handler: Handler,
}

impl EventBinding {
    pub fn new(
        selector: impl Into<String>,
        event: impl Into<String>,
        handler: impl Fn(&DomEvent, &Element) + 'static,
    ) -> Self {
        Self {
            selector: selector.into(),
            event: event.into(),
            handler: Rc::new(handler),
        }
    }
}

impl fmt::Debug for EventBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBinding")
            .field("selector", &self.selector)
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

/// The collaborator that owns a panel's meaning: it turns inbound events into
/// store updates and may react after each render.
pub trait PanelOwner {
    /// Translate `event` into store updates. `snapshot` is a forced read of the
    /// store taken just before the call. Return an empty map to ignore the event.
    fn map(&self, event: &HubEvent, snapshot: Option<&Map<String, Value>>) -> Map<String, Value>;

    fn after_render(&self, _ctx: &RenderContext<'_>) {}
}
