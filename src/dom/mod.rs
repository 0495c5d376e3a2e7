pub mod memory;
pub mod selector;

use std::cell::Cell;
use std::rc::Rc;

use thiserror::Error;

pub use memory::MemoryDom;
pub use selector::{Selector, SelectorError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("no element matches attachment selector {0:?}")]
    MissingTarget(String),

    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// Opaque identity of a rendered element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Handle to an element in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    node: NodeId,
    tag: String,
    attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(node: NodeId, tag: impl Into<String>, attrs: Vec<(String, String)>) -> Self {
        Self {
            node,
            tag: tag.into(),
            attrs,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }
}

/// An event fired on an element.
#[derive(Debug)]
pub struct DomEvent {
    name: String,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl DomEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

/// A callback registered on an element for one event name.
pub type Listener = Rc<dyn Fn(&DomEvent)>;

/// DOM capability consumed by panels.
///
/// Methods take `&self`: implementations hold their own interior state so a
/// listener may run while other parts of the program still hold the handle.
pub trait Dom {
    /// All elements matching `selector`, in document order.
    fn select(&self, selector: &str) -> Result<Vec<Element>, DomError>;

    /// Elements matching `selector` inside the content of the element matching
    /// `scope`, including content mounted beneath it. The scope element itself
    /// is not a candidate.
    fn select_within(&self, scope: &str, selector: &str) -> Result<Vec<Element>, DomError>;

    /// Replace the content of the element matching `selector` with `html`.
    fn set_content(&self, selector: &str, html: &str) -> Result<(), DomError>;

    fn add_listener(&self, element: &Element, event: &str, listener: Listener);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_attr_lookup_is_case_insensitive() {
        let el = Element::new(
            NodeId(1),
            "a",
            vec![("Href".into(), "/x".into()), ("class".into(), "btn big".into())],
        );
        assert_eq!(el.attr("href"), Some("/x"));
        assert_eq!(el.classes().collect::<Vec<_>>(), vec!["btn", "big"]);
        assert_eq!(el.attr("id"), None);
    }

    #[test]
    fn test_dom_event_flags() {
        let evt = DomEvent::new("click");
        assert!(!evt.default_prevented());
        assert!(!evt.propagation_stopped());
        evt.prevent_default();
        evt.stop_propagation();
        assert!(evt.default_prevented());
        assert!(evt.propagation_stopped());
        assert_eq!(evt.name(), "click");
    }
}
