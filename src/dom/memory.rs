//! In-memory DOM used by tests and the demo binary.
//!
//! Content is kept as markup per mount point. Every `set_content` rescans the
//! new markup for start tags and assigns fresh [`NodeId`]s, so elements from a
//! previous render never compare equal to the new ones. Listeners and nested
//! mounts that hung off replaced elements are discarded with them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::{Dom, DomError, DomEvent, Element, Listener, NodeId, Selector};

static START_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<([a-zA-Z][a-zA-Z0-9-]*)((?:\s+[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)\s*/?>"#,
    )
    .expect("start tag pattern is valid")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("attribute pattern is valid")
});

#[derive(Debug)]
struct Mount {
    /// Selector the mount was registered under; `None` for mounts hosted by a
    /// rendered element.
    selector: Option<String>,
    host: Option<NodeId>,
    content: String,
    elements: Vec<Element>,
}

#[derive(Default)]
struct Inner {
    next_node: u64,
    mounts: Vec<Mount>,
    listeners: HashMap<NodeId, Vec<(String, Listener)>>,
    writes: usize,
}

impl Inner {
    fn scan(&mut self, html: &str) -> Vec<Element> {
        START_TAG
            .captures_iter(html)
            .map(|caps| {
                self.next_node += 1;
                let attrs = ATTRIBUTE
                    .captures_iter(caps.get(2).map_or("", |m| m.as_str()))
                    .map(|a| {
                        let value = a
                            .get(2)
                            .or_else(|| a.get(3))
                            .or_else(|| a.get(4))
                            .map_or("", |m| m.as_str());
                        (a[1].to_ascii_lowercase(), value.to_string())
                    })
                    .collect();
                Element::new(NodeId(self.next_node), caps[1].to_ascii_lowercase(), attrs)
            })
            .collect()
    }

    fn root(&self, selector: &str) -> Option<usize> {
        self.mounts
            .iter()
            .position(|m| m.selector.as_deref() == Some(selector))
    }

    fn hosted_by(&self, node: NodeId) -> Option<usize> {
        self.mounts.iter().position(|m| m.host == Some(node))
    }

    /// First rendered element matching `selector`.
    fn host_of(&self, selector: &str) -> Result<NodeId, DomError> {
        let parsed: Selector = selector.parse()?;
        self.mounts
            .iter()
            .flat_map(|m| m.elements.iter())
            .find(|el| parsed.matches(el))
            .map(Element::node)
            .ok_or_else(|| DomError::MissingTarget(selector.to_string()))
    }

    fn resolve(&mut self, selector: &str) -> Result<usize, DomError> {
        if let Some(idx) = self.root(selector) {
            return Ok(idx);
        }

        let host = self.host_of(selector)?;
        if let Some(idx) = self.hosted_by(host) {
            return Ok(idx);
        }
        self.mounts.push(Mount {
            selector: None,
            host: Some(host),
            content: String::new(),
            elements: Vec::new(),
        });
        Ok(self.mounts.len() - 1)
    }

    /// Collect matches from mount `idx` and the mounts nested beneath it, in
    /// document order.
    fn collect(&self, idx: usize, selector: &Selector, out: &mut Vec<Element>) {
        for el in &self.mounts[idx].elements {
            if selector.matches(el) {
                out.push(el.clone());
            }
            if let Some(hosted) = self.hosted_by(el.node()) {
                self.collect(hosted, selector, out);
            }
        }
    }

    /// Drop listeners on `elements` and every mount hosted beneath them.
    fn discard(&mut self, elements: Vec<Element>) {
        let mut pending = elements;
        while let Some(el) = pending.pop() {
            self.listeners.remove(&el.node());
            if let Some(idx) = self.hosted_by(el.node()) {
                let hosted = self.mounts.remove(idx);
                pending.extend(hosted.elements);
            }
        }
    }
}

/// A single-threaded DOM held entirely in memory.
#[derive(Default)]
pub struct MemoryDom {
    inner: RefCell<Inner>,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attachment point reachable by exactly `selector`.
    pub fn mount(&self, selector: impl Into<String>) {
        let selector = selector.into();
        let mut inner = self.inner.borrow_mut();
        if inner.mounts.iter().any(|m| m.selector.as_deref() == Some(selector.as_str())) {
            return;
        }
        inner.mounts.push(Mount {
            selector: Some(selector),
            host: None,
            content: String::new(),
            elements: Vec::new(),
        });
    }

    /// Current markup under the attachment point `selector`, if it resolves.
    pub fn content(&self, selector: &str) -> Option<String> {
        let inner = self.inner.borrow();
        if let Some(m) = inner
            .mounts
            .iter()
            .find(|m| m.selector.as_deref() == Some(selector))
        {
            return Some(m.content.clone());
        }
        let parsed: Selector = selector.parse().ok()?;
        let host = inner
            .mounts
            .iter()
            .flat_map(|m| m.elements.iter())
            .find(|el| parsed.matches(el))?
            .node();
        Some(
            inner
                .mounts
                .iter()
                .find(|m| m.host == Some(host))
                .map(|m| m.content.clone())
                .unwrap_or_default(),
        )
    }

    /// Number of successful `set_content` calls so far.
    pub fn write_count(&self) -> usize {
        self.inner.borrow().writes
    }

    pub fn listener_count(&self, element: &Element) -> usize {
        self.inner
            .borrow()
            .listeners
            .get(&element.node())
            .map_or(0, Vec::len)
    }

    pub fn total_listeners(&self) -> usize {
        self.inner.borrow().listeners.values().map(Vec::len).sum()
    }

    /// True while `element` is still part of the document.
    pub fn is_live(&self, element: &Element) -> bool {
        self.inner
            .borrow()
            .mounts
            .iter()
            .any(|m| m.elements.iter().any(|el| el.node() == element.node()))
    }

    /// Fire `event` on `element`, running its listeners in registration order.
    ///
    /// Listeners are cloned out before they run so they are free to call back
    /// into this DOM.
    pub fn dispatch(&self, element: &Element, event: &str) -> DomEvent {
        let listeners: Vec<Listener> = self
            .inner
            .borrow()
            .listeners
            .get(&element.node())
            .map(|ls| {
                ls.iter()
                    .filter(|(name, _)| name == event)
                    .map(|(_, l)| l.clone())
                    .collect()
            })
            .unwrap_or_default();

        let evt = DomEvent::new(event);
        for listener in listeners {
            listener(&evt);
        }
        evt
    }
}

impl Dom for MemoryDom {
    fn select(&self, selector: &str) -> Result<Vec<Element>, DomError> {
        let parsed: Selector = selector.parse()?;
        Ok(self
            .inner
            .borrow()
            .mounts
            .iter()
            .flat_map(|m| m.elements.iter())
            .filter(|el| parsed.matches(el))
            .cloned()
            .collect())
    }

    fn select_within(&self, scope: &str, selector: &str) -> Result<Vec<Element>, DomError> {
        let parsed: Selector = selector.parse()?;
        let inner = self.inner.borrow();
        let idx = match inner.root(scope) {
            Some(idx) => Some(idx),
            None => inner.hosted_by(inner.host_of(scope)?),
        };

        let mut found = Vec::new();
        if let Some(idx) = idx {
            inner.collect(idx, &parsed, &mut found);
        }
        Ok(found)
    }

    fn set_content(&self, selector: &str, html: &str) -> Result<(), DomError> {
        let mut inner = self.inner.borrow_mut();
        let idx = inner.resolve(selector)?;

        let old = std::mem::take(&mut inner.mounts[idx].elements);
        let host = inner.mounts[idx].host;
        inner.discard(old);

        // Discarding may have removed mounts ahead of this one.
        let idx = match host {
            Some(node) => inner.mounts.iter().position(|m| m.host == Some(node)),
            None => inner
                .mounts
                .iter()
                .position(|m| m.selector.as_deref() == Some(selector)),
        }
        .ok_or_else(|| DomError::MissingTarget(selector.to_string()))?;

        let elements = inner.scan(html);
        let mount = &mut inner.mounts[idx];
        mount.content = html.to_string();
        mount.elements = elements;
        inner.writes += 1;
        Ok(())
    }

    fn add_listener(&self, element: &Element, event: &str, listener: Listener) {
        let mut inner = self.inner.borrow_mut();
        let live = inner
            .mounts
            .iter()
            .any(|m| m.elements.iter().any(|el| el.node() == element.node()));
        if !live {
            tracing::debug!(node = element.node().0, event, "listener on detached element ignored");
            return;
        }
        inner
            .listeners
            .entry(element.node())
            .or_default()
            .push((event.to_string(), listener));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_set_content_requires_mount() {
        let dom = MemoryDom::new();
        assert_eq!(
            dom.set_content("#app", "<p>hi</p>"),
            Err(DomError::MissingTarget("#app".into()))
        );
        assert_eq!(dom.write_count(), 0);

        dom.mount("#app");
        dom.set_content("#app", "<p>hi</p>").unwrap();
        assert_eq!(dom.content("#app").as_deref(), Some("<p>hi</p>"));
        assert_eq!(dom.write_count(), 1);
    }

    #[test]
    fn test_scan_extracts_tags_and_attributes() {
        let dom = MemoryDom::new();
        dom.mount("#app");
        dom.set_content(
            "#app",
            r#"<ul class="list"><li data-id="1" class='row'>a</li><li data-id=2 class="row">b</li></ul><br/>"#,
        )
        .unwrap();

        let rows = dom.select("li.row").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].attr("data-id"), Some("1"));
        assert_eq!(rows[1].attr("data-id"), Some("2"));
        assert_eq!(dom.select("br").unwrap().len(), 1);
        assert_eq!(dom.select("ul.list").unwrap().len(), 1);
    }

    #[test]
    fn test_replace_issues_fresh_nodes_and_drops_listeners() {
        let dom = MemoryDom::new();
        dom.mount("#app");
        dom.set_content("#app", "<button>go</button>").unwrap();

        let old = dom.select("button").unwrap().remove(0);
        dom.add_listener(&old, "click", Rc::new(|_: &DomEvent| {}));
        assert_eq!(dom.listener_count(&old), 1);

        dom.set_content("#app", "<button>go</button>").unwrap();
        let new = dom.select("button").unwrap().remove(0);

        assert_ne!(old.node(), new.node());
        assert!(!dom.is_live(&old));
        assert!(dom.is_live(&new));
        assert_eq!(dom.listener_count(&old), 0);
        assert_eq!(dom.total_listeners(), 0);
    }

    #[test]
    fn test_listener_on_detached_element_is_ignored() {
        let dom = MemoryDom::new();
        dom.mount("#app");
        dom.set_content("#app", "<a>x</a>").unwrap();
        let stale = dom.select("a").unwrap().remove(0);
        dom.set_content("#app", "").unwrap();

        dom.add_listener(&stale, "click", Rc::new(|_: &DomEvent| {}));
        assert_eq!(dom.total_listeners(), 0);
    }

    #[test]
    fn test_dispatch_runs_matching_listeners() {
        let dom = MemoryDom::new();
        dom.mount("#app");
        dom.set_content("#app", "<a>x</a>").unwrap();
        let link = dom.select("a").unwrap().remove(0);

        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        dom.add_listener(
            &link,
            "click",
            Rc::new(move |evt: &DomEvent| {
                h.set(h.get() + 1);
                evt.prevent_default();
            }),
        );

        let evt = dom.dispatch(&link, "click");
        assert_eq!(hits.get(), 1);
        assert!(evt.default_prevented());

        let evt = dom.dispatch(&link, "mouseover");
        assert_eq!(hits.get(), 1);
        assert!(!evt.default_prevented());
    }

    #[test]
    fn test_nested_mount_is_dropped_with_its_host() {
        let dom = MemoryDom::new();
        dom.mount("#app");
        dom.set_content("#app", r#"<div id="detail"></div>"#).unwrap();

        dom.set_content("#detail", "<span>inner</span>").unwrap();
        assert_eq!(dom.content("#detail").as_deref(), Some("<span>inner</span>"));
        let span = dom.select("span").unwrap().remove(0);
        dom.add_listener(&span, "click", Rc::new(|_: &DomEvent| {}));

        dom.set_content("#app", r#"<div id="detail"></div>"#).unwrap();
        assert!(dom.select("span").unwrap().is_empty());
        assert_eq!(dom.total_listeners(), 0);
        assert_eq!(dom.content("#detail").as_deref(), Some(""));
    }

    #[test]
    fn test_select_within_stays_in_scope() {
        let dom = MemoryDom::new();
        dom.mount("#panel");
        dom.mount("#side");
        dom.set_content("#side", r#"<button id="other">x</button>"#).unwrap();
        dom.set_content("#panel", r#"<button id="own">a</button><div id="detail"></div>"#)
            .unwrap();
        dom.set_content("#detail", r#"<button id="nested">b</button>"#).unwrap();

        let ids: Vec<_> = dom
            .select_within("#panel", "button")
            .unwrap()
            .iter()
            .map(|el| el.attr("id").unwrap_or_default().to_string())
            .collect();
        assert_eq!(ids, vec!["own", "nested"]);

        let side = dom.select_within("#side", "button").unwrap();
        assert_eq!(side.len(), 1);
        assert_eq!(side[0].attr("id"), Some("other"));

        // Scope is the content, not the host element.
        assert!(dom.select_within("#detail", "div").unwrap().is_empty());
        assert_eq!(
            dom.select_within("#missing", "button"),
            Err(DomError::MissingTarget("#missing".into()))
        );
    }

    #[test]
    fn test_select_rejects_bad_selector() {
        let dom = MemoryDom::new();
        assert!(matches!(dom.select("div p"), Err(DomError::Selector(_))));
    }
}
