//! Panels: a store, a render function and a DOM attachment point with an
//! activate/deactivate lifecycle.
//!
//! # Invariants
//!
//! 1. The attachment point is only written while the panel is active.
//! 2. Re-activating an active panel with the same ids does nothing at all.
//! 3. Every successful render rebinds every declared event binding to the
//!    elements matching its selector inside the attachment point, nested
//!    mounts included. Elements from earlier renders
//!    are gone, and so are their listeners.

pub mod fetch;
pub mod types;

use std::rc::Rc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::dom::{Dom, DomError, DomEvent};
use crate::hub::{EventHub, HubEvent};
use crate::store::Store;
use crate::template::{RenderFn, TemplateError};
use crate::transport::Transport;

pub use fetch::{FetchSpec, RequestDescriptor};
pub use types::{EventBinding, Handler, Id, PanelOwner, RenderContext};

#[derive(Error, Debug)]
pub enum PanelError {
    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("panel has no event hub to receive fetched data")]
    HubUnassigned,
}

pub struct Panel {
    store: Store,
    render_fn: RenderFn,
    attach: String,
    ids: Vec<Id>,
    active: bool,
    events: Vec<EventBinding>,
    fetch: Option<FetchSpec>,
    hub: Option<EventHub>,
    owner: Rc<dyn PanelOwner>,
    dom: Rc<dyn Dom>,
    transport: Rc<dyn Transport>,
}

impl Panel {
    /// Create an inactive panel rendering into `attach`.
    ///
    /// `data` seeds the store. Leave it `None` to have the first activation
    /// fetch through the configured [`FetchSpec`].
    pub fn new(
        owner: Rc<dyn PanelOwner>,
        dom: Rc<dyn Dom>,
        transport: Rc<dyn Transport>,
        render_fn: RenderFn,
        attach: impl Into<String>,
        data: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            store: Store::new(data),
            render_fn,
            attach: attach.into(),
            ids: Vec::new(),
            active: false,
            events: Vec::new(),
            fetch: None,
            hub: None,
            owner,
            dom,
            transport,
        }
    }

    pub fn with_events(mut self, events: Vec<EventBinding>) -> Self {
        self.events = events;
        self
    }

    pub fn with_fetch(mut self, fetch: impl Into<FetchSpec>) -> Self {
        self.fetch = Some(fetch.into());
        self
    }

    /// Assign the hub fetched data is delivered through.
    pub fn set_hub(&mut self, hub: EventHub) {
        self.hub = Some(hub);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn ids(&self) -> &[Id] {
        &self.ids
    }

    pub fn attach(&self) -> &str {
        &self.attach
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// Mark the panel active for `ids` and render it.
    ///
    /// Returns `Ok(false)` without doing anything when the panel is already
    /// active for the same ids, or when `ids` is `None` and the panel is active.
    /// `None` on an inactive panel keeps the ids of the previous activation.
    ///
    /// A failed activation leaves the panel inactive, so retrying with the same
    /// ids runs the whole activation again.
    pub fn activate(&mut self, ids: Option<Vec<Id>>) -> Result<bool, PanelError> {
        if self.active && ids.as_ref().map_or(true, |ids| *ids == self.ids) {
            tracing::debug!(attach = %self.attach, ids = ?self.ids, "already active");
            return Ok(false);
        }

        let stale = self.fetch.as_ref().is_some_and(FetchSpec::is_dynamic);
        let needs_fetch = self.fetch.is_some() && (self.store.is_empty() || stale);
        if needs_fetch && self.hub.is_none() {
            return Err(PanelError::HubUnassigned);
        }

        if let Some(ids) = ids {
            self.ids = ids;
        }
        self.active = true;
        tracing::debug!(attach = %self.attach, ids = ?self.ids, "activating");

        let fetched = if needs_fetch { self.get_data() } else { Ok(()) };
        if let Err(e) = fetched.and_then(|()| self.render(true)) {
            tracing::warn!(attach = %self.attach, "activation failed: {}", e);
            self.active = false;
            return Err(e);
        }
        Ok(true)
    }

    /// Mark the panel inactive. Subsequent renders leave the DOM alone until
    /// the next activation.
    pub fn deactivate(&mut self) {
        if self.active {
            tracing::debug!(attach = %self.attach, "deactivating");
        }
        self.active = false;
    }

    /// Issue the panel's data request, if it has one. The response comes back
    /// later through [`notify`](Self::notify).
    pub fn get_data(&self) -> Result<(), PanelError> {
        let Some(fetch) = &self.fetch else {
            return Ok(());
        };
        let hub = self.hub.as_ref().ok_or(PanelError::HubUnassigned)?;
        let request = fetch.resolve();
        tracing::debug!(attach = %self.attach, method = %request.method, url = %request.url, "fetching");
        self.transport.issue(hub, request);
        Ok(())
    }

    pub fn wipe_data(&mut self) {
        self.store.reset();
    }

    /// Apply `event` to the store through the owner's mapping, then render if
    /// anything changed. Safe on an inactive panel: the store is updated and
    /// the render is skipped.
    pub fn notify(&mut self, event: &HubEvent) -> Result<bool, PanelError> {
        let updates = self.owner.map(event, self.store.get(true));
        for (key, value) in updates {
            tracing::trace!(attach = %self.attach, key = %key, "updating");
            self.store.update(key, value);
        }
        self.render(false)
    }

    /// Regenerate the attachment content and rebind events.
    ///
    /// Without `force` nothing happens unless the store changed since the last
    /// read. Returns whether the DOM was written.
    ///
    /// When rendering fails the store keeps its changed state, so a later
    /// unforced render retries.
    pub fn render(&mut self, force: bool) -> Result<bool, PanelError> {
        if !self.active {
            return Ok(false);
        }

        let changed = self.store.is_changed();
        let result = self.render_active(force);
        if result.is_err() && changed {
            self.store.mark_changed();
        }
        result
    }

    fn render_active(&mut self, force: bool) -> Result<bool, PanelError> {
        let data = self.store.get(force);
        if data.is_none() && !force {
            return Ok(false);
        }

        let ctx = RenderContext {
            ids: &self.ids,
            data,
        };
        let html = match ctx.data {
            Some(_) => (self.render_fn)(&ctx)?,
            None => String::new(),
        };

        if let Err(e) = self.dom.set_content(&self.attach, &html) {
            tracing::warn!(attach = %self.attach, "render failed: {}", e);
            return Err(e.into());
        }

        for binding in &self.events {
            let elements = self.dom.select_within(&self.attach, &binding.selector)?;
            tracing::trace!(
                event = %binding.event,
                selector = %binding.selector,
                count = elements.len(),
                "binding"
            );
            for element in elements {
                let handler = binding.handler.clone();
                let target = element.clone();
                self.dom.add_listener(
                    &element,
                    &binding.event,
                    Rc::new(move |evt: &DomEvent| {
                        evt.prevent_default();
                        evt.stop_propagation();
                        handler(evt, &target);
                    }),
                );
            }
        }

        self.owner.after_render(&ctx);
        Ok(true)
    }
}
