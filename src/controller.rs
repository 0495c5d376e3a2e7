//! Owns a set of named panels and feeds them hub events.
//!
//! A DOM attachment point belongs to at most one active panel: once a panel
//! activates, any other active panel mounted on the same selector is
//! deactivated. A failed activation displaces nothing.

use thiserror::Error;

use crate::hub::{EventHub, HubEvent, HubReceiver};
use crate::panel::{Id, Panel, PanelError};

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("no panel named {0:?}")]
    UnknownPanel(String),

    #[error("duplicate panel name {0:?}")]
    DuplicatePanel(String),

    #[error("panel {name:?}: {source}")]
    Panel {
        name: String,
        #[source]
        source: PanelError,
    },
}

pub struct Controller {
    hub: EventHub,
    rx: HubReceiver,
    panels: Vec<(String, Panel)>,
}

impl Controller {
    pub fn new() -> Self {
        let (hub, rx) = EventHub::channel();
        Self {
            hub,
            rx,
            panels: Vec::new(),
        }
    }

    /// Handle for posting events, e.g. from DOM event handlers.
    pub fn hub(&self) -> EventHub {
        self.hub.clone()
    }

    /// Register `panel` under `name` and assign it this controller's hub.
    pub fn add(&mut self, name: impl Into<String>, mut panel: Panel) -> Result<(), ControllerError> {
        let name = name.into();
        if self.panels.iter().any(|(n, _)| *n == name) {
            return Err(ControllerError::DuplicatePanel(name));
        }
        panel.set_hub(self.hub.clone());
        self.panels.push((name, panel));
        Ok(())
    }

    pub fn panel(&self, name: &str) -> Option<&Panel> {
        self.panels.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn panel_mut(&mut self, name: &str) -> Option<&mut Panel> {
        self.panels.iter_mut().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    /// Activate `name` for `ids`, then deactivate whichever other panel
    /// occupied the same attachment point.
    pub fn activate(&mut self, name: &str, ids: Option<Vec<Id>>) -> Result<bool, ControllerError> {
        let idx = self.index_of(name)?;
        let rendered = self.panels[idx]
            .1
            .activate(ids)
            .map_err(|source| ControllerError::Panel {
                name: name.to_string(),
                source,
            })?;

        let attach = self.panels[idx].1.attach().to_string();
        for (other, panel) in self.panels.iter_mut() {
            if other != name && panel.is_active() && panel.attach() == attach {
                tracing::debug!(panel = %other, attach = %attach, "displaced");
                panel.deactivate();
            }
        }
        Ok(rendered)
    }

    pub fn deactivate(&mut self, name: &str) -> Result<(), ControllerError> {
        let idx = self.index_of(name)?;
        self.panels[idx].1.deactivate();
        Ok(())
    }

    /// Notify every panel of `event`. A failing panel does not stop the others;
    /// its error is logged. Returns how many panels re-rendered.
    pub fn dispatch(&mut self, event: &HubEvent) -> usize {
        let mut rendered = 0;
        for (name, panel) in self.panels.iter_mut() {
            match panel.notify(event) {
                Ok(true) => rendered += 1,
                Ok(false) => {}
                Err(e) => tracing::error!(panel = %name, "notify failed: {}", e),
            }
        }
        rendered
    }

    /// Dispatch every event already queued on the hub. Returns how many events
    /// were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.rx.try_recv() {
            self.dispatch(&event);
            handled += 1;
        }
        handled
    }

    /// Wait for the next hub event and dispatch it. The event is returned so
    /// callers can decide when to stop.
    pub async fn next_event(&mut self) -> Option<HubEvent> {
        let event = self.rx.recv().await?;
        self.dispatch(&event);
        Some(event)
    }

    fn index_of(&self, name: &str) -> Result<usize, ControllerError> {
        self.panels
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| ControllerError::UnknownPanel(name.to_string()))
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}
