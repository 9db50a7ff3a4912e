//! Floating panel
//!
//! A panel positioned relative to an anchor element by an external
//! [`PositionService`]. While the panel is open the service keeps it in
//! place (scroll, resize); the returned [`TrackingHandle`] stops that work
//! when dropped, so closing, re-anchoring or dropping the panel always tears
//! the subscription down.
//!
//! Opening and closing pass through `before_toggle` gates; any gate may
//! veto the change.

use std::rc::Rc;

use smallvec::SmallVec;
use tessel_core::ElementId;

use crate::error::PositionError;

/// Side of the anchor the panel is placed on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Placement {
    Top,
    TopStart,
    TopEnd,
    #[default]
    Bottom,
    BottomStart,
    BottomEnd,
    Left,
    Right,
}

/// Positioning options handed to the service
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionConfig {
    /// Gap between anchor and panel
    pub offset: f32,
    /// Padding kept from the viewport edge when shifting the panel into view
    pub shift: f32,
    pub placement: Placement,
    /// Position against the anchor's inline boxes (wrapped text)
    pub inline: bool,
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            offset: 4.0,
            shift: 8.0,
            placement: Placement::Bottom,
            inline: false,
        }
    }
}

impl PositionConfig {
    pub fn offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    pub fn shift(mut self, shift: f32) -> Self {
        self.shift = shift;
        self
    }

    pub fn placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn inline(mut self, inline: bool) -> Self {
        self.inline = inline;
        self
    }
}

/// Stops position tracking when dropped
pub struct TrackingHandle {
    stop: Option<Box<dyn FnOnce()>>,
}

impl TrackingHandle {
    pub fn new(stop: impl FnOnce() + 'static) -> Self {
        Self {
            stop: Some(Box::new(stop)),
        }
    }

    pub fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

impl Drop for TrackingHandle {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

impl std::fmt::Debug for TrackingHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingHandle")
            .field("active", &self.stop.is_some())
            .finish()
    }
}

/// Keeps a panel positioned against an anchor until the handle is dropped
pub trait PositionService {
    fn start_tracking(
        &self,
        anchor: ElementId,
        panel: ElementId,
        config: &PositionConfig,
    ) -> Result<TrackingHandle, PositionError>;
}

/// Veto for a pending open (`true`) or close (`false`); return false to cancel
pub type ToggleGate = Box<dyn Fn(bool) -> bool>;

/// Open/closed panel tracking its anchor while open
pub struct FloatingPanel {
    panel: ElementId,
    anchor: Option<ElementId>,
    config: PositionConfig,
    open: bool,
    service: Rc<dyn PositionService>,
    tracking: Option<TrackingHandle>,
    gates: SmallVec<[ToggleGate; 2]>,
}

impl FloatingPanel {
    pub fn new(panel: ElementId, service: Rc<dyn PositionService>) -> Self {
        Self {
            panel,
            anchor: None,
            config: PositionConfig::default(),
            open: false,
            service,
            tracking: None,
            gates: SmallVec::new(),
        }
    }

    pub fn with_anchor(mut self, anchor: ElementId) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_config(mut self, config: PositionConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a gate consulted before every open or close
    pub fn on_before_toggle<F>(&mut self, gate: F)
    where
        F: Fn(bool) -> bool + 'static,
    {
        self.gates.push(Box::new(gate));
    }

    pub fn panel(&self) -> ElementId {
        self.panel
    }

    pub fn anchor(&self) -> Option<ElementId> {
        self.anchor
    }

    pub fn config(&self) -> &PositionConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.is_some()
    }

    pub fn show(&mut self) -> bool {
        self.request(true)
    }

    pub fn hide(&mut self) -> bool {
        self.request(false)
    }

    pub fn toggle(&mut self) -> bool {
        self.request(!self.open)
    }

    pub fn set_anchor(&mut self, anchor: Option<ElementId>) {
        if self.anchor != anchor {
            self.anchor = anchor;
            self.retrack();
        }
    }

    pub fn set_config(&mut self, config: PositionConfig) {
        if self.config != config {
            self.config = config;
            self.retrack();
        }
    }

    fn request(&mut self, open: bool) -> bool {
        if self.open == open {
            return false;
        }
        if !self.gates.iter().all(|gate| gate(open)) {
            tracing::debug!(open, "panel toggle cancelled");
            return false;
        }
        self.open = open;
        tracing::debug!(open, panel = ?self.panel, "panel toggled");
        self.retrack();
        true
    }

    /// Restart tracking for the current anchor and config, or stop it when closed
    fn retrack(&mut self) {
        // The old subscription is torn down before a new one starts.
        drop(self.tracking.take());
        if !self.open {
            return;
        }
        let Some(anchor) = self.anchor else {
            tracing::debug!(panel = ?self.panel, "open panel has no anchor to track");
            return;
        };
        match self.service.start_tracking(anchor, self.panel, &self.config) {
            Ok(handle) => self.tracking = Some(handle),
            Err(err) => tracing::warn!(%err, "panel opened without position tracking"),
        }
    }
}

impl std::fmt::Debug for FloatingPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FloatingPanel")
            .field("panel", &self.panel)
            .field("anchor", &self.anchor)
            .field("config", &self.config)
            .field("open", &self.open)
            .field("tracking", &self.tracking.is_some())
            .field("gates", &self.gates.len())
            .finish()
    }
}
