//! Option event dispatch
//!
//! Every selection change on an option goes through two signals:
//!
//! 1. [`OptionEvent::BeforeChange`] - cancelable; any listener may call
//!    [`EventControl::prevent_default`] and the change is dropped.
//! 2. [`OptionEvent::Changed`] - informational; fired after the new value
//!    is committed.
//!
//! Listeners receive the document mutably so an owning list can react to a
//! committed change (for example by deselecting siblings) without holding a
//! reference back into the document.

use slotmap::new_key_type;

use crate::document::{Document, ElementId};

new_key_type! {
    /// Handle returned when registering a listener on an element
    pub struct ListenerId;
}

/// Signals raised by an option's selection changes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionEvent {
    /// `target` is about to become `selected`; may be cancelled
    BeforeChange { target: ElementId, selected: bool },
    /// `target` is now `selected`
    Changed { target: ElementId, selected: bool },
}

impl OptionEvent {
    pub fn target(&self) -> ElementId {
        match *self {
            OptionEvent::BeforeChange { target, .. } | OptionEvent::Changed { target, .. } => {
                target
            }
        }
    }

    pub fn is_cancelable(&self) -> bool {
        matches!(self, OptionEvent::BeforeChange { .. })
    }
}

/// Per-dispatch control passed to every listener
#[derive(Debug, Default)]
pub struct EventControl {
    cancelable: bool,
    cancelled: bool,
}

impl EventControl {
    pub(crate) fn new(cancelable: bool) -> Self {
        Self {
            cancelable,
            cancelled: false,
        }
    }

    /// Cancel the pending change (ignored for informational events)
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.cancelled = true;
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Receives option events for the elements it is registered on
pub trait OptionListener {
    fn handle_event(&self, doc: &mut Document, event: &OptionEvent, control: &mut EventControl);
}

impl<F> OptionListener for F
where
    F: Fn(&mut Document, &OptionEvent, &mut EventControl),
{
    fn handle_event(&self, doc: &mut Document, event: &OptionEvent, control: &mut EventControl) {
        self(doc, event, control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prevent_default_only_when_cancelable() {
        let mut control = EventControl::new(false);
        control.prevent_default();
        assert!(!control.is_cancelled());

        let mut control = EventControl::new(true);
        control.prevent_default();
        assert!(control.is_cancelled());
    }
}
