//! Accordion over disclosure elements
//!
//! A set of vertically stacked disclosures sharing one selection engine.
//! Supports single-open (opening one closes the others) or multi-open
//! modes. With `required`, the last open section cannot be closed, but
//! more sections can always be opened.
//!
//! # Example
//!
//! ```ignore
//! let accordion = Accordion::new(slot, AccordionMode::Single).required(true);
//! accordion.refresh(&mut doc);
//!
//! accordion.open(&mut doc, second)?;   // closes the first
//! accordion.close(&mut doc, second)?;  // refused: nothing else is open
//! ```

use crate::document::{Document, ElementId, SlotId};
use crate::error::Result;
use crate::keyboard::Key;
use crate::list::{AccordionPolicy, ListConfig, ListMutation, OptionList};

/// Accordion mode - single or multi open
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccordionMode {
    /// Only one section can be open at a time (default)
    #[default]
    Single,
    /// Multiple sections can be open simultaneously
    Multi,
}

/// Accordion component - disclosures with mutual exclusivity
#[derive(Clone, Debug)]
pub struct Accordion {
    list: OptionList<AccordionPolicy>,
}

impl Accordion {
    pub fn new(slot: SlotId, mode: AccordionMode) -> Self {
        let config = ListConfig::new().multiple(mode == AccordionMode::Multi);
        Self {
            list: OptionList::with_policy(slot, config, AccordionPolicy),
        }
    }

    /// Keep at least one section open
    pub fn required(self, required: bool) -> Self {
        self.list.update_config(|config| config.required = required);
        self
    }

    pub fn mode(&self) -> AccordionMode {
        if self.list.is_multiple() {
            AccordionMode::Multi
        } else {
            AccordionMode::Single
        }
    }

    pub fn set_mode(&self, doc: &mut Document, mode: AccordionMode) {
        self.list
            .apply(doc, ListMutation::Multiple(mode == AccordionMode::Multi));
    }

    pub fn set_required(&self, doc: &mut Document, required: bool) {
        self.list.apply(doc, ListMutation::Required(required));
    }

    pub fn set_disabled(&self, doc: &mut Document, disabled: bool) {
        self.list.apply(doc, ListMutation::Disabled(disabled));
    }

    /// Underlying engine (navigation, observers, recompute)
    pub fn list(&self) -> &OptionList<AccordionPolicy> {
        &self.list
    }

    pub fn refresh(&self, doc: &mut Document) -> bool {
        self.list.refresh(doc)
    }

    pub fn items(&self) -> Vec<ElementId> {
        self.list.options()
    }

    pub fn open_items(&self, doc: &Document) -> Vec<ElementId> {
        self.list.selected(doc)
    }

    pub fn is_open(&self, doc: &Document, item: ElementId) -> bool {
        self.list.contains(item) && doc.is_open(item)
    }

    /// Open `item`; in single mode every other section closes
    pub fn open(&self, doc: &mut Document, item: ElementId) -> Result<bool> {
        let opened = self.list.select(doc, item)?;
        if opened {
            tracing::debug!(?item, "accordion section opened");
        }
        Ok(opened)
    }

    /// Close `item` unless it is the last open section of a required accordion
    pub fn close(&self, doc: &mut Document, item: ElementId) -> Result<bool> {
        let closed = self.list.deselect(doc, item)?;
        if closed {
            tracing::debug!(?item, "accordion section closed");
        }
        Ok(closed)
    }

    pub fn toggle(&self, doc: &mut Document, item: ElementId) -> Result<bool> {
        if doc.is_open(item) {
            self.close(doc, item)
        } else {
            self.open(doc, item)
        }
    }

    /// User activation of a section trigger
    ///
    /// The section becomes active and toggles through the list gates.
    pub fn activate_trigger(&self, doc: &mut Document, trigger: ElementId) -> Result<bool> {
        let Some(item) = self
            .items()
            .into_iter()
            .find(|item| doc.triggers_of(*item).contains(&trigger))
        else {
            return Ok(doc.activate_trigger(trigger)?);
        };
        self.list.set_active(doc, Some(item))?;
        Ok(doc.activate_trigger(trigger)?)
    }

    /// Home/End/ArrowUp/ArrowDown move between enabled sections; Enter/Space toggle
    pub fn handle_key(&self, doc: &mut Document, key: Key) -> Result<bool> {
        self.list.handle_key(doc, key)
    }

    /// Advance section transitions; true while any is animating
    pub fn tick(&self, doc: &mut Document, dt: f32) -> bool {
        doc.tick(dt)
    }
}
