//! Combobox component
//!
//! An option list shown in a floating panel, plus a "picked" list of
//! elements mirroring the current selection by value (chips next to the
//! input). Typing narrows the panel to matching options.
//!
//! Keyboard behaviour depends on the panel:
//!
//! - **Open**: Home/End/ArrowUp/ArrowDown move the active option among
//!   matches; Enter/Space pick it; Escape and Tab close the panel.
//! - **Closed**: ArrowUp/ArrowDown step the selection itself without
//!   opening (multiple mode opens instead); Enter/Space open.
//!
//! # Example
//!
//! ```ignore
//! use tessel_cn::prelude::*;
//!
//! let mut combobox = cn::combobox(options_slot, picked_slot, panel, service)
//!     .anchor(input)
//!     .required(true)
//!     .name("fruit")
//!     .build();
//! combobox.refresh(&mut doc)?;
//! combobox.handle_key(&mut doc, Key::Enter)?; // opens the panel
//! ```

use std::rc::Rc;

use tessel_core::{
    Document, ElementId, Key, ListAccessibility, ListConfig, OptionList, Result, SlotId,
    ValidityFlags,
};

use crate::floating::{FloatingPanel, PositionConfig, PositionService};

/// Builder for creating Combobox components with fluent API
pub struct ComboboxBuilder {
    options: SlotId,
    picked: SlotId,
    panel: ElementId,
    service: Rc<dyn PositionService>,
    config: ListConfig,
    anchor: Option<ElementId>,
    position: PositionConfig,
}

impl ComboboxBuilder {
    pub fn new(
        options: SlotId,
        picked: SlotId,
        panel: ElementId,
        service: Rc<dyn PositionService>,
    ) -> Self {
        Self {
            options,
            picked,
            panel,
            service,
            config: ListConfig::default(),
            anchor: None,
            position: PositionConfig::default(),
        }
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.config.multiple = multiple;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.config.required = required;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.config.disabled = disabled;
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.config.min_length = min;
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.config.max_length = Some(max);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Element the panel is positioned against (usually the input)
    pub fn anchor(mut self, anchor: ElementId) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn position(mut self, position: PositionConfig) -> Self {
        self.position = position;
        self
    }

    pub fn build(self) -> Combobox {
        let mut panel = FloatingPanel::new(self.panel, self.service).with_config(self.position);
        if let Some(anchor) = self.anchor {
            panel = panel.with_anchor(anchor);
        }
        Combobox {
            list: OptionList::new(self.options, self.config),
            panel,
            picked: self.picked,
            query: String::new(),
        }
    }
}

/// State exposed to assistive technology
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComboboxAccessibility {
    pub expanded: bool,
    pub listbox: ListAccessibility,
}

/// Combobox component
#[derive(Debug)]
pub struct Combobox {
    list: OptionList,
    panel: FloatingPanel,
    picked: SlotId,
    query: String,
}

impl Combobox {
    pub fn list(&self) -> &OptionList {
        &self.list
    }

    pub fn panel(&self) -> &FloatingPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut FloatingPanel {
        &mut self.panel
    }

    pub fn picked_slot(&self) -> SlotId {
        self.picked
    }

    /// Recompute the option sequence and re-mirror the picked list
    pub fn refresh(&self, doc: &mut Document) -> Result<bool> {
        let changed = self.list.refresh(doc);
        self.sync_picked(doc)?;
        Ok(changed)
    }

    pub fn is_open(&self) -> bool {
        self.panel.is_open()
    }

    /// Open the panel and focus the selected (or first) option
    pub fn open(&mut self, doc: &Document) -> bool {
        if !self.panel.show() {
            return false;
        }
        self.list.focus(doc);
        true
    }

    pub fn close(&mut self) -> bool {
        if !self.panel.hide() {
            return false;
        }
        self.list.blur();
        true
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Narrow the panel; the active option moves to the first match when it stops matching
    pub fn set_query(&mut self, doc: &Document, query: impl Into<String>) -> Result<()> {
        self.query = query.into();
        let still_matches = self
            .list
            .active()
            .is_some_and(|active| self.matches(doc, active));
        if !still_matches && self.is_open() {
            self.list.set_active(doc, self.first_match(doc))?;
        }
        Ok(())
    }

    /// Case-insensitive match on label or value; everything matches an empty query
    pub fn matches(&self, doc: &Document, option: ElementId) -> bool {
        if self.query.is_empty() {
            return true;
        }
        let query = self.query.to_lowercase();
        let hit = |text: Option<&str>| text.is_some_and(|t| t.to_lowercase().contains(&query));
        hit(doc.label(option)) || hit(doc.value(option))
    }

    /// Options visible in the panel
    pub fn filtered(&self, doc: &Document) -> Vec<ElementId> {
        self.list
            .options()
            .into_iter()
            .filter(|id| self.matches(doc, *id))
            .collect()
    }

    fn first_match(&self, doc: &Document) -> Option<ElementId> {
        self.list
            .options()
            .into_iter()
            .find(|id| !doc.is_disabled(*id) && self.matches(doc, *id))
    }

    fn last_match(&self, doc: &Document) -> Option<ElementId> {
        self.list
            .options()
            .into_iter()
            .rev()
            .find(|id| !doc.is_disabled(*id) && self.matches(doc, *id))
    }

    /// Nearest matching option in one direction, saturating at the ends
    fn step_match(&self, doc: &Document, from: ElementId, forward: bool) -> ElementId {
        let mut current = from;
        loop {
            let next = if forward {
                self.list.next(doc, current)
            } else {
                self.list.previous(doc, current)
            };
            if next == current {
                return from;
            }
            if self.matches(doc, next) {
                return next;
            }
            current = next;
        }
    }

    // =========================================================================
    // Interaction
    // =========================================================================

    /// Pointer pick of an option in the panel; single mode closes the panel
    pub fn click(&mut self, doc: &mut Document, option: ElementId) -> Result<bool> {
        let changed = self.list.click(doc, option)?;
        self.sync_picked(doc)?;
        if !self.list.is_multiple() && doc.is_selected(option) {
            self.close();
        }
        Ok(changed)
    }

    /// Pointer activation of a picked chip: deselects the matching option through the gate
    pub fn click_picked(&mut self, doc: &mut Document, item: ElementId) -> Result<bool> {
        let Some(value) = doc.value(item).map(str::to_string) else {
            return Ok(false);
        };
        let target = self
            .list
            .selected(doc)
            .into_iter()
            .find(|id| doc.value(*id) == Some(value.as_str()));
        let Some(target) = target else {
            return Ok(false);
        };
        let changed = self.list.deselect_notify(doc, target)?;
        self.sync_picked(doc)?;
        Ok(changed)
    }

    /// Keyboard interaction; returns whether the key was handled
    pub fn handle_key(&mut self, doc: &mut Document, key: Key) -> Result<bool> {
        if self.is_open() {
            self.handle_open_key(doc, key)
        } else {
            self.handle_closed_key(doc, key)
        }
    }

    fn handle_open_key(&mut self, doc: &mut Document, key: Key) -> Result<bool> {
        let target = match key {
            Key::Escape => return Ok(self.close()),
            Key::Tab => {
                // Close but let focus move on
                self.close();
                return Ok(false);
            }
            Key::Home => self.first_match(doc),
            Key::End => self.last_match(doc),
            Key::ArrowDown => match self.list.active() {
                Some(active) => Some(self.step_match(doc, active, true)),
                None => self.first_match(doc),
            },
            Key::ArrowUp => match self.list.active() {
                Some(active) => Some(self.step_match(doc, active, false)),
                None => self.last_match(doc),
            },
            key if key.is_activation() => {
                return match self.list.active() {
                    Some(active) => {
                        self.click(doc, active)?;
                        Ok(true)
                    }
                    None => Ok(false),
                };
            }
            _ => return Ok(false),
        };

        match target {
            Some(target) => {
                self.list.set_active(doc, Some(target))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn handle_closed_key(&mut self, doc: &mut Document, key: Key) -> Result<bool> {
        match key {
            Key::ArrowDown | Key::ArrowUp if self.list.is_multiple() => Ok(self.open(doc)),
            Key::ArrowDown | Key::ArrowUp => {
                let forward = key == Key::ArrowDown;
                let target = match self.list.selected(doc).first().copied() {
                    Some(current) if forward => Some(self.list.next(doc, current)),
                    Some(current) => Some(self.list.previous(doc, current)),
                    None if forward => self.list.first(doc),
                    None => self.list.last(doc),
                };
                let Some(target) = target else {
                    return Ok(false);
                };
                self.list.select_notify(doc, target)?;
                self.sync_picked(doc)?;
                Ok(true)
            }
            key if key.is_activation() => Ok(self.open(doc)),
            _ => Ok(false),
        }
    }

    /// Mirror the engine's selection onto the picked list by value
    ///
    /// Call after changes made outside the combobox, for example when an
    /// option toggled itself and the list reported `Input`.
    pub fn sync_picked(&self, doc: &mut Document) -> Result<()> {
        let selected: Vec<String> = self
            .list
            .selected(doc)
            .into_iter()
            .filter_map(|id| doc.value(id).map(str::to_string))
            .collect();

        for item in doc.assigned(self.picked).to_vec() {
            let want = doc
                .value(item)
                .is_some_and(|value| selected.iter().any(|s| s == value));
            if doc.is_selected(item) == want {
                continue;
            }
            if want {
                doc.select(item)?;
            } else {
                doc.deselect(item)?;
            }
        }
        Ok(())
    }

    /// Picked elements currently showing as selected
    pub fn picked(&self, doc: &Document) -> Vec<ElementId> {
        doc.assigned(self.picked)
            .iter()
            .copied()
            .filter(|id| doc.is_selected(*id))
            .collect()
    }

    pub fn value(&self, doc: &Document) -> Option<String> {
        self.list.value(doc)
    }

    pub fn validity(&self, doc: &Document) -> ValidityFlags {
        self.list.validity(doc)
    }

    /// Form reset: options back to defaults, panel closed, query cleared
    pub fn reset(&mut self, doc: &mut Document) -> Result<()> {
        self.list.reset(doc);
        self.query.clear();
        self.close();
        self.sync_picked(doc)
    }

    pub fn accessibility(&self, doc: &Document) -> ComboboxAccessibility {
        ComboboxAccessibility {
            expanded: self.is_open(),
            listbox: self.list.accessibility(doc),
        }
    }
}
