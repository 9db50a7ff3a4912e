//! Host document
//!
//! The document stands in for the DOM: it owns every element, the ordered
//! children assigned to each slot, and the listener table used for option
//! events. Lists never own elements; they hold [`ElementId`]s and read or
//! mutate through the document.
//!
//! Element identity is the slotmap key. A removed element's id goes stale
//! and is never reused for a different element, so id equality is
//! reference equality.
//!
//! # Option primitive
//!
//! [`Document::toggle`], [`Document::select`] and [`Document::deselect`]
//! raise a cancelable [`OptionEvent::BeforeChange`] before committing and an
//! informational [`OptionEvent::Changed`] afterwards. [`Document::reset`]
//! restores the values captured when the element was created.
//!
//! # Disclosure primitive
//!
//! A disclosure is an option whose `selected` flag doubles as `open`.
//! Opening or closing goes through the same signals and retargets the
//! element's [`ExpandTransition`]; [`Document::tick`] advances transitions.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use tessel_animation::ExpandTransition;
use tokio::sync::watch;

use crate::error::DocumentError;
use crate::events::{EventControl, ListenerId, OptionEvent, OptionListener};
use crate::registry::{ElementKind, ElementRegistry};

new_key_type! {
    /// Stable identity of an element in a [`Document`]
    pub struct ElementId;
    /// A slot whose assigned children an option list observes
    pub struct SlotId;
}

/// Document shared between a host event loop and async recomputes
pub type SharedDocument = Rc<RefCell<Document>>;

type DocResult<T> = std::result::Result<T, DocumentError>;

/// Initial attributes for a new element
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OptionInit {
    pub value: String,
    pub label: String,
    pub selected: bool,
    pub disabled: bool,
}

impl OptionInit {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
            ..Default::default()
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// Attribute mutations on an element
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionAttr {
    Value(String),
    Label(String),
    Disabled(bool),
    DefaultSelected(bool),
}

struct Element {
    tag: String,
    value: String,
    label: String,
    disabled: bool,
    selected: bool,
    default_value: String,
    default_disabled: bool,
    default_selected: bool,
    transition: ExpandTransition,
}

struct Slot {
    assigned: Vec<ElementId>,
    version: watch::Sender<u64>,
}

struct ListenerEntry {
    target: ElementId,
    listener: Rc<dyn OptionListener>,
}

/// Element arena, slot assignments, and option event dispatch
pub struct Document {
    registry: Rc<dyn ElementRegistry>,
    elements: SlotMap<ElementId, Element>,
    slots: SlotMap<SlotId, Slot>,
    listeners: SlotMap<ListenerId, ListenerEntry>,
    by_target: FxHashMap<ElementId, SmallVec<[ListenerId; 2]>>,
    /// trigger -> disclosure
    triggers: FxHashMap<ElementId, ElementId>,
}

impl Document {
    pub fn new(registry: Rc<dyn ElementRegistry>) -> Self {
        Self {
            registry,
            elements: SlotMap::with_key(),
            slots: SlotMap::with_key(),
            listeners: SlotMap::with_key(),
            by_target: FxHashMap::default(),
            triggers: FxHashMap::default(),
        }
    }

    pub fn into_shared(self) -> SharedDocument {
        Rc::new(RefCell::new(self))
    }

    pub fn registry(&self) -> Rc<dyn ElementRegistry> {
        Rc::clone(&self.registry)
    }

    // =========================================================================
    // Elements
    // =========================================================================

    /// Create an element; its defaults are captured from `init`
    pub fn create_element(&mut self, tag: impl Into<String>, init: OptionInit) -> ElementId {
        self.elements.insert(Element {
            tag: tag.into(),
            transition: ExpandTransition::new(init.selected),
            default_value: init.value.clone(),
            default_disabled: init.disabled,
            default_selected: init.selected,
            value: init.value,
            label: init.label,
            disabled: init.disabled,
            selected: init.selected,
        })
    }

    /// Remove an element along with its listeners, trigger bindings and slot assignments
    pub fn remove(&mut self, id: ElementId) -> bool {
        if self.elements.remove(id).is_none() {
            return false;
        }

        if let Some(listener_ids) = self.by_target.remove(&id) {
            for listener_id in listener_ids {
                self.listeners.remove(listener_id);
            }
        }
        self.triggers
            .retain(|trigger, disclosure| *trigger != id && *disclosure != id);

        for slot in self.slots.values_mut() {
            let before = slot.assigned.len();
            slot.assigned.retain(|assigned| *assigned != id);
            if slot.assigned.len() != before {
                slot.version.send_modify(|v| *v += 1);
            }
        }
        true
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(id)
    }

    pub fn tag(&self, id: ElementId) -> Option<&str> {
        self.elements.get(id).map(|el| el.tag.as_str())
    }

    /// Kind of the element's tag, `None` while the tag is undefined
    pub fn kind(&self, id: ElementId) -> Option<ElementKind> {
        self.elements
            .get(id)
            .and_then(|el| self.registry.kind_of(&el.tag))
    }

    pub fn is_option(&self, id: ElementId) -> bool {
        self.kind(id).is_some_and(ElementKind::is_option)
    }

    pub fn is_disclosure(&self, id: ElementId) -> bool {
        self.kind(id) == Some(ElementKind::Disclosure)
    }

    pub fn value(&self, id: ElementId) -> Option<&str> {
        self.elements.get(id).map(|el| el.value.as_str())
    }

    pub fn label(&self, id: ElementId) -> Option<&str> {
        self.elements.get(id).map(|el| el.label.as_str())
    }

    pub fn is_selected(&self, id: ElementId) -> bool {
        self.elements.get(id).is_some_and(|el| el.selected)
    }

    pub fn is_disabled(&self, id: ElementId) -> bool {
        self.elements.get(id).is_some_and(|el| el.disabled)
    }

    pub fn default_selected(&self, id: ElementId) -> bool {
        self.elements.get(id).is_some_and(|el| el.default_selected)
    }

    /// Open state of a disclosure (false for anything else)
    pub fn is_open(&self, id: ElementId) -> bool {
        self.is_disclosure(id) && self.is_selected(id)
    }

    pub fn transition(&self, id: ElementId) -> Option<&ExpandTransition> {
        self.elements.get(id).map(|el| &el.transition)
    }

    /// Apply an attribute mutation; selection is never touched here
    pub fn set_attr(&mut self, id: ElementId, attr: OptionAttr) -> DocResult<()> {
        let el = self
            .elements
            .get_mut(id)
            .ok_or(DocumentError::UnknownElement(id))?;
        match attr {
            OptionAttr::Value(value) => el.value = value,
            OptionAttr::Label(label) => el.label = label,
            OptionAttr::Disabled(disabled) => el.disabled = disabled,
            OptionAttr::DefaultSelected(selected) => el.default_selected = selected,
        }
        Ok(())
    }

    pub fn set_value(&mut self, id: ElementId, value: impl Into<String>) -> DocResult<()> {
        self.set_attr(id, OptionAttr::Value(value.into()))
    }

    pub fn set_disabled(&mut self, id: ElementId, disabled: bool) -> DocResult<()> {
        self.set_attr(id, OptionAttr::Disabled(disabled))
    }

    // =========================================================================
    // Option primitive
    // =========================================================================

    pub fn toggle(&mut self, id: ElementId) -> DocResult<bool> {
        let selected = self.require(id)?.selected;
        self.request_selected(id, !selected)
    }

    pub fn select(&mut self, id: ElementId) -> DocResult<bool> {
        self.request_selected(id, true)
    }

    pub fn deselect(&mut self, id: ElementId) -> DocResult<bool> {
        self.request_selected(id, false)
    }

    /// Open a disclosure (same signals as `select`)
    pub fn open(&mut self, id: ElementId) -> DocResult<bool> {
        self.request_selected(id, true)
    }

    /// Close a disclosure (same signals as `deselect`)
    pub fn close(&mut self, id: ElementId) -> DocResult<bool> {
        self.request_selected(id, false)
    }

    /// Restore value, disabled and selected to their captured defaults
    ///
    /// No events are raised; returns whether `selected` changed.
    pub fn reset(&mut self, id: ElementId) -> DocResult<bool> {
        let el = self
            .elements
            .get_mut(id)
            .ok_or(DocumentError::UnknownElement(id))?;
        el.value = el.default_value.clone();
        el.disabled = el.default_disabled;
        let changed = el.selected != el.default_selected;
        el.selected = el.default_selected;
        el.transition.set_expanded(el.selected);
        Ok(changed)
    }

    /// Raise the before/after pair around a selection change
    ///
    /// Returns `Ok(false)` when nothing changed or a listener cancelled.
    fn request_selected(&mut self, id: ElementId, selected: bool) -> DocResult<bool> {
        if self.require(id)?.selected == selected {
            return Ok(false);
        }

        let before = OptionEvent::BeforeChange {
            target: id,
            selected,
        };
        if self.dispatch(&before) {
            tracing::debug!(?id, selected, "option change cancelled");
            return Ok(false);
        }

        // A listener may have removed the element or changed it already.
        match self.elements.get(id) {
            Some(el) if el.selected != selected => {}
            Some(_) => return Ok(false),
            None => return Err(DocumentError::UnknownElement(id)),
        }
        self.set_selected_forced(id, selected);

        self.dispatch(&OptionEvent::Changed {
            target: id,
            selected,
        });
        Ok(true)
    }

    /// Commit a selection change without raising events
    ///
    /// Reserved for owning lists enforcing their own invariants.
    pub(crate) fn set_selected_forced(&mut self, id: ElementId, selected: bool) -> bool {
        let Some(el) = self.elements.get_mut(id) else {
            return false;
        };
        if el.selected == selected {
            return false;
        }
        el.selected = selected;
        el.transition.set_expanded(selected);
        true
    }

    /// Advance every running disclosure transition; returns true while any is moving
    pub fn tick(&mut self, dt: f32) -> bool {
        let mut running = false;
        for el in self.elements.values_mut() {
            if el.transition.is_running() {
                running |= el.transition.step(dt);
            }
        }
        running
    }

    // =========================================================================
    // Disclosure triggers
    // =========================================================================

    /// Bind `trigger` so activating it toggles `disclosure`
    pub fn add_trigger(&mut self, disclosure: ElementId, trigger: ElementId) -> DocResult<()> {
        self.require(disclosure)?;
        self.require(trigger)?;
        self.triggers.insert(trigger, disclosure);
        Ok(())
    }

    pub fn triggers_of(&self, disclosure: ElementId) -> SmallVec<[ElementId; 2]> {
        self.triggers
            .iter()
            .filter(|(_, d)| **d == disclosure)
            .map(|(t, _)| *t)
            .collect()
    }

    /// User activation of a trigger; disabled disclosures ignore it
    pub fn activate_trigger(&mut self, trigger: ElementId) -> DocResult<bool> {
        let disclosure = *self
            .triggers
            .get(&trigger)
            .ok_or(DocumentError::NotATrigger(trigger))?;
        if self.is_disabled(disclosure) {
            return Ok(false);
        }
        self.toggle(disclosure)
    }

    // =========================================================================
    // Slots
    // =========================================================================

    pub fn create_slot(&mut self) -> SlotId {
        self.slots.insert(Slot {
            assigned: Vec::new(),
            version: watch::channel(0).0,
        })
    }

    /// Replace the slot's assigned elements, signalling watchers
    pub fn assign(&mut self, slot: SlotId, elements: Vec<ElementId>) {
        if let Some(slot) = self.slots.get_mut(slot) {
            slot.assigned = elements;
            slot.version.send_modify(|v| *v += 1);
        }
    }

    /// Append one element to the slot, signalling watchers
    pub fn append(&mut self, slot: SlotId, element: ElementId) {
        if let Some(slot) = self.slots.get_mut(slot) {
            slot.assigned.push(element);
            slot.version.send_modify(|v| *v += 1);
        }
    }

    pub fn assigned(&self, slot: SlotId) -> &[ElementId] {
        self.slots
            .get(slot)
            .map(|s| s.assigned.as_slice())
            .unwrap_or_default()
    }

    pub fn slot_version(&self, slot: SlotId) -> u64 {
        self.slots.get(slot).map_or(0, |s| *s.version.borrow())
    }

    /// Receiver that changes on every assignment to `slot`
    pub fn watch_slot(&self, slot: SlotId) -> Option<watch::Receiver<u64>> {
        self.slots.get(slot).map(|s| s.version.subscribe())
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    pub fn add_listener(
        &mut self,
        target: ElementId,
        listener: Rc<dyn OptionListener>,
    ) -> ListenerId {
        let id = self.listeners.insert(ListenerEntry { target, listener });
        self.by_target.entry(target).or_default().push(id);
        id
    }

    /// Register a closure listener
    pub fn on_event<F>(&mut self, target: ElementId, f: F) -> ListenerId
    where
        F: Fn(&mut Document, &OptionEvent, &mut EventControl) + 'static,
    {
        self.add_listener(target, Rc::new(f))
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let Some(entry) = self.listeners.remove(id) else {
            return false;
        };
        if let Some(ids) = self.by_target.get_mut(&entry.target) {
            ids.retain(|l| *l != id);
            if ids.is_empty() {
                self.by_target.remove(&entry.target);
            }
        }
        true
    }

    pub fn listener_count(&self, target: ElementId) -> usize {
        self.by_target.get(&target).map_or(0, |ids| ids.len())
    }

    /// Deliver `event` to the target's listeners; returns whether it was cancelled
    fn dispatch(&mut self, event: &OptionEvent) -> bool {
        // Snapshot first: listeners may add or remove listeners while running.
        let listeners: SmallVec<[Rc<dyn OptionListener>; 4]> = self
            .by_target
            .get(&event.target())
            .into_iter()
            .flatten()
            .filter_map(|id| self.listeners.get(*id))
            .map(|entry| Rc::clone(&entry.listener))
            .collect();

        let mut control = EventControl::new(event.is_cancelable());
        for listener in listeners {
            listener.handle_event(self, event, &mut control);
        }
        control.is_cancelled()
    }

    fn require(&self, id: ElementId) -> DocResult<&Element> {
        self.elements
            .get(id)
            .ok_or(DocumentError::UnknownElement(id))
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("elements", &self.elements.len())
            .field("slots", &self.slots.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
