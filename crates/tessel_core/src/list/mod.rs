//! Option-list selection engine
//!
//! An [`OptionList`] owns an ordered snapshot of the option elements assigned
//! to one slot of the host [`Document`]. It tracks which member is active,
//! enforces single/multiple selection and the minimum selected count, and
//! derives form value and validity from the members' state.
//!
//! # Ownership
//!
//! Options live in the document. The list holds their ids plus one listener
//! registration per member; the listener holds only a weak handle back to
//! the list, so dropping the list silently detaches it.
//!
//! # Gated and forced paths
//!
//! User-initiated changes (an option toggling itself, [`OptionList::click`],
//! keyboard activation, the `*_notify` methods) consult
//! [`OptionList::can_select`] / [`OptionList::can_deselect`] first and
//! schedule one coalesced `Input`/`Change` pair. Programmatic
//! [`OptionList::select`] / [`OptionList::deselect`] skip the read-only gate
//! but still refuse to drop below the minimum. Sibling updates (single-select
//! exclusivity, mirrored values) are committed without per-option events.
//!
//! ```ignore
//! let list = OptionList::new(slot, ListConfig::new().required(true));
//! list.refresh(&mut doc);
//!
//! list.select(&mut doc, b)?;
//! assert!(!doc.is_selected(a));
//! assert_eq!(list.deselect(&mut doc, b)?, false);
//! ```

mod config;
mod policy;

pub use config::{ListConfig, ListMutation};
pub use policy::{AccordionPolicy, OptionsPolicy, SelectionPolicy};

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use tokio::task::JoinHandle;

use crate::document::{Document, ElementId, SharedDocument, SlotId};
use crate::error::{ListError, Result};
use crate::events::{EventControl, ListenerId, OptionEvent, OptionListener};
use crate::form::{FormData, FormHost, ListSnapshot, ValidityFlags};
use crate::keyboard::Key;
use crate::notify::Debouncer;

new_key_type! {
    /// Handle returned by [`OptionList::subscribe`]
    pub struct ObserverId;
}

/// Signals delivered to list observers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListEvent {
    /// The user changed the selection (coalesced per burst)
    Input,
    /// Always follows `Input`
    Change,
    /// The active element moved; delivered immediately
    ActiveChanged(Option<ElementId>),
}

/// State exposed to assistive technology
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListAccessibility {
    pub multiselectable: bool,
    pub required: bool,
    pub disabled: bool,
    pub read_only: bool,
    pub invalid: bool,
    pub active_descendant: Option<ElementId>,
}

/// User-facing message for the first failing flag, empty when valid
pub fn validation_message(config: &ListConfig, flags: ValidityFlags) -> String {
    if flags.value_missing {
        "Please select an item.".to_string()
    } else if flags.too_short {
        format!("Please select at least {} items.", config.min_length)
    } else if flags.too_long {
        match (config.multiple, config.max_length) {
            (true, Some(max)) => format!("Please select no more than {max} items."),
            _ => "Please select only one item.".to_string(),
        }
    } else {
        String::new()
    }
}

type Observer = Rc<dyn Fn(&ListEvent)>;

#[derive(Default)]
struct ListState {
    config: ListConfig,
    sequence: Vec<ElementId>,
    active: Option<ElementId>,
    /// member -> listener registered on it
    subscriptions: FxHashMap<ElementId, ListenerId>,
}

struct ListInner<P> {
    policy: P,
    slot: SlotId,
    state: RefCell<ListState>,
    notifier: Debouncer,
    observers: RefCell<SlotMap<ObserverId, Observer>>,
    form: RefCell<Option<Box<dyn FormHost>>>,
    recomputing: Cell<bool>,
    rerun: Cell<bool>,
}

/// Selection engine over the options assigned to one slot
///
/// Cloning is cheap and yields another handle to the same list.
pub struct OptionList<P: SelectionPolicy = OptionsPolicy> {
    inner: Rc<ListInner<P>>,
}

impl<P: SelectionPolicy> Clone for OptionList<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl OptionList<OptionsPolicy> {
    pub fn new(slot: SlotId, config: ListConfig) -> Self {
        Self::with_policy(slot, config, OptionsPolicy)
    }
}

impl<P: SelectionPolicy> OptionList<P> {
    pub fn with_policy(slot: SlotId, config: ListConfig, policy: P) -> Self {
        Self {
            inner: Rc::new(ListInner {
                policy,
                slot,
                state: RefCell::new(ListState {
                    config,
                    ..Default::default()
                }),
                notifier: Debouncer::new(),
                observers: RefCell::new(SlotMap::with_key()),
                form: RefCell::new(None),
                recomputing: Cell::new(false),
                rerun: Cell::new(false),
            }),
        }
    }

    pub fn slot(&self) -> SlotId {
        self.inner.slot
    }

    pub fn policy(&self) -> &P {
        &self.inner.policy
    }

    pub fn config(&self) -> ListConfig {
        self.inner.state.borrow().config.clone()
    }

    pub fn is_multiple(&self) -> bool {
        self.inner.state.borrow().config.multiple
    }

    /// Owned sequence in document order
    pub fn options(&self) -> Vec<ElementId> {
        self.inner.state.borrow().sequence.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.state.borrow().sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, option: ElementId) -> bool {
        self.inner.state.borrow().sequence.contains(&option)
    }

    /// Apply a configuration change and re-settle selection
    pub fn apply(&self, doc: &mut Document, mutation: ListMutation) {
        tracing::debug!(?mutation, "list configuration changed");
        self.inner.state.borrow_mut().config.apply(mutation);
        self.enforce_single(doc);
        self.sync_form(doc);
    }

    /// Adjust configuration before the first recompute
    pub(crate) fn update_config(&self, f: impl FnOnce(&mut ListConfig)) {
        f(&mut self.inner.state.borrow_mut().config);
    }

    /// Disabled state propagated from an ancestor form
    pub fn set_form_disabled(&self, doc: &mut Document, disabled: bool) {
        self.apply(doc, ListMutation::FormDisabled(disabled));
    }

    // =========================================================================
    // Sequence recompute
    // =========================================================================

    /// Re-derive the owned sequence from the slot's defined children
    ///
    /// Returns false when the sequence is unchanged, in which case nothing
    /// is resubscribed.
    pub fn refresh(&self, doc: &mut Document) -> bool {
        let refreshed = self.refresh_sequence(doc);
        self.deliver(refreshed)
    }

    /// Sequence diff without notifying observers; see [`deliver`](Self::deliver)
    fn refresh_sequence(&self, doc: &mut Document) -> Refreshed {
        let policy = &self.inner.policy;
        let mut seen = FxHashSet::default();
        let next: Vec<ElementId> = doc
            .assigned(self.inner.slot)
            .iter()
            .copied()
            .filter(|id| doc.kind(*id).is_some_and(|kind| policy.accepts(kind)))
            .filter(|id| seen.insert(*id))
            .collect();

        let cleared_active = {
            let mut state = self.inner.state.borrow_mut();
            if state.sequence == next {
                tracing::trace!(members = next.len(), "recompute: sequence unchanged");
                return Refreshed::default();
            }

            // Unsubscribe leavers before subscribing newcomers.
            let mut previous = std::mem::take(&mut state.subscriptions);
            previous.retain(|member, listener| {
                let stays = seen.contains(member);
                if !stays {
                    doc.remove_listener(*listener);
                }
                stays
            });

            let mut table = FxHashMap::default();
            for member in &next {
                let listener = match previous.remove(member) {
                    Some(listener) => listener,
                    None => doc.add_listener(
                        *member,
                        Rc::new(MemberListener {
                            list: Rc::downgrade(&self.inner),
                        }),
                    ),
                };
                table.insert(*member, listener);
            }

            state.subscriptions = table;
            state.sequence = next;

            let stale = state.active.is_some_and(|active| !seen.contains(&active));
            if stale {
                state.active = None;
            }
            stale
        };

        self.enforce_single(doc);
        self.sync_form(doc);
        tracing::debug!(members = self.len(), "recompute: sequence replaced");
        Refreshed {
            changed: true,
            cleared_active,
        }
    }

    /// Observer half of a refresh; runs once the document is released
    fn deliver(&self, refreshed: Refreshed) -> bool {
        if refreshed.cleared_active {
            self.emit(&ListEvent::ActiveChanged(None));
        }
        refreshed.changed
    }

    /// Await undefined custom children, then [`refresh`](Self::refresh)
    ///
    /// A call made while another is waiting returns false immediately and
    /// makes the running one refresh again once it resumes.
    pub async fn recompute(&self, doc: &SharedDocument) -> bool {
        if self.inner.recomputing.replace(true) {
            self.inner.rerun.set(true);
            tracing::trace!("recompute already running; queued a re-run");
            return false;
        }
        let _guard = RecomputeGuard(&self.inner.recomputing);

        let mut changed = false;
        loop {
            self.inner.rerun.set(false);
            self.await_pending_definitions(doc).await;
            // Observers may read the document, so it is released before they run.
            let refreshed = self.refresh_sequence(&mut doc.borrow_mut());
            changed |= self.deliver(refreshed);
            if !self.inner.rerun.get() {
                break;
            }
        }
        changed
    }

    async fn await_pending_definitions(&self, doc: &SharedDocument) {
        let (registry, pending) = {
            let doc = doc.borrow();
            let registry = doc.registry();
            let pending: IndexSet<String> = doc
                .assigned(self.inner.slot)
                .iter()
                .filter_map(|id| doc.tag(*id))
                .filter(|tag| registry.is_pending(tag))
                .map(str::to_string)
                .collect();
            (registry, pending)
        };

        for tag in pending {
            match registry.when_defined(&tag).await {
                Ok(kind) => tracing::trace!(tag = %tag, ?kind, "custom element upgraded"),
                Err(err) => {
                    tracing::warn!(%err, "custom element never upgraded; continuing without it")
                }
            }
        }
    }

    /// Spawn a local task that recomputes now and on every slot assignment
    ///
    /// Must run inside a `tokio::task::LocalSet`. Abort the handle to stop
    /// watching; `None` when the slot does not exist.
    pub fn watch_slot(&self, doc: SharedDocument) -> Option<JoinHandle<()>> {
        let mut changes = doc.borrow().watch_slot(self.inner.slot)?;
        let list = self.clone();
        Some(tokio::task::spawn_local(async move {
            list.recompute(&doc).await;
            while changes.changed().await.is_ok() {
                list.recompute(&doc).await;
            }
            tracing::trace!("slot watcher finished");
        }))
    }

    /// Drop every member subscription and forget the sequence
    pub fn disconnect(&self, doc: &mut Document) {
        let had_active = {
            let mut state = self.inner.state.borrow_mut();
            for (_, listener) in state.subscriptions.drain() {
                doc.remove_listener(listener);
            }
            state.sequence.clear();
            state.active.take().is_some()
        };
        if had_active {
            self.emit(&ListEvent::ActiveChanged(None));
        }
        tracing::debug!("list disconnected");
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// First enabled member
    pub fn first(&self, doc: &Document) -> Option<ElementId> {
        let state = self.inner.state.borrow();
        state.sequence.iter().copied().find(|id| !doc.is_disabled(*id))
    }

    /// Last enabled member
    pub fn last(&self, doc: &Document) -> Option<ElementId> {
        let state = self.inner.state.borrow();
        state.sequence.iter().copied().rfind(|id| !doc.is_disabled(*id))
    }

    /// Nearest enabled member after `from`; `from` itself at the end
    pub fn next(&self, doc: &Document, from: ElementId) -> ElementId {
        let state = self.inner.state.borrow();
        let Some(pos) = state.sequence.iter().position(|id| *id == from) else {
            return from;
        };
        state.sequence[pos + 1..]
            .iter()
            .copied()
            .find(|id| !doc.is_disabled(*id))
            .unwrap_or(from)
    }

    /// Nearest enabled member before `from`; `from` itself at the start
    pub fn previous(&self, doc: &Document, from: ElementId) -> ElementId {
        let state = self.inner.state.borrow();
        let Some(pos) = state.sequence.iter().position(|id| *id == from) else {
            return from;
        };
        state.sequence[..pos]
            .iter()
            .rev()
            .copied()
            .find(|id| !doc.is_disabled(*id))
            .unwrap_or(from)
    }

    // =========================================================================
    // Active element
    // =========================================================================

    pub fn active(&self) -> Option<ElementId> {
        self.inner.state.borrow().active
    }

    /// Move the active element; disabled members are refused
    pub fn set_active(&self, doc: &Document, option: Option<ElementId>) -> Result<bool> {
        if let Some(id) = option {
            self.ensure_owned(id)?;
            if doc.is_disabled(id) {
                return Ok(false);
            }
        }
        Ok(self.replace_active(option))
    }

    /// Activate the first selected enabled member, else the first enabled one
    pub fn focus(&self, doc: &Document) -> Option<ElementId> {
        let target = self
            .selected(doc)
            .into_iter()
            .find(|id| !doc.is_disabled(*id))
            .or_else(|| self.first(doc));
        self.replace_active(target);
        target
    }

    pub fn blur(&self) {
        self.replace_active(None);
    }

    fn replace_active(&self, option: Option<ElementId>) -> bool {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.active == option {
                return false;
            }
            state.active = option;
        }
        self.emit(&ListEvent::ActiveChanged(option));
        true
    }

    /// Keyboard interaction; returns whether the key was handled
    pub fn handle_key(&self, doc: &mut Document, key: Key) -> Result<bool> {
        let target = match key {
            Key::Home => self.first(doc),
            Key::End => self.last(doc),
            Key::ArrowDown => match self.active() {
                Some(active) => Some(self.next(doc, active)),
                None => self.first(doc),
            },
            Key::ArrowUp => match self.active() {
                Some(active) => Some(self.previous(doc, active)),
                None => self.last(doc),
            },
            key if key.is_activation() => {
                return match self.active() {
                    Some(active) if !doc.is_disabled(active) => {
                        self.toggle_notify(doc, active)?;
                        Ok(true)
                    }
                    _ => Ok(false),
                };
            }
            _ => return Ok(false),
        };

        match target {
            Some(target) => {
                self.replace_active(Some(target));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Selected members in sequence order
    pub fn selected(&self, doc: &Document) -> Vec<ElementId> {
        let state = self.inner.state.borrow();
        state
            .sequence
            .iter()
            .copied()
            .filter(|id| doc.is_selected(*id))
            .collect()
    }

    pub fn selected_count(&self, doc: &Document) -> usize {
        let state = self.inner.state.borrow();
        state
            .sequence
            .iter()
            .filter(|id| doc.is_selected(**id))
            .count()
    }

    /// Select `option` and every member sharing its identity
    ///
    /// In single mode every other member is deselected. Not gated by
    /// read-only; no input/change notification is scheduled.
    pub fn select(&self, doc: &mut Document, option: ElementId) -> Result<bool> {
        self.ensure_owned(option)?;
        let changed = self.apply_select(doc, option);
        if changed {
            tracing::trace!(?option, "selected");
            self.sync_form(doc);
        }
        Ok(changed)
    }

    /// Deselect `option` and its mirrors unless that breaks the minimum
    pub fn deselect(&self, doc: &mut Document, option: ElementId) -> Result<bool> {
        self.ensure_owned(option)?;
        if !doc.is_selected(option) {
            return Ok(false);
        }
        if self.would_break_floor(doc, option) {
            tracing::debug!(?option, "deselect refused: selection would drop below the minimum");
            return Ok(false);
        }
        let changed = self.apply_deselect(doc, option);
        if changed {
            tracing::trace!(?option, "deselected");
            self.sync_form(doc);
        }
        Ok(changed)
    }

    pub fn toggle(&self, doc: &mut Document, option: ElementId) -> Result<bool> {
        self.ensure_owned(option)?;
        if doc.is_selected(option) {
            self.deselect(doc, option)
        } else {
            self.select(doc, option)
        }
    }

    /// Gate for user-initiated selection
    pub fn can_select(&self) -> bool {
        !self.inner.state.borrow().config.is_read_only()
    }

    /// Gate for user-initiated deselection of `option` and its mirrors
    pub fn can_deselect(&self, doc: &Document, option: ElementId) -> bool {
        if self.inner.state.borrow().config.is_read_only() {
            return false;
        }
        !self.would_break_floor(doc, option)
    }

    /// Gated [`select`](Self::select) that schedules input/change
    pub fn select_notify(&self, doc: &mut Document, option: ElementId) -> Result<bool> {
        self.ensure_owned(option)?;
        if doc.is_disabled(option) {
            tracing::debug!(?option, "selection refused: option is disabled");
            return Ok(false);
        }
        if !self.can_select() {
            tracing::debug!(?option, "selection refused: list is read-only");
            return Ok(false);
        }
        let changed = self.select(doc, option)?;
        if changed {
            self.request_notify();
        }
        Ok(changed)
    }

    /// Gated [`deselect`](Self::deselect) that schedules input/change
    pub fn deselect_notify(&self, doc: &mut Document, option: ElementId) -> Result<bool> {
        self.ensure_owned(option)?;
        if !self.can_deselect(doc, option) {
            tracing::debug!(?option, "deselection refused by gate");
            return Ok(false);
        }
        let changed = self.deselect(doc, option)?;
        if changed {
            self.request_notify();
        }
        Ok(changed)
    }

    pub fn toggle_notify(&self, doc: &mut Document, option: ElementId) -> Result<bool> {
        self.ensure_owned(option)?;
        if doc.is_selected(option) {
            self.deselect_notify(doc, option)
        } else {
            self.select_notify(doc, option)
        }
    }

    /// Pointer activation: makes `option` active, then selects (single) or toggles (multiple)
    pub fn click(&self, doc: &mut Document, option: ElementId) -> Result<bool> {
        self.ensure_owned(option)?;
        if doc.is_disabled(option) {
            return Ok(false);
        }
        self.replace_active(Some(option));
        if self.is_multiple() {
            self.toggle_notify(doc, option)
        } else {
            self.select_notify(doc, option)
        }
    }

    fn ensure_owned(&self, option: ElementId) -> Result<()> {
        if self.contains(option) {
            Ok(())
        } else {
            Err(ListError::NotOwned(option))
        }
    }

    fn apply_select(&self, doc: &mut Document, target: ElementId) -> bool {
        let (sequence, multiple) = {
            let state = self.inner.state.borrow();
            (state.sequence.clone(), state.config.multiple)
        };
        let mut changed = false;
        for member in sequence {
            if self.inner.policy.same_identity(doc, target, member) {
                changed |= doc.set_selected_forced(member, true);
            } else if !multiple {
                changed |= doc.set_selected_forced(member, false);
            }
        }
        changed
    }

    fn apply_deselect(&self, doc: &mut Document, target: ElementId) -> bool {
        let sequence = self.options();
        let mut changed = false;
        for member in sequence {
            if self.inner.policy.same_identity(doc, target, member) {
                changed |= doc.set_selected_forced(member, false);
            }
        }
        changed
    }

    /// Whether deselecting `target` with its mirrors leaves fewer selections than the floor
    fn would_break_floor(&self, doc: &Document, target: ElementId) -> bool {
        let floor = self.inner.policy.floor(&self.inner.state.borrow().config);
        if floor == 0 || !doc.is_selected(target) {
            return false;
        }
        self.distinct_selected(doc).saturating_sub(1) < floor
    }

    /// Selected members counted once per identity
    fn distinct_selected(&self, doc: &Document) -> usize {
        let mut kept: SmallVec<[ElementId; 8]> = SmallVec::new();
        for member in self.selected(doc) {
            let mirrored = kept
                .iter()
                .any(|seen| self.inner.policy.same_identity(doc, *seen, member));
            if !mirrored {
                kept.push(member);
            }
        }
        kept.len()
    }

    /// Keep only the first selection and its mirrors when not in multiple mode
    fn enforce_single(&self, doc: &mut Document) -> bool {
        if self.is_multiple() {
            return false;
        }
        let view: &Document = doc;
        let selected = self.selected(view);
        let Some(&kept) = selected.first() else {
            return false;
        };
        let extra: SmallVec<[ElementId; 4]> = selected
            .into_iter()
            .filter(|member| !self.inner.policy.same_identity(view, kept, *member))
            .collect();
        if extra.is_empty() {
            return false;
        }
        for member in &extra {
            doc.set_selected_forced(*member, false);
        }
        tracing::debug!(?kept, dropped = extra.len(), "single-select list settled to one option");
        true
    }

    /// A member committed its own change through the option primitive
    fn member_changed(&self, doc: &mut Document, target: ElementId, selected: bool) {
        let mirrored = if selected {
            self.apply_select(doc, target)
        } else {
            self.apply_deselect(doc, target)
        };
        tracing::trace!(?target, selected, mirrored, "member option changed");
        self.sync_form(doc);
        self.request_notify();
    }

    // =========================================================================
    // Form participation
    // =========================================================================

    /// Distinct values of selected, enabled members
    pub fn values(&self, doc: &Document) -> IndexSet<String> {
        let state = self.inner.state.borrow();
        state
            .sequence
            .iter()
            .copied()
            .filter(|id| doc.is_selected(*id) && !doc.is_disabled(*id))
            .filter_map(|id| doc.value(id).map(str::to_string))
            .collect()
    }

    /// First of [`values`](Self::values)
    pub fn value(&self, doc: &Document) -> Option<String> {
        self.values(doc).into_iter().next()
    }

    /// Flags over distinct selections; mirrored options count once
    pub fn validity(&self, doc: &Document) -> ValidityFlags {
        let count = self.distinct_selected(doc);
        let state = self.inner.state.borrow();
        self.inner.policy.validity(&state.config, count)
    }

    pub fn validation_message(&self, doc: &Document) -> String {
        let flags = self.validity(doc);
        validation_message(&self.inner.state.borrow().config, flags)
    }

    pub fn accessibility(&self, doc: &Document) -> ListAccessibility {
        let invalid = !self.validity(doc).is_valid();
        let state = self.inner.state.borrow();
        ListAccessibility {
            multiselectable: state.config.multiple,
            required: state.config.required,
            disabled: state.config.disabled || state.config.form_disabled,
            read_only: state.config.read_only,
            invalid,
            active_descendant: state.active,
        }
    }

    /// Restorable state: constraints plus every selected member's value
    pub fn snapshot(&self, doc: &Document) -> ListSnapshot {
        let values: IndexSet<String> = self
            .selected(doc)
            .into_iter()
            .filter_map(|id| doc.value(id).map(str::to_string))
            .collect();
        let state = self.inner.state.borrow();
        ListSnapshot {
            multiple: state.config.multiple,
            min_length: state.config.min_length,
            max_length: state.config.max_length,
            values: values.into_iter().collect(),
        }
    }

    /// Restore a state handed back by the form host; never fails
    pub fn restore(&self, doc: &mut Document, state: &FormData) {
        self.restore_snapshot(doc, ListSnapshot::from_form_data(state));
    }

    pub fn restore_json(&self, doc: &mut Document, text: &str) {
        self.restore_snapshot(doc, ListSnapshot::from_json(text));
    }

    pub fn restore_snapshot(&self, doc: &mut Document, snapshot: ListSnapshot) {
        {
            let mut state = self.inner.state.borrow_mut();
            state.config.multiple = snapshot.multiple;
            state.config.min_length = snapshot.min_length;
            state.config.max_length = snapshot.max_length;
        }
        let wanted: FxHashSet<&str> = snapshot.values.iter().map(String::as_str).collect();
        for member in self.options() {
            let keep = doc.value(member).is_some_and(|v| wanted.contains(v));
            doc.set_selected_forced(member, keep);
        }
        self.enforce_single(doc);
        self.sync_form(doc);
        tracing::debug!(values = snapshot.values.len(), "list state restored");
    }

    /// Form reset: every member back to its defaults, bypassing the gates
    pub fn reset(&self, doc: &mut Document) {
        for member in self.options() {
            if let Err(err) = doc.reset(member) {
                tracing::warn!(%err, "skipping member during reset");
            }
        }
        self.enforce_single(doc);
        self.sync_form(doc);
    }

    /// Attach the form host; call [`sync`](Self::sync) to push the current state
    pub fn set_form_host(&self, host: Box<dyn FormHost>) {
        *self.inner.form.borrow_mut() = Some(host);
    }

    pub fn take_form_host(&self) -> Option<Box<dyn FormHost>> {
        self.inner.form.borrow_mut().take()
    }

    /// Push value, state and validity to the form host
    pub fn sync(&self, doc: &Document) {
        self.sync_form(doc);
    }

    fn sync_form(&self, doc: &Document) {
        if !self.inner.policy.participates_in_form() || self.inner.form.borrow().is_none() {
            return;
        }

        let config = self.config();
        let values = self.values(doc);
        let value = (!values.is_empty()).then(|| {
            let mut data = FormData::new();
            for value in &values {
                data.append(config.name.clone(), value.clone());
            }
            data
        });
        let state = self.snapshot(doc).to_form_data();
        let flags = self.validity(doc);
        let message = validation_message(&config, flags);

        if let Some(host) = self.inner.form.borrow_mut().as_mut() {
            host.set_form_value(value, Some(state));
            host.set_validity(flags, &message);
        }
    }

    // =========================================================================
    // Observers and notifications
    // =========================================================================

    pub fn subscribe<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&ListEvent) + 'static,
    {
        self.inner.observers.borrow_mut().insert(Rc::new(observer))
    }

    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.inner.observers.borrow_mut().remove(id).is_some()
    }

    fn emit(&self, event: &ListEvent) {
        // Observers may subscribe or unsubscribe while running.
        let observers: Vec<Observer> = self.inner.observers.borrow().values().cloned().collect();
        for observer in observers {
            observer(event);
        }
    }

    fn request_notify(&self) {
        if self.inner.notifier.request() {
            tracing::trace!(
                generation = self.inner.notifier.generation(),
                "input/change scheduled"
            );
        }
    }

    pub fn notification_pending(&self) -> bool {
        self.inner.notifier.is_pending()
    }

    /// Deliver the pending input/change pair; false when nothing was pending
    pub fn flush_notifications(&self) -> bool {
        if !self.inner.notifier.take() {
            return false;
        }
        self.emit(&ListEvent::Input);
        self.emit(&ListEvent::Change);
        true
    }

    /// Flush pending notifications after the coalescing delay, forever
    ///
    /// Spawn on a `LocalSet` and abort the handle when the list goes away.
    pub async fn run_notifier(&self) {
        loop {
            self.inner.notifier.requested().await;
            let delay = self.inner.state.borrow().config.notify_delay;
            tokio::time::sleep(delay).await;
            self.flush_notifications();
        }
    }
}

impl<P: SelectionPolicy> std::fmt::Debug for OptionList<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("OptionList")
            .field("slot", &self.inner.slot)
            .field("config", &state.config)
            .field("members", &state.sequence.len())
            .field("active", &state.active)
            .finish()
    }
}

#[derive(Default)]
struct Refreshed {
    changed: bool,
    cleared_active: bool,
}

struct RecomputeGuard<'a>(&'a Cell<bool>);

impl Drop for RecomputeGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Registered on every member; gates and follows the member's own changes
struct MemberListener<P> {
    list: Weak<ListInner<P>>,
}

impl<P: SelectionPolicy> OptionListener for MemberListener<P> {
    fn handle_event(&self, doc: &mut Document, event: &OptionEvent, control: &mut EventControl) {
        let Some(inner) = self.list.upgrade() else {
            return;
        };
        let list = OptionList { inner };

        match *event {
            OptionEvent::BeforeChange { target, selected } => {
                let allowed = if selected {
                    !doc.is_disabled(target) && list.can_select()
                } else {
                    list.can_deselect(doc, target)
                };
                if !allowed {
                    tracing::debug!(?target, selected, "member change refused by list gate");
                    control.prevent_default();
                }
            }
            OptionEvent::Changed { target, selected } => list.member_changed(doc, target, selected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::OptionInit;
    use crate::registry::{DefinitionRegistry, ElementKind};

    fn setup(values: &[&str]) -> (Document, SlotId, Vec<ElementId>) {
        let registry = DefinitionRegistry::new();
        registry.define("x-option", ElementKind::Option);
        let mut doc = Document::new(Rc::new(registry));
        let slot = doc.create_slot();
        let ids: Vec<_> = values
            .iter()
            .map(|v| doc.create_element("x-option", OptionInit::new(*v)))
            .collect();
        doc.assign(slot, ids.clone());
        (doc, slot, ids)
    }

    #[test]
    fn test_refresh_subscribes_members() {
        let (mut doc, slot, ids) = setup(&["a", "b"]);
        let list = OptionList::new(slot, ListConfig::new());

        assert!(list.refresh(&mut doc));
        assert_eq!(list.options(), ids);
        assert_eq!(doc.listener_count(ids[0]), 1);
        assert!(!list.refresh(&mut doc));
        assert_eq!(doc.listener_count(ids[0]), 1);
    }

    #[test]
    fn test_refresh_skips_non_options() {
        let (mut doc, slot, ids) = setup(&["a"]);
        let div = doc.create_element("div", OptionInit::default());
        doc.append(slot, div);
        let list = OptionList::new(slot, ListConfig::new());
        list.refresh(&mut doc);
        assert_eq!(list.options(), ids);
    }

    #[test]
    fn test_removed_member_loses_subscription_and_active() {
        let (mut doc, slot, ids) = setup(&["a", "b"]);
        let list = OptionList::new(slot, ListConfig::new());
        list.refresh(&mut doc);
        list.set_active(&doc, Some(ids[1])).unwrap();

        doc.assign(slot, vec![ids[0]]);
        assert!(list.refresh(&mut doc));
        assert_eq!(doc.listener_count(ids[1]), 0);
        assert_eq!(list.active(), None);
    }

    #[test]
    fn test_member_toggle_is_gated() {
        let (mut doc, slot, ids) = setup(&["a", "b"]);
        let list = OptionList::new(slot, ListConfig::new().required(true));
        list.refresh(&mut doc);

        assert_eq!(doc.toggle(ids[0]), Ok(true));
        // Closing the only selected option through the primitive is cancelled
        assert_eq!(doc.toggle(ids[0]), Ok(false));
        assert!(doc.is_selected(ids[0]));

        // Selecting another one deselects the first
        assert_eq!(doc.toggle(ids[1]), Ok(true));
        assert!(!doc.is_selected(ids[0]));
        assert!(list.notification_pending());
    }

    #[test]
    fn test_read_only_cancels_member_toggle() {
        let (mut doc, slot, ids) = setup(&["a"]);
        let list = OptionList::new(slot, ListConfig::new().read_only(true));
        list.refresh(&mut doc);

        assert_eq!(doc.toggle(ids[0]), Ok(false));
        // Programmatic select bypasses the read-only gate
        assert_eq!(list.select(&mut doc, ids[0]), Ok(true));
    }

    #[test]
    fn test_mirrored_values_select_together() {
        let (mut doc, slot, ids) = setup(&["a", "b", "a"]);
        let list = OptionList::new(slot, ListConfig::new());
        list.refresh(&mut doc);

        list.select(&mut doc, ids[0]).unwrap();
        assert!(doc.is_selected(ids[2]));
        assert_eq!(list.values(&doc).len(), 1);
    }

    #[test]
    fn test_dropped_list_detaches() {
        let (mut doc, slot, ids) = setup(&["a"]);
        let list = OptionList::new(slot, ListConfig::new().read_only(true));
        list.refresh(&mut doc);
        drop(list);

        assert_eq!(doc.toggle(ids[0]), Ok(true));
    }

    #[test]
    fn test_validation_message() {
        let config = ListConfig::new().multiple(true).min_length(2).max_length(3);
        let short = ValidityFlags {
            too_short: true,
            ..Default::default()
        };
        assert_eq!(validation_message(&config, short), "Please select at least 2 items.");
        assert_eq!(validation_message(&config, ValidityFlags::default()), "");
    }
}
