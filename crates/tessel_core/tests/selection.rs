use std::cell::RefCell;
use std::rc::Rc;

use tessel_core::{
    DefinitionRegistry, Document, ElementId, ElementKind, FormData, FormHost, Key, ListConfig,
    ListError, ListEvent, ListMutation, OptionInit, OptionList, ValidityFlags,
};

fn document() -> Document {
    let registry = DefinitionRegistry::new();
    registry.define("x-option", ElementKind::Option);
    Document::new(Rc::new(registry))
}

/// Build a list over `options`; a leading `*` marks an option selected, `!` disabled
fn list_with(doc: &mut Document, config: ListConfig, options: &[&str]) -> (OptionList, Vec<ElementId>) {
    let slot = doc.create_slot();
    let ids: Vec<_> = options
        .iter()
        .map(|entry| {
            let init = if let Some(value) = entry.strip_prefix('*') {
                OptionInit::new(value).selected()
            } else if let Some(value) = entry.strip_prefix('!') {
                OptionInit::new(value).disabled()
            } else {
                OptionInit::new(*entry)
            };
            doc.create_element("x-option", init)
        })
        .collect();
    doc.assign(slot, ids.clone());
    let list = OptionList::new(slot, config);
    list.refresh(doc);
    (list, ids)
}

fn record(list: &OptionList) -> Rc<RefCell<Vec<ListEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    list.subscribe(move |event| sink.borrow_mut().push(*event));
    events
}

#[test]
fn test_single_select_exclusivity() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new(), &["a", "b", "c", "d"]);

    for &id in ids.iter().chain(ids.iter().rev()) {
        list.select(&mut doc, id).unwrap();
        assert_eq!(list.selected(&doc), vec![id]);
    }
}

#[test]
fn test_required_deselect_rejected() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new().required(true), &["*a", "b", "c"]);
    let [a, b, c] = ids[..] else { unreachable!() };

    assert_eq!(list.select(&mut doc, b), Ok(true));
    assert!(!doc.is_selected(a));
    assert!(doc.is_selected(b));
    assert!(!doc.is_selected(c));

    assert_eq!(list.deselect(&mut doc, b), Ok(false));
    assert!(doc.is_selected(b));
    assert!(!list.can_deselect(&doc, b));
}

#[test]
fn test_reset_may_clear_required_selection() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new().required(true), &["a", "b"]);

    list.select(&mut doc, ids[1]).unwrap();
    list.reset(&mut doc);
    assert!(list.selected(&doc).is_empty());
    assert!(list.validity(&doc).value_missing);
}

#[test]
fn test_saturating_navigation() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new(), &["!a", "b", "c", "!d"]);

    let first = list.first(&doc).unwrap();
    let last = list.last(&doc).unwrap();
    assert_eq!(first, ids[1]);
    assert_eq!(last, ids[2]);
    assert_eq!(list.next(&doc, last), last);
    assert_eq!(list.previous(&doc, first), first);
    assert_eq!(list.next(&doc, first), last);
}

#[test]
fn test_navigation_on_empty_list() {
    let mut doc = document();
    let (list, _) = list_with(&mut doc, ListConfig::new(), &["!a"]);
    assert_eq!(list.first(&doc), None);
    assert_eq!(list.last(&doc), None);
    assert_eq!(list.handle_key(&mut doc, Key::Home), Ok(false));
}

#[test]
fn test_foreign_options_are_rejected() {
    let mut doc = document();
    let (list, _) = list_with(&mut doc, ListConfig::new(), &["a", "b"]);
    let (_, others) = list_with(&mut doc, ListConfig::new(), &["x"]);
    let stray = doc.create_element("x-option", OptionInit::new("y"));
    let removed = doc.create_element("x-option", OptionInit::new("z"));
    doc.remove(removed);

    for foreign in [others[0], stray, removed] {
        assert_eq!(list.select(&mut doc, foreign), Err(ListError::NotOwned(foreign)));
        assert_eq!(list.deselect(&mut doc, foreign), Err(ListError::NotOwned(foreign)));
        assert_eq!(list.toggle(&mut doc, foreign), Err(ListError::NotOwned(foreign)));
        assert_eq!(list.select_notify(&mut doc, foreign), Err(ListError::NotOwned(foreign)));
    }
    assert!(!doc.is_selected(others[0]));
}

#[test]
fn test_idempotent_refresh() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new(), &["a", "b"]);
    let before = list.options();

    assert!(!list.refresh(&mut doc));
    assert!(!list.refresh(&mut doc));
    assert_eq!(list.options(), before);
    for id in ids {
        assert_eq!(doc.listener_count(id), 1);
    }
}

#[test]
fn test_refresh_keeps_unchanged_subscriptions() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new(), &["a", "b"]);
    let c = doc.create_element("x-option", OptionInit::new("c"));

    doc.assign(list.slot(), vec![ids[1], c]);
    assert!(list.refresh(&mut doc));
    assert_eq!(list.options(), vec![ids[1], c]);
    assert_eq!(doc.listener_count(ids[0]), 0);
    assert_eq!(doc.listener_count(ids[1]), 1);
    assert_eq!(doc.listener_count(c), 1);
}

#[test]
fn test_refresh_settles_single_selection() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new(), &["a"]);
    let b = doc.create_element("x-option", OptionInit::new("b").selected());
    let c = doc.create_element("x-option", OptionInit::new("c").selected());
    doc.select(ids[0]).unwrap();

    doc.assign(list.slot(), vec![ids[0], b, c]);
    list.refresh(&mut doc);
    assert_eq!(list.selected(&doc), vec![ids[0]]);
}

#[test]
fn test_notification_coalescing() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new().multiple(true), &["a", "b", "c"]);
    let events = record(&list);

    for &id in &ids {
        list.select_notify(&mut doc, id).unwrap();
    }
    list.deselect_notify(&mut doc, ids[0]).unwrap();
    doc.toggle(ids[1]).unwrap();

    assert!(list.flush_notifications());
    assert!(!list.flush_notifications());
    assert_eq!(*events.borrow(), vec![ListEvent::Input, ListEvent::Change]);
}

#[test]
fn test_programmatic_select_does_not_notify() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new(), &["a", "b"]);
    list.select(&mut doc, ids[0]).unwrap();
    assert!(!list.notification_pending());
}

#[test]
fn test_max_length_is_reported_not_enforced() {
    let mut doc = document();
    let config = ListConfig::new().multiple(true).min_length(1).max_length(2);
    let (list, ids) = list_with(&mut doc, config, &["a", "b", "c"]);
    let [a, b, c] = ids[..] else { unreachable!() };

    assert!(list.validity(&doc).too_short);
    assert_eq!(list.select(&mut doc, a), Ok(true));
    assert_eq!(list.select(&mut doc, b), Ok(true));
    assert!(list.validity(&doc).is_valid());

    assert_eq!(list.select(&mut doc, c), Ok(true));
    assert_eq!(list.selected(&doc), vec![a, b, c]);
    assert_eq!(
        list.validity(&doc),
        ValidityFlags {
            too_long: true,
            ..Default::default()
        }
    );
    assert_eq!(list.validation_message(&doc), "Please select no more than 2 items.");
}

#[test]
fn test_min_length_floor_in_multiple_mode() {
    let mut doc = document();
    let config = ListConfig::new().multiple(true).min_length(2);
    let (list, ids) = list_with(&mut doc, config, &["*a", "*b", "*c"]);

    assert_eq!(list.deselect(&mut doc, ids[0]), Ok(true));
    assert_eq!(list.deselect(&mut doc, ids[1]), Ok(false));
    assert_eq!(list.selected_count(&doc), 2);
}

#[test]
fn test_read_only_gates_user_paths_only() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new(), &["a", "b"]);

    list.set_form_disabled(&mut doc, true);
    assert!(!list.can_select());
    assert_eq!(list.click(&mut doc, ids[0]), Ok(false));
    assert_eq!(list.select(&mut doc, ids[0]), Ok(true));

    list.set_form_disabled(&mut doc, false);
    assert_eq!(list.click(&mut doc, ids[1]), Ok(true));
    assert_eq!(list.selected(&doc), vec![ids[1]]);
}

#[test]
fn test_switching_to_single_keeps_first_selected() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new().multiple(true), &["a", "b", "c"]);
    list.select(&mut doc, ids[2]).unwrap();
    list.select(&mut doc, ids[1]).unwrap();

    list.apply(&mut doc, ListMutation::Multiple(false));
    assert_eq!(list.selected(&doc), vec![ids[1]]);
}

#[test]
fn test_values_skip_disabled_and_duplicates() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new().multiple(true), &["a", "b", "a", "c"]);
    for &id in &ids {
        list.select(&mut doc, id).unwrap();
    }
    doc.set_disabled(ids[3], true).unwrap();

    let values: Vec<_> = list.values(&doc).into_iter().collect();
    assert_eq!(values, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(list.value(&doc).as_deref(), Some("a"));
    // Disabling never changes selection
    assert!(doc.is_selected(ids[3]));
}

#[test]
fn test_keyboard_navigation_and_activation() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new().multiple(true), &["a", "!b", "c"]);
    let events = record(&list);

    assert_eq!(list.handle_key(&mut doc, Key::ArrowDown), Ok(true));
    assert_eq!(list.active(), Some(ids[0]));
    list.handle_key(&mut doc, Key::ArrowDown).unwrap();
    assert_eq!(list.active(), Some(ids[2]));
    list.handle_key(&mut doc, Key::ArrowDown).unwrap();
    assert_eq!(list.active(), Some(ids[2]));
    list.handle_key(&mut doc, Key::Home).unwrap();
    assert_eq!(list.active(), Some(ids[0]));

    list.handle_key(&mut doc, Key::Space).unwrap();
    assert!(doc.is_selected(ids[0]));
    list.handle_key(&mut doc, Key::Enter).unwrap();
    assert!(!doc.is_selected(ids[0]));

    assert_eq!(list.handle_key(&mut doc, Key::Other('x')), Ok(false));
    assert_eq!(
        events.borrow()[..3],
        [
            ListEvent::ActiveChanged(Some(ids[0])),
            ListEvent::ActiveChanged(Some(ids[2])),
            ListEvent::ActiveChanged(Some(ids[0])),
        ]
    );
}

#[test]
fn test_focus_prefers_selected_option() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new(), &["a", "*b"]);
    assert_eq!(list.focus(&doc), Some(ids[1]));
    list.blur();
    assert_eq!(list.active(), None);
}

#[test]
fn test_set_active_refuses_disabled() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new(), &["a", "!b"]);
    assert_eq!(list.set_active(&doc, Some(ids[1])), Ok(false));
    assert_eq!(list.active(), None);
}

#[derive(Default)]
struct Recorded {
    value: Option<FormData>,
    state: Option<FormData>,
    flags: ValidityFlags,
    message: String,
}

struct RecordingHost(Rc<RefCell<Recorded>>);

impl FormHost for RecordingHost {
    fn set_form_value(&mut self, value: Option<FormData>, state: Option<FormData>) {
        let mut recorded = self.0.borrow_mut();
        recorded.value = value;
        recorded.state = state;
    }

    fn set_validity(&mut self, flags: ValidityFlags, message: &str) {
        let mut recorded = self.0.borrow_mut();
        recorded.flags = flags;
        recorded.message = message.to_string();
    }
}

#[test]
fn test_form_host_receives_value_and_validity() {
    let mut doc = document();
    let config = ListConfig::new().required(true).name("fruit");
    let (list, ids) = list_with(&mut doc, config, &["apple", "pear"]);
    let recorded = Rc::new(RefCell::new(Recorded::default()));
    list.set_form_host(Box::new(RecordingHost(recorded.clone())));

    list.sync(&doc);
    assert!(recorded.borrow().value.is_none());
    assert!(recorded.borrow().flags.value_missing);
    assert_eq!(recorded.borrow().message, "Please select an item.");

    list.click(&mut doc, ids[1]).unwrap();
    let recorded = recorded.borrow();
    assert_eq!(recorded.value.as_ref().and_then(|v| v.get("fruit")), Some("pear"));
    assert_eq!(recorded.state.as_ref().and_then(|s| s.get("value")), Some("pear"));
    assert!(recorded.flags.is_valid());
}

#[test]
fn test_restore_from_saved_state() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new(), &["a", "b", "c"]);

    let mut saved = FormData::new();
    saved.append("multiple", "true");
    saved.append("maxLength", "not a number");
    saved.append("value", "a");
    saved.append("value", "c");
    list.restore(&mut doc, &saved);

    assert!(list.is_multiple());
    assert_eq!(list.config().max_length, None);
    assert_eq!(list.selected(&doc), vec![ids[0], ids[2]]);

    let json = list.snapshot(&doc).to_json();
    list.reset(&mut doc);
    assert!(list.selected(&doc).is_empty());
    list.restore_json(&mut doc, &json);
    assert_eq!(list.selected(&doc), vec![ids[0], ids[2]]);
}

#[test]
fn test_accessibility_state() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new().required(true), &["a"]);
    let state = list.accessibility(&doc);
    assert!(state.required);
    assert!(state.invalid);

    list.click(&mut doc, ids[0]).unwrap();
    let state = list.accessibility(&doc);
    assert!(!state.invalid);
    assert_eq!(state.active_descendant, Some(ids[0]));
}

#[test]
fn test_required_mirrors_survive_member_toggle() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new().required(true), &["a", "b", "a"]);

    list.select(&mut doc, ids[0]).unwrap();
    assert_eq!(list.selected(&doc), vec![ids[0], ids[2]]);
    assert!(!list.can_deselect(&doc, ids[2]));

    // Closing one mirror would empty the required selection
    assert_eq!(doc.toggle(ids[0]), Ok(false));
    assert_eq!(doc.toggle(ids[2]), Ok(false));
    assert_eq!(list.selected(&doc), vec![ids[0], ids[2]]);
    assert!(list.validity(&doc).is_valid());
}

#[test]
fn test_mirrors_count_once_in_single_mode() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new(), &["a", "b", "a"]);

    list.select(&mut doc, ids[2]).unwrap();
    assert_eq!(list.selected_count(&doc), 2);
    assert_eq!(list.validity(&doc), ValidityFlags::default());
    assert_eq!(list.value(&doc).as_deref(), Some("a"));

    // Re-settling keeps the mirror of the first selection
    list.apply(&mut doc, ListMutation::Name("letter".into()));
    assert!(doc.is_selected(ids[0]));
    assert!(doc.is_selected(ids[2]));

    list.select(&mut doc, ids[1]).unwrap();
    assert_eq!(list.selected(&doc), vec![ids[1]]);
}

#[test]
fn test_mirrors_count_once_toward_max_length() {
    let mut doc = document();
    let config = ListConfig::new().multiple(true).max_length(1);
    let (list, ids) = list_with(&mut doc, config, &["a", "a", "b"]);

    list.select(&mut doc, ids[0]).unwrap();
    assert!(list.validity(&doc).is_valid());

    list.select(&mut doc, ids[2]).unwrap();
    assert!(list.validity(&doc).too_long);
}

#[test]
fn test_disabled_option_refuses_member_selection() {
    let mut doc = document();
    let (list, ids) = list_with(&mut doc, ListConfig::new(), &["a", "!b"]);

    assert_eq!(doc.toggle(ids[1]), Ok(false));
    assert!(!doc.is_selected(ids[1]));
    assert!(!list.notification_pending());

    assert_eq!(doc.toggle(ids[0]), Ok(true));
    assert!(list.notification_pending());
}

#[test]
fn test_notifying_paths_skip_disabled_options() {
    let mut doc = document();
    let config = ListConfig::new().multiple(true);
    let (list, ids) = list_with(&mut doc, config, &["a", "!b"]);

    assert_eq!(list.select_notify(&mut doc, ids[1]), Ok(false));
    assert_eq!(list.toggle_notify(&mut doc, ids[1]), Ok(false));
    assert!(!doc.is_selected(ids[1]));
    assert!(!list.notification_pending());

    assert_eq!(list.select_notify(&mut doc, ids[0]), Ok(true));
    assert!(list.notification_pending());
}
