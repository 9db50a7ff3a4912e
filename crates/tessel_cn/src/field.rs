//! Field wrapper
//!
//! Wraps a form control with a label and turns its validity flags into a
//! single user-facing message. The message stays hidden until the control
//! has been touched (blurred once) or a submit was attempted, so a pristine
//! form does not greet the user with errors.

use tessel_core::{Document, OptionList, SelectionPolicy, ValidityFlags};

use crate::combobox::Combobox;

/// A control that reports constraint validity
pub trait Validatable {
    fn validity(&self, doc: &Document) -> ValidityFlags;

    fn validation_message(&self, doc: &Document) -> String;
}

impl<P: SelectionPolicy> Validatable for OptionList<P> {
    fn validity(&self, doc: &Document) -> ValidityFlags {
        OptionList::validity(self, doc)
    }

    fn validation_message(&self, doc: &Document) -> String {
        OptionList::validation_message(self, doc)
    }
}

impl Validatable for Combobox {
    fn validity(&self, doc: &Document) -> ValidityFlags {
        self.list().validity(doc)
    }

    fn validation_message(&self, doc: &Document) -> String {
        self.list().validation_message(doc)
    }
}

/// Label, description and validation message around a control
#[derive(Debug)]
pub struct Field<C> {
    control: C,
    label: String,
    description: Option<String>,
    custom_error: Option<String>,
    touched: bool,
    submitted: bool,
}

impl<C: Validatable> Field<C> {
    pub fn new(label: impl Into<String>, control: C) -> Self {
        Self {
            control,
            label: label.into(),
            description: None,
            custom_error: None,
            touched: false,
            submitted: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn help_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut C {
        &mut self.control
    }

    /// The control lost focus for the first time
    pub fn touch(&mut self) {
        self.touched = true;
    }

    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// Overrides the control's own flags until cleared with `None`
    pub fn set_custom_error(&mut self, error: Option<String>) {
        self.custom_error = error;
    }

    pub fn is_valid(&self, doc: &Document) -> bool {
        self.custom_error.is_none() && self.control.validity(doc).is_valid()
    }

    /// Current error regardless of visibility
    pub fn error(&self, doc: &Document) -> Option<String> {
        if let Some(custom) = &self.custom_error {
            return Some(custom.clone());
        }
        if self.control.validity(doc).is_valid() {
            None
        } else {
            Some(self.control.validation_message(doc))
        }
    }

    /// Error to render: only once touched or after a submit attempt
    pub fn visible_error(&self, doc: &Document) -> Option<String> {
        if self.touched || self.submitted {
            self.error(doc)
        } else {
            None
        }
    }

    /// Mark a submit attempt; returns whether the field may be submitted
    pub fn attempt_submit(&mut self, doc: &Document) -> bool {
        self.submitted = true;
        let valid = self.is_valid(doc);
        if !valid {
            tracing::debug!(field = %self.label, "submit blocked by invalid field");
        }
        valid
    }

    /// Back to pristine
    pub fn reset(&mut self) {
        self.touched = false;
        self.submitted = false;
        self.custom_error = None;
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use tessel_core::{DefinitionRegistry, ElementKind, ListConfig, OptionInit};

    use super::*;

    fn field() -> (Document, Field<OptionList>, tessel_core::ElementId) {
        let registry = DefinitionRegistry::new();
        registry.define("x-option", ElementKind::Option);
        let mut doc = Document::new(Rc::new(registry));
        let slot = doc.create_slot();
        let a = doc.create_element("x-option", OptionInit::new("a"));
        doc.assign(slot, vec![a]);
        let list = OptionList::new(slot, ListConfig::new().required(true));
        list.refresh(&mut doc);
        (doc, Field::new("Fruit", list), a)
    }

    #[test]
    fn test_error_hidden_until_touched() {
        let (doc, mut field, _) = field();
        assert!(field.error(&doc).is_some());
        assert_eq!(field.visible_error(&doc), None);

        field.touch();
        assert_eq!(
            field.visible_error(&doc).as_deref(),
            Some("Please select an item.")
        );
    }

    #[test]
    fn test_submit_reveals_and_blocks() {
        let (mut doc, mut field, a) = field();
        assert!(!field.attempt_submit(&doc));
        assert!(field.visible_error(&doc).is_some());

        field.control().select(&mut doc, a).unwrap();
        assert!(field.attempt_submit(&doc));
        assert_eq!(field.visible_error(&doc), None);
    }

    #[test]
    fn test_custom_error_overrides() {
        let (mut doc, mut field, a) = field();
        field.control().select(&mut doc, a).unwrap();
        field.set_custom_error(Some("Out of stock".into()));
        field.touch();
        assert_eq!(field.visible_error(&doc).as_deref(), Some("Out of stock"));

        field.reset();
        assert!(!field.is_touched());
        assert!(field.is_valid(&doc));
    }
}
