//! Selection policies
//!
//! The engine is shared by the generic option list and the accordion. A
//! policy decides which element kinds the list owns, how mirrored options
//! are matched, how low the selected count may go, and which validity
//! flags apply.

use crate::document::{Document, ElementId};
use crate::form::ValidityFlags;
use crate::list::ListConfig;
use crate::registry::ElementKind;

pub trait SelectionPolicy: 'static {
    /// Whether an element of `kind` joins the owned sequence
    fn accepts(&self, kind: ElementKind) -> bool;

    /// Whether `other` is the same logical option as `target`
    fn same_identity(&self, doc: &Document, target: ElementId, other: ElementId) -> bool;

    /// Smallest selected count user or programmatic deselection may leave
    fn floor(&self, config: &ListConfig) -> usize;

    fn validity(&self, config: &ListConfig, selected: usize) -> ValidityFlags;

    /// Whether the list reports value and validity to a form host
    fn participates_in_form(&self) -> bool;
}

/// Generic option list: options matched by value, min/max counts, form value
#[derive(Clone, Copy, Debug, Default)]
pub struct OptionsPolicy;

impl SelectionPolicy for OptionsPolicy {
    fn accepts(&self, kind: ElementKind) -> bool {
        kind.is_option()
    }

    fn same_identity(&self, doc: &Document, target: ElementId, other: ElementId) -> bool {
        target == other || (doc.value(target).is_some() && doc.value(target) == doc.value(other))
    }

    fn floor(&self, config: &ListConfig) -> usize {
        let min = if config.multiple { config.min_length } else { 0 };
        min.max(usize::from(config.required))
    }

    fn validity(&self, config: &ListConfig, selected: usize) -> ValidityFlags {
        let over_max = config.max_length.is_some_and(|max| selected > max);
        ValidityFlags {
            value_missing: config.required && selected == 0,
            too_short: config.multiple && selected < config.min_length,
            too_long: (config.multiple && over_max) || (!config.multiple && selected > 1),
        }
    }

    fn participates_in_form(&self) -> bool {
        true
    }
}

/// Accordion: disclosures only, matched by identity, `required` keeps one open
#[derive(Clone, Copy, Debug, Default)]
pub struct AccordionPolicy;

impl SelectionPolicy for AccordionPolicy {
    fn accepts(&self, kind: ElementKind) -> bool {
        kind == ElementKind::Disclosure
    }

    fn same_identity(&self, _doc: &Document, target: ElementId, other: ElementId) -> bool {
        target == other
    }

    fn floor(&self, config: &ListConfig) -> usize {
        usize::from(config.required)
    }

    fn validity(&self, _config: &ListConfig, _selected: usize) -> ValidityFlags {
        ValidityFlags::default()
    }

    fn participates_in_form(&self) -> bool {
        false
    }
}
