//! Tessel Core
//!
//! Headless selection widgets over a host document:
//!
//! - **Host Document**: element arena, slot assignments, cancelable option events
//! - **Definition Registry**: awaitable custom element definitions
//! - **Option-List Engine**: single/multi selection, active-item navigation,
//!   keyboard handling, form value and validity
//! - **Accordion**: the engine over disclosures with single/multi open modes
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use tessel_core::{
//!     DefinitionRegistry, Document, ElementKind, ListConfig, OptionInit, OptionList,
//! };
//!
//! let registry = DefinitionRegistry::new();
//! registry.define("x-option", ElementKind::Option);
//!
//! let mut doc = Document::new(Rc::new(registry));
//! let slot = doc.create_slot();
//! let a = doc.create_element("x-option", OptionInit::new("a").selected());
//! let b = doc.create_element("x-option", OptionInit::new("b"));
//! doc.assign(slot, vec![a, b]);
//!
//! let list = OptionList::new(slot, ListConfig::new().required(true));
//! list.refresh(&mut doc);
//!
//! list.select(&mut doc, b).unwrap();
//! assert!(!doc.is_selected(a));
//! assert_eq!(list.deselect(&mut doc, b), Ok(false));
//! ```

pub mod accordion;
pub mod document;
pub mod error;
pub mod events;
pub mod form;
pub mod keyboard;
pub mod list;
pub mod notify;
pub mod registry;

pub use accordion::{Accordion, AccordionMode};
pub use document::{Document, ElementId, OptionAttr, OptionInit, SharedDocument, SlotId};
pub use error::{DocumentError, ListError, Result, UpgradeError};
pub use events::{EventControl, ListenerId, OptionEvent, OptionListener};
pub use form::{FormData, FormHost, ListSnapshot, ValidityFlags};
pub use keyboard::Key;
pub use list::{
    validation_message, AccordionPolicy, ListAccessibility, ListConfig, ListEvent, ListMutation,
    ObserverId, OptionList, OptionsPolicy, SelectionPolicy,
};
pub use notify::{Debouncer, DEFAULT_NOTIFY_DELAY};
pub use registry::{DefinitionRegistry, ElementKind, ElementRegistry};
