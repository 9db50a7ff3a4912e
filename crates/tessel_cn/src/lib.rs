//! # Tessel Component Library (tessel_cn)
//!
//! Composed widgets built on the `tessel_core` selection engine.
//!
//! - **Combobox**: option list in a floating panel with a picked-value mirror
//! - **Floating Panel**: open/closed panel kept positioned by an external service
//! - **Field**: label plus validation message aggregated from a control
//!
//! ## Example
//!
//! ```ignore
//! use tessel_cn::prelude::*;
//!
//! let combobox = cn::combobox(options, picked, panel, service)
//!     .anchor(input)
//!     .multiple(true)
//!     .max_length(3)
//!     .build();
//! let mut field = cn::field("Toppings", combobox);
//! ```

pub mod combobox;
pub mod error;
pub mod field;
pub mod floating;

pub use combobox::{Combobox, ComboboxAccessibility, ComboboxBuilder};
pub use error::PositionError;
pub use field::{Field, Validatable};
pub use floating::{
    FloatingPanel, Placement, PositionConfig, PositionService, ToggleGate, TrackingHandle,
};

/// Convenience module for accessing components with `cn::` prefix
pub mod cn {
    use std::rc::Rc;

    use tessel_core::{ElementId, SlotId};

    use crate::combobox::ComboboxBuilder;
    use crate::field::{Field, Validatable};
    use crate::floating::PositionService;

    /// Start building a combobox over `options`, mirroring picks into `picked`
    pub fn combobox(
        options: SlotId,
        picked: SlotId,
        panel: ElementId,
        service: Rc<dyn PositionService>,
    ) -> ComboboxBuilder {
        ComboboxBuilder::new(options, picked, panel, service)
    }

    pub fn field<C: Validatable>(label: impl Into<String>, control: C) -> Field<C> {
        Field::new(label, control)
    }
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::cn;
    pub use crate::combobox::{Combobox, ComboboxBuilder};
    pub use crate::field::{Field, Validatable};
    pub use crate::floating::{FloatingPanel, Placement, PositionConfig, PositionService};
    // Re-export commonly needed core types
    pub use tessel_core::{Document, ElementId, Key, ListConfig, OptionInit, SlotId};
}
