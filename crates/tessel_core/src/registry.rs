//! Custom element definitions
//!
//! Light-DOM children may be custom elements whose definition has not been
//! registered yet. Until their tag is defined they are plain elements, so
//! the list waits for pending tags before settling its owned sequence.
//!
//! The wait is an injected [`ElementRegistry`] rather than a global, so
//! tests and embedders decide when (or whether) a tag becomes ready.
//!
//! ```ignore
//! let registry = Rc::new(DefinitionRegistry::new());
//! let ready = registry.when_defined("x-option");
//!
//! registry.define("x-option", ElementKind::Option);
//! assert_eq!(ready.await, Ok(ElementKind::Option));
//! ```

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;

use rustc_hash::FxHashMap;
use tokio::sync::watch;

use crate::error::UpgradeError;

/// What a defined tag behaves as
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// A selectable option
    Option,
    /// An option that also opens and closes (accordion item)
    Disclosure,
    /// A defined custom element that is not option-like
    Other,
}

impl ElementKind {
    /// Whether elements of this kind can be owned by an option list
    pub fn is_option(self) -> bool {
        matches!(self, ElementKind::Option | ElementKind::Disclosure)
    }
}

/// Future resolved once a tag is defined (or its definition fails)
pub type DefinitionFuture = Pin<Box<dyn Future<Output = Result<ElementKind, UpgradeError>>>>;

/// Lookup and wait interface for custom element definitions
pub trait ElementRegistry {
    /// Kind of an already-defined tag, `None` while undefined
    fn kind_of(&self, tag: &str) -> Option<ElementKind>;

    /// Resolve when `tag` is defined
    fn when_defined(&self, tag: &str) -> DefinitionFuture;

    /// Whether `tag` names a custom element that is still waiting for its definition
    fn is_pending(&self, tag: &str) -> bool {
        is_custom_tag(tag) && self.kind_of(tag).is_none()
    }
}

/// Custom element names must contain a hyphen
pub fn is_custom_tag(tag: &str) -> bool {
    tag.contains('-')
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Definition {
    Pending,
    Defined(ElementKind),
    Failed(String),
}

/// In-process registry backed by one watch channel per tag
#[derive(Default)]
pub struct DefinitionRegistry {
    tags: RefCell<FxHashMap<String, watch::Sender<Definition>>>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `tag`, waking every waiter
    ///
    /// Redefining a tag is ignored, matching the platform's one-shot semantics.
    pub fn define(&self, tag: &str, kind: ElementKind) {
        let mut tags = self.tags.borrow_mut();
        let sender = tags
            .entry(tag.to_string())
            .or_insert_with(|| watch::channel(Definition::Pending).0);

        if matches!(*sender.borrow(), Definition::Defined(_)) {
            tracing::warn!(tag, "ignoring redefinition of custom element");
            return;
        }
        sender.send_replace(Definition::Defined(kind));
        tracing::debug!(tag, ?kind, "custom element defined");
    }

    /// Reject every current and future waiter for `tag`
    pub fn fail(&self, tag: &str, reason: impl Into<String>) {
        let reason = reason.into();
        let mut tags = self.tags.borrow_mut();
        let sender = tags
            .entry(tag.to_string())
            .or_insert_with(|| watch::channel(Definition::Pending).0);
        if matches!(*sender.borrow(), Definition::Defined(_)) {
            return;
        }
        tracing::warn!(tag, %reason, "custom element definition failed");
        sender.send_replace(Definition::Failed(reason));
    }

    fn receiver(&self, tag: &str) -> watch::Receiver<Definition> {
        self.tags
            .borrow_mut()
            .entry(tag.to_string())
            .or_insert_with(|| watch::channel(Definition::Pending).0)
            .subscribe()
    }
}

impl ElementRegistry for DefinitionRegistry {
    fn kind_of(&self, tag: &str) -> Option<ElementKind> {
        match self.tags.borrow().get(tag).map(|s| (*s.borrow()).clone()) {
            Some(Definition::Defined(kind)) => Some(kind),
            _ => None,
        }
    }

    fn when_defined(&self, tag: &str) -> DefinitionFuture {
        let tag = tag.to_string();
        if !is_custom_tag(&tag) {
            return Box::pin(async { Ok(ElementKind::Other) });
        }

        let mut rx = self.receiver(&tag);
        Box::pin(async move {
            let settled = rx
                .wait_for(|d| !matches!(d, Definition::Pending))
                .await
                .map(|d| (*d).clone())
                .map_err(|_| UpgradeError::RegistryClosed(tag.clone()))?;

            match settled {
                Definition::Defined(kind) => Ok(kind),
                Definition::Failed(reason) => Err(UpgradeError::Failed { tag, reason }),
                Definition::Pending => unreachable!("wait_for only returns settled definitions"),
            }
        })
    }
}
