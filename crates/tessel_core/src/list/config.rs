//! List configuration and attribute mutations

use std::time::Duration;

use crate::notify::DEFAULT_NOTIFY_DELAY;

/// Selection constraints and flags of an option list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListConfig {
    pub multiple: bool,
    pub required: bool,
    pub disabled: bool,
    pub read_only: bool,
    /// Disabled state pushed down from an ancestor form
    pub form_disabled: bool,
    /// Minimum selected count in multiple mode
    pub min_length: usize,
    /// Maximum selected count in multiple mode, `None` when unbounded
    pub max_length: Option<usize>,
    /// Form entry name used for the submitted value
    pub name: String,
    /// Coalescing window for input/change notifications
    pub notify_delay: Duration,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            multiple: false,
            required: false,
            disabled: false,
            read_only: false,
            form_disabled: false,
            min_length: 0,
            max_length: None,
            name: String::new(),
            notify_delay: DEFAULT_NOTIFY_DELAY,
        }
    }
}

impl ListConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = min;
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn notify_delay(mut self, delay: Duration) -> Self {
        self.notify_delay = delay;
        self
    }

    /// User-initiated changes are refused entirely
    pub fn is_read_only(&self) -> bool {
        self.disabled || self.read_only || self.form_disabled
    }

    pub(crate) fn apply(&mut self, mutation: ListMutation) {
        match mutation {
            ListMutation::Multiple(multiple) => self.multiple = multiple,
            ListMutation::Required(required) => self.required = required,
            ListMutation::Disabled(disabled) => self.disabled = disabled,
            ListMutation::ReadOnly(read_only) => self.read_only = read_only,
            ListMutation::FormDisabled(disabled) => self.form_disabled = disabled,
            ListMutation::MinLength(min) => self.min_length = min,
            ListMutation::MaxLength(max) => self.max_length = max,
            ListMutation::Name(name) => self.name = name,
        }
    }
}

/// A runtime change to the list's configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListMutation {
    Multiple(bool),
    Required(bool),
    Disabled(bool),
    ReadOnly(bool),
    FormDisabled(bool),
    MinLength(usize),
    MaxLength(Option<usize>),
    Name(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_sources() {
        assert!(!ListConfig::new().is_read_only());
        assert!(ListConfig::new().disabled(true).is_read_only());
        assert!(ListConfig::new().read_only(true).is_read_only());

        let mut config = ListConfig::new();
        config.apply(ListMutation::FormDisabled(true));
        assert!(config.is_read_only());
    }

    #[test]
    fn test_apply_mutations() {
        let mut config = ListConfig::new();
        config.apply(ListMutation::Multiple(true));
        config.apply(ListMutation::MaxLength(Some(2)));
        config.apply(ListMutation::Name("fruit".into()));
        assert_eq!(
            config,
            ListConfig::new().multiple(true).max_length(2).name("fruit")
        );
    }
}
