//! Form participation
//!
//! Lists hand their value and a restorable state snapshot to a
//! [`FormHost`] after every settled change, along with validity flags.
//! The host (native form association in a browser deployment) is opaque to
//! the engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered multimap of form entries; names may repeat
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormData {
    entries: Vec<(String, String)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value stored under `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Constraint validation flags derived from selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityFlags {
    pub value_missing: bool,
    pub too_short: bool,
    pub too_long: bool,
}

impl ValidityFlags {
    pub fn is_valid(&self) -> bool {
        !(self.value_missing || self.too_short || self.too_long)
    }
}

/// Receives value/state snapshots and validity from a list
pub trait FormHost {
    /// `value` is submitted with the form; `state` is what the host hands
    /// back on restoration
    fn set_form_value(&mut self, value: Option<FormData>, state: Option<FormData>);

    fn set_validity(&mut self, flags: ValidityFlags, message: &str);
}

/// Restorable list state
///
/// Written with serde; read back through [`Self::from_json`], which keeps
/// every well-formed field when others have the wrong type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSnapshot {
    pub multiple: bool,
    pub min_length: usize,
    /// `None` means unbounded
    pub max_length: Option<usize>,
    pub values: Vec<String>,
}

const MULTIPLE: &str = "multiple";
const MIN_LENGTH: &str = "minLength";
const MAX_LENGTH: &str = "maxLength";
const VALUE: &str = "value";

impl ListSnapshot {
    pub fn to_form_data(&self) -> FormData {
        let mut data = FormData::new();
        data.append(MULTIPLE, self.multiple.to_string());
        data.append(MIN_LENGTH, self.min_length.to_string());
        if let Some(max) = self.max_length {
            data.append(MAX_LENGTH, max.to_string());
        }
        for value in &self.values {
            data.append(VALUE, value.clone());
        }
        data
    }

    /// Parse a saved state; each malformed or missing entry falls back to its default
    pub fn from_form_data(data: &FormData) -> Self {
        let multiple = match data.get(MULTIPLE) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::debug!(raw, "malformed `multiple` in saved state");
                false
            }),
            None => false,
        };
        let min_length = match data.get(MIN_LENGTH) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::debug!(raw, "malformed `minLength` in saved state");
                0
            }),
            None => 0,
        };
        let max_length = data.get(MAX_LENGTH).and_then(|raw| {
            let parsed: Option<usize> = raw.parse().ok();
            if parsed.is_none() {
                tracing::debug!(raw, "malformed `maxLength` in saved state");
            }
            parsed
        });

        Self {
            multiple,
            min_length,
            max_length,
            values: data.get_all(VALUE).map(str::to_string).collect(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Lenient JSON restore with the same per-field fallback as [`Self::from_form_data`]
    pub fn from_json(text: &str) -> Self {
        let root = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                tracing::warn!("saved list state is not a JSON object; using defaults");
                return Self::default();
            }
        };

        let values = match root.get("values") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };

        Self {
            multiple: root
                .get("multiple")
                .and_then(Value::as_bool)
                .unwrap_or_default(),
            min_length: root
                .get("minLength")
                .and_then(Value::as_u64)
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or_default(),
            max_length: root
                .get("maxLength")
                .and_then(Value::as_u64)
                .and_then(|n| usize::try_from(n).ok()),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_data_multimap() {
        let mut data = FormData::new();
        data.append("value", "a");
        data.append("value", "b");
        data.append("other", "x");

        assert_eq!(data.get("value"), Some("a"));
        assert_eq!(data.get_all("value").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(data.len(), 3);
    }

    #[test]
    fn test_validity_flags() {
        assert!(ValidityFlags::default().is_valid());
        let flags = ValidityFlags {
            too_long: true,
            ..Default::default()
        };
        assert!(!flags.is_valid());
    }

    #[test]
    fn test_snapshot_through_form_data() {
        let snapshot = ListSnapshot {
            multiple: true,
            min_length: 1,
            max_length: Some(2),
            values: vec!["a".into(), "c".into()],
        };
        assert_eq!(
            ListSnapshot::from_form_data(&snapshot.to_form_data()),
            snapshot
        );
    }

    #[test]
    fn test_malformed_form_data_falls_back_per_field() {
        let mut data = FormData::new();
        data.append("multiple", "yes please");
        data.append("minLength", "2");
        data.append("maxLength", "-4");
        data.append("value", "b");

        let snapshot = ListSnapshot::from_form_data(&data);
        assert!(!snapshot.multiple);
        assert_eq!(snapshot.min_length, 2);
        assert_eq!(snapshot.max_length, None);
        assert_eq!(snapshot.values, vec!["b".to_string()]);
    }

    #[test]
    fn test_from_json_lenient() {
        let snapshot =
            ListSnapshot::from_json(r#"{"multiple": true, "minLength": "three", "values": ["a", 4]}"#);
        assert!(snapshot.multiple);
        assert_eq!(snapshot.min_length, 0);
        assert_eq!(snapshot.values, vec!["a".to_string()]);

        assert_eq!(ListSnapshot::from_json("not json"), ListSnapshot::default());
    }

    #[test]
    fn test_json_uses_camel_case() {
        let snapshot = ListSnapshot {
            multiple: false,
            min_length: 0,
            max_length: Some(3),
            values: vec!["x".into()],
        };
        let json = snapshot.to_json();
        assert!(json.contains("\"maxLength\":3"));
        assert_eq!(ListSnapshot::from_json(&json), snapshot);
    }
}
