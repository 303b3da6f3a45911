//! Optional-path access into raw study documents.
//!
//! Every step down the document goes through [`Section`]: a key that is
//! missing, null or not an object resolves to an empty object, so a study
//! without e.g. `sponsorCollaboratorsModule` reads as empty rather than failing.

use std::sync::LazyLock;

use serde_json::{Map, Value};

static EMPTY_OBJECT: LazyLock<Value> = LazyLock::new(|| Value::Object(Map::new()));

/// Borrowed view of a JSON object inside a study document
#[derive(Debug, Clone, Copy)]
pub struct Section<'a>(&'a Value);

impl<'a> Section<'a> {
    /// View `doc` as a section; non-objects become the empty object
    pub fn root(doc: &'a Value) -> Self {
        if doc.is_object() {
            Self(doc)
        } else {
            Self(&EMPTY_OBJECT)
        }
    }

    /// Child object under `key`
    pub fn section(self, key: &str) -> Section<'a> {
        match self.0.get(key) {
            Some(v @ Value::Object(_)) => Self(v),
            _ => Self(&EMPTY_OBJECT),
        }
    }

    /// Walk several keys, applying the empty-object rule at each step
    pub fn path(self, keys: &[&str]) -> Section<'a> {
        keys.iter().fold(self, |s, key| s.section(key))
    }

    /// String value under `key`
    pub fn text(self, key: &str) -> Option<&'a str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Integer value under `key`; integral floats and numeric strings are accepted
    pub fn int(self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Array under `key`; anything else reads as an empty list
    pub fn list(self, key: &str) -> &'a [Value] {
        match self.0.get(key) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// Strings of the array under `key`, skipping non-string entries
    pub fn strings(self, key: &str) -> impl Iterator<Item = &'a str> {
        self.list(key).iter().filter_map(Value::as_str)
    }

    pub fn is_empty(self) -> bool {
        self.0.as_object().is_none_or(Map::is_empty)
    }
}
