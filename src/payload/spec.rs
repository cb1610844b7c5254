//! Field tables - declarative rules for interpreting packet payloads.
//!
//! A field table maps output field names to decoding rules. Tables are
//! plain data and deserialize from JSON, so captures from a controller
//! model the crate has never seen can be decoded by shipping a table
//! next to them instead of new code.
//!
//! # Example
//!
//! ```
//! use vbus_stream::payload::{FieldSpec, FieldTable};
//!
//! let table = FieldTable::from_json(
//!     r#"{
//!         "S1": { "type": "numeric", "frame": 0, "bytes": [0, 1], "multiplier": 0.1 },
//!         "Relays": { "type": "bitmask", "frame": 2, "offset": 2 }
//!     }"#,
//! )
//! .unwrap();
//!
//! assert!(matches!(table.get("S1"), Some(FieldSpec::Numeric { .. })));
//! assert_eq!(table.len(), 2);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One addend of a compound rule.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompoundPart {
    /// Frame index the part reads from.
    pub frame: usize,
    /// Byte offsets within the frame, least significant first.
    pub bytes: Vec<usize>,
    /// Scale factor applied to the part before summing.
    pub multiplier: f64,
}

/// Decoding rule for a single output field.
///
/// The `type` tag selects the rule kind. Unknown tags are rejected when
/// a table is parsed, never at decode time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldSpec {
    /// Scaled little-endian integer read from one frame.
    Numeric {
        /// Frame index the value is read from.
        frame: usize,
        /// Byte offsets within the frame, least significant first.
        bytes: Vec<usize>,
        /// Scale factor applied to the raw integer.
        multiplier: f64,
        /// Treat the top byte as unsigned (two's complement otherwise).
        #[serde(default)]
        unsigned: bool,
    },
    /// Two-byte minute counter rendered as "hours:minutes".
    Time {
        /// Frame index the counter is read from.
        frame: usize,
        /// Offset of the counter's low byte.
        offset: usize,
    },
    /// Sum of scaled parts, possibly spanning frames.
    Compound {
        /// Parts to decode and add together.
        parts: Vec<CompoundPart>,
    },
    /// Single byte rendered as eight binary digits.
    Bitmask {
        /// Frame index the byte is read from.
        frame: usize,
        /// Offset of the byte within the frame.
        offset: usize,
    },
}

/// Table mapping output field names to decoding rules.
///
/// Deserializes transparently from a JSON object, so the on-disk form
/// is just `{"name": {rule}, ...}`. Iteration is in name order, which
/// keeps decoded records deterministic.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct FieldTable {
    fields: BTreeMap<String, FieldSpec>,
}

impl FieldTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a table from its JSON form.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Add a rule to the table, replacing any earlier rule of the same
    /// name.
    pub fn insert(&mut self, name: &str, spec: FieldSpec) {
        self.fields.insert(name.to_string(), spec);
    }

    /// Get a rule by field name.
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// Iterate rules in field name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Get the number of rules.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A decoded field value.
///
/// Serializes untagged, so a record of decoded fields turns into flat
/// JSON like `{"S1": 1.6, "Time": "2:5"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Scaled numeric value (numeric and compound rules).
    Number(f64),
    /// Rendered text value (time and bitmask rules).
    Text(String),
}

impl FieldValue {
    /// Get the numeric value, if this is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }

    /// Get the text value, if this is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(value) => Some(value),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
        }
    }
}
