//! Transaction Payloads
//!
//! One variant per transaction kind, dispatched by pattern matching. The
//! serialized form keeps the original wire tags (`department_meta`,
//! `class_update`, `attendance`, ...) so existing snapshots stay readable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

/// Free-form entity attributes (`id`, `name`, `created_at`, ...).
pub type Attributes = serde_json::Map<String, Value>;

/// Attendance status for a single mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Leave,
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Present => "Present",
            Self::Absent => "Absent",
            Self::Leave => "Leave",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AttendanceStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Present" => Ok(Self::Present),
            "Absent" => Ok(Self::Absent),
            "Leave" => Ok(Self::Leave),
            other => Err(LedgerError::InvalidInput(format!(
                "invalid attendance status {:?}: use Present, Absent or Leave",
                other
            ))),
        }
    }
}

/// A single attendance mark, denormalized from the student's projected meta
/// at marking time so the record is self-contained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub student_id: String,
    pub student_name: String,
    pub roll: String,
    pub department_id: String,
    pub class_id: String,
    pub status: AttendanceStatus,
    pub timestamp: String,
}

/// Tagged transaction payload embedded in every block.
///
/// Immutable once mined: never edited or removed. Updates and deletes are
/// additional appended blocks, not retroactive edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transaction {
    DepartmentMeta { meta: Attributes },
    ClassMeta { meta: Attributes },
    StudentMeta { meta: Attributes },
    DepartmentUpdate { update: Attributes, timestamp: String },
    ClassUpdate { update: Attributes, timestamp: String },
    StudentUpdate { update: Attributes, timestamp: String },
    DepartmentDeleted { status: String, timestamp: String },
    ClassDeleted { status: String, timestamp: String },
    StudentDeleted { status: String, timestamp: String },
    Attendance(AttendanceRecord),
}

impl Transaction {
    /// Canonical serialized form used for hashing.
    pub fn canonical(&self) -> String {
        // Serializing these variants to a JSON value cannot fail: every
        // field is a string, map or enum over strings.
        let value = serde_json::to_value(self).expect("transaction serializes to JSON");
        canonical_json(&value)
    }

    /// Genesis attributes, if this is a `*_meta` payload.
    pub fn genesis_meta(&self) -> Option<&Attributes> {
        match self {
            Self::DepartmentMeta { meta }
            | Self::ClassMeta { meta }
            | Self::StudentMeta { meta } => Some(meta),
            _ => None,
        }
    }
}

/// Deterministic JSON encoding: object keys in lexicographic byte order at
/// every nesting level, no insignificant whitespace. Two semantically equal
/// payloads always hash identically regardless of encoder key order.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            out.push('{');
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
