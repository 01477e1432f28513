// crates/identity-runtime-contract/src/task.rs
// ============================================================================
// Module: Task Record Model
// Description: Dynamic accessor wrapper over the central task document.
// Purpose: Give contract checks typed, panic-free access to a JSON mapping.
// Dependencies: identity-runtime-core, serde_json
// ============================================================================

//! ## Overview
//! A task record is a JSON mapping carrying a fixed skeleton plus named
//! contracts. Contracts are dynamically typed sub-mappings; this wrapper
//! offers the accessors the checks need without committing the whole record
//! to a rigid struct.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use identity_runtime_core::document;
use identity_runtime_core::document::DocumentError;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Task Record
// ============================================================================

/// The central task document of an identity pack.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    /// Raw record mapping.
    map: Map<String, Value>,
}

impl TaskRecord {
    /// Loads a task record, rejecting non-object roots.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] on read, parse, or root-shape failure.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        Ok(Self {
            map: document::load_json_mapping(path)?,
        })
    }

    /// Wraps an in-memory mapping.
    #[must_use]
    pub const fn from_map(map: Map<String, Value>) -> Self {
        Self {
            map,
        }
    }

    /// Returns the raw mapping.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.map
    }

    /// Returns a top-level value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    /// Returns `true` when a top-level key exists.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Returns a top-level object, when present and object-shaped.
    #[must_use]
    pub fn object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.map.get(key).and_then(Value::as_object)
    }

    /// Returns a named contract mapping when present and non-empty.
    #[must_use]
    pub fn contract(&self, name: &str) -> Option<&Map<String, Value>> {
        self.object(name).filter(|map| !map.is_empty())
    }

    /// Returns the `gates` mapping.
    #[must_use]
    pub fn gates(&self) -> Option<&Map<String, Value>> {
        self.object("gates")
    }

    /// Returns `true` when a gate is marked `required`.
    #[must_use]
    pub fn gate_required(&self, gate: &str) -> bool {
        self.gates()
            .and_then(|gates| gates.get(gate))
            .and_then(Value::as_str)
            .map(|marking| marking == "required")
            .unwrap_or(false)
    }

    /// Returns the trimmed `task_id`, or an empty string.
    #[must_use]
    pub fn task_id(&self) -> String {
        str_of(&self.map, "task_id").unwrap_or_default().trim().to_string()
    }
}

// ============================================================================
// SECTION: Mapping Accessors
// ============================================================================

/// Returns a string field from a mapping.
#[must_use]
pub fn str_of<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// Returns a boolean field from a mapping.
#[must_use]
pub fn bool_of(map: &Map<String, Value>, key: &str) -> Option<bool> {
    map.get(key).and_then(Value::as_bool)
}

/// Returns an integer field from a mapping.
#[must_use]
pub fn int_of(map: &Map<String, Value>, key: &str) -> Option<i64> {
    map.get(key).and_then(Value::as_i64)
}

/// Returns a numeric field from a mapping.
#[must_use]
pub fn number_of(map: &Map<String, Value>, key: &str) -> Option<f64> {
    map.get(key).and_then(Value::as_f64)
}

/// Returns an array field from a mapping.
#[must_use]
pub fn list_of<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Vec<Value>> {
    map.get(key).and_then(Value::as_array)
}

/// Returns a nested object field from a mapping.
#[must_use]
pub fn object_of<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    map.get(key).and_then(Value::as_object)
}

/// Returns the string items of an array field, skipping non-strings.
#[must_use]
pub fn str_list(map: &Map<String, Value>, key: &str) -> Vec<String> {
    list_of(map, key)
        .map(|items| items.iter().filter_map(Value::as_str).map(ToString::to_string).collect())
        .unwrap_or_default()
}

/// Returns `true` when every needle appears in the haystack list.
#[must_use]
pub fn contains_all(haystack: &[String], needles: &[&str]) -> bool {
    needles.iter().all(|needle| haystack.iter().any(|item| item == needle))
}

/// Returns the needles missing from the haystack, in needle order.
#[must_use]
pub fn missing_from(haystack: &[String], needles: &[&str]) -> Vec<String> {
    needles
        .iter()
        .filter(|needle| !haystack.iter().any(|item| item == **needle))
        .map(ToString::to_string)
        .collect()
}
