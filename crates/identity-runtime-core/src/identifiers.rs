// crates/identity-runtime-core/src/identifiers.rs
// ============================================================================
// Module: Identity Runtime Identifiers
// Description: Canonical opaque identifiers for packs, runs, and contracts.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the canonical string-based identifiers used throughout
//! the identity runtime. Identifiers are opaque and serialize as strings.
//! Validation is handled at catalog or CLI boundaries rather than within
//! these simple wrappers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Macro
// ============================================================================

/// Declares a transparent string-backed identifier type.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Default, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns `true` when the identifier is empty after trimming.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

string_id! {
    /// Identity identifier (catalog slug).
    ///
    /// # Invariants
    /// - Unique within a catalog; uniqueness is enforced by the manifest
    ///   validator, not by this wrapper.
    IdentityId
}

string_id! {
    /// Run identifier for one upgrade executor invocation.
    ///
    /// # Invariants
    /// - Embeds the identity id and a unix-seconds stamp; treated as opaque
    ///   once minted.
    RunId
}

string_id! {
    /// Install or verify report identifier.
    ReportId
}

string_id! {
    /// Rulebook row identifier.
    RuleId
}
