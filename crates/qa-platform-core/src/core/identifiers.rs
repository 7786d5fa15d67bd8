// crates/qa-platform-core/src/core/identifiers.rs
// ============================================================================
// Module: QA Platform Identifiers
// Description: Canonical numeric identifiers for forum entities.
// Purpose: Provide strongly typed, serializable IDs with stable numeric forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every persisted forum entity is addressed by a non-zero 64-bit identifier.
//! Each entity kind gets its own newtype so a question id can never be passed
//! where a message id is expected. Identifiers serialize as plain JSON numbers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Common surface of the numeric identifier newtypes.
pub trait NumericId: Copy + Ord {
    /// Creates an identifier from a raw value (returns `None` if zero).
    fn from_raw(raw: u64) -> Option<Self>;

    /// Returns the raw identifier value.
    fn get(self) -> u64;
}

/// Declares a non-zero numeric identifier newtype.
macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        ///
        /// # Invariants
        /// - Always >= 1 (non-zero, 1-based).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(NonZeroU64);

        impl $name {
            /// Smallest identifier.
            pub const MIN: Self = Self(NonZeroU64::MIN);
            /// Largest identifier.
            pub const MAX: Self = Self(NonZeroU64::MAX);

            /// Creates a new identifier from a non-zero value.
            #[must_use]
            pub const fn new(id: NonZeroU64) -> Self {
                Self(id)
            }

            /// Creates an identifier from a raw value (returns `None` if zero).
            #[must_use]
            pub fn from_raw(raw: u64) -> Option<Self> {
                NonZeroU64::new(raw).map(Self)
            }

            /// Creates an identifier from a signed storage value (returns `None` if < 1).
            #[must_use]
            pub fn from_i64(raw: i64) -> Option<Self> {
                u64::try_from(raw).ok().and_then(Self::from_raw)
            }

            /// Returns the raw identifier value (always >= 1).
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0.get()
            }

            /// Returns the identifier as a signed storage value.
            ///
            /// Values above `i64::MAX` saturate; the stores never allocate them.
            #[must_use]
            pub fn to_i64(self) -> i64 {
                i64::try_from(self.0.get()).unwrap_or(i64::MAX)
            }
        }

        impl NumericId for $name {
            fn from_raw(raw: u64) -> Option<Self> {
                Self::from_raw(raw)
            }

            fn get(self) -> u64 {
                self.get()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.get().fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let raw: u64 = value.trim().parse().map_err(|_| IdParseError {
                    kind: stringify!($name),
                    value: value.to_string(),
                })?;
                Self::from_raw(raw).ok_or_else(|| IdParseError {
                    kind: stringify!($name),
                    value: value.to_string(),
                })
            }
        }
    };
}

numeric_id!(
    /// Registered user identifier.
    UserId
);
numeric_id!(
    /// Tag identifier.
    TagId
);
numeric_id!(
    /// Question identifier.
    QuestionId
);
numeric_id!(
    /// Answer identifier.
    AnswerId
);
numeric_id!(
    /// Question comment identifier.
    CommentId
);
numeric_id!(
    /// Chat identifier (single, group or global chat).
    ChatId
);
numeric_id!(
    /// Chat message identifier.
    MessageId
);
numeric_id!(
    /// Starred message marker identifier.
    MessageStarId
);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Error returned when a string does not hold a valid identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: '{value}'")]
pub struct IdParseError {
    /// Identifier type name.
    pub kind: &'static str,
    /// Raw input value.
    pub value: String,
}
