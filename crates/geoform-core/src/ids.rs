//! # Location Identifier Newtypes
//!
//! Domain-primitive newtypes for the three levels of the location
//! hierarchy. Each identifier is a distinct type — you cannot pass a
//! [`StateId`] where a [`DistrictId`] is expected, so a districts-by-state
//! lookup can never be called with a country code by accident.
//!
//! ## Validation
//!
//! The remote geo service issues strictly positive integer identifiers;
//! zero is the service's "no value" sentinel and is rejected at
//! construction time. Deserialization routes through `new()` so invalid
//! wire values are rejected rather than silently accepted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors from identifier construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier value is zero, which the geo service reserves as
    /// its "unset" sentinel.
    #[error("{kind} must be a positive integer, got 0")]
    Zero {
        /// Which identifier kind was being constructed.
        kind: &'static str,
    },
}

/// Helper macro for integer identifier newtypes: positive-only
/// construction, transparent serialization, and validating deserialization.
macro_rules! location_id {
    ($(#[$doc:meta])* $ty:ident, $kind:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $ty(u32);

        impl $ty {
            /// Create a new identifier. Zero is rejected.
            pub fn new(value: u32) -> Result<Self, IdError> {
                if value == 0 {
                    return Err(IdError::Zero { kind: $kind });
                }
                Ok(Self(value))
            }

            /// Access the underlying integer value.
            pub fn value(&self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<u32> for $ty {
            type Error = IdError;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = u32::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

location_id! {
    /// A country identifier as issued by the remote geo service.
    ///
    /// Note that this is the service's own country key, not an ITU dial
    /// code — India's record may carry `code: 91` *and* `dialCode: 91`,
    /// but the two are independent fields.
    CountryCode, "country code"
}

location_id! {
    /// A state identifier, unique within its owning country.
    StateId, "state id"
}

location_id! {
    /// A district identifier, unique within its owning state.
    DistrictId, "district id"
}
