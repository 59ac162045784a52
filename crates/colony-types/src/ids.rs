//! Strongly-typed identifiers used across the colony workspace.
//!
//! Colony-scoped entities (citizens, work orders) carry small integer ids
//! allocated by the owning colony. Request-system entities (tasks, data
//! stores) are addressed by opaque UUID tokens.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when a raw integer is not a valid citizen id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("citizen id 0 is reserved for \"unclaimed\"")]
pub struct ReservedCitizenId;

/// Unique identifier for a citizen within a colony.
///
/// The raw value `0` is reserved: persisted and wire formats use it to mean
/// "no citizen", so it can never name a real citizen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct CitizenId(u32);

impl CitizenId {
    /// Create a citizen id, returning `None` for the reserved value `0`.
    pub const fn new(raw: u32) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }

    /// Return the raw integer value.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Encode an optional citizen as a raw integer (`None` becomes `0`).
    pub fn raw_or_zero(id: Option<Self>) -> u32 {
        id.map_or(0, Self::get)
    }
}

impl TryFrom<u32> for CitizenId {
    type Error = ReservedCitizenId;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(ReservedCitizenId)
    }
}

impl From<CitizenId> for u32 {
    fn from(id: CitizenId) -> Self {
        id.0
    }
}

impl core::fmt::Display for CitizenId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "citizen#{}", self.0)
    }
}

/// Unique identifier for a work order within a colony.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WorkOrderId(pub u32);

impl WorkOrderId {
    /// Return the raw integer value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for WorkOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "order#{}", self.0)
    }
}

/// Generates a newtype wrapper around [`Uuid`] for request-system tokens.
macro_rules! define_token {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random token.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_token! {
    /// Opaque reference to a request tracked by the colony's request system.
    ///
    /// Dispatch jobs queue these tokens; the request payload itself stays
    /// with the request system.
    TaskToken
}

define_token! {
    /// Handle to a job's data store inside the request system.
    DataStoreToken
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn citizen_zero_is_reserved() {
        assert!(CitizenId::new(0).is_none());
        assert_eq!(CitizenId::new(7).map(CitizenId::get), Some(7));
        assert_eq!(CitizenId::raw_or_zero(None), 0);
    }

    #[test]
    fn citizen_serde_rejects_zero() {
        let ok: CitizenId = serde_json::from_str("12").unwrap();
        assert_eq!(ok.get(), 12);
        assert!(serde_json::from_str::<CitizenId>("0").is_err());
    }

    #[test]
    fn tokens_are_distinct() {
        assert_ne!(TaskToken::new(), TaskToken::new());
        let token = TaskToken::new();
        let json = serde_json::to_string(&token).unwrap();
        let back: TaskToken = serde_json::from_str(&json).unwrap();
        assert_eq!(token, back);
    }
}
