//! Identifier definitions.
//!
//! [`ResourceId`] is UUID-based and owned by this system. The name types are
//! owned by the cluster inventory and only validated here.

use uuid::Uuid;

use crate::{define_name, IdError};

/// Namespace for name-based resource IDs.
///
/// Changing this value changes every derived ID, so a restarted bridge would
/// no longer agree with a scheduler that outlived it.
pub const RESOURCE_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2b9e_4d3a_5e7f_8a10_b2c4_d6e8_f0a1);

// =============================================================================
// Resource IDs
// =============================================================================

/// Identifier of a resource in the topology.
///
/// Serialized and displayed in the canonical hyphenated UUID form, which is
/// also the form stored as a child's `parent_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(Uuid);

impl ResourceId {
    /// Creates a new random ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.0
    }

    /// Derives a stable ID from an arbitrary seed string.
    ///
    /// The same seed always yields the same ID.
    #[must_use]
    pub fn derive(seed: &str) -> Self {
        Self(Uuid::new_v5(&RESOURCE_NAMESPACE, seed.as_bytes()))
    }

    /// Parses an ID from its UUID string form.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }

        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| IdError::InvalidUuid(e.to_string()))
    }

    /// Maps an identifier reported by the cluster inventory to a resource ID.
    ///
    /// Inventory UIDs that are already UUIDs are used as-is; anything else
    /// (typically a hostname) is run through [`ResourceId::derive`].
    pub fn from_external(external: &str) -> Result<Self, IdError> {
        if external.is_empty() {
            return Err(IdError::Empty);
        }

        match Uuid::parse_str(external) {
            Ok(uuid) => Ok(Self(uuid)),
            Err(_) => Ok(Self::derive(external)),
        }
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl std::str::FromStr for ResourceId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Uuid> for ResourceId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl serde::Serialize for ResourceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// External names
// =============================================================================

define_name!(NodeName, "node name");
define_name!(WorkloadName, "workload name");

// =============================================================================
// Tests
// =============================================================================
