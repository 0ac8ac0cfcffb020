//! Resource ID generation.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::ResourceId;

/// Source of fresh resource IDs.
///
/// Implementations must never hand out the same ID twice within a process.
pub trait IdentityGenerator: Send + Sync {
    /// Returns a fresh ID.
    fn generate(&self) -> ResourceId;
}

/// Generates random (v4) UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdentityGenerator for RandomIdGenerator {
    fn generate(&self) -> ResourceId {
        ResourceId::new()
    }
}

/// Generates predictable IDs from a counter.
///
/// Useful in tests where assertions need to name the coordinator up front.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    /// Creates a generator whose first ID encodes `start`.
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// Returns the ID a generator would produce for counter value `n`.
    #[must_use]
    pub fn id_for(n: u64) -> ResourceId {
        ResourceId::from_uuid(Uuid::from_u128(u128::from(n)))
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdentityGenerator for SequentialIdGenerator {
    fn generate(&self) -> ResourceId {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        Self::id_for(n)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_random_generator_unique() {
        let generator = RandomIdGenerator;
        let ids: HashSet<_> = (0..1000).map(|_| generator.generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_sequential_generator() {
        let generator = SequentialIdGenerator::default();
        assert_eq!(generator.generate(), SequentialIdGenerator::id_for(1));
        assert_eq!(generator.generate(), SequentialIdGenerator::id_for(2));
    }

    #[test]
    fn test_generator_as_trait_object() {
        let generator: Box<dyn IdentityGenerator> = Box::new(SequentialIdGenerator::starting_at(7));
        assert_eq!(generator.generate().to_string(), "00000000-0000-0000-0000-000000000007");
    }
}
