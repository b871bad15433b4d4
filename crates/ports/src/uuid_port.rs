//! UUID port (spec §6 "Clock/UUID port", `NewUUID()`).

use uuid::Uuid;

/// Port for generating unique identifiers.
///
/// Injected so tests can supply deterministic IDs; production drivers wrap
/// [`Uuid::new_v4`].
pub trait UuidPort: Send + Sync {
    /// Generate a new unique identifier.
    fn new_uuid(&self) -> Uuid;
}

/// [`UuidPort`] backed by random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomUuidSource;

impl UuidPort for RandomUuidSource {
    fn new_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_source_produces_distinct_uuids() {
        let source = RandomUuidSource;
        assert_ne!(source.new_uuid(), source.new_uuid());
    }

    #[test]
    fn port_is_object_safe() {
        fn _assert(_: &dyn UuidPort) {}
    }
}
