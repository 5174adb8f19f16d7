//! Record id generation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of fresh record ids.
///
/// The store never trusts a generator to avoid collisions with ids already
/// in a list; it draws again until the id is unused.
pub trait IdGenerator: Send + Sync {
    /// Produce a new id.
    fn next_id(&self) -> String;
}

/// Random version-4 UUIDs. The default generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// `{prefix}-{n}` with a monotonically increasing `n`, starting at 1.
///
/// Deterministic, for tests and fixtures.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{n}", self.prefix)
    }
}
