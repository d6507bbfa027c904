use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Deterministic-per-instance transaction id source.
///
/// Each generator owns a random v4 namespace; ids are v5 hashes of a counter
/// under that namespace, so ids from one engine instance never collide and
/// two instances never share an id space.
#[derive(Debug)]
pub struct TransactionIdGenerator {
    namespace: Uuid,
    counter: AtomicU64,
}

impl TransactionIdGenerator {
    pub fn new() -> Self {
        TransactionIdGenerator {
            namespace: Uuid::new_v4(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn next(&self) -> Uuid {
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed);
        Uuid::new_v5(&self.namespace, &sequence.to_le_bytes())
    }
}

impl Default for TransactionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
