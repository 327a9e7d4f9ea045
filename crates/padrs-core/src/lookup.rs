// padrs Address Source
// Interface to the external process-memory address table

use std::collections::HashMap;

/// Resolves well-known symbolic names to current process addresses.
///
/// The concrete reader lives outside this crate; it scans the observed
/// process, raises [`GameEvent::AddressFound`](crate::GameEvent::AddressFound)
/// when its table changes, and answers lookups from that table. Lookups are
/// only meaningful after an address-found notification; before that, or for
/// names the reader has not resolved, the answer is `None`.
pub trait AddressSource {
    /// Current address for a well-known name, if resolved.
    fn lookup(&self, name: &str) -> Option<u64>;
}

/// Map-backed address source.
///
/// Used by embedders that receive the table wholesale, and by tests.
#[derive(Debug, Clone, Default)]
pub struct TableSource {
    entries: HashMap<String, u64>,
}

impl TableSource {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry.
    pub fn set(&mut self, name: impl Into<String>, address: u64) {
        self.entries.insert(name.into(), address);
    }

    /// Remove an entry.
    pub fn clear(&mut self, name: &str) {
        self.entries.remove(name);
    }

    /// Number of resolved entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AddressSource for TableSource {
    fn lookup(&self, name: &str) -> Option<u64> {
        self.entries.get(name).copied()
    }
}
