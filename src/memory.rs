use std::time::{SystemTime, UNIX_EPOCH};

/// Saved context carried into every later invocation, whatever agent is active.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryRecord {
    pub id: String,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u128,
    pub source_agent: String,
}

/// Holds at most one record. A save overwrites, it never merges.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    slot: Option<MemoryRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&mut self, content: impl Into<String>, source_agent: impl Into<String>) -> &MemoryRecord {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        self.slot.insert(MemoryRecord {
            id: timestamp.to_string(),
            content: content.into(),
            timestamp,
            source_agent: source_agent.into(),
        })
    }

    pub fn current(&self) -> Option<&MemoryRecord> {
        self.slot.as_ref()
    }

    pub fn snippet(&self) -> Option<&str> {
        self.slot.as_ref().map(|record| record.content.as_str())
    }

    pub fn is_active(&self) -> bool {
        self.slot.is_some()
    }
}
