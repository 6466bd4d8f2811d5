use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub id: Uuid,
    pub reason: String,
}

/// Per-item result of a best-effort batch write. Rows are written one at a
/// time, so a batch can partially succeed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn record_success(&mut self, id: Uuid) {
        self.succeeded.push(id);
    }

    pub fn record_failure(&mut self, id: Uuid, reason: impl Into<String>) {
        self.failed.push(BatchFailure {
            id,
            reason: reason.into(),
        });
    }

    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}
