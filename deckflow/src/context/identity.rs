//! Run identity for tracking pipeline executions.

use crate::utils::{now_utc, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIdentity {
    /// The unique ID for this pipeline run.
    pub run_id: Uuid,
    /// When the run context was created.
    pub started_at: Timestamp,
}

impl Default for RunIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl RunIdentity {
    /// Creates a new run identity with a generated run ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_run_id(Uuid::new_v4())
    }

    /// Creates a run identity with a specific run ID.
    #[must_use]
    pub fn with_run_id(run_id: Uuid) -> Self {
        Self {
            run_id,
            started_at: now_utc(),
        }
    }

    /// Returns the run ID as a hyphenated string.
    #[must_use]
    pub fn run_id_string(&self) -> String {
        self.run_id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_identity_is_v4() {
        let identity = RunIdentity::new();
        assert_eq!(identity.run_id.get_version_num(), 4);
    }

    #[test]
    fn test_identities_are_unique() {
        assert_ne!(RunIdentity::new().run_id, RunIdentity::new().run_id);
    }

    #[test]
    fn test_with_run_id() {
        let id = Uuid::new_v4();
        let identity = RunIdentity::with_run_id(id);
        assert_eq!(identity.run_id_string(), id.to_string());
    }
}
