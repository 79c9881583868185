use crate::model::{ChallengeIndex, CompletionStatus, ProgressRecord, Quest};

/// Derives reward unlock state from the challenge entries of a record.
///
/// Only indices below the quota count toward unlocking; entries at or beyond
/// it stay in the record but are ignored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionGate {
    quota: u32,
}

impl CompletionGate {
    /// Gate sized to the quest's challenge list.
    #[must_use]
    pub fn for_quest(quest: &Quest) -> Self {
        Self {
            quota: quest.quota(),
        }
    }

    #[must_use]
    pub fn quota(&self) -> u32 {
        self.quota
    }

    /// Compute the status for `record` without mutating it.
    #[must_use]
    pub fn status(&self, record: &ProgressRecord) -> CompletionStatus {
        let completed = record
            .challenge_completion()
            .range(..self.quota)
            .filter(|(_, done)| **done)
            .count();
        let completed_count = u32::try_from(completed).unwrap_or(u32::MAX);
        CompletionStatus {
            completed_count,
            quota: self.quota,
            unlocked: completed_count >= self.quota,
        }
    }

    /// Mark `index` complete on `record` and return the resulting status.
    ///
    /// Marking an already complete challenge leaves the record unchanged.
    pub fn mark_complete(
        &self,
        record: &mut ProgressRecord,
        index: ChallengeIndex,
    ) -> CompletionStatus {
        record.complete_challenge(index);
        self.status(record)
    }

    /// Whether `index` is one of the quest's challenges.
    #[must_use]
    pub fn counts_toward_quota(&self, index: ChallengeIndex) -> bool {
        index.value() < self.quota
    }
}
