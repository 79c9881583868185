use std::collections::BTreeMap;

use crate::model::input::ChallengeIndex;
use crate::model::quest::CompletionStatus;
use crate::model::section::SectionId;

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// Canonical record of a visitor's progress through the guide.
///
/// Invariants:
/// - `visited_sections` always holds exactly one entry per `SectionId`.
/// - a visited flag never goes back to `false` once set.
/// - `active_section` is never cleared after the first activation.
/// - challenge entries are only ever added or set to `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    visitor_label: Option<String>,
    visited_sections: BTreeMap<SectionId, bool>,
    active_section: Option<SectionId>,
    challenge_completion: BTreeMap<u32, bool>,
}

impl ProgressRecord {
    /// Fresh record: nothing visited, no active section, no challenges.
    #[must_use]
    pub fn new() -> Self {
        Self {
            visitor_label: None,
            visited_sections: SectionId::ALL.into_iter().map(|id| (id, false)).collect(),
            active_section: None,
            challenge_completion: BTreeMap::new(),
        }
    }

    /// Rehydrate a record from persisted parts.
    ///
    /// Sections missing from `visited` are backfilled as not visited, so
    /// records written before a section existed upgrade transparently.
    #[must_use]
    pub fn from_persisted(
        visitor_label: Option<String>,
        visited: impl IntoIterator<Item = (SectionId, bool)>,
        active_section: Option<SectionId>,
        challenge_completion: impl IntoIterator<Item = (u32, bool)>,
    ) -> Self {
        let mut record = Self::new();
        record.visitor_label = normalize_label(visitor_label);
        for (id, seen) in visited {
            record.visited_sections.insert(id, seen);
        }
        record.active_section = active_section;
        record.challenge_completion = challenge_completion.into_iter().collect();
        record
    }

    #[must_use]
    pub fn visitor_label(&self) -> Option<&str> {
        self.visitor_label.as_deref()
    }

    /// Replace the visitor label. Blank labels clear it.
    ///
    /// Returns `true` if the stored label changed.
    pub fn set_visitor_label(&mut self, label: Option<String>) -> bool {
        let label = normalize_label(label);
        if label == self.visitor_label {
            return false;
        }
        self.visitor_label = label;
        true
    }

    #[must_use]
    pub fn visited_sections(&self) -> &BTreeMap<SectionId, bool> {
        &self.visited_sections
    }

    #[must_use]
    pub fn is_visited(&self, id: SectionId) -> bool {
        self.visited_sections.get(&id).copied().unwrap_or(false)
    }

    /// Number of sections viewed at least once.
    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.visited_sections.values().filter(|seen| **seen).count()
    }

    #[must_use]
    pub fn active_section(&self) -> Option<SectionId> {
        self.active_section
    }

    /// Make `id` the active section and mark it visited.
    ///
    /// Returns `false` without touching the record when `id` is already active.
    pub fn activate(&mut self, id: SectionId) -> bool {
        if self.active_section == Some(id) {
            return false;
        }
        self.active_section = Some(id);
        self.visited_sections.insert(id, true);
        true
    }

    #[must_use]
    pub fn challenge_completion(&self) -> &BTreeMap<u32, bool> {
        &self.challenge_completion
    }

    #[must_use]
    pub fn is_challenge_complete(&self, index: ChallengeIndex) -> bool {
        self.challenge_completion
            .get(&index.value())
            .copied()
            .unwrap_or(false)
    }

    /// Record a challenge as complete.
    ///
    /// Returns `true` only if the challenge was not already complete.
    pub fn complete_challenge(&mut self, index: ChallengeIndex) -> bool {
        let entry = self.challenge_completion.entry(index.value()).or_insert(false);
        if *entry {
            return false;
        }
        *entry = true;
        true
    }
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_label(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub record: ProgressRecord,
    pub completion: CompletionStatus,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn active_section(&self) -> Option<SectionId> {
        self.record.active_section()
    }

    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.record.visited_count()
    }

    #[must_use]
    pub fn total_sections(&self) -> usize {
        SectionId::COUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_has_every_section_unvisited() {
        let record = ProgressRecord::new();
        assert_eq!(record.visited_sections().len(), SectionId::COUNT);
        assert!(record.visited_sections().values().all(|seen| !seen));
        assert_eq!(record.active_section(), None);
        assert!(record.challenge_completion().is_empty());
        assert_eq!(record.visitor_label(), None);
    }

    #[test]
    fn activate_marks_visited_once() {
        let mut record = ProgressRecord::new();
        assert!(record.activate(SectionId::Methods));
        assert!(record.is_visited(SectionId::Methods));
        assert_eq!(record.active_section(), Some(SectionId::Methods));

        assert!(!record.activate(SectionId::Methods));

        assert!(record.activate(SectionId::Welcome));
        assert!(record.is_visited(SectionId::Methods));
        assert_eq!(record.visited_count(), 2);
    }

    #[test]
    fn from_persisted_backfills_missing_sections() {
        let record = ProgressRecord::from_persisted(
            Some("Ada".into()),
            [(SectionId::Classes, true)],
            Some(SectionId::Classes),
            [(0, true)],
        );
        assert_eq!(record.visited_sections().len(), SectionId::COUNT);
        assert!(record.is_visited(SectionId::Classes));
        assert!(!record.is_visited(SectionId::Quest));
        assert_eq!(record.visitor_label(), Some("Ada"));
        assert!(record.is_challenge_complete(ChallengeIndex::new(0)));
    }

    #[test]
    fn complete_challenge_is_idempotent() {
        let mut record = ProgressRecord::new();
        assert!(record.complete_challenge(ChallengeIndex::new(2)));
        assert!(!record.complete_challenge(ChallengeIndex::new(2)));
        assert_eq!(record.challenge_completion().len(), 1);
    }

    #[test]
    fn complete_challenge_flips_persisted_false_entry() {
        let mut record =
            ProgressRecord::from_persisted(None, [], None, [(1, false)]);
        assert!(record.complete_challenge(ChallengeIndex::new(1)));
        assert!(record.is_challenge_complete(ChallengeIndex::new(1)));
    }

    #[test]
    fn visitor_label_is_trimmed_and_blank_clears() {
        let mut record = ProgressRecord::new();
        assert!(record.set_visitor_label(Some("  Explorer  ".into())));
        assert_eq!(record.visitor_label(), Some("Explorer"));
        assert!(!record.set_visitor_label(Some("Explorer".into())));
        assert!(record.set_visitor_label(Some("   ".into())));
        assert_eq!(record.visitor_label(), None);
    }
}
