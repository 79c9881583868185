use std::sync::Arc;

use guide_core::model::{
    ChallengeIndex, CompletionStatus, ProgressRecord, ProgressSnapshot, Quest, Reward, SectionId,
    parse_section,
};
use guide_core::{ActiveSectionResolver, CompletionGate, GuideConfig, SectionLayout};

use crate::error::GuideError;
use crate::notify::{Notification, PresentationAdapter};
use crate::progress_service::ProgressService;

/// Owner of the visitor's progress for one running guide.
///
/// Every transition follows the same order: mutate the record, write it
/// through to the store, then notify the presentation layer. Operations
/// that change nothing neither write nor notify, except `mark_complete`,
/// which writes on every accepted call.
pub struct GuideSession {
    record: ProgressRecord,
    progress: ProgressService,
    resolver: ActiveSectionResolver,
    gate: CompletionGate,
    quest: Quest,
    layout: SectionLayout,
    status: CompletionStatus,
    adapter: Arc<dyn PresentationAdapter>,
}

impl GuideSession {
    /// Load the stored record and start a session over it.
    pub async fn start(
        config: &GuideConfig,
        progress: ProgressService,
        adapter: Arc<dyn PresentationAdapter>,
    ) -> Self {
        let record = progress.load().await;
        Self::from_record(config, record, progress, adapter)
    }

    #[must_use]
    pub fn from_record(
        config: &GuideConfig,
        record: ProgressRecord,
        progress: ProgressService,
        adapter: Arc<dyn PresentationAdapter>,
    ) -> Self {
        let quest = config.quest().clone();
        let gate = CompletionGate::for_quest(&quest);
        let status = gate.status(&record);
        tracing::debug!(
            active = ?record.active_section(),
            visited = record.visited_count(),
            completed = status.completed_count,
            quota = status.quota,
            "guide session started"
        );
        Self {
            record,
            progress,
            resolver: config.resolver(),
            gate,
            quest,
            layout: SectionLayout::default(),
            status,
            adapter,
        }
    }

    #[must_use]
    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            record: self.record.clone(),
            completion: self.status,
        }
    }

    #[must_use]
    pub fn completion_status(&self) -> CompletionStatus {
        self.status
    }

    #[must_use]
    pub fn quest(&self) -> &Quest {
        &self.quest
    }

    #[must_use]
    pub fn layout(&self) -> &SectionLayout {
        &self.layout
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressService {
        &self.progress
    }

    /// Replace the section positions used to resolve scroll events.
    pub fn set_layout(&mut self, layout: SectionLayout) {
        tracing::debug!(sections = layout.candidates().len(), "layout changed");
        self.layout = layout;
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Handle a scroll event.
    ///
    /// Returns the section resolved for `position`, whether or not it was
    /// already active.
    pub async fn on_scroll(&mut self, position: f64) -> Option<SectionId> {
        let resolved = self.resolver.resolve(&self.layout, position)?;
        self.jump_to(resolved).await;
        Some(resolved)
    }

    /// Handle a navigation link naming a section.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::InvalidInput` if `raw` names no section.
    pub async fn on_section_link_activated(&mut self, raw: &str) -> Result<SectionId, GuideError> {
        let section = parse_section(raw)?;
        self.jump_to(section).await;
        Ok(section)
    }

    /// Make `section` active.
    ///
    /// Returns `false` when it already was.
    pub async fn jump_to(&mut self, section: SectionId) -> bool {
        if !self.record.activate(section) {
            return false;
        }
        tracing::debug!(%section, visited = self.record.visited_count(), "active section changed");
        self.progress.save(&self.record).await;
        self.adapter.notify(Notification::ActiveSectionChanged(section));
        true
    }

    //
    // ─── CHALLENGES ────────────────────────────────────────────────────────────
    //

    /// Handle a challenge checkbox.
    ///
    /// Unchecking never clears a completed challenge; the index is still
    /// validated and the current status returned.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::InvalidInput` if `raw_index` is negative or out of range.
    pub async fn on_challenge_toggled(
        &mut self,
        raw_index: i64,
        checked: bool,
    ) -> Result<CompletionStatus, GuideError> {
        let index = ChallengeIndex::from_raw(raw_index)?;
        if !checked {
            tracing::debug!(%index, "ignoring unchecked challenge");
            return Ok(self.status);
        }
        Ok(self.mark_complete(index).await)
    }

    /// Record a challenge as complete and return the resulting status.
    pub async fn mark_complete(&mut self, index: ChallengeIndex) -> CompletionStatus {
        if !self.gate.counts_toward_quota(index) {
            tracing::debug!(%index, quota = self.gate.quota(), "challenge outside the quest");
        }
        let status = self.gate.mark_complete(&mut self.record, index);
        self.progress.save(&self.record).await;

        if status != self.status {
            self.status = status;
            tracing::debug!(
                completed = status.completed_count,
                quota = status.quota,
                unlocked = status.unlocked,
                "completion status changed"
            );
            if status.unlocked {
                tracing::info!(quest = %self.quest.title(), "quest reward unlocked");
            }
            self.adapter.notify(Notification::CompletionStatusChanged(status));
        }
        status
    }

    //
    // ─── VISITOR ───────────────────────────────────────────────────────────────
    //

    /// Set or clear the visitor label. Returns whether it changed.
    pub async fn set_visitor_label(&mut self, label: Option<String>) -> bool {
        if !self.record.set_visitor_label(label) {
            return false;
        }
        self.progress.save(&self.record).await;
        true
    }

    /// Hand out the quest reward.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::RewardLocked` until every quest challenge is complete.
    pub fn claim_reward(&self) -> Result<Reward, GuideError> {
        if !self.status.unlocked {
            return Err(GuideError::RewardLocked(self.status));
        }
        Ok(Reward {
            quest_title: self.quest.title().to_owned(),
            reward: self.quest.reward().to_owned(),
            visitor_label: self.record.visitor_label().map(str::to_owned),
        })
    }

    #[must_use]
    pub fn into_record(self) -> ProgressRecord {
        self.record
    }
}
