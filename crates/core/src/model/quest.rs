use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestError {
    #[error("quest title cannot be empty")]
    EmptyTitle,

    #[error("quest must have at least one challenge")]
    NoChallenges,

    #[error("challenge {0} has an empty description")]
    EmptyChallenge(usize),

    #[error("too many challenges: {0}")]
    TooManyChallenges(usize),
}

//
// ─── QUEST ─────────────────────────────────────────────────────────────────────
//

/// The terminal guided quest: a fixed list of challenges unlocking a reward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quest {
    title: String,
    objective: String,
    challenges: Vec<String>,
    reward: String,
}

impl Quest {
    /// Build a quest definition.
    ///
    /// # Errors
    ///
    /// Returns `QuestError` if the title is blank, there are no challenges,
    /// or a challenge description is blank.
    pub fn new(
        title: impl Into<String>,
        objective: impl Into<String>,
        challenges: Vec<String>,
        reward: impl Into<String>,
    ) -> Result<Self, QuestError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(QuestError::EmptyTitle);
        }
        if challenges.is_empty() {
            return Err(QuestError::NoChallenges);
        }
        if u32::try_from(challenges.len()).is_err() {
            return Err(QuestError::TooManyChallenges(challenges.len()));
        }
        if let Some(idx) = challenges.iter().position(|c| c.trim().is_empty()) {
            return Err(QuestError::EmptyChallenge(idx));
        }

        Ok(Self {
            title,
            objective: objective.into(),
            challenges,
            reward: reward.into(),
        })
    }

    /// The Lost Temple quest that closes the guide.
    #[must_use]
    pub fn lost_temple() -> Self {
        Self {
            title: "The Lost Temple of Code".to_string(),
            objective: "Find and activate the ancient Java temple".to_string(),
            challenges: vec![
                "Navigate through the Class Forest".to_string(),
                "Solve the Object Puzzle Chambers".to_string(),
                "Defeat the Exception Guardian".to_string(),
                "Unlock the Inheritance Gates".to_string(),
            ],
            reward: "Mastery of Java Programming".to_string(),
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn objective(&self) -> &str {
        &self.objective
    }

    #[must_use]
    pub fn challenges(&self) -> &[String] {
        &self.challenges
    }

    #[must_use]
    pub fn reward(&self) -> &str {
        &self.reward
    }

    /// Number of challenges that must be completed to unlock the reward.
    #[must_use]
    pub fn quota(&self) -> u32 {
        // `new` rejects challenge lists that do not fit in u32.
        u32::try_from(self.challenges.len()).unwrap_or(u32::MAX)
    }
}

impl Default for Quest {
    fn default() -> Self {
        Self::lost_temple()
    }
}

//
// ─── COMPLETION ────────────────────────────────────────────────────────────────
//

/// Gate output: how many quest challenges are done and whether the reward is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionStatus {
    pub completed_count: u32,
    pub quota: u32,
    pub unlocked: bool,
}

impl CompletionStatus {
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.quota.saturating_sub(self.completed_count)
    }
}

/// Reward handed out once the quest is unlocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reward {
    pub quest_title: String,
    pub reward: String,
    pub visitor_label: Option<String>,
}
