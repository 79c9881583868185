//! Single-consumer command queue in front of a `GuideSession`.
//!
//! Presentation events arrive from any number of `GuideHandle` clones and are
//! applied one at a time by the task that owns the session, each to
//! completion (mutate, persist, notify) before the next is taken.

use guide_core::SectionLayout;
use guide_core::model::{CompletionStatus, ProgressSnapshot, Reward, SectionId};
use guide_core::resolver::SectionCandidate;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::GuideError;
use crate::session::GuideSession;

/// Default queue depth for `spawn`.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug)]
enum Command {
    LayoutChanged {
        candidates: Vec<SectionCandidate>,
        reply: oneshot::Sender<()>,
    },
    Scroll {
        position: f64,
        reply: oneshot::Sender<Option<SectionId>>,
    },
    SectionLinkActivated {
        section: String,
        reply: oneshot::Sender<Result<SectionId, GuideError>>,
    },
    ChallengeToggled {
        index: i64,
        checked: bool,
        reply: oneshot::Sender<Result<CompletionStatus, GuideError>>,
    },
    SetVisitorLabel {
        label: Option<String>,
        reply: oneshot::Sender<bool>,
    },
    ClaimReward {
        reply: oneshot::Sender<Result<Reward, GuideError>>,
    },
    Snapshot {
        reply: oneshot::Sender<ProgressSnapshot>,
    },
}

/// Cloneable sender side of the queue.
#[derive(Debug, Clone)]
pub struct GuideHandle {
    tx: mpsc::Sender<Command>,
}

impl GuideHandle {
    /// Report new section positions.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::SessionClosed` if the loop has stopped.
    pub async fn set_layout(&self, candidates: Vec<SectionCandidate>) -> Result<(), GuideError> {
        self.request(|reply| Command::LayoutChanged { candidates, reply }).await
    }

    /// Report a scroll position.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::SessionClosed` if the loop has stopped.
    pub async fn scroll(&self, position: f64) -> Result<Option<SectionId>, GuideError> {
        self.request(|reply| Command::Scroll { position, reply }).await
    }

    /// Report a navigation link click.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::InvalidInput` for an unknown section, or
    /// `GuideError::SessionClosed` if the loop has stopped.
    pub async fn activate_section(
        &self,
        section: impl Into<String>,
    ) -> Result<SectionId, GuideError> {
        let section = section.into();
        self.request(|reply| Command::SectionLinkActivated { section, reply }).await?
    }

    /// Report a challenge checkbox change.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::InvalidInput` for a bad index, or
    /// `GuideError::SessionClosed` if the loop has stopped.
    pub async fn toggle_challenge(
        &self,
        index: i64,
        checked: bool,
    ) -> Result<CompletionStatus, GuideError> {
        self.request(|reply| Command::ChallengeToggled {
            index,
            checked,
            reply,
        })
        .await?
    }

    /// # Errors
    ///
    /// Returns `GuideError::SessionClosed` if the loop has stopped.
    pub async fn set_visitor_label(&self, label: Option<String>) -> Result<bool, GuideError> {
        self.request(|reply| Command::SetVisitorLabel { label, reply }).await
    }

    /// # Errors
    ///
    /// Returns `GuideError::RewardLocked` while the quest is incomplete, or
    /// `GuideError::SessionClosed` if the loop has stopped.
    pub async fn claim_reward(&self) -> Result<Reward, GuideError> {
        self.request(|reply| Command::ClaimReward { reply }).await?
    }

    /// # Errors
    ///
    /// Returns `GuideError::SessionClosed` if the loop has stopped.
    pub async fn snapshot(&self) -> Result<ProgressSnapshot, GuideError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, GuideError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| GuideError::SessionClosed)?;
        rx.await.map_err(|_| GuideError::SessionClosed)
    }
}

/// Move `session` onto its own task and return a handle to it.
///
/// The task ends once every handle is dropped and yields the session back.
#[must_use]
pub fn spawn(session: GuideSession, capacity: usize) -> (GuideHandle, JoinHandle<GuideSession>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let task = tokio::spawn(run(session, rx));
    (GuideHandle { tx }, task)
}

async fn run(mut session: GuideSession, mut rx: mpsc::Receiver<Command>) -> GuideSession {
    tracing::debug!("guide event loop started");
    while let Some(command) = rx.recv().await {
        apply(&mut session, command).await;
    }
    tracing::debug!("guide event loop stopped");
    session
}

// A dropped reply receiver only means the caller stopped waiting.
async fn apply(session: &mut GuideSession, command: Command) {
    match command {
        Command::LayoutChanged { candidates, reply } => {
            session.set_layout(SectionLayout::new(candidates));
            let _ = reply.send(());
        }
        Command::Scroll { position, reply } => {
            let _ = reply.send(session.on_scroll(position).await);
        }
        Command::SectionLinkActivated { section, reply } => {
            let _ = reply.send(session.on_section_link_activated(&section).await);
        }
        Command::ChallengeToggled {
            index,
            checked,
            reply,
        } => {
            let _ = reply.send(session.on_challenge_toggled(index, checked).await);
        }
        Command::SetVisitorLabel { label, reply } => {
            let _ = reply.send(session.set_visitor_label(label).await);
        }
        Command::ClaimReward { reply } => {
            let _ = reply.send(session.claim_reward());
        }
        Command::Snapshot { reply } => {
            let _ = reply.send(session.snapshot());
        }
    }
}
