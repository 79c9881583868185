mod input;
mod progress;
mod quest;
mod section;

pub use input::{ChallengeIndex, InputError, parse_section};
pub use progress::{ProgressRecord, ProgressSnapshot};
pub use quest::{CompletionStatus, Quest, QuestError, Reward};
pub use section::{ParseSectionError, SectionId};
