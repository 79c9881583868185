use thiserror::Error;

use crate::condition::ConditionError;
use crate::config::ConfigError;
use crate::model::{InputError, QuestError};

/// Any error produced by the core crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Quest(#[from] QuestError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Condition(#[from] ConditionError),
}
