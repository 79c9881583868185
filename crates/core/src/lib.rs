#![forbid(unsafe_code)]

pub mod condition;
pub mod config;
pub mod error;
pub mod gate;
pub mod model;
pub mod resolver;
pub mod time;

pub use config::{GuideConfig, GuideConfigDraft};
pub use error::Error;
pub use gate::CompletionGate;
pub use resolver::{ActiveSectionResolver, SectionCandidate, SectionLayout};
pub use time::Clock;
