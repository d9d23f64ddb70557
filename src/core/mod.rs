pub mod corpus;
pub mod engine;
pub mod markdown;

pub use crate::domain::model::{Artifact, Corpus, RunSummary, SkillDocument};
pub use crate::domain::ports::{ConfigProvider, MessagesClient, Pipeline, Storage};
pub use crate::utils::error::Result;
