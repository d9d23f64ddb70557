pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{AnthropicClient, GitHistory, LocalStorage, WebhookClient};
#[cfg(feature = "cli")]
pub use config::Cli;
pub use config::SkillkitConfig;
pub use core::engine::Engine;
pub use utils::error::{Result, SkillkitError};
