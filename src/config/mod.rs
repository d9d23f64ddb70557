#[cfg(feature = "cli")]
pub mod cli;
pub mod profiles;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::Cli;
pub use profiles::ProjectProfile;
pub use toml_config::SkillkitConfig;
