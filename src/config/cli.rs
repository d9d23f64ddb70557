pub use crate::app::validate::OutputFormat;
use crate::utils::logger::LogFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "skillkit")]
#[command(about = "Maintenance tooling for a Markdown skill-document corpus")]
#[command(version)]
pub struct Cli {
    /// Path to skillkit.toml (defaults to <root>/skillkit.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Corpus root directory
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,

    /// Log per-phase CPU/memory usage
    #[arg(long, global = true)]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Scan skill files and emit a JSON manifest
    Scan {
        /// Write the manifest here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Check skill files for required sections, code examples and checklists
    Validate {
        /// Only check required sections
        #[arg(long)]
        sections_only: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Syntax-check fenced code blocks
    CheckCode {
        /// Restrict to these fence languages (repeatable)
        #[arg(short, long)]
        language: Vec<String>,
    },
    /// Extract code examples of one language into a scaffolded project
    Extract(ExtractArgs),
    /// Generate the HTML validation report
    Report {
        #[arg(short, long, default_value = "validation-report.html")]
        output: String,
    },
    /// Regenerate the skill index section of README.md
    Readme {
        /// Use a previously written manifest instead of scanning
        #[arg(short, long)]
        manifest: Option<String>,
    },
    /// Print repository statistics as Markdown
    Stats {
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Generate CHANGELOG.md from git history
    Changelog {
        #[arg(short, long, default_value = "CHANGELOG.md")]
        output: String,

        /// Number of most recent tags to include
        #[arg(long, default_value = "5")]
        max_tags: usize,

        /// Print to stdout without writing the file
        #[arg(long)]
        no_write: bool,
    },
    /// Announce the current release on configured webhooks
    Notify {
        /// Show the release info and payloads without sending
        #[arg(long)]
        dry_run: bool,
    },
    /// Recommend skills for a project type
    #[command(subcommand)]
    Select(SelectCommand),
}

#[derive(Debug, Clone, Args)]
pub struct ExtractArgs {
    #[arg(short, long)]
    pub language: String,

    #[arg(short, long, default_value = "extracted-examples")]
    pub output: String,
}

#[derive(Debug, Clone, Subcommand)]
pub enum SelectCommand {
    /// List project profiles
    List,
    /// Show recommended skills for a profile (key or name)
    Show {
        profile: String,

        /// Save the skill list to skills_<name>.txt
        #[arg(long)]
        save: bool,

        /// Write a ready-to-paste prompt to claude_prompt.txt
        #[arg(long)]
        prompt: bool,

        #[arg(long, default_value = ".")]
        output_dir: String,
    },
    /// List skill categories
    Categories,
    /// Search categories and skills by keyword
    Search { keyword: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["skillkit", "validate", "--sections-only", "-v", "--root", "skills"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.root, Some(PathBuf::from("skills")));
        match cli.command {
            Command::Validate { sections_only, format } => {
                assert!(sections_only);
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_select_show() {
        let cli = Cli::try_parse_from(["skillkit", "select", "show", "2", "--save"]).unwrap();
        match cli.command {
            Command::Select(SelectCommand::Show { profile, save, prompt, .. }) => {
                assert_eq!(profile, "2");
                assert!(save);
                assert!(!prompt);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
