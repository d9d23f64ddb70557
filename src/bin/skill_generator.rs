use anyhow::Context;
use chrono::Local;
use clap::Parser;
use skillkit::app::generator::{self, Generator, Mode, SkillPriority};
use skillkit::domain::ports::{ConfigProvider, Storage};
use skillkit::utils::{logger, validation::Validate};
use skillkit::{AnthropicClient, LocalStorage, SkillkitConfig, SkillkitError};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "skill-generator")]
#[command(about = "Draft skill documents in batches from a prompt file")]
struct Args {
    /// One batch ("03") or an inclusive range ("01-05")
    #[arg(short, long, conflicts_with_all = ["priority", "retry"])]
    batch: Option<String>,

    /// Only prompts of this priority
    #[arg(short, long, value_enum, conflicts_with = "retry")]
    priority: Option<SkillPriority>,

    /// Retry previously failed skills
    #[arg(long)]
    retry: bool,

    /// Seconds between requests (overrides generator.delay_seconds)
    #[arg(short, long)]
    delay: Option<u64>,

    /// Write the HTML generation report after the run
    #[arg(long)]
    report: bool,

    /// Directory prompts, state and generated skills are resolved against
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Path to skillkit.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn mode(&self) -> Mode {
        if self.retry {
            Mode::RetryFailed
        } else if let Some(priority) = self.priority {
            Mode::Priority(priority)
        } else if let Some(batch) = &self.batch {
            Mode::from_batch_arg(batch)
        } else {
            Mode::All
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let config = SkillkitConfig::load(args.config.as_deref(), args.base_dir.as_deref())
        .context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    let api_key = config.api_key().ok_or_else(|| SkillkitError::MissingConfigError {
        field: "generator.api_key (or ANTHROPIC_API_KEY)".to_string(),
    })?;

    let settings = &config.generator;
    let storage = LocalStorage::new(config.corpus_root());
    let prompts = generator::load_prompts(&storage, &settings.prompts_file).await?;
    tracing::info!("📚 Loaded {} prompts from {}", prompts.len(), settings.prompts_file);

    let client = AnthropicClient::new(settings, api_key)?;
    let delay = Duration::from_secs(args.delay.unwrap_or(settings.delay_seconds));
    let mut generator =
        Generator::new(storage.clone(), client, settings.state_file.clone(), delay).await?;

    let summary = generator.run(&prompts, &args.mode()).await?;
    println!("{}", generator::render_summary(&summary, generator.state()));

    if args.report {
        let html = generator::render_report(generator.state(), Local::now());
        storage
            .write_file(&settings.report_file, html.as_bytes())
            .await?;
        println!("📊 Report saved to: {}", storage.display_path(&settings.report_file));
    }

    if summary.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
