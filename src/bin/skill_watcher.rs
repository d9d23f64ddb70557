use anyhow::Context;
use clap::Parser;
use skillkit::app::gaps::GapWatcher;
use skillkit::domain::ports::ConfigProvider;
use skillkit::utils::{logger, validation::Validate};
use skillkit::{LocalStorage, SkillkitConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "skill-watcher")]
#[command(about = "Report project dependencies that have no matching skill")]
struct Args {
    /// Project directory to analyze
    #[arg(default_value = ".")]
    target: PathBuf,

    /// Keep running and re-analyze when dependency files change
    #[arg(short, long)]
    watch: bool,

    /// Skill index to check against (defaults to <root>/SKILL_INDEX.md)
    #[arg(short, long)]
    index: Option<PathBuf>,

    /// Path to skillkit.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Corpus root directory
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let config = SkillkitConfig::load(args.config.as_deref(), args.root.as_deref())
        .context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    let index = args
        .index
        .unwrap_or_else(|| config.corpus_root().join(&config.gaps.index_path));
    tracing::debug!("Using skill index {}", index.display());

    let watcher = GapWatcher::new(
        LocalStorage::new(&args.target),
        &args.target,
        index,
        config.gaps.report_name.clone(),
        config.gap_mapping(),
        config.gaps.noise.clone(),
        Duration::from_secs(config.gaps.poll_interval_seconds),
    );

    if args.watch {
        watcher.watch().await?;
    } else {
        let analysis = watcher.run_once().await?;
        println!(
            "Found {} gaps and {} covered libraries in {}",
            analysis.gaps.len(),
            analysis.covered.len(),
            args.target.display()
        );
    }
    Ok(())
}
