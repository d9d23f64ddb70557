use clap::Parser;
use skillkit::app::code_check::CodeChecker;
use skillkit::app::manifest::Manifest;
use skillkit::app::notify::{self, Notifier, ReleaseInfo};
use skillkit::app::{changelog, selector};
use skillkit::app::{
    CodeCheckPipeline, ExtractPipeline, ReadmePipeline, ReportPipeline, ScanPipeline,
    StatsPipeline, ValidatePipeline,
};
use skillkit::config::cli::{Command, ExtractArgs, SelectCommand};
use skillkit::core::corpus;
use skillkit::domain::model::{RunSummary, SkillDocument};
use skillkit::domain::ports::{ConfigProvider, Pipeline, Storage};
use skillkit::utils::{logger, validation::Validate};
use skillkit::{Cli, Engine, GitHistory, LocalStorage, Result, SkillkitConfig, WebhookClient};
use std::path::Path;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logger::init(cli.log_format, cli.verbose);
    tracing::debug!("CLI args: {:?}", cli);

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(
                "❌ {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}

async fn run_pipeline<P: Pipeline>(pipeline: P, monitor: bool) -> Result<RunSummary> {
    let engine = Engine::new_with_monitoring(pipeline, monitor);
    let summary = engine.run().await?;
    tracing::info!("✅ {}", summary.message);
    for path in &summary.written {
        tracing::info!("📁 Wrote {}", path);
    }
    Ok(summary)
}

/// Selector and search still work outside a corpus, just without availability.
async fn documents_or_empty(config: &SkillkitConfig) -> Vec<SkillDocument> {
    match corpus::load(config).await {
        Ok(corpus) => corpus.documents,
        Err(e) => {
            tracing::debug!("Corpus unavailable: {}", e);
            Vec::new()
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let config = SkillkitConfig::load(cli.config.as_deref(), cli.root.as_deref())?;
    config.validate()?;

    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    // generated artifacts land relative to the working directory,
    // repository files (README, CHANGELOG) relative to the corpus root
    let workdir = LocalStorage::new(".");
    let repo = LocalStorage::new(config.corpus_root());

    match cli.command {
        Command::Scan { output } => {
            let summary =
                run_pipeline(ScanPipeline::new(workdir, config, output), cli.monitor).await?;
            for finding in &summary.findings {
                tracing::warn!("⚠️ {}: {}", finding.path, finding.message);
            }
            Ok(0)
        }
        Command::Validate {
            sections_only,
            format,
        } => {
            let pipeline = ValidatePipeline::new(workdir, config, sections_only, format);
            let summary = run_pipeline(pipeline, cli.monitor).await?;
            Ok(if summary.is_clean() { 0 } else { 1 })
        }
        Command::CheckCode { language } => {
            let checker = CodeChecker::new(&config.code_check);
            let pipeline = CodeCheckPipeline::new(workdir, config, checker, &language);
            let summary = run_pipeline(pipeline, cli.monitor).await?;
            Ok(if summary.is_clean() { 0 } else { 1 })
        }
        Command::Extract(ExtractArgs { language, output }) => {
            let aliases = config.language_aliases();
            let pipeline = ExtractPipeline::new(workdir, config, &language, &aliases, output);
            run_pipeline(pipeline, cli.monitor).await?;
            Ok(0)
        }
        Command::Report { output } => {
            run_pipeline(ReportPipeline::new(workdir, config, output), cli.monitor).await?;
            Ok(0)
        }
        Command::Readme { manifest } => {
            let manifest = match manifest.as_deref().map(Path::new) {
                Some(path) => {
                    if tokio::fs::try_exists(path).await? {
                        Some(Manifest::load(path).await?)
                    } else {
                        tracing::warn!("⚠️ {} not found, scanning the corpus instead", path.display());
                        None
                    }
                }
                None => None,
            };
            let readme = config.readme.clone();
            run_pipeline(ReadmePipeline::new(repo, config, readme, manifest), cli.monitor).await?;
            Ok(0)
        }
        Command::Stats { output } => {
            let title = config.stats.title.clone();
            run_pipeline(StatsPipeline::new(workdir, config, title, output), cli.monitor).await?;
            Ok(0)
        }
        Command::Changelog {
            output,
            max_tags,
            no_write,
        } => {
            let history = GitHistory::new(config.corpus_root());
            let releases = changelog::collect_releases(&history, max_tags).await?;
            let markdown = changelog::render(&releases);
            println!("{}", markdown);
            if !no_write {
                repo.write_file(&output, markdown.as_bytes()).await?;
                tracing::info!("✅ Wrote {} ({} releases)", repo.display_path(&output), releases.len());
            }
            Ok(0)
        }
        Command::Notify { dry_run } => {
            let skill_count = corpus::count(&config)?;
            let history = GitHistory::new(config.corpus_root());
            let info = ReleaseInfo::gather(&history, skill_count, &config.notify.repository).await;
            tracing::info!("📦 Release {} with {} skills", info.tag, info.skill_count);

            if dry_run {
                let preview = serde_json::json!({
                    "release": info,
                    "discord": notify::discord_payload(&info),
                    "slack": notify::slack_payload(&info),
                });
                println!("{}", serde_json::to_string_pretty(&preview)?);
                return Ok(0);
            }

            let client = WebhookClient::new(config.notify.timeout_seconds, config.notify.retry.clone())?;
            let notifier = Notifier::new(client, config.discord_webhook(), config.slack_webhook());
            let report = notifier.notify(&info).await;
            Ok(if report.all_failed() { 2 } else { 0 })
        }
        Command::Select(select) => run_select(select, &config).await,
    }
}

async fn run_select(command: SelectCommand, config: &SkillkitConfig) -> Result<i32> {
    match command {
        SelectCommand::List => println!("{}", selector::render_profiles(&config.projects())),
        SelectCommand::Show {
            profile,
            save,
            prompt,
            output_dir,
        } => {
            let profiles = config.projects();
            let profile = selector::find_profile(&profiles, &profile)?;
            let documents = documents_or_empty(config).await;
            let available = selector::available_skills(&documents);
            let available = (!documents.is_empty()).then_some(&available);
            println!("{}", selector::render_recommendations(profile, available));

            let storage = LocalStorage::new(output_dir);
            if save {
                let name = selector::skill_list_file_name(profile);
                storage
                    .write_file(&name, selector::render_skill_list(profile).as_bytes())
                    .await?;
                println!("✅ Skill list saved to: {}", storage.display_path(&name));
            }
            if prompt {
                storage
                    .write_file(selector::PROMPT_FILE, selector::render_prompt(profile).as_bytes())
                    .await?;
                println!(
                    "✅ Prompt saved to: {}",
                    storage.display_path(selector::PROMPT_FILE)
                );
            }
        }
        SelectCommand::Categories => {
            println!("{}", selector::render_categories(&config.categories()))
        }
        SelectCommand::Search { keyword } => {
            let documents = documents_or_empty(config).await;
            let results = selector::search(&keyword, &config.categories(), &documents);
            println!("{}", results.render(&keyword));
        }
    }
    Ok(0)
}
