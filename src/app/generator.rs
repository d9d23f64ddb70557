use crate::domain::ports::{MessagesClient, Storage};
use crate::utils::error::{Result, SkillkitError};
use crate::utils::text::escape_html;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum SkillPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for SkillPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

#[derive(Debug, Deserialize)]
struct PromptFile {
    batches: Vec<PromptBatch>,
}

#[derive(Debug, Deserialize)]
struct PromptBatch {
    batch: String,
    category: String,
    skills: Vec<PromptEntry>,
}

#[derive(Debug, Deserialize)]
struct PromptEntry {
    name: String,
    path: String,
    prompt: String,
    #[serde(default)]
    priority: SkillPriority,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillPrompt {
    pub batch: String,
    pub category: String,
    pub name: String,
    /// Output path relative to the base directory.
    pub path: String,
    pub prompt: String,
    pub priority: SkillPriority,
}

pub fn parse_prompts(content: &str) -> Result<Vec<SkillPrompt>> {
    let file: PromptFile = serde_json::from_str(content)?;
    Ok(file
        .batches
        .into_iter()
        .flat_map(|batch| {
            let PromptBatch {
                batch: id,
                category,
                skills,
            } = batch;
            skills.into_iter().map(move |skill| SkillPrompt {
                batch: id.clone(),
                category: category.clone(),
                name: skill.name,
                path: skill.path,
                prompt: skill.prompt,
                priority: skill.priority,
            })
        })
        .collect())
}

pub async fn load_prompts<S: Storage>(storage: &S, path: &str) -> Result<Vec<SkillPrompt>> {
    if !storage.exists(path).await {
        return Err(SkillkitError::config(format!(
            "prompts file not found: {}",
            storage.display_path(path)
        )));
    }
    let bytes = storage.read_file(path).await?;
    let content = String::from_utf8(bytes)
        .map_err(|_| SkillkitError::config(format!("{} is not valid UTF-8", path)))?;
    parse_prompts(&content)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationState {
    #[serde(default)]
    pub generated: Vec<String>,
    #[serde(default)]
    pub failed: Vec<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl GenerationState {
    fn mark_generated(&mut self, path: &str) {
        self.failed.retain(|p| p != path);
        if !self.generated.iter().any(|p| p == path) {
            self.generated.push(path.to_string());
        }
    }

    fn mark_failed(&mut self, path: &str) {
        if !self.failed.iter().any(|p| p == path) {
            self.failed.push(path.to_string());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    All,
    /// Inclusive, compared lexicographically.
    Range {
        start: Option<String>,
        end: Option<String>,
    },
    Batch(String),
    Priority(SkillPriority),
    RetryFailed,
}

impl Mode {
    /// `"03"` selects one batch, `"01-05"` a range.
    pub fn from_batch_arg(arg: &str) -> Self {
        match arg.split_once('-') {
            Some((start, end)) => Self::Range {
                start: Some(start.trim().to_string()).filter(|s| !s.is_empty()),
                end: Some(end.trim().to_string()).filter(|s| !s.is_empty()),
            },
            None => Self::Batch(arg.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub selected: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// `3725s` → `"1h 2m 5s"`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

pub struct Generator<S: Storage, M: MessagesClient> {
    storage: S,
    client: M,
    state_path: String,
    delay: Duration,
    state: GenerationState,
}

impl<S: Storage, M: MessagesClient> Generator<S, M> {
    /// Loads previous progress from `state_path` when present.
    pub async fn new(storage: S, client: M, state_path: impl Into<String>, delay: Duration) -> Result<Self> {
        let state_path = state_path.into();
        let state = if storage.exists(&state_path).await {
            let bytes = storage.read_file(&state_path).await?;
            let state: GenerationState = serde_json::from_slice(&bytes)?;
            tracing::info!(
                "📂 Loaded state: {} generated, {} failed",
                state.generated.len(),
                state.failed.len()
            );
            state
        } else {
            GenerationState::default()
        };

        Ok(Self {
            storage,
            client,
            state_path,
            delay,
            state,
        })
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    async fn save_state(&mut self) -> Result<()> {
        self.state.last_updated = Some(Local::now().to_rfc3339());
        let json = serde_json::to_string_pretty(&self.state)?;
        self.storage.write_file(&self.state_path, json.as_bytes()).await
    }

    fn select(&self, prompts: &[SkillPrompt], mode: &Mode) -> Vec<SkillPrompt> {
        let mut selected: Vec<SkillPrompt> = match mode {
            Mode::All => prompts.to_vec(),
            Mode::Range { start, end } => prompts
                .iter()
                .filter(|p| start.as_ref().map_or(true, |s| p.batch.as_str() >= s.as_str()))
                .filter(|p| end.as_ref().map_or(true, |e| p.batch.as_str() <= e.as_str()))
                .cloned()
                .collect(),
            Mode::Batch(batch) => prompts.iter().filter(|p| &p.batch == batch).cloned().collect(),
            Mode::Priority(priority) => prompts
                .iter()
                .filter(|p| p.priority == *priority)
                .cloned()
                .collect(),
            Mode::RetryFailed => prompts
                .iter()
                .filter(|p| self.state.failed.contains(&p.path))
                .cloned()
                .collect(),
        };

        // batches run in order, prompts within a batch keep file order
        if matches!(mode, Mode::All | Mode::Range { .. }) {
            selected.sort_by(|a, b| a.batch.cmp(&b.batch));
        }
        selected
    }

    async fn generate_one(&mut self, skill: &SkillPrompt) -> Result<()> {
        let content = self
            .client
            .complete(&skill.prompt)
            .await
            .map_err(|e| SkillkitError::GenerationError {
                skill: skill.name.clone(),
                message: e.to_string(),
            })?;
        self.storage.write_file(&skill.path, content.as_bytes()).await
    }

    pub async fn run(&mut self, prompts: &[SkillPrompt], mode: &Mode) -> Result<GenerationSummary> {
        let started = Instant::now();
        let selected = self.select(prompts, mode);
        let retrying = *mode == Mode::RetryFailed;

        if retrying {
            if self.state.failed.is_empty() {
                tracing::info!("No failed skills to retry.");
                return Ok(GenerationSummary::default());
            }
            self.state.failed.clear();
            self.save_state().await?;
        }
        if selected.is_empty() {
            tracing::warn!("⚠️ No prompts matched {:?}", mode);
        } else {
            tracing::info!("🚀 Generating {} skills ({:?})", selected.len(), mode);
        }

        let mut summary = GenerationSummary {
            selected: selected.len(),
            ..GenerationSummary::default()
        };
        let total = selected.len();

        for (i, skill) in selected.iter().enumerate() {
            let position = i + 1;
            if !retrying && self.state.generated.contains(&skill.path) {
                tracing::info!("[{}/{}] Skipping (already generated): {}", position, total, skill.name);
                summary.skipped += 1;
                summary.succeeded += 1;
                continue;
            }

            tracing::info!("[{}/{}] Processing: {} (batch {})", position, total, skill.name, skill.batch);
            match self.generate_one(skill).await {
                Ok(()) => {
                    tracing::info!("✅ Generated {}", skill.path);
                    self.state.mark_generated(&skill.path);
                    summary.succeeded += 1;
                }
                Err(e) => {
                    tracing::error!("❌ Failed {}: {}", skill.name, e);
                    self.state.mark_failed(&skill.path);
                    summary.failed += 1;
                }
            }
            self.save_state().await?;

            if position < total && !self.delay.is_zero() {
                tracing::debug!("Waiting {:?} before next skill", self.delay);
                tokio::time::sleep(self.delay).await;
            }
        }

        summary.elapsed = started.elapsed();
        Ok(summary)
    }
}

pub fn render_summary(summary: &GenerationSummary, state: &GenerationState) -> String {
    let mut out = format!(
        "Generation Complete!\n\nSelected: {}\nSucceeded: {} ({} already generated)\nFailed: {}\n\nTotal generated: {}\nTotal failed: {}\nTime elapsed: {}\n",
        summary.selected,
        summary.succeeded,
        summary.skipped,
        summary.failed,
        state.generated.len(),
        state.failed.len(),
        format_elapsed(summary.elapsed)
    );
    if !state.failed.is_empty() {
        out.push_str("\nFailed skills:\n");
        for path in &state.failed {
            out.push_str(&format!("  • {}\n", path));
        }
        out.push_str("\nRun with --retry to retry failed skills.\n");
    }
    out
}

fn rows(paths: &[String]) -> String {
    paths
        .iter()
        .enumerate()
        .map(|(i, p)| format!("        <tr><td>{}</td><td>{}</td></tr>\n", i + 1, escape_html(p)))
        .collect()
}

pub fn render_report(state: &GenerationState, generated_at: DateTime<Local>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Skill Generation Report</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 40px; }}
        .success {{ color: green; }}
        .failed {{ color: red; }}
        table {{ border-collapse: collapse; width: 100%; margin-top: 20px; }}
        th, td {{ border: 1px solid #ddd; padding: 8px; text-align: left; }}
        th {{ background-color: #4CAF50; color: white; }}
    </style>
</head>
<body>
    <h1>Skill Generation Report</h1>
    <p>Generated: {}</p>

    <h2>Summary</h2>
    <p class="success">✓ Successfully generated: {}</p>
    <p class="failed">✗ Failed: {}</p>

    <h2>Generated Skills</h2>
    <table>
        <tr><th>#</th><th>Skill Path</th></tr>
{}    </table>

    <h2>Failed Skills</h2>
    <table>
        <tr><th>#</th><th>Skill Path</th></tr>
{}    </table>
</body>
</html>
"#,
        generated_at.format("%Y-%m-%d %H:%M:%S"),
        state.generated.len(),
        state.failed.len(),
        rows(&state.generated),
        rows(&state.failed)
    )
}
