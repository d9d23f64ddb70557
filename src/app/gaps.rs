//! Dependency gap analysis: which libraries a project depends on that the
//! skill index does not cover yet.

use crate::domain::ports::Storage;
use crate::utils::error::{Result, SkillkitError};
use chrono::{DateTime, Local};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

pub const DEPENDENCY_FILES: [&str; 4] = [
    "package.json",
    "requirements.txt",
    "pyproject.toml",
    "Cargo.toml",
];

const LIB_MAPPING: &[(&str, &str)] = &[
    ("react", "react-best-practices"),
    ("next", "nextjs-patterns"),
    ("express", "express-rest"),
    ("fastapi", "fastapi-patterns"),
    ("prisma", "prisma-guide"),
    ("mongoose", "mongodb-patterns"),
    ("sequelize", "database-migration"),
    ("redux", "state-management"),
    ("zustand", "state-management"),
    ("tailwindcss", "tailwind-patterns"),
    ("jest", "jest-patterns"),
    ("pytest", "pytest-patterns"),
    ("docker", "docker-patterns"),
    ("kubernetes", "kubernetes-deployment"),
    ("terraform", "terraform-infrastructure"),
    ("stripe", "stripe-integration"),
    ("firebase", "firebase-integration"),
    ("socket.io", "websocket-patterns"),
    ("kafka", "kafka-streams"),
    ("rabbitmq", "rabbitmq-patterns"),
    ("pydantic", "python-standards"),
    ("pandas", "data-preprocessing"),
    ("numpy", "data-preprocessing"),
    ("pytorch", "pytorch-deployment"),
    ("tensorflow", "model-training"),
    ("openai", "llm-integration"),
    ("langchain", "ai-agents"),
];

/// Library → skill name table used when `[gaps.mapping]` is not configured.
pub fn builtin_mapping() -> BTreeMap<String, String> {
    LIB_MAPPING
        .iter()
        .map(|(lib, skill)| (lib.to_string(), skill.to_string()))
        .collect()
}

fn skill_link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[([\w-]+)\]\(").expect("skill link pattern is valid"))
}

/// Leading distribution name of a requirement or PEP 508 string.
fn requirement_name(requirement: &str) -> Option<String> {
    let name: String = requirement
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    if name.is_empty() {
        None
    } else {
        Some(name.to_lowercase())
    }
}

pub fn parse_package_json(content: &str) -> Result<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let mut names = Vec::new();
    for section in ["dependencies", "devDependencies"] {
        if let Some(deps) = value.get(section).and_then(|v| v.as_object()) {
            names.extend(deps.keys().cloned());
        }
    }
    Ok(names)
}

pub fn parse_requirements(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty() && !line.starts_with('-') && !line.contains("://"))
        .filter_map(requirement_name)
        .collect()
}

pub fn parse_pyproject(content: &str) -> Result<Vec<String>> {
    let value: toml::Table = toml::from_str(content)?;
    let mut names = Vec::new();

    if let Some(deps) = value
        .get("project")
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_array())
    {
        names.extend(deps.iter().filter_map(|d| d.as_str()).filter_map(requirement_name));
    }

    if let Some(deps) = value
        .get("tool")
        .and_then(|t| t.get("poetry"))
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_table())
    {
        names.extend(
            deps.keys()
                .filter(|k| k.as_str() != "python")
                .map(|k| k.to_lowercase()),
        );
    }

    Ok(names)
}

pub fn parse_cargo_toml(content: &str) -> Result<Vec<String>> {
    let value: toml::Table = toml::from_str(content)?;
    let mut names = Vec::new();
    for section in ["dependencies", "dev-dependencies"] {
        if let Some(deps) = value.get(section).and_then(|d| d.as_table()) {
            names.extend(deps.keys().cloned());
        }
    }
    Ok(names)
}

/// Every dependency declared in the target's manifest files. A malformed file
/// is logged and skipped.
pub async fn scan_dependencies(target: &Path) -> BTreeSet<String> {
    let mut dependencies = BTreeSet::new();

    for file in DEPENDENCY_FILES {
        let path = target.join(file);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                tracing::warn!("⚠️ Could not read {}: {}", path.display(), e);
                continue;
            }
        };

        let parsed = match file {
            "package.json" => parse_package_json(&content),
            "requirements.txt" => Ok(parse_requirements(&content)),
            "pyproject.toml" => parse_pyproject(&content),
            _ => parse_cargo_toml(&content),
        };
        match parsed {
            Ok(names) => {
                tracing::debug!("{}: {} dependencies", file, names.len());
                dependencies.extend(names);
            }
            Err(e) => tracing::warn!("⚠️ Skipping malformed {}: {}", path.display(), e),
        }
    }

    dependencies
}

/// Skill names linked from the index as `[name](...)`.
pub async fn load_known_skills(index: &Path) -> BTreeSet<String> {
    match tokio::fs::read_to_string(index).await {
        Ok(content) => {
            let skills: BTreeSet<String> = skill_link_pattern()
                .captures_iter(&content)
                .map(|caps| caps[1].to_string())
                .collect();
            tracing::info!("📚 Loaded {} known skills", skills.len());
            skills
        }
        Err(e) => {
            tracing::warn!("⚠️ Skill index not found at {}: {}", index.display(), e);
            BTreeSet::new()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GapAnalysis {
    /// (library, issue)
    pub gaps: Vec<(String, String)>,
    /// (library, matched skill)
    pub covered: Vec<(String, String)>,
}

pub fn analyze(
    dependencies: &BTreeSet<String>,
    known: &BTreeSet<String>,
    mapping: &BTreeMap<String, String>,
    noise: &[String],
) -> GapAnalysis {
    let mut analysis = GapAnalysis::default();

    for lib in dependencies {
        if let Some(skill) = mapping.get(lib) {
            if known.contains(skill) {
                analysis.covered.push((lib.clone(), skill.clone()));
            } else {
                analysis.gaps.push((
                    lib.clone(),
                    format!("Mapped to '{}' but skill not found in Index", skill),
                ));
            }
        } else if noise.iter().any(|n| n == lib) {
            continue;
        } else if known.contains(lib) {
            analysis.covered.push((lib.clone(), lib.clone()));
        } else {
            analysis
                .gaps
                .push((lib.clone(), "No specific skill mapped".to_string()));
        }
    }

    analysis.gaps.sort();
    analysis.covered.sort();
    analysis
}

pub fn render_report(target: &Path, analysis: &GapAnalysis, generated_at: DateTime<Local>) -> String {
    let mut out = String::from("# Skill Gap Analysis Report\n\n");
    out.push_str(&format!("**Target:** `{}`\n", target.display()));
    out.push_str(&format!(
        "**Generated:** {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    out.push_str("## 🔴 Potential Skill Gaps\n");
    out.push_str("The following libraries/technologies were found but may lack comprehensive documentation/skills:\n\n");
    if analysis.gaps.is_empty() {
        out.push_str("✅ No obvious gaps detected.\n");
    } else {
        out.push_str("| Library | Issue/Gap |\n|---|---|\n");
        for (lib, issue) in &analysis.gaps {
            out.push_str(&format!("| `{}` | {} |\n", lib, issue));
        }
    }

    out.push_str("\n## 🟢 Covered Skills\n");
    out.push_str("The following technologies are supported by existing skills:\n\n");
    if analysis.covered.is_empty() {
        out.push_str("No dependencies found matching known skills.\n");
    } else {
        out.push_str("| Library | Matched Skill |\n|---|---|\n");
        for (lib, skill) in &analysis.covered {
            out.push_str(&format!("| `{}` | `[{}]` |\n", lib, skill));
        }
    }

    out.push_str("\n---\n*Re-run the watcher whenever dependencies change to keep this up to date.*\n");
    out
}

pub struct GapWatcher<S: Storage> {
    /// Rooted at the target project; the report is written here.
    storage: S,
    target: PathBuf,
    index_path: PathBuf,
    report_name: String,
    mapping: BTreeMap<String, String>,
    noise: Vec<String>,
    poll_interval: Duration,
}

impl<S: Storage> GapWatcher<S> {
    pub fn new(
        storage: S,
        target: impl Into<PathBuf>,
        index_path: impl Into<PathBuf>,
        report_name: impl Into<String>,
        mapping: BTreeMap<String, String>,
        noise: Vec<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            storage,
            target: target.into(),
            index_path: index_path.into(),
            report_name: report_name.into(),
            mapping,
            noise,
            poll_interval,
        }
    }

    pub async fn run_once(&self) -> Result<GapAnalysis> {
        let is_dir = tokio::fs::metadata(&self.target)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(SkillkitError::corpus(
                self.target.display().to_string(),
                "target is not a directory",
            ));
        }

        tracing::info!("🔍 Scanning {}", self.target.display());
        let dependencies = scan_dependencies(&self.target).await;
        let known = load_known_skills(&self.index_path).await;
        let analysis = analyze(&dependencies, &known, &self.mapping, &self.noise);

        let report = render_report(&self.target, &analysis, Local::now());
        self.storage
            .write_file(&self.report_name, report.as_bytes())
            .await?;
        tracing::info!(
            "📝 {} gaps, {} covered; report at {}",
            analysis.gaps.len(),
            analysis.covered.len(),
            self.storage.display_path(&self.report_name)
        );
        Ok(analysis)
    }

    async fn snapshot(&self) -> BTreeMap<&'static str, SystemTime> {
        let mut snapshot = BTreeMap::new();
        for file in DEPENDENCY_FILES {
            let modified = tokio::fs::metadata(self.target.join(file))
                .await
                .and_then(|m| m.modified());
            if let Ok(modified) = modified {
                snapshot.insert(file, modified);
            }
        }
        snapshot
    }

    /// Regenerates on the first pass and whenever a dependency file changes,
    /// until `shutdown` resolves.
    pub async fn watch_until<F: Future<Output = ()>>(&self, shutdown: F) -> Result<usize> {
        tokio::pin!(shutdown);
        let mut last: Option<BTreeMap<&'static str, SystemTime>> = None;
        let mut passes = 0;

        loop {
            let current = self.snapshot().await;
            if last.as_ref() != Some(&current) {
                if last.is_some() {
                    tracing::info!("🔄 Dependency files changed");
                }
                if let Err(e) = self.run_once().await {
                    tracing::error!("❌ Gap analysis failed: {}", e);
                }
                passes += 1;
                last = Some(current);
            }

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        Ok(passes)
    }

    /// Watches until Ctrl-C.
    pub async fn watch(&self) -> Result<usize> {
        tracing::info!(
            "👀 Watching {} for changes (Ctrl+C to stop)",
            self.target.display()
        );
        let passes = self
            .watch_until(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Cannot listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            })
            .await?;
        tracing::info!("👋 Stopped after {} analysis passes", passes);
        Ok(passes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_requirements() {
        let content = "# comment\nFastAPI==0.110\nuvicorn[standard]>=0.29 ; python_version>'3.8'\n-r base.txt\n-e .\n\npydantic~=2.0  # inline\ngit+https://github.com/x/y.git\n";
        assert_eq!(parse_requirements(content), vec!["fastapi", "uvicorn", "pydantic"]);
    }

    #[test]
    fn test_parse_pyproject() {
        let content = r#"
[project]
dependencies = ["httpx>=0.27", "Pandas[performance]"]

[tool.poetry.dependencies]
python = "^3.11"
numpy = "^1.26"
"#;
        assert_eq!(parse_pyproject(content).unwrap(), vec!["httpx", "pandas", "numpy"]);
    }

    #[test]
    fn test_parse_package_json_and_cargo() {
        let pkg = r#"{"dependencies": {"react": "^18"}, "devDependencies": {"jest": "^29"}}"#;
        assert_eq!(parse_package_json(pkg).unwrap(), vec!["react", "jest"]);
        assert!(parse_package_json("{not json").is_err());

        let cargo = "[dependencies]\ntokio = \"1\"\n[dev-dependencies]\ntempfile = \"3\"\n";
        assert_eq!(parse_cargo_toml(cargo).unwrap(), vec!["tokio", "tempfile"]);
    }

    #[test]
    fn test_analyze() {
        let deps = set(&["react", "react-dom", "kafka", "stripe-integration", "left-pad"]);
        let known = set(&["react-best-practices", "stripe-integration"]);
        let noise = vec!["react-dom".to_string()];

        let analysis = analyze(&deps, &known, &builtin_mapping(), &noise);

        assert_eq!(
            analysis.covered,
            vec![
                ("react".to_string(), "react-best-practices".to_string()),
                ("stripe-integration".to_string(), "stripe-integration".to_string()),
            ]
        );
        assert_eq!(
            analysis.gaps,
            vec![
                (
                    "kafka".to_string(),
                    "Mapped to 'kafka-streams' but skill not found in Index".to_string()
                ),
                ("left-pad".to_string(), "No specific skill mapped".to_string()),
            ]
        );
    }

    #[test]
    fn test_render_report() {
        let at = Local.with_ymd_and_hms(2026, 5, 6, 7, 8, 9).unwrap();
        let empty = render_report(Path::new("/srv/app"), &GapAnalysis::default(), at);
        assert!(empty.contains("**Target:** `/srv/app`"));
        assert!(empty.contains("✅ No obvious gaps detected."));
        assert!(empty.contains("No dependencies found matching known skills."));

        let analysis = GapAnalysis {
            gaps: vec![("kafka".into(), "No specific skill mapped".into())],
            covered: vec![("react".into(), "react-best-practices".into())],
        };
        let report = render_report(Path::new("/srv/app"), &analysis, at);
        assert!(report.contains("| `kafka` | No specific skill mapped |"));
        assert!(report.contains("| `react` | `[react-best-practices]` |"));
    }

    #[tokio::test]
    async fn test_load_known_skills() {
        let dir = tempfile::TempDir::new().unwrap();
        let index = dir.path().join("SKILL_INDEX.md");
        std::fs::write(
            &index,
            "- [kafka-streams](08-messaging-queue/kafka-streams/SKILL.md)\n- [Not A Skill](x)\n[prisma-guide](04-database/prisma-guide/SKILL.md)",
        )
        .unwrap();

        assert_eq!(load_known_skills(&index).await, set(&["kafka-streams", "prisma-guide"]));
        assert!(load_known_skills(&dir.path().join("missing.md")).await.is_empty());
    }

    #[tokio::test]
    async fn test_scan_dependencies_skips_missing_and_malformed_files() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("requirements.txt"), "fastapi>=0.110\nredis\n").unwrap();
        std::fs::write(dir.path().join("package.json"), "{not json").unwrap();

        let dependencies = scan_dependencies(dir.path()).await;
        assert_eq!(dependencies, set(&["fastapi", "redis"]));
        assert!(scan_dependencies(&dir.path().join("missing")).await.is_empty());
    }
}
