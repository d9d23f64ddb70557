use crate::app::manifest::{Manifest, SkillSummary};
use crate::config::toml_config::ReadmeConfig;
use crate::core::corpus;
use crate::core::engine::write_artifact;
use crate::domain::model::{Artifact, Corpus, OutputFile, RunSummary};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::{Result, SkillkitError};
use regex::Regex;
use std::collections::BTreeMap;

/// Markdown skill index grouped by category.
pub fn render_table(manifest: &Manifest) -> String {
    let mut lines = vec![
        "## Skills Overview\n".to_string(),
        format!("**Total Skills:** {}\n", manifest.total),
    ];

    let mut groups: BTreeMap<String, Vec<&SkillSummary>> = BTreeMap::new();
    for skill in &manifest.skills {
        groups.entry(skill.category.key()).or_default().push(skill);
    }

    for skills in groups.values_mut() {
        skills.sort_by(|a, b| a.skill_name.cmp(&b.skill_name));
        let category = &skills[0].category;
        lines.push(format!("\n### {:02}. {}\n", category.number, category.name));
        lines.push("| Skill | Description |".to_string());
        lines.push("|-------|-------------|".to_string());
        for skill in skills.iter() {
            lines.push(format!(
                "| [{}]({}) | {} |",
                skill.skill_name,
                skill.path.replace('\\', "/"),
                skill.title.replace('|', "\\|")
            ));
        }
    }

    lines.join("\n")
}

/// Replaces the marked section of `readme` (markers included) or appends it.
pub fn splice(readme: &str, section: &str, start: &str, end: &str) -> Result<String> {
    let pattern = Regex::new(&format!("(?s){}.*?{}", regex::escape(start), regex::escape(end)))
        .map_err(|e| SkillkitError::config(format!("invalid README markers: {}", e)))?;
    let block = format!("{}\n{}\n{}", start, section, end);

    if pattern.is_match(readme) {
        Ok(pattern
            .replace(readme, regex::NoExpand(&block))
            .into_owned())
    } else {
        Ok(format!("{}\n\n{}\n", readme.trim_end(), block))
    }
}

pub fn new_readme(title: &str, section: &str, start: &str, end: &str) -> String {
    format!("# {}\n\n{}\n{}\n{}\n", title, start, section, end)
}

pub struct ReadmePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    readme: ReadmeConfig,
    manifest: Option<Manifest>,
}

impl<S: Storage, C: ConfigProvider> ReadmePipeline<S, C> {
    /// With a manifest the corpus is not scanned.
    pub fn new(storage: S, config: C, readme: ReadmeConfig, manifest: Option<Manifest>) -> Self {
        Self {
            storage,
            config,
            readme,
            manifest,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ReadmePipeline<S, C> {
    fn name(&self) -> &str {
        "README update"
    }

    async fn extract(&self) -> Result<Corpus> {
        if self.manifest.is_some() {
            return Ok(Corpus::default());
        }
        corpus::load(&self.config).await
    }

    async fn transform(&self, corpus: Corpus) -> Result<Artifact> {
        let manifest = match &self.manifest {
            Some(manifest) => manifest.clone(),
            None => Manifest::build(&corpus.documents),
        };
        let section = render_table(&manifest);
        let (start, end) = (&self.readme.start_marker, &self.readme.end_marker);

        let contents = if self.storage.exists(&self.readme.path).await {
            let bytes = self.storage.read_file(&self.readme.path).await?;
            let current = String::from_utf8(bytes).map_err(|_| {
                SkillkitError::corpus(self.readme.path.clone(), "README is not valid UTF-8")
            })?;
            splice(&current, &section, start, end)?
        } else {
            tracing::info!("📝 {} not found, creating it", self.readme.path);
            new_readme(&self.readme.title, &section, start, end)
        };

        Ok(Artifact {
            files: vec![OutputFile::text(self.readme.path.clone(), contents)],
            summary: format!("Updated {} with {} skills", self.readme.path, manifest.total),
            findings: corpus.unreadable,
            ..Artifact::default()
        })
    }

    async fn load(&self, artifact: Artifact) -> Result<RunSummary> {
        write_artifact(&self.storage, artifact).await
    }
}
