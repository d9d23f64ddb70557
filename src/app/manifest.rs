use crate::core::corpus;
use crate::core::engine::write_artifact;
use crate::domain::model::{Artifact, Category, Corpus, OutputFile, RunSummary, SkillDocument};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::{Result, SkillkitError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSummary {
    pub path: String,
    pub title: String,
    pub skill_name: String,
    pub category: Category,
    pub has_overview: bool,
    pub has_best_practices: bool,
    pub has_code_examples: bool,
    pub word_count: usize,
}

impl SkillSummary {
    pub fn from_document(doc: &SkillDocument) -> Self {
        Self {
            path: doc.path.clone(),
            title: doc.title(),
            skill_name: doc.skill_name.clone(),
            category: doc.category.clone(),
            has_overview: doc.has_section("Overview"),
            has_best_practices: doc.has_section("Best Practices"),
            has_code_examples: !doc.code_blocks().is_empty(),
            word_count: doc.word_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: Category,
    pub skill_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestStatistics {
    pub total_skills: usize,
    pub total_categories: usize,
    pub with_overview: usize,
    pub with_best_practices: usize,
    pub with_code_examples: usize,
}

/// JSON manifest of the corpus (`skills.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub skills: Vec<SkillSummary>,
    pub total: usize,
    #[serde(default)]
    pub categories: Vec<CategorySummary>,
    #[serde(default)]
    pub statistics: ManifestStatistics,
}

impl Manifest {
    pub fn build(documents: &[SkillDocument]) -> Self {
        let mut skills: Vec<SkillSummary> =
            documents.iter().map(SkillSummary::from_document).collect();
        skills.sort_by(|a, b| {
            (a.category.number, &a.skill_name, &a.path).cmp(&(
                b.category.number,
                &b.skill_name,
                &b.path,
            ))
        });

        let mut counts: BTreeMap<(u32, String), CategorySummary> = BTreeMap::new();
        for skill in &skills {
            counts
                .entry((skill.category.number, skill.category.slug.clone()))
                .or_insert_with(|| CategorySummary {
                    category: skill.category.clone(),
                    skill_count: 0,
                })
                .skill_count += 1;
        }
        let categories: Vec<CategorySummary> = counts.into_values().collect();

        let statistics = ManifestStatistics {
            total_skills: skills.len(),
            total_categories: categories.len(),
            with_overview: skills.iter().filter(|s| s.has_overview).count(),
            with_best_practices: skills.iter().filter(|s| s.has_best_practices).count(),
            with_code_examples: skills.iter().filter(|s| s.has_code_examples).count(),
        };

        Self {
            total: skills.len(),
            skills,
            categories,
            statistics,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            SkillkitError::corpus(path.display().to_string(), format!("cannot read manifest: {}", e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

pub struct ScanPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    output: Option<String>,
}

impl<S: Storage, C: ConfigProvider> ScanPipeline<S, C> {
    pub fn new(storage: S, config: C, output: Option<String>) -> Self {
        Self {
            storage,
            config,
            output,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ScanPipeline<S, C> {
    fn name(&self) -> &str {
        "skill scan"
    }

    async fn extract(&self) -> Result<Corpus> {
        corpus::load(&self.config).await
    }

    async fn transform(&self, corpus: Corpus) -> Result<Artifact> {
        let manifest = Manifest::build(&corpus.documents);
        let json = manifest.to_json()?;
        let summary = format!(
            "Scanned {} skills in {} categories",
            manifest.total, manifest.statistics.total_categories
        );

        let mut artifact = Artifact {
            summary,
            findings: corpus.unreadable,
            ..Artifact::default()
        };
        match &self.output {
            Some(path) => artifact.files.push(OutputFile::text(path.clone(), json)),
            None => artifact.stdout = Some(json),
        }
        Ok(artifact)
    }

    async fn load(&self, artifact: Artifact) -> Result<RunSummary> {
        write_artifact(&self.storage, artifact).await
    }
}
