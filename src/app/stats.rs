use crate::core::corpus;
use crate::core::engine::write_artifact;
use crate::domain::model::{Artifact, Category, Corpus, OutputFile, RunSummary, SkillDocument};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::Result;
use crate::utils::text::thousands;
use chrono::{DateTime, Local};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusStats {
    pub total_skills: usize,
    pub total_lines: usize,
    pub code_examples: usize,
    pub categories: Vec<(Category, usize)>,
}

impl CorpusStats {
    pub fn collect(documents: &[SkillDocument]) -> Self {
        let mut categories: BTreeMap<String, (Category, usize)> = BTreeMap::new();
        for doc in documents {
            categories
                .entry(doc.category.key())
                .or_insert_with(|| (doc.category.clone(), 0))
                .1 += 1;
        }

        Self {
            total_skills: documents.len(),
            total_lines: documents.iter().map(|d| d.line_count()).sum(),
            code_examples: documents.iter().map(|d| d.code_blocks().len()).sum(),
            categories: categories.into_values().collect(),
        }
    }
}

pub fn render_markdown(stats: &CorpusStats, generated_at: DateTime<Local>, title: &str) -> String {
    let mut lines = vec![
        format!("# 📊 {}", title),
        String::new(),
        format!("**Generated**: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
        String::new(),
        "## Overall Statistics".to_string(),
        String::new(),
        format!("- **Total Skills**: {}", thousands(stats.total_skills)),
        format!("- **Total Lines**: {}", thousands(stats.total_lines)),
        format!("- **Code Examples**: {}", thousands(stats.code_examples)),
        format!("- **Categories**: {}", stats.categories.len()),
        String::new(),
        "## Skills by Category".to_string(),
        String::new(),
        "| Category | Count |".to_string(),
        "|----------|-------|".to_string(),
    ];
    for (category, count) in &stats.categories {
        lines.push(format!("| {} | {} |", category.name, thousands(*count)));
    }
    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(String::new());
    lines.push("*This report is generated automatically.*".to_string());
    lines.join("\n")
}

pub struct StatsPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    title: String,
    output: Option<String>,
}

impl<S: Storage, C: ConfigProvider> StatsPipeline<S, C> {
    pub fn new(storage: S, config: C, title: impl Into<String>, output: Option<String>) -> Self {
        Self {
            storage,
            config,
            title: title.into(),
            output,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for StatsPipeline<S, C> {
    fn name(&self) -> &str {
        "repository statistics"
    }

    async fn extract(&self) -> Result<Corpus> {
        corpus::load(&self.config).await
    }

    async fn transform(&self, corpus: Corpus) -> Result<Artifact> {
        let stats = CorpusStats::collect(&corpus.documents);
        let markdown = render_markdown(&stats, Local::now(), &self.title);

        let mut artifact = Artifact {
            summary: format!(
                "{} skills, {} code examples in {} categories",
                stats.total_skills,
                stats.code_examples,
                stats.categories.len()
            ),
            findings: corpus.unreadable,
            ..Artifact::default()
        };
        match &self.output {
            Some(path) => artifact.files.push(OutputFile::text(path.clone(), markdown)),
            None => artifact.stdout = Some(markdown),
        }
        Ok(artifact)
    }

    async fn load(&self, artifact: Artifact) -> Result<RunSummary> {
        write_artifact(&self.storage, artifact).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::corpus::category_for;
    use chrono::TimeZone;

    fn doc(path: &str, content: &str) -> SkillDocument {
        SkillDocument {
            path: path.to_string(),
            skill_name: "x".to_string(),
            category: category_for(path),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_collect_counts_parsed_fences() {
        let docs = vec![
            doc("02-frontend/a/SKILL.md", "# A\n```ts\n```\n````md\n```inner\n````\n"),
            doc("02-frontend/b/SKILL.md", "# B\n"),
            doc("40-system-resilience/c/SKILL.md", "# C\n~~~\nx\n~~~\n"),
        ];
        let stats = CorpusStats::collect(&docs);

        assert_eq!(stats.total_skills, 3);
        assert_eq!(stats.code_examples, 3);
        assert_eq!(stats.total_lines, 6 + 1 + 4);
        assert_eq!(stats.categories.len(), 2);
        assert_eq!(stats.categories[0].0.name, "Frontend");
        assert_eq!(stats.categories[0].1, 2);
    }

    #[test]
    fn test_render_markdown() {
        let stats = CorpusStats {
            total_skills: 1200,
            total_lines: 1_234_567,
            code_examples: 0,
            categories: vec![(category_for("08-messaging-queue/x/SKILL.md"), 3)],
        };
        let at = Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        let markdown = render_markdown(&stats, at, "Skills Repository Statistics");

        assert!(markdown.starts_with("# 📊 Skills Repository Statistics\n\n**Generated**: 2026-03-04 05:06:07"));
        assert!(markdown.contains("- **Total Skills**: 1,200"));
        assert!(markdown.contains("- **Total Lines**: 1,234,567"));
        assert!(markdown.contains("| Messaging Queue | 3 |"));
    }
}
