use crate::core::corpus;
use crate::core::engine::write_artifact;
use crate::domain::model::{Artifact, Corpus, Finding, FindingKind, RunSummary, SkillDocument};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::Result;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    pub required_sections: Vec<String>,
    pub require_code_examples: bool,
    pub require_checklist: bool,
}

impl ValidationRules {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            required_sections: config.required_sections().to_vec(),
            require_code_examples: config.require_code_examples(),
            require_checklist: config.require_checklist(),
        }
    }
}

pub fn check_sections(doc: &SkillDocument, rules: &ValidationRules) -> Vec<Finding> {
    rules
        .required_sections
        .iter()
        .filter(|section| !doc.has_section(section))
        .map(|section| {
            Finding::new(
                doc.path.clone(),
                FindingKind::MissingSection,
                format!("Missing required section '{}'", section),
            )
        })
        .collect()
}

pub fn check_structure(doc: &SkillDocument, rules: &ValidationRules) -> Vec<Finding> {
    let mut findings = check_sections(doc, rules);
    let blocks = doc.code_blocks();

    if rules.require_code_examples && blocks.is_empty() {
        findings.push(Finding::new(
            doc.path.clone(),
            FindingKind::NoCodeExamples,
            "No code examples found",
        ));
    }

    for block in blocks.iter().filter(|b| !b.terminated) {
        findings.push(Finding::new(
            doc.path.clone(),
            FindingKind::UnterminatedFence,
            format!("Code fence opened on line {} is never closed", block.line),
        ));
    }

    if rules.require_checklist && !doc.has_checklist() {
        findings.push(Finding::new(
            doc.path.clone(),
            FindingKind::NoChecklist,
            "No checklist found",
        ));
    }

    findings
}

/// Findings grouped per file, or a success line.
pub fn render_text(findings: &[Finding], files_checked: usize, sections_only: bool) -> String {
    if findings.is_empty() {
        return if sections_only {
            format!("✅ All {} skill files have required sections!", files_checked)
        } else {
            format!("✅ All {} skill files validated successfully!", files_checked)
        };
    }

    let mut grouped: BTreeMap<&str, Vec<&Finding>> = BTreeMap::new();
    for finding in findings {
        grouped.entry(finding.path.as_str()).or_default().push(finding);
    }

    let mut out = String::from(if sections_only {
        "❌ Required sections check failed:\n"
    } else {
        "❌ Validation failed with the following errors:\n"
    });
    for (path, findings) in grouped {
        out.push_str(&format!("\n  {}:\n", path));
        for finding in findings {
            out.push_str(&format!("    • {}\n", finding.message));
        }
    }
    out.push_str(&format!(
        "\n{} problems in {} of {} files",
        findings.len(),
        findings
            .iter()
            .map(|f| f.path.as_str())
            .collect::<std::collections::BTreeSet<_>>()
            .len(),
        files_checked
    ));
    out
}

pub struct ValidatePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    sections_only: bool,
    format: OutputFormat,
}

impl<S: Storage, C: ConfigProvider> ValidatePipeline<S, C> {
    pub fn new(storage: S, config: C, sections_only: bool, format: OutputFormat) -> Self {
        Self {
            storage,
            config,
            sections_only,
            format,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ValidatePipeline<S, C> {
    fn name(&self) -> &str {
        if self.sections_only {
            "section check"
        } else {
            "structure validation"
        }
    }

    async fn extract(&self) -> Result<Corpus> {
        corpus::load(&self.config).await
    }

    async fn transform(&self, corpus: Corpus) -> Result<Artifact> {
        let rules = ValidationRules::from_config(&self.config);
        let files_checked = corpus.len() + corpus.unreadable.len();

        let mut findings = corpus.unreadable;
        for doc in &corpus.documents {
            if self.sections_only {
                findings.extend(check_sections(doc, &rules));
            } else {
                findings.extend(check_structure(doc, &rules));
            }
        }
        findings.sort_by(|a, b| a.path.cmp(&b.path));

        let stdout = match self.format {
            OutputFormat::Text => render_text(&findings, files_checked, self.sections_only),
            OutputFormat::Json => serde_json::to_string_pretty(&findings)?,
        };

        Ok(Artifact {
            stdout: Some(stdout),
            summary: format!("Checked {} files, {} findings", files_checked, findings.len()),
            findings,
            ..Artifact::default()
        })
    }

    async fn load(&self, artifact: Artifact) -> Result<RunSummary> {
        write_artifact(&self.storage, artifact).await
    }
}
