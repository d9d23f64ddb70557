use crate::app::validate::ValidationRules;
use crate::core::corpus;
use crate::core::engine::write_artifact;
use crate::domain::model::{Artifact, Corpus, OutputFile, RunSummary, SkillDocument};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::Result;
use crate::utils::text::escape_html;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub path: String,
    pub sections_found: Vec<String>,
    pub sections_missing: Vec<String>,
    pub code_blocks: usize,
    pub languages: Vec<String>,
    pub has_checklist: bool,
    pub word_count: usize,
    pub line_count: usize,
    pub valid: bool,
}

pub fn analyze(doc: &SkillDocument, rules: &ValidationRules) -> Analysis {
    let (sections_found, sections_missing): (Vec<String>, Vec<String>) = rules
        .required_sections
        .iter()
        .cloned()
        .partition(|section| doc.has_section(section));

    let blocks = doc.code_blocks();
    let languages: BTreeSet<String> = blocks.iter().filter_map(|b| b.language.clone()).collect();

    Analysis {
        path: doc.path.clone(),
        valid: sections_missing.is_empty() && !blocks.is_empty(),
        sections_found,
        sections_missing,
        code_blocks: blocks.len(),
        languages: languages.into_iter().collect(),
        has_checklist: doc.has_checklist(),
        word_count: doc.word_count(),
        line_count: doc.line_count(),
    }
}

const STYLE: &str = r#"
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 40px; background: #f5f5f5; }
        .container { max-width: 1200px; margin: 0 auto; background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        h1 { color: #333; border-bottom: 2px solid #007bff; padding-bottom: 10px; }
        .summary { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; margin: 20px 0; }
        .stat { background: #f8f9fa; padding: 20px; border-radius: 8px; text-align: center; }
        .stat-value { font-size: 2em; font-weight: bold; color: #007bff; }
        .stat-label { color: #666; margin-top: 5px; }
        table { width: 100%; border-collapse: collapse; margin-top: 20px; }
        th, td { padding: 12px; text-align: left; border-bottom: 1px solid #ddd; }
        th { background: #007bff; color: white; }
        .valid { color: #28a745; }
        .invalid { color: #dc3545; }
        .badge { display: inline-block; padding: 2px 8px; border-radius: 4px; font-size: 0.8em; margin: 2px; }
        .badge-lang { background: #e9ecef; color: #495057; }
        .badge-missing { background: #f8d7da; color: #721c24; }
        .timestamp { color: #666; font-size: 0.9em; margin-top: 20px; }
"#;

fn stat(out: &mut String, value: usize, label: &str, color: Option<&str>) {
    let style = color
        .map(|c| format!(" style=\"color: {};\"", c))
        .unwrap_or_default();
    let _ = write!(
        out,
        "            <div class=\"stat\">\n                <div class=\"stat-value\"{}>{}</div>\n                <div class=\"stat-label\">{}</div>\n            </div>\n",
        style, value, label
    );
}

fn issue_badges(analysis: &Analysis) -> String {
    let mut issues = String::new();
    for section in &analysis.sections_missing {
        let _ = write!(
            issues,
            "<span class=\"badge badge-missing\">Missing: {}</span>",
            escape_html(section)
        );
    }
    if !analysis.has_checklist {
        issues.push_str("<span class=\"badge badge-missing\">No checklist</span>");
    }
    if analysis.code_blocks == 0 {
        issues.push_str("<span class=\"badge badge-missing\">No code examples</span>");
    }
    if issues.is_empty() {
        issues.push_str("<span class=\"valid\">None</span>");
    }
    issues
}

/// Standalone HTML page; invalid skills are listed first.
pub fn render_html(analyses: &[Analysis], generated_at: DateTime<Utc>) -> String {
    let total = analyses.len();
    let valid = analyses.iter().filter(|a| a.valid).count();
    let code_blocks: usize = analyses.iter().map(|a| a.code_blocks).sum();

    let mut sorted: Vec<&Analysis> = analyses.iter().collect();
    sorted.sort_by(|a, b| (a.valid, &a.path).cmp(&(b.valid, &b.path)));

    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("    <meta charset=\"UTF-8\">\n");
    out.push_str("    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    out.push_str("    <title>Skill Validation Report</title>\n");
    let _ = write!(out, "    <style>{}    </style>\n</head>\n<body>\n", STYLE);
    out.push_str("    <div class=\"container\">\n        <h1>📊 Skill Validation Report</h1>\n\n");

    out.push_str("        <div class=\"summary\">\n");
    stat(&mut out, total, "Total Skills", None);
    stat(&mut out, valid, "Valid Skills", Some("#28a745"));
    stat(&mut out, total - valid, "Invalid Skills", Some("#dc3545"));
    stat(&mut out, code_blocks, "Code Blocks", None);
    out.push_str("        </div>\n\n");

    out.push_str("        <h2>Skill Details</h2>\n        <table>\n            <thead>\n                <tr>\n");
    for header in ["Skill Path", "Status", "Code Blocks", "Languages", "Issues"] {
        let _ = writeln!(out, "                    <th>{}</th>", header);
    }
    out.push_str("                </tr>\n            </thead>\n            <tbody>\n");

    for analysis in sorted {
        let (class, status) = if analysis.valid {
            ("valid", "✅ Valid")
        } else {
            ("invalid", "❌ Invalid")
        };
        let languages = if analysis.languages.is_empty() {
            "<span style=\"color:#999\">None</span>".to_string()
        } else {
            analysis
                .languages
                .iter()
                .map(|l| format!("<span class=\"badge badge-lang\">{}</span>", escape_html(l)))
                .collect()
        };

        out.push_str("                <tr>\n");
        let _ = writeln!(out, "                    <td>{}</td>", escape_html(&analysis.path));
        let _ = writeln!(out, "                    <td class=\"{}\">{}</td>", class, status);
        let _ = writeln!(out, "                    <td>{}</td>", analysis.code_blocks);
        let _ = writeln!(out, "                    <td>{}</td>", languages);
        let _ = writeln!(out, "                    <td>{}</td>", issue_badges(analysis));
        out.push_str("                </tr>\n");
    }

    out.push_str("            </tbody>\n        </table>\n\n");
    let _ = writeln!(
        out,
        "        <p class=\"timestamp\">Generated at: {}</p>",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    out.push_str("    </div>\n</body>\n</html>\n");
    out
}

pub struct ReportPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    output: String,
}

impl<S: Storage, C: ConfigProvider> ReportPipeline<S, C> {
    pub fn new(storage: S, config: C, output: impl Into<String>) -> Self {
        Self {
            storage,
            config,
            output: output.into(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ReportPipeline<S, C> {
    fn name(&self) -> &str {
        "validation report"
    }

    async fn extract(&self) -> Result<Corpus> {
        corpus::load(&self.config).await
    }

    async fn transform(&self, corpus: Corpus) -> Result<Artifact> {
        let rules = ValidationRules::from_config(&self.config);
        let analyses: Vec<Analysis> = corpus.documents.iter().map(|d| analyze(d, &rules)).collect();
        let html = render_html(&analyses, Utc::now());

        Ok(Artifact {
            files: vec![OutputFile::text(self.output.clone(), html)],
            summary: format!("Generated validation report for {} skill files", analyses.len()),
            findings: corpus.unreadable,
            ..Artifact::default()
        })
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

    fn rules() -> ValidationRules {
        ValidationRules {
            required_sections: vec!["Overview".to_string(), "Best Practices".to_string()],
            require_code_examples: true,
            require_checklist: true,
        }
    }

    fn doc(path: &str, content: &str) -> SkillDocument {
        SkillDocument {
            path: path.to_string(),
            skill_name: "x".to_string(),
            category: category_for(path),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_analyze() {
        let analysis = analyze(
            &doc(
                "a/SKILL.md",
                "# A\n## Overview\n```ts\n1\n```\n```python\n2\n```\n```ts\n3\n```\n",
            ),
            &rules(),
        );
        assert_eq!(analysis.sections_found, vec!["Overview"]);
        assert_eq!(analysis.sections_missing, vec!["Best Practices"]);
        assert_eq!(analysis.code_blocks, 3);
        assert_eq!(analysis.languages, vec!["python", "ts"]);
        assert!(!analysis.has_checklist);
        assert!(!analysis.valid);
    }

    #[test]
    fn test_render_html_escapes_and_orders() {
        let good = analyze(
            &doc("a/SKILL.md", "# A\n## Overview\n## Best Practices\n```rust\nfn x() {}\n```\n"),
            &rules(),
        );
        let bad = analyze(&doc("z/<script>/SKILL.md", "# Z"), &rules());
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();

        let html = render_html(&[good, bad], at);

        assert!(html.contains("z/&lt;script&gt;/SKILL.md"));
        assert!(!html.contains("<script>"));
        assert!(html.find("❌ Invalid").unwrap() < html.find("✅ Valid").unwrap());
        assert!(html.contains("Missing: Overview"));
        assert!(html.contains("No code examples"));
        assert!(html.contains("<span class=\"badge badge-lang\">rust</span>"));
        assert!(html.contains("Generated at: 2026-01-02 03:04:05 UTC"));
    }
}
