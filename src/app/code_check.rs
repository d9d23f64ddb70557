use crate::config::toml_config::{CodeCheckConfig, ExternalValidator};
use crate::core::corpus;
use crate::core::engine::write_artifact;
use crate::domain::model::{Artifact, Corpus, Finding, FindingKind, RunSummary};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::Result;
use crate::utils::text::truncate;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const MAX_ERROR_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnippetOutcome {
    Valid,
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    Json,
    Yaml,
    Toml,
}

impl Builtin {
    fn for_language(language: &str) -> Option<Self> {
        match language {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    fn check(self, code: &str) -> std::result::Result<(), String> {
        match self {
            Self::Json => serde_json::from_str::<serde_json::Value>(code)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            Self::Yaml => {
                for document in serde_yaml::Deserializer::from_str(code) {
                    serde_yaml::Value::deserialize(document).map_err(|e| e.to_string())?;
                }
                Ok(())
            }
            Self::Toml => toml::from_str::<toml::Table>(code)
                .map(|_| ())
                .map_err(|e| e.to_string()),
        }
    }
}

/// Syntax-checks snippets with built-in parsers or external commands.
pub struct CodeChecker {
    validators: BTreeMap<String, ExternalValidator>,
    timeout: Duration,
    missing: Mutex<HashSet<String>>,
}

impl CodeChecker {
    pub fn new(config: &CodeCheckConfig) -> Self {
        Self {
            validators: config.validators(),
            timeout: Duration::from_secs(config.timeout_seconds),
            missing: Mutex::new(HashSet::new()),
        }
    }

    pub fn supports(&self, language: &str) -> bool {
        Builtin::for_language(language).is_some() || self.validators.contains_key(language)
    }

    pub async fn check(&self, language: &str, code: &str) -> SnippetOutcome {
        if let Some(builtin) = Builtin::for_language(language) {
            return match builtin.check(code) {
                Ok(()) => SnippetOutcome::Valid,
                Err(e) => SnippetOutcome::Failed(truncate(&e, MAX_ERROR_CHARS)),
            };
        }

        match self.validators.get(language) {
            Some(validator) => self.run_external(language, validator, code).await,
            None => SnippetOutcome::Skipped,
        }
    }

    async fn run_external(
        &self,
        language: &str,
        validator: &ExternalValidator,
        code: &str,
    ) -> SnippetOutcome {
        let spawned = Command::new(&validator.command)
            .args(&validator.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                self.note_missing(language, &validator.command, &e);
                return SnippetOutcome::Skipped;
            }
        };

        let stdin = child.stdin.take();
        let command = validator.command.clone();
        let code = code.to_string();
        // the write runs alongside the wait so a validator that never drains
        // stdin still hits the timeout; dropping the child kills it
        let writer = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                // a validator may exit before reading everything
                if let Err(e) = stdin.write_all(code.as_bytes()).await {
                    tracing::debug!("Writing snippet to {} failed: {}", command, e);
                }
            }
        });

        let waited = tokio::time::timeout(self.timeout, child.wait_with_output()).await;
        writer.abort();
        let output = match waited {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return SnippetOutcome::Failed(truncate(&e.to_string(), MAX_ERROR_CHARS)),
            Err(_) => return SnippetOutcome::Failed("Validation timed out".to_string()),
        };

        if output.status.success() {
            return SnippetOutcome::Valid;
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let message = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        let message = if message.is_empty() {
            format!("{} exited with {}", validator.command, output.status)
        } else {
            message
        };
        SnippetOutcome::Failed(truncate(&message, MAX_ERROR_CHARS))
    }

    fn note_missing(&self, language: &str, command: &str, error: &std::io::Error) {
        let first = match self.missing.lock() {
            Ok(mut missing) => missing.insert(language.to_string()),
            Err(_) => false,
        };
        if first {
            tracing::warn!(
                "⚠️ Validator '{}' for {} snippets is unavailable ({}); skipping them",
                command,
                language,
                error
            );
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub files: usize,
    pub total_blocks: usize,
    pub validated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub findings: Vec<Finding>,
}

impl CheckReport {
    pub fn render_text(&self) -> String {
        let counts = format!(
            "{} validated, {} skipped, {} failed",
            self.validated, self.skipped, self.failed
        );
        if self.findings.is_empty() {
            return format!(
                "✅ Validated {} code blocks in {} skill files! ({})",
                self.total_blocks, self.files, counts
            );
        }

        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for finding in &self.findings {
            grouped
                .entry(finding.path.as_str())
                .or_default()
                .push(finding.message.as_str());
        }

        let mut out = String::from("❌ Code example validation failed:\n");
        for (path, messages) in grouped {
            out.push_str(&format!("\n  {}:\n", path));
            for message in messages {
                out.push_str(&format!("    • {}\n", message));
            }
        }
        out.push_str(&format!("\n{}", counts));
        out
    }
}

/// Checks every snippet in the corpus, optionally restricted to `languages`.
pub async fn check_corpus(
    checker: &CodeChecker,
    corpus: &Corpus,
    languages: &BTreeSet<String>,
) -> CheckReport {
    let mut report = CheckReport {
        files: corpus.len(),
        ..CheckReport::default()
    };

    for doc in &corpus.documents {
        for (index, block) in doc.code_blocks().iter().enumerate() {
            report.total_blocks += 1;
            let language = match &block.language {
                Some(language) if languages.is_empty() || languages.contains(language) => language,
                Some(_) => continue,
                None if languages.is_empty() => {
                    report.skipped += 1;
                    continue;
                }
                None => continue,
            };

            match checker.check(language, &block.code).await {
                SnippetOutcome::Valid => report.validated += 1,
                SnippetOutcome::Skipped => report.skipped += 1,
                SnippetOutcome::Failed(error) => {
                    report.failed += 1;
                    report.findings.push(Finding::new(
                        doc.path.clone(),
                        FindingKind::InvalidSnippet,
                        format!("Code block #{} ({}): {}", index + 1, language, error),
                    ));
                }
            }
        }
    }

    report
}

pub struct CodeCheckPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    checker: CodeChecker,
    languages: BTreeSet<String>,
}

impl<S: Storage, C: ConfigProvider> CodeCheckPipeline<S, C> {
    pub fn new(storage: S, config: C, checker: CodeChecker, languages: &[String]) -> Self {
        Self {
            storage,
            config,
            checker,
            languages: languages.iter().map(|l| l.trim().to_lowercase()).collect(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for CodeCheckPipeline<S, C> {
    fn name(&self) -> &str {
        "code example check"
    }

    async fn extract(&self) -> Result<Corpus> {
        corpus::load(&self.config).await
    }

    async fn transform(&self, corpus: Corpus) -> Result<Artifact> {
        for language in &self.languages {
            if !self.checker.supports(language) {
                tracing::warn!("⚠️ No validator configured for '{}'", language);
            }
        }

        let report = check_corpus(&self.checker, &corpus, &self.languages).await;
        let mut findings = corpus.unreadable;
        findings.extend(report.findings.iter().cloned());

        Ok(Artifact {
            stdout: Some(report.render_text()),
            summary: format!(
                "{} code blocks: {} validated, {} skipped, {} failed",
                report.total_blocks, report.validated, report.skipped, report.failed
            ),
            findings,
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
    use crate::domain::model::SkillDocument;

    fn checker_with(validators: BTreeMap<String, ExternalValidator>, timeout: u64) -> CodeChecker {
        CodeChecker::new(&CodeCheckConfig {
            timeout_seconds: timeout,
            validators: Some(validators),
        })
    }

    fn shell(script: &str) -> ExternalValidator {
        ExternalValidator {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        }
    }

    #[tokio::test]
    async fn test_builtin_json() {
        let checker = checker_with(BTreeMap::new(), 10);
        assert_eq!(checker.check("json", r#"{"a": [1, 2]}"#).await, SnippetOutcome::Valid);
        match checker.check("json", r#"{"a": }"#).await {
            SnippetOutcome::Failed(e) => assert!(e.len() <= MAX_ERROR_CHARS),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_builtin_yaml_multi_document() {
        let checker = checker_with(BTreeMap::new(), 10);
        let multi = "apiVersion: v1\nkind: Service\n---\napiVersion: apps/v1\nkind: Deployment\n";
        assert_eq!(checker.check("yaml", multi).await, SnippetOutcome::Valid);
        assert!(matches!(
            checker.check("yml", "key: [unclosed\n").await,
            SnippetOutcome::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_builtin_toml() {
        let checker = checker_with(BTreeMap::new(), 10);
        assert_eq!(checker.check("toml", "[a]\nb = 1\n").await, SnippetOutcome::Valid);
        assert!(matches!(checker.check("toml", "b = \n").await, SnippetOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_unknown_language_is_skipped() {
        let checker = checker_with(BTreeMap::new(), 10);
        assert_eq!(checker.check("typescript", "let x: = 1").await, SnippetOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_external_validator_reads_stdin() {
        let mut validators = BTreeMap::new();
        validators.insert(
            "demo".to_string(),
            shell("grep -q ok || { echo 'syntax error near token' >&2; exit 2; }"),
        );
        let checker = checker_with(validators, 10);

        assert_eq!(checker.check("demo", "this is ok\n").await, SnippetOutcome::Valid);
        assert_eq!(
            checker.check("demo", "broken\n").await,
            SnippetOutcome::Failed("syntax error near token".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_validator_binary_is_skipped() {
        let mut validators = BTreeMap::new();
        validators.insert(
            "python".to_string(),
            ExternalValidator {
                command: "skillkit-no-such-validator".to_string(),
                args: vec![],
            },
        );
        let checker = checker_with(validators, 10);
        assert_eq!(checker.check("python", "print(1)").await, SnippetOutcome::Skipped);
        assert_eq!(checker.check("python", "print(2)").await, SnippetOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_validator_timeout() {
        let mut validators = BTreeMap::new();
        validators.insert("slow".to_string(), shell("sleep 5"));
        let checker = checker_with(validators, 1);
        assert_eq!(
            checker.check("slow", "x").await,
            SnippetOutcome::Failed("Validation timed out".to_string())
        );
    }

    #[tokio::test]
    async fn test_timeout_covers_stdin_write() {
        let mut validators = BTreeMap::new();
        validators.insert("slow".to_string(), shell("sleep 5"));
        let checker = checker_with(validators, 1);
        // far more than a pipe buffer, so the write blocks on a validator that never reads
        let snippet = "x = 1\n".repeat(40_000);

        let started = std::time::Instant::now();
        let outcome = checker.check("slow", &snippet).await;
        assert_eq!(outcome, SnippetOutcome::Failed("Validation timed out".to_string()));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_check_corpus_numbers_blocks_per_file() {
        let content = "# T\n```bash\necho hi\n```\n```json\n{broken\n```\n```\nplain\n```\n";
        let corpus = Corpus {
            documents: vec![SkillDocument {
                path: "15-devops/ci/SKILL.md".to_string(),
                skill_name: "ci".to_string(),
                category: category_for("15-devops/ci/SKILL.md"),
                content: content.to_string(),
            }],
            unreadable: vec![],
        };
        let checker = checker_with(BTreeMap::new(), 10);

        let report = check_corpus(&checker, &corpus, &BTreeSet::new()).await;
        assert_eq!(report.total_blocks, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 2);
        assert!(report.findings[0].message.starts_with("Code block #2 (json): "));

        let only_bash: BTreeSet<String> = ["bash".to_string()].into_iter().collect();
        let report = check_corpus(&checker, &corpus, &only_bash).await;
        assert_eq!(report.failed, 0);
        assert_eq!(report.skipped, 1);
        assert!(report.render_text().starts_with("✅ Validated 3 code blocks in 1 skill files!"));
    }
}
