use crate::core::corpus;
use crate::core::engine::write_artifact;
use crate::domain::model::{Artifact, Corpus, OutputFile, RunSummary, SkillDocument};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::{Result, SkillkitError};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub source: String,
    pub language: String,
    pub code: String,
    pub line: usize,
}

#[derive(Debug, Serialize)]
struct ExampleLocation<'a> {
    source: &'a str,
    line: usize,
}

#[derive(Debug, Serialize)]
struct ExtractManifest<'a> {
    language: &'a str,
    total_examples: usize,
    source_files: usize,
    examples: Vec<ExampleLocation<'a>>,
}

/// Fence aliases for `language`; a language without an entry matches itself.
pub fn aliases_for(language: &str, table: &BTreeMap<String, Vec<String>>) -> Vec<String> {
    table
        .get(language)
        .cloned()
        .unwrap_or_else(|| vec![language.to_string()])
}

pub fn extract_examples(documents: &[SkillDocument], aliases: &[String]) -> Vec<Example> {
    let mut examples = Vec::new();
    for doc in documents {
        for block in doc.code_blocks() {
            let Some(language) = block.language else {
                continue;
            };
            if aliases.iter().any(|a| a.eq_ignore_ascii_case(&language)) {
                examples.push(Example {
                    source: doc.path.clone(),
                    language,
                    code: block.code,
                    line: block.line,
                });
            }
        }
    }
    examples
}

pub fn extension_for(language: &str) -> &'static str {
    match language {
        "typescript" => "ts",
        "python" => "py",
        "javascript" => "js",
        "bash" | "sh" | "shell" => "sh",
        "sql" => "sql",
        "yaml" | "yml" => "yaml",
        "json" => "json",
        "go" => "go",
        "rust" => "rs",
        "solidity" => "sol",
        _ => "txt",
    }
}

fn pretty(value: &serde_json::Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

const PYTHON_REQUIREMENTS: &str = "pytest>=7.0.0\nmypy>=1.0.0\n";

const PYTHON_TEST_HARNESS: &str = r#"import subprocess
import sys
from pathlib import Path


def test_syntax():
    """All extracted examples compile."""
    examples_dir = Path(__file__).parent
    errors = []

    for py_file in sorted(examples_dir.glob("example_*.py")):
        result = subprocess.run(
            [sys.executable, "-m", "py_compile", str(py_file)],
            capture_output=True,
            text=True,
        )
        if result.returncode != 0:
            errors.append(f"{py_file.name}: {result.stderr}")

    assert not errors, "Syntax errors found:\n" + "\n".join(errors)
"#;

/// The language becomes a directory name, so only a plain name is accepted:
/// letters, digits and `-`, `_`, `+`, `#`.
pub fn check_language(language: &str) -> Result<()> {
    let plain = !language.is_empty()
        && language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#'));
    if plain {
        Ok(())
    } else {
        Err(SkillkitError::ValidationError {
            message: format!("invalid language '{}'", language),
        })
    }
}

/// Files for `<output>/<language>/`: examples, per-language scaffold and
/// `manifest.json`.
pub fn build_scaffold(
    language: &str,
    output: &str,
    examples: &[Example],
    source_files: usize,
) -> Result<(Vec<OutputFile>, Vec<String>)> {
    check_language(language)?;
    let dir = format!("{}/{}", output.trim_end_matches('/'), language);
    let mut files = Vec::new();
    let mut directories = vec![dir.clone()];

    match language {
        "typescript" => {
            let package = json!({
                "name": "skill-code-examples",
                "version": "1.0.0",
                "private": true,
                "scripts": { "test": "tsc --noEmit", "build": "tsc" },
                "devDependencies": { "typescript": "^5.0.0", "@types/node": "^20.0.0" }
            });
            let tsconfig = json!({
                "compilerOptions": {
                    "target": "ES2022",
                    "module": "commonjs",
                    "strict": false,
                    "esModuleInterop": true,
                    "skipLibCheck": true,
                    "noEmit": true,
                    "allowJs": true
                },
                "include": ["**/*.ts", "**/*.tsx"]
            });
            files.push(OutputFile::text(format!("{}/package.json", dir), pretty(&package)?));
            files.push(OutputFile::text(format!("{}/tsconfig.json", dir), pretty(&tsconfig)?));
            directories.push(format!("{}/test-results", dir));
        }
        "python" => {
            files.push(OutputFile::text(
                format!("{}/requirements.txt", dir),
                PYTHON_REQUIREMENTS,
            ));
            files.push(OutputFile::text(
                format!("{}/test_examples.py", dir),
                PYTHON_TEST_HARNESS,
            ));
            directories.push(format!("{}/test-results", dir));
        }
        _ => {}
    }

    let extension = extension_for(language);
    for (i, example) in examples.iter().enumerate() {
        files.push(OutputFile::text(
            format!("{}/example_{}.{}", dir, i + 1, extension),
            example.code.clone(),
        ));
    }

    let manifest = ExtractManifest {
        language,
        total_examples: examples.len(),
        source_files,
        examples: examples
            .iter()
            .map(|e| ExampleLocation {
                source: &e.source,
                line: e.line,
            })
            .collect(),
    };
    files.push(OutputFile::text(
        format!("{}/manifest.json", dir),
        serde_json::to_string_pretty(&manifest)?,
    ));

    Ok((files, directories))
}

pub struct ExtractPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    language: String,
    aliases: Vec<String>,
    output: String,
}

impl<S: Storage, C: ConfigProvider> ExtractPipeline<S, C> {
    pub fn new(
        storage: S,
        config: C,
        language: &str,
        alias_table: &BTreeMap<String, Vec<String>>,
        output: impl Into<String>,
    ) -> Self {
        let language = language.trim().to_lowercase();
        Self {
            aliases: aliases_for(&language, alias_table),
            language,
            storage,
            config,
            output: output.into(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ExtractPipeline<S, C> {
    fn name(&self) -> &str {
        "code example extraction"
    }

    async fn extract(&self) -> Result<Corpus> {
        corpus::load(&self.config).await
    }

    async fn transform(&self, corpus: Corpus) -> Result<Artifact> {
        check_language(&self.language)?;
        let examples = extract_examples(&corpus.documents, &self.aliases);
        tracing::info!(
            "🔎 Found {} {} code examples in {} files",
            examples.len(),
            self.language,
            corpus.len()
        );

        let (files, directories) =
            build_scaffold(&self.language, &self.output, &examples, corpus.len())?;

        Ok(Artifact {
            summary: format!(
                "Extracted {} examples to {}/{}",
                examples.len(),
                self.output.trim_end_matches('/'),
                self.language
            ),
            files,
            directories,
            findings: corpus.unreadable,
            stdout: None,
        })
    }

    async fn load(&self, artifact: Artifact) -> Result<RunSummary> {
        write_artifact(&self.storage, artifact).await
    }
}
