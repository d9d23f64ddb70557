use crate::core::markdown;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numbered topic directory such as `08-messaging-queue`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub number: u32,
    pub slug: String,
    pub name: String,
}

impl Category {
    pub fn uncategorized() -> Self {
        Self {
            number: 0,
            slug: "uncategorized".to_string(),
            name: "Uncategorized".to_string(),
        }
    }

    /// `08-messaging-queue`, used for grouping and ordering.
    pub fn key(&self) -> String {
        format!("{:02}-{}", self.number, self.slug)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub code: String,
    /// 1-based line of the opening fence.
    pub line: usize,
    pub terminated: bool,
}

#[derive(Debug, Clone)]
pub struct SkillDocument {
    /// Relative to the corpus root, always `/`-separated.
    pub path: String,
    pub skill_name: String,
    pub category: Category,
    pub content: String,
}

impl SkillDocument {
    pub fn title(&self) -> String {
        markdown::title(&self.content)
    }

    pub fn code_blocks(&self) -> Vec<CodeBlock> {
        markdown::code_blocks(&self.content)
    }

    pub fn has_section(&self, name: &str) -> bool {
        markdown::has_section(&self.content, name)
    }

    pub fn has_checklist(&self) -> bool {
        markdown::has_checklist(&self.content)
    }

    pub fn word_count(&self) -> usize {
        markdown::word_count(&self.content)
    }

    pub fn line_count(&self) -> usize {
        markdown::line_count(&self.content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    MissingSection,
    NoCodeExamples,
    NoChecklist,
    UnterminatedFence,
    InvalidSnippet,
    Unreadable,
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::MissingSection => "missing section",
            Self::NoCodeExamples => "no code examples",
            Self::NoChecklist => "no checklist",
            Self::UnterminatedFence => "unterminated code fence",
            Self::InvalidSnippet => "invalid snippet",
            Self::Unreadable => "unreadable file",
        };
        f.write_str(label)
    }
}

/// One problem found in one skill file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub path: String,
    pub kind: FindingKind,
    pub message: String,
}

impl Finding {
    pub fn new(path: impl Into<String>, kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Documents loaded from disk plus the files that could not be read.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub documents: Vec<SkillDocument>,
    pub unreadable: Vec<Finding>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// One commit as reported by `git log`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Abbreviated to seven characters.
    pub hash: String,
    pub message: String,
    pub author: String,
    /// `YYYY-MM-DD`
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Relative to the storage base.
    pub path: String,
    pub contents: Vec<u8>,
}

impl OutputFile {
    pub fn text(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into().into_bytes(),
        }
    }
}

/// What a pipeline's transform step produced.
#[derive(Debug, Clone, Default)]
pub struct Artifact {
    pub files: Vec<OutputFile>,
    /// Directories to create even when empty (e.g. `test-results/`).
    pub directories: Vec<String>,
    /// Printed to stdout by the load step.
    pub stdout: Option<String>,
    pub findings: Vec<Finding>,
    pub summary: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub message: String,
    pub written: Vec<String>,
    pub findings: Vec<Finding>,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}
