use crate::domain::model::{Artifact, Commit, Corpus, RunSummary};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn create_dir(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
    /// Human-readable location of `path`, for log and summary lines.
    fn display_path(&self, path: &str) -> String;
}

/// Where the corpus lives and which structural rules apply to it.
pub trait ConfigProvider: Send + Sync {
    fn corpus_root(&self) -> &Path;
    fn skill_file_name(&self) -> &str;
    fn ignore_dirs(&self) -> &[String];
    fn required_sections(&self) -> &[String];
    fn require_code_examples(&self) -> bool;
    fn require_checklist(&self) -> bool;
}

/// Corpus command in three steps: read the skill files, derive an artifact,
/// write or print it.
#[async_trait]
pub trait Pipeline: Send + Sync {
    fn name(&self) -> &str;
    async fn extract(&self) -> Result<Corpus>;
    async fn transform(&self, corpus: Corpus) -> Result<Artifact>;
    async fn load(&self, artifact: Artifact) -> Result<RunSummary>;
}

/// Text-completion backend used to draft skill documents.
#[async_trait]
pub trait MessagesClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Read-only view of the repository history.
#[async_trait]
pub trait CommitHistory: Send + Sync {
    /// Newest first.
    async fn tags(&self) -> Result<Vec<String>>;
    /// Commits in a `git log` revision range, newest first.
    async fn commits(&self, range: &str) -> Result<Vec<Commit>>;
    /// Most recent tag reachable from HEAD.
    async fn latest_tag(&self) -> Result<String>;
    async fn head_subject(&self) -> Result<String>;
}
