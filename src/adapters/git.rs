use crate::domain::model::Commit;
use crate::domain::ports::CommitHistory;
use crate::utils::error::{Result, SkillkitError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

const FIELD_SEP: char = '\u{1f}';
const LOG_FORMAT: &str = "--pretty=format:%H%x1f%s%x1f%an%x1f%ad";

/// `git` CLI wrapper rooted at a working directory.
pub struct GitHistory {
    working_dir: PathBuf,
    timeout: Duration,
}

impl GitHistory {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            timeout: Duration::from_secs(30),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        tracing::debug!("Running git {:?} in {}", args, self.working_dir.display());

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.working_dir)
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| SkillkitError::GitError {
                message: format!("git {} timed out", args.join(" ")),
            })?
            .map_err(|e| SkillkitError::GitError {
                message: format!("cannot run git: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SkillkitError::GitError {
                message: format!("git {} failed: {}", args.join(" "), stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

pub fn parse_log(output: &str) -> Vec<Commit> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let mut parts = line.splitn(4, FIELD_SEP);
            let hash = parts.next()?;
            let message = parts.next()?;
            let author = parts.next()?;
            let date = parts.next()?;
            Some(Commit {
                hash: hash.chars().take(7).collect(),
                message: message.to_string(),
                author: author.to_string(),
                date: date.trim().to_string(),
            })
        })
        .collect()
}

#[async_trait]
impl CommitHistory for GitHistory {
    async fn tags(&self) -> Result<Vec<String>> {
        let out = self.run(&["tag", "--sort=-creatordate"]).await?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect())
    }

    async fn commits(&self, range: &str) -> Result<Vec<Commit>> {
        let out = self.run(&["log", range, LOG_FORMAT, "--date=short"]).await?;
        Ok(parse_log(&out))
    }

    async fn latest_tag(&self) -> Result<String> {
        Ok(self
            .run(&["describe", "--tags", "--abbrev=0"])
            .await?
            .trim()
            .to_string())
    }

    async fn head_subject(&self) -> Result<String> {
        Ok(self.run(&["log", "-1", "--pretty=format:%s"]).await?.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log() {
        let output = "0123456789abcdef\u{1f}feat: add kafka | streams\u{1f}Ada\u{1f}2026-01-05\n\nbroken line\n";
        let commits = parse_log(output);

        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].hash, "0123456");
        assert_eq!(commits[0].message, "feat: add kafka | streams");
        assert_eq!(commits[0].author, "Ada");
        assert_eq!(commits[0].date, "2026-01-05");
    }

    #[tokio::test]
    async fn test_outside_repository_is_git_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let history = GitHistory::new(dir.path());
        let result = history.tags().await;
        assert!(matches!(result, Err(SkillkitError::GitError { .. })));
        if let Err(e) = result {
            assert_eq!(e.category(), crate::utils::error::ErrorCategory::External);
        }
    }
}
