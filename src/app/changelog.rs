use crate::domain::model::Commit;
use crate::domain::ports::CommitHistory;
use crate::utils::error::Result;
use regex::Regex;
use std::sync::OnceLock;

const UNRELEASED_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeCategory {
    Features,
    BugFixes,
    Documentation,
    Refactoring,
    Tests,
    Maintenance,
    Other,
}

impl ChangeCategory {
    /// Output order of the sections within a release.
    pub const ALL: [ChangeCategory; 7] = [
        Self::Features,
        Self::BugFixes,
        Self::Documentation,
        Self::Refactoring,
        Self::Tests,
        Self::Maintenance,
        Self::Other,
    ];

    pub fn heading(self) -> &'static str {
        match self {
            Self::Features => "Features",
            Self::BugFixes => "Bug Fixes",
            Self::Documentation => "Documentation",
            Self::Refactoring => "Refactoring",
            Self::Tests => "Tests",
            Self::Maintenance => "Maintenance",
            Self::Other => "Other Changes",
        }
    }
}

fn add_word() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\badd(s|ed|ing)?\b").expect("add pattern is valid"))
}

pub fn categorize(message: &str) -> ChangeCategory {
    let lower = message.trim().to_lowercase();
    if lower.starts_with("feat") || add_word().is_match(&lower) {
        ChangeCategory::Features
    } else if lower.starts_with("fix") {
        ChangeCategory::BugFixes
    } else if lower.starts_with("docs") {
        ChangeCategory::Documentation
    } else if lower.starts_with("refactor") {
        ChangeCategory::Refactoring
    } else if lower.starts_with("test") {
        ChangeCategory::Tests
    } else if lower.starts_with("chore") || lower.starts_with("ci") {
        ChangeCategory::Maintenance
    } else {
        ChangeCategory::Other
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// `None` for unreleased commits.
    pub tag: Option<String>,
    pub date: Option<String>,
    pub commits: Vec<Commit>,
}

/// Commits in `range`, or none when git cannot list them (no commits yet,
/// not a repository).
async fn commits_or_empty<H: CommitHistory + ?Sized>(history: &H, range: &str) -> Vec<Commit> {
    match history.commits(range).await {
        Ok(commits) => commits,
        Err(e) => {
            tracing::warn!("⚠️ Cannot read commits for {}: {}", range, e);
            Vec::new()
        }
    }
}

/// Unreleased commits plus the `max_tags` newest tags that contain commits.
/// Git failures yield an empty history rather than an error.
pub async fn collect_releases<H: CommitHistory + ?Sized>(
    history: &H,
    max_tags: usize,
) -> Result<Vec<Release>> {
    let tags = match history.tags().await {
        Ok(tags) => tags,
        Err(e) => {
            tracing::warn!("⚠️ Cannot read tags: {}", e);
            Vec::new()
        }
    };
    let mut releases = Vec::new();

    if tags.is_empty() {
        let mut commits = commits_or_empty(history, "HEAD").await;
        commits.truncate(UNRELEASED_LIMIT);
        if !commits.is_empty() {
            releases.push(Release {
                tag: None,
                date: None,
                commits,
            });
        }
        return Ok(releases);
    }

    let mut unreleased = commits_or_empty(history, &format!("{}..HEAD", tags[0])).await;
    unreleased.truncate(UNRELEASED_LIMIT);
    if !unreleased.is_empty() {
        releases.push(Release {
            tag: None,
            date: None,
            commits: unreleased,
        });
    }

    for (i, tag) in tags.iter().take(max_tags).enumerate() {
        let range = match tags.get(i + 1) {
            Some(previous) => format!("{}..{}", previous, tag),
            None => tag.clone(),
        };
        let commits = commits_or_empty(history, &range).await;
        if commits.is_empty() {
            tracing::debug!("Tag {} has no commits of its own", tag);
            continue;
        }
        releases.push(Release {
            tag: Some(tag.clone()),
            date: commits.first().map(|c| c.date.clone()),
            commits,
        });
    }

    Ok(releases)
}

pub fn render(releases: &[Release]) -> String {
    let mut lines = vec![
        "# Changelog\n".to_string(),
        "All notable changes to this project will be documented in this file.\n".to_string(),
    ];

    for release in releases {
        match (&release.tag, &release.date) {
            (Some(tag), Some(date)) => lines.push(format!("\n## [{}] - {}\n", tag, date)),
            (Some(tag), None) => lines.push(format!("\n## [{}]\n", tag)),
            (None, _) => lines.push("\n## Unreleased\n".to_string()),
        }

        for category in ChangeCategory::ALL {
            let entries: Vec<&Commit> = release
                .commits
                .iter()
                .filter(|c| categorize(&c.message) == category)
                .collect();
            if entries.is_empty() {
                continue;
            }
            lines.push(format!("\n### {}\n", category.heading()));
            for commit in entries {
                lines.push(format!("- {} ({})", commit.message, commit.hash));
            }
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::SkillkitError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FakeHistory {
        tags: Vec<String>,
        ranges: HashMap<String, Vec<Commit>>,
    }

    #[async_trait]
    impl CommitHistory for FakeHistory {
        async fn tags(&self) -> Result<Vec<String>> {
            Ok(self.tags.clone())
        }

        async fn commits(&self, range: &str) -> Result<Vec<Commit>> {
            Ok(self.ranges.get(range).cloned().unwrap_or_default())
        }

        async fn latest_tag(&self) -> Result<String> {
            Ok(self.tags.first().cloned().unwrap_or_default())
        }

        async fn head_subject(&self) -> Result<String> {
            Ok(String::new())
        }
    }

    struct BrokenHistory;

    #[async_trait]
    impl CommitHistory for BrokenHistory {
        async fn tags(&self) -> Result<Vec<String>> {
            Err(SkillkitError::GitError {
                message: "git tag failed: fatal: not a git repository".to_string(),
            })
        }

        async fn commits(&self, _range: &str) -> Result<Vec<Commit>> {
            Err(SkillkitError::GitError {
                message: "git log failed: fatal: your current branch does not have any commits yet"
                    .to_string(),
            })
        }

        async fn latest_tag(&self) -> Result<String> {
            Ok(String::new())
        }

        async fn head_subject(&self) -> Result<String> {
            Ok(String::new())
        }
    }

    fn commit(hash: &str, message: &str, date: &str) -> Commit {
        Commit {
            hash: hash.to_string(),
            message: message.to_string(),
            author: "dev".to_string(),
            date: date.to_string(),
        }
    }

    #[test]
    fn test_categorize() {
        assert_eq!(categorize("feat(kafka): consumer groups"), ChangeCategory::Features);
        assert_eq!(categorize("Add retry skill"), ChangeCategory::Features);
        assert_eq!(categorize("Added NFT section"), ChangeCategory::Features);
        assert_eq!(categorize("fix: typo in address handling"), ChangeCategory::BugFixes);
        assert_eq!(categorize("docs: padding guide"), ChangeCategory::Documentation);
        assert_eq!(categorize("refactor layout"), ChangeCategory::Refactoring);
        assert_eq!(categorize("tests for ladder"), ChangeCategory::Tests);
        assert_eq!(categorize("ci: cache"), ChangeCategory::Maintenance);
        assert_eq!(categorize("chore: bump"), ChangeCategory::Maintenance);
        assert_eq!(categorize("Update README with address book"), ChangeCategory::Other);
    }

    #[tokio::test]
    async fn test_no_tags_gives_single_unreleased_section() {
        let commits: Vec<Commit> = (0..60)
            .map(|i| commit(&format!("{:07}", i), "misc", "2026-01-01"))
            .collect();
        let history = FakeHistory {
            tags: vec![],
            ranges: HashMap::from([("HEAD".to_string(), commits)]),
        };

        let releases = collect_releases(&history, 5).await.unwrap();
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].tag, None);
        assert_eq!(releases[0].commits.len(), 50);
    }

    #[tokio::test]
    async fn test_tags_with_unreleased_and_limit() {
        let history = FakeHistory {
            tags: vec!["v1.2.0".into(), "v1.1.0".into(), "v1.0.0".into()],
            ranges: HashMap::from([
                ("v1.2.0..HEAD".to_string(), vec![commit("ccccccc", "fix: link", "2026-02-03")]),
                (
                    "v1.1.0..v1.2.0".to_string(),
                    vec![
                        commit("bbbbbbb", "feat: kafka", "2026-02-01"),
                        commit("bbbbbb0", "docs: intro", "2026-01-30"),
                    ],
                ),
                ("v1.0.0..v1.1.0".to_string(), vec![commit("aaaaaaa", "chore", "2026-01-10")]),
                ("v1.0.0".to_string(), vec![commit("0000000", "initial", "2026-01-01")]),
            ]),
        };

        let releases = collect_releases(&history, 2).await.unwrap();
        let tags: Vec<Option<&str>> = releases.iter().map(|r| r.tag.as_deref()).collect();
        assert_eq!(tags, vec![None, Some("v1.2.0"), Some("v1.1.0")]);
        assert_eq!(releases[1].date.as_deref(), Some("2026-02-01"));

        let markdown = render(&releases);
        assert!(markdown.starts_with("# Changelog\n\nAll notable changes"));
        assert!(markdown.contains("\n## Unreleased\n\n\n### Bug Fixes\n\n- fix: link (ccccccc)"));
        assert!(markdown.contains("## [v1.2.0] - 2026-02-01"));
        let features = markdown.find("### Features").unwrap();
        let docs = markdown.find("### Documentation").unwrap();
        assert!(features < docs);
        assert!(!markdown.contains("v1.0.0"));
    }

    #[tokio::test]
    async fn test_git_failure_gives_header_only_changelog() {
        let releases = collect_releases(&BrokenHistory, 10).await.unwrap();
        assert!(releases.is_empty());

        let markdown = render(&releases);
        assert!(markdown.starts_with("# Changelog\n"));
        assert!(!markdown.contains("## Unreleased"));
    }
}
