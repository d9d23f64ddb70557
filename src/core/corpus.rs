use crate::domain::model::{Category, Corpus, Finding, FindingKind, SkillDocument};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, SkillkitError};
use crate::utils::text::title_case;
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use walkdir::{DirEntry, WalkDir};

fn category_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+)-(.+)$").expect("category pattern is valid"))
}

fn is_ignored(entry: &DirEntry, ignore_dirs: &[String]) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || ignore_dirs.iter().any(|d| d == name.as_ref())
}

/// Every skill file under `root`, sorted by path.
pub fn discover(root: &Path, file_name: &str, ignore_dirs: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(SkillkitError::corpus(
            root.display().to_string(),
            "corpus root is not a directory",
        ));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_ignored(e, ignore_dirs));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() > 0 => {
                tracing::warn!("⚠️ Skipping unreadable entry: {}", e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if entry.file_type().is_file() && entry.file_name() == file_name {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// `/`-separated path relative to the corpus root.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<String>>()
        .join("/")
}

/// Category from the first `NN-slug` component of a relative path.
pub fn category_for(relative: &str) -> Category {
    for part in relative.split('/') {
        if let Some(caps) = category_pattern().captures(part) {
            if let Ok(number) = caps[1].parse::<u32>() {
                let slug = caps[2].to_string();
                return Category {
                    number,
                    name: title_case(&slug),
                    slug,
                };
            }
        }
    }
    Category::uncategorized()
}

/// Directory holding the skill file; the file stem for a root-level file.
pub fn skill_name_for(relative: &str) -> String {
    let mut parts: Vec<&str> = relative.split('/').collect();
    let file = parts.pop().unwrap_or_default();
    match parts.last() {
        Some(dir) => dir.to_string(),
        None => Path::new(file)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

pub async fn load_document(root: &Path, path: &Path) -> Result<SkillDocument> {
    let relative = relative_path(root, path);
    let bytes = tokio::fs::read(path).await?;
    let content = String::from_utf8(bytes)
        .map_err(|_| SkillkitError::corpus(relative.clone(), "file is not valid UTF-8"))?;

    Ok(SkillDocument {
        category: category_for(&relative),
        skill_name: skill_name_for(&relative),
        path: relative,
        content,
    })
}

/// Number of skill files under the corpus root, readable or not.
pub fn count<C: ConfigProvider + ?Sized>(config: &C) -> Result<usize> {
    let paths = discover(config.corpus_root(), config.skill_file_name(), config.ignore_dirs())?;
    Ok(paths.len())
}

/// Reads every skill file. Unreadable files become findings instead of
/// aborting the run.
pub async fn load<C: ConfigProvider + ?Sized>(config: &C) -> Result<Corpus> {
    let root = config.corpus_root();
    let paths = discover(root, config.skill_file_name(), config.ignore_dirs())?;
    tracing::debug!("Discovered {} skill files under {}", paths.len(), root.display());

    let mut corpus = Corpus::default();
    for path in paths {
        match load_document(root, &path).await {
            Ok(doc) => corpus.documents.push(doc),
            Err(e) => {
                let relative = relative_path(root, &path);
                tracing::warn!("⚠️ Could not read {}: {}", relative, e);
                corpus.unreadable.push(Finding::new(
                    relative,
                    FindingKind::Unreadable,
                    format!("Could not read file: {}", e),
                ));
            }
        }
    }

    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_category_for() {
        let category = category_for("40-system-resilience/retry-timeout-strategies/SKILL.md");
        assert_eq!(category.number, 40);
        assert_eq!(category.slug, "system-resilience");
        assert_eq!(category.name, "System Resilience");

        assert_eq!(category_for("misc/SKILL.md"), Category::uncategorized());
        assert_eq!(category_for("skills/08-messaging-queue/kafka/SKILL.md").number, 8);
    }

    #[test]
    fn test_skill_name_for() {
        assert_eq!(skill_name_for("02-frontend/tailwind/SKILL.md"), "tailwind");
        assert_eq!(skill_name_for("SKILL.md"), "SKILL");
    }

    #[test]
    fn test_discover_skips_ignored_and_hidden_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "02-frontend/tailwind/SKILL.md", "# Tailwind");
        write(root, "08-messaging-queue/kafka/SKILL.md", "# Kafka");
        write(root, "node_modules/pkg/SKILL.md", "# ignored");
        write(root, ".github/SKILL.md", "# hidden");
        write(root, "02-frontend/tailwind/README.md", "# not a skill");

        let found = discover(root, "SKILL.md", &["node_modules".to_string()]).unwrap();
        let relative: Vec<String> = found.iter().map(|p| relative_path(root, p)).collect();
        assert_eq!(
            relative,
            vec![
                "02-frontend/tailwind/SKILL.md",
                "08-messaging-queue/kafka/SKILL.md"
            ]
        );
    }

    #[test]
    fn test_discover_missing_root_is_corpus_error() {
        let err = discover(Path::new("/definitely/not/here"), "SKILL.md", &[]).unwrap_err();
        assert_eq!(err.category(), crate::utils::error::ErrorCategory::Corpus);
    }

    #[tokio::test]
    async fn test_load_document_reports_non_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("01-foundations/bad/SKILL.md");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = load_document(dir.path(), &path).await.unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }

    #[tokio::test]
    async fn test_count_includes_unreadable_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "02-frontend/tailwind/SKILL.md", "# Tailwind");
        let bad = dir.path().join("01-foundations/bad/SKILL.md");
        std::fs::create_dir_all(bad.parent().unwrap()).unwrap();
        std::fs::write(&bad, [0xff, 0xfe, 0x00]).unwrap();

        let mut config = crate::config::toml_config::SkillkitConfig::default();
        config.corpus.root = dir.path().to_path_buf();

        let corpus = load(&config).await.unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.unreadable.len(), 1);
        assert_eq!(count(&config).unwrap(), 2);
    }
}
