use anyhow::Result;
use skillkit::app::manifest::Manifest;
use skillkit::app::validate::OutputFormat;
use skillkit::app::{ExtractPipeline, ReadmePipeline, ReportPipeline, ScanPipeline, ValidatePipeline};
use skillkit::domain::model::FindingKind;
use skillkit::{Engine, LocalStorage, SkillkitConfig};
use std::path::Path;
use tempfile::TempDir;

const COMPLETE_SKILL: &str = r#"# Tailwind Patterns

## Overview

Utility-first styling.

## Best Practices

```typescript
const cls: string = "p-4";
```

```python
print("hi")
```

## Checklist

- [ ] Purge unused classes
"#;

const INCOMPLETE_SKILL: &str = r#"# Kafka Streams

## Overview

Consumers and producers.

```ts
const topic = "orders";
"#;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Two categories, one clean skill and one with problems.
fn corpus() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "02-frontend/tailwind/SKILL.md", COMPLETE_SKILL);
    write(dir.path(), "08-messaging-queue/kafka/SKILL.md", INCOMPLETE_SKILL);
    write(dir.path(), "node_modules/pkg/SKILL.md", "# ignored");
    write(dir.path(), "README.md", "# Skills\n\nIntro text.\n\n<!-- SKILLS-START -->\nold\n<!-- SKILLS-END -->\n\nFooter.\n");
    dir
}

fn config_for(root: &Path) -> SkillkitConfig {
    let mut config = SkillkitConfig::default();
    config.corpus.root = root.to_path_buf();
    config
}

#[tokio::test]
async fn test_scan_writes_sorted_manifest() -> Result<()> {
    let corpus = corpus();
    let out = TempDir::new()?;

    let pipeline = ScanPipeline::new(
        LocalStorage::new(out.path()),
        config_for(corpus.path()),
        Some("skills.json".to_string()),
    );
    let summary = Engine::new(pipeline).run().await?;
    assert!(summary.is_clean());

    let manifest = Manifest::load(&out.path().join("skills.json")).await?;
    assert_eq!(manifest.total, 2);
    assert_eq!(manifest.skills[0].path, "02-frontend/tailwind/SKILL.md");
    assert_eq!(manifest.skills[0].title, "Tailwind Patterns");
    assert!(manifest.skills[0].has_best_practices);
    assert!(!manifest.skills[1].has_best_practices);
    assert_eq!(manifest.statistics.total_categories, 2);
    Ok(())
}

#[tokio::test]
async fn test_validate_reports_problems_per_file() -> Result<()> {
    let corpus = corpus();
    let out = TempDir::new()?;

    let pipeline = ValidatePipeline::new(
        LocalStorage::new(out.path()),
        config_for(corpus.path()),
        false,
        OutputFormat::Json,
    );
    let summary = Engine::new(pipeline).run().await?;

    assert!(!summary.is_clean());
    assert!(summary
        .findings
        .iter()
        .all(|f| f.path == "08-messaging-queue/kafka/SKILL.md"));
    let kinds: Vec<FindingKind> = summary.findings.iter().map(|f| f.kind).collect();
    assert!(kinds.contains(&FindingKind::MissingSection));
    assert!(kinds.contains(&FindingKind::UnterminatedFence));
    assert!(kinds.contains(&FindingKind::NoChecklist));
    Ok(())
}

#[tokio::test]
async fn test_validate_sections_only_ignores_structure() -> Result<()> {
    let corpus = corpus();
    let mut config = config_for(corpus.path());
    config.rules.required_sections = vec!["Overview".to_string()];

    let pipeline = ValidatePipeline::new(LocalStorage::new(corpus.path()), config, true, OutputFormat::Text);
    let summary = Engine::new(pipeline).run().await?;
    assert!(summary.is_clean());
    Ok(())
}

#[tokio::test]
async fn test_extract_typescript_scaffold() -> Result<()> {
    let corpus = corpus();
    let out = TempDir::new()?;
    let config = config_for(corpus.path());
    let aliases = config.language_aliases();

    let pipeline = ExtractPipeline::new(
        LocalStorage::new(out.path()),
        config,
        "TypeScript",
        &aliases,
        "extracted-examples",
    );
    Engine::new(pipeline).run().await?;

    let dir = out.path().join("extracted-examples/typescript");
    assert!(dir.join("package.json").is_file());
    assert!(dir.join("tsconfig.json").is_file());
    assert!(dir.join("test-results").is_dir());
    assert_eq!(
        std::fs::read_to_string(dir.join("example_1.ts"))?.trim(),
        r#"const cls: string = "p-4";"#
    );
    assert!(dir.join("example_2.ts").is_file());
    assert!(!dir.join("example_3.ts").exists());

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("manifest.json"))?)?;
    assert_eq!(manifest["total_examples"], 2);
    Ok(())
}

#[tokio::test]
async fn test_extract_rejects_language_with_path_segments() -> Result<()> {
    let corpus = corpus();
    let out = TempDir::new()?;
    let output = out.path().join("nested/extracted-examples");
    let config = config_for(corpus.path());
    let aliases = config.language_aliases();

    let pipeline = ExtractPipeline::new(
        LocalStorage::new(out.path()),
        config,
        "../escaped",
        &aliases,
        "nested/extracted-examples",
    );
    assert!(Engine::new(pipeline).run().await.is_err());
    assert!(!out.path().join("nested/escaped").exists());
    assert!(!output.exists());
    Ok(())
}

#[tokio::test]
async fn test_readme_section_is_replaced_in_place() -> Result<()> {
    let corpus = corpus();
    let config = config_for(corpus.path());
    let readme = config.readme.clone();

    let pipeline = ReadmePipeline::new(LocalStorage::new(corpus.path()), config, readme, None);
    Engine::new(pipeline).run().await?;

    let updated = std::fs::read_to_string(corpus.path().join("README.md"))?;
    assert!(updated.starts_with("# Skills\n\nIntro text.\n\n<!-- SKILLS-START -->\n## Skills Overview"));
    assert!(updated.contains("**Total Skills:** 2"));
    assert!(updated.contains("| [tailwind](02-frontend/tailwind/SKILL.md) | Tailwind Patterns |"));
    assert!(updated.trim_end().ends_with("<!-- SKILLS-END -->\n\nFooter."));
    assert!(!updated.contains("\nold\n"));
    Ok(())
}

#[tokio::test]
async fn test_report_writes_html() -> Result<()> {
    let corpus = corpus();
    let out = TempDir::new()?;

    let pipeline = ReportPipeline::new(
        LocalStorage::new(out.path()),
        config_for(corpus.path()),
        "validation-report.html",
    );
    let summary = Engine::new(pipeline).run().await?;
    assert_eq!(summary.written.len(), 1);

    let html = std::fs::read_to_string(out.path().join("validation-report.html"))?;
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("08-messaging-queue/kafka/SKILL.md"));
    Ok(())
}

#[tokio::test]
async fn test_missing_corpus_root_is_corpus_error() {
    let pipeline = ScanPipeline::new(
        LocalStorage::new("."),
        config_for(Path::new("/nonexistent/skills")),
        None,
    );
    let err = Engine::new(pipeline).run().await.unwrap_err();
    assert_eq!(err.exit_code(), 1);
}
