use crate::config::profiles::{builtin_categories, builtin_profiles, ProjectProfile};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, SkillkitError};
use crate::utils::retry::RetryPolicy;
use crate::utils::validation::{
    is_configured, validate_non_empty_string, validate_path, validate_positive_number,
    validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "skillkit.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillkitConfig {
    pub corpus: CorpusConfig,
    pub rules: RulesConfig,
    /// Canonical language → fence aliases, e.g. `typescript = ["typescript", "ts", "tsx"]`.
    pub languages: Option<BTreeMap<String, Vec<String>>>,
    pub code_check: CodeCheckConfig,
    pub readme: ReadmeConfig,
    pub stats: StatsConfig,
    pub notify: NotifyConfig,
    pub gaps: GapsConfig,
    pub generator: GeneratorConfig,
    pub projects: Option<Vec<ProjectProfile>>,
    pub categories: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub root: PathBuf,
    pub file_name: String,
    pub ignore_dirs: Vec<String>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            file_name: "SKILL.md".to_string(),
            ignore_dirs: [".git", "node_modules", "target", "dist", "build", "__pycache__"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub required_sections: Vec<String>,
    /// Reported in the HTML report, never enforced.
    pub optional_sections: Vec<String>,
    pub require_code_examples: bool,
    pub require_checklist: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            required_sections: vec!["Overview".to_string(), "Best Practices".to_string()],
            optional_sections: ["Code Examples", "Common Patterns", "Troubleshooting", "References"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            require_code_examples: true,
            require_checklist: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalValidator {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeCheckConfig {
    pub timeout_seconds: u64,
    /// Replaces the default python/bash validators when set.
    pub validators: Option<BTreeMap<String, ExternalValidator>>,
}

impl Default for CodeCheckConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            validators: None,
        }
    }
}

impl CodeCheckConfig {
    pub fn validators(&self) -> BTreeMap<String, ExternalValidator> {
        if let Some(validators) = &self.validators {
            return validators.clone();
        }

        let python = ExternalValidator {
            command: "python3".to_string(),
            args: vec![
                "-c".to_string(),
                "import ast,sys; ast.parse(sys.stdin.read())".to_string(),
            ],
        };
        let bash = ExternalValidator {
            command: "bash".to_string(),
            args: vec!["-n".to_string()],
        };

        let mut defaults = BTreeMap::new();
        defaults.insert("python".to_string(), python.clone());
        defaults.insert("py".to_string(), python);
        defaults.insert("bash".to_string(), bash.clone());
        defaults.insert("sh".to_string(), bash);
        defaults
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadmeConfig {
    pub path: String,
    pub title: String,
    pub start_marker: String,
    pub end_marker: String,
}

impl Default for ReadmeConfig {
    fn default() -> Self {
        Self {
            path: "README.md".to_string(),
            title: "Claude Skills Collection".to_string(),
            start_marker: "<!-- SKILLS-START -->".to_string(),
            end_marker: "<!-- SKILLS-END -->".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub title: String,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            title: "Skills Repository Statistics".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub repository: String,
    pub discord_webhook: Option<String>,
    pub slack_webhook: Option<String>,
    pub timeout_seconds: u64,
    pub retry: RetryPolicy,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            repository: "cerebratechai/claude-skills".to_string(),
            discord_webhook: None,
            slack_webhook: None,
            timeout_seconds: 30,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GapsConfig {
    /// Relative to the corpus root.
    pub index_path: String,
    pub report_name: String,
    pub poll_interval_seconds: u64,
    /// Libraries never reported as gaps.
    pub noise: Vec<String>,
    /// Replaces the built-in library → skill table when set.
    pub mapping: Option<BTreeMap<String, String>>,
}

impl Default for GapsConfig {
    fn default() -> Self {
        Self {
            index_path: "SKILL_INDEX.md".to_string(),
            report_name: "GAP_REPORT.md".to_string(),
            poll_interval_seconds: 10,
            noise: vec!["react-dom".to_string(), "react-scripts".to_string()],
            mapping: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub prompts_file: String,
    pub state_file: String,
    pub report_file: String,
    pub delay_seconds: u64,
    pub timeout_seconds: u64,
    pub retry: RetryPolicy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.anthropic.com".to_string(),
            api_key: None,
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 8000,
            prompts_file: "tools/prompts.json".to_string(),
            state_file: "tools/generation_state.json".to_string(),
            report_file: "generation_report.html".to_string(),
            delay_seconds: 5,
            timeout_seconds: 300,
            retry: RetryPolicy::default(),
        }
    }
}

impl SkillkitConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            SkillkitError::config(format!(
                "cannot read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        let config = toml::from_str(&processed_content)?;
        Ok(config)
    }

    /// Explicit path must exist; otherwise `<root>/skillkit.toml` is used when
    /// present and built-in defaults when not.
    pub fn load(explicit: Option<&Path>, root: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                Self::from_file(path)?
            }
            None => {
                let candidate = root
                    .unwrap_or_else(|| Path::new("."))
                    .join(DEFAULT_CONFIG_FILE);
                if candidate.is_file() {
                    tracing::info!("📁 Loading configuration from: {}", candidate.display());
                    Self::from_file(&candidate)?
                } else {
                    tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };

        if let Some(root) = root {
            config.corpus.root = root.to_path_buf();
        }
        Ok(config)
    }

    /// 替換環境變數 (例如 ${SLACK_WEBHOOK_URL})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| SkillkitError::config(format!("invalid substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn language_aliases(&self) -> BTreeMap<String, Vec<String>> {
        if let Some(languages) = &self.languages {
            return languages.clone();
        }
        let mut defaults = BTreeMap::new();
        defaults.insert(
            "typescript".to_string(),
            vec!["typescript".into(), "ts".into(), "tsx".into()],
        );
        defaults.insert("python".to_string(), vec!["python".into(), "py".into()]);
        defaults.insert(
            "javascript".to_string(),
            vec!["javascript".into(), "js".into(), "jsx".into()],
        );
        defaults
    }

    pub fn projects(&self) -> Vec<ProjectProfile> {
        self.projects.clone().unwrap_or_else(builtin_profiles)
    }

    pub fn categories(&self) -> BTreeMap<String, String> {
        self.categories.clone().unwrap_or_else(builtin_categories)
    }

    pub fn gap_mapping(&self) -> BTreeMap<String, String> {
        self.gaps
            .mapping
            .clone()
            .unwrap_or_else(crate::app::gaps::builtin_mapping)
    }

    /// Webhook URL from the config file, falling back to the environment.
    pub fn discord_webhook(&self) -> Option<String> {
        Self::webhook(self.notify.discord_webhook.as_deref(), "DISCORD_WEBHOOK_URL")
    }

    pub fn slack_webhook(&self) -> Option<String> {
        Self::webhook(self.notify.slack_webhook.as_deref(), "SLACK_WEBHOOK_URL")
    }

    fn webhook(configured: Option<&str>, env_var: &str) -> Option<String> {
        if is_configured(configured) {
            return configured.map(|s| s.trim().to_string());
        }
        std::env::var(env_var)
            .ok()
            .filter(|v| is_configured(Some(v.as_str())))
    }

    pub fn api_key(&self) -> Option<String> {
        if is_configured(self.generator.api_key.as_deref()) {
            return self.generator.api_key.clone();
        }
        std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|v| is_configured(Some(v.as_str())))
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("corpus.file_name", &self.corpus.file_name)?;
        validate_path("readme.path", &self.readme.path)?;
        validate_non_empty_string("readme.start_marker", &self.readme.start_marker)?;
        validate_non_empty_string("readme.end_marker", &self.readme.end_marker)?;
        if self.readme.start_marker == self.readme.end_marker {
            return Err(SkillkitError::InvalidConfigValueError {
                field: "readme.end_marker".to_string(),
                value: self.readme.end_marker.clone(),
                reason: "start and end markers must differ".to_string(),
            });
        }

        for section in &self.rules.required_sections {
            validate_non_empty_string("rules.required_sections", section)?;
        }

        validate_positive_number("code_check.timeout_seconds", self.code_check.timeout_seconds, 1)?;
        for (language, validator) in self.code_check.validators() {
            validate_non_empty_string(
                &format!("code_check.validators.{}.command", language),
                &validator.command,
            )?;
        }

        validate_positive_number("gaps.poll_interval_seconds", self.gaps.poll_interval_seconds, 1)?;
        validate_path("gaps.report_name", &self.gaps.report_name)?;

        if let Some(url) = self.notify.discord_webhook.as_deref().filter(|u| is_configured(Some(u))) {
            validate_url("notify.discord_webhook", url)?;
        }
        if let Some(url) = self.notify.slack_webhook.as_deref().filter(|u| is_configured(Some(u))) {
            validate_url("notify.slack_webhook", url)?;
        }
        validate_positive_number("notify.timeout_seconds", self.notify.timeout_seconds, 1)?;
        self.notify.retry.validate()?;

        validate_url("generator.api_base", &self.generator.api_base)?;
        validate_non_empty_string("generator.model", &self.generator.model)?;
        validate_positive_number("generator.max_tokens", self.generator.max_tokens as u64, 1)?;
        validate_positive_number("generator.timeout_seconds", self.generator.timeout_seconds, 1)?;
        self.generator.retry.validate()?;

        Ok(())
    }
}

impl ConfigProvider for SkillkitConfig {
    fn corpus_root(&self) -> &Path {
        &self.corpus.root
    }

    fn skill_file_name(&self) -> &str {
        &self.corpus.file_name
    }

    fn ignore_dirs(&self) -> &[String] {
        &self.corpus.ignore_dirs
    }

    fn required_sections(&self) -> &[String] {
        &self.rules.required_sections
    }

    fn require_code_examples(&self) -> bool {
        self.rules.require_code_examples
    }

    fn require_checklist(&self) -> bool {
        self.rules.require_checklist
    }
}

impl Validate for SkillkitConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SkillkitConfig::from_toml_str("").unwrap();
        assert_eq!(config.corpus.file_name, "SKILL.md");
        assert_eq!(config.required_sections(), ["Overview", "Best Practices"]);
        assert!(config.require_checklist());
        assert_eq!(config.code_check.timeout_seconds, 10);
        assert_eq!(config.projects().len(), 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
[corpus]
root = "skills"
ignore_dirs = [".git"]

[rules]
required_sections = ["Overview"]
require_checklist = false

[languages]
rust = ["rust", "rs"]

[code_check.validators.python]
command = "python"
args = ["-m", "py_compile", "-"]

[notify.retry]
max_retries = 1
"#;

        let config = SkillkitConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.corpus.root, PathBuf::from("skills"));
        assert_eq!(config.corpus.file_name, "SKILL.md");
        assert_eq!(config.required_sections(), ["Overview"]);
        assert!(!config.require_checklist());
        assert!(config.require_code_examples());
        assert_eq!(config.language_aliases().len(), 1);
        assert_eq!(config.code_check.validators().len(), 1);
        assert_eq!(config.notify.retry.max_retries, 1);
        assert_eq!(config.notify.retry.initial_delay_ms, 1000);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SKILLKIT_TEST_SLACK_URL", "https://hooks.slack.com/services/T0/B0/x");

        let toml_content = r#"
[notify]
slack_webhook = "${SKILLKIT_TEST_SLACK_URL}"
discord_webhook = "${SKILLKIT_TEST_UNSET_DISCORD}"
"#;

        let config = SkillkitConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.notify.slack_webhook.as_deref(),
            Some("https://hooks.slack.com/services/T0/B0/x")
        );
        assert_eq!(
            config.notify.discord_webhook.as_deref(),
            Some("${SKILLKIT_TEST_UNSET_DISCORD}")
        );
        assert!(config.validate().is_ok());

        std::env::remove_var("SKILLKIT_TEST_SLACK_URL");
    }

    #[test]
    fn test_config_validation() {
        let config = SkillkitConfig::from_toml_str(
            r#"
[notify]
slack_webhook = "not-a-url"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = SkillkitConfig::from_toml_str(
            r#"
[readme]
start_marker = "<!-- X -->"
end_marker = "<!-- X -->"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_parsing_error() {
        let err = SkillkitConfig::from_toml_str("[corpus\nroot = 1").unwrap_err();
        assert_eq!(err.category(), crate::utils::error::ErrorCategory::Parsing);
    }

    #[test]
    fn test_config_from_file_and_root_override() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[stats]\ntitle = \"Corpus Stats\"\n")
            .unwrap();

        let config =
            SkillkitConfig::load(Some(temp_file.path()), Some(Path::new("/tmp/skills"))).unwrap();
        assert_eq!(config.stats.title, "Corpus Stats");
        assert_eq!(config.corpus_root(), Path::new("/tmp/skills"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = SkillkitConfig::load(Some(Path::new("/nonexistent/skillkit.toml")), None);
        assert!(result.is_err());
    }
}
