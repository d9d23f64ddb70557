use crate::config::profiles::ProjectProfile;
use crate::domain::model::SkillDocument;
use crate::utils::error::{Result, SkillkitError};
use crate::utils::text::title_case;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Essential,
    Important,
    Optional,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Self::Essential, Self::Important, Self::Optional];

    pub fn heading(self) -> &'static str {
        match self {
            Self::Essential => "🔥 Essential Skills (Start Here)",
            Self::Important => "⚡ Important Skills (High Priority)",
            Self::Optional => "💡 Optional Skills (Nice to Have)",
        }
    }

    fn blurb(self) -> &'static str {
        match self {
            Self::Essential => "These skills are critical for your project:",
            Self::Important => "These skills will significantly improve your project:",
            Self::Optional => "Consider these based on specific requirements:",
        }
    }

    fn list_heading(self) -> &'static str {
        match self {
            Self::Essential => "Essential Skills",
            Self::Important => "Important Skills",
            Self::Optional => "Optional Skills",
        }
    }

    pub fn skills(self, profile: &ProjectProfile) -> &[String] {
        match self {
            Self::Essential => &profile.essential,
            Self::Important => &profile.important,
            Self::Optional => &profile.optional,
        }
    }
}

/// Looks a profile up by key or by name, case-insensitively.
pub fn find_profile<'a>(profiles: &'a [ProjectProfile], query: &str) -> Result<&'a ProjectProfile> {
    let query = query.trim();
    profiles
        .iter()
        .find(|p| p.key == query || p.name.eq_ignore_ascii_case(query))
        .ok_or_else(|| SkillkitError::ValidationError {
            message: format!(
                "unknown project profile '{}'; valid keys: {}",
                query,
                profiles
                    .iter()
                    .map(|p| p.key.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        })
}

/// `"30-ecommerce/shopping-cart"` → `("Shopping Cart", "30-ecommerce")`.
pub fn display_name(skill: &str) -> (String, &str) {
    let category = skill.split('/').next().unwrap_or(skill);
    let name = skill.rsplit('/').next().unwrap_or(skill);
    (title_case(name), category)
}

/// `category/skill` identifiers present in the corpus.
pub fn available_skills(documents: &[SkillDocument]) -> BTreeSet<String> {
    documents
        .iter()
        .filter_map(|doc| {
            let dir = doc.path.rsplit_once('/')?.0;
            let mut parts = dir.rsplit('/');
            let skill = parts.next()?;
            let category = parts.next()?;
            Some(format!("{}/{}", category, skill))
        })
        .collect()
}

pub fn render_profiles(profiles: &[ProjectProfile]) -> String {
    let mut out = String::from("📋 Project Types\n");
    for profile in profiles {
        out.push_str(&format!("\n{}. {}\n   {}\n", profile.key, profile.name, profile.description));
    }
    out
}

/// Recommendations grouped by priority. With `available`, skills absent from
/// the corpus are flagged.
pub fn render_recommendations(
    profile: &ProjectProfile,
    available: Option<&BTreeSet<String>>,
) -> String {
    let mut out = format!("Project: {}\n{}\n", profile.name, profile.description);
    for priority in Priority::ALL {
        let skills = priority.skills(profile);
        if skills.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{}\n{}\n\n", priority.heading(), priority.blurb()));
        for skill in skills {
            let (name, category) = display_name(skill);
            let missing = match available {
                Some(set) if !set.contains(skill) => " (missing)",
                _ => "",
            };
            out.push_str(&format!("  • {} [{}]{}\n", name, category, missing));
        }
    }
    if Priority::ALL.iter().all(|p| p.skills(profile).is_empty()) {
        out.push_str("\nNo preset recommendations; use `select categories` or `select search`.\n");
    }
    out
}

pub fn skill_list_file_name(profile: &ProjectProfile) -> String {
    let mut snake = String::new();
    for c in profile.name.to_lowercase().chars() {
        if c.is_alphanumeric() {
            snake.push(c);
        } else if !snake.ends_with('_') {
            snake.push('_');
        }
    }
    format!("skills_{}.txt", snake.trim_matches('_'))
}

pub fn render_skill_list(profile: &ProjectProfile) -> String {
    let mut out = format!("# Skills for {}\n# {}\n\n", profile.name, profile.description);
    for priority in Priority::ALL {
        let skills = priority.skills(profile);
        if skills.is_empty() {
            continue;
        }
        out.push_str(&format!("## {}\n\n", priority.list_heading()));
        for skill in skills {
            out.push_str(&format!("- {}\n", skill));
        }
        out.push('\n');
    }
    out
}

pub const PROMPT_FILE: &str = "claude_prompt.txt";

/// Ready-to-paste prompt listing essential and important skills.
pub fn render_prompt(profile: &ProjectProfile) -> String {
    let skills: Vec<String> = profile
        .essential
        .iter()
        .chain(&profile.important)
        .map(|s| format!("- {}", s))
        .collect();

    format!(
        "I'm building a {} ({}).\n\n\
         Please help me implement this following these skills:\n\n\
         {}\n\n\
         Requirements:\n\
         1. Follow all best practices from these skills\n\
         2. Include proper error handling\n\
         3. Add security considerations\n\
         4. Ensure production-ready code\n\
         5. Include testing strategies\n\n\
         Let's start with [describe what you want to build].\n",
        profile.name,
        profile.description,
        skills.join("\n")
    )
}

pub fn render_categories(categories: &BTreeMap<String, String>) -> String {
    let mut out = String::from("📚 All Skill Categories\n\n");
    for (code, name) in categories {
        out.push_str(&format!("  {}. {}\n", code, name));
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    /// `"08 - Messaging & Queue"`
    pub categories: Vec<String>,
    /// Corpus paths of matching skills.
    pub skills: Vec<String>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.skills.is_empty()
    }

    pub fn render(&self, keyword: &str) -> String {
        if self.is_empty() {
            return format!("No matches found for '{}'", keyword);
        }
        let mut out = String::new();
        if !self.categories.is_empty() {
            out.push_str(&format!("Found {} matching categories:\n\n", self.categories.len()));
            for category in &self.categories {
                out.push_str(&format!("  • {}\n", category));
            }
        }
        if !self.skills.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("Found {} matching skills:\n\n", self.skills.len()));
            for skill in &self.skills {
                out.push_str(&format!("  • {}\n", skill));
            }
        }
        out
    }
}

/// Case-insensitive match against category names and the scanned corpus
/// (skill name, title, category slug).
pub fn search(
    keyword: &str,
    categories: &BTreeMap<String, String>,
    documents: &[SkillDocument],
) -> SearchResults {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return SearchResults::default();
    }

    let categories = categories
        .iter()
        .filter(|(_, name)| name.to_lowercase().contains(&needle))
        .map(|(code, name)| format!("{} - {}", code, name))
        .collect();

    let mut skills: Vec<String> = documents
        .iter()
        .filter(|doc| {
            doc.skill_name.to_lowercase().contains(&needle)
                || doc.title().to_lowercase().contains(&needle)
                || doc.category.slug.to_lowercase().contains(&needle)
        })
        .map(|doc| doc.path.clone())
        .collect();
    skills.sort();

    SearchResults { categories, skills }
}
