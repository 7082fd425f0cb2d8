//! Page title and meta description helpers

use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "Site Builder";
pub const DEFAULT_DESCRIPTION: &str = "Create and manage your website with Site Builder";
const WELCOME_DESCRIPTION: &str = "Welcome to Site Builder";

const MAX_DESCRIPTION: usize = 160;
const TRUNCATED_DESCRIPTION: usize = 157;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoData {
    pub title: String,
    pub description: String,
}

/// Derive SEO data from page text
pub fn generate_seo_data(content: &str) -> SeoData {
    let lead = content.split_whitespace().take(5).collect::<Vec<_>>().join(" ");

    let title = if lead.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        format!("{} - {}", lead, DEFAULT_TITLE)
    };

    let description = if content.is_empty() {
        WELCOME_DESCRIPTION.to_string()
    } else {
        clamp_description(content)
    };

    SeoData { title, description }
}

/// Fill in defaults for missing values and clamp long descriptions
pub fn validate_seo_data(title: Option<&str>, description: Option<&str>) -> SeoData {
    SeoData {
        title: title
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string(),
        description: description
            .filter(|d| !d.is_empty())
            .map(clamp_description)
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
    }
}

fn clamp_description(text: &str) -> String {
    if text.chars().count() > MAX_DESCRIPTION {
        let kept: String = text.chars().take(TRUNCATED_DESCRIPTION).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}
