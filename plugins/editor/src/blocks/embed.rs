//! Social post embeds for Twitter and Instagram

use regex::Regex;
use std::sync::OnceLock;
use trellis_core::{Block, BlockId, BlockKind};

fn tweet_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"twitter\.com/\w+/status/\d+").ok())
        .as_ref()
}

fn instagram_post_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"instagram\.com/p/[^/]+").ok())
        .as_ref()
}

/// Supported embed providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedProvider {
    Twitter,
    Instagram,
}

impl EmbedProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbedProvider::Twitter => "twitter",
            EmbedProvider::Instagram => "instagram",
        }
    }
}

pub fn detect_provider(url: &str) -> Option<EmbedProvider> {
    if url.contains("twitter.com") {
        Some(EmbedProvider::Twitter)
    } else if url.contains("instagram.com") {
        Some(EmbedProvider::Instagram)
    } else {
        None
    }
}

/// Blockquote and script markup for a tweet or Instagram post URL.
///
/// Only the URL is interpolated; nothing is fetched.
pub fn embed_code(url: &str) -> Option<String> {
    match detect_provider(url)? {
        EmbedProvider::Twitter if tweet_pattern()?.is_match(url) => Some(format!(
            "<blockquote class=\"twitter-tweet\"><a href=\"{}\"></a></blockquote><script async src=\"https://platform.twitter.com/widgets.js\"></script>",
            url
        )),
        EmbedProvider::Instagram if instagram_post_pattern()?.is_match(url) => Some(format!(
            "<blockquote class=\"instagram-media\"><a href=\"{}\"></a></blockquote><script async src=\"//www.instagram.com/embed.js\"></script>",
            url
        )),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct EmbedEditor {
    id: BlockId,
    /// What the author typed, committed or not
    url: String,
    embed_code: String,
}

impl EmbedEditor {
    pub fn new(id: BlockId, url: String, embed_code: String) -> Self {
        Self {
            id,
            url,
            embed_code,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn embed_code(&self) -> &str {
        &self.embed_code
    }

    /// Keep the typed URL locally; commit only when it yields embed code
    pub fn set_url(&mut self, url: String) -> Option<Block> {
        let code = embed_code(&url);
        self.embed_code = code.clone().unwrap_or_default();
        self.url = url;

        let code = code?;
        let provider = detect_provider(&self.url)
            .map(|p| p.as_str())
            .unwrap_or("unknown");
        Some(Block::with_id(
            self.id.clone(),
            BlockKind::Embed {
                url: self.url.clone(),
                provider: provider.to_string(),
                embed_code: code,
            },
        ))
    }

    pub fn render(&self) -> String {
        let mut html = format!(
            "<label>URL to Embed</label>\n<input type=\"text\" name=\"embed-url\" value=\"{}\" placeholder=\"Enter Twitter or Instagram URL\" />",
            html_escape::encode_double_quoted_attribute(&self.url)
        );
        if !self.embed_code.is_empty() {
            html.push_str(&format!(
                "\n<div class=\"embed-preview\">{}</div>",
                self.embed_code
            ));
        }
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tweet_embed() {
        let url = "https://twitter.com/rustlang/status/1234567890";
        assert_eq!(
            embed_code(url).unwrap(),
            "<blockquote class=\"twitter-tweet\"><a href=\"https://twitter.com/rustlang/status/1234567890\"></a></blockquote><script async src=\"https://platform.twitter.com/widgets.js\"></script>"
        );
    }

    #[test]
    fn test_instagram_post_embed() {
        let code = embed_code("https://www.instagram.com/p/CxYz123/").unwrap();
        assert!(code.starts_with("<blockquote class=\"instagram-media\">"));
        assert!(code.ends_with("<script async src=\"//www.instagram.com/embed.js\"></script>"));
    }

    #[test]
    fn test_non_post_urls_yield_nothing() {
        assert_eq!(embed_code("https://twitter.com/rustlang"), None);
        assert_eq!(embed_code("https://instagram.com/rustlang"), None);
        assert_eq!(embed_code("https://youtube.com/watch?v=dQw4w9WgXcQ"), None);
    }

    #[test]
    fn test_unsupported_url_is_kept_locally() {
        let mut editor = EmbedEditor::new(BlockId::new("e"), String::new(), String::new());
        assert!(editor.set_url("https://example.com/post/1".to_string()).is_none());
        assert_eq!(editor.url(), "https://example.com/post/1");
        assert!(editor.embed_code().is_empty());
        assert!(editor.render().contains("value=\"https://example.com/post/1\""));
        assert!(!editor.render().contains("embed-preview"));
    }

    #[test]
    fn test_supported_url_commits() {
        let mut editor = EmbedEditor::new(BlockId::new("e"), String::new(), String::new());
        let block = editor
            .set_url("https://twitter.com/rustlang/status/42".to_string())
            .unwrap();
        match block.kind {
            BlockKind::Embed {
                url,
                provider,
                embed_code,
            } => {
                assert_eq!(url, "https://twitter.com/rustlang/status/42");
                assert_eq!(provider, "twitter");
                assert!(embed_code.contains("twitter-tweet"));
            }
            other => panic!("unexpected kind {:?}", other),
        }
        assert!(editor.render().contains("<div class=\"embed-preview\"><blockquote"));
    }
}
