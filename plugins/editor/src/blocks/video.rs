//! Video URL editor with YouTube and Vimeo previews

use regex::Regex;
use std::sync::OnceLock;
use trellis_core::{Block, BlockId, BlockKind, VideoProvider};

fn youtube_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?:v=|/embed/|youtu\.be/|/v/|/u/\w+/)([A-Za-z0-9_-]{11})").ok())
        .as_ref()
}

fn vimeo_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"vimeo\.com/(\d+)").ok())
        .as_ref()
}

/// Provider by substring: youtube.com or youtu.be, then vimeo.com
pub fn detect_provider(url: &str) -> Option<VideoProvider> {
    if url.contains("youtube.com") || url.contains("youtu.be") {
        Some(VideoProvider::Youtube)
    } else if url.contains("vimeo.com") {
        Some(VideoProvider::Vimeo)
    } else {
        None
    }
}

/// Video id for the provider, first match wins
pub fn video_id(url: &str, provider: VideoProvider) -> Option<String> {
    let pattern = match provider {
        VideoProvider::Youtube => youtube_pattern()?,
        VideoProvider::Vimeo => vimeo_pattern()?,
    };
    pattern
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Embeddable player URL, when the URL names a recognizable video
pub fn preview_url(url: &str) -> Option<String> {
    let provider = detect_provider(url)?;
    let id = video_id(url, provider)?;
    Some(match provider {
        VideoProvider::Youtube => format!("https://www.youtube.com/embed/{}", id),
        VideoProvider::Vimeo => format!("https://player.vimeo.com/video/{}", id),
    })
}

#[derive(Debug, Clone)]
pub struct VideoEditor {
    id: BlockId,
    src: String,
    provider: Option<VideoProvider>,
}

impl VideoEditor {
    pub fn new(id: BlockId, src: String, provider: Option<VideoProvider>) -> Self {
        Self { id, src, provider }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn provider(&self) -> Option<VideoProvider> {
        self.provider
    }

    /// Every change re-derives the provider and commits
    pub fn set_url(&mut self, url: String) -> Block {
        self.provider = detect_provider(&url);
        self.src = url;
        Block::with_id(
            self.id.clone(),
            BlockKind::Video {
                src: self.src.clone(),
                provider: self.provider,
            },
        )
    }

    pub fn preview(&self) -> Option<String> {
        preview_url(&self.src)
    }

    pub fn render(&self) -> String {
        let mut html = format!(
            "<label>Video URL</label>\n<input type=\"text\" name=\"video-url\" value=\"{}\" placeholder=\"Enter video URL (YouTube, Vimeo, etc.)\" />",
            html_escape::encode_double_quoted_attribute(&self.src)
        );
        if let Some(preview) = self.preview() {
            html.push_str(&format!(
                "\n<div class=\"video-preview\"><iframe src=\"{}\" allowfullscreen></iframe></div>",
                preview
            ));
        }
        html
    }
}
