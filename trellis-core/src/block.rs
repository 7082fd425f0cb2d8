//! Block registry: the closed set of page block variants and their defaults
//!
//! Blocks persist as flat JSON objects, `{"id": .., "type": .., ..payload}`.
//! A block whose `type` tag is not recognized loads as [`BlockKind::Unknown`]
//! and keeps its id so it can still be deleted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::TrellisError;

/// The block variants an author can add to a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Text,
    Image,
    Video,
    Chatbot,
    Embed,
}

impl BlockType {
    /// Every variant, in selector order
    pub const ALL: [BlockType; 5] = [
        BlockType::Text,
        BlockType::Image,
        BlockType::Video,
        BlockType::Chatbot,
        BlockType::Embed,
    ];

    /// Wire tag of the variant
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Text => "text",
            BlockType::Image => "image",
            BlockType::Video => "video",
            BlockType::Chatbot => "chatbot",
            BlockType::Embed => "embed",
        }
    }

    /// Heading shown on the block's editor
    pub fn label(&self) -> &'static str {
        match self {
            BlockType::Text => "Text Block",
            BlockType::Image => "Image Block",
            BlockType::Video => "Video Block",
            BlockType::Chatbot => "Chatbot Block",
            BlockType::Embed => "Embed Block",
        }
    }

    /// One-line description shown in the block selector
    pub fn description(&self) -> &'static str {
        match self {
            BlockType::Text => "Add paragraphs, headings, or other text content",
            BlockType::Image => "Upload and display an image",
            BlockType::Video => "Add a video from URL",
            BlockType::Chatbot => "Add an AI-powered chatbot",
            BlockType::Embed => "Embed a Twitter or Instagram post",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TrellisError::editor(format!("Unknown block type: {}", s)))
    }
}

/// Opaque block identity, unique within one page
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Generate a fresh block id.
///
/// Uniqueness is probabilistic; nothing checks the page for collisions.
pub fn generate_id() -> BlockId {
    BlockId(Uuid::new_v4().simple().to_string())
}

/// Video hosts the editor can build a preview for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoProvider {
    Youtube,
    Vimeo,
}

impl VideoProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoProvider::Youtube => "youtube",
            VideoProvider::Vimeo => "vimeo",
        }
    }
}

/// Variant payload of a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockKind {
    Text {
        #[serde(default)]
        content: String,
    },
    Image {
        #[serde(default)]
        src: String,
        #[serde(default)]
        alt: String,
    },
    Video {
        #[serde(default)]
        src: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider: Option<VideoProvider>,
    },
    Chatbot {
        #[serde(default)]
        prompt: String,
    },
    Embed {
        #[serde(default)]
        url: String,
        #[serde(default)]
        provider: String,
        #[serde(default, rename = "embedCode")]
        embed_code: String,
    },
    /// Persisted data with a tag this build does not know
    #[serde(other)]
    Unknown,
}

impl BlockKind {
    /// Default payload for a freshly created block
    pub fn default_for(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Text => BlockKind::Text {
                content: String::new(),
            },
            BlockType::Image => BlockKind::Image {
                src: String::new(),
                alt: String::new(),
            },
            BlockType::Video => BlockKind::Video {
                src: String::new(),
                provider: None,
            },
            BlockType::Chatbot => BlockKind::Chatbot {
                prompt: String::new(),
            },
            BlockType::Embed => BlockKind::Embed {
                url: String::new(),
                provider: String::new(),
                embed_code: String::new(),
            },
        }
    }

    /// The variant tag, `None` for unrecognized blocks
    pub fn block_type(&self) -> Option<BlockType> {
        match self {
            BlockKind::Text { .. } => Some(BlockType::Text),
            BlockKind::Image { .. } => Some(BlockType::Image),
            BlockKind::Video { .. } => Some(BlockType::Video),
            BlockKind::Chatbot { .. } => Some(BlockType::Chatbot),
            BlockKind::Embed { .. } => Some(BlockType::Embed),
            BlockKind::Unknown => None,
        }
    }
}

/// A single content block on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(flatten)]
    pub kind: BlockKind,
}

impl Block {
    /// Create a block of the given type with a fresh id and default payload
    pub fn create(block_type: BlockType) -> Self {
        Self {
            id: generate_id(),
            kind: BlockKind::default_for(block_type),
        }
    }

    pub fn with_id(id: impl Into<BlockId>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn block_type(&self) -> Option<BlockType> {
        self.kind.block_type()
    }
}

impl From<String> for BlockId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Default payload fields for a type tag, as a JSON object without `type`.
///
/// Unrecognized tags yield an empty object rather than an error.
pub fn default_payload(tag: &str) -> serde_json::Map<String, serde_json::Value> {
    let Ok(block_type) = tag.parse::<BlockType>() else {
        return serde_json::Map::new();
    };

    match serde_json::to_value(BlockKind::default_for(block_type)) {
        Ok(serde_json::Value::Object(mut fields)) => {
            fields.remove("type");
            fields
        }
        _ => serde_json::Map::new(),
    }
}

/// A page: a unique slug, a title, and its ordered blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Page {
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            blocks: Vec::new(),
        }
    }
}
