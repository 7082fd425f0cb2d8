//! Page editor state machine: the ordered block list and the raw HTML buffer

use serde::{Deserialize, Serialize};
use trellis_core::{Block, BlockId, BlockKind, BlockType, Page};

use crate::materialize::materialize;
use crate::EditorError;

/// Notice shown in block mode when the page has no blocks
pub const EMPTY_NOTICE: &str =
    "No blocks added yet. Click \"Add Block\" to start building your page.";

/// Editing modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    /// Structured editing of the block list
    #[default]
    Block,
    /// Free-form editing of the raw HTML buffer
    Advanced,
}

impl std::fmt::Display for EditorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorMode::Block => write!(f, "block"),
            EditorMode::Advanced => write!(f, "advanced"),
        }
    }
}

/// Whether the block type selector is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectorState {
    #[default]
    Closed,
    Open,
}

impl std::fmt::Display for SelectorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectorState::Closed => write!(f, "closed"),
            SelectorState::Open => write!(f, "open"),
        }
    }
}

/// Serializable view of an editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSnapshot {
    pub slug: String,
    pub title: String,
    pub mode: EditorMode,
    pub selector: SelectorState,
    pub blocks: Vec<Block>,
    pub raw_content: String,
    pub materialized: bool,
}

/// Editor for a single page
#[derive(Debug, Clone)]
pub struct PageEditor {
    slug: String,
    title: String,
    blocks: Vec<Block>,
    mode: EditorMode,
    selector: SelectorState,
    raw_content: String,
    /// Set once the buffer has been filled from the block list
    materialized: bool,
}

impl PageEditor {
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self::from_page(Page::new(slug, title))
    }

    /// Open an existing page in block mode
    pub fn from_page(page: Page) -> Self {
        Self {
            slug: page.slug,
            title: page.title,
            blocks: page.blocks,
            mode: EditorMode::Block,
            selector: SelectorState::Closed,
            raw_content: String::new(),
            materialized: false,
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn selector(&self) -> SelectorState {
        self.selector
    }

    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }

    pub fn is_materialized(&self) -> bool {
        self.materialized
    }

    /// True when block mode should show [`EMPTY_NOTICE`]
    pub fn shows_empty_notice(&self) -> bool {
        self.mode == EditorMode::Block && self.blocks.is_empty()
    }

    /// Reject `action` unless the editor is in block mode
    pub(crate) fn ensure_block_mode(&self, action: &'static str) -> Result<(), EditorError> {
        if self.mode == EditorMode::Block {
            Ok(())
        } else {
            Err(self.reject(action))
        }
    }

    fn reject(&self, action: &'static str) -> EditorError {
        EditorError::InvalidTransition {
            action,
            mode: self.mode,
            selector: self.selector,
        }
    }

    /// Open the block type selector
    pub fn request_add_block(&mut self) -> Result<(), EditorError> {
        if self.mode != EditorMode::Block || self.selector != SelectorState::Closed {
            return Err(self.reject("request_add_block"));
        }
        self.selector = SelectorState::Open;
        Ok(())
    }

    /// Append a default block of the chosen type and close the selector
    pub fn select_block_type(&mut self, block_type: BlockType) -> Result<BlockId, EditorError> {
        if self.selector != SelectorState::Open {
            return Err(self.reject("select_block_type"));
        }

        let block = Block::create(block_type);
        let id = block.id.clone();
        tracing::debug!("Adding {} block {} to page {}", block_type, id, self.slug);

        self.blocks.push(block);
        self.selector = SelectorState::Closed;
        Ok(id)
    }

    pub fn cancel_selection(&mut self) -> Result<(), EditorError> {
        if self.selector != SelectorState::Open {
            return Err(self.reject("cancel_selection"));
        }
        self.selector = SelectorState::Closed;
        Ok(())
    }

    /// Replace the block with the same id. Returns whether one matched.
    ///
    /// A block keeps its variant for life; an update carrying another type is
    /// rejected.
    pub fn update_block(&mut self, block: Block) -> Result<bool, EditorError> {
        self.ensure_block_mode("update_block")?;

        match self.blocks.iter_mut().find(|b| b.id == block.id) {
            Some(slot) if slot.block_type() != block.block_type() => {
                Err(EditorError::InvalidInput(format!(
                    "Block {} is {}, not {}",
                    block.id,
                    type_name(slot.block_type()),
                    type_name(block.block_type())
                )))
            }
            Some(slot) => {
                *slot = block;
                Ok(true)
            }
            None => {
                tracing::debug!("Ignoring update for unknown block {}", block.id);
                Ok(false)
            }
        }
    }

    /// Remove the block with this id. Returns whether one matched.
    pub fn delete_block(&mut self, id: &BlockId) -> bool {
        let before = self.blocks.len();
        self.blocks.retain(|b| &b.id != id);
        self.blocks.len() < before
    }

    /// Switch between block and advanced mode.
    ///
    /// Entering advanced mode with an empty buffer fills it from the block
    /// list. A non-empty buffer is never overwritten, and leaving advanced
    /// mode touches neither blocks nor buffer.
    pub fn toggle_mode(&mut self) -> EditorMode {
        self.mode = match self.mode {
            EditorMode::Block => {
                if self.raw_content.is_empty() {
                    self.raw_content = materialize(&self.blocks);
                    self.materialized = true;
                    tracing::debug!(
                        "Materialized {} blocks for page {}",
                        self.blocks.len(),
                        self.slug
                    );
                }
                EditorMode::Advanced
            }
            EditorMode::Advanced => EditorMode::Block,
        };
        self.mode
    }

    /// HTML visitors see: the raw buffer in advanced mode, the materialized
    /// block list otherwise
    pub fn published_html(&self) -> String {
        match self.mode {
            EditorMode::Advanced => self.raw_content.clone(),
            EditorMode::Block => materialize(&self.blocks),
        }
    }

    /// Replace the raw buffer verbatim
    pub fn edit_raw_content(&mut self, text: impl Into<String>) -> Result<(), EditorError> {
        if self.mode != EditorMode::Advanced {
            return Err(self.reject("edit_raw_content"));
        }
        self.raw_content = text.into();
        Ok(())
    }

    /// User-visible text across the page, used as chat context
    pub fn page_content(&self) -> String {
        page_content(&self.blocks)
    }

    pub fn to_page(&self) -> Page {
        Page {
            slug: self.slug.clone(),
            title: self.title.clone(),
            blocks: self.blocks.clone(),
        }
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            slug: self.slug.clone(),
            title: self.title.clone(),
            mode: self.mode,
            selector: self.selector,
            blocks: self.blocks.clone(),
            raw_content: self.raw_content.clone(),
            materialized: self.materialized,
        }
    }
}

fn type_name(block_type: Option<BlockType>) -> &'static str {
    block_type.map(|t| t.as_str()).unwrap_or("unknown")
}

/// Text contents and image alt texts, newline separated, empties skipped
pub fn page_content(blocks: &[Block]) -> String {
    blocks
        .iter()
        .filter_map(|block| match &block.kind {
            BlockKind::Text { content } => Some(content.as_str()),
            BlockKind::Image { alt, .. } => Some(alt.as_str()),
            _ => None,
        })
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
