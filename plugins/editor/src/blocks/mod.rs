//! Block renderer: dispatch from a block's variant to its sub-editor
//!
//! Every widget shows a delete control. Inputs produce at most one
//! [`BlockAction`], which the page editor applies.

pub mod chatbot;
pub mod embed;
pub mod image;
pub mod text;
pub mod video;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use trellis_chatbot::ChatTransport;
use trellis_core::{Block, BlockId, BlockKind, BlockType};

pub use chatbot::{render_chat_panel, ChatbotEditor};
pub use embed::EmbedEditor;
pub use image::{ImageEditor, SelectedFile};
pub use text::TextEditor;
pub use video::VideoEditor;

/// What a widget asks the page editor to do
#[derive(Debug, Clone, PartialEq)]
pub enum BlockAction {
    Update(Block),
    Delete(BlockId),
}

/// User input directed at one block's widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum EditorInput {
    Delete,
    TextChanged { content: String },
    ImageSelected { file: SelectedFile },
    AltChanged { alt: String },
    VideoUrlChanged { url: String },
    EmbedUrlChanged { url: String },
    PromptChanged { prompt: String },
}

/// Shared inputs for mounting widgets
#[derive(Clone)]
pub struct WidgetContext {
    pub page_content: String,
    pub chat_transport: Arc<dyn ChatTransport>,
}

pub enum BlockWidget {
    Text(TextEditor),
    Image(ImageEditor),
    Video(VideoEditor),
    Embed(EmbedEditor),
    Chatbot(ChatbotEditor),
    Unknown,
}

/// A mounted widget and the block it edits
pub struct MountedBlock {
    id: BlockId,
    widget: BlockWidget,
}

impl MountedBlock {
    pub fn mount(block: &Block, context: &WidgetContext) -> Self {
        let id = block.id.clone();
        let widget = match &block.kind {
            BlockKind::Text { content } => {
                BlockWidget::Text(TextEditor::new(id.clone(), content.clone()))
            }
            BlockKind::Image { src, alt } => {
                BlockWidget::Image(ImageEditor::new(id.clone(), src.clone(), alt.clone()))
            }
            BlockKind::Video { src, provider } => {
                BlockWidget::Video(VideoEditor::new(id.clone(), src.clone(), *provider))
            }
            BlockKind::Embed {
                url, embed_code, ..
            } => BlockWidget::Embed(EmbedEditor::new(id.clone(), url.clone(), embed_code.clone())),
            BlockKind::Chatbot { prompt } => BlockWidget::Chatbot(ChatbotEditor::new(
                id.clone(),
                prompt.clone(),
                &context.page_content,
                context.chat_transport.clone(),
            )),
            BlockKind::Unknown => BlockWidget::Unknown,
        };
        Self { id, widget }
    }

    pub fn id(&self) -> &BlockId {
        &self.id
    }

    pub fn widget(&self) -> &BlockWidget {
        &self.widget
    }

    /// Route an input to the widget. Inputs meant for another variant are ignored.
    pub fn handle(&mut self, input: EditorInput) -> Option<BlockAction> {
        let update = match (&mut self.widget, input) {
            (_, EditorInput::Delete) => return Some(BlockAction::Delete(self.id.clone())),
            (BlockWidget::Text(editor), EditorInput::TextChanged { content }) => {
                Some(editor.set_content(content))
            }
            (BlockWidget::Image(editor), EditorInput::ImageSelected { file }) => {
                Some(editor.select_file(&file))
            }
            (BlockWidget::Image(editor), EditorInput::AltChanged { alt }) => {
                Some(editor.set_alt(alt))
            }
            (BlockWidget::Video(editor), EditorInput::VideoUrlChanged { url }) => {
                Some(editor.set_url(url))
            }
            (BlockWidget::Embed(editor), EditorInput::EmbedUrlChanged { url }) => {
                editor.set_url(url)
            }
            (BlockWidget::Chatbot(editor), EditorInput::PromptChanged { prompt }) => {
                Some(editor.set_prompt(prompt))
            }
            (_, input) => {
                tracing::debug!("Block {} ignored input {:?}", self.id, input);
                None
            }
        };
        update.map(BlockAction::Update)
    }

    /// Re-seed from a block that was replaced without going through this widget.
    /// Chatbot widgets keep their transcript.
    pub fn refresh(&mut self, block: &Block, context: &WidgetContext) {
        if let (BlockWidget::Chatbot(editor), BlockKind::Chatbot { prompt }) =
            (&mut self.widget, &block.kind)
        {
            editor.set_prompt(prompt.clone());
            return;
        }
        *self = Self::mount(block, context);
    }

    /// Keep chat context in step with the page
    pub fn set_page_content(&self, page_content: &str) {
        if let BlockWidget::Chatbot(editor) = &self.widget {
            editor.set_page_content(page_content);
        }
    }

    pub fn render(&self) -> String {
        let (block_type, body) = match &self.widget {
            BlockWidget::Text(editor) => (Some(BlockType::Text), editor.render()),
            BlockWidget::Image(editor) => (Some(BlockType::Image), editor.render()),
            BlockWidget::Video(editor) => (Some(BlockType::Video), editor.render()),
            BlockWidget::Embed(editor) => (Some(BlockType::Embed), editor.render()),
            BlockWidget::Chatbot(editor) => (Some(BlockType::Chatbot), editor.render()),
            BlockWidget::Unknown => (None, "<div>Unknown block type</div>".to_string()),
        };

        let id = html_escape::encode_double_quoted_attribute(self.id.as_str());
        let heading = block_type
            .map(|t| format!("<h3>{}</h3>\n", t.label()))
            .unwrap_or_default();
        let class = block_type.map(|t| t.as_str()).unwrap_or("unknown");

        format!(
            "<div class=\"block {class}-block\" data-block-id=\"{id}\">\n\
             <button class=\"delete-block\" data-block-id=\"{id}\" aria-label=\"Delete block\">Delete</button>\n\
             {heading}{body}\n</div>"
        )
    }
}
