//! Per-page editing sessions, addressed by slug

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use trellis_chatbot::{ChatClient, ChatSnapshot, ChatTransport};
use trellis_core::{Block, BlockId, BlockType, Page};

use crate::blocks::{
    BlockAction, BlockWidget, EditorInput, MountedBlock, SelectedFile, WidgetContext,
};
use crate::editor_state::{EditorSnapshot, PageEditor};
use crate::renderer::render_editor;
use crate::EditorError;

/// One editor operation, as sent over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditorCommand {
    RequestAddBlock,
    SelectBlockType {
        block_type: BlockType,
    },
    CancelSelection,
    /// Replace a block wholesale
    UpdateBlock {
        block: Block,
    },
    DeleteBlock {
        block_id: BlockId,
    },
    ToggleMode,
    EditRawContent {
        content: String,
    },
    /// Input for one block's widget
    BlockInput {
        block_id: BlockId,
        #[serde(flatten)]
        input: EditorInput,
    },
    /// Image file with base64 contents
    UploadImage {
        block_id: BlockId,
        file_name: String,
        #[serde(default)]
        content_type: String,
        data: String,
    },
    /// Send a message through a chatbot block
    ChatMessage {
        block_id: BlockId,
        message: String,
    },
}

/// Editor snapshot plus the transcript of every chatbot block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    #[serde(flatten)]
    pub editor: EditorSnapshot,
    pub chats: BTreeMap<BlockId, ChatSnapshot>,
}

/// What visitors of a page see
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedPage {
    pub title: String,
    pub html: String,
}

/// A page editor with its mounted block widgets
pub struct PageSession {
    editor: PageEditor,
    widgets: HashMap<BlockId, MountedBlock>,
    transport: Arc<dyn ChatTransport>,
}

impl PageSession {
    pub fn new(editor: PageEditor, transport: Arc<dyn ChatTransport>) -> Self {
        let mut session = Self {
            editor,
            widgets: HashMap::new(),
            transport,
        };
        session.sync_widgets();
        session
    }

    pub fn editor(&self) -> &PageEditor {
        &self.editor
    }

    fn context(&self) -> WidgetContext {
        WidgetContext {
            page_content: self.editor.page_content(),
            chat_transport: self.transport.clone(),
        }
    }

    /// Mount widgets for new blocks, drop those of deleted ones, refresh chat context
    fn sync_widgets(&mut self) {
        let context = self.context();
        let live: HashSet<&BlockId> = self.editor.blocks().iter().map(|b| &b.id).collect();
        self.widgets.retain(|id, _| live.contains(id));

        for block in self.editor.blocks() {
            self.widgets
                .entry(block.id.clone())
                .or_insert_with(|| MountedBlock::mount(block, &context));
        }
        for widget in self.widgets.values() {
            widget.set_page_content(&context.page_content);
        }
    }

    /// Apply a command. Chat messages return the client that should send them.
    pub fn apply(&mut self, command: EditorCommand) -> Result<Option<Arc<ChatClient>>, EditorError> {
        let mut chat = None;

        match command {
            EditorCommand::RequestAddBlock => self.editor.request_add_block()?,
            EditorCommand::SelectBlockType { block_type } => {
                self.editor.select_block_type(block_type)?;
            }
            EditorCommand::CancelSelection => self.editor.cancel_selection()?,
            EditorCommand::UpdateBlock { block } => {
                if self.editor.update_block(block.clone())? {
                    let context = self.context();
                    if let Some(widget) = self.widgets.get_mut(&block.id) {
                        widget.refresh(&block, &context);
                    }
                }
            }
            EditorCommand::DeleteBlock { block_id } => {
                self.editor.delete_block(&block_id);
            }
            EditorCommand::ToggleMode => {
                self.editor.toggle_mode();
            }
            EditorCommand::EditRawContent { content } => self.editor.edit_raw_content(content)?,
            EditorCommand::BlockInput { block_id, input } => self.route_input(&block_id, input)?,
            EditorCommand::UploadImage {
                block_id,
                file_name,
                content_type,
                data,
            } => {
                let bytes = STANDARD
                    .decode(data.as_bytes())
                    .map_err(|e| EditorError::InvalidInput(format!("image data: {}", e)))?;
                let file = SelectedFile {
                    name: file_name,
                    content_type,
                    bytes,
                };
                self.route_input(&block_id, EditorInput::ImageSelected { file })?;
            }
            EditorCommand::ChatMessage { block_id, message } => {
                if let Some(client) = self.chat_client(&block_id) {
                    client.set_draft(message);
                    chat = Some(client);
                } else {
                    tracing::debug!("No chatbot block {} on page {}", block_id, self.editor.slug());
                }
            }
        }

        self.sync_widgets();
        Ok(chat)
    }

    fn route_input(&mut self, block_id: &BlockId, input: EditorInput) -> Result<(), EditorError> {
        if input != EditorInput::Delete {
            self.editor.ensure_block_mode("block_input")?;
        }

        let Some(widget) = self.widgets.get_mut(block_id) else {
            tracing::debug!("Ignoring input for unknown block {}", block_id);
            return Ok(());
        };

        match widget.handle(input) {
            Some(BlockAction::Update(block)) => {
                self.editor.update_block(block)?;
            }
            Some(BlockAction::Delete(id)) => {
                self.editor.delete_block(&id);
            }
            None => {}
        }
        Ok(())
    }

    fn chat_client(&self, block_id: &BlockId) -> Option<Arc<ChatClient>> {
        match self.widgets.get(block_id)?.widget() {
            BlockWidget::Chatbot(editor) => Some(editor.client()),
            _ => None,
        }
    }

    pub fn view(&self) -> PageView {
        let chats = self
            .widgets
            .iter()
            .filter_map(|(id, widget)| match widget.widget() {
                BlockWidget::Chatbot(editor) => Some((id.clone(), editor.client().snapshot())),
                _ => None,
            })
            .collect();

        PageView {
            editor: self.editor.snapshot(),
            chats,
        }
    }

    pub fn render(&self) -> String {
        let blocks_html: Vec<String> = self
            .editor
            .blocks()
            .iter()
            .filter_map(|block| self.widgets.get(&block.id))
            .map(MountedBlock::render)
            .collect();
        render_editor(&self.editor, &blocks_html)
    }
}

/// "about-us" becomes "About Us"
pub fn title_from_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Live editing sessions keyed by page slug
pub struct SessionManager {
    sessions: RwLock<HashMap<String, PageSession>>,
    transport: Arc<dyn ChatTransport>,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            transport,
        }
    }

    fn create_session(&self, slug: &str) -> PageSession {
        tracing::info!("Opening editor session for page {}", slug);
        PageSession::new(
            PageEditor::new(slug, title_from_slug(slug)),
            self.transport.clone(),
        )
    }

    /// Open a session on an existing page, replacing any open session for its slug
    pub async fn open_page(&self, page: Page) -> PageView {
        let slug = page.slug.clone();
        let session = PageSession::new(PageEditor::from_page(page), self.transport.clone());
        let view = session.view();
        self.sessions.write().await.insert(slug, session);
        view
    }

    /// Current view of a page, opening an empty session on first access
    pub async fn view(&self, slug: &str) -> PageView {
        if let Some(session) = self.sessions.read().await.get(slug) {
            return session.view();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(slug.to_string())
            .or_insert_with(|| self.create_session(slug))
            .view()
    }

    /// Apply one command and return the resulting view.
    ///
    /// Chat messages are sent after the session lock is released, so a slow
    /// provider never blocks other pages.
    pub async fn execute(&self, slug: &str, command: EditorCommand) -> Result<PageView, EditorError> {
        let chat = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .entry(slug.to_string())
                .or_insert_with(|| self.create_session(slug));
            session.apply(command)?
        };

        if let Some(client) = chat {
            client.submit().await;
        }

        Ok(self.view(slug).await)
    }

    pub async fn render(&self, slug: &str) -> String {
        if let Some(session) = self.sessions.read().await.get(slug) {
            return session.render();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(slug.to_string())
            .or_insert_with(|| self.create_session(slug))
            .render()
    }

    pub async fn page(&self, slug: &str) -> Option<Page> {
        self.sessions
            .read()
            .await
            .get(slug)
            .map(|session| session.editor().to_page())
    }

    /// Public rendering of an open page. Never opens a session.
    pub async fn published(&self, slug: &str) -> Option<PublishedPage> {
        self.sessions.read().await.get(slug).map(|session| PublishedPage {
            title: session.editor().title().to_string(),
            html: session.editor().published_html(),
        })
    }

    pub async fn close(&self, slug: &str) -> bool {
        self.sessions.write().await.remove(slug).is_some()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn slugs(&self) -> Vec<String> {
        let mut slugs: Vec<_> = self.sessions.read().await.keys().cloned().collect();
        slugs.sort();
        slugs
    }
}
