//! Chatbot block: an editable initial prompt plus a live chat preview

use std::sync::Arc;
use trellis_chatbot::{ChatClient, ChatSnapshot, ChatTransport, Role};
use trellis_core::{Block, BlockId, BlockKind};

pub struct ChatbotEditor {
    id: BlockId,
    prompt: String,
    client: Arc<ChatClient>,
}

impl ChatbotEditor {
    pub fn new(
        id: BlockId,
        prompt: String,
        page_content: &str,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        let client = Arc::new(ChatClient::new(transport, prompt.clone(), page_content));
        Self { id, prompt, client }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Shared handle to the chat client, for submitting outside any lock
    pub fn client(&self) -> Arc<ChatClient> {
        self.client.clone()
    }

    /// Commit the prompt and use it for subsequent chat requests
    pub fn set_prompt(&mut self, prompt: String) -> Block {
        self.client.set_initial_prompt(prompt.clone());
        self.prompt = prompt;
        Block::with_id(
            self.id.clone(),
            BlockKind::Chatbot {
                prompt: self.prompt.clone(),
            },
        )
    }

    pub fn set_page_content(&self, page_content: &str) {
        self.client.set_context(page_content);
    }

    pub fn render(&self) -> String {
        format!(
            "<label>Initial Prompt (System Message)</label>\n<textarea name=\"prompt\" rows=\"3\" placeholder=\"Enter an initial prompt for the chatbot...\">{}</textarea>\n{}",
            html_escape::encode_text(&self.prompt),
            render_chat_panel(&self.client.snapshot(), "Ask a question...")
        )
    }
}

/// Transcript, pending indicator and message form for any chat client
pub fn render_chat_panel(snapshot: &ChatSnapshot, placeholder: &str) -> String {
    let mut html = String::from("<div class=\"chatbot\">\n<div class=\"chat-messages\">");

    if snapshot.transcript.is_empty() {
        html.push_str("\n<p class=\"chat-empty\">No messages yet. Start a conversation!</p>");
    }
    for message in &snapshot.transcript {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        html.push_str(&format!(
            "\n<div class=\"chat-message {}\"><p>{}</p></div>",
            role,
            html_escape::encode_text(&message.content)
        ));
    }
    if snapshot.pending {
        html.push_str("\n<p class=\"chat-loading\">Thinking...</p>");
    }

    let disabled = if snapshot.pending || snapshot.draft.trim().is_empty() {
        " disabled"
    } else {
        ""
    };
    html.push_str(&format!(
        "\n</div>\n<form class=\"chat-form\"><input type=\"text\" name=\"message\" value=\"{}\" placeholder=\"{}\" /><button type=\"submit\"{}>Send</button></form>\n</div>",
        html_escape::encode_double_quoted_attribute(&snapshot.draft),
        html_escape::encode_double_quoted_attribute(placeholder),
        disabled
    ));
    html
}
