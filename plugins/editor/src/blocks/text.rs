use trellis_core::{Block, BlockId, BlockKind};

/// Multi-line text editor; every change commits
#[derive(Debug, Clone)]
pub struct TextEditor {
    id: BlockId,
    content: String,
}

impl TextEditor {
    pub fn new(id: BlockId, content: String) -> Self {
        Self { id, content }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: String) -> Block {
        self.content = content;
        Block::with_id(
            self.id.clone(),
            BlockKind::Text {
                content: self.content.clone(),
            },
        )
    }

    pub fn render(&self) -> String {
        format!(
            "<textarea name=\"content\" rows=\"4\" placeholder=\"Enter your text here...\">{}</textarea>",
            html_escape::encode_text(&self.content)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_change_commits() {
        let mut editor = TextEditor::new(BlockId::new("t"), String::new());
        for partial in ["H", "He", "Hello"] {
            let block = editor.set_content(partial.to_string());
            assert_eq!(
                block.kind,
                BlockKind::Text {
                    content: partial.to_string()
                }
            );
        }
        assert_eq!(editor.content(), "Hello");
    }

    #[test]
    fn test_render_escapes_content() {
        let editor = TextEditor::new(BlockId::new("t"), "<script>".to_string());
        assert!(editor.render().contains("&lt;script&gt;"));
    }
}
