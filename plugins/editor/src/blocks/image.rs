//! Image upload editor
//!
//! Uploads never leave the process: the file bytes are inlined as a
//! base64 `data:` URL.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use trellis_core::{Block, BlockId, BlockKind};

/// A file chosen in the image picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    /// Displayable reference for the file contents
    pub fn data_url(&self) -> String {
        let content_type = if self.content_type.is_empty() {
            "application/octet-stream"
        } else {
            &self.content_type
        };
        format!("data:{};base64,{}", content_type, STANDARD.encode(&self.bytes))
    }
}

#[derive(Debug, Clone)]
pub struct ImageEditor {
    id: BlockId,
    src: String,
    alt: String,
}

impl ImageEditor {
    pub fn new(id: BlockId, src: String, alt: String) -> Self {
        Self { id, src, alt }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn alt(&self) -> &str {
        &self.alt
    }

    fn commit(&self) -> Block {
        Block::with_id(
            self.id.clone(),
            BlockKind::Image {
                src: self.src.clone(),
                alt: self.alt.clone(),
            },
        )
    }

    /// Inline the file and take its name as alt text, unless the name is empty
    pub fn select_file(&mut self, file: &SelectedFile) -> Block {
        self.src = file.data_url();
        if !file.name.is_empty() {
            self.alt = file.name.clone();
        }
        self.commit()
    }

    pub fn set_alt(&mut self, alt: String) -> Block {
        self.alt = alt;
        self.commit()
    }

    pub fn render(&self) -> String {
        let mut html = format!(
            "<label>Upload Image</label>\n<input type=\"file\" name=\"image\" accept=\"image/*\" />\n\
             <label>Alt Text</label>\n<input type=\"text\" name=\"alt\" value=\"{}\" placeholder=\"Describe the image\" />",
            html_escape::encode_double_quoted_attribute(&self.alt)
        );
        if !self.src.is_empty() {
            html.push_str(&format!(
                "\n<img class=\"image-preview\" src=\"{}\" alt=\"{}\" />",
                html_escape::encode_double_quoted_attribute(&self.src),
                html_escape::encode_double_quoted_attribute(&self.alt)
            ));
        }
        html
    }
}
