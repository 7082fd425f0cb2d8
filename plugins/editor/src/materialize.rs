//! One-way conversion of a block list into raw HTML

use trellis_core::{Block, BlockKind};

/// Render blocks into the raw HTML buffer format.
///
/// Only text, image and video blocks produce markup. Chatbot, embed and
/// unknown blocks become empty fragments, so the conversion is lossy.
/// Payload values are inserted as-is: the buffer is author-controlled HTML.
pub fn materialize(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(fragment)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn fragment(block: &Block) -> String {
    match &block.kind {
        BlockKind::Text { content } => format!("<div class=\"text-block\">{}</div>", content),
        BlockKind::Image { src, alt } => {
            format!("<img src=\"{}\" alt=\"{}\" class=\"image-block\" />", src, alt)
        }
        BlockKind::Video { src, .. } => format!(
            "<div class=\"video-block\"><iframe src=\"{}\"></iframe></div>",
            src
        ),
        BlockKind::Chatbot { .. } | BlockKind::Embed { .. } | BlockKind::Unknown => String::new(),
    }
}
