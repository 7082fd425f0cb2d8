//! HTML for the page editor screen

use trellis_core::BlockType;

use crate::editor_state::{EditorMode, PageEditor, SelectorState, EMPTY_NOTICE};

/// Render the editor body. `blocks_html` holds one rendered widget per block, in order.
pub fn render_editor(editor: &PageEditor, blocks_html: &[String]) -> String {
    let slug = html_escape::encode_text(editor.slug());
    let toggle_label = match editor.mode() {
        EditorMode::Block => "Switch to Advanced Mode",
        EditorMode::Advanced => "Switch to Block Mode",
    };

    let mut html = format!(
        "<div class=\"page-editor\" data-mode=\"{}\">\n<header>\n<h1>Editing: {}</h1>\n<button class=\"toggle-mode\">{}</button>\n</header>\n<main>\n",
        editor.mode(),
        slug,
        toggle_label
    );

    match editor.mode() {
        EditorMode::Advanced => html.push_str(&render_advanced(editor.raw_content())),
        EditorMode::Block => html.push_str(&render_block_list(blocks_html)),
    }
    html.push_str("</main>\n");

    if editor.selector() == SelectorState::Open {
        html.push_str(&render_selector());
    }

    html.push_str("</div>");
    html
}

fn render_advanced(raw_content: &str) -> String {
    format!(
        "<section class=\"advanced-editor\">\n<h2>Advanced HTML/CSS Editor</h2>\n<p>Edit raw HTML and use Tailwind classes directly. Changes here will not be reflected in block mode.</p>\n<textarea name=\"raw-content\" placeholder=\"Enter your HTML/CSS here...\">{}</textarea>\n</section>\n",
        html_escape::encode_text(raw_content)
    )
}

fn render_block_list(blocks_html: &[String]) -> String {
    let mut html = String::from("<section class=\"block-editor\">\n<h2>Blocks</h2>\n");
    if blocks_html.is_empty() {
        html.push_str(&format!("<div class=\"empty-blocks\">{}</div>\n", EMPTY_NOTICE));
    } else {
        html.push_str("<div class=\"blocks\">\n");
        for block in blocks_html {
            html.push_str(block);
            html.push('\n');
        }
        html.push_str("</div>\n");
    }
    html.push_str("<button class=\"add-block\">Add Block</button>\n</section>\n");
    html
}

fn render_selector() -> String {
    let mut html = String::from("<div class=\"block-selector\">\n<h2>Select Block Type</h2>\n");
    for block_type in BlockType::ALL {
        html.push_str(&format!(
            "<button class=\"select-block\" data-block-type=\"{}\"><h3>{}</h3><p>{}</p></button>\n",
            block_type,
            block_type.label(),
            block_type.description()
        ));
    }
    html.push_str("<button class=\"cancel-selection\">Cancel</button>\n</div>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_block_mode_shows_notice() {
        let editor = PageEditor::new("home", "Home");
        let html = render_editor(&editor, &[]);
        assert!(html.contains(EMPTY_NOTICE));
        assert!(html.contains("Switch to Advanced Mode"));
        assert!(html.contains("Add Block"));
        assert!(!html.contains("block-selector"));
    }

    #[test]
    fn test_selector_lists_every_type() {
        let mut editor = PageEditor::new("home", "Home");
        editor.request_add_block().unwrap();
        let html = render_editor(&editor, &[]);
        for block_type in BlockType::ALL {
            assert!(html.contains(&format!("data-block-type=\"{}\"", block_type)));
        }
        assert!(html.contains("Cancel"));
    }

    #[test]
    fn test_advanced_mode_shows_escaped_buffer() {
        let mut editor = PageEditor::new("home", "Home");
        editor.toggle_mode();
        editor.edit_raw_content("<h1>Hi</h1>").unwrap();
        let html = render_editor(&editor, &[]);
        assert!(html.contains("&lt;h1&gt;Hi&lt;/h1&gt;"));
        assert!(html.contains("Switch to Block Mode"));
        assert!(!html.contains(EMPTY_NOTICE));
    }
}
