//! Full-page HTML shell around site and builder pages

use chrono::Datelike;
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::navigation::NavigationItem;
use crate::seo::DEFAULT_TITLE;

/// Optional head metadata for a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl PageMeta {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: None,
        }
    }
}

impl From<crate::seo::SeoData> for PageMeta {
    fn from(seo: crate::seo::SeoData) -> Self {
        Self {
            title: Some(seo.title),
            description: Some(seo.description),
        }
    }
}

/// Wrap `body` in the site layout, stamped with the current year
pub fn render_layout(body: &str, navigation: &[NavigationItem], meta: &PageMeta) -> String {
    render_layout_for_year(body, navigation, meta, chrono::Local::now().year())
}

pub fn render_layout_for_year(
    body: &str,
    navigation: &[NavigationItem],
    meta: &PageMeta,
    year: i32,
) -> String {
    let title = meta
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE);

    let description = meta
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(|d| {
            format!(
                "<meta name=\"description\" content=\"{}\">\n",
                encode_double_quoted_attribute(d)
            )
        })
        .unwrap_or_default();

    let mut links = String::new();
    for item in navigation {
        links.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            encode_double_quoted_attribute(&item.link),
            encode_text(&item.title)
        ));
    }
    links.push_str("<li><a href=\"/builder\">Builder</a></li>\n");
    links.push_str("<li><a href=\"/search\">Search</a></li>\n");

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n{description}</head>\n\
         <body>\n<div class=\"site\">\n<nav>\n<a class=\"brand\" href=\"/\">Site Builder</a>\n<ul>\n{links}</ul>\n</nav>\n\
         <main>\n{body}\n</main>\n<footer>\n&copy; {year} Site Builder. All rights reserved.\n</footer>\n</div>\n</body>\n</html>\n",
        title = encode_text(title),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let html = render_layout_for_year("<p>Body</p>", &[], &PageMeta::default(), 2024);
        assert!(html.contains("<title>Site Builder</title>"));
        assert!(!html.contains("name=\"description\""));
        assert!(html.contains("<main>\n<p>Body</p>\n</main>"));
        assert!(html.contains("&copy; 2024 Site Builder. All rights reserved."));
    }

    #[test]
    fn test_navigation_precedes_fixed_links() {
        let nav = vec![
            NavigationItem::new("Home", "/"),
            NavigationItem::new("Q&A", "/faq"),
        ];
        let meta = PageMeta {
            title: Some("About".to_string()),
            description: Some("All \"about\" us".to_string()),
        };
        let html = render_layout_for_year("", &nav, &meta, 2030);

        assert!(html.contains("<title>About</title>"));
        assert!(html.contains("content=\"All &quot;about&quot; us\""));

        let home = html.find("<a href=\"/\">Home</a>").unwrap();
        let faq = html.find("Q&amp;A").unwrap();
        let builder = html.find("href=\"/builder\"").unwrap();
        let search = html.find("href=\"/search\"").unwrap();
        assert!(home < faq && faq < builder && builder < search);
    }

    #[test]
    fn test_current_year_in_footer() {
        let html = render_layout("", &[], &PageMeta::titled("x"));
        let year = chrono::Local::now().year();
        assert!(html.contains(&format!("&copy; {} Site Builder", year)));
    }
}
