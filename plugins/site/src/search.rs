//! Keyword search over the site's pages

use serde::{Deserialize, Serialize};

const TITLE_SCORE: u32 = 10;
const CONTENT_SCORE: u32 = 5;
const EXCERPT_CONTEXT: usize = 20;
const EXCERPT_FALLBACK: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchablePage {
    pub slug: String,
    pub title: String,
    pub content: String,
}

impl SearchablePage {
    pub fn new(slug: &str, title: &str, content: &str) -> Self {
        Self {
            slug: slug.to_string(),
            title: title.to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub score: u32,
}

/// The pages every site starts with
pub fn builtin_pages() -> Vec<SearchablePage> {
    vec![
        SearchablePage::new(
            "home",
            "Home Page",
            "Welcome to our site builder. Create beautiful pages with our easy-to-use editor.",
        ),
        SearchablePage::new(
            "about",
            "About Us",
            "We are a team dedicated to making website building accessible to everyone.",
        ),
        SearchablePage::new(
            "features",
            "Features",
            "Our site builder includes blocks for text, images, videos, and even AI chatbots.",
        ),
        SearchablePage::new(
            "pricing",
            "Pricing Plans",
            "Choose from our flexible pricing plans to suit your needs.",
        ),
        SearchablePage::new(
            "contact",
            "Contact Us",
            "Get in touch with our support team for any questions or feedback.",
        ),
    ]
}

pub struct SearchIndex {
    pages: Vec<SearchablePage>,
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new(builtin_pages())
    }
}

impl SearchIndex {
    pub fn new(pages: Vec<SearchablePage>) -> Self {
        Self { pages }
    }

    pub fn pages(&self) -> &[SearchablePage] {
        &self.pages
    }

    /// Case-insensitive substring search, best matches first.
    ///
    /// Ties keep corpus order. A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        let needle = query.to_lowercase();
        let mut results: Vec<SearchResult> = self
            .pages
            .iter()
            .filter_map(|page| {
                let (folded, origin) = fold(&page.content);
                let content_hit = folded.find(&needle).map(|at| origin[at]);

                let mut score = 0;
                if page.title.to_lowercase().contains(&needle) {
                    score += TITLE_SCORE;
                }
                if content_hit.is_some() {
                    score += CONTENT_SCORE;
                }
                if score == 0 {
                    return None;
                }

                let excerpt = match content_hit {
                    Some(start) => {
                        let from = start.saturating_sub(EXCERPT_CONTEXT);
                        let to = start + query.chars().count() + EXCERPT_CONTEXT;
                        format!("...{}...", char_slice(&page.content, from, to))
                    }
                    None => format!("{}...", char_slice(&page.content, 0, EXCERPT_FALLBACK)),
                };

                Some(SearchResult {
                    slug: page.slug.clone(),
                    title: page.title.clone(),
                    excerpt,
                    score,
                })
            })
            .collect();

        results.sort_by(|a, b| b.score.cmp(&a.score));
        results
    }
}

/// Lower-cased text plus, for each of its bytes, the char index it came from
fn fold(text: &str) -> (String, Vec<usize>) {
    let mut folded = String::with_capacity(text.len());
    let mut origin = Vec::with_capacity(text.len());
    for (index, c) in text.chars().enumerate() {
        for lower in c.to_lowercase() {
            folded.push(lower);
            origin.extend(std::iter::repeat(index).take(lower.len_utf8()));
        }
    }
    (folded, origin)
}

fn char_slice(text: &str, from: usize, to: usize) -> String {
    text.chars().skip(from).take(to.saturating_sub(from)).collect()
}
