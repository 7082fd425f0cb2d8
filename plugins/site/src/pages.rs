//! Page bodies for the public site, the builder dashboard and the search page

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::deployment::DeploymentStatus;
use crate::search::SearchResult;

/// Entry points linked from the home page, as (link, label)
pub const HOME_LINKS: [(&str, &str); 6] = [
    ("/builder", "Builder Dashboard"),
    ("/builder/edit/test-page", "Edit Test Page"),
    ("/chatbot-demo", "Chatbot Demo"),
    ("/search", "Search Pages"),
    ("/test-page", "View Test Page"),
    ("/example-page", "Example Page"),
];

/// Messages suggested on the chatbot demo page
pub const DEMO_SUGGESTIONS: [&str; 4] = ["Hello", "I need help", "Goodbye", "Any other message"];

pub fn render_home() -> String {
    let links: String = HOME_LINKS
        .iter()
        .map(|(href, label)| format!("<li><a href=\"{}\" class=\"card\">{}</a></li>\n", href, label))
        .collect();

    format!(
        "<h1>Welcome to the Self-Hosted Builder</h1>\n<div class=\"grid\">\n<h2>Test Navigation Links</h2>\n\
         <ul>\n{links}</ul>\n<p>These links are for testing purposes and can be removed later.</p>\n</div>"
    )
}

/// Public view of a page. Without published content only the slug is shown.
pub fn render_public_page(slug: &str, title: Option<&str>, html: Option<&str>) -> String {
    let heading = encode_text(title.unwrap_or(slug));
    match html {
        Some(html) => format!(
            "<h1>{}</h1>\n<article class=\"page-content\" data-page=\"{}\">\n{}\n</article>",
            heading,
            encode_double_quoted_attribute(slug),
            html
        ),
        None => format!("<h1>{}</h1>", heading),
    }
}

/// Chatbot demo around an already rendered chat panel
pub fn render_chatbot_demo(chat_panel: &str) -> String {
    let suggestions: String = DEMO_SUGGESTIONS
        .iter()
        .map(|message| format!("<li>{}</li>\n", message))
        .collect();

    format!(
        "<h1>Chatbot Demo</h1>\n<div class=\"chatbot-demo\">\n{chat_panel}\n</div>\n\
         <div class=\"chat-suggestions\">\n<h2>Try these messages:</h2>\n<ul>\n{suggestions}</ul>\n</div>"
    )
}

/// Body of the builder dashboard for the given deployment status
pub fn render_dashboard(status: &DeploymentStatus) -> String {
    let message = match status {
        DeploymentStatus::Success => {
            "<p class=\"deploy-success\">Deployment successful! Your site is now live.</p>\n"
        }
        DeploymentStatus::Error(_) => {
            "<p class=\"deploy-error\">Deployment failed. Please try again.</p>\n"
        }
        DeploymentStatus::Idle | DeploymentStatus::Deploying => "",
    };

    let button = if *status == DeploymentStatus::Deploying {
        "<button data-testid=\"deploy-button\" disabled>Deploying...</button>"
    } else {
        "<button data-testid=\"deploy-button\" formaction=\"/api/deploy\" formmethod=\"post\">Deploy Site</button>"
    };

    format!(
        "<h1>Builder Dashboard</h1>\n<section class=\"site-management\">\n<h2>Site Management</h2>\n\
         <p>Deploy your site to make your changes live.</p>\n{message}<form>{button}</form>\n</section>"
    )
}

/// Body of the search page
pub fn render_search_page(query: &str, results: &[SearchResult]) -> String {
    let mut html = format!(
        "<h1>Search</h1>\n<form action=\"/search\" method=\"get\" data-testid=\"search-form\">\n\
         <input type=\"text\" name=\"q\" value=\"{}\" placeholder=\"Enter keywords to search...\" data-testid=\"search-input\">\n\
         <button type=\"submit\" data-testid=\"search-button\">Search</button>\n</form>\n\
         <div class=\"search-results\" data-testid=\"search-results\">\n",
        encode_double_quoted_attribute(query)
    );

    if !query.is_empty() && results.is_empty() {
        html.push_str(&format!(
            "<p>No results found for \"{}\"</p>\n",
            encode_text(query)
        ));
    } else if !results.is_empty() {
        let plural = if results.len() == 1 { "" } else { "s" };
        html.push_str(&format!(
            "<h2>{} result{} for \"{}\"</h2>\n<ul>\n",
            results.len(),
            plural,
            encode_text(query)
        ));
        for result in results {
            html.push_str(&format!(
                "<li data-testid=\"search-result-{slug}\"><a href=\"/{slug}\">{title}</a>\n<p>{excerpt}</p></li>\n",
                slug = encode_double_quoted_attribute(&result.slug),
                title = encode_text(&result.title),
                excerpt = encode_text(&result.excerpt),
            ));
        }
        html.push_str("</ul>\n");
    }

    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchIndex;

    #[test]
    fn test_home_lists_entry_points() {
        let html = render_home();
        assert!(html.contains("<h1>Welcome to the Self-Hosted Builder</h1>"));
        for (href, label) in HOME_LINKS {
            assert!(html.contains(&format!("<a href=\"{}\" class=\"card\">{}</a>", href, label)));
        }
    }

    #[test]
    fn test_public_page_variants() {
        assert_eq!(render_public_page("test-page", None, None), "<h1>test-page</h1>");

        let html = render_public_page("launch", Some("Launch <Day>"), Some("<p>Soon</p>"));
        assert!(html.starts_with("<h1>Launch &lt;Day&gt;</h1>"));
        assert!(html.contains("data-page=\"launch\">\n<p>Soon</p>\n</article>"));
    }

    #[test]
    fn test_chatbot_demo_suggestions() {
        let html = render_chatbot_demo("<div class=\"chatbot\"></div>");
        assert!(html.contains("<h1>Chatbot Demo</h1>"));
        assert!(html.contains("<div class=\"chatbot\"></div>"));
        assert!(html.contains("<li>I need help</li>"));
    }

    #[test]
    fn test_dashboard_states() {
        let idle = render_dashboard(&DeploymentStatus::Idle);
        assert!(idle.contains("Deploy Site"));
        assert!(!idle.contains("Deployment successful!"));

        let busy = render_dashboard(&DeploymentStatus::Deploying);
        assert!(busy.contains("disabled>Deploying...</button>"));

        let done = render_dashboard(&DeploymentStatus::Success);
        assert!(done.contains("Deployment successful! Your site is now live."));

        let failed = render_dashboard(&DeploymentStatus::Error("boom".to_string()));
        assert!(failed.contains("Deployment failed. Please try again."));
    }

    #[test]
    fn test_search_page_counts() {
        let results = SearchIndex::default().search("site builder");
        let html = render_search_page("site builder", &results);
        assert!(html.contains("<h2>2 results for \"site builder\"</h2>"));
        assert!(html.contains("data-testid=\"search-result-home\""));

        let results = SearchIndex::default().search("pricing");
        assert!(render_search_page("pricing", &results).contains("1 result for"));
    }

    #[test]
    fn test_search_page_empty_states() {
        assert!(render_search_page("zebra", &[]).contains("No results found for \"zebra\""));

        let blank = render_search_page("", &[]);
        assert!(!blank.contains("No results"));
        assert!(!blank.contains("<ul>"));
    }
}
