//! HTML template rendering for the assistant page.
//!
//! Templates are stored as separate files for maintainability:
//! - `templates/index.html` - HTML structure
//! - `templates/styles.css` - CSS styles
//! - `templates/app.js` - JavaScript application code
//!
//! Files are embedded at compile time using `include_str!`.

// Embed template files at compile time
const HTML_TEMPLATE: &str = include_str!("templates/index.html");
const STYLES: &str = include_str!("templates/styles.css");
const SCRIPT: &str = include_str!("templates/app.js");

/// Render the assistant page.
///
/// Assembles the final HTML by substituting placeholders in the template:
/// - `{{TITLE}}` - Page title
/// - `{{STYLES}}` - CSS styles
/// - `{{SCRIPT}}` - JavaScript code
pub fn render_page(title: &str) -> String {
    HTML_TEMPLATE
        .replace("{{TITLE}}", &html_escape(title))
        .replace("{{STYLES}}", STYLES)
        .replace("{{SCRIPT}}", SCRIPT)
}

/// Escape HTML special characters to prevent XSS.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_is_escaped() {
        let page = render_page("<b>Docs & Chat</b>");
        assert!(page.contains("&lt;b&gt;Docs &amp; Chat&lt;/b&gt;"));
        assert!(!page.contains("{{TITLE}}"));
        assert!(!page.contains("{{SCRIPT}}"));
    }
}
