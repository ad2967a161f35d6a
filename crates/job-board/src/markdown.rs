//! Markdown rendering for job descriptions and application instructions.

use pulldown_cmark::{html, Event, Options, Parser, Tag};

const SAFE_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Render `source` to HTML. Raw HTML in the input is removed, not escaped,
/// and links or images with an unsafe URL scheme are reduced to their text.
pub fn render(source: &str) -> String {
    let mut in_unsafe_link = false;
    let mut in_unsafe_image = false;

    let parser = Parser::new_ext(source, Options::ENABLE_STRIKETHROUGH).filter(|event| {
        match event {
            Event::Html(_) => false,
            Event::Start(Tag::Link(_, dest, _)) if !is_safe_url(dest) => {
                in_unsafe_link = true;
                false
            }
            Event::End(Tag::Link(..)) if in_unsafe_link => {
                in_unsafe_link = false;
                false
            }
            Event::Start(Tag::Image(_, dest, _)) if !is_safe_url(dest) => {
                in_unsafe_image = true;
                false
            }
            Event::End(Tag::Image(..)) if in_unsafe_image => {
                in_unsafe_image = false;
                false
            }
            _ => true,
        }
    });

    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Relative URLs and the `http`, `https` and `mailto` schemes pass.
/// Whitespace and control characters are ignored, as browsers do.
fn is_safe_url(url: &str) -> bool {
    let compact: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();

    match compact.find(|c| matches!(c, ':' | '/' | '?' | '#')) {
        Some(index) if compact[index..].starts_with(':') => {
            let scheme = &compact[..index];
            SAFE_SCHEMES
                .iter()
                .any(|safe| scheme.eq_ignore_ascii_case(safe))
        }
        _ => true,
    }
}
