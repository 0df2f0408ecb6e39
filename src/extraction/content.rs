// src/extraction/content.rs
//! Plain-text rendering of a job page for the completion model

use crate::utils::{collapse_whitespace, truncate_chars};
use scraper::{ElementRef, Html, Node, Selector};

/// Upper bound on the text handed to the completion model.
pub const MAX_TEXT_CHARS: usize = 6000;

const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "iframe", "img", "noscript", "header", "footer", "nav", "form",
];

// Word breaks are kept at these boundaries; inline markup joins directly
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "tr", "td", "th", "table", "section", "article",
    "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "dd", "dt",
];

const MARKUP_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "b", "strong", "i", "em", "span", "a",
    "h1", "h2", "h3", "h4", "h5", "h6",
];

// First selector yielding any text wins
const CONTENT_ROOTS: &[&str] = &["article", "main", "body", "html"];

/// Strip chrome and hidden elements, then return the whitespace-collapsed
/// text of the most specific content root, capped at [`MAX_TEXT_CHARS`].
pub fn extract_clean_text(html: &str) -> String {
    let document = Html::parse_document(html);

    for root in CONTENT_ROOTS {
        let Ok(selector) = Selector::parse(root) else {
            continue;
        };

        let mut raw = String::new();
        for element in document.select(&selector) {
            if is_skipped(element) || has_skipped_ancestor(element) {
                continue;
            }
            collect_text(element, &mut raw);
            raw.push(' ');
        }

        let text = collapse_whitespace(&raw);
        if !text.is_empty() {
            return truncate_chars(&text, MAX_TEXT_CHARS);
        }
    }

    String::new()
}

/// Text content of an HTML fragment (e.g. a JSON-LD description).
pub fn strip_html_fragment(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    let mut raw = String::new();
    collect_text(parsed.root_element(), &mut raw);

    // Descriptions are sometimes entity-encoded HTML: no real tags on the
    // first pass, markup tags once decoded
    if !has_elements(parsed.root_element()) {
        let decoded = Html::parse_fragment(&raw);
        if decoded
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .any(|el| MARKUP_TAGS.contains(&el.value().name()))
        {
            raw.clear();
            collect_text(decoded.root_element(), &mut raw);
        }
    }

    collapse_whitespace(&raw)
}

fn has_elements(root: ElementRef) -> bool {
    root.descendants().skip(1).any(|node| node.value().is_element())
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let Some(child_element) = ElementRef::wrap(child) else {
                    continue;
                };
                if is_skipped(child_element) {
                    continue;
                }
                let block = BLOCK_TAGS.contains(&el.name());
                if block {
                    out.push(' ');
                }
                collect_text(child_element, out);
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn is_skipped(element: ElementRef) -> bool {
    let el = element.value();
    SKIPPED_TAGS.contains(&el.name())
        || el.attr("aria-hidden") == Some("true")
        || el.classes().any(|class| class == "hidden")
}

fn has_skipped_ancestor(element: ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(is_skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_article_content() {
        let html = r#"<html><body>
            <header>Site header</header>
            <nav>Jobs | Companies</nav>
            <article><h1>Data Analyst</h1><p>Analyze   things.</p></article>
            <footer>Copyright</footer>
        </body></html>"#;

        assert_eq!(extract_clean_text(html), "Data Analyst Analyze things.");
    }

    #[test]
    fn test_falls_back_to_main_then_body() {
        let main_html = "<html><body><p>outside</p><main>Inside main</main></body></html>";
        assert_eq!(extract_clean_text(main_html), "Inside main");

        let body_html = "<html><body><div>Only body <span>text</span></div></body></html>";
        assert_eq!(extract_clean_text(body_html), "Only body text");
    }

    #[test]
    fn test_empty_article_is_skipped() {
        let html = "<html><body><article>  </article><main>Real content</main></body></html>";
        assert_eq!(extract_clean_text(html), "Real content");
    }

    #[test]
    fn test_removes_hidden_and_non_content_elements() {
        let html = r#"<html><head><style>.x{color:red}</style></head><body>
            <script>var tracking = true;</script>
            <div aria-hidden="true">Screen reader junk</div>
            <div class="banner hidden">Hidden banner</div>
            <form><input value="email"/>Subscribe</form>
            <noscript>Enable JS</noscript>
            <p>Visible posting text</p>
        </body></html>"#;

        assert_eq!(extract_clean_text(html), "Visible posting text");
    }

    #[test]
    fn test_article_inside_removed_element_is_ignored() {
        let html = "<html><body><header><article>Promo</article></header><main>Posting</main></body></html>";
        assert_eq!(extract_clean_text(html), "Posting");
    }

    #[test]
    fn test_truncates_to_cap() {
        let html = format!("<html><body><p>{}</p></body></html>", "word ".repeat(3000));
        let text = extract_clean_text(&html);
        assert_eq!(text.chars().count(), MAX_TEXT_CHARS);
    }

    #[test]
    fn test_strip_html_fragment() {
        assert_eq!(
            strip_html_fragment("<p>We are <strong>hiring</strong>.</p><ul><li>Rust</li></ul>"),
            "We are hiring. Rust"
        );
        assert_eq!(
            strip_html_fragment("&lt;p&gt;Encoded &amp;lt;b&amp;gt;&lt;/p&gt;"),
            "Encoded <b>"
        );
        assert_eq!(
            strip_html_fragment("Line one<br>Line two"),
            "Line one Line two"
        );
    }

    #[test]
    fn test_inline_markup_does_not_split_words() {
        let html = "<html><body><p>Pay: $<b>80</b>,000. Sen<i>ior</i> role at <a>Acme</a>.</p></body></html>";
        assert_eq!(extract_clean_text(html), "Pay: $80,000. Senior role at Acme.");
    }

    #[test]
    fn test_block_elements_keep_word_breaks() {
        let html = "<html><body><ul><li>Rust</li><li>SQL</li></ul><h2>Perks</h2><p>Remote</p></body></html>";
        assert_eq!(extract_clean_text(html), "Rust SQL Perks Remote");
    }

    #[test]
    fn test_escaped_generics_survive() {
        assert_eq!(
            strip_html_fragment("Experience with List&lt;String&gt; in Java"),
            "Experience with List<String> in Java"
        );
        assert_eq!(
            strip_html_fragment("<p>Knows Map&lt;K, V&gt; well</p>"),
            "Knows Map<K, V> well"
        );
    }
}
