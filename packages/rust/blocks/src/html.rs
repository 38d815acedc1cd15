//! HTML escaping and rich-text cleanup for block output.

use std::borrow::Cow;
use std::sync::LazyLock;

use scraper::node::Element;
use scraper::{Html, Node, Selector};

/// Characters that require HTML escaping.
const ESCAPE_CHARS: [char; 5] = ['<', '>', '&', '"', '\''];

/// Get the HTML entity for a special character.
#[inline]
fn escape_char(c: char) -> Option<&'static str> {
    match c {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

/// Escape HTML special characters in text content.
///
/// Uses `Cow` to avoid allocation when no escaping is needed.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(ESCAPE_CHARS) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match escape_char(c) {
            Some(entity) => result.push_str(entity),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Escape an attribute value. Same character set as [`escape`].
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    escape(s)
}

/// URL schemes that execute instead of navigate.
const SCRIPT_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:text/html"];

/// Whether a URL would run script once a browser strips the whitespace and
/// control characters it ignores inside a scheme.
fn is_script_url(url: &str) -> bool {
    let normalized: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect::<String>()
        .to_ascii_lowercase();
    SCRIPT_SCHEMES.iter().any(|scheme| normalized.starts_with(scheme))
}

/// Neutralise script URLs in link targets, then escape for an attribute.
pub fn safe_url(url: &str) -> Cow<'_, str> {
    if is_script_url(url) {
        return Cow::Borrowed("#");
    }
    escape_attr(url)
}

static STRIP_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script, style, iframe, object, embed, noscript").expect("valid selector")
});

/// Attributes whose value is fetched or navigated to. `xlink:href` parses
/// with local name `href`.
fn is_url_attr(local: &str) -> bool {
    matches!(
        local,
        "href" | "src" | "action" | "formaction" | "poster" | "background" | "cite" | "data"
    )
}

/// Clean CMS-authored rich text before embedding it.
///
/// Drops executable elements, `on*` event handler attributes, and script
/// URLs in any URL-bearing attribute. Works on the parsed tree, so text
/// content is never touched.
pub fn sanitize_rich_text(content: &str) -> String {
    let mut doc = Html::parse_fragment(content);

    let stripped: Vec<_> = doc.select(&STRIP_SEL).map(|el| el.id()).collect();
    for id in stripped {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }

    let elements: Vec<_> = doc
        .root_element()
        .descendants()
        .filter(|node| node.value().is_element())
        .map(|node| node.id())
        .collect();
    for id in elements {
        if let Some(mut node) = doc.tree.get_mut(id) {
            if let Node::Element(element) = node.value() {
                scrub_attributes(element);
            }
        }
    }

    doc.root_element().inner_html()
}

fn scrub_attributes(element: &mut Element) {
    element
        .attrs
        .retain(|(name, _)| !name.local.to_ascii_lowercase().starts_with("on"));
    for (name, value) in element.attrs.iter_mut() {
        if is_url_attr(&name.local) && is_script_url(value) {
            *value = "#".into();
        }
    }
}
