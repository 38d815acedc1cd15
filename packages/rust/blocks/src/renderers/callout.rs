use serde::Deserialize;
use serde_json::Value;
use sitekit_shared::Result;

use super::{ARROW_SVG, BlockRenderer, decode_props};
use crate::html::{escape, escape_attr, safe_url};

#[derive(Debug, Deserialize)]
struct CtaProps {
    title: String,
    #[serde(default)]
    description: Option<String>,
    button_text: String,
    button_link: String,
    #[serde(default)]
    background: Option<String>,
}

/// Call-to-action section.
pub struct CtaRenderer;

impl BlockRenderer for CtaRenderer {
    fn render(&self, props: &Value) -> Result<String> {
        let props: CtaProps = decode_props(props)?;
        let background = props
            .background
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or("bg-uan-secondary");

        let mut html = format!(
            r#"<section class="cta py-16 {}"><div class="container text-center"><h2>{}</h2>"#,
            escape_attr(background),
            escape(&props.title)
        );
        if let Some(description) = props.description.as_deref().filter(|d| !d.is_empty()) {
            html.push_str(&format!("<p>{}</p>", escape(description)));
        }
        html.push_str(&format!(
            r#"<a class="btn btn-primary" href="{}">{}{ARROW_SVG}</a></div></section>"#,
            safe_url(&props.button_link),
            escape(&props.button_text)
        ));
        Ok(html)
    }

    fn name(&self) -> &str {
        "cta"
    }
}

#[derive(Debug, Deserialize)]
struct QuoteProps {
    quote: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    role: Option<String>,
}

/// Testimonial or pull quote.
pub struct QuoteRenderer;

impl BlockRenderer for QuoteRenderer {
    fn render(&self, props: &Value) -> Result<String> {
        let props: QuoteProps = decode_props(props)?;

        let mut html = format!(
            r#"<blockquote class="my-12 max-w-2xl mx-auto text-center"><div class="quote-mark">&quot;</div><p class="italic">{}</p><footer><cite>{}</cite>"#,
            escape(&props.quote),
            escape(&props.author)
        );
        if let Some(role) = props.role.as_deref().filter(|r| !r.is_empty()) {
            html.push_str(&format!(r#"<span class="block text-sm">{}</span>"#, escape(role)));
        }
        html.push_str("</footer></blockquote>");
        Ok(html)
    }

    fn name(&self) -> &str {
        "quote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cta_uses_default_background() {
        let html = CtaRenderer
            .render(&json!({ "title": "Join", "button_text": "Apply", "button_link": "/apply" }))
            .unwrap();
        assert!(html.contains("bg-uan-secondary"));
        assert!(html.contains(r#"href="/apply""#));
        assert!(!html.contains("<p>"));
    }

    #[test]
    fn cta_requires_button() {
        assert!(CtaRenderer.render(&json!({ "title": "Join" })).is_err());
    }

    #[test]
    fn quote_with_role() {
        let html = QuoteRenderer
            .render(&json!({ "quote": "Liberty & order", "author": "A. Citizen", "role": "Delegate" }))
            .unwrap();
        assert!(html.contains("Liberty &amp; order"));
        assert!(html.contains("<cite>A. Citizen</cite>"));
        assert!(html.contains("Delegate"));
    }
}
