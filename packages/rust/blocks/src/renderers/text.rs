use serde::Deserialize;
use serde_json::Value;
use sitekit_shared::Result;

use super::{Align, BlockRenderer, decode_props};
use crate::html::sanitize_rich_text;

#[derive(Debug, Deserialize)]
struct TextProps {
    content: String,
    #[serde(default)]
    align: Option<Align>,
}

/// CMS-authored rich text, sanitized before embedding.
pub struct TextRenderer;

impl BlockRenderer for TextRenderer {
    fn render(&self, props: &Value) -> Result<String> {
        let props: TextProps = decode_props(props)?;
        let align = match props.align.unwrap_or(Align::Left) {
            Align::Left => "text-left",
            Align::Center => "text-center mx-auto",
            Align::Right => "text-right",
        };
        Ok(format!(
            r#"<div class="prose max-w-3xl {align}"><div class="text-content">{}</div></div>"#,
            sanitize_rich_text(&props.content)
        ))
    }

    fn name(&self) -> &str {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_markup_inside_prose() {
        let html = TextRenderer
            .render(&json!({ "content": "<p>Hello</p>", "align": "center" }))
            .unwrap();
        assert!(html.contains("text-center mx-auto"));
        assert!(html.contains("<p>Hello</p>"));
    }

    #[test]
    fn strips_script() {
        let html = TextRenderer
            .render(&json!({ "content": "<p>ok</p><script>alert(1)</script>" }))
            .unwrap();
        assert!(!html.contains("alert"));
    }

    #[test]
    fn unknown_alignment_is_rejected() {
        assert!(TextRenderer
            .render(&json!({ "content": "x", "align": "justify" }))
            .is_err());
    }
}
