use serde::Deserialize;
use serde_json::Value;
use sitekit_shared::Result;

use super::BlockRenderer;
use crate::html::escape;

/// Neutral stand-in box labelled `Block: <label>`.
pub fn placeholder_html(label: &str) -> String {
    format!(
        r#"<div class="block-placeholder my-8 p-8 text-center"><p>Block: {}</p></div>"#,
        escape(label)
    )
}

#[derive(Debug, Default, Deserialize)]
struct Label {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

/// Placeholder for block types with no real renderer yet.
///
/// The label prefers a `name` or `type` in the props and falls back to the
/// block type this renderer was registered for.
pub struct PlaceholderRenderer(pub &'static str);

impl BlockRenderer for PlaceholderRenderer {
    fn render(&self, props: &Value) -> Result<String> {
        // Props of these blocks are free-form; a shape mismatch just means no label.
        let label = Label::deserialize(props).unwrap_or_default();
        let text = label
            .name
            .filter(|s| !s.is_empty())
            .or(label.kind.filter(|s| !s.is_empty()))
            .unwrap_or_else(|| self.0.to_string());
        Ok(placeholder_html(&text))
    }

    fn name(&self) -> &str {
        self.0
    }
}
