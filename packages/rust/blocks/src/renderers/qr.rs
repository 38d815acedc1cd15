use serde::Deserialize;
use serde_json::Value;
use sitekit_shared::Result;

use super::{BlockRenderer, decode_props};
use crate::html::escape;

#[derive(Debug, Deserialize)]
struct QrProps {
    value: String,
    #[serde(default)]
    size: Option<u32>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

const DEFAULT_SIZE: u32 = 200;

/// Labelled frame for a QR payload.
///
/// No code image is generated; the frame reserves the area at `size` pixels
/// and prints the encoded value underneath.
pub struct QrRenderer;

impl BlockRenderer for QrRenderer {
    fn render(&self, props: &Value) -> Result<String> {
        let props: QrProps = decode_props(props)?;
        let size = props.size.filter(|s| *s > 0).unwrap_or(DEFAULT_SIZE);

        let mut html = String::from(r#"<div class="qr my-8 text-center">"#);
        if let Some(title) = props.title.as_deref().filter(|t| !t.is_empty()) {
            html.push_str(&format!("<h3>{}</h3>", escape(title)));
        }
        if let Some(description) = props.description.as_deref().filter(|d| !d.is_empty()) {
            html.push_str(&format!("<p>{}</p>", escape(description)));
        }
        html.push_str(&format!(
            r#"<div class="qr-frame inline-block p-4"><div class="qr-code" style="width: {size}px; height: {size}px" role="img" aria-label="QR code"></div><p class="qr-value text-xs break-all">{}</p></div></div>"#,
            escape(&props.value)
        ));
        Ok(html)
    }

    fn name(&self) -> &str {
        "qr"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_size_and_value_label() {
        let html = QrRenderer.render(&json!({ "value": "https://verify.uans.us/id/42" })).unwrap();
        assert!(html.contains("width: 200px; height: 200px"));
        assert!(html.contains("https://verify.uans.us/id/42"));
    }

    #[test]
    fn custom_size_and_title() {
        let html = QrRenderer
            .render(&json!({ "value": "x", "size": 120, "title": "Scan me" }))
            .unwrap();
        assert!(html.contains("width: 120px"));
        assert!(html.contains("<h3>Scan me</h3>"));
    }
}
