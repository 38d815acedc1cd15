use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use sitekit_shared::Result;
use tracing::debug;

use super::{BlockRenderer, decode_props};

const DEFAULT_HEIGHT: &str = "64px";

static CSS_LENGTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0|\d+(\.\d+)?(px|rem|em|vh|vw|%))$").expect("valid regex")
});

#[derive(Debug, Deserialize)]
struct SpacerProps {
    #[serde(default)]
    height: Option<String>,
}

/// Vertical whitespace.
pub struct SpacerRenderer;

impl BlockRenderer for SpacerRenderer {
    fn render(&self, props: &Value) -> Result<String> {
        let props: SpacerProps = decode_props(props)?;
        let height = match props.height.as_deref().map(str::trim) {
            Some(h) if CSS_LENGTH_RE.is_match(h) => h,
            Some(h) if !h.is_empty() => {
                debug!(height = h, "spacer height is not a CSS length; using default");
                DEFAULT_HEIGHT
            }
            _ => DEFAULT_HEIGHT,
        };
        Ok(format!(r#"<div class="spacer" style="height: {height}" aria-hidden="true"></div>"#))
    }

    fn name(&self) -> &str {
        "spacer"
    }
}

/// Horizontal rule. Ignores its props.
pub struct DividerRenderer;

impl BlockRenderer for DividerRenderer {
    fn render(&self, _props: &Value) -> Result<String> {
        Ok(r#"<hr class="my-8 border-t border-uan-border">"#.to_string())
    }

    fn name(&self) -> &str {
        "divider"
    }
}
