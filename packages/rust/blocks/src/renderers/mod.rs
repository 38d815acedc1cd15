//! Block renderer trait and the type → renderer table.
//!
//! Each renderer turns a block's `props` into an HTML fragment. Renderers
//! decode their own typed props; the dispatcher never looks inside them.

mod callout;
mod features;
mod form;
mod hero;
mod layout;
mod media;
mod placeholder;
mod qr;
mod text;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sitekit_shared::{BlockType, Result, SiteKitError};

pub use callout::{CtaRenderer, QuoteRenderer};
pub use features::FeaturesRenderer;
pub use form::{FieldKind, FormField, FormProps, FormRenderer};
pub use hero::HeroRenderer;
pub use layout::{DividerRenderer, SpacerRenderer};
pub use media::{ImageRenderer, VideoRenderer};
pub use placeholder::{PlaceholderRenderer, placeholder_html};
pub use qr::QrRenderer;
pub use text::TextRenderer;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Renders one block type.
pub trait BlockRenderer: Send + Sync {
    /// Render the block's props to an HTML fragment.
    ///
    /// An `Err` means the props could not be interpreted; the caller falls
    /// back to a placeholder.
    fn render(&self, props: &Value) -> Result<String>;

    /// Renderer name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

static GLOBE: PlaceholderRenderer = PlaceholderRenderer("globe");
static MAP: PlaceholderRenderer = PlaceholderRenderer("map");
static CUSTOM: PlaceholderRenderer = PlaceholderRenderer("custom");

/// Renderer for a block type, or `None` for types this build doesn't know.
pub fn renderer_for(kind: &BlockType) -> Option<&'static dyn BlockRenderer> {
    let renderer: &'static dyn BlockRenderer = match kind {
        BlockType::Hero => &HeroRenderer,
        BlockType::Text => &TextRenderer,
        BlockType::Image => &ImageRenderer,
        BlockType::Form => &FormRenderer,
        BlockType::Features => &FeaturesRenderer,
        BlockType::Cta => &CtaRenderer,
        BlockType::Quote => &QuoteRenderer,
        BlockType::Qr => &QrRenderer,
        BlockType::Video => &VideoRenderer,
        BlockType::Spacer => &SpacerRenderer,
        BlockType::Divider => &DividerRenderer,
        BlockType::Globe => &GLOBE,
        BlockType::Map => &MAP,
        BlockType::Custom => &CUSTOM,
        BlockType::Unknown(_) => return None,
    };
    Some(renderer)
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Decode typed props. A `null` props value decodes like `{}`.
pub(crate) fn decode_props<T: DeserializeOwned>(props: &Value) -> Result<T> {
    let decoded = if props.is_null() {
        T::deserialize(&Value::Object(serde_json::Map::new()))
    } else {
        T::deserialize(props)
    };
    decoded.map_err(|e| SiteKitError::parse(format!("invalid block props: {e}")))
}

/// Horizontal alignment shared by several blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Strip characters that would let a value escape an inline `style`.
pub(crate) fn css_token(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ';' | '{' | '}' | '<' | '>' | '"' | '\'' | '(' | ')' | '\\'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Chevron used after call-to-action links.
pub(crate) const ARROW_SVG: &str = r#"<svg class="w-4 h-4" fill="none" viewBox="0 0 24 24" stroke="currentColor"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M9 5l7 7-7 7"/></svg>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_known_type_has_a_renderer() {
        for kind in BlockType::KNOWN {
            assert!(renderer_for(&kind).is_some(), "no renderer for {kind}");
        }
        assert!(renderer_for(&BlockType::from("unknown_type_x")).is_none());
    }

    #[test]
    fn null_props_decode_as_empty_object() {
        #[derive(Deserialize)]
        struct Opt {
            #[serde(default)]
            height: Option<String>,
        }
        let opt: Opt = decode_props(&Value::Null).unwrap();
        assert!(opt.height.is_none());
    }

    #[test]
    fn decode_failure_is_parse_error() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Needs {
            title: String,
        }
        let err = decode_props::<Needs>(&json!({ "title": 5 })).unwrap_err();
        assert!(matches!(err, SiteKitError::Parse { .. }));
    }

    #[test]
    fn css_token_removes_breakouts() {
        assert_eq!(css_token("red; } body {"), "red  body");
        assert_eq!(css_token("url(javascript:x)"), "urljavascript:x");
    }
}
