use serde::Deserialize;
use serde_json::Value;
use sitekit_shared::Result;

use super::{BlockRenderer, decode_props};
use crate::html::escape;

const SVG_OPEN: &str = r#"<svg class="w-8 h-8" fill="none" viewBox="0 0 24 24" stroke="currentColor"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d=""#;
const SVG_CLOSE: &str = r#""/></svg>"#;
const DEFAULT_ICON: &str = r#"<span class="text-2xl">◈</span>"#;

fn icon_path(name: &str) -> Option<&'static str> {
    Some(match name.to_ascii_lowercase().as_str() {
        "shield" => "M9 12l2 2 4-4m5.618-4.016A11.955 11.955 0 0112 2.944a11.955 11.955 0 01-8.618 3.04A12.02 12.02 0 003 9c0 5.591 3.824 10.29 9 11.622 5.176-1.332 9-6.03 9-11.622 0-1.042-.133-2.052-.382-3.016z",
        "document" => "M9 12h6m-6 4h6m2 5H7a2 2 0 01-2-2V5a2 2 0 012-2h5.586a1 1 0 01.707.293l5.414 5.414a1 1 0 01.293.707V19a2 2 0 01-2 2z",
        "users" => "M12 4.354a4 4 0 110 5.292M15 21H3v-1a6 6 0 0112 0v1zm0 0h6v-1a6 6 0 00-9-5.197M13 7a4 4 0 11-8 0 4 4 0 018 0z",
        "globe" => "M3.055 11H5a2 2 0 012 2v1a2 2 0 002 2 2 2 0 012 2v2.945M8 3.935V5.5A2.5 2.5 0 0010.5 8h.5a2 2 0 012 2 2 2 0 104 0 2 2 0 012-2h1.064M15 20.488V18a2 2 0 012-2h3.064M21 12a9 9 0 11-18 0 9 9 0 0118 0z",
        _ => return None,
    })
}

/// Icon markup for a feature; unknown names get the default glyph.
pub fn icon_html(name: &str) -> String {
    match icon_path(name) {
        Some(path) => format!("{SVG_OPEN}{path}{SVG_CLOSE}"),
        None => DEFAULT_ICON.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct FeatureItem {
    #[serde(default)]
    icon: String,
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct FeaturesProps {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    features: Vec<FeatureItem>,
    #[serde(default)]
    columns: Option<u8>,
}

/// Grid of feature cards.
pub struct FeaturesRenderer;

impl BlockRenderer for FeaturesRenderer {
    fn render(&self, props: &Value) -> Result<String> {
        let props: FeaturesProps = decode_props(props)?;
        let columns = props.columns.unwrap_or(3).clamp(2, 4);

        let mut html = String::from(r#"<section class="features py-16"><div class="container">"#);
        if let Some(title) = props.title.as_deref().filter(|t| !t.is_empty()) {
            html.push_str(&format!(r#"<h2 class="text-center">{}</h2>"#, escape(title)));
        }
        html.push_str(&format!(r#"<div class="grid gap-8 md:grid-cols-{columns}">"#));
        for feature in &props.features {
            html.push_str(&format!(
                r#"<div class="feature-card"><div class="feature-icon">{}</div><h3>{}</h3><p>{}</p></div>"#,
                icon_html(&feature.icon),
                escape(&feature.title),
                escape(&feature.description)
            ));
        }
        html.push_str("</div></div></section>");
        Ok(html)
    }

    fn name(&self) -> &str {
        "features"
    }
}
