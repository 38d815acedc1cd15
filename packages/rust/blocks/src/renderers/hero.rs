use serde::Deserialize;
use serde_json::Value;
use sitekit_shared::Result;

use super::{ARROW_SVG, Align, BlockRenderer, css_token, decode_props};
use crate::html::{escape, escape_attr, safe_url};

/// How a hero's `background_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundType {
    Color,
    Image,
    #[default]
    Gradient,
}

#[derive(Debug, Deserialize)]
struct HeroProps {
    title: String,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    cta_text: Option<String>,
    #[serde(default)]
    cta_link: Option<String>,
    #[serde(default)]
    background_type: Option<BackgroundType>,
    #[serde(default)]
    background_value: Option<String>,
    #[serde(default)]
    text_align: Option<Align>,
}

const DEFAULT_GRADIENT: &str = "from-uan-primary to-uan-muted";

/// Full-width hero section.
pub struct HeroRenderer;

impl BlockRenderer for HeroRenderer {
    fn render(&self, props: &Value) -> Result<String> {
        let props: HeroProps = decode_props(props)?;
        let background = props.background_type.unwrap_or_default();
        let value = props
            .background_value
            .as_deref()
            .filter(|v| !v.trim().is_empty());

        let (bg_class, style) = match background {
            BackgroundType::Gradient => (
                format!(" bg-gradient-to-br {}", escape_attr(value.unwrap_or(DEFAULT_GRADIENT))),
                String::new(),
            ),
            BackgroundType::Color => (
                String::new(),
                value
                    .map(|v| format!(r#" style="background-color: {}""#, css_token(v)))
                    .unwrap_or_default(),
            ),
            BackgroundType::Image => (
                String::new(),
                value
                    .map(|v| {
                        format!(
                            r#" style="background-image: url({}); background-size: cover; background-position: center""#,
                            css_token(v)
                        )
                    })
                    .unwrap_or_default(),
            ),
        };

        let align = match props.text_align.unwrap_or(Align::Center) {
            Align::Left => "text-left",
            Align::Center => "text-center",
            Align::Right => "text-right",
        };

        let mut html = format!(
            r#"<section class="hero py-20{bg_class}"{style}><div class="container {align}"><span class="hero-mark">◈</span><h1 class="hero-title">{}</h1>"#,
            escape(&props.title)
        );
        if let Some(subtitle) = props.subtitle.as_deref().filter(|s| !s.is_empty()) {
            html.push_str(&format!(r#"<p class="hero-subtitle">{}</p>"#, escape(subtitle)));
        }
        if let (Some(text), Some(link)) = (
            props.cta_text.as_deref().filter(|s| !s.is_empty()),
            props.cta_link.as_deref().filter(|s| !s.is_empty()),
        ) {
            html.push_str(&format!(
                r#"<a class="btn btn-accent" href="{}">{}{ARROW_SVG}</a>"#,
                safe_url(link),
                escape(text)
            ));
        }
        html.push_str("</div></section>");
        Ok(html)
    }

    fn name(&self) -> &str {
        "hero"
    }
}
