use serde::Deserialize;
use serde_json::Value;
use sitekit_shared::Result;

use super::{BlockRenderer, decode_props};
use crate::html::{escape, escape_attr, safe_url};

fn yes() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ImageProps {
    src: String,
    #[serde(default)]
    alt: String,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default = "yes")]
    rounded: bool,
    #[serde(default = "yes")]
    shadow: bool,
}

/// Figure with optional caption.
pub struct ImageRenderer;

impl BlockRenderer for ImageRenderer {
    fn render(&self, props: &Value) -> Result<String> {
        let props: ImageProps = decode_props(props)?;

        let mut class = String::from("w-full max-w-3xl mx-auto");
        if props.rounded {
            class.push_str(" rounded-lg");
        }
        if props.shadow {
            class.push_str(" shadow-lg");
        }

        let mut html = format!(
            r#"<figure class="my-8"><img src="{}" alt="{}" class="{class}" loading="lazy">"#,
            safe_url(&props.src),
            escape_attr(&props.alt)
        );
        if let Some(caption) = props.caption.as_deref().filter(|c| !c.is_empty()) {
            html.push_str(&format!(
                r#"<figcaption class="text-center text-sm">{}</figcaption>"#,
                escape(caption)
            ));
        }
        html.push_str("</figure>");
        Ok(html)
    }

    fn name(&self) -> &str {
        "image"
    }
}

#[derive(Debug, Deserialize)]
struct VideoProps {
    src: String,
    #[serde(default)]
    poster: Option<String>,
    #[serde(default)]
    autoplay: bool,
    #[serde(default = "yes")]
    controls: bool,
}

/// Embedded `<video>` element.
pub struct VideoRenderer;

impl BlockRenderer for VideoRenderer {
    fn render(&self, props: &Value) -> Result<String> {
        let props: VideoProps = decode_props(props)?;

        let mut attrs = format!(r#"src="{}""#, safe_url(&props.src));
        if let Some(poster) = props.poster.as_deref().filter(|p| !p.is_empty()) {
            attrs.push_str(&format!(r#" poster="{}""#, safe_url(poster)));
        }
        if props.autoplay {
            // Browsers refuse unmuted autoplay.
            attrs.push_str(" autoplay muted");
        }
        if props.controls {
            attrs.push_str(" controls");
        }

        Ok(format!(
            r#"<div class="my-8 max-w-4xl mx-auto"><video {attrs} class="w-full rounded-lg shadow-lg"></video></div>"#
        ))
    }

    fn name(&self) -> &str {
        "video"
    }
}
