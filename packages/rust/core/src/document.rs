//! Full HTML documents for each page state.

use chrono::{Datelike, Utc};
use sitekit_blocks::html::{escape, escape_attr, safe_url};
use sitekit_blocks::render_blocks;
use sitekit_shared::{NavigationItem, Theme};
use sitekit_theme::{StyleScope, apply, default_theme};
use tracing::debug;

use crate::compose::{LoadedPage, PageState};

/// A finished HTML document plus counts from its block pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub html: String,
    /// Blocks rendered into the body.
    pub blocks: usize,
    /// Blocks that fell back to a placeholder.
    pub fallbacks: usize,
}

impl RenderedDocument {
    fn status(html: String) -> Self {
        Self {
            html,
            blocks: 0,
            fallbacks: 0,
        }
    }
}

/// Render a loaded page with its site's theme applied to `scope`.
///
/// The theme is released before returning, so `scope` is left as it was.
pub fn render_document(page: &LoadedPage, scope: &mut StyleScope, is_dark: bool) -> RenderedDocument {
    let site = &page.site_data.site;
    let applied = apply(scope, &page.site_data.theme, is_dark);
    let head = head_html(
        &page.metadata.title,
        Some(&page.metadata.description),
        &applied.scope().to_css(),
    );
    let root_class = applied.scope().class_attr();
    applied.release();

    let sequence = render_blocks(&page.blocks);
    let main = if sequence.is_empty() {
        r#"<div class="container py-12 text-center">No content available</div>"#.to_string()
    } else {
        sequence.to_html()
    };
    let fallbacks = sequence.fallbacks().count();
    debug!(site = %site.id, blocks = sequence.len(), fallbacks, "document rendered");

    let mut body = String::from(r#"<div class="min-h-screen flex flex-col">"#);
    body.push_str(&header_html(&site.name, page.logo_url.as_deref(), &page.site_data.navigation));
    body.push_str(r#"<main class="flex-1">"#);
    body.push_str(&main);
    body.push_str("</main>");
    body.push_str(&footer_html(&site.name));
    body.push_str("</div>");

    RenderedDocument {
        html: shell(&root_class, &head, &body),
        blocks: sequence.len(),
        fallbacks,
    }
}

/// Render any composer state.
///
/// Non-loaded states use the default theme.
pub fn render_state(state: &PageState, scope: &mut StyleScope, is_dark: bool) -> RenderedDocument {
    let (title, glyph, message) = match state {
        PageState::Loaded(page) => return render_document(page, scope, is_dark),
        PageState::Idle | PageState::Loading(_) => ("Loading", "◈", "Loading...".to_string()),
        PageState::NotFound(domain) => ("Not found", "⚠", format!("Site not found: {domain}")),
        PageState::Errored(message) => ("Error", "⚠", message.clone()),
    };
    RenderedDocument::status(status_document(title, glyph, &message, scope, is_dark))
}

fn status_document(title: &str, glyph: &str, message: &str, scope: &mut StyleScope, is_dark: bool) -> String {
    let theme: Theme = default_theme();
    let applied = apply(scope, &theme, is_dark);
    let head = head_html(title, None, &applied.scope().to_css());
    let root_class = applied.scope().class_attr();
    applied.release();

    let body = format!(
        r#"<div class="min-h-screen flex items-center justify-center"><div class="status text-center"><span class="text-4xl">{glyph}</span><p class="mt-4">{}</p></div></div>"#,
        escape(message)
    );
    shell(&root_class, &head, &body)
}

fn shell(root_class: &str, head: &str, body: &str) -> String {
    let class = if root_class.is_empty() {
        String::new()
    } else {
        format!(r#" class="{}""#, escape_attr(root_class))
    };
    format!("<!DOCTYPE html>\n<html lang=\"en\"{class}>\n<head>{head}</head>\n<body>{body}</body>\n</html>\n")
}

fn head_html(title: &str, description: Option<&str>, css: &str) -> String {
    let mut head = String::from(
        r#"<meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1">"#,
    );
    head.push_str(&format!("<title>{}</title>", escape(title)));
    if let Some(description) = description {
        head.push_str(&format!(r#"<meta name="description" content="{}">"#, escape_attr(description)));
    }
    head.push_str(&format!("<style>{css}</style>"));
    head
}

fn header_html(site_name: &str, logo_url: Option<&str>, navigation: &[NavigationItem]) -> String {
    let name = escape(site_name);
    let brand = match logo_url {
        Some(url) => format!(
            r#"<img src="{}" alt="{}" class="h-8 w-auto">"#,
            safe_url(url),
            escape_attr(site_name)
        ),
        None => r#"<span class="brand-mark">◈</span>"#.to_string(),
    };

    let mut nav = String::from(r#"<nav class="site-nav">"#);
    for item in navigation {
        let target = if item.external {
            r#" target="_blank" rel="noopener noreferrer""#
        } else {
            ""
        };
        nav.push_str(&format!(
            r#"<a href="{}"{target}>{}</a>"#,
            safe_url(&item.href),
            escape(&item.label)
        ));
    }
    nav.push_str("</nav>");

    format!(
        r#"<header class="site-header"><div class="container flex items-center justify-between h-16"><a href="/" class="brand">{brand}<span class="site-name">{name}</span></a>{nav}</div></header>"#
    )
}

fn footer_html(site_name: &str) -> String {
    format!(
        r#"<footer class="site-footer"><div class="container py-8 text-center text-sm"><p>© {} {}. All Rights Reserved.</p></div></footer>"#,
        Utc::now().year(),
        escape(site_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::PageMetadata;
    use scraper::{Html, Selector};
    use serde_json::json;
    use sitekit_cms::DomainKey;
    use sitekit_shared::{Block, SiteData};
    use sitekit_theme::DARK_CLASS;

    fn loaded(blocks: Vec<Block>) -> LoadedPage {
        let site_data: SiteData = serde_json::from_value(json!({
            "site": { "id": "s1", "domain": "verify.uans.us", "name": "UAN Verify" },
            "theme": serde_json::to_value(default_theme()).unwrap(),
            "pages": [],
            "navigation": [
                { "id": 1, "label": "Home", "href": "/", "sort": 1 },
                { "id": 2, "label": "Treaty", "href": "https://treaty.example", "sort": 2, "external": true }
            ]
        }))
        .unwrap();
        let metadata = PageMetadata::new(&site_data.site, None);
        LoadedPage {
            site_data,
            page: None,
            blocks,
            metadata,
            logo_url: None,
        }
    }

    fn select<'a>(doc: &'a Html, css: &str) -> Vec<scraper::ElementRef<'a>> {
        let sel = Selector::parse(css).unwrap();
        doc.select(&sel).collect()
    }

    #[test]
    fn loaded_document_has_head_header_and_footer() {
        let mut scope = StyleScope::new("uan");
        let rendered = render_document(&loaded(Vec::new()), &mut scope, false);
        assert_eq!((rendered.blocks, rendered.fallbacks), (0, 0));
        let doc = Html::parse_document(&rendered.html);

        let title = select(&doc, "title");
        assert_eq!(title[0].text().collect::<String>(), "UAN Verify | UAN Verify");

        let links = select(&doc, "nav.site-nav a");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].value().attr("target"), None);
        assert_eq!(links[1].value().attr("target"), Some("_blank"));

        let main = select(&doc, "main")[0].text().collect::<String>();
        assert!(main.contains("No content available"));

        let footer = select(&doc, "footer")[0].text().collect::<String>();
        assert!(footer.contains(&Utc::now().year().to_string()));
        assert!(footer.contains("UAN Verify"));

        let style = select(&doc, "style")[0].text().collect::<String>();
        assert!(style.contains("--uan-primary: #1A1A1A;"));
    }

    #[test]
    fn dark_document_marks_root_and_leaves_scope_clean() {
        let mut scope = StyleScope::new("uan");
        let blocks: Vec<Block> = serde_json::from_value(json!([
            { "id": "b1", "type": "hero", "order": 2, "props": { "title": "Welcome" } },
            { "id": "b2", "type": "text", "order": 1, "props": { "content": "<p>Hello</p>" } }
        ]))
        .unwrap();
        let rendered = render_document(&loaded(blocks), &mut scope, true);
        let doc = Html::parse_document(&rendered.html);

        let root = select(&doc, "html")[0];
        assert_eq!(root.value().attr("class"), Some(DARK_CLASS));

        let ids: Vec<_> = select(&doc, ".block-wrapper")
            .iter()
            .filter_map(|el| el.value().attr("data-block-id"))
            .collect();
        assert_eq!(ids, vec!["b2", "b1"]);
        assert!(scope.is_empty());
    }

    #[test]
    fn fallback_count_comes_from_the_render_pass() {
        let mut scope = StyleScope::new("uan");
        let blocks: Vec<Block> = serde_json::from_value(json!([
            { "id": "b1", "type": "text", "order": 1, "props": { "content": "ok" } },
            { "id": "b2", "type": "unknown_type_x", "order": 2 },
            { "id": "b3", "type": "hero", "order": 3, "props": {} }
        ]))
        .unwrap();
        let rendered = render_state(&PageState::Loaded(Box::new(loaded(blocks))), &mut scope, false);

        assert_eq!(rendered.blocks, 3);
        assert_eq!(rendered.fallbacks, 2);
        assert!(rendered.html.contains("Block: unknown_type_x"));
    }

    #[test]
    fn status_documents() {
        let mut scope = StyleScope::new("uan");

        let rendered = render_state(&PageState::NotFound(DomainKey::new("ghost.example")), &mut scope, false);
        assert!(rendered.html.contains("Site not found: ghost.example"));
        assert_eq!(rendered.blocks, 0);

        let rendered = render_state(&PageState::Errored("boom <x>".into()), &mut scope, false);
        assert!(rendered.html.contains("boom &lt;x&gt;"));

        let rendered = render_state(&PageState::Idle, &mut scope, false);
        assert!(rendered.html.contains("Loading..."));
        assert!(scope.is_empty());
    }
}
