//! CMS data model: sites, themes, pages, blocks, and navigation.
//!
//! These types decode straight from the CMS wire format. They are read-only
//! snapshots; nothing in SiteKit writes them back.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Style variable name → value.
pub type VariableMap = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Deserialization helpers
// ---------------------------------------------------------------------------

/// CMS primary keys may be strings (uuid) or integers depending on the collection.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Int(i64),
}

fn id_string<'de, D>(d: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(d)? {
        RawId::Str(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

/// Like [`id_string`], but a missing or `null` id becomes empty.
fn lenient_id<'de, D>(d: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawId>::deserialize(d)? {
        Some(RawId::Str(s)) => s,
        Some(RawId::Int(n)) => n.to_string(),
        None => String::new(),
    })
}

fn null_as_default<'de, D, T>(d: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Variable maps may carry `null` for unset optional keys; those are dropped.
fn vars_skip_null<'de, D>(d: D) -> std::result::Result<VariableMap, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Option<String>>>::deserialize(d)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect())
}

fn opt_vars_skip_null<'de, D>(d: D) -> std::result::Result<Option<VariableMap>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Option<String>>>::deserialize(d)?;
    Ok(raw.map(|m| {
        m.into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect()
    }))
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The `{ data, meta? }` wrapper around every CMS response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<EnvelopeMeta>,
}

/// Optional counts the CMS attaches to collection responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_count: Option<u64>,
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// An uploaded file record (logos, block media).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmsFile {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub filename_disk: String,
    #[serde(default)]
    pub filename_download: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", default)]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// A file field: either the expanded record or its bare id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileRef {
    Id(#[serde(deserialize_with = "id_string")] String),
    File(CmsFile),
}

impl FileRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::File(file) => &file.id,
        }
    }
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

/// Button presentation tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ButtonStyle {
    /// e.g. `8px`, `full`.
    #[serde(default)]
    pub border_radius: String,
    #[serde(default)]
    pub border_width: String,
    /// Shadow token: `none`, `sm`, `md`, `lg`.
    #[serde(default)]
    pub shadow: String,
    #[serde(default)]
    pub font_weight: String,
}

/// A named bundle of presentation variables with optional dark-mode overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    /// Empty for themes embedded without their key.
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Light-mode variables. Required keys: primary, secondary, accent,
    /// background, foreground, muted.
    #[serde(default, deserialize_with = "vars_skip_null")]
    pub css_vars: VariableMap,
    #[serde(default, deserialize_with = "null_as_default")]
    pub font_family: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub button_style: ButtonStyle,
    /// Sparse overrides applied on top of `css_vars` in dark mode.
    #[serde(
        default,
        deserialize_with = "opt_vars_skip_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub dark_mode_vars: Option<VariableMap>,
}

/// The `theme` field of a site: embedded record or reference id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThemeRef {
    Id(#[serde(deserialize_with = "id_string")] String),
    Embedded(Box<Theme>),
}

// ---------------------------------------------------------------------------
// Site
// ---------------------------------------------------------------------------

/// One tenant, addressed by its unique domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    /// e.g. `verify.uans.us`.
    pub domain: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<FileRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_updated: Option<DateTime<Utc>>,
}

/// The `site` field of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SiteRef {
    Id(#[serde(deserialize_with = "id_string")] String),
    Embedded(Box<Site>),
}

impl SiteRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Embedded(site) => &site.id,
        }
    }
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// The block type enumeration shared with CMS content authors.
///
/// Values the CMS adds later decode into [`BlockType::Unknown`] instead of
/// failing, so a page never breaks on a new block type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockType {
    Hero,
    Text,
    Image,
    Form,
    Globe,
    Map,
    Qr,
    Quote,
    Features,
    Cta,
    Video,
    Spacer,
    Divider,
    Custom,
    Unknown(String),
}

impl BlockType {
    /// Every type the renderer table covers, in wire order.
    pub const KNOWN: [BlockType; 14] = [
        Self::Hero,
        Self::Text,
        Self::Image,
        Self::Form,
        Self::Globe,
        Self::Map,
        Self::Qr,
        Self::Quote,
        Self::Features,
        Self::Cta,
        Self::Video,
        Self::Spacer,
        Self::Divider,
        Self::Custom,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Hero => "hero",
            Self::Text => "text",
            Self::Image => "image",
            Self::Form => "form",
            Self::Globe => "globe",
            Self::Map => "map",
            Self::Qr => "qr",
            Self::Quote => "quote",
            Self::Features => "features",
            Self::Cta => "cta",
            Self::Video => "video",
            Self::Spacer => "spacer",
            Self::Divider => "divider",
            Self::Custom => "custom",
            Self::Unknown(raw) => raw,
        }
    }
}

impl Default for BlockType {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl From<String> for BlockType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "hero" => Self::Hero,
            "text" => Self::Text,
            "image" => Self::Image,
            "form" => Self::Form,
            "globe" => Self::Globe,
            "map" => Self::Map,
            "qr" => Self::Qr,
            "quote" => Self::Quote,
            "features" => Self::Features,
            "cta" => Self::Cta,
            "video" => Self::Video,
            "spacer" => Self::Spacer,
            "divider" => Self::Divider,
            "custom" => Self::Custom,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<&str> for BlockType {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<BlockType> for String {
    fn from(kind: BlockType) -> Self {
        match kind {
            BlockType::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One renderable unit within a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// A missing type decodes as `Unknown("")`.
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub block_type: BlockType,
    /// Shape depends on `block_type`; only the renderer interprets it.
    #[serde(default)]
    pub props: serde_json::Value,
    /// Render sequence key. Not necessarily contiguous or unique.
    #[serde(default, deserialize_with = "null_as_default")]
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<FileRef>,
}

impl Block {
    /// Salvage what can be read from an entry that failed to decode.
    ///
    /// The result always has an [`BlockType::Unknown`] type, so it renders as
    /// a placeholder in its stored position.
    pub fn salvage(raw: &serde_json::Value) -> Self {
        use serde_json::Value;

        let id = match raw.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let text = |key: &str| {
            raw.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            id,
            name: text("name"),
            block_type: BlockType::Unknown(text("type")),
            props: Value::Null,
            order: raw.get("order").and_then(Value::as_i64).unwrap_or_default(),
            media: None,
        }
    }
}

/// An entry of a page's `blocks` field: embedded record or reference id.
///
/// Entries matching neither shape are kept raw in
/// [`BlockRef::Malformed`] instead of failing the whole page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockRef {
    Id(#[serde(deserialize_with = "id_string")] String),
    Embedded(Box<Block>),
    Malformed(serde_json::Value),
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// One route within a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub site: SiteRef,
    /// `index` denotes the root route.
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blocks: Vec<BlockRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_updated: Option<DateTime<Utc>>,
}

impl Page {
    /// Blocks embedded in the page record, in stored order. Malformed
    /// entries come back as salvaged placeholders.
    pub fn embedded_blocks(&self) -> Vec<Block> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                BlockRef::Embedded(block) => Some(block.as_ref().clone()),
                BlockRef::Malformed(raw) => Some(Block::salvage(raw)),
                BlockRef::Id(_) => None,
            })
            .collect()
    }

    /// Whether any entry of `blocks` is a bare reference needing a separate fetch.
    pub fn has_block_references(&self) -> bool {
        self.blocks.iter().any(|b| matches!(b, BlockRef::Id(_)))
    }
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// A navigation link for a site header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationItem {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub label: String,
    pub href: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sort: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub external: bool,
}

// ---------------------------------------------------------------------------
// SiteData
// ---------------------------------------------------------------------------

/// One fully-formed per-request snapshot of a tenant.
///
/// Built once by the aggregator and never patched; a newer fetch replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteData {
    pub site: Site,
    pub theme: Theme,
    pub pages: Vec<Page>,
    pub navigation: Vec<NavigationItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn site_with_embedded_theme() {
        let site: Site = serde_json::from_value(json!({
            "id": 7,
            "domain": "verify.uans.us",
            "name": "Verify",
            "enabled": true,
            "theme": {
                "id": "t1",
                "name": "Verify",
                "css_vars": { "primary": "#000", "ring": null },
                "font_family": "Inter",
                "button_style": { "border_radius": "8px", "border_width": "1px", "shadow": "md", "font_weight": "500" }
            }
        }))
        .expect("decode site");

        assert_eq!(site.id, "7");
        match site.theme {
            Some(ThemeRef::Embedded(theme)) => {
                assert_eq!(theme.css_vars.get("primary").map(String::as_str), Some("#000"));
                assert!(!theme.css_vars.contains_key("ring"));
                assert!(theme.dark_mode_vars.is_none());
            }
            other => panic!("expected embedded theme, got {other:?}"),
        }
    }

    #[test]
    fn site_with_theme_reference() {
        let site: Site = serde_json::from_value(json!({
            "id": "s1",
            "domain": "id.uans.us",
            "name": "ID",
            "enabled": true,
            "theme": "theme-42",
            "date_created": "2024-03-01T12:00:00.000Z"
        }))
        .expect("decode site");

        assert_eq!(site.theme, Some(ThemeRef::Id("theme-42".into())));
        assert!(site.date_created.is_some());
    }

    #[test]
    fn unknown_block_type_is_preserved() {
        let block: Block = serde_json::from_value(json!({
            "id": "b1",
            "name": "Mystery",
            "type": "unknown_type_x",
            "props": {},
            "order": 3
        }))
        .expect("decode block");

        assert_eq!(block.block_type, BlockType::Unknown("unknown_type_x".into()));
        let back = serde_json::to_value(&block).expect("encode");
        assert_eq!(back["type"], "unknown_type_x");
    }

    #[test]
    fn known_block_types_cover_the_wire_enumeration() {
        for kind in BlockType::KNOWN {
            let parsed = BlockType::from(kind.as_str());
            assert_eq!(parsed, kind);
            assert!(!matches!(parsed, BlockType::Unknown(_)));
        }
    }

    #[test]
    fn page_with_mixed_block_refs_and_null_fields() {
        let page: Page = serde_json::from_value(json!({
            "id": 12,
            "site": "s1",
            "slug": "index",
            "seo_title": null,
            "published": true,
            "blocks": [
                "b-ref",
                { "id": "b2", "name": "Intro", "type": "text", "props": { "content": "Hi" }, "order": null }
            ]
        }))
        .expect("decode page");

        assert_eq!(page.site.id(), "s1");
        assert!(page.has_block_references());
        let embedded = page.embedded_blocks();
        assert_eq!(embedded.len(), 1);
        assert_eq!(embedded[0].order, 0);
        assert_eq!(embedded[0].block_type, BlockType::Text);
    }

    #[test]
    fn embedded_theme_without_id() {
        let site: Site = serde_json::from_value(json!({
            "id": "s1",
            "domain": "verify.uans.us",
            "name": "Verify",
            "theme": { "css_vars": { "primary": "#000" } }
        }))
        .expect("decode site");

        match site.theme {
            Some(ThemeRef::Embedded(theme)) => {
                assert!(theme.id.is_empty());
                assert_eq!(theme.css_vars.get("primary").map(String::as_str), Some("#000"));
            }
            other => panic!("expected embedded theme, got {other:?}"),
        }
    }

    #[test]
    fn broken_block_entries_do_not_fail_the_page() {
        let page: Page = serde_json::from_value(json!({
            "id": "p1",
            "site": "s1",
            "slug": "index",
            "blocks": [
                { "id": "b1", "order": 2, "props": {} },
                { "id": "b2", "type": 7, "name": "Odd", "order": 3 },
                { "id": "b3", "type": "text", "order": 1, "props": { "content": "ok" } }
            ]
        }))
        .expect("decode page");

        assert!(matches!(page.blocks[1], BlockRef::Malformed(_)));
        let blocks = page.embedded_blocks();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].block_type, BlockType::Unknown(String::new()));
        assert_eq!(blocks[1].id, "b2");
        assert_eq!(blocks[1].name, "Odd");
        assert_eq!(blocks[1].order, 3);
        assert!(matches!(blocks[1].block_type, BlockType::Unknown(_)));
        assert_eq!(blocks[2].block_type, BlockType::Text);
    }

    #[test]
    fn page_with_null_blocks_is_empty() {
        let page: Page = serde_json::from_value(json!({
            "id": "p1",
            "site": { "id": "s1", "domain": "uans.us", "name": "UAN", "enabled": true },
            "slug": "about",
            "blocks": null,
            "published": true
        }))
        .expect("decode page");

        assert!(page.blocks.is_empty());
        assert_eq!(page.site.id(), "s1");
    }

    #[test]
    fn navigation_external_defaults_false() {
        let items: Envelope<Vec<NavigationItem>> = serde_json::from_value(json!({
            "data": [{ "id": 1, "label": "Home", "href": "/", "sort": 1, "external": null }],
            "meta": { "total_count": 1 }
        }))
        .expect("decode envelope");

        assert!(!items.data[0].external);
        assert_eq!(items.meta.and_then(|m| m.total_count), Some(1));
    }
}
