//! Ordered block list → ordered render sequence.

use serde::Serialize;
use sitekit_shared::{Block, BlockType};
use tracing::{debug, instrument, warn};

use crate::html::escape_attr;
use crate::renderers::{placeholder_html, renderer_for};

/// Label for blocks stored without a type.
const UNTYPED: &str = "unknown";

/// Why a block rendered as a placeholder instead of its own markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Fallback {
    /// No renderer exists for the block's type.
    UnknownType,
    /// The renderer rejected the block's props.
    InvalidProps(String),
}

/// One rendered block, wrapped and ready for the page body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedBlock {
    pub id: String,
    pub block_type: BlockType,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Fallback>,
}

/// Rendered blocks in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RenderSequence {
    blocks: Vec<RenderedBlock>,
}

impl RenderSequence {
    pub fn iter(&self) -> std::slice::Iter<'_, RenderedBlock> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block types in display order.
    pub fn types(&self) -> Vec<&BlockType> {
        self.blocks.iter().map(|b| &b.block_type).collect()
    }

    /// Blocks that fell back to a placeholder.
    pub fn fallbacks(&self) -> impl Iterator<Item = &RenderedBlock> {
        self.blocks.iter().filter(|b| b.fallback.is_some())
    }

    /// Concatenate all blocks inside a `block-list` container.
    pub fn to_html(&self) -> String {
        let mut html = String::from(r#"<div class="block-list">"#);
        for block in &self.blocks {
            html.push_str(&block.html);
        }
        html.push_str("</div>");
        html
    }
}

impl<'a> IntoIterator for &'a RenderSequence {
    type Item = &'a RenderedBlock;
    type IntoIter = std::slice::Iter<'a, RenderedBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

/// Render blocks in ascending `order`.
///
/// Ties keep their input order. A block that cannot be rendered becomes a
/// labelled placeholder; the rest of the list is unaffected.
#[instrument(skip_all, fields(count = blocks.len()))]
pub fn render_blocks(blocks: &[Block]) -> RenderSequence {
    let mut ordered: Vec<&Block> = blocks.iter().collect();
    ordered.sort_by_key(|b| b.order);

    let blocks = ordered.into_iter().map(render_block).collect();
    RenderSequence { blocks }
}

/// Render one block without reordering.
pub fn render_block(block: &Block) -> RenderedBlock {
    let (inner, fallback) = match renderer_for(&block.block_type) {
        Some(renderer) => match renderer.render(&block.props) {
            Ok(html) => {
                debug!(id = %block.id, renderer = renderer.name(), "block rendered");
                (html, None)
            }
            Err(e) => {
                warn!(id = %block.id, block_type = %block.block_type, error = %e, "invalid block props; rendering placeholder");
                (placeholder_html(label(block)), Some(Fallback::InvalidProps(e.to_string())))
            }
        },
        None => {
            warn!(id = %block.id, block_type = %block.block_type, "unknown block type; rendering placeholder");
            (placeholder_html(label(block)), Some(Fallback::UnknownType))
        }
    };

    RenderedBlock {
        id: block.id.clone(),
        block_type: block.block_type.clone(),
        html: wrap(block, &inner),
        fallback,
    }
}

fn label(block: &Block) -> &str {
    match (block.name.as_str(), block.block_type.as_str()) {
        ("", "") => UNTYPED,
        ("", kind) => kind,
        (name, _) => name,
    }
}

fn wrap(block: &Block, inner: &str) -> String {
    let kind = match block.block_type.as_str() {
        "" => UNTYPED,
        kind => kind,
    };
    format!(
        r#"<div class="block-wrapper block-{}" data-block-id="{}">{inner}</div>"#,
        class_token(kind),
        escape_attr(&block.id)
    )
}

/// Reduce a type name to characters safe in a class list.
fn class_token(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}
