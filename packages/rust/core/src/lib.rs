//! Core orchestration for SiteKit.
//!
//! Ties the CMS gateway, theme engine and block renderers together: a domain
//! and slug go in, a themed HTML document comes out.

pub mod compose;
pub mod document;
pub mod site;

pub use compose::{
    Generation, INDEX_SLUG, LoadOutcome, LoadedPage, PageComposer, PageMetadata, PageRequest,
    PageState, ProgressReporter, SilentProgress, resolve_blocks,
};
pub use document::{RenderedDocument, render_document, render_state};
pub use site::{SiteContext, fetch_site_data, fetch_site_data_for};
