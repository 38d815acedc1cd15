//! Block rendering for SiteKit pages.
//!
//! Turns a page's CMS blocks into an ordered sequence of HTML fragments and
//! handles submissions of `form` blocks.

pub mod dispatch;
pub mod form;
pub mod html;
pub mod renderers;

pub use dispatch::{Fallback, RenderSequence, RenderedBlock, render_block, render_blocks};
pub use form::{FormSubmission, SubmissionReceipt};
pub use renderers::{BlockRenderer, FieldKind, FormField, FormProps, renderer_for};
