//! Shared types, error model, and configuration for SiteKit.
//!
//! This crate is the foundation depended on by all other SiteKit crates.
//! It provides:
//! - [`SiteKitError`]: the unified error type
//! - The CMS data model ([`Site`], [`Theme`], [`Page`], [`Block`], [`SiteData`], ...)
//! - Configuration ([`AppConfig`], [`CmsConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CmsConfig, FormsConfig, StorageConfig, ThemeConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_token,
};
pub use error::{Result, SiteKitError};
pub use types::{
    Block, BlockRef, BlockType, ButtonStyle, CmsFile, Envelope, EnvelopeMeta, FileRef, NavigationItem,
    Page, Site, SiteData, SiteRef, Theme, ThemeRef, VariableMap,
};
