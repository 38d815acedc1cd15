//! Theme application: effective variables, style scopes, and dark mode.
//!
//! A [`Theme`](sitekit_shared::Theme) is projected onto a [`StyleScope`] as
//! prefixed CSS custom properties. Application is scoped: [`apply`] returns an
//! [`AppliedTheme`] guard that puts the scope back exactly as it found it when
//! released or dropped.

mod dark_mode;
mod defaults;
mod scope;
mod variables;

pub use dark_mode::{DarkMode, PreferenceSource};
pub use defaults::default_theme;
pub use scope::{AppliedTheme, DARK_CLASS, StyleScope, apply};
pub use variables::{effective_variables, missing_required_keys};
