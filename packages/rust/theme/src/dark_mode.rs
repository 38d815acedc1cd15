//! Persisted dark-mode preference.

use sitekit_shared::Result;
use sitekit_storage::{DARK_MODE_KEY, PreferenceStore};
use tracing::{debug, warn};

/// Where the current dark-mode value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceSource {
    /// An explicit choice persisted by an earlier `set`/`toggle`.
    Stored,
    /// No stored choice; the ambient system color scheme.
    System,
}

/// Dark-mode state backed by a [`PreferenceStore`].
///
/// A stored choice always wins over the system preference. Every explicit
/// change is persisted for later sessions.
#[derive(Debug)]
pub struct DarkMode<'s, S: PreferenceStore> {
    store: &'s S,
    is_dark: bool,
    source: PreferenceSource,
}

impl<'s, S: PreferenceStore> DarkMode<'s, S> {
    /// Read the stored preference, falling back to `system_prefers_dark`.
    pub async fn load(store: &'s S, system_prefers_dark: bool) -> Self {
        let stored = match store.get(DARK_MODE_KEY).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "failed to read dark mode preference");
                None
            }
        };

        let (is_dark, source) = match stored.as_deref().map(str::trim) {
            Some("true") => (true, PreferenceSource::Stored),
            Some("false") => (false, PreferenceSource::Stored),
            Some(other) => {
                warn!(value = other, "ignoring unrecognised dark mode preference");
                (system_prefers_dark, PreferenceSource::System)
            }
            None => (system_prefers_dark, PreferenceSource::System),
        };

        debug!(is_dark, ?source, "dark mode loaded");
        Self {
            store,
            is_dark,
            source,
        }
    }

    pub fn is_dark(&self) -> bool {
        self.is_dark
    }

    pub fn source(&self) -> PreferenceSource {
        self.source
    }

    /// Set and persist an explicit choice.
    pub async fn set(&mut self, dark: bool) -> Result<()> {
        self.store
            .set(DARK_MODE_KEY, if dark { "true" } else { "false" })
            .await?;
        self.is_dark = dark;
        self.source = PreferenceSource::Stored;
        Ok(())
    }

    /// Flip and persist; returns the new value.
    pub async fn toggle(&mut self) -> Result<bool> {
        let next = !self.is_dark;
        self.set(next).await?;
        Ok(next)
    }

    /// Forget the stored choice and follow the system preference again.
    pub async fn reset(&mut self, system_prefers_dark: bool) -> Result<()> {
        self.store.remove(DARK_MODE_KEY).await?;
        self.is_dark = system_prefers_dark;
        self.source = PreferenceSource::System;
        Ok(())
    }
}
