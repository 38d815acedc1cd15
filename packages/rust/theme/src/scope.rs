//! Style scopes and scoped theme application.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use sitekit_shared::Theme;
use tracing::{debug, warn};

use crate::variables::effective_variables;

/// Root class toggled on while a dark theme is applied.
pub const DARK_CLASS: &str = "dark";

static VAR_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"));

// ---------------------------------------------------------------------------
// StyleScope
// ---------------------------------------------------------------------------

/// A set of CSS custom properties plus root classes.
///
/// Stands in for a document root: each rendered document owns one, and
/// nothing is shared between scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleScope {
    prefix: String,
    properties: BTreeMap<String, String>,
    classes: BTreeSet<String>,
}

impl StyleScope {
    /// Empty scope whose variables are named `--<prefix>-<key>`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            properties: BTreeMap::new(),
            classes: BTreeSet::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Full property name for a theme key (`primary` → `--uan-primary`).
    pub fn property_name(&self, key: &str) -> String {
        format!("--{}-{key}", self.prefix)
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Value of a theme key under this scope's prefix.
    pub fn variable(&self, key: &str) -> Option<&str> {
        self.property(&self.property_name(key))
    }

    /// Set a property, returning the value it replaced.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.properties.insert(name.into(), value.into())
    }

    pub fn remove_property(&mut self, name: &str) -> Option<String> {
        self.properties.remove(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn add_class(&mut self, class: impl Into<String>) -> bool {
        self.classes.insert(class.into())
    }

    pub fn remove_class(&mut self, class: &str) -> bool {
        self.classes.remove(class)
    }

    /// Space-separated class list for the root element.
    pub fn class_attr(&self) -> String {
        self.classes.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.classes.is_empty()
    }

    /// Render the properties as a `:root` rule.
    pub fn to_css(&self) -> String {
        let mut css = String::from(":root {\n");
        for (name, value) in &self.properties {
            let _ = writeln!(css, "  {name}: {};", sanitize_value(value));
        }
        css.push('}');
        css
    }
}

/// Strip characters that could end the declaration or the `<style>` element.
fn sanitize_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ';' | '{' | '}' | '<' | '>'))
        .collect::<String>()
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// Scoped application
// ---------------------------------------------------------------------------

/// A theme currently applied to a [`StyleScope`].
///
/// Holds the scope exclusively until released. Releasing (explicitly or by
/// drop) undoes every change in reverse order, so the scope returns to the
/// state it had before [`apply`].
#[derive(Debug)]
pub struct AppliedTheme<'a> {
    scope: &'a mut StyleScope,
    previous: Vec<(String, Option<String>)>,
    had_dark_class: Option<bool>,
    is_dark: bool,
}

/// Apply `theme` to `scope` in light or dark mode.
pub fn apply<'a>(scope: &'a mut StyleScope, theme: &Theme, is_dark: bool) -> AppliedTheme<'a> {
    let mut applied = AppliedTheme {
        scope,
        previous: Vec::new(),
        had_dark_class: None,
        is_dark,
    };
    applied.install(theme, is_dark);
    applied
}

impl<'a> AppliedTheme<'a> {
    /// Read access to the scope while the theme is applied.
    pub fn scope(&self) -> &StyleScope {
        self.scope
    }

    pub fn is_dark(&self) -> bool {
        self.is_dark
    }

    /// Number of properties this application set.
    pub fn applied_count(&self) -> usize {
        self.previous.len()
    }

    /// Undo the current application and apply another theme or mode.
    pub fn reapply(&mut self, theme: &Theme, is_dark: bool) {
        self.undo();
        self.is_dark = is_dark;
        self.install(theme, is_dark);
    }

    /// Undo all changes now.
    pub fn release(self) {
        // Drop does the work.
    }

    fn install(&mut self, theme: &Theme, is_dark: bool) {
        for (key, value) in effective_variables(theme, is_dark) {
            if value.is_empty() {
                continue;
            }
            if !VAR_KEY_RE.is_match(&key) {
                warn!(theme = %theme.id, %key, "skipping theme variable with invalid name");
                continue;
            }
            self.set(&key, value);
        }

        if !theme.font_family.is_empty() {
            self.set("font-family", theme.font_family.clone());
        }

        let button = &theme.button_style;
        for (key, value) in [
            ("btn-radius", &button.border_radius),
            ("btn-border", &button.border_width),
            ("btn-shadow", &button.shadow),
            ("btn-weight", &button.font_weight),
        ] {
            if !value.is_empty() {
                self.set(key, value.clone());
            }
        }

        let had = self.scope.has_class(DARK_CLASS);
        self.had_dark_class = Some(had);
        if is_dark {
            self.scope.add_class(DARK_CLASS);
        } else {
            self.scope.remove_class(DARK_CLASS);
        }

        debug!(
            theme = %theme.id,
            is_dark,
            properties = self.previous.len(),
            "theme applied"
        );
    }

    fn set(&mut self, key: &str, value: String) {
        let name = self.scope.property_name(key);
        let prior = self.scope.set_property(name.clone(), value);
        self.previous.push((name, prior));
    }

    fn undo(&mut self) {
        while let Some((name, prior)) = self.previous.pop() {
            match prior {
                Some(value) => {
                    self.scope.set_property(name, value);
                }
                None => {
                    self.scope.remove_property(&name);
                }
            }
        }

        if let Some(had) = self.had_dark_class.take() {
            if had {
                self.scope.add_class(DARK_CLASS);
            } else {
                self.scope.remove_class(DARK_CLASS);
            }
        }
    }
}

impl Drop for AppliedTheme<'_> {
    fn drop(&mut self) {
        self.undo();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_theme;

    #[test]
    fn apply_sets_variables_font_and_buttons() {
        let mut scope = StyleScope::new("uan");
        let theme = default_theme();
        let applied = apply(&mut scope, &theme, false);

        let s = applied.scope();
        assert_eq!(s.variable("primary"), Some("#1A1A1A"));
        assert_eq!(s.variable("font-family"), Some("Inter, system-ui, sans-serif"));
        assert_eq!(s.variable("btn-radius"), Some("8px"));
        assert_eq!(s.variable("btn-border"), Some("1px"));
        assert_eq!(s.variable("btn-shadow"), Some("md"));
        assert_eq!(s.variable("btn-weight"), Some("500"));
        assert!(!s.has_class(DARK_CLASS));
        assert_eq!(applied.applied_count(), theme.css_vars.len() + 5);
    }

    #[test]
    fn dark_apply_uses_overrides_and_class() {
        let mut scope = StyleScope::new("uan");
        let applied = apply(&mut scope, &default_theme(), true);

        assert_eq!(applied.scope().variable("primary"), Some("#FAFAFA"));
        assert!(applied.scope().has_class(DARK_CLASS));
    }

    #[test]
    fn release_leaves_no_residue() {
        let mut scope = StyleScope::new("uan");
        let applied = apply(&mut scope, &default_theme(), true);
        applied.release();

        assert!(scope.is_empty());
    }

    #[test]
    fn drop_restores_prior_state() {
        let mut scope = StyleScope::new("uan");
        scope.set_property("--uan-primary", "hotpink");
        scope.set_property("--other", "1");
        scope.add_class(DARK_CLASS);
        let before = scope.clone();

        {
            let applied = apply(&mut scope, &default_theme(), false);
            assert_eq!(applied.scope().variable("primary"), Some("#1A1A1A"));
            assert!(!applied.scope().has_class(DARK_CLASS));
        }

        assert_eq!(scope, before);
    }

    #[test]
    fn reapply_switches_theme_without_leftovers() {
        let mut extended = default_theme();
        extended.css_vars.insert("glow".into(), "#0ff".into());

        let mut plain = default_theme();
        plain.font_family = String::new();

        let mut scope = StyleScope::new("uan");
        {
            let mut applied = apply(&mut scope, &extended, false);
            assert_eq!(applied.scope().variable("glow"), Some("#0ff"));

            applied.reapply(&plain, true);
            assert_eq!(applied.scope().variable("glow"), None);
            assert_eq!(applied.scope().variable("font-family"), None);
            assert_eq!(applied.scope().variable("primary"), Some("#FAFAFA"));
            assert!(applied.scope().has_class(DARK_CLASS));
        }
        assert!(scope.is_empty());
    }

    #[test]
    fn invalid_keys_and_empty_values_are_skipped() {
        let mut theme = default_theme();
        theme.css_vars.insert("bad key;".into(), "red".into());
        theme.css_vars.insert("info".into(), String::new());

        let mut scope = StyleScope::new("uan");
        let applied = apply(&mut scope, &theme, false);
        assert!(applied.scope().property("--uan-bad key;").is_none());
        assert!(applied.scope().variable("info").is_none());
    }

    #[test]
    fn css_output_is_sanitized() {
        let mut scope = StyleScope::new("t");
        scope.set_property("--t-primary", "red; } body { display:none");
        scope.set_property("--t-accent", "</style><script>");

        let css = scope.to_css();
        assert!(css.starts_with(":root {"));
        assert!(css.contains("--t-primary: red  body  display:none;"));
        assert!(!css.contains("</style>"));
        assert_eq!(css.matches('}').count(), 1);
    }

    #[test]
    fn independent_scopes_do_not_interact() {
        let theme = default_theme();
        let mut a = StyleScope::new("uan");
        let mut b = StyleScope::new("site");

        let applied_a = apply(&mut a, &theme, true);
        let applied_b = apply(&mut b, &theme, false);
        assert_eq!(applied_a.scope().variable("primary"), Some("#FAFAFA"));
        assert_eq!(applied_b.scope().variable("primary"), Some("#1A1A1A"));
        assert!(applied_b.scope().property("--uan-primary").is_none());
    }
}
