use sitekit_shared::{Theme, VariableMap};

/// Keys every theme's light variable set must define.
const REQUIRED_KEYS: [&str; 6] = [
    "primary",
    "secondary",
    "accent",
    "background",
    "foreground",
    "muted",
];

/// Resolve the variable set for the requested mode.
///
/// Dark mode overlays `dark_mode_vars` on `css_vars`; keys missing from the
/// dark set keep their light values.
pub fn effective_variables(theme: &Theme, is_dark: bool) -> VariableMap {
    let mut vars = theme.css_vars.clone();
    if is_dark {
        if let Some(dark) = &theme.dark_mode_vars {
            vars.extend(dark.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }
    vars
}

/// Required keys absent (or blank) in the theme's light set.
pub fn missing_required_keys(theme: &Theme) -> Vec<&'static str> {
    REQUIRED_KEYS
        .into_iter()
        .filter(|key| {
            theme
                .css_vars
                .get(*key)
                .is_none_or(|value| value.trim().is_empty())
        })
        .collect()
}
