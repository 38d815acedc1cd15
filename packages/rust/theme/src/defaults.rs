use sitekit_shared::{ButtonStyle, Theme, VariableMap};

fn vars(pairs: &[(&str, &str)]) -> VariableMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// The built-in fallback theme.
///
/// Used whenever a site has no theme or its theme reference cannot be
/// resolved. Always fully populated.
pub fn default_theme() -> Theme {
    Theme {
        id: "default".into(),
        name: "UAN Default".into(),
        description: Some("Default United American Nations theme".into()),
        font_family: "Inter, system-ui, sans-serif".into(),
        css_vars: vars(&[
            ("primary", "#1A1A1A"),
            ("secondary", "#D4C4A8"),
            ("accent", "#B8860B"),
            ("background", "#FAFAFA"),
            ("foreground", "#1A1A1A"),
            ("muted", "#8B7355"),
            ("border", "#D4C4A8"),
            ("ring", "#B8860B"),
        ]),
        dark_mode_vars: Some(vars(&[
            ("primary", "#FAFAFA"),
            ("secondary", "#2A2A2A"),
            ("accent", "#D4AF37"),
            ("background", "#1A1A1A"),
            ("foreground", "#FAFAFA"),
            ("muted", "#A89078"),
            ("border", "#3A3A3A"),
            ("ring", "#D4AF37"),
        ])),
        button_style: ButtonStyle {
            border_radius: "8px".into(),
            border_width: "1px".into(),
            shadow: "md".into(),
            font_weight: "500".into(),
        },
    }
}
