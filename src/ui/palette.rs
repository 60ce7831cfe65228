use serde::{Deserialize, Serialize};

use crate::a11y::Rgb;
use crate::theme::ResolvedTheme;

/// Color tokens for one resolved theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTokens {
    pub background: Rgb,
    pub surface: Rgb,
    pub text_primary: Rgb,
    pub text_secondary: Rgb,
    pub text_muted: Rgb,
    pub accent: Rgb,
    pub accent_foreground: Rgb,
    pub link: Rgb,
    pub border: Rgb,
}

pub const LIGHT_TOKENS: ColorTokens = ColorTokens {
    background: Rgb::new(0xff, 0xff, 0xff),
    surface: Rgb::new(0xf4, 0xf4, 0xf5),
    text_primary: Rgb::new(0x18, 0x18, 0x1b),
    text_secondary: Rgb::new(0x3f, 0x3f, 0x46),
    text_muted: Rgb::new(0x52, 0x52, 0x5b),
    accent: Rgb::new(0x1d, 0x4e, 0xd8),
    accent_foreground: Rgb::new(0xff, 0xff, 0xff),
    link: Rgb::new(0x1e, 0x40, 0xaf),
    border: Rgb::new(0xa1, 0xa1, 0xaa),
};

pub const DARK_TOKENS: ColorTokens = ColorTokens {
    background: Rgb::new(0x09, 0x09, 0x0b),
    surface: Rgb::new(0x18, 0x18, 0x1b),
    text_primary: Rgb::new(0xfa, 0xfa, 0xfa),
    text_secondary: Rgb::new(0xd4, 0xd4, 0xd8),
    text_muted: Rgb::new(0xa1, 0xa1, 0xaa),
    accent: Rgb::new(0x60, 0xa5, 0xfa),
    accent_foreground: Rgb::new(0x09, 0x09, 0x0b),
    link: Rgb::new(0x93, 0xc5, 0xfd),
    border: Rgb::new(0x52, 0x52, 0x5b),
};

pub const fn default_color_tokens(theme: ResolvedTheme) -> ColorTokens {
    match theme {
        ResolvedTheme::Light => LIGHT_TOKENS,
        ResolvedTheme::Dark => DARK_TOKENS,
    }
}

/// Per-theme color overrides. All fields optional for partial override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColorOverrides {
    pub background: Option<String>,
    pub surface: Option<String>,
    pub text_primary: Option<String>,
    pub text_secondary: Option<String>,
    pub text_muted: Option<String>,
    pub accent: Option<String>,
    pub accent_foreground: Option<String>,
    pub link: Option<String>,
    pub border: Option<String>,
}

/// Overrides shared by both themes plus per-theme overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeColors {
    #[serde(default)]
    pub common: ColorOverrides,
    #[serde(default)]
    pub dark: ColorOverrides,
    #[serde(default)]
    pub light: ColorOverrides,
}

/// Documented tokens for `theme` with configured overrides layered on top.
/// Overrides that are not `#RRGGBB` are skipped with a warning.
pub fn resolve_color_tokens(theme: ResolvedTheme, overrides: Option<&ThemeColors>) -> ColorTokens {
    let mut tokens = default_color_tokens(theme);

    if let Some(colors) = overrides {
        apply_overrides(&mut tokens, &colors.common);
        let theme_overrides = match theme {
            ResolvedTheme::Dark => &colors.dark,
            ResolvedTheme::Light => &colors.light,
        };
        apply_overrides(&mut tokens, theme_overrides);
    }

    tokens
}

fn apply_overrides(tokens: &mut ColorTokens, overrides: &ColorOverrides) {
    let slots: [(&'static str, &Option<String>, &mut Rgb); 9] = [
        ("background", &overrides.background, &mut tokens.background),
        ("surface", &overrides.surface, &mut tokens.surface),
        ("text_primary", &overrides.text_primary, &mut tokens.text_primary),
        ("text_secondary", &overrides.text_secondary, &mut tokens.text_secondary),
        ("text_muted", &overrides.text_muted, &mut tokens.text_muted),
        ("accent", &overrides.accent, &mut tokens.accent),
        (
            "accent_foreground",
            &overrides.accent_foreground,
            &mut tokens.accent_foreground,
        ),
        ("link", &overrides.link, &mut tokens.link),
        ("border", &overrides.border, &mut tokens.border),
    ];
    for (field, raw, target) in slots {
        let Some(value) = raw.as_deref() else {
            continue;
        };
        match Rgb::from_hex(value) {
            Ok(color) => *target = color,
            Err(_) => {
                tracing::warn!(field, value, "invalid color override; expected #RRGGBB");
            }
        }
    }
}
