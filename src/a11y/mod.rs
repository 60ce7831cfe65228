//! Accessibility checks layered on top of theming: WCAG contrast math, the
//! palette battery run against each theme's tokens, and reduced-motion
//! detection.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::theme::ResolvedTheme;
use crate::ui::{default_color_tokens, ColorTokens};

mod contrast;
mod motion;

pub use contrast::{
    contrast_ratio, meets_aa, meets_aaa, ratio_meets_aa, ratio_meets_aaa, ColorError, Rgb,
    WCAG_AAA_LARGE, WCAG_AAA_NORMAL, WCAG_AA_LARGE, WCAG_AA_NORMAL,
};
pub use motion::{EnvMotion, MotionPreference, MotionSource, StaticMotion, REDUCED_MOTION_ENV};

/// A named foreground/background token pairing checked by the palette battery.
#[derive(Debug, Clone, Copy)]
pub struct TokenPair {
    pub name: &'static str,
    pub large_text: bool,
    foreground: fn(&ColorTokens) -> Rgb,
    background: fn(&ColorTokens) -> Rgb,
}

impl TokenPair {
    pub fn colors(&self, tokens: &ColorTokens) -> (Rgb, Rgb) {
        ((self.foreground)(tokens), (self.background)(tokens))
    }
}

pub const PALETTE_PAIRS: [TokenPair; 8] = [
    TokenPair {
        name: "text-primary/background",
        large_text: false,
        foreground: |t| t.text_primary,
        background: |t| t.background,
    },
    TokenPair {
        name: "text-secondary/background",
        large_text: false,
        foreground: |t| t.text_secondary,
        background: |t| t.background,
    },
    TokenPair {
        name: "text-muted/background",
        large_text: false,
        foreground: |t| t.text_muted,
        background: |t| t.background,
    },
    TokenPair {
        name: "text-primary/surface",
        large_text: false,
        foreground: |t| t.text_primary,
        background: |t| t.surface,
    },
    TokenPair {
        name: "text-muted/surface",
        large_text: false,
        foreground: |t| t.text_muted,
        background: |t| t.surface,
    },
    TokenPair {
        name: "accent/background",
        large_text: false,
        foreground: |t| t.accent,
        background: |t| t.background,
    },
    TokenPair {
        name: "accent-foreground/accent",
        large_text: false,
        foreground: |t| t.accent_foreground,
        background: |t| t.accent,
    },
    TokenPair {
        name: "link/surface",
        large_text: false,
        foreground: |t| t.link,
        background: |t| t.surface,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContrastViolation {
    pub pair: &'static str,
    pub ratio: f64,
    pub required: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaletteReport {
    pub is_valid: bool,
    pub violations: Vec<ContrastViolation>,
    pub ratios: BTreeMap<&'static str, f64>,
}

/// Runs the AA battery against the documented tokens for `theme`.
pub fn validate_theme_palette(theme: ResolvedTheme) -> PaletteReport {
    validate_palette(&default_color_tokens(theme))
}

pub fn validate_palette(tokens: &ColorTokens) -> PaletteReport {
    let mut ratios = BTreeMap::new();
    let mut violations = Vec::new();

    for pair in &PALETTE_PAIRS {
        let (foreground, background) = pair.colors(tokens);
        let ratio = foreground.contrast_with(background);
        ratios.insert(pair.name, ratio);
        if !ratio_meets_aa(ratio, pair.large_text) {
            violations.push(ContrastViolation {
                pair: pair.name,
                ratio,
                required: contrast::aa_threshold(pair.large_text),
            });
        }
    }

    if !violations.is_empty() {
        tracing::warn!(
            count = violations.len(),
            "palette has pairs below WCAG AA contrast"
        );
    }

    PaletteReport {
        is_valid: violations.is_empty(),
        violations,
        ratios,
    }
}
