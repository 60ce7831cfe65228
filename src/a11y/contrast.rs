use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorKind;

pub const WCAG_AA_NORMAL: f64 = 4.5;
pub const WCAG_AA_LARGE: f64 = 3.0;
pub const WCAG_AAA_NORMAL: f64 = 7.0;
pub const WCAG_AAA_LARGE: f64 = 4.5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("invalid color format `{value}`; expected #RRGGBB")]
    InvalidColorFormat { value: String },
}

impl ColorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ColorError::InvalidColorFormat { .. } => ErrorKind::InvalidColorFormat,
        }
    }
}

/// An sRGB color parsed from `#RRGGBB` / `RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(value: &str) -> Result<Self, ColorError> {
        let invalid = || ColorError::InvalidColorFormat {
            value: value.to_string(),
        };
        let hex = value.strip_prefix('#').unwrap_or(value);
        if hex.len() != 6 || !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |index: usize| u8::from_str_radix(&hex[index..index + 2], 16);
        match (channel(0), channel(2), channel(4)) {
            (Ok(r), Ok(g), Ok(b)) => Ok(Self::new(r, g, b)),
            _ => Err(invalid()),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// WCAG 2.x relative luminance in `[0, 1]`.
    pub fn relative_luminance(self) -> f64 {
        let r = srgb_to_linear(self.r);
        let g = srgb_to_linear(self.g);
        let b = srgb_to_linear(self.b);
        0.2126 * r + 0.7152 * g + 0.0722 * b
    }

    pub fn contrast_with(self, other: Rgb) -> f64 {
        let a = self.relative_luminance();
        let b = other.relative_luminance();
        let (lighter, darker) = if a >= b { (a, b) } else { (b, a) };
        (lighter + 0.05) / (darker + 0.05)
    }
}

fn srgb_to_linear(channel: u8) -> f64 {
    let c = f64::from(channel) / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

impl FromStr for Rgb {
    type Err = ColorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_hex(value)
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Contrast ratio between two hex colors, in `[1, 21]`.
pub fn contrast_ratio(color_a: &str, color_b: &str) -> Result<f64, ColorError> {
    let a = Rgb::from_hex(color_a)?;
    let b = Rgb::from_hex(color_b)?;
    Ok(a.contrast_with(b))
}

pub fn meets_aa(foreground: &str, background: &str, large_text: bool) -> Result<bool, ColorError> {
    let ratio = contrast_ratio(foreground, background)?;
    Ok(ratio_meets_aa(ratio, large_text))
}

pub fn meets_aaa(
    foreground: &str,
    background: &str,
    large_text: bool,
) -> Result<bool, ColorError> {
    let ratio = contrast_ratio(foreground, background)?;
    Ok(ratio_meets_aaa(ratio, large_text))
}

pub fn ratio_meets_aa(ratio: f64, large_text: bool) -> bool {
    ratio >= aa_threshold(large_text)
}

pub fn ratio_meets_aaa(ratio: f64, large_text: bool) -> bool {
    ratio >= if large_text {
        WCAG_AAA_LARGE
    } else {
        WCAG_AAA_NORMAL
    }
}

pub(crate) fn aa_threshold(large_text: bool) -> f64 {
    if large_text {
        WCAG_AA_LARGE
    } else {
        WCAG_AA_NORMAL
    }
}
