pub mod palette;

pub use palette::{
    default_color_tokens, resolve_color_tokens, ColorOverrides, ColorTokens, ThemeColors,
    DARK_TOKENS, LIGHT_TOKENS,
};
