//! Server-side pieces of the pre-paint contract.
//!
//! The server cannot see the visitor's storage or color scheme, so it renders
//! the root with the `Light` placeholder attributes and ships
//! [`prepaint_script`], which the browser runs before first paint to perform
//! the same store → system → resolve → apply sequence the controller does.

use crate::apply::DARK_MARKER;
use crate::theme::ResolvedTheme;

const KEY_PLACEHOLDER: &str = "__FOLIO_STORAGE_KEY__";

const PREPAINT_TEMPLATE: &str = r#"(function(){try{var k=__FOLIO_STORAGE_KEY__;var p=null;try{p=window.localStorage.getItem(k);}catch(e){}if(p!=="light"&&p!=="dark"&&p!=="system"){p="system";}var d=p==="dark";if(p==="system"){try{d=window.matchMedia("(prefers-color-scheme: dark)").matches;}catch(e){d=false;}}var r=document.documentElement;if(d){r.classList.add("dark");}else{r.classList.remove("dark");}r.style.colorScheme=d?"dark":"light";}catch(e){}})();"#;

/// Attributes for the root element of a server-rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootAttributes {
    pub class: Option<&'static str>,
    pub color_scheme: &'static str,
}

impl RootAttributes {
    pub const fn for_theme(theme: ResolvedTheme) -> Self {
        Self {
            class: if theme.is_dark() {
                Some(DARK_MARKER)
            } else {
                None
            },
            color_scheme: theme.color_scheme(),
        }
    }

    /// Placeholder attributes matching `ThemeController::placeholder`.
    pub const fn placeholder() -> Self {
        Self::for_theme(ResolvedTheme::Light)
    }

    pub fn to_html(&self) -> String {
        let style = format!("style=\"color-scheme: {}\"", self.color_scheme);
        match self.class {
            Some(class) => format!("class=\"{class}\" {style}"),
            None => style,
        }
    }
}

/// Inline script to place in `<head>` ahead of any themed content.
///
/// Every facility access is guarded, so a browser without storage or
/// `matchMedia` ends up light, like the controller does.
pub fn prepaint_script(storage_key: &str) -> String {
    let key = serde_json::to_string(storage_key)
        .unwrap_or_else(|_| "\"theme\"".to_string())
        .replace("</", "<\\/");
    PREPAINT_TEMPLATE.replace(KEY_PLACEHOLDER, &key)
}
