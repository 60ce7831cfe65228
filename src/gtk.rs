//! GTK bindings for the theme facilities: `gtk4::Settings` as the system
//! color-scheme and reduced-motion source, a widget as the render root.

use std::cell::{Cell, RefCell};

use gtk4::prelude::*;

use crate::a11y::MotionSource;
use crate::apply::{RenderResult, RenderRoot};
use crate::system::{
    theme_from_scheme_name, ColorSchemeSource, MonitorError, MonitorResult, SchemeCallback,
    WatchHandle,
};
use crate::theme::ResolvedTheme;

const COLOR_SCHEME_PROPERTY: &str = "gtk-interface-color-scheme";
// GTK_INTERFACE_COLOR_SCHEME_* values.
const FORCE_DARK: i32 = 2;
const FORCE_LIGHT: i32 = 3;

const SCHEME_CLASS_PREFIX: &str = "color-scheme-";

fn default_settings() -> MonitorResult<gtk4::Settings> {
    gtk4::Settings::default().ok_or(MonitorError::Unsupported)
}

fn has_color_scheme_property(settings: &gtk4::Settings) -> bool {
    settings
        .list_properties()
        .iter()
        .any(|prop| prop.name() == COLOR_SCHEME_PROPERTY)
}

pub(crate) fn theme_from_settings(settings: &gtk4::Settings) -> ResolvedTheme {
    if has_color_scheme_property(settings) {
        let color_scheme = settings.property_value(COLOR_SCHEME_PROPERTY);
        if let Ok(raw_scheme) = color_scheme.get::<i32>() {
            match raw_scheme {
                FORCE_LIGHT => return ResolvedTheme::Light,
                FORCE_DARK => return ResolvedTheme::Dark,
                // DEFAULT or PREFER_* keep the fallback path
                _ => {}
            }
        }
    }

    if let Some(theme) = settings
        .gtk_theme_name()
        .and_then(|name| theme_from_scheme_name(name.as_str()))
    {
        return theme;
    }

    #[allow(deprecated)]
    let prefer_dark = settings.is_gtk_application_prefer_dark_theme();
    if prefer_dark {
        ResolvedTheme::Dark
    } else {
        ResolvedTheme::Light
    }
}

/// System signal read from the default `gtk4::Settings`.
pub struct GtkColorScheme {
    settings: gtk4::Settings,
    handlers: RefCell<Vec<(WatchHandle, Vec<gtk4::glib::SignalHandlerId>)>>,
    next_handle: Cell<u64>,
}

impl GtkColorScheme {
    pub fn new(settings: gtk4::Settings) -> Self {
        Self {
            settings,
            handlers: RefCell::new(Vec::new()),
            next_handle: Cell::new(0),
        }
    }

    /// `None` when GTK has no default display yet.
    pub fn for_default_display() -> Option<Self> {
        default_settings().ok().map(Self::new)
    }
}

impl ColorSchemeSource for GtkColorScheme {
    fn query(&self) -> MonitorResult<ResolvedTheme> {
        Ok(theme_from_settings(&self.settings))
    }

    fn watch(&self, on_change: SchemeCallback) -> MonitorResult<WatchHandle> {
        let handle = WatchHandle(self.next_handle.get());
        self.next_handle.set(handle.0 + 1);

        let mut ids = Vec::with_capacity(3);
        if has_color_scheme_property(&self.settings) {
            let on_scheme = on_change.clone();
            ids.push(self.settings.connect_notify_local(
                Some(COLOR_SCHEME_PROPERTY),
                move |settings, _| on_scheme(theme_from_settings(settings)),
            ));
        }
        let on_theme_name = on_change.clone();
        ids.push(
            self.settings
                .connect_gtk_theme_name_notify(move |settings| on_theme_name(theme_from_settings(settings))),
        );
        ids.push(
            self.settings
                .connect_gtk_application_prefer_dark_theme_notify(move |settings| {
                    on_change(theme_from_settings(settings))
                }),
        );

        self.handlers.borrow_mut().push((handle, ids));
        Ok(handle)
    }

    fn unwatch(&self, handle: WatchHandle) -> MonitorResult<()> {
        let mut handlers = self.handlers.borrow_mut();
        let Some(index) = handlers.iter().position(|(existing, _)| *existing == handle) else {
            return Ok(());
        };
        let (_, ids) = handlers.remove(index);
        for id in ids {
            self.settings.disconnect(id);
        }
        Ok(())
    }
}

/// Reduced motion as GTK reports it through `gtk-enable-animations`.
pub struct GtkMotion {
    settings: gtk4::Settings,
}

impl GtkMotion {
    pub fn new(settings: gtk4::Settings) -> Self {
        Self { settings }
    }

    pub fn for_default_display() -> Option<Self> {
        default_settings().ok().map(Self::new)
    }
}

impl MotionSource for GtkMotion {
    fn reduced_motion(&self) -> Result<bool, MonitorError> {
        Ok(!self.settings.is_gtk_enable_animations())
    }
}

/// CSS classes on a top-level widget: `dark` as the marker and
/// `color-scheme-{light,dark}` as the scheme hint.
pub struct GtkRoot {
    widget: gtk4::Widget,
}

impl GtkRoot {
    pub fn new(widget: &impl IsA<gtk4::Widget>) -> Self {
        Self {
            widget: widget.clone().upcast(),
        }
    }
}

impl RenderRoot for GtkRoot {
    fn add_marker(&self, marker: &str) -> RenderResult<()> {
        self.widget.add_css_class(marker);
        Ok(())
    }

    fn remove_marker(&self, marker: &str) -> RenderResult<()> {
        self.widget.remove_css_class(marker);
        Ok(())
    }

    fn set_color_scheme(&self, scheme: &str) -> RenderResult<()> {
        for existing in [ResolvedTheme::Light, ResolvedTheme::Dark] {
            self.widget
                .remove_css_class(&format!("{SCHEME_CLASS_PREFIX}{}", existing.color_scheme()));
        }
        self.widget
            .add_css_class(&format!("{SCHEME_CLASS_PREFIX}{scheme}"));
        Ok(())
    }
}
