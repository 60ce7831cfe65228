use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::ErrorKind;
use crate::theme::ResolvedTheme;
use thiserror::Error;

pub const COLOR_SCHEME_ENV: &str = "FOLIO_COLOR_SCHEME";
const GTK_THEME_ENV: &str = "GTK_THEME";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    #[error("color-scheme query is not supported here")]
    Unsupported,
    #[error("color-scheme query failed: {reason}")]
    QueryFailed { reason: String },
    #[error("failed to register color-scheme listener: {reason}")]
    SubscribeFailed { reason: String },
}

impl MonitorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MonitorError::Unsupported | MonitorError::QueryFailed { .. } => {
                ErrorKind::MonitorUnsupported
            }
            MonitorError::SubscribeFailed { .. } => ErrorKind::MonitorSubscribeFailed,
        }
    }
}

pub type MonitorResult<T> = std::result::Result<T, MonitorError>;

pub type SchemeCallback = Rc<dyn Fn(ResolvedTheme)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchHandle(pub u64);

/// Platform light/dark signal with point-in-time reads and change callbacks.
pub trait ColorSchemeSource {
    fn query(&self) -> MonitorResult<ResolvedTheme>;
    fn watch(&self, on_change: SchemeCallback) -> MonitorResult<WatchHandle>;
    fn unwatch(&self, handle: WatchHandle) -> MonitorResult<()>;
}

/// A signal that never changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticColorScheme(pub ResolvedTheme);

impl ColorSchemeSource for StaticColorScheme {
    fn query(&self) -> MonitorResult<ResolvedTheme> {
        Ok(self.0)
    }

    fn watch(&self, _on_change: SchemeCallback) -> MonitorResult<WatchHandle> {
        Ok(WatchHandle(0))
    }

    fn unwatch(&self, _handle: WatchHandle) -> MonitorResult<()> {
        Ok(())
    }
}

/// Host-driven signal: whoever owns the real platform hook calls [`set`].
///
/// Clones share the same signal and watcher list.
///
/// [`set`]: ManualColorScheme::set
#[derive(Clone, Default)]
pub struct ManualColorScheme {
    inner: Rc<ManualInner>,
}

#[derive(Default)]
struct ManualInner {
    current: Cell<ResolvedTheme>,
    watchers: RefCell<Vec<(WatchHandle, SchemeCallback)>>,
    next_handle: Cell<u64>,
}

impl ManualColorScheme {
    pub fn new(initial: ResolvedTheme) -> Self {
        let scheme = Self::default();
        scheme.inner.current.set(initial);
        scheme
    }

    pub fn current(&self) -> ResolvedTheme {
        self.inner.current.get()
    }

    pub fn watcher_count(&self) -> usize {
        self.inner.watchers.borrow().len()
    }

    /// Updates the signal and notifies watchers when it actually changed.
    pub fn set(&self, theme: ResolvedTheme) {
        if self.inner.current.replace(theme) == theme {
            return;
        }
        let watchers: Vec<SchemeCallback> = self
            .inner
            .watchers
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in watchers {
            callback(theme);
        }
    }
}

impl ColorSchemeSource for ManualColorScheme {
    fn query(&self) -> MonitorResult<ResolvedTheme> {
        Ok(self.current())
    }

    fn watch(&self, on_change: SchemeCallback) -> MonitorResult<WatchHandle> {
        let id = self.inner.next_handle.get();
        self.inner.next_handle.set(id + 1);
        let handle = WatchHandle(id);
        self.inner.watchers.borrow_mut().push((handle, on_change));
        Ok(handle)
    }

    fn unwatch(&self, handle: WatchHandle) -> MonitorResult<()> {
        self.inner
            .watchers
            .borrow_mut()
            .retain(|(existing, _)| *existing != handle);
        Ok(())
    }
}

/// Reads `FOLIO_COLOR_SCHEME`, then `GTK_THEME`. No change events.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvColorScheme;

impl ColorSchemeSource for EnvColorScheme {
    fn query(&self) -> MonitorResult<ResolvedTheme> {
        [COLOR_SCHEME_ENV, GTK_THEME_ENV]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find_map(|value| theme_from_scheme_name(&value))
            .ok_or(MonitorError::Unsupported)
    }

    fn watch(&self, _on_change: SchemeCallback) -> MonitorResult<WatchHandle> {
        Ok(WatchHandle(0))
    }

    fn unwatch(&self, _handle: WatchHandle) -> MonitorResult<()> {
        Ok(())
    }
}

/// Classifies a scheme or theme name such as `Adwaita:dark` or `prefer-light`.
pub fn theme_from_scheme_name(name: &str) -> Option<ResolvedTheme> {
    let normalized = name.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return None;
    }
    if normalized.contains("dark") {
        return Some(ResolvedTheme::Dark);
    }
    if normalized.contains("light") {
        return Some(ResolvedTheme::Light);
    }
    None
}

/// Never-failing front for an optional [`ColorSchemeSource`].
pub struct SystemPreferenceMonitor {
    source: Option<Rc<dyn ColorSchemeSource>>,
    fault: Cell<Option<ErrorKind>>,
}

impl SystemPreferenceMonitor {
    pub fn new(source: Rc<dyn ColorSchemeSource>) -> Self {
        Self {
            source: Some(source),
            fault: Cell::new(None),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            source: None,
            fault: Cell::new(None),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.source.is_some()
    }

    /// Current platform signal; `Light` when the facility is missing or fails.
    pub fn read(&self) -> ResolvedTheme {
        let Some(source) = self.source.as_ref() else {
            self.fault.set(Some(ErrorKind::MonitorUnsupported));
            return ResolvedTheme::Light;
        };
        source.query().unwrap_or_else(|err| {
            tracing::warn!(%err, "system color-scheme unavailable; assuming light");
            self.fault.set(Some(err.kind()));
            ResolvedTheme::Light
        })
    }

    /// Registers `on_change`. When registration fails the returned
    /// subscription is inert.
    pub fn subscribe(&self, on_change: impl Fn(ResolvedTheme) + 'static) -> Subscription {
        let Some(source) = self.source.as_ref() else {
            self.fault.set(Some(ErrorKind::MonitorUnsupported));
            return Subscription::inert();
        };
        match source.watch(Rc::new(on_change)) {
            Ok(handle) => Subscription {
                active: Some((Rc::clone(source), handle)),
            },
            Err(err) => {
                tracing::warn!(%err, "cannot watch system color-scheme; changes will be missed");
                self.fault.set(Some(ErrorKind::MonitorSubscribeFailed));
                Subscription::inert()
            }
        }
    }

    pub fn take_fault(&self) -> Option<ErrorKind> {
        self.fault.take()
    }
}

impl std::fmt::Debug for SystemPreferenceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemPreferenceMonitor")
            .field("supported", &self.source.is_some())
            .field("fault", &self.fault.get())
            .finish()
    }
}

/// Handle returned by [`SystemPreferenceMonitor::subscribe`].
///
/// `unsubscribe` may be called any number of times; dropping the handle
/// unsubscribes as well.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    active: Option<(Rc<dyn ColorSchemeSource>, WatchHandle)>,
}

impl Subscription {
    pub fn inert() -> Self {
        Self { active: None }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn unsubscribe(&mut self) {
        let Some((source, handle)) = self.active.take() else {
            return;
        };
        if let Err(err) = source.unwatch(handle) {
            tracing::warn!(%err, handle = handle.0, "failed to remove color-scheme listener");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
