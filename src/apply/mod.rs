use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::error::ErrorKind;
use crate::theme::ResolvedTheme;
use thiserror::Error;

/// Class placed on the render root while the dark theme is active.
pub const DARK_MARKER: &str = "dark";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("no render root is available")]
    Unavailable,
    #[error("render root rejected {operation}: {reason}")]
    MutationFailed {
        operation: &'static str,
        reason: String,
    },
}

impl RenderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RenderError::Unavailable => ErrorKind::RenderTargetUnavailable,
            RenderError::MutationFailed { .. } => ErrorKind::RenderMutationFailed,
        }
    }
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;

/// Mutation surface of the element the theme is rendered onto.
///
/// `add_marker` and `remove_marker` must behave like a class set: adding an
/// existing marker or removing a missing one is a no-op.
pub trait RenderRoot {
    fn add_marker(&self, marker: &str) -> RenderResult<()>;
    fn remove_marker(&self, marker: &str) -> RenderResult<()>;
    fn set_color_scheme(&self, scheme: &str) -> RenderResult<()>;
}

/// Render root kept in memory: server rendering output and test double.
#[derive(Debug, Clone, Default)]
pub struct MemoryRoot {
    inner: Rc<MemoryRootInner>,
}

#[derive(Debug, Default)]
struct MemoryRootInner {
    markers: RefCell<BTreeSet<String>>,
    color_scheme: RefCell<Option<String>>,
    mutations: Cell<usize>,
}

impl MemoryRoot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_marker(&self, marker: &str) -> bool {
        self.inner.markers.borrow().contains(marker)
    }

    pub fn markers(&self) -> Vec<String> {
        self.inner.markers.borrow().iter().cloned().collect()
    }

    pub fn color_scheme(&self) -> Option<String> {
        self.inner.color_scheme.borrow().clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.inner.mutations.get()
    }

    fn count(&self) {
        self.inner.mutations.set(self.inner.mutations.get() + 1);
    }
}

impl RenderRoot for MemoryRoot {
    fn add_marker(&self, marker: &str) -> RenderResult<()> {
        self.count();
        self.inner.markers.borrow_mut().insert(marker.to_string());
        Ok(())
    }

    fn remove_marker(&self, marker: &str) -> RenderResult<()> {
        self.count();
        self.inner.markers.borrow_mut().remove(marker);
        Ok(())
    }

    fn set_color_scheme(&self, scheme: &str) -> RenderResult<()> {
        self.count();
        *self.inner.color_scheme.borrow_mut() = Some(scheme.to_string());
        Ok(())
    }
}

/// Applies a resolved theme to an optional render root. Never fails.
pub struct ThemeApplicator {
    root: Option<Rc<dyn RenderRoot>>,
    fault: Cell<Option<ErrorKind>>,
}

impl ThemeApplicator {
    pub fn new(root: Rc<dyn RenderRoot>) -> Self {
        Self {
            root: Some(root),
            fault: Cell::new(None),
        }
    }

    /// No render surface yet (server render, before hydration).
    pub fn detached() -> Self {
        Self {
            root: None,
            fault: Cell::new(None),
        }
    }

    pub fn has_root(&self) -> bool {
        self.root.is_some()
    }

    pub fn apply(&self, resolved: ResolvedTheme) {
        let Some(root) = self.root.as_ref() else {
            tracing::debug!(theme = %resolved, "no render root; skipping theme application");
            self.fault.set(Some(ErrorKind::RenderTargetUnavailable));
            return;
        };

        let marker = if resolved.is_dark() {
            root.add_marker(DARK_MARKER)
        } else {
            root.remove_marker(DARK_MARKER)
        };
        let scheme = root.set_color_scheme(resolved.color_scheme());

        for err in [marker.err(), scheme.err()].into_iter().flatten() {
            tracing::warn!(theme = %resolved, %err, "render root mutation failed; theme partially applied");
            self.fault.set(Some(err.kind()));
        }
    }

    pub fn take_fault(&self) -> Option<ErrorKind> {
        self.fault.take()
    }
}

impl std::fmt::Debug for ThemeApplicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeApplicator")
            .field("has_root", &self.has_root())
            .field("fault", &self.fault.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::BrokenRoot;

    #[test]
    fn dark_adds_marker_and_scheme_hint() {
        let root = MemoryRoot::new();
        let applicator = ThemeApplicator::new(Rc::new(root.clone()));
        applicator.apply(ResolvedTheme::Dark);
        assert!(root.has_marker(DARK_MARKER));
        assert_eq!(root.color_scheme().as_deref(), Some("dark"));
        assert_eq!(applicator.take_fault(), None);
    }

    #[test]
    fn light_removes_marker() {
        let root = MemoryRoot::new();
        let applicator = ThemeApplicator::new(Rc::new(root.clone()));
        applicator.apply(ResolvedTheme::Dark);
        applicator.apply(ResolvedTheme::Light);
        assert!(!root.has_marker(DARK_MARKER));
        assert_eq!(root.color_scheme().as_deref(), Some("light"));
    }

    #[test]
    fn repeated_apply_does_not_accumulate() {
        let root = MemoryRoot::new();
        let applicator = ThemeApplicator::new(Rc::new(root.clone()));
        for _ in 0..3 {
            applicator.apply(ResolvedTheme::Dark);
        }
        assert_eq!(root.markers(), vec![DARK_MARKER.to_string()]);
        assert_eq!(root.color_scheme().as_deref(), Some("dark"));
    }

    #[test]
    fn missing_root_is_a_recorded_no_op() {
        let applicator = ThemeApplicator::detached();
        applicator.apply(ResolvedTheme::Dark);
        assert_eq!(
            applicator.take_fault(),
            Some(ErrorKind::RenderTargetUnavailable)
        );
    }

    #[test]
    fn failing_mutations_are_absorbed() {
        let applicator = ThemeApplicator::new(Rc::new(BrokenRoot));
        applicator.apply(ResolvedTheme::Dark);
        applicator.apply(ResolvedTheme::Light);
        assert_eq!(
            applicator.take_fault(),
            Some(ErrorKind::RenderMutationFailed)
        );
    }
}
