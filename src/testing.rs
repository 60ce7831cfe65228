//! Fault-injecting doubles shared by unit tests.

use crate::apply::{RenderError, RenderResult, RenderRoot};
use crate::storage::{KeyValueStore, StoreError, StoreResult};
use crate::system::{ColorSchemeSource, MonitorError, MonitorResult, SchemeCallback, WatchHandle};
use crate::theme::ResolvedTheme;

/// Every read and write fails.
#[derive(Debug, Default)]
pub(crate) struct FailingStore;

impl KeyValueStore for FailingStore {
    fn read(&self, _key: &str) -> StoreResult<Option<String>> {
        Err(StoreError::Unavailable {
            reason: "Storage unavailable".into(),
        })
    }

    fn write(&self, key: &str, _value: &str) -> StoreResult<()> {
        Err(StoreError::QuotaExceeded {
            key: key.to_string(),
        })
    }
}

/// Query and watch both fail.
#[derive(Debug, Default)]
pub(crate) struct BrokenColorScheme;

impl ColorSchemeSource for BrokenColorScheme {
    fn query(&self) -> MonitorResult<ResolvedTheme> {
        Err(MonitorError::QueryFailed {
            reason: "matchMedia is not a function".into(),
        })
    }

    fn watch(&self, _on_change: SchemeCallback) -> MonitorResult<WatchHandle> {
        Err(MonitorError::SubscribeFailed {
            reason: "addEventListener threw".into(),
        })
    }

    fn unwatch(&self, _handle: WatchHandle) -> MonitorResult<()> {
        Err(MonitorError::SubscribeFailed {
            reason: "removeEventListener threw".into(),
        })
    }
}

/// Every mutation fails.
#[derive(Debug, Default)]
pub(crate) struct BrokenRoot;

impl BrokenRoot {
    fn fail(operation: &'static str) -> RenderResult<()> {
        Err(RenderError::MutationFailed {
            operation,
            reason: "classList is read-only".into(),
        })
    }
}

impl RenderRoot for BrokenRoot {
    fn add_marker(&self, _marker: &str) -> RenderResult<()> {
        Self::fail("add_marker")
    }

    fn remove_marker(&self, _marker: &str) -> RenderResult<()> {
        Self::fail("remove_marker")
    }

    fn set_color_scheme(&self, _scheme: &str) -> RenderResult<()> {
        Self::fail("set_color_scheme")
    }
}
