//! The resilient entry point of the theming pipeline.
//!
//! [`ThemeController`] wires the preference store, the system monitor, the
//! resolver and the applicator together and guarantees that every public call
//! yields a usable [`ResolvedTheme`]. Faults inside any collaborator are
//! logged, recorded in [`ThemeState::last_error`], and otherwise swallowed.
//!
//! Start-up is two-phase. Before the environment is known to be present,
//! [`ThemeController::placeholder`] (and [`ThemeController::resolved`]) report
//! `Light`, which is exactly what [`ThemeController::initialize`] settles on
//! when neither storage nor a color-scheme facility exists. That alignment is
//! what keeps the first paint from flashing a different theme.

use std::cell::{Cell, RefCell, RefMut};
use std::rc::{Rc, Weak};

use crate::a11y::{MotionPreference, MotionSource};
use crate::apply::{RenderRoot, ThemeApplicator};
use crate::config::{ThemeSettings, DEFAULT_TRANSITION_MS};
use crate::error::ErrorKind;
use crate::state::{PhaseMachine, ThemeEvent, ThemePhase, ThemeState};
use crate::storage::{KeyValueStore, PreferenceStore, DEFAULT_STORAGE_KEY};
use crate::system::{ColorSchemeSource, Subscription, SystemPreferenceMonitor};
use crate::theme::{resolve, ResolvedTheme, ThemePreference};

type Listener = Rc<dyn Fn(ResolvedTheme)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Platform facilities handed to a controller. Any of them may be missing.
#[derive(Clone, Default)]
pub struct ThemeEnvironment {
    pub store: Option<Rc<dyn KeyValueStore>>,
    pub color_scheme: Option<Rc<dyn ColorSchemeSource>>,
    pub motion: Option<Rc<dyn MotionSource>>,
    pub root: Option<Rc<dyn RenderRoot>>,
}

impl ThemeEnvironment {
    /// Nothing available: the server-render environment.
    pub fn headless() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, store: impl KeyValueStore + 'static) -> Self {
        self.store = Some(Rc::new(store));
        self
    }

    pub fn with_color_scheme(mut self, source: impl ColorSchemeSource + 'static) -> Self {
        self.color_scheme = Some(Rc::new(source));
        self
    }

    pub fn with_motion(mut self, source: impl MotionSource + 'static) -> Self {
        self.motion = Some(Rc::new(source));
        self
    }

    pub fn with_root(mut self, root: impl RenderRoot + 'static) -> Self {
        self.root = Some(Rc::new(root));
        self
    }
}

impl std::fmt::Debug for ThemeEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeEnvironment")
            .field("store", &self.store.is_some())
            .field("color_scheme", &self.color_scheme.is_some())
            .field("motion", &self.motion.is_some())
            .field("root", &self.root.is_some())
            .finish()
    }
}

struct Shared {
    inner: RefCell<ControllerInner>,
    // Readable even while `inner` is mutably borrowed.
    resolved: Cell<ResolvedTheme>,
    // Latest system signal delivered while `inner` was borrowed.
    pending_signal: Cell<Option<ResolvedTheme>>,
}

struct ControllerInner {
    settings: ThemeSettings,
    store: PreferenceStore,
    monitor: SystemPreferenceMonitor,
    applicator: ThemeApplicator,
    motion: MotionPreference,
    machine: PhaseMachine,
    state: ThemeState,
    // Signal a host pushed before initialization, kept when no source is configured.
    pushed_signal: Option<ResolvedTheme>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl ControllerInner {
    fn record(&mut self, fault: Option<ErrorKind>) {
        if let Some(kind) = fault {
            self.state.last_error = Some(kind);
        }
    }

    fn collect_faults(&mut self) {
        let faults = [
            self.store.take_fault(),
            self.monitor.take_fault(),
            self.applicator.take_fault(),
        ];
        for fault in faults {
            self.record(fault);
        }
    }

    fn step(&mut self, event: ThemeEvent) {
        // The machine logs rejected transitions itself; resolution proceeds regardless.
        let _ = self.machine.transition(event);
    }

    /// Resolve → apply.
    fn run_cycle(&mut self, event: ThemeEvent) {
        self.step(event);
        let resolved = resolve(self.state.preference, self.state.system_signal);
        self.state.resolved = resolved;
        self.applicator.apply(resolved);
        self.step(ThemeEvent::Applied);
        self.collect_faults();
    }

    fn initialize(&mut self) {
        if self.state.ready {
            return;
        }
        let preference = self
            .store
            .load_preference(&self.settings.storage_key)
            .unwrap_or(ThemePreference::System);
        self.state.preference = preference;
        let platform = self.monitor.read();
        self.state.system_signal = match self.pushed_signal {
            Some(signal) if !self.monitor.is_supported() => signal,
            _ => platform,
        };
        self.run_cycle(ThemeEvent::Initialize);
        self.state.ready = true;
        tracing::info!(
            preference = %self.state.preference,
            system_signal = %self.state.system_signal,
            resolved = %self.state.resolved,
            last_error = ?self.state.last_error,
            "theme initialized"
        );
    }

    /// Re-reads the platform after the watch is registered so a change made
    /// between the initial read and registration is not lost.
    fn resync_system_signal(&mut self) {
        self.collect_faults();
        if !self.state.ready || !self.monitor.is_supported() {
            return;
        }
        let current = self.monitor.read();
        if current != self.state.system_signal {
            self.on_system_signal(current);
        }
        self.collect_faults();
    }

    fn set_preference(&mut self, preference: ThemePreference) {
        self.store
            .save_preference(&self.settings.storage_key, preference);
        self.state.preference = preference;
        tracing::debug!(%preference, "theme preference changed");
        self.run_cycle(ThemeEvent::PreferenceChanged);
    }

    fn on_system_signal(&mut self, signal: ResolvedTheme) {
        self.state.system_signal = signal;
        if !self.state.ready {
            self.pushed_signal = Some(signal);
            return;
        }
        if self.state.preference != ThemePreference::System {
            tracing::debug!(%signal, preference = %self.state.preference, "system signal recorded; explicit preference wins");
            return;
        }
        self.run_cycle(ThemeEvent::SystemSignalChanged);
    }

    fn listeners_snapshot(&self) -> Vec<Listener> {
        self.listeners
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect()
    }
}

/// Runs `op` against the controller state, then any system signal deferred
/// meanwhile, and finally notifies listeners, with no borrow held, if the
/// resolved theme changed.
fn run_and_notify(
    shared: &Shared,
    mut inner: RefMut<'_, ControllerInner>,
    op: impl FnOnce(&mut ControllerInner),
) -> ResolvedTheme {
    let previous = inner.state.resolved;
    op(&mut *inner);
    while let Some(signal) = shared.pending_signal.take() {
        tracing::debug!(%signal, "applying system signal deferred during update");
        inner.on_system_signal(signal);
    }
    let resolved = inner.state.resolved;
    let notify = if resolved != previous {
        inner.listeners_snapshot()
    } else {
        Vec::new()
    };
    drop(inner);

    shared.resolved.set(resolved);
    for listener in notify {
        listener(resolved);
    }
    resolved
}

fn dispatch(shared: &Shared, op: impl FnOnce(&mut ControllerInner)) -> ResolvedTheme {
    match shared.inner.try_borrow_mut() {
        Ok(inner) => run_and_notify(shared, inner, op),
        Err(_) => {
            tracing::warn!("theme update arrived while another update was running; dropped");
            shared.resolved.get()
        }
    }
}

/// System signals are never dropped: one arriving mid-update is parked and
/// applied by the update in progress.
fn deliver_signal(shared: &Shared, signal: ResolvedTheme) -> ResolvedTheme {
    match shared.inner.try_borrow_mut() {
        Ok(inner) => run_and_notify(shared, inner, |inner| inner.on_system_signal(signal)),
        Err(_) => {
            tracing::debug!(%signal, "system signal arrived mid-update; deferring");
            shared.pending_signal.set(Some(signal));
            shared.resolved.get()
        }
    }
}

/// Owns the theme state for one application root.
pub struct ThemeController {
    shared: Rc<Shared>,
    subscription: RefCell<Option<Subscription>>,
}

impl ThemeController {
    pub fn new(settings: ThemeSettings, environment: ThemeEnvironment) -> Self {
        let ThemeEnvironment {
            store,
            color_scheme,
            motion,
            root,
        } = environment;

        let inner = ControllerInner {
            settings,
            store: store.map_or_else(PreferenceStore::unavailable, PreferenceStore::new),
            monitor: color_scheme.map_or_else(
                SystemPreferenceMonitor::unsupported,
                SystemPreferenceMonitor::new,
            ),
            applicator: root.map_or_else(ThemeApplicator::detached, ThemeApplicator::new),
            motion: motion.map_or_else(MotionPreference::unsupported, MotionPreference::new),
            machine: PhaseMachine::new(),
            state: ThemeState::default(),
            pushed_signal: None,
            listeners: Vec::new(),
            next_listener: 0,
        };

        Self {
            shared: Rc::new(Shared {
                inner: RefCell::new(inner),
                resolved: Cell::new(ResolvedTheme::Light),
                pending_signal: Cell::new(None),
            }),
            subscription: RefCell::new(None),
        }
    }

    /// Theme to paint before anything about the environment is known.
    pub const fn placeholder() -> ResolvedTheme {
        ResolvedTheme::Light
    }

    /// Phase two of start-up: store → monitor → resolve → apply, then start
    /// following the system signal. Calling it again is a no-op.
    pub fn initialize(&self) -> ResolvedTheme {
        if self.is_ready() {
            return self.resolved();
        }
        dispatch(&self.shared, ControllerInner::initialize);
        self.watch_system_signal();
        self.resolved()
    }

    fn watch_system_signal(&self) {
        let Ok(mut slot) = self.subscription.try_borrow_mut() else {
            return;
        };
        if slot.is_some() {
            return;
        }
        let weak: Weak<Shared> = Rc::downgrade(&self.shared);
        let subscription = {
            let Ok(inner) = self.shared.inner.try_borrow() else {
                return;
            };
            inner.monitor.subscribe(move |signal| {
                if let Some(shared) = weak.upgrade() {
                    deliver_signal(&shared, signal);
                }
            })
        };
        let active = subscription.is_active();
        *slot = Some(subscription);
        drop(slot);
        dispatch(&self.shared, |inner| {
            if active {
                inner.resync_system_signal();
            } else {
                inner.collect_faults();
            }
        });
    }

    /// Records an explicit user choice, persists it best-effort and re-applies.
    pub fn set_preference(&self, preference: ThemePreference) -> ResolvedTheme {
        self.initialize();
        dispatch(&self.shared, |inner| inner.set_preference(preference))
    }

    /// Like [`set_preference`](Self::set_preference) for untrusted input.
    /// Anything but `light`, `dark` or `system` is logged and ignored.
    pub fn set_preference_str(&self, raw: &str) -> ResolvedTheme {
        match ThemePreference::parse(raw) {
            Some(preference) => self.set_preference(preference),
            None => {
                tracing::warn!(value = raw, "ignoring invalid theme preference");
                self.resolved()
            }
        }
    }

    /// Explicitly selects the theme opposite to the one currently shown.
    pub fn toggle(&self) -> ResolvedTheme {
        self.initialize();
        let next = self.resolved().opposite();
        self.set_preference(next.into())
    }

    /// Feeds a platform color-scheme change in by hand, for hosts that own
    /// the platform hook themselves.
    ///
    /// Before [`initialize`](Self::initialize) the signal is only recorded.
    /// Initialization keeps it when no [`ColorSchemeSource`] is configured and
    /// otherwise reads the source afresh.
    pub fn handle_system_change(&self, signal: ResolvedTheme) -> ResolvedTheme {
        deliver_signal(&self.shared, signal)
    }

    pub fn resolved(&self) -> ResolvedTheme {
        self.shared.resolved.get()
    }

    pub fn state(&self) -> ThemeState {
        self.shared
            .inner
            .try_borrow()
            .map(|inner| inner.state)
            .unwrap_or_else(|_| ThemeState {
                resolved: self.resolved(),
                ..ThemeState::default()
            })
    }

    pub fn preference(&self) -> ThemePreference {
        self.state().preference
    }

    pub fn is_ready(&self) -> bool {
        self.state().ready
    }

    pub fn last_error(&self) -> Option<ErrorKind> {
        self.state().last_error
    }

    pub fn phase(&self) -> ThemePhase {
        self.shared
            .inner
            .try_borrow()
            .map(|inner| inner.machine.phase())
            .unwrap_or(ThemePhase::Resolving)
    }

    pub fn storage_key(&self) -> String {
        self.shared
            .inner
            .try_borrow()
            .map(|inner| inner.settings.storage_key.clone())
            .unwrap_or_else(|_| DEFAULT_STORAGE_KEY.to_string())
    }

    pub fn prefers_reduced_motion(&self) -> bool {
        self.shared
            .inner
            .try_borrow()
            .map(|inner| inner.motion.prefers_reduced_motion())
            .unwrap_or(false)
    }

    /// Configured transition length, or 0 under reduced motion.
    pub fn transition_ms(&self) -> u32 {
        self.shared
            .inner
            .try_borrow()
            .map(|inner| {
                inner
                    .motion
                    .transition_duration(inner.settings.transition_ms)
            })
            .unwrap_or(DEFAULT_TRANSITION_MS)
    }

    pub fn transition_duration(&self, default_ms: u32) -> u32 {
        if self.prefers_reduced_motion() {
            0
        } else {
            default_ms
        }
    }

    /// Registers a callback fired after every change of the resolved theme.
    pub fn subscribe(&self, listener: impl Fn(ResolvedTheme) + 'static) -> Option<ListenerId> {
        let mut inner = self.shared.inner.try_borrow_mut().ok()?;
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        inner.listeners.push((id, Rc::new(listener)));
        Some(id)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let Ok(mut inner) = self.shared.inner.try_borrow_mut() else {
            return false;
        };
        let before = inner.listeners.len();
        inner.listeners.retain(|(existing, _)| *existing != id);
        inner.listeners.len() != before
    }

    /// Stops following the system signal. Safe to call repeatedly.
    pub fn teardown(&self) {
        let subscription = self
            .subscription
            .try_borrow_mut()
            .ok()
            .and_then(|mut slot| slot.take());
        if let Some(mut subscription) = subscription {
            subscription.unsubscribe();
            tracing::debug!("theme controller stopped following system color-scheme");
        }
    }
}

impl std::fmt::Debug for ThemeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeController")
            .field("state", &self.state())
            .field("phase", &self.phase())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a11y::StaticMotion;
    use crate::apply::{MemoryRoot, DARK_MARKER};
    use crate::storage::{MemoryStore, DEFAULT_STORAGE_KEY};
    use crate::system::{ManualColorScheme, StaticColorScheme};
    use crate::testing::{BrokenColorScheme, BrokenRoot, FailingStore};

    struct Fixture {
        store: MemoryStore,
        scheme: ManualColorScheme,
        root: MemoryRoot,
        controller: ThemeController,
    }

    type Hook = Rc<RefCell<Option<Box<dyn FnOnce()>>>>;

    /// Memory root that runs a one-shot hook from inside `set_color_scheme`,
    /// i.e. in the middle of an update cycle.
    #[derive(Clone, Default)]
    struct HookRoot {
        root: MemoryRoot,
        hook: Hook,
    }

    impl HookRoot {
        fn arm(&self, hook: impl FnOnce() + 'static) {
            *self.hook.borrow_mut() = Some(Box::new(hook));
        }
    }

    impl RenderRoot for HookRoot {
        fn add_marker(&self, marker: &str) -> crate::apply::RenderResult<()> {
            self.root.add_marker(marker)
        }

        fn remove_marker(&self, marker: &str) -> crate::apply::RenderResult<()> {
            self.root.remove_marker(marker)
        }

        fn set_color_scheme(&self, scheme: &str) -> crate::apply::RenderResult<()> {
            let hook = self.hook.borrow_mut().take();
            if let Some(hook) = hook {
                hook();
            }
            self.root.set_color_scheme(scheme)
        }
    }

    fn hooked_controller(signal: ResolvedTheme) -> (ManualColorScheme, HookRoot, Rc<ThemeController>) {
        let scheme = ManualColorScheme::new(signal);
        let root = HookRoot::default();
        let controller = ThemeController::new(
            ThemeSettings::default(),
            ThemeEnvironment::headless()
                .with_store(MemoryStore::new())
                .with_color_scheme(scheme.clone())
                .with_root(root.clone()),
        );
        (scheme, root, Rc::new(controller))
    }

    fn fixture(stored: Option<&str>, signal: ResolvedTheme) -> Fixture {
        let store = MemoryStore::new();
        if let Some(value) = stored {
            store.insert_raw(DEFAULT_STORAGE_KEY, value);
        }
        let scheme = ManualColorScheme::new(signal);
        let root = MemoryRoot::new();
        let controller = ThemeController::new(
            ThemeSettings::default(),
            ThemeEnvironment::headless()
                .with_store(store.clone())
                .with_color_scheme(scheme.clone())
                .with_root(root.clone()),
        );
        Fixture {
            store,
            scheme,
            root,
            controller,
        }
    }

    #[test]
    fn before_initialize_reports_light_placeholder() {
        let f = fixture(Some("dark"), ResolvedTheme::Dark);
        assert_eq!(ThemeController::placeholder(), ResolvedTheme::Light);
        assert_eq!(f.controller.resolved(), ResolvedTheme::Light);
        assert!(!f.controller.is_ready());
        assert_eq!(f.controller.phase(), ThemePhase::Uninitialized);
        assert_eq!(f.root.mutation_count(), 0);
    }

    #[test]
    fn initialize_applies_stored_preference() {
        let f = fixture(Some("dark"), ResolvedTheme::Light);
        assert_eq!(f.controller.initialize(), ResolvedTheme::Dark);
        assert!(f.controller.is_ready());
        assert_eq!(f.controller.phase(), ThemePhase::Applied);
        assert_eq!(f.controller.preference(), ThemePreference::Dark);
        assert!(f.root.has_marker(DARK_MARKER));
        assert_eq!(f.root.color_scheme().as_deref(), Some("dark"));
        assert_eq!(f.controller.last_error(), None);
    }

    #[test]
    fn initialize_is_idempotent() {
        let f = fixture(None, ResolvedTheme::Dark);
        f.controller.initialize();
        let mutations = f.root.mutation_count();
        f.controller.initialize();
        assert_eq!(f.root.mutation_count(), mutations);
        assert_eq!(f.scheme.watcher_count(), 1);
    }

    #[test]
    fn invalid_stored_value_follows_system() {
        let f = fixture(Some("neon"), ResolvedTheme::Dark);
        assert_eq!(f.controller.initialize(), ResolvedTheme::Dark);
        let state = f.controller.state();
        assert_eq!(state.preference, ThemePreference::System);
        assert_eq!(state.last_error, Some(ErrorKind::InvalidStoredValue));
        assert_eq!(f.store.raw(DEFAULT_STORAGE_KEY).as_deref(), Some("neon"));
    }

    #[test]
    fn system_changes_are_tracked_while_following_system() {
        let f = fixture(Some("system"), ResolvedTheme::Light);
        f.controller.initialize();
        f.scheme.set(ResolvedTheme::Dark);
        assert_eq!(f.controller.resolved(), ResolvedTheme::Dark);
        assert!(f.root.has_marker(DARK_MARKER));

        f.scheme.set(ResolvedTheme::Light);
        assert_eq!(f.controller.resolved(), ResolvedTheme::Light);
        assert!(!f.root.has_marker(DARK_MARKER));
    }

    #[test]
    fn system_change_during_update_cycle_is_applied() {
        let (scheme, root, controller) = hooked_controller(ResolvedTheme::Light);
        assert_eq!(controller.initialize(), ResolvedTheme::Light);

        let platform = scheme.clone();
        root.arm(move || platform.set(ResolvedTheme::Dark));
        let resolved = controller.set_preference(ThemePreference::System);

        assert_eq!(resolved, ResolvedTheme::Dark);
        assert_eq!(controller.resolved(), scheme.current());
        let state = controller.state();
        assert_eq!(state.system_signal, ResolvedTheme::Dark);
        assert_eq!(state.preference, ThemePreference::System);
        assert!(root.root.has_marker(DARK_MARKER));
        assert_eq!(root.root.color_scheme().as_deref(), Some("dark"));
        assert_eq!(controller.phase(), ThemePhase::Applied);
    }

    #[test]
    fn listeners_hear_the_deferred_system_change_once() {
        let (scheme, root, controller) = hooked_controller(ResolvedTheme::Light);
        controller.initialize();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        controller.subscribe(move |theme| sink.borrow_mut().push(theme));

        let platform = scheme.clone();
        root.arm(move || platform.set(ResolvedTheme::Dark));
        controller.set_preference(ThemePreference::System);

        assert_eq!(*seen.borrow(), vec![ResolvedTheme::Dark]);
    }

    #[test]
    fn system_change_before_watch_registration_is_picked_up() {
        let (scheme, root, controller) = hooked_controller(ResolvedTheme::Light);
        let platform = scheme.clone();
        root.arm(move || platform.set(ResolvedTheme::Dark));

        controller.initialize();

        assert_eq!(controller.resolved(), ResolvedTheme::Dark);
        assert_eq!(controller.state().system_signal, ResolvedTheme::Dark);
        assert!(root.root.has_marker(DARK_MARKER));
    }

    #[test]
    fn pushed_signal_survives_initialize_without_a_source() {
        let root = MemoryRoot::new();
        let controller = ThemeController::new(
            ThemeSettings::default(),
            ThemeEnvironment::headless()
                .with_store(MemoryStore::new())
                .with_root(root.clone()),
        );
        assert_eq!(
            controller.handle_system_change(ResolvedTheme::Dark),
            ResolvedTheme::Light
        );
        assert_eq!(controller.initialize(), ResolvedTheme::Dark);
        assert!(root.has_marker(DARK_MARKER));
        assert_eq!(controller.last_error(), Some(ErrorKind::MonitorUnsupported));
    }

    #[test]
    fn configured_source_wins_over_early_pushed_signal() {
        let f = fixture(None, ResolvedTheme::Light);
        f.controller.handle_system_change(ResolvedTheme::Dark);
        assert_eq!(f.controller.initialize(), ResolvedTheme::Light);
    }

    #[test]
    fn accessors_fall_back_to_defaults_mid_cycle() {
        let (_scheme, root, controller) = hooked_controller(ResolvedTheme::Light);
        let weak = Rc::downgrade(&controller);
        let observed = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&observed);
        root.arm(move || {
            if let Some(controller) = weak.upgrade() {
                *sink.borrow_mut() = Some((controller.storage_key(), controller.transition_ms()));
            }
        });

        controller.initialize();

        assert_eq!(
            observed.borrow().clone(),
            Some((
                DEFAULT_STORAGE_KEY.to_string(),
                crate::config::DEFAULT_TRANSITION_MS
            ))
        );
    }

    #[test]
    fn explicit_preference_ignores_system_changes_but_records_signal() {
        let f = fixture(Some("light"), ResolvedTheme::Light);
        f.controller.initialize();
        let mutations = f.root.mutation_count();
        f.scheme.set(ResolvedTheme::Dark);

        let state = f.controller.state();
        assert_eq!(state.resolved, ResolvedTheme::Light);
        assert_eq!(state.system_signal, ResolvedTheme::Dark);
        assert_eq!(f.root.mutation_count(), mutations);

        f.controller.set_preference(ThemePreference::System);
        assert_eq!(f.controller.resolved(), ResolvedTheme::Dark);
    }

    #[test]
    fn set_preference_persists_and_applies() {
        let f = fixture(None, ResolvedTheme::Light);
        f.controller.initialize();
        assert_eq!(
            f.controller.set_preference(ThemePreference::Dark),
            ResolvedTheme::Dark
        );
        assert_eq!(f.store.raw(DEFAULT_STORAGE_KEY).as_deref(), Some("dark"));
        assert!(f.root.has_marker(DARK_MARKER));
    }

    #[test]
    fn invalid_preference_string_is_ignored() {
        let f = fixture(Some("dark"), ResolvedTheme::Light);
        f.controller.initialize();
        let before = f.controller.state();
        assert_eq!(f.controller.set_preference_str("purple"), ResolvedTheme::Dark);
        assert_eq!(f.controller.state(), before);
        assert_eq!(f.store.raw(DEFAULT_STORAGE_KEY).as_deref(), Some("dark"));
    }

    #[test]
    fn set_before_initialize_initializes_first() {
        let f = fixture(None, ResolvedTheme::Dark);
        assert_eq!(f.controller.set_preference_str("light"), ResolvedTheme::Light);
        assert!(f.controller.is_ready());
        assert_eq!(f.scheme.watcher_count(), 1);
        assert_eq!(f.store.raw(DEFAULT_STORAGE_KEY).as_deref(), Some("light"));
    }

    #[test]
    fn toggle_flips_resolved_theme_explicitly() {
        let f = fixture(None, ResolvedTheme::Dark);
        assert_eq!(f.controller.toggle(), ResolvedTheme::Light);
        assert_eq!(f.controller.preference(), ThemePreference::Light);
        assert_eq!(f.controller.toggle(), ResolvedTheme::Dark);
        assert_eq!(f.controller.preference(), ThemePreference::Dark);
    }

    #[test]
    fn listeners_hear_changes_only() {
        let f = fixture(None, ResolvedTheme::Light);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = f
            .controller
            .subscribe(move |theme| sink.borrow_mut().push(theme))
            .expect("subscribe should succeed");

        f.controller.initialize();
        f.controller.set_preference(ThemePreference::Light);
        f.controller.set_preference(ThemePreference::Dark);
        f.scheme.set(ResolvedTheme::Dark);
        assert!(f.controller.unsubscribe(id));
        assert!(!f.controller.unsubscribe(id));
        f.controller.set_preference(ThemePreference::Light);

        assert_eq!(*seen.borrow(), vec![ResolvedTheme::Dark]);
    }

    #[test]
    fn listener_may_call_back_into_controller() {
        let f = fixture(None, ResolvedTheme::Light);
        let controller = Rc::new(f.controller);
        let weak = Rc::downgrade(&controller);
        let observed = Rc::new(Cell::new(None));
        let sink = Rc::clone(&observed);
        controller.subscribe(move |_| {
            if let Some(controller) = weak.upgrade() {
                sink.set(Some(controller.state().resolved));
            }
        });
        controller.initialize();
        controller.set_preference(ThemePreference::Dark);
        assert_eq!(observed.get(), Some(ResolvedTheme::Dark));
    }

    #[test]
    fn teardown_stops_following_system_and_is_idempotent() {
        let f = fixture(None, ResolvedTheme::Light);
        f.controller.initialize();
        f.controller.teardown();
        f.controller.teardown();
        assert_eq!(f.scheme.watcher_count(), 0);
        f.scheme.set(ResolvedTheme::Dark);
        assert_eq!(f.controller.resolved(), ResolvedTheme::Light);
    }

    #[test]
    fn dropping_controller_releases_system_watch() {
        let f = fixture(None, ResolvedTheme::Light);
        f.controller.initialize();
        assert_eq!(f.scheme.watcher_count(), 1);
        drop(f.controller);
        assert_eq!(f.scheme.watcher_count(), 0);
        f.scheme.set(ResolvedTheme::Dark);
    }

    #[test]
    fn headless_environment_settles_on_placeholder() {
        let controller = ThemeController::new(ThemeSettings::default(), ThemeEnvironment::headless());
        assert_eq!(controller.initialize(), ThemeController::placeholder());
        let state = controller.state();
        assert!(state.ready);
        assert_eq!(state.preference, ThemePreference::System);
        assert!(state.last_error.is_some());
    }

    #[test]
    fn failing_store_still_follows_system() {
        let controller = ThemeController::new(
            ThemeSettings::default(),
            ThemeEnvironment::headless()
                .with_store(FailingStore)
                .with_color_scheme(StaticColorScheme(ResolvedTheme::Dark))
                .with_root(MemoryRoot::new()),
        );
        assert_eq!(controller.initialize(), ResolvedTheme::Dark);
        assert_eq!(controller.preference(), ThemePreference::System);

        assert_eq!(
            controller.set_preference(ThemePreference::Light),
            ResolvedTheme::Light
        );
        assert_eq!(controller.last_error(), Some(ErrorKind::StorageWriteFailed));
    }

    #[test]
    fn every_facility_failing_renders_light() {
        let controller = ThemeController::new(
            ThemeSettings::default(),
            ThemeEnvironment::headless()
                .with_store(FailingStore)
                .with_color_scheme(BrokenColorScheme)
                .with_root(BrokenRoot),
        );
        assert_eq!(controller.initialize(), ResolvedTheme::Light);
        assert_eq!(controller.set_preference(ThemePreference::Dark), ResolvedTheme::Dark);
        assert_eq!(controller.last_error(), Some(ErrorKind::RenderMutationFailed));
        controller.teardown();
    }

    #[test]
    fn monitor_subscribe_failure_is_recorded() {
        let controller = ThemeController::new(
            ThemeSettings::default(),
            ThemeEnvironment::headless()
                .with_store(MemoryStore::new())
                .with_color_scheme(BrokenColorScheme)
                .with_root(MemoryRoot::new()),
        );
        controller.initialize();
        assert_eq!(
            controller.last_error(),
            Some(ErrorKind::MonitorSubscribeFailed)
        );
    }

    #[test]
    fn custom_storage_key_is_used() {
        let store = MemoryStore::new();
        store.insert_raw("site-theme", "dark");
        let controller = ThemeController::new(
            ThemeSettings::default().with_storage_key("site-theme"),
            ThemeEnvironment::headless().with_store(store.clone()),
        );
        assert_eq!(controller.initialize(), ResolvedTheme::Dark);
        assert_eq!(controller.storage_key(), "site-theme");
        controller.set_preference(ThemePreference::Light);
        assert_eq!(store.raw("site-theme").as_deref(), Some("light"));
        assert_eq!(store.raw(DEFAULT_STORAGE_KEY), None);
    }

    #[test]
    fn reduced_motion_zeroes_transition() {
        let controller = ThemeController::new(
            ThemeSettings::default(),
            ThemeEnvironment::headless().with_motion(StaticMotion(true)),
        );
        assert!(controller.prefers_reduced_motion());
        assert_eq!(controller.transition_ms(), 0);
        assert_eq!(controller.transition_duration(300), 0);

        let controller = ThemeController::new(ThemeSettings::default(), ThemeEnvironment::headless());
        assert!(!controller.prefers_reduced_motion());
        assert_eq!(
            controller.transition_ms(),
            crate::config::DEFAULT_TRANSITION_MS
        );
    }
}
