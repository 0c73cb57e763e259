//! Effect Implementation
//!
//! An Effect is a side-effecting computation that re-runs whenever a
//! reactive field it previously read changes.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. When any of those fields is written, the effect re-runs.
//!
//! 3. Before every re-run, the effect is removed from all dependency sets it
//!    belongs to, then re-subscribes to exactly the fields it touches on
//!    that run. This is what makes tracking branch-sensitive: a field read
//!    only on a branch not taken this run no longer re-triggers the effect.
//!
//! # Use Cases
//!
//! Effects synchronize reactive state with the outside world:
//!
//! - Rendering output when state changes
//! - Logging state changes
//! - Writing to files or sockets
//!
//! # Disposal
//!
//! Effects run until explicitly disposed. Disposal removes the effect from
//! every dependency set without invoking its callback, drops the callback
//! (releasing anything it captured), and makes the effect inert against
//! future triggers. Dropping the handle does not dispose; handles are cheap
//! clones sharing one underlying registration.
//!
//! # Errors
//!
//! A panic inside the callback is not caught; it propagates out of whatever
//! write (or manual run) invoked the effect. The runtime's bookkeeping stays
//! consistent across such a panic, but later effects in the same fan-out are
//! not invoked for that cycle.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use smallvec::SmallVec;

use super::registry::DepKey;
use super::runtime::Runtime;

/// Unique identifier for an effect.
///
/// Each registered effect gets a unique ID when created. Dependency sets
/// store these IDs rather than the callbacks themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectId(u64);

impl EffectId {
    /// Generate a new unique effect ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub(crate) fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Per-effect state owned by the runtime's effect table.
pub(crate) struct EffectState {
    /// The wrapped user callback.
    pub(crate) callback: Arc<dyn Fn() + Send + Sync>,

    /// Every dependency set this effect is currently a member of, recorded
    /// as (store, field) keys. May contain duplicates when a field is read
    /// more than once in a single run; cleanup is idempotent.
    pub(crate) owned_deps: SmallVec<[DepKey; 4]>,

    /// Set while the effect's callback is executing. A trigger that reaches
    /// an already running effect skips it, which is what bounds
    /// self-triggering writes.
    pub(crate) running: bool,

    /// Number of completed runs.
    pub(crate) run_count: usize,
}

impl EffectState {
    pub(crate) fn new(callback: Arc<dyn Fn() + Send + Sync>) -> Self {
        Self {
            callback,
            owned_deps: SmallVec::new(),
            running: false,
            run_count: 0,
        }
    }
}

/// Handle to a registered effect.
///
/// # Example
///
/// ```rust,ignore
/// let runtime = Runtime::new();
/// let store = ReactiveStore::new(&runtime, [("count", 0)]);
///
/// let store_reader = store.clone();
/// let effect = Effect::new(&runtime, move || {
///     println!("count is: {:?}", store_reader.get("count"));
/// });
///
/// store.set("count", 5); // Prints: "count is: Some(5)"
/// effect.dispose();
/// store.set("count", 6); // Prints nothing
/// ```
#[derive(Clone)]
pub struct Effect {
    id: EffectId,
    runtime: Runtime,
}

impl Effect {
    /// Register an effect and run it immediately.
    ///
    /// The initial run establishes the effect's first set of dependencies.
    pub fn new<F>(runtime: &Runtime, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let effect = Self::new_lazy(runtime, f);
        effect.run();
        effect
    }

    /// Register an effect without running it.
    ///
    /// The effect has no dependencies until its first `run`, so no write
    /// will trigger it before then.
    pub fn new_lazy<F>(runtime: &Runtime, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = runtime.register(Arc::new(f));
        Self {
            id,
            runtime: runtime.clone(),
        }
    }

    /// Get the effect's unique ID.
    pub fn id(&self) -> EffectId {
        self.id
    }

    /// Run the effect now.
    ///
    /// Performs the same cleanup-then-track cycle as a triggered re-run.
    /// No-op if the effect is disposed or already running.
    pub fn run(&self) {
        self.runtime.run_effect(self.id);
    }

    /// Dispose of the effect.
    ///
    /// Removes the effect from every dependency set without invoking its
    /// callback, and drops the callback together with anything it captured.
    /// After disposal the effect never runs again.
    pub fn dispose(&self) {
        self.runtime.dispose_effect(self.id);
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.runtime.effect_is_disposed(self.id)
    }

    /// Get the number of completed runs.
    pub fn run_count(&self) -> usize {
        self.runtime.effect_run_count(self.id)
    }

    /// Get the number of distinct (store, field) pairs the effect is
    /// currently subscribed to.
    pub fn dependency_count(&self) -> usize {
        self.runtime.effect_dependency_count(self.id)
    }
}

impl Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
