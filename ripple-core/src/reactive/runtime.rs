//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects stores and effects.
//! It owns the dependency registry, the effect table, and the active-effect
//! stack, and implements the track/trigger cycle.
//!
//! # How It Works
//!
//! 1. An effect registers with the runtime and runs once.
//!
//! 2. Every reactive field it reads during that run calls `track`, which
//!    subscribes the effect to the (store, field) pair and records the pair
//!    in the effect's owned-dependency list.
//!
//! 3. A later write to one of those fields calls `trigger`, which snapshots
//!    the pair's dependency set and re-runs each member synchronously,
//!    depth-first, before the write returns.
//!
//! 4. Before each re-run the effect is removed from every set in its
//!    owned-dependency list, so the run subscribes to exactly the fields it
//!    actually touches. Fields behind branches not taken this run stop
//!    re-triggering the effect.
//!
//! # Ownership
//!
//! There is no process-wide state: each `Runtime` is an independent
//! subscription graph created by the application and passed by reference
//! into store creation and effect registration. Handles are cheap clones of
//! one shared instance.
//!
//! # Thread Safety
//!
//! The registry, effect table, and stack are behind locks, but no lock is
//! ever held while a user callback executes, so callbacks are free to read
//! and write stores on the same runtime. Correctness of attribution rests
//! on the synchronous depth-first run discipline, not on the locks.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::context::ActiveEffectStack;
use super::effect::{EffectId, EffectState};
use super::registry::Registry;
use super::store::StoreId;

/// The shared state behind a runtime handle.
struct RuntimeInner {
    /// The subscription graph: (store, field) -> dependency set.
    registry: RwLock<Registry>,

    /// All live effects. Disposal removes the entry, releasing the callback
    /// and everything it captured.
    effects: RwLock<HashMap<EffectId, EffectState>>,

    /// The stack of currently running effects.
    active: ActiveEffectStack,
}

/// An independent reactive dependency-tracking runtime.
///
/// Stores created against a runtime report their reads and writes to it;
/// effects registered with it are re-run when fields they read change.
///
/// # Example
///
/// ```rust,ignore
/// let runtime = Runtime::new();
/// let store = ReactiveStore::new(&runtime, [("greeting", "hello")]);
///
/// let reader = store.clone();
/// Effect::new(&runtime, move || {
///     println!("{:?}", reader.get("greeting"));
/// });
///
/// store.set("greeting", "goodbye"); // re-runs the effect
/// ```
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Runtime {
    /// Create a new, empty runtime.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                registry: RwLock::new(Registry::default()),
                effects: RwLock::new(HashMap::new()),
                active: ActiveEffectStack::default(),
            }),
        }
    }

    /// Record that the currently active effect read a (store, field) pair.
    ///
    /// No-op when no effect is running: reads performed outside any effect
    /// record no subscription, and a later write to the field triggers
    /// nothing on their behalf.
    pub fn track(&self, store: StoreId, field: &str) {
        let Some(effect_id) = self.inner.active.current() else {
            return;
        };

        {
            let mut effects = self.inner.effects.write();
            match effects.get_mut(&effect_id) {
                Some(state) => state.owned_deps.push((store, field.to_owned())),
                // Disposed mid-run; record nothing on its behalf.
                None => return,
            }
        }

        self.inner.registry.write().subscribe(store, field, effect_id);
        trace!(?store, field, effect = ?effect_id, "tracked read");
    }

    /// Re-run every effect subscribed to a (store, field) pair.
    ///
    /// The set's members are snapshotted into a fresh list before any effect
    /// runs: each re-run mutates the live set (cleanup removes the effect,
    /// re-tracking re-adds it), and iterating the live set directly would
    /// risk unbounded loops or skipped invocations. An absent set means no
    /// effect has read the field, and the trigger is a no-op.
    pub fn trigger(&self, store: StoreId, field: &str) {
        let snapshot = self.inner.registry.read().snapshot(store, field);
        if snapshot.is_empty() {
            return;
        }

        trace!(?store, field, effects = snapshot.len(), "triggering");
        for effect_id in snapshot {
            self.run_effect(effect_id);
        }
    }

    /// Register a new effect, without running it.
    pub(crate) fn register(&self, callback: Arc<dyn Fn() + Send + Sync>) -> EffectId {
        let id = EffectId::new();
        self.inner.effects.write().insert(id, EffectState::new(callback));
        debug!(effect = ?id, "effect registered");
        id
    }

    /// Run an effect through the full cleanup-then-track cycle.
    ///
    /// Skips effects that are already running or no longer registered; the
    /// former is what keeps an effect that writes its own dependency from
    /// re-entering itself without limit.
    pub(crate) fn run_effect(&self, id: EffectId) {
        // Claim the run and take the stale subscriptions in one step.
        let (callback, stale) = {
            let mut effects = self.inner.effects.write();
            let Some(state) = effects.get_mut(&id) else {
                return;
            };
            if state.running {
                trace!(effect = ?id, "run skipped");
                return;
            }
            state.running = true;
            (Arc::clone(&state.callback), std::mem::take(&mut state.owned_deps))
        };

        // Cleanup: leave every dependency set joined on previous runs, so
        // this run subscribes to exactly the fields it touches.
        if !stale.is_empty() {
            self.inner.registry.write().unsubscribe(id, &stale);
        }

        trace!(effect = ?id, "running");

        // The guard pops the stack and clears the running flag even if the
        // callback panics, keeping the runtime usable afterwards.
        self.inner.active.push(id);
        let guard = RunGuard { inner: &*self.inner, id };
        (callback)();
        drop(guard);

        let mut effects = self.inner.effects.write();
        if let Some(state) = effects.get_mut(&id) {
            state.run_count += 1;
        }
    }

    /// Dispose an effect: cleanup without invoking the callback, then drop
    /// its registration entirely.
    ///
    /// Removing the table entry is what releases the callback and the state
    /// it captured; triggers and manual runs treat the missing id as inert.
    pub(crate) fn dispose_effect(&self, id: EffectId) {
        let Some(state) = self.inner.effects.write().remove(&id) else {
            return;
        };

        if !state.owned_deps.is_empty() {
            self.inner.registry.write().unsubscribe(id, &state.owned_deps);
        }
        debug!(effect = ?id, "effect disposed");
    }

    /// Get the effect currently running, if any.
    pub fn active_effect(&self) -> Option<EffectId> {
        self.inner.active.current()
    }

    /// Check whether a read at this moment would record a dependency.
    pub fn is_tracking(&self) -> bool {
        self.inner.active.is_active()
    }

    /// Get the number of effects subscribed to a (store, field) pair.
    pub fn subscriber_count(&self, store: StoreId, field: &str) -> usize {
        self.inner.registry.read().subscriber_count(store, field)
    }

    pub(crate) fn effect_is_disposed(&self, id: EffectId) -> bool {
        !self.inner.effects.read().contains_key(&id)
    }

    pub(crate) fn effect_run_count(&self, id: EffectId) -> usize {
        self.inner
            .effects
            .read()
            .get(&id)
            .map_or(0, |state| state.run_count)
    }

    pub(crate) fn effect_dependency_count(&self, id: EffectId) -> usize {
        self.inner
            .effects
            .read()
            .get(&id)
            .map_or(0, |state| {
                state.owned_deps.iter().collect::<HashSet<_>>().len()
            })
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("effect_count", &self.inner.effects.read().len())
            .field("active_effect", &self.active_effect())
            .finish()
    }
}

/// Restores the active-effect stack and the running flag when a run ends,
/// by normal return or by unwinding out of the callback.
struct RunGuard<'a> {
    inner: &'a RuntimeInner,
    id: EffectId,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let popped = self.inner.active.pop();
        debug_assert_eq!(
            popped,
            Some(self.id),
            "active-effect stack mismatch: expected {:?}, got {:?}",
            self.id,
            popped
        );

        let mut effects = self.inner.effects.write();
        if let Some(state) = effects.get_mut(&self.id) {
            state.running = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{Effect, ReactiveStore};
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn track_outside_any_effect_records_nothing() {
        let runtime = Runtime::new();
        let store = ReactiveStore::new(&runtime, [("a", 1)]);

        assert!(!runtime.is_tracking());
        let _ = store.get("a");

        assert_eq!(runtime.subscriber_count(store.id(), "a"), 0);
    }

    #[test]
    fn trigger_with_no_subscribers_is_a_noop() {
        let runtime = Runtime::new();
        let store = ReactiveStore::new(&runtime, [("a", 1)]);

        // Nothing has read "a"; the write must return quietly.
        store.set("a", 2);
        assert_eq!(store.get_untracked("a"), Some(2));
    }

    #[test]
    fn effect_subscribes_to_fields_it_reads() {
        let runtime = Runtime::new();
        let store = ReactiveStore::new(&runtime, [("a", 1), ("b", 2)]);

        let reader = store.clone();
        let _effect = Effect::new(&runtime, move || {
            let _ = reader.get("a");
        });

        assert_eq!(runtime.subscriber_count(store.id(), "a"), 1);
        assert_eq!(runtime.subscriber_count(store.id(), "b"), 0);
    }

    #[test]
    fn write_reruns_subscribed_effect() {
        let runtime = Runtime::new();
        let store = ReactiveStore::new(&runtime, [("a", 0)]);

        let observed = Arc::new(AtomicI32::new(-1));
        let observed_clone = observed.clone();
        let reader = store.clone();
        let _effect = Effect::new(&runtime, move || {
            if let Some(v) = reader.get("a") {
                observed_clone.store(v, Ordering::SeqCst);
            }
        });

        assert_eq!(observed.load(Ordering::SeqCst), 0);

        store.set("a", 42);
        assert_eq!(observed.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn active_effect_is_none_between_runs() {
        let runtime = Runtime::new();
        let store = ReactiveStore::new(&runtime, [("a", 0)]);

        let runtime_probe = runtime.clone();
        let seen_inside = Arc::new(AtomicI32::new(0));
        let seen_clone = seen_inside.clone();
        let reader = store.clone();
        let _effect = Effect::new(&runtime, move || {
            let _ = reader.get("a");
            if runtime_probe.is_tracking() {
                seen_clone.fetch_add(1, Ordering::SeqCst);
            }
        });

        assert_eq!(seen_inside.load(Ordering::SeqCst), 1);
        assert!(!runtime.is_tracking());
        assert!(runtime.active_effect().is_none());
    }

    #[test]
    fn disposed_effect_is_unsubscribed() {
        let runtime = Runtime::new();
        let store = ReactiveStore::new(&runtime, [("a", 0)]);

        let reader = store.clone();
        let effect = Effect::new(&runtime, move || {
            let _ = reader.get("a");
        });

        assert_eq!(runtime.subscriber_count(store.id(), "a"), 1);

        effect.dispose();
        assert_eq!(runtime.subscriber_count(store.id(), "a"), 0);
        assert_eq!(effect.dependency_count(), 0);
    }

    #[test]
    fn runtimes_are_independent() {
        let runtime_a = Runtime::new();
        let runtime_b = Runtime::new();

        let store = ReactiveStore::new(&runtime_a, [("a", 0)]);

        let count = Arc::new(AtomicI32::new(0));
        let count_clone = count.clone();
        let reader = store.clone();
        let _effect = Effect::new(&runtime_a, move || {
            let _ = reader.get("a");
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        // The other runtime knows nothing about this store.
        assert_eq!(runtime_b.subscriber_count(store.id(), "a"), 0);

        store.set("a", 1);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
