//! Reactive Store
//!
//! A ReactiveStore wraps a plain mutable record (field name -> value) and
//! intercepts every read and write.
//!
//! # How Stores Work
//!
//! 1. When a field is read while an effect is running, the store asks the
//!    runtime to record the dependency (effect -> (store, field)).
//!
//! 2. When a field is written, the store first commits the new value and
//!    then asks the runtime to re-run every effect subscribed to that field.
//!    Committing before triggering means an effect that re-reads the field
//!    during its re-run observes the new value.
//!
//! 3. Reads of missing fields return `None` rather than an error.
//!
//! # Interception
//!
//! There is no transparent property interception here: reads and writes go
//! through an explicit accessor/mutator pair (`get` / `set`). Anything that
//! bypasses the store (e.g. a clone of the value) is invisible to the
//! dependency graph.
//!
//! # Thread Safety
//!
//! The record is protected by a RwLock and shared between clones of the
//! store. The lock is never held while effects run.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::trace;

use super::runtime::Runtime;

/// Unique identifier for a reactive store.
///
/// The dependency registry keys subscriptions by store identity, not by the
/// contents of the record, so two stores with identical fields track
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(u64);

impl StoreId {
    /// Generate a new unique store ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub(crate) fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A reactive key-value record.
///
/// # Type Parameters
///
/// - `V`: The type of value stored under each field. Must be Clone + Send + Sync.
///
/// # Example
///
/// ```rust,ignore
/// let runtime = Runtime::new();
/// let store = ReactiveStore::new(&runtime, [("count", 0)]);
///
/// // Read a field (tracked if an effect is running)
/// let value = store.get("count");
///
/// // Write a field (re-runs subscribed effects)
/// store.set("count", 5);
/// ```
pub struct ReactiveStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Unique identifier for this store.
    id: StoreId,

    /// The underlying record. Field order is preserved.
    fields: Arc<RwLock<IndexMap<String, V>>>,

    /// Handle to the runtime that owns the dependency graph.
    runtime: Runtime,
}

impl<V> ReactiveStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Wrap an initial record in a reactive store.
    ///
    /// Reads and writes on the returned store go through the given runtime's
    /// dependency tracking.
    pub fn new<K, I>(runtime: &Runtime, fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            id: StoreId::new(),
            fields: Arc::new(RwLock::new(
                fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            )),
            runtime: runtime.clone(),
        }
    }

    /// Get the store's unique ID.
    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Read a field.
    ///
    /// If an effect is currently running, it is subscribed to this
    /// (store, field) pair. Missing fields yield `None`, never an error.
    pub fn get(&self, field: &str) -> Option<V> {
        self.runtime.track(self.id, field);
        self.fields.read().get(field).cloned()
    }

    /// Read a field without recording a dependency.
    ///
    /// Use this when you need the value without subscribing the current
    /// effect to future changes.
    pub fn get_untracked(&self, field: &str) -> Option<V> {
        self.fields.read().get(field).cloned()
    }

    /// Write a field and re-run subscribed effects.
    ///
    /// The value is committed before any effect runs, so re-runs observe the
    /// new value. Because effects run synchronously inside this call, a
    /// write is potentially re-entrant into arbitrary effect bodies.
    pub fn set(&self, field: impl Into<String>, value: V) {
        let field = field.into();
        {
            self.fields.write().insert(field.clone(), value);
        }
        trace!(store = ?self.id, field = %field, "field written");
        self.runtime.trigger(self.id, &field);
    }

    /// Update a field using a function of its current value.
    ///
    /// The function receives `None` if the field is absent. Triggers once,
    /// like a plain `set`. The record lock is released before the function
    /// runs, so it is free to read and write this store.
    pub fn update<F>(&self, field: &str, f: F)
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let current = self.get_untracked(field);
        let new_value = f(current.as_ref());
        self.set(field, new_value);
    }

    /// Check whether a field is present. Does not record a dependency.
    pub fn contains_field(&self, field: &str) -> bool {
        self.fields.read().contains_key(field)
    }

    /// Get the number of fields in the record.
    pub fn field_count(&self) -> usize {
        self.fields.read().len()
    }

    /// Get the field names in insertion order.
    pub fn field_names(&self) -> Vec<String> {
        self.fields.read().keys().cloned().collect()
    }
}

impl<V> Clone for ReactiveStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            fields: Arc::clone(&self.fields),
            runtime: self.runtime.clone(),
        }
    }
}

impl<V> Debug for ReactiveStore<V>
where
    V: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveStore")
            .field("id", &self.id)
            .field("fields", &*self.fields.read())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Runtime;

    #[test]
    fn store_get_and_set() {
        let runtime = Runtime::new();
        let store = ReactiveStore::new(&runtime, [("count", 0)]);

        assert_eq!(store.get("count"), Some(0));

        store.set("count", 42);
        assert_eq!(store.get("count"), Some(42));
    }

    #[test]
    fn missing_field_reads_none() {
        let runtime = Runtime::new();
        let store = ReactiveStore::new(&runtime, [("a", 1)]);

        assert_eq!(store.get("missing"), None);
        assert_eq!(store.get_untracked("missing"), None);
    }

    #[test]
    fn set_inserts_new_fields() {
        let runtime = Runtime::new();
        let store = ReactiveStore::new(&runtime, Vec::<(String, i32)>::new());

        assert!(!store.contains_field("fresh"));
        store.set("fresh", 7);
        assert!(store.contains_field("fresh"));
        assert_eq!(store.get("fresh"), Some(7));
    }

    #[test]
    fn store_update() {
        let runtime = Runtime::new();
        let store = ReactiveStore::new(&runtime, [("n", 10)]);

        store.update("n", |v| v.copied().unwrap_or(0) + 5);
        assert_eq!(store.get("n"), Some(15));

        // Updating an absent field sees None
        store.update("other", |v| {
            assert!(v.is_none());
            1
        });
        assert_eq!(store.get("other"), Some(1));
    }

    #[test]
    fn update_closure_may_write_the_store() {
        let runtime = Runtime::new();
        let store = ReactiveStore::new(&runtime, [("n", 1), ("log", 0)]);

        let writer = store.clone();
        store.update("n", move |v| {
            let current = v.copied().unwrap_or(0);
            writer.set("log", current);
            current + 1
        });

        assert_eq!(store.get_untracked("n"), Some(2));
        assert_eq!(store.get_untracked("log"), Some(1));
    }

    #[test]
    fn store_clone_shares_state() {
        let runtime = Runtime::new();
        let store1 = ReactiveStore::new(&runtime, [("x", 0)]);
        let store2 = store1.clone();

        assert_eq!(store1.id(), store2.id());

        store1.set("x", 42);
        assert_eq!(store2.get("x"), Some(42));

        store2.set("x", 100);
        assert_eq!(store1.get("x"), Some(100));
    }

    #[test]
    fn store_ids_are_unique() {
        let runtime = Runtime::new();
        let s1 = ReactiveStore::new(&runtime, [("v", 0)]);
        let s2 = ReactiveStore::new(&runtime, [("v", 0)]);
        let s3 = ReactiveStore::new(&runtime, [("v", 0)]);

        assert_ne!(s1.id(), s2.id());
        assert_ne!(s2.id(), s3.id());
        assert_ne!(s1.id(), s3.id());
    }

    #[test]
    fn field_names_preserve_insertion_order() {
        let runtime = Runtime::new();
        let store = ReactiveStore::new(&runtime, [("b", 1), ("a", 2)]);
        store.set("c", 3);

        assert_eq!(store.field_count(), 3);
        assert_eq!(store.field_names(), vec!["b", "a", "c"]);
    }
}
