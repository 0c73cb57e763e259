//! Dependency Registry
//!
//! The registry is the "bucket" at the heart of the reactive system: a
//! two-level mapping from store identity to field name to the set of effects
//! subscribed to that (store, field) pair.
//!
//! # Structure
//!
//! ```text
//! StoreId -> field name -> { EffectId, EffectId, ... }
//! ```
//!
//! A dependency set exists for a pair only while at least one effect is
//! subscribed to it; sets emptied by cleanup are pruned, and an absent set
//! makes a trigger a no-op, which is indistinguishable from an empty one.
//!
//! # Ordering
//!
//! Dependency sets are insertion-ordered (`IndexSet`), so a trigger fans out
//! to effects in the order they subscribed since the set was last emptied.
//! Removal uses `shift_remove` to keep that order stable.
//!
//! The registry itself is a plain data structure; the runtime owns it behind
//! a lock and is responsible for never holding that lock while an effect
//! runs.

use std::collections::HashMap;

use indexmap::IndexSet;

use super::effect::EffectId;
use super::store::StoreId;

/// One (store, field) pair, as recorded in an effect's owned-dependency list.
pub(crate) type DepKey = (StoreId, String);

/// The subscription graph between (store, field) pairs and effects.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    bucket: HashMap<StoreId, HashMap<String, IndexSet<EffectId>>>,
}

impl Registry {
    /// Subscribe an effect to a (store, field) pair.
    ///
    /// Lazily creates the dependency set. Subscribing the same effect twice
    /// is a no-op (the set deduplicates).
    pub(crate) fn subscribe(&mut self, store: StoreId, field: &str, effect: EffectId) {
        self.bucket
            .entry(store)
            .or_default()
            .entry(field.to_owned())
            .or_default()
            .insert(effect);
    }

    /// Snapshot the current members of a dependency set.
    ///
    /// The snapshot is what a trigger iterates: effects re-running during the
    /// fan-out mutate the live set (cleanup removes them, re-tracking re-adds
    /// them), so iterating the live set directly would risk skipped,
    /// duplicated, or unbounded invocations.
    pub(crate) fn snapshot(&self, store: StoreId, field: &str) -> Vec<EffectId> {
        self.bucket
            .get(&store)
            .and_then(|fields| fields.get(field))
            .map(|deps| deps.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Remove an effect from every dependency set named in `keys`.
    ///
    /// `keys` may contain duplicates (an effect that read the same field
    /// twice in one run records the key twice); removal is idempotent.
    /// Emptied sets and store entries are pruned.
    pub(crate) fn unsubscribe(&mut self, effect: EffectId, keys: &[DepKey]) {
        for (store, field) in keys {
            let Some(fields) = self.bucket.get_mut(store) else {
                continue;
            };
            if let Some(deps) = fields.get_mut(field.as_str()) {
                deps.shift_remove(&effect);
                if deps.is_empty() {
                    fields.remove(field.as_str());
                }
            }
            if fields.is_empty() {
                self.bucket.remove(store);
            }
        }
    }

    /// Get the number of effects subscribed to a (store, field) pair.
    pub(crate) fn subscriber_count(&self, store: StoreId, field: &str) -> usize {
        self.bucket
            .get(&store)
            .and_then(|fields| fields.get(field))
            .map_or(0, |deps| deps.len())
    }
}
