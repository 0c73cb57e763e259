//! Reactive Primitives
//!
//! This module implements the core reactive system: stores, effects, and the
//! dependency-tracking runtime that connects them.
//!
//! # Concepts
//!
//! ## Stores
//!
//! A ReactiveStore wraps a plain mutable record. When a field is read while
//! an effect is running, the store registers that effect as a dependent of
//! the field. When the field is written, all dependents re-run.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation that re-runs whenever a field
//! it previously read changes. Effects synchronize reactive state with
//! external systems, such as rendering output or logging.
//!
//! ## Runtime
//!
//! The Runtime owns the subscription graph and the record of which effect is
//! currently running. It is an explicit object created by the application;
//! there is no global state, and independent runtimes never interact.
//!
//! # Implementation Notes
//!
//! Dependencies are detected automatically: while an effect's callback
//! executes, it sits on the runtime's active-effect stack, and every field
//! read attributes a subscription to it. Before each re-run the effect's
//! previous subscriptions are cleared, so tracking follows the branches the
//! callback actually takes on every run.
//!
//! This approach (sometimes called "automatic dependency tracking" or
//! "transparent reactivity") is used by SolidJS, Vue 3, and Leptos.

mod context;
mod effect;
mod registry;
mod runtime;
mod store;

pub use effect::{Effect, EffectId};
pub use runtime::Runtime;
pub use store::{ReactiveStore, StoreId};
