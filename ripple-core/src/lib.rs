//! Ripple Core
//!
//! This crate provides the core runtime for the Ripple fine-grained
//! reactivity engine. It implements:
//!
//! - Reactive stores: plain key-value records with intercepted reads/writes
//! - Effects: callbacks that re-run when state they read changes
//! - The dependency-tracking runtime connecting the two
//!
//! The engine is fully synchronous: every effect re-run triggered by a
//! write completes before the write returns.
//!
//! # Architecture
//!
//! The crate is organized around one module:
//!
//! - `reactive`: stores, effects, and the dependency-tracking runtime
//!
//! # Example
//!
//! ```rust,ignore
//! use ripple_core::reactive::{Effect, ReactiveStore, Runtime};
//!
//! // Create a runtime and a reactive record
//! let runtime = Runtime::new();
//! let store = ReactiveStore::new(&runtime, [("count", 0)]);
//!
//! // Create an effect; it runs once immediately
//! let reader = store.clone();
//! Effect::new(&runtime, move || {
//!     println!("Count: {:?}", reader.get("count"));
//! });
//!
//! // Update the store
//! store.set("count", 5);
//! // Effect automatically re-runs, prints: "Count: Some(5)"
//! ```

pub mod reactive;
