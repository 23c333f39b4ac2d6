//! Path-addressed reactive JSON store.
//!
//! `tilde-state` owns application data: one JSON tree per store, mutated only through
//! path-addressed updates, with a revision counter that moves exactly when the tree does.
//!
//! # Core Concepts
//!
//! - **ReactiveStore**: the tree, its revision and a `watch` channel publishing revisions
//! - **UpdateMode**: replace, add, remove or move at the target path
//! - **apply_update**: the pure form of an update; `None` means no-op
//! - **StoreHandle**: shared handle used by asynchronous writers and nested stores
//! - **NestedStore**: a store projected from a parent, with an **UpstreamBridge**
//!   sending writes on referenced locations back to the parent
//!
//! # Update Semantics
//!
//! ```text
//! replace  value -> set (deep-equal is a no-op), no value -> delete key
//! add      append to the list at the path, creating it when absent
//! remove   drop the list element at the path
//! move     shift the list element at the path by {"increment": n}, clamped
//! ```
//!
//! # Quick Start
//!
//! ```
//! use serde_json::json;
//! use tilde_state::{ReactiveStore, UpdateMode};
//!
//! let mut store = ReactiveStore::new(json!({}));
//! let mut revisions = store.subscribe();
//!
//! store.update("todo", Some(json!("write docs")), UpdateMode::Add);
//! store.update("todo", Some(json!("ship")), UpdateMode::Add);
//! store.update("todo.0", Some(json!({"increment": 1})), UpdateMode::Move);
//!
//! assert_eq!(store.tree(), &json!({"todo": ["ship", "write docs"]}));
//! assert_eq!(*revisions.borrow_and_update(), 3);
//! ```

mod apply;
mod config;
mod error;
mod mode;
mod path;
mod store;
mod upstream;

pub use apply::{apply_update, get_at_path};
pub use config::{StoreConfig, MAX_SAFE_INTEGER, MIN_REVISION_WRAP};
pub use error::{value_type_name, StateError, StateResult};
pub use mode::UpdateMode;
pub use path::DataPath;
pub use store::{DataTarget, ReactiveStore, StoreHandle, StoreState, UpdateOutcome};
pub use upstream::{analyze_references, NestedStore, UpstreamBridge, UpstreamReferenceMap};
