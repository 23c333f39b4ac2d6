//! The reactive store: one data tree, one revision counter.
//!
//! The tree is held behind an `Arc` and copied on write, so snapshots handed to
//! readers never observe a half-applied update. Every effective mutation bumps the
//! revision and publishes it on a `watch` channel.

use crate::apply::{apply_update_shared, get_at_path};
use crate::{DataPath, StateError, StateResult, StoreConfig, UpdateMode};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tilde_template::{OwnedScope, Scope};
use tokio::sync::watch;

/// What an update did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The local tree changed and the revision was bumped.
    Applied,
    /// Nothing changed.
    Unchanged,
    /// The write was sent to an ancestor store.
    Forwarded,
}

impl UpdateOutcome {
    /// Whether anything may have changed.
    #[inline]
    pub fn is_changed(&self) -> bool {
        !matches!(self, UpdateOutcome::Unchanged)
    }
}

/// A consistent view of a store.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreState {
    pub revision: u64,
    pub tree: Arc<Value>,
}

/// A path-addressed JSON store with revision tracking.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tilde_state::{ReactiveStore, UpdateMode, UpdateOutcome};
///
/// let mut store = ReactiveStore::new(json!({}));
///
/// let outcome = store.update("user.name", Some(json!("Ada")), UpdateMode::Replace);
/// assert_eq!(outcome, UpdateOutcome::Applied);
/// assert_eq!(store.tree(), &json!({"user": {"name": "Ada"}}));
/// assert_eq!(store.revision(), 1);
///
/// // Same value again: nothing to do.
/// let outcome = store.update("user.name", Some(json!("Ada")), UpdateMode::Replace);
/// assert_eq!(outcome, UpdateOutcome::Unchanged);
/// assert_eq!(store.revision(), 1);
/// ```
#[derive(Debug)]
pub struct ReactiveStore {
    tree: Arc<Value>,
    revision: u64,
    config: StoreConfig,
    notifier: watch::Sender<u64>,
}

impl ReactiveStore {
    /// Create a store with the default configuration.
    pub fn new(tree: Value) -> Self {
        Self::with_config(tree, StoreConfig::default())
    }

    pub fn with_config(tree: Value, config: StoreConfig) -> Self {
        let (notifier, _) = watch::channel(0);
        Self {
            tree: Arc::new(tree),
            revision: 0,
            config,
            notifier,
        }
    }

    #[inline]
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// A cheap shared snapshot of the current tree.
    #[inline]
    pub fn snapshot(&self) -> Arc<Value> {
        Arc::clone(&self.tree)
    }

    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn state(&self) -> StoreState {
        StoreState {
            revision: self.revision,
            tree: self.snapshot(),
        }
    }

    #[inline]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The root scope of this store.
    #[inline]
    pub fn scope(&self) -> Scope<'_> {
        Scope::new(&self.tree, &self.config.root_segment)
    }

    pub fn owned_scope(&self) -> OwnedScope {
        OwnedScope::new(self.snapshot(), self.config.root_segment.clone())
    }

    /// Read the value at a root-relative path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        get_at_path(&self.tree, &DataPath::parse(path))
    }

    /// Receive every revision published by this store.
    ///
    /// Effective updates publish the new revision; [`ReactiveStore::replace`] publishes 0.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notifier.subscribe()
    }

    /// Apply an update at a root-relative dot path.
    pub fn update(&mut self, path: &str, value: Option<Value>, mode: UpdateMode) -> UpdateOutcome {
        self.update_path(&DataPath::parse(path), value, mode)
    }

    pub fn update_path(
        &mut self,
        path: &DataPath,
        value: Option<Value>,
        mode: UpdateMode,
    ) -> UpdateOutcome {
        if !apply_update_shared(&mut self.tree, path, value, mode) {
            tracing::debug!(%path, %mode, "update left the store unchanged");
            return UpdateOutcome::Unchanged;
        }

        self.bump();
        UpdateOutcome::Applied
    }

    /// Shorthand for a replace-mode update.
    pub fn set(&mut self, path: &str, value: Value) -> UpdateOutcome {
        self.update(path, Some(value), UpdateMode::Replace)
    }

    /// Apply an update at an absolute path starting with the root segment.
    ///
    /// The bare root segment addresses the whole tree: a replace-mode write with a value
    /// calls [`ReactiveStore::replace`], anything else is unchanged.
    pub fn update_absolute(
        &mut self,
        path: &str,
        value: Option<Value>,
        mode: UpdateMode,
    ) -> StateResult<UpdateOutcome> {
        match relative_to_root(path, &self.config.root_segment)? {
            Some(relative) => Ok(self.update(relative, value, mode)),
            None => match (mode, value) {
                (UpdateMode::Replace, Some(tree)) => {
                    self.replace(tree);
                    Ok(UpdateOutcome::Applied)
                }
                _ => Ok(UpdateOutcome::Unchanged),
            },
        }
    }

    /// Replace the whole tree and reset the revision to 0.
    pub fn replace(&mut self, tree: Value) {
        self.tree = Arc::new(tree);
        self.revision = 0;
        self.notifier.send_replace(0);
    }

    fn bump(&mut self) {
        self.revision = self.config.next_revision(self.revision);
        tracing::trace!(revision = self.revision, "store revision bumped");
        self.notifier.send_replace(self.revision);
    }
}

impl Default for ReactiveStore {
    fn default() -> Self {
        Self::new(Value::Object(Default::default()))
    }
}

/// Strip the root segment from an absolute path.
///
/// Returns `None` for the bare root.
pub(crate) fn relative_to_root<'p>(path: &'p str, root: &str) -> StateResult<Option<&'p str>> {
    if path == root {
        return Ok(None);
    }
    path.strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('.'))
        .map(Some)
        .ok_or_else(|| StateError::outside_root(path, root))
}

/// The write seam shared by root stores, shared handles and nested stores.
pub trait DataTarget: Send + Sync {
    /// Apply an update at an absolute path.
    fn update_absolute(
        &self,
        path: &str,
        value: Option<Value>,
        mode: UpdateMode,
    ) -> StateResult<UpdateOutcome>;

    /// Replace the whole tree.
    fn replace_root(&self, tree: Value) -> StateResult<UpdateOutcome>;

    /// The scope children of this target evaluate `~~` references against.
    fn global_scope(&self) -> StateResult<OwnedScope>;
}

impl<T: DataTarget + ?Sized> DataTarget for Arc<T> {
    fn update_absolute(
        &self,
        path: &str,
        value: Option<Value>,
        mode: UpdateMode,
    ) -> StateResult<UpdateOutcome> {
        (**self).update_absolute(path, value, mode)
    }

    fn replace_root(&self, tree: Value) -> StateResult<UpdateOutcome> {
        (**self).replace_root(tree)
    }

    fn global_scope(&self) -> StateResult<OwnedScope> {
        (**self).global_scope()
    }
}

/// A cloneable, shareable handle to a [`ReactiveStore`].
#[derive(Clone, Debug)]
pub struct StoreHandle(Arc<Mutex<ReactiveStore>>);

impl StoreHandle {
    pub fn new(store: ReactiveStore) -> Self {
        Self(Arc::new(Mutex::new(store)))
    }

    pub fn from_value(tree: Value) -> Self {
        Self::new(ReactiveStore::new(tree))
    }

    fn lock(&self) -> StateResult<MutexGuard<'_, ReactiveStore>> {
        self.0
            .lock()
            .map_err(|_| StateError::store_unavailable("store mutex poisoned"))
    }

    /// Run `f` with shared access to the store.
    pub fn read<R>(&self, f: impl FnOnce(&ReactiveStore) -> R) -> StateResult<R> {
        Ok(f(&*self.lock()?))
    }

    pub fn update(
        &self,
        path: &str,
        value: Option<Value>,
        mode: UpdateMode,
    ) -> StateResult<UpdateOutcome> {
        Ok(self.lock()?.update(path, value, mode))
    }

    pub fn update_path(
        &self,
        path: &DataPath,
        value: Option<Value>,
        mode: UpdateMode,
    ) -> StateResult<UpdateOutcome> {
        Ok(self.lock()?.update_path(path, value, mode))
    }

    pub fn replace(&self, tree: Value) -> StateResult<()> {
        self.lock()?.replace(tree);
        Ok(())
    }

    pub fn snapshot(&self) -> StateResult<Arc<Value>> {
        self.read(ReactiveStore::snapshot)
    }

    pub fn revision(&self) -> StateResult<u64> {
        self.read(ReactiveStore::revision)
    }

    pub fn state(&self) -> StateResult<StoreState> {
        self.read(ReactiveStore::state)
    }

    pub fn subscribe(&self) -> StateResult<watch::Receiver<u64>> {
        self.read(ReactiveStore::subscribe)
    }
}

impl DataTarget for StoreHandle {
    fn update_absolute(
        &self,
        path: &str,
        value: Option<Value>,
        mode: UpdateMode,
    ) -> StateResult<UpdateOutcome> {
        self.lock()?.update_absolute(path, value, mode)
    }

    fn replace_root(&self, tree: Value) -> StateResult<UpdateOutcome> {
        self.replace(tree)?;
        Ok(UpdateOutcome::Applied)
    }

    fn global_scope(&self) -> StateResult<OwnedScope> {
        self.read(ReactiveStore::owned_scope)
    }
}
