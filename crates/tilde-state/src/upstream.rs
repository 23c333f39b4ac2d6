//! Forwarding writes from a nested store to the store its data was projected from.
//!
//! A nested store is built from an override structure that may embed references into
//! its parent, e.g. `{"customer": "~~.order.customer"}`. Writes that land on such a
//! location are sent to the parent instead of the local copy, and the referenced
//! locations of the local copy are re-read afterwards.

use crate::apply::get_at_path;
use crate::store::relative_to_root;
use crate::{
    DataPath, DataTarget, ReactiveStore, StateResult, StoreConfig, StoreHandle, UpdateMode,
    UpdateOutcome,
};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tilde_template::{evaluate_collection, is_reference, is_truthy, resolve, OwnedScope, Scope};

/// Locations inside an override structure that hold references, in discovery order.
///
/// Keys are paths relative to the override root; the root path is the override itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpstreamReferenceMap {
    entries: Vec<(DataPath, String)>,
}

impl UpstreamReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: DataPath, reference: impl Into<String>) {
        self.entries.push((path, reference.into()));
    }

    /// The reference stored at a dot path, `""` being the override root.
    pub fn get(&self, path: &str) -> Option<&str> {
        let path = override_path(path);
        self.entries
            .iter()
            .find(|(p, _)| *p == path)
            .map(|(_, r)| r.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DataPath, &str)> {
        self.entries.iter().map(|(p, r)| (p, r.as_str()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first entry covering `path`, with the part of `path` below it.
    ///
    /// An entry covers a path when its key is a segment-wise prefix of it. The root
    /// entry covers every path.
    pub fn match_path(&self, path: &str) -> Option<(DataPath, &str)> {
        let path = override_path(path);
        self.entries.iter().find_map(|(key, reference)| {
            let suffix = path.strip_prefix(key)?;
            Some((suffix, reference.as_str()))
        })
    }
}

/// Parse a path relative to the override root, mapping `""` to the root itself.
fn override_path(path: &str) -> DataPath {
    if path.is_empty() {
        DataPath::root()
    } else {
        DataPath::parse(path)
    }
}

/// Find every reference inside an override structure.
///
/// Falsy overrides hold no references. Nodes nested deeper than `max_depth` are
/// skipped with a warning.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tilde_state::analyze_references;
///
/// let refs = analyze_references(&json!({"name": "~~.user.name", "tags": ["a", "~.tag"]}), 50);
/// let entries: Vec<_> = refs.iter().map(|(p, r)| (p.to_string(), r)).collect();
/// assert_eq!(
///     entries,
///     vec![("name".to_owned(), "~~.user.name"), ("tags.1".to_owned(), "~.tag")]
/// );
///
/// let whole = analyze_references(&json!("~~.user"), 50);
/// assert_eq!(whole.get(""), Some("~~.user"));
/// ```
pub fn analyze_references(data_override: &Value, max_depth: usize) -> UpstreamReferenceMap {
    let mut references = UpstreamReferenceMap::new();
    if is_truthy(data_override) {
        scan(data_override, DataPath::root(), max_depth, &mut references);
    }
    references
}

fn scan(node: &Value, path: DataPath, max_depth: usize, out: &mut UpstreamReferenceMap) {
    let depth = path.segments().len();
    if depth > max_depth {
        tracing::warn!(%path, max_depth, "reference analysis reached maximum depth, stopping");
        return;
    }

    match node {
        Value::String(s) if is_reference(s) => out.insert(path, s.as_str()),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                scan(item, child_path(&path, index.to_string()), max_depth, out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                scan(item, child_path(&path, key.as_str()), max_depth, out);
            }
        }
        _ => {}
    }
}

fn child_path(path: &DataPath, seg: impl Into<String>) -> DataPath {
    let mut child = path.clone();
    child.push(seg);
    child
}

/// Redirects matching writes to a parent [`DataTarget`].
pub struct UpstreamBridge {
    references: UpstreamReferenceMap,
    parent: Arc<dyn DataTarget>,
    anchor_path: String,
}

impl UpstreamBridge {
    /// `anchor_path` is the absolute path, in the parent, the nested store is mounted at.
    pub fn new(
        references: UpstreamReferenceMap,
        parent: Arc<dyn DataTarget>,
        anchor_path: impl Into<String>,
    ) -> Self {
        Self {
            references,
            parent,
            anchor_path: anchor_path.into(),
        }
    }

    pub fn references(&self) -> &UpstreamReferenceMap {
        &self.references
    }

    pub fn anchor_path(&self) -> &str {
        &self.anchor_path
    }

    /// Send a write to the parent if `path` is covered by a reference.
    ///
    /// Returns `true` when the parent handled it. A failure while forwarding is logged
    /// and reported as `false` so the caller can fall back to a local write.
    pub fn try_upstream_update(
        &self,
        path: &str,
        value: Option<&Value>,
        mode: UpdateMode,
    ) -> bool {
        let Some((suffix, reference)) = self.references.match_path(path) else {
            return false;
        };

        match self.forward(&suffix, reference, value, mode) {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(
                    path,
                    reference,
                    error = %err,
                    "upstream update failed, applying locally"
                );
                false
            }
        }
    }

    fn forward(
        &self,
        suffix: &DataPath,
        reference: &str,
        value: Option<&Value>,
        mode: UpdateMode,
    ) -> StateResult<UpdateOutcome> {
        let global = self.parent.global_scope()?;
        let local = Scope::detached(&self.anchor_path);
        let target = resolve(
            reference,
            &self.anchor_path,
            &local,
            &Scope::detached(&global.path),
        )?;

        let absolute = if suffix.is_root() {
            target.into_owned()
        } else {
            format!("{target}.{suffix}")
        };
        self.parent.update_absolute(&absolute, value.cloned(), mode)
    }
}

impl fmt::Debug for UpstreamBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamBridge")
            .field("references", &self.references)
            .field("anchor_path", &self.anchor_path)
            .finish_non_exhaustive()
    }
}

/// A store whose data is projected from a parent, with writes bridged upstream.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use std::sync::Arc;
/// use tilde_state::{NestedStore, StoreConfig, StoreHandle, UpdateMode, UpdateOutcome};
///
/// let parent = StoreHandle::from_value(json!({"user": {"name": "Ada"}}));
/// let nested = NestedStore::from_override(
///     json!({"name": "~~.user.name", "draft": ""}),
///     Arc::new(parent.clone()),
///     "data",
///     StoreConfig::default(),
/// )
/// .unwrap();
///
/// // Covered by a reference: written to the parent.
/// let outcome = nested.update("name", Some(json!("Grace")), UpdateMode::Replace).unwrap();
/// assert_eq!(outcome, UpdateOutcome::Forwarded);
/// assert_eq!(*parent.snapshot().unwrap(), json!({"user": {"name": "Grace"}}));
///
/// // Not covered: written locally.
/// let outcome = nested.update("draft", Some(json!("x")), UpdateMode::Replace).unwrap();
/// assert_eq!(outcome, UpdateOutcome::Applied);
/// ```
#[derive(Debug)]
pub struct NestedStore {
    local: StoreHandle,
    bridge: UpstreamBridge,
    data_override: Value,
}

impl NestedStore {
    /// Project `data_override` from `parent` and install the bridge.
    ///
    /// The override is evaluated one level deep, with the local scope at `anchor_path`
    /// in the parent and the global scope at the parent root.
    pub fn from_override(
        data_override: Value,
        parent: Arc<dyn DataTarget>,
        anchor_path: impl Into<String>,
        config: StoreConfig,
    ) -> StateResult<Self> {
        let anchor_path = anchor_path.into();
        let references = analyze_references(&data_override, config.reference_scan_depth);
        let bridge = UpstreamBridge::new(references, parent, anchor_path);
        let projected = project(&data_override, &bridge)?;

        Ok(Self {
            local: StoreHandle::new(ReactiveStore::with_config(projected, config)),
            bridge,
            data_override,
        })
    }

    /// The local store.
    #[inline]
    pub fn handle(&self) -> &StoreHandle {
        &self.local
    }

    #[inline]
    pub fn bridge(&self) -> &UpstreamBridge {
        &self.bridge
    }

    /// Apply an update at a path relative to the local root.
    ///
    /// Covered paths go to the parent, followed by a [`NestedStore::resync`].
    pub fn update(
        &self,
        path: &str,
        value: Option<Value>,
        mode: UpdateMode,
    ) -> StateResult<UpdateOutcome> {
        if self.bridge.try_upstream_update(path, value.as_ref(), mode) {
            self.resync()?;
            return Ok(UpdateOutcome::Forwarded);
        }
        self.local.update(path, value, mode)
    }

    /// Replace the local tree, or the parent location when the whole override is a reference.
    pub fn replace(&self, tree: Value) -> StateResult<UpdateOutcome> {
        if self
            .bridge
            .try_upstream_update("", Some(&tree), UpdateMode::Replace)
        {
            self.resync()?;
            return Ok(UpdateOutcome::Forwarded);
        }
        self.local.replace(tree)?;
        Ok(UpdateOutcome::Applied)
    }

    /// Re-read every referenced location from the parent.
    ///
    /// Only locations holding a reference are rewritten, so local-only writes survive.
    /// When the whole override is a reference the local tree is replaced. Returns
    /// whether the local tree changed.
    pub fn resync(&self) -> StateResult<bool> {
        let projected = project(&self.data_override, &self.bridge)?;
        let mut changed = false;

        for (path, _) in self.bridge.references().iter() {
            if path.is_root() {
                if self.local.read(|store| store.tree() == &projected)? {
                    continue;
                }
                self.local.replace(projected.clone())?;
                changed = true;
                continue;
            }

            let value = get_at_path(&projected, path).cloned();
            let outcome = self.local.update_path(path, value, UpdateMode::Replace)?;
            changed |= outcome == UpdateOutcome::Applied;
        }
        Ok(changed)
    }
}

impl DataTarget for NestedStore {
    fn update_absolute(
        &self,
        path: &str,
        value: Option<Value>,
        mode: UpdateMode,
    ) -> StateResult<UpdateOutcome> {
        let root = self.local.read(|store| store.config().root_segment.clone())?;
        match relative_to_root(path, &root)? {
            Some(relative) => self.update(relative, value, mode),
            None => match (mode, value) {
                (UpdateMode::Replace, Some(tree)) => self.replace(tree),
                _ => Ok(UpdateOutcome::Unchanged),
            },
        }
    }

    fn replace_root(&self, tree: Value) -> StateResult<UpdateOutcome> {
        self.replace(tree)
    }

    fn global_scope(&self) -> StateResult<OwnedScope> {
        self.local.global_scope()
    }
}

fn project(data_override: &Value, bridge: &UpstreamBridge) -> StateResult<Value> {
    let global = bridge.parent.global_scope()?;
    let anchor = bridge.anchor_path();

    let local_tree = match relative_to_root(anchor, &global.path) {
        Ok(Some(relative)) => get_at_path(&global.tree, &DataPath::parse(relative))
            .cloned()
            .unwrap_or(Value::Null),
        Ok(None) => Value::clone(&global.tree),
        Err(_) => Value::Null,
    };

    let local = Scope::new(&local_tree, anchor);
    let evaluated = evaluate_collection(data_override, &local, &global.as_scope(), 1)?;
    Ok(evaluated.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_match_path_rules() {
        let mut refs = UpstreamReferenceMap::new();
        refs.insert(DataPath::parse("user"), "~~.u");
        refs.insert(DataPath::parse("user.name"), "~~.n");

        assert_eq!(refs.match_path("user"), Some((DataPath::root(), "~~.u")));
        assert_eq!(
            refs.match_path("user.name"),
            Some((DataPath::parse("name"), "~~.u"))
        );
        assert_eq!(refs.match_path("username"), None);
        assert_eq!(refs.match_path("other"), None);
    }

    #[test]
    fn test_match_root_entry_covers_everything() {
        let mut refs = UpstreamReferenceMap::new();
        refs.insert(DataPath::root(), "~~.all");
        assert_eq!(
            refs.match_path("a.b"),
            Some((DataPath::parse("a.b"), "~~.all"))
        );
        assert_eq!(refs.match_path(""), Some((DataPath::root(), "~~.all")));
        assert_eq!(refs.get(""), Some("~~.all"));
    }

    #[test]
    fn test_analyze_falsy_and_literals() {
        for falsy in [json!(null), json!(false), json!(0), json!("")] {
            assert!(analyze_references(&falsy, 50).is_empty());
        }
        assert!(analyze_references(&json!({"a": "plain", "b": [1, 2]}), 50).is_empty());
    }

    #[test]
    fn test_analyze_keeps_repeated_references() {
        let refs = analyze_references(&json!({"a": "~~.x", "b": "~~.x"}), 50);
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn test_analyze_depth_limit() {
        let deep = json!({"a": {"b": {"c": "~~.deep"}}, "top": "~~.top"});
        let refs = analyze_references(&deep, 2);
        assert_eq!(refs.get("top"), Some("~~.top"));
        assert_eq!(refs.get("a.b.c"), None);

        let refs = analyze_references(&deep, 3);
        assert_eq!(refs.get("a.b.c"), Some("~~.deep"));
    }
}
