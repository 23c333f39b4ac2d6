//! Reference to absolute path resolution.

use crate::error::{TemplateError, TemplateResult};
use crate::reference::{AncestorSearch, Reference};
use crate::scope::Scope;
use std::borrow::Cow;

/// Resolve a reference into an absolute path.
///
/// Literals are returned unchanged. Ancestor searches (`~>key`, `~~>key`) look for `key` among
/// the dot-delimited segments of `current_path` and fail with
/// [`TemplateError::PathNotFound`] when it is absent.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tilde_template::{resolve, Scope};
///
/// let data = json!({});
/// let local = Scope::new(&data, "data.items.2");
/// let global = Scope::root(&data);
///
/// assert_eq!(resolve("~.name", "data.items.2", &local, &global).unwrap(), "data.items.2.name");
/// assert_eq!(resolve("~~.title", "data.items.2", &local, &global).unwrap(), "data.title");
/// assert_eq!(resolve("~>items", "data.items.2", &local, &global).unwrap(), "data.items");
/// assert_eq!(resolve("hello", "data.items.2", &local, &global).unwrap(), "hello");
/// ```
pub fn resolve<'r>(
    reference: &'r str,
    current_path: &str,
    local: &Scope<'_>,
    global: &Scope<'_>,
) -> TemplateResult<Cow<'r, str>> {
    match Reference::parse(reference) {
        Some(parsed) => resolve_parsed(parsed, current_path, local, global).map(Cow::Owned),
        None => Ok(Cow::Borrowed(reference)),
    }
}

pub(crate) fn resolve_parsed(
    parsed: Reference<'_>,
    current_path: &str,
    local: &Scope<'_>,
    global: &Scope<'_>,
) -> TemplateResult<String> {
    let resolved = match parsed {
        Reference::LocalRoot => local.path().to_owned(),
        Reference::GlobalRoot => global.path().to_owned(),
        Reference::Local(rest) => format!("{}.{}", local.path(), rest),
        Reference::Global(rest) => format!("{}.{}", global.path(), rest),
        Reference::Ancestor { search, key, rest } => {
            let anchor = ancestor_anchor(current_path, key, search)?;
            match rest {
                Some(rest) => format!("{anchor}.{rest}"),
                None => anchor.to_owned(),
            }
        }
    };

    Ok(resolved)
}

/// The prefix of `path` that ends with the matching `key` segment.
fn ancestor_anchor<'p>(
    path: &'p str,
    key: &str,
    search: AncestorSearch,
) -> TemplateResult<&'p str> {
    let mut found = None;
    let mut start = 0;

    for segment in path.split('.') {
        let end = start + segment.len();
        if segment == key {
            found = Some(end);
            if search == AncestorSearch::Outermost {
                break;
            }
        }
        start = end + 1;
    }

    found
        .map(|end| &path[..end])
        .ok_or_else(|| TemplateError::path_not_found(key, path))
}
