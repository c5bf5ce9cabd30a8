//! Subtree scoping.
//!
//! Rewrites a batch addressed against the document root into the batch that
//! produces the same changes on a mirror holding only one subtree. Patches
//! under the subtree lose the subtree prefix; patches elsewhere are dropped.
//!
//! Patches that replace or remove an ancestor of the subtree (the root
//! included) are projected onto it: the scoped mirror becomes whatever the
//! ancestor's new value holds at the subtree's position, or null when it
//! holds nothing there. They are never passed through verbatim, since a
//! root replacement would otherwise overwrite the scoped mirror with the
//! whole document.

use crate::error::{MirrorError, MirrorResult};
use crate::resolve::get;
use crate::{Patch, Path, Prop};
use serde_json::Value;

/// Scope `patches` to `subtree`, preserving the order of kept patches.
///
/// Fails with [`MirrorError::ScopeShifted`] when a patch inserts into or
/// deletes from a list that contains the subtree at an earlier position,
/// or deletes the list element the subtree lives in, which moves the
/// subtree to another index.
pub fn scope_to_subtree(patches: &[Patch], subtree: &Path) -> MirrorResult<Vec<Patch>> {
    let prefix = subtree.props();
    if prefix.is_empty() {
        return Ok(patches.to_vec());
    }
    let mut scoped = Vec::with_capacity(patches.len());
    for patch in patches {
        if let Some(p) = scope_patch(patch, prefix)? {
            scoped.push(p);
        }
    }
    Ok(scoped)
}

/// Value of `subtree` inside a full mirror, null when absent.
pub fn pick(root: &Value, subtree: &Path) -> Value {
    get(root, subtree.props()).cloned().unwrap_or(Value::Null)
}

fn scope_patch(patch: &Patch, prefix: &[Prop]) -> MirrorResult<Option<Patch>> {
    let path = patch.path();
    match patch {
        Patch::Put { value, .. } => {
            if let Some(rest) = path.strip_prefix(prefix) {
                return Ok(Some(patch.with_path(rest)));
            }
            if prefix.starts_with(path.props()) {
                let projected = get(value, &prefix[path.len()..])
                    .cloned()
                    .unwrap_or(Value::Null);
                return Ok(Some(Patch::put(Path::root(), projected)));
            }
            Ok(None)
        }
        Patch::Del { .. } => {
            // Removing the list element that holds the subtree slides the next
            // sibling into its index, so the subtree does not become null.
            if let Some((list, Prop::Index(removed))) = path.split_last() {
                if shifts_subtree(prefix, list, *removed, true) {
                    return Err(MirrorError::ScopeShifted { path: path.clone() });
                }
            }
            if let Some(rest) = path.strip_prefix(prefix) {
                if rest.is_root() {
                    return Ok(Some(Patch::put(Path::root(), Value::Null)));
                }
                return Ok(Some(patch.with_path(rest)));
            }
            if prefix.starts_with(path.props()) {
                return Ok(Some(Patch::put(Path::root(), Value::Null)));
            }
            Ok(None)
        }
        Patch::Splice { .. } | Patch::Insert { .. } => {
            let Some((container, last)) = path.split_last() else {
                return Ok(None);
            };
            if container.starts_with(prefix) {
                return Ok(path.strip_prefix(prefix).map(|rest| patch.with_path(rest)));
            }
            if let (Patch::Insert { .. }, Prop::Index(pos)) = (patch, last) {
                if shifts_subtree(prefix, container, *pos, true) {
                    return Err(MirrorError::ScopeShifted { path: path.clone() });
                }
            }
            Ok(None)
        }
        _ => Ok(path.strip_prefix(prefix).map(|rest| patch.with_path(rest))),
    }
}

/// Whether changing the layout of `list` at `pos` moves the subtree.
///
/// The subtree is shifted when it lives inside `list` at index `j` and the
/// change happens before it (`pos < j`), or at it when `inclusive`
/// (`pos == j`): an insert there pushes it right, a delete there pulls the
/// next sibling into its place.
fn shifts_subtree(prefix: &[Prop], list: &[Prop], pos: usize, inclusive: bool) -> bool {
    if !prefix.starts_with(list) {
        return false;
    }
    match prefix.get(list.len()) {
        Some(Prop::Index(j)) => pos < *j || (inclusive && pos == *j),
        _ => false,
    }
}
