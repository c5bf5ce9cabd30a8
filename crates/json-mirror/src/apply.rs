//! Patch application.
//!
//! Each applier mutates the mirror in place below the resolved container.
//! Copy-on-write above that point is the owner's business: [`MirrorStore`]
//! keeps the root behind an `Arc` and calls `Arc::make_mut` before applying,
//! so snapshots handed out earlier never change.
//!
//! [`MirrorStore`]: crate::MirrorStore

use crate::error::{value_type_name, MirrorError, MirrorResult};
use crate::resolve::resolve_mut;
use crate::{Patch, Path, Prop};
use serde_json::Value;

/// Apply an ordered batch, left to right.
///
/// Later patches are addressed against the state left by earlier ones. On
/// failure the patches before the failing one stay applied; the error names
/// the failing position.
pub fn apply_patches(root: &mut Value, patches: &[Patch]) -> MirrorResult<()> {
    for (index, patch) in patches.iter().enumerate() {
        apply_patch(root, patch).map_err(|source| MirrorError::BatchFailed {
            index,
            source: Box::new(source),
        })?;
    }
    Ok(())
}

/// Apply a single patch.
pub fn apply_patch(root: &mut Value, patch: &Patch) -> MirrorResult<()> {
    match patch {
        Patch::Put { path, value, .. } => put(root, path, value.clone()),
        Patch::Splice { path, value } => splice(root, path, value),
        Patch::Del { path, length } => del(root, path, *length),
        Patch::Insert { path, values } => insert(root, path, values),
        unsupported => Err(MirrorError::UnsupportedPatchAction {
            action: unsupported.action(),
            patch: Box::new(unsupported.clone()),
        }),
    }
}

/// Replace the slot at `path` with `value`. An empty path replaces the root.
pub fn put(root: &mut Value, path: &Path, value: Value) -> MirrorResult<()> {
    let Some((parent, last)) = path.split_last() else {
        *root = value;
        return Ok(());
    };
    match (resolve_mut(root, parent)?, last) {
        (Value::Object(map), Prop::Key(key)) => {
            map.insert(key.clone(), value);
        }
        (Value::Array(arr), Prop::Index(idx)) => {
            let len = arr.len();
            match (*idx).cmp(&len) {
                std::cmp::Ordering::Less => arr[*idx] = value,
                std::cmp::Ordering::Equal => arr.push(value),
                std::cmp::Ordering::Greater => {
                    return Err(MirrorError::IndexOutOfBounds {
                        path: parent.into(),
                        index: *idx,
                        len,
                    })
                }
            }
        }
        (other, _) => {
            return Err(MirrorError::NotAContainer {
                path: parent.into(),
                found: value_type_name(other),
            })
        }
    }
    Ok(())
}

/// Insert `text` into the string slot named by `path` minus its position.
///
/// Positions count Unicode scalar values, so a character outside the Basic
/// Multilingual Plane is one position, not two. A position past the end
/// appends.
pub fn splice(root: &mut Value, path: &Path, text: &str) -> MirrorResult<()> {
    let (slot_path, pos) = split_position(path)?;
    match resolve_mut(root, slot_path)? {
        Value::String(s) => {
            let at = s.char_indices().nth(pos).map_or(s.len(), |(byte, _)| byte);
            s.insert_str(at, text);
            Ok(())
        }
        other => Err(MirrorError::type_mismatch(
            slot_path,
            "string",
            value_type_name(other),
        )),
    }
}

/// Remove the slot at `path` from its parent.
///
/// Only a single element is removed; a `length` above one is logged and the
/// remaining elements are kept.
pub fn del(root: &mut Value, path: &Path, length: usize) -> MirrorResult<()> {
    let Some((parent, last)) = path.split_last() else {
        return Err(MirrorError::InvalidPosition { path: path.clone() });
    };
    if length > 1 {
        tracing::warn!(
            path = %path,
            length,
            "ranged delete is not supported, removing a single element"
        );
    }
    match (resolve_mut(root, parent)?, last) {
        (Value::Object(map), Prop::Key(key)) => {
            if map.remove(key).is_none() {
                return Err(MirrorError::path_not_found(path.clone()));
            }
        }
        (Value::Array(arr), Prop::Index(idx)) => {
            if *idx >= arr.len() {
                return Err(MirrorError::IndexOutOfBounds {
                    path: parent.into(),
                    index: *idx,
                    len: arr.len(),
                });
            }
            arr.remove(*idx);
        }
        (other, _) => {
            return Err(MirrorError::NotAContainer {
                path: parent.into(),
                found: value_type_name(other),
            })
        }
    }
    Ok(())
}

/// Insert `values` into the list named by `path` minus its position,
/// shifting later elements. A position past the end appends.
pub fn insert(root: &mut Value, path: &Path, values: &[Value]) -> MirrorResult<()> {
    let (list_path, pos) = split_position(path)?;
    match resolve_mut(root, list_path)? {
        Value::Array(arr) => {
            let at = pos.min(arr.len());
            arr.splice(at..at, values.iter().cloned());
            Ok(())
        }
        other => Err(MirrorError::type_mismatch(
            list_path,
            "array",
            value_type_name(other),
        )),
    }
}

fn split_position(path: &Path) -> MirrorResult<(&[Prop], usize)> {
    match path.split_last() {
        Some((rest, Prop::Index(pos))) => Ok((rest, *pos)),
        _ => Err(MirrorError::InvalidPosition { path: path.clone() }),
    }
}
