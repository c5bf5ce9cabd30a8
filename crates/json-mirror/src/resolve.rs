//! Path resolution against a mirror.
//!
//! Appliers never walk the full path: they strip the terminal prop (and, for
//! splice/insert, the position) and ask for the container that holds the
//! slot. Records are indexed by key, lists by index; any other pairing is a
//! resolution failure.

use crate::error::{value_type_name, MirrorError, MirrorResult};
use crate::Prop;
use serde_json::Value;

/// Walk `props` into `root` and return the value reached, mutably.
pub fn resolve_mut<'a>(root: &'a mut Value, props: &[Prop]) -> MirrorResult<&'a mut Value> {
    let mut current = root;
    for (depth, prop) in props.iter().enumerate() {
        current = match (current, prop) {
            (Value::Object(map), Prop::Key(key)) => map
                .get_mut(key)
                .ok_or_else(|| MirrorError::path_not_found(&props[..=depth]))?,
            (Value::Array(arr), Prop::Index(idx)) => {
                let len = arr.len();
                arr.get_mut(*idx).ok_or_else(|| MirrorError::IndexOutOfBounds {
                    path: props[..depth].into(),
                    index: *idx,
                    len,
                })?
            }
            (other, _) => {
                return Err(MirrorError::NotAContainer {
                    path: props[..depth].into(),
                    found: container_mismatch(other),
                })
            }
        };
    }
    Ok(current)
}

/// Read-only lookup. Returns `None` instead of an error on any miss.
pub fn get<'a>(root: &'a Value, props: &[Prop]) -> Option<&'a Value> {
    let mut current = root;
    for prop in props {
        current = match (current, prop) {
            (Value::Object(map), Prop::Key(key)) => map.get(key)?,
            (Value::Array(arr), Prop::Index(idx)) => arr.get(*idx)?,
            _ => return None,
        };
    }
    Some(current)
}

fn container_mismatch(v: &Value) -> &'static str {
    match v {
        Value::Object(_) => "object by index",
        Value::Array(_) => "array by key",
        other => value_type_name(other),
    }
}
