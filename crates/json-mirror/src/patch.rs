//! Patches emitted by the upstream document engine.
//!
//! The enum mirrors the engine's wire shape, tagged by `"action"`:
//!
//! ```json
//! {"action": "put", "path": ["foo"], "value": "zero"}
//! {"action": "splice", "path": ["foo", 3], "value": "three"}
//! {"action": "del", "path": ["ah"]}
//! {"action": "insert", "path": ["baz", 1], "values": [{"number": "TWO"}]}
//! ```
//!
//! `inc`, `mark`, `unmark` and `conflict` deserialize so that they can be
//! rejected with [`MirrorError::UnsupportedPatchAction`](crate::MirrorError)
//! instead of failing somewhere in the decoder.

use crate::Path;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single structural change addressed by a path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Patch {
    /// The slot at `path` becomes exactly `value`. An empty path replaces the
    /// whole document.
    Put {
        path: Path,
        value: Value,
        #[serde(default, skip_serializing_if = "is_false")]
        conflict: bool,
    },

    /// Insert `value` into the string named by `path` minus its last prop,
    /// at the character position given by the last prop.
    ///
    /// Positions count Unicode scalar values. An upstream that counts UTF-16
    /// code units only agrees on text inside the Basic Multilingual Plane;
    /// such callers must convert positions before handing patches over.
    Splice { path: Path, value: String },

    /// Remove the slot at `path`. Only one element is removed even when
    /// `length > 1`; see [`Patch::is_ranged_delete`].
    Del {
        path: Path,
        #[serde(default = "one")]
        length: usize,
    },

    /// Insert `values` into the list named by `path` minus its last prop,
    /// starting at the position given by the last prop.
    Insert { path: Path, values: Vec<Value> },

    /// Counter increment. Not supported.
    Inc { path: Path, value: serde_json::Number },

    /// Rich-text mark. Not supported.
    Mark {
        path: Path,
        #[serde(default)]
        marks: Vec<Value>,
    },

    /// Rich-text unmark. Not supported.
    Unmark {
        path: Path,
        name: String,
        start: usize,
        end: usize,
    },

    /// Conflict annotation. Not supported.
    Conflict { path: Path },
}

fn one() -> usize {
    1
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Patch {
    #[inline]
    pub fn put(path: Path, value: impl Into<Value>) -> Self {
        Patch::Put {
            path,
            value: value.into(),
            conflict: false,
        }
    }

    #[inline]
    pub fn splice(path: Path, value: impl Into<String>) -> Self {
        Patch::Splice {
            path,
            value: value.into(),
        }
    }

    #[inline]
    pub fn del(path: Path) -> Self {
        Patch::Del { path, length: 1 }
    }

    #[inline]
    pub fn del_range(path: Path, length: usize) -> Self {
        Patch::Del { path, length }
    }

    #[inline]
    pub fn insert(path: Path, values: Vec<Value>) -> Self {
        Patch::Insert { path, values }
    }

    /// The wire name of this patch's action.
    pub fn action(&self) -> &'static str {
        match self {
            Patch::Put { .. } => "put",
            Patch::Splice { .. } => "splice",
            Patch::Del { .. } => "del",
            Patch::Insert { .. } => "insert",
            Patch::Inc { .. } => "inc",
            Patch::Mark { .. } => "mark",
            Patch::Unmark { .. } => "unmark",
            Patch::Conflict { .. } => "conflict",
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Patch::Put { path, .. }
            | Patch::Splice { path, .. }
            | Patch::Del { path, .. }
            | Patch::Insert { path, .. }
            | Patch::Inc { path, .. }
            | Patch::Mark { path, .. }
            | Patch::Unmark { path, .. }
            | Patch::Conflict { path } => path,
        }
    }

    /// Same patch, readdressed to `path`.
    pub fn with_path(&self, path: Path) -> Self {
        let mut out = self.clone();
        match &mut out {
            Patch::Put { path: p, .. }
            | Patch::Splice { path: p, .. }
            | Patch::Del { path: p, .. }
            | Patch::Insert { path: p, .. }
            | Patch::Inc { path: p, .. }
            | Patch::Mark { path: p, .. }
            | Patch::Unmark { path: p, .. }
            | Patch::Conflict { path: p } => *p = path,
        }
        out
    }

    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            Patch::Put { .. } | Patch::Splice { .. } | Patch::Del { .. } | Patch::Insert { .. }
        )
    }

    /// A delete asking for more than one element. Only the first element is
    /// removed when applied.
    pub fn is_ranged_delete(&self) -> bool {
        matches!(self, Patch::Del { length, .. } if *length > 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use serde_json::json;

    #[test]
    fn decodes_supported_actions() {
        let batch: Vec<Patch> = serde_json::from_value(json!([
            {"action": "put", "path": ["foo"], "value": "zero"},
            {"action": "splice", "path": ["foo", 3], "value": "three"},
            {"action": "del", "path": ["ah"]},
            {"action": "insert", "path": ["baz", 1], "values": [{"number": "TWO"}]},
        ]))
        .unwrap();
        assert_eq!(
            batch,
            vec![
                Patch::put(path!("foo"), "zero"),
                Patch::splice(path!("foo", 3usize), "three"),
                Patch::del(path!("ah")),
                Patch::insert(path!("baz", 1usize), vec![json!({"number": "TWO"})]),
            ]
        );
    }

    #[test]
    fn decodes_unsupported_actions() {
        let batch: Vec<Patch> = serde_json::from_value(json!([
            {"action": "inc", "path": ["n"], "value": 2},
            {"action": "mark", "path": ["text"], "marks": [{"name": "bold", "value": true, "start": 0, "end": 2}]},
            {"action": "unmark", "path": ["text"], "name": "bold", "start": 0, "end": 2},
            {"action": "conflict", "path": ["x"]},
        ]))
        .unwrap();
        let actions: Vec<_> = batch.iter().map(Patch::action).collect();
        assert_eq!(actions, ["inc", "mark", "unmark", "conflict"]);
        assert!(batch.iter().all(|p| !p.is_supported()));
    }

    #[test]
    fn del_length_defaults_to_one() {
        let p: Patch = serde_json::from_value(json!({"action": "del", "path": ["l", 0], "length": 3})).unwrap();
        assert!(p.is_ranged_delete());
        let p: Patch = serde_json::from_value(json!({"action": "del", "path": ["l", 0]})).unwrap();
        assert_eq!(p, Patch::del(path!("l", 0usize)));
        assert!(!p.is_ranged_delete());
    }

    #[test]
    fn encodes_put_without_false_conflict_flag() {
        let v = serde_json::to_value(Patch::put(path!("a"), 1)).unwrap();
        assert_eq!(v, json!({"action": "put", "path": ["a"], "value": 1}));
    }

    #[test]
    fn with_path_keeps_payload() {
        let p = Patch::insert(path!("baz", 1usize), vec![json!(1)]);
        let q = p.with_path(path!(1usize));
        assert_eq!(q, Patch::insert(path!(1usize), vec![json!(1)]));
        assert_eq!(p.path(), &path!("baz", 1usize));
    }
}
