//! The mirror store: owner of one materialized document.
//!
//! A store is created when its owner subscribes to a document's change
//! notifications and dropped when it unsubscribes. It is the only writer of
//! its mirror. Readers get `Arc` snapshots; the store clones on write when a
//! snapshot is still alive, so a snapshot never changes after it is taken.

use crate::apply::apply_patches;
use crate::error::{MirrorError, MirrorResult};
use crate::resolve::get;
use crate::scope::{pick, scope_to_subtree};
use crate::{Patch, Path};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Identity of an upstream document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// One change event from the upstream document engine.
///
/// `snapshot` is the engine's own materialized value after the change. The
/// store does not read it when applying; it is there for [`MirrorStore::verify`]
/// and [`MirrorStore::resync`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeNotification {
    pub doc_id: DocumentId,
    #[serde(default)]
    pub snapshot: Value,
    pub patches: Vec<Patch>,
}

impl ChangeNotification {
    pub fn from_json(json: &str) -> MirrorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Construction parameters of a [`MirrorStore`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorConfig {
    pub doc_id: DocumentId,
    /// Materialize only this subtree. Empty for the whole document.
    #[serde(default)]
    pub subtree: Path,
}

/// Holder of the current mirror of one document.
#[derive(Debug)]
pub struct MirrorStore {
    doc_id: DocumentId,
    subtree: Path,
    mirror: Arc<Value>,
    synchronized: bool,
}

impl MirrorStore {
    /// Mirror of the whole document, starting as an empty record.
    pub fn new(doc_id: impl Into<DocumentId>) -> Self {
        Self::with_value(doc_id, Value::Object(Default::default()))
    }

    /// Mirror of the whole document, starting from `value`.
    pub fn with_value(doc_id: impl Into<DocumentId>, value: Value) -> Self {
        Self {
            doc_id: doc_id.into(),
            subtree: Path::root(),
            mirror: Arc::new(value),
            synchronized: true,
        }
    }

    /// Mirror of `subtree` only. It starts as null: the empty document has
    /// nothing at any subtree.
    pub fn scoped(doc_id: impl Into<DocumentId>, subtree: Path) -> Self {
        let mirror = if subtree.is_root() {
            Value::Object(Default::default())
        } else {
            Value::Null
        };
        Self {
            doc_id: doc_id.into(),
            subtree,
            mirror: Arc::new(mirror),
            synchronized: true,
        }
    }

    pub fn from_config(config: MirrorConfig) -> Self {
        Self::scoped(config.doc_id, config.subtree)
    }

    pub fn doc_id(&self) -> &DocumentId {
        &self.doc_id
    }

    pub fn subtree(&self) -> &Path {
        &self.subtree
    }

    /// False after a failed batch, until [`MirrorStore::resync`].
    pub fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    /// Snapshot of the current mirror.
    pub fn read(&self) -> Arc<Value> {
        Arc::clone(&self.mirror)
    }

    /// Copy of the value at `path` inside the mirror.
    pub fn read_at(&self, path: &Path) -> Option<Value> {
        get(&self.mirror, path.props()).cloned()
    }

    /// Fold one change notification into the mirror.
    pub fn handle(&mut self, notification: &ChangeNotification) -> MirrorResult<()> {
        if notification.doc_id != self.doc_id {
            return Err(MirrorError::DocumentMismatch {
                expected: self.doc_id.clone(),
                found: notification.doc_id.clone(),
            });
        }
        self.apply(&notification.patches)
    }

    /// Fold a root-addressed batch into the mirror, scoping it first when
    /// the store mirrors a subtree.
    ///
    /// Any failure leaves the store desynchronized: patches before the
    /// failing one have already been applied.
    pub fn apply(&mut self, patches: &[Patch]) -> MirrorResult<()> {
        if !self.synchronized {
            return Err(MirrorError::Desynchronized);
        }
        let result = self.fold(patches);
        if let Err(err) = &result {
            self.synchronized = false;
            tracing::warn!(doc_id = %self.doc_id, error = %err, "mirror desynchronized");
        }
        result
    }

    fn fold(&mut self, patches: &[Patch]) -> MirrorResult<()> {
        let batch: Cow<'_, [Patch]> = if self.subtree.is_root() {
            Cow::Borrowed(patches)
        } else {
            Cow::Owned(scope_to_subtree(patches, &self.subtree)?)
        };
        if batch.is_empty() {
            return Ok(());
        }
        apply_patches(Arc::make_mut(&mut self.mirror), &batch)?;
        tracing::debug!(
            doc_id = %self.doc_id,
            received = patches.len(),
            applied = batch.len(),
            "applied patch batch"
        );
        Ok(())
    }

    /// Replace the mirror with `snapshot` (the full upstream document) and
    /// mark the store synchronized again.
    pub fn resync(&mut self, snapshot: &Value) {
        self.mirror = Arc::new(pick(snapshot, &self.subtree));
        self.synchronized = true;
        tracing::debug!(doc_id = %self.doc_id, "mirror resynchronized");
    }

    /// Check the mirror against the full upstream `snapshot`.
    pub fn verify(&self, snapshot: &Value) -> MirrorResult<()> {
        let null = Value::Null;
        let expected = get(snapshot, self.subtree.props()).unwrap_or(&null);
        match json_mirror_equal::first_difference(&self.mirror, expected) {
            Some(pointer) => Err(MirrorError::Diverged { pointer }),
            None => Ok(()),
        }
    }
}

/// A [`MirrorStore`] behind a mutex, for hosts that deliver notifications
/// from more than one thread. Handling is serialized per store.
#[derive(Debug)]
pub struct SharedMirrorStore(Mutex<MirrorStore>);

impl SharedMirrorStore {
    pub fn new(store: MirrorStore) -> Self {
        Self(Mutex::new(store))
    }

    /// A poisoned lock is reported as [`MirrorError::Poisoned`]; the mirror
    /// it guards may hold a half-applied batch.
    fn lock(&self) -> MirrorResult<MutexGuard<'_, MirrorStore>> {
        self.0.lock().map_err(|_| MirrorError::Poisoned)
    }

    pub fn handle(&self, notification: &ChangeNotification) -> MirrorResult<()> {
        self.lock()?.handle(notification)
    }

    pub fn read(&self) -> MirrorResult<Arc<Value>> {
        Ok(self.lock()?.read())
    }

    pub fn resync(&self, snapshot: &Value) -> MirrorResult<()> {
        self.lock()?.resync(snapshot);
        Ok(())
    }

    pub fn verify(&self, snapshot: &Value) -> MirrorResult<()> {
        self.lock()?.verify(snapshot)
    }

    pub fn into_inner(self) -> MirrorResult<MirrorStore> {
        self.0.into_inner().map_err(|_| MirrorError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use serde_json::json;

    fn notification(patches: Vec<Patch>) -> ChangeNotification {
        ChangeNotification {
            doc_id: "doc-1".into(),
            snapshot: Value::Null,
            patches,
        }
    }

    #[test]
    fn starts_as_empty_record() {
        let store = MirrorStore::new("doc-1");
        assert_eq!(*store.read(), json!({}));
        assert!(store.is_synchronized());
    }

    #[test]
    fn snapshots_are_not_mutated_by_later_batches() {
        let mut store = MirrorStore::new("doc-1");
        store
            .handle(&notification(vec![Patch::put(path!("foo"), "zero")]))
            .unwrap();
        let before = store.read();
        store
            .handle(&notification(vec![Patch::splice(path!("foo", 4usize), "!")]))
            .unwrap();
        assert_eq!(*before, json!({"foo": "zero"}));
        assert_eq!(*store.read(), json!({"foo": "zero!"}));
    }

    #[test]
    fn rejects_other_documents_without_desync() {
        let mut store = MirrorStore::new("doc-1");
        let mut n = notification(vec![Patch::put(path!("a"), 1)]);
        n.doc_id = "doc-2".into();
        assert!(matches!(store.handle(&n), Err(MirrorError::DocumentMismatch { .. })));
        assert!(store.is_synchronized());
        assert_eq!(*store.read(), json!({}));
    }

    #[test]
    fn failure_desynchronizes_until_resync() {
        let mut store = MirrorStore::new("doc-1");
        let err = store
            .handle(&notification(vec![
                Patch::put(path!("a"), 1),
                Patch::del(path!("missing")),
            ]))
            .unwrap_err();
        assert!(err.is_path_resolution());
        assert!(!store.is_synchronized());
        assert_eq!(*store.read(), json!({"a": 1}));

        let next = notification(vec![Patch::put(path!("b"), 2)]);
        assert!(matches!(store.handle(&next), Err(MirrorError::Desynchronized)));

        store.resync(&json!({"a": 1, "b": 2}));
        assert!(store.is_synchronized());
        store.handle(&notification(vec![Patch::del(path!("b"))])).unwrap();
        assert_eq!(*store.read(), json!({"a": 1}));
    }

    #[test]
    fn scoped_store_tracks_subtree() {
        let mut store = MirrorStore::scoped("doc-1", path!("baz"));
        assert_eq!(*store.read(), Value::Null);
        store
            .apply(&[
                Patch::put(path!("foo"), "zero"),
                Patch::put(path!("baz"), json!([{"number": "ONE"}])),
            ])
            .unwrap();
        store
            .apply(&[Patch::insert(path!("baz", 1usize), vec![json!({"number": "TWO"})])])
            .unwrap();
        let full = json!({"foo": "zero", "baz": [{"number": "ONE"}, {"number": "TWO"}]});
        store.verify(&full).unwrap();
        assert_eq!(store.read_at(&path!(1usize, "number")), Some(json!("TWO")));
    }

    #[test]
    fn verify_reports_first_difference() {
        let store = MirrorStore::with_value("doc-1", json!({"a": {"b": [1, 2]}}));
        store.verify(&json!({"a": {"b": [1, 2]}})).unwrap();
        match store.verify(&json!({"a": {"b": [1, 3]}})) {
            Err(MirrorError::Diverged { pointer }) => assert_eq!(pointer, "/a/b/1"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn decodes_notification_json() {
        let n = ChangeNotification::from_json(
            r#"{"docId": "doc-1", "snapshot": {"foo": "zero"},
                "patches": [{"action": "put", "path": ["foo"], "value": "zero"}]}"#,
        )
        .unwrap();
        let mut store = MirrorStore::new("doc-1");
        store.handle(&n).unwrap();
        store.verify(&n.snapshot).unwrap();

        let err = ChangeNotification::from_json(r#"{"docId": "doc-1", "patches": [{"action": "nope"}]}"#)
            .unwrap_err();
        assert!(matches!(err, MirrorError::Serialization(_)));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config: MirrorConfig =
            serde_json::from_value(json!({"docId": "doc-1", "subtree": ["baz"]})).unwrap();
        let store = MirrorStore::from_config(config);
        assert_eq!(store.doc_id().as_str(), "doc-1");
        assert_eq!(store.subtree(), &path!("baz"));

        let config: MirrorConfig = serde_json::from_value(json!({"docId": "doc-1"})).unwrap();
        assert_eq!(*MirrorStore::from_config(config).read(), json!({}));
    }

    #[test]
    fn shared_store_serializes_handling() {
        let shared = Arc::new(SharedMirrorStore::new(MirrorStore::with_value(
            "doc-1",
            json!({"l": []}),
        )));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || {
                    shared
                        .handle(&notification(vec![Patch::insert(
                            path!("l", 0usize),
                            vec![json!(i)],
                        )]))
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let value = shared.read().unwrap();
        assert_eq!(value["l"].as_array().map(Vec::len), Some(4));
    }

    #[test]
    fn poisoned_shared_store_is_not_reported_as_desync() {
        let shared = Arc::new(SharedMirrorStore::new(MirrorStore::new("doc-1")));
        let writer = Arc::clone(&shared);
        let joined = std::thread::spawn(move || {
            let _guard = writer.0.lock().unwrap();
            panic!("handler panicked");
        })
        .join();
        assert!(joined.is_err());

        assert!(matches!(shared.read(), Err(MirrorError::Poisoned)));
        assert!(matches!(
            shared.handle(&notification(vec![Patch::put(path!("a"), 1)])),
            Err(MirrorError::Poisoned)
        ));
        let Ok(shared) = Arc::try_unwrap(shared) else {
            panic!("no other owners remain");
        };
        assert!(matches!(shared.into_inner(), Err(MirrorError::Poisoned)));
    }
}
