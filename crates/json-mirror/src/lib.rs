//! json-mirror — materialize a plain JSON document from a stream of patches.
//!
//! An upstream versioned document engine reports every change as an ordered
//! batch of fine-grained patches (`put`, `splice`, `del`, `insert`). This
//! crate folds those batches into a plain [`serde_json::Value`] that stays
//! structurally equal to the engine's own view of the document.
//!
//! ```
//! use json_mirror::{path, MirrorStore, Patch};
//! use serde_json::json;
//!
//! let mut store = MirrorStore::new("doc-1");
//! store
//!     .apply(&[
//!         Patch::put(path!("foo"), "one"),
//!         Patch::splice(path!("foo", 3usize), "two"),
//!     ])
//!     .unwrap();
//! assert_eq!(*store.read(), json!({"foo": "onetwo"}));
//! ```
//!
//! Modules:
//! - [`path`]: props and paths
//! - [`patch`]: the patch enum, in the engine's wire format
//! - [`resolve`]: walking a path to the container holding a slot
//! - [`apply`]: single-patch appliers and the batch fold
//! - [`scope`]: rewriting a batch relative to a subtree
//! - [`store`]: the mirror store and change notifications

pub mod apply;
pub mod error;
pub mod patch;
pub mod path;
pub mod resolve;
pub mod scope;
pub mod store;

pub use apply::{apply_patch, apply_patches};
pub use error::{MirrorError, MirrorResult};
pub use patch::Patch;
pub use path::{Path, Prop};
pub use scope::{pick, scope_to_subtree};
pub use store::{ChangeNotification, DocumentId, MirrorConfig, MirrorStore, SharedMirrorStore};
