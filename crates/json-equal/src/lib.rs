//! json-mirror-equal - deep equality for mirrored JSON documents.
//!
//! Provides [`deep_equal`] for recursively comparing two [`serde_json::Value`]
//! instances with strict type checking, and [`first_difference`] to locate
//! where two documents stop agreeing.

mod deep_equal;

pub use deep_equal::{deep_equal, first_difference};
