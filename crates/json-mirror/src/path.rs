//! Paths into a mirror document.
//!
//! A path is a sequence of props. Each prop is either a record key or a list
//! index, the same shape the upstream document engine uses when it addresses
//! a patch (`["baz", 1, "number"]`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single step in a [`Path`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prop {
    /// Record field.
    Key(String),
    /// List position.
    Index(usize),
}

impl Prop {
    #[inline]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Prop::Key(k) => Some(k),
            Prop::Index(_) => None,
        }
    }

    #[inline]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Prop::Key(_) => None,
            Prop::Index(i) => Some(*i),
        }
    }
}

impl fmt::Display for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prop::Key(k) => f.write_str(&escape_component(k)),
            Prop::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<String> for Prop {
    fn from(s: String) -> Self {
        Prop::Key(s)
    }
}

impl From<&str> for Prop {
    fn from(s: &str) -> Self {
        Prop::Key(s.to_owned())
    }
}

impl From<usize> for Prop {
    fn from(i: usize) -> Self {
        Prop::Index(i)
    }
}

/// Location of a slot in a mirror, relative to its root. Empty = root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<Prop>);

impl Path {
    #[inline]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    #[inline]
    pub fn from_props(props: Vec<Prop>) -> Self {
        Self(props)
    }

    /// Append a key (builder style).
    #[inline]
    pub fn key(mut self, k: impl Into<String>) -> Self {
        self.0.push(Prop::Key(k.into()));
        self
    }

    /// Append an index (builder style).
    #[inline]
    pub fn index(mut self, i: usize) -> Self {
        self.0.push(Prop::Index(i));
        self
    }

    #[inline]
    pub fn push(&mut self, prop: Prop) {
        self.0.push(prop);
    }

    #[inline]
    pub fn props(&self) -> &[Prop] {
        &self.0
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn last(&self) -> Option<&Prop> {
        self.0.last()
    }

    /// Splits off the terminal prop: `(parent, last)`. `None` for the root.
    pub fn split_last(&self) -> Option<(&[Prop], &Prop)> {
        self.0.split_last().map(|(last, parent)| (parent, last))
    }

    #[inline]
    pub fn starts_with(&self, prefix: &[Prop]) -> bool {
        self.0.starts_with(prefix)
    }

    /// Path with `prefix` removed, if this path lies under it.
    pub fn strip_prefix(&self, prefix: &[Prop]) -> Option<Path> {
        if self.starts_with(prefix) {
            Some(Path(self.0[prefix.len()..].to_vec()))
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prop> {
        self.0.iter()
    }
}

/// RFC 6901 form: `""` for the root, `/baz/0/number` otherwise.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for prop in &self.0 {
            write!(f, "/{prop}")?;
        }
        Ok(())
    }
}

impl From<&[Prop]> for Path {
    fn from(props: &[Prop]) -> Self {
        Path(props.to_vec())
    }
}

impl From<Vec<Prop>> for Path {
    fn from(props: Vec<Prop>) -> Self {
        Path(props)
    }
}

impl FromIterator<Prop> for Path {
    fn from_iter<I: IntoIterator<Item = Prop>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Prop;
    type IntoIter = std::slice::Iter<'a, Prop>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::ops::Index<usize> for Path {
    type Output = Prop;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    component.replace('~', "~0").replace('/', "~1")
}

/// Build a [`Path`] from keys and indices: `path!("baz", 0, "number")`.
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::root()
    };
    ($($prop:expr),+ $(,)?) => {{
        let mut p = $crate::Path::root();
        $(
            p.push($crate::Prop::from($prop));
        )+
        p
    }};
}
