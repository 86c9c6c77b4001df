//! Record schemas: field paths, leaf kinds and traversal.
//!
//! A record is a tree of named fields. Inner nodes are other records, leaves
//! are [`Scalar`](crate::coerce::Scalar)s, `Vec`s of scalars or `Option`s of
//! scalars. The shape is fixed at compile time: a record type implements
//! [`Node`] (usually through [`record!`](crate::record)), and a field of any
//! other type, or one left out of `record!`, simply does not compile.
//!
//! Two traversals are built on [`Node::walk`]:
//! - [`Schema::of`] collects a [`LeafDescriptor`] per leaf, depth-first in
//!   declaration order.
//! - [`for_each_leaf`] visits the leaf slots of a live instance in the same
//!   order, so slot `index` always matches `schema.leaves()[index]`.

mod leaf;
mod record;

pub use leaf::Leaf;

use crate::coerce::ScalarKind;
use crate::error::{ConfigError, Result};
use crate::naming::NamingPolicy;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;

/// Field names from the record root to a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Shape of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafKind {
    /// A plain scalar; its zero value means "not provided".
    Scalar(ScalarKind),
    /// `Option<scalar>`; `None` means "not provided".
    Optional(ScalarKind),
    /// `Vec<scalar>`; empty means "not provided".
    Sequence(ScalarKind),
}

impl LeafKind {
    pub fn element(&self) -> ScalarKind {
        match *self {
            LeafKind::Scalar(kind) | LeafKind::Optional(kind) | LeafKind::Sequence(kind) => kind,
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, LeafKind::Sequence(_))
    }
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeafKind::Scalar(kind) => write!(f, "{}", kind),
            LeafKind::Optional(kind) => write!(f, "optional {}", kind),
            LeafKind::Sequence(kind) => write!(f, "sequence of {}", kind),
        }
    }
}

/// One leaf of a record schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafDescriptor {
    pub path: FieldPath,
    pub kind: LeafKind,
    /// Explicit source key attached to this field, if any.
    pub name_override: Option<&'static str>,
}

impl LeafDescriptor {
    /// Source key of this leaf under `policy`.
    pub fn key(&self, policy: &NamingPolicy) -> String {
        policy.key(self.path.segments(), self.name_override)
    }
}

/// Receives every leaf reached by [`Node::walk`].
pub trait Visitor {
    fn visit_leaf<'a>(
        &mut self,
        path: &'a [&'static str],
        name_override: Option<&'static str>,
        leaf: &'a mut dyn Leaf,
    ) -> Result<()>;
}

/// A node of a record tree: either a leaf or a nested record.
pub trait Node {
    /// Visit every leaf below this node depth-first in declaration order.
    ///
    /// `path` holds the field names leading to this node; `name_override` is
    /// the override attached to the field holding this node. Records ignore
    /// their own override: it is never inherited by their fields.
    fn walk(
        &mut self,
        path: &mut Vec<&'static str>,
        name_override: Option<&'static str>,
        visitor: &mut dyn Visitor,
    ) -> Result<()>;

    /// Fold `src` into `self`, leaf by leaf. See [`crate::merge`].
    fn merge_from(&mut self, src: &Self);
}

/// A top-level configuration record.
///
/// Implemented by [`record!`](crate::record). The zero record is
/// `Default::default()`; file sources decode straight into the type with serde,
/// so records normally carry `#[serde(default)]`.
pub trait Record: Node + Default + DeserializeOwned {}

/// The leaves of a record type, in walk order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    leaves: Vec<LeafDescriptor>,
}

impl Schema {
    /// Describe the leaves of `T`.
    pub fn of<T: Node + Default>() -> Self {
        let mut collector = Collector::default();
        let mut record = T::default();
        let walked = record.walk(&mut Vec::new(), None, &mut collector);
        debug_assert!(walked.is_ok());
        Self {
            leaves: collector.leaves,
        }
    }

    pub fn leaves(&self) -> &[LeafDescriptor] {
        &self.leaves
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Derive every leaf's key under `policy`, in walk order.
    ///
    /// Fails with [`ConfigError::DuplicateKey`] when two leaves derive the
    /// same key, and with [`ConfigError::ReservedKey`] when a leaf derives one
    /// of `reserved`.
    pub fn keys(&self, policy: &NamingPolicy, reserved: &[&str]) -> Result<Vec<String>> {
        let mut seen: HashMap<String, &FieldPath> = HashMap::new();
        let mut keys = Vec::with_capacity(self.leaves.len());

        for leaf in &self.leaves {
            let key = leaf.key(policy);
            if reserved.contains(&key.as_str()) {
                return Err(ConfigError::ReservedKey {
                    key,
                    path: leaf.path.clone(),
                });
            }
            if let Some(first) = seen.get(&key) {
                return Err(ConfigError::DuplicateKey {
                    key,
                    first: (*first).clone(),
                    second: leaf.path.clone(),
                });
            }
            seen.insert(key.clone(), &leaf.path);
            keys.push(key);
        }

        Ok(keys)
    }
}

#[derive(Default)]
struct Collector {
    leaves: Vec<LeafDescriptor>,
}

impl Visitor for Collector {
    fn visit_leaf<'a>(
        &mut self,
        path: &'a [&'static str],
        name_override: Option<&'static str>,
        leaf: &'a mut dyn Leaf,
    ) -> Result<()> {
        self.leaves.push(LeafDescriptor {
            path: FieldPath::from_segments(path.iter().copied()),
            kind: leaf.kind(),
            name_override,
        });
        Ok(())
    }
}

/// A leaf slot of a live record, as seen by [`for_each_leaf`].
pub struct LeafSlot<'a> {
    /// Position in walk order; indexes [`Schema::leaves`].
    pub index: usize,
    pub path: &'a [&'static str],
    pub name_override: Option<&'static str>,
    pub leaf: &'a mut dyn Leaf,
}

struct Indexed<F> {
    next: usize,
    visit: F,
}

impl<F> Visitor for Indexed<F>
where
    F: FnMut(LeafSlot<'_>) -> Result<()>,
{
    fn visit_leaf<'a>(
        &mut self,
        path: &'a [&'static str],
        name_override: Option<&'static str>,
        leaf: &'a mut dyn Leaf,
    ) -> Result<()> {
        let index = self.next;
        self.next += 1;
        (self.visit)(LeafSlot {
            index,
            path,
            name_override,
            leaf,
        })
    }
}

/// Visit every leaf slot of `record` in walk order, stopping at the first error.
pub fn for_each_leaf<T, F>(record: &mut T, visit: F) -> Result<()>
where
    T: Node + ?Sized,
    F: FnMut(LeafSlot<'_>) -> Result<()>,
{
    let mut visitor = Indexed { next: 0, visit };
    record.walk(&mut Vec::new(), None, &mut visitor)
}
