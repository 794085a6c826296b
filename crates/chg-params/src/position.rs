//! Changelog inclusion-tree positions
//!
//! The store never owns changelog nodes. It walks them through
//! [`ChangelogPosition`] and keeps only their scope keys.

use std::sync::Arc;

/// Changeset currently being parsed at a position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangesetInfo<'a> {
    /// `id` attribute, if present
    pub id: Option<&'a str>,

    /// `author` attribute, if present
    pub author: Option<&'a str>,
}

/// Read-only view of a changelog node
pub trait ChangelogPosition {
    /// Logical path; the key of this node's local bucket
    fn scope_key(&self) -> &str;

    /// Path of the file the node was read from
    fn file_path(&self) -> &str;

    /// Including changelog, `None` at the root
    fn parent(&self) -> Option<&dyn ChangelogPosition>;

    /// Changeset being parsed right now, if any
    fn current_changeset(&self) -> Option<ChangesetInfo<'_>> {
        None
    }
}

/// Iterator from a position up to its root
#[derive(Clone)]
pub struct Ancestry<'a> {
    next: Option<&'a dyn ChangelogPosition>,
}

impl<'a> Iterator for Ancestry<'a> {
    type Item = &'a dyn ChangelogPosition;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

/// Walk `position`, its parent, grandparent, ... up to the root
#[inline]
#[must_use]
pub fn ancestry(position: Option<&dyn ChangelogPosition>) -> Ancestry<'_> {
    Ancestry { next: position }
}

/// Owned changelog node
///
/// A minimal [`ChangelogPosition`] for hosts that do not have their own tree
/// type. Parents are shared through `Arc` so sibling includes can point at the
/// same node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangelogNode {
    file_path: String,
    logical_path: String,
    parent: Option<Arc<ChangelogNode>>,
    changeset: Option<ActiveChangeset>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ActiveChangeset {
    id: Option<String>,
    author: Option<String>,
}

impl ChangelogNode {
    /// Root node whose logical path equals its file path
    #[must_use]
    pub fn new(file_path: impl Into<String>) -> Self {
        let file_path = file_path.into();
        Self {
            logical_path: file_path.clone(),
            file_path,
            parent: None,
            changeset: None,
        }
    }

    /// Override the logical path
    #[inline]
    #[must_use]
    pub fn with_logical_path(mut self, logical_path: impl Into<String>) -> Self {
        self.logical_path = logical_path.into();
        self
    }

    /// Attach to an including changelog
    #[inline]
    #[must_use]
    pub fn with_parent(mut self, parent: Arc<ChangelogNode>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Child node included from `parent`
    #[must_use]
    pub fn included_from(parent: &Arc<ChangelogNode>, file_path: impl Into<String>) -> Self {
        Self::new(file_path).with_parent(Arc::clone(parent))
    }

    /// Build a chain of includes, outermost first, returning the innermost
    ///
    /// Returns `None` for an empty list.
    #[must_use]
    pub fn chain<I, S>(paths: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut current: Option<Self> = None;
        for path in paths {
            current = Some(match current {
                None => Self::new(path),
                Some(parent) => Self::new(path).with_parent(Arc::new(parent)),
            });
        }
        current
    }

    /// Mark a changeset as being parsed
    pub fn begin_changeset(&mut self, id: Option<&str>, author: Option<&str>) {
        self.changeset = Some(ActiveChangeset {
            id: id.map(str::to_string),
            author: author.map(str::to_string),
        });
    }

    /// Clear the changeset being parsed
    pub fn end_changeset(&mut self) {
        self.changeset = None;
    }

    /// Logical path
    #[inline]
    #[must_use]
    pub fn logical_path(&self) -> &str {
        &self.logical_path
    }
}

impl ChangelogPosition for ChangelogNode {
    fn scope_key(&self) -> &str {
        &self.logical_path
    }

    fn file_path(&self) -> &str {
        &self.file_path
    }

    fn parent(&self) -> Option<&dyn ChangelogPosition> {
        self.parent
            .as_deref()
            .map(|p| p as &dyn ChangelogPosition)
    }

    fn current_changeset(&self) -> Option<ChangesetInfo<'_>> {
        self.changeset.as_ref().map(|cs| ChangesetInfo {
            id: cs.id.as_deref(),
            author: cs.author.as_deref(),
        })
    }
}
