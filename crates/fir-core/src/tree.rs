//! Named-tree view over values: file-tree-like structures with named
//! children and a path-addressing algebra.
//!
//! Nodes are immutable; every update returns a new node sharing unmodified
//! subtrees with the input. Canonical form orders every level's children by
//! ordinal name comparison (Rust `str` ordering, which compares Unicode
//! scalar values) with no duplicate names at a level.

use std::sync::{Arc, LazyLock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Blob(Arc<Vec<u8>>),
    Tree(Arc<Vec<(String, TreeNode)>>),
}

static EMPTY_TREE: LazyLock<TreeNode> = LazyLock::new(|| TreeNode::Tree(Arc::new(Vec::new())));

impl TreeNode {
    pub fn blob(bytes: impl Into<Vec<u8>>) -> TreeNode {
        TreeNode::Blob(Arc::new(bytes.into()))
    }

    /// Build a tree node and sort it into canonical form, recursively.
    pub fn sorted_tree(children: Vec<(String, TreeNode)>) -> TreeNode {
        TreeNode::non_sorted_tree(children).sorted()
    }

    /// Build a tree node keeping the given child order. Used for fixtures
    /// and bulk construction ahead of an explicit sort pass.
    pub fn non_sorted_tree(children: Vec<(String, TreeNode)>) -> TreeNode {
        TreeNode::Tree(Arc::new(children))
    }

    pub fn empty_tree() -> TreeNode {
        EMPTY_TREE.clone()
    }

    pub fn is_blob(&self) -> bool {
        matches!(self, TreeNode::Blob(_))
    }

    pub fn children(&self) -> &[(String, TreeNode)] {
        match self {
            TreeNode::Blob(_) => &[],
            TreeNode::Tree(children) => children,
        }
    }

    /// Depth-first enumeration of every blob under this node, with the
    /// path of names leading to it. Lazy and restartable.
    pub fn blobs_transitive(&self) -> TransitiveBlobs {
        TransitiveBlobs {
            stack: vec![(Vec::new(), self.clone())],
        }
    }

    /// Resolve a path of names. Absent when a segment has no matching
    /// child or the path descends below a blob.
    pub fn get_node_at_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&TreeNode> {
        let (first, rest) = match path.split_first() {
            Some(split) => split,
            None => return Some(self),
        };
        match self {
            TreeNode::Blob(_) => None,
            TreeNode::Tree(children) => children
                .iter()
                .find(|(name, _)| name.as_str() == first.as_ref())
                .and_then(|(_, child)| child.get_node_at_path(rest)),
        }
    }

    /// Replace the node at `path`, creating intermediate tree levels as
    /// needed. Each touched level replaces any same-named child and is
    /// re-sorted; untouched branches are shared. An empty path replaces
    /// the node itself.
    pub fn set_node_at_path_sorted<S: AsRef<str>>(&self, path: &[S], node: TreeNode) -> TreeNode {
        let (first, rest) = match path.split_first() {
            Some(split) => split,
            None => return node,
        };
        let name = first.as_ref();

        let children = self.children();
        let child_before = children
            .iter()
            .find(|(child_name, _)| child_name.as_str() == name)
            .map(|(_, child)| child.clone())
            .unwrap_or_else(TreeNode::empty_tree);
        let child_after = child_before.set_node_at_path_sorted(rest, node);

        let mut next: Vec<(String, TreeNode)> = children
            .iter()
            .filter(|(child_name, _)| child_name.as_str() != name)
            .cloned()
            .collect();
        next.push((name.to_string(), child_after));
        next.sort_by(|a, b| a.0.cmp(&b.0));
        TreeNode::Tree(Arc::new(next))
    }

    /// Remove the node at `path`. Absent when this node is a blob, the
    /// path is empty, or the path does not resolve. Removing a level's
    /// last child leaves an empty tree behind; see [`TreeNode::remove_empty_nodes`].
    pub fn remove_node_at_path<S: AsRef<str>>(&self, path: &[S]) -> Option<TreeNode> {
        let (first, rest) = path.split_first()?;
        let children = match self {
            TreeNode::Blob(_) => return None,
            TreeNode::Tree(children) => children,
        };
        let position = children
            .iter()
            .position(|(name, _)| name.as_str() == first.as_ref())?;

        let mut next: Vec<(String, TreeNode)> = children.as_ref().clone();
        if rest.is_empty() {
            next.remove(position);
        } else {
            next[position].1 = next[position].1.remove_node_at_path(rest)?;
        }
        next.sort_by(|a, b| a.0.cmp(&b.0));
        Some(TreeNode::Tree(Arc::new(next)))
    }

    /// Reorder every level's children by ordinal name comparison,
    /// recursively. Idempotent. Does not deduplicate same-named children.
    pub fn sorted(&self) -> TreeNode {
        match self {
            TreeNode::Blob(_) => self.clone(),
            TreeNode::Tree(children) => {
                let mut next: Vec<(String, TreeNode)> = children
                    .iter()
                    .map(|(name, child)| (name.clone(), child.sorted()))
                    .collect();
                next.sort_by(|a, b| a.0.cmp(&b.0));
                TreeNode::Tree(Arc::new(next))
            }
        }
    }

    /// Right-biased merge: every blob reachable in `other` overwrites the
    /// node at the same path in `self`; paths present only in `self` are
    /// preserved.
    pub fn union(&self, other: &TreeNode) -> TreeNode {
        other
            .blobs_transitive()
            .fold(self.clone(), |merged, (path, bytes)| {
                merged.set_node_at_path_sorted(&path, TreeNode::Blob(bytes))
            })
    }

    /// Set every blob of `right` into `left` at its path. Identical to
    /// [`TreeNode::union`] at the blob level.
    pub fn merge_blobs(left: &TreeNode, right: &TreeNode) -> TreeNode {
        left.union(right)
    }

    /// Keep only children whose full path from this node satisfies the
    /// predicate, recursively. A blob is never filtered directly, only as
    /// a named child.
    pub fn filter_nodes_by_path(&self, keep: &dyn Fn(&[String]) -> bool) -> TreeNode {
        fn walk(
            node: &TreeNode,
            path: &mut Vec<String>,
            keep: &dyn Fn(&[String]) -> bool,
        ) -> TreeNode {
            match node {
                TreeNode::Blob(_) => node.clone(),
                TreeNode::Tree(children) => {
                    let mut kept = Vec::new();
                    for (name, child) in children.iter() {
                        path.push(name.clone());
                        if keep(path) {
                            kept.push((name.clone(), walk(child, path, keep)));
                        }
                        path.pop();
                    }
                    TreeNode::Tree(Arc::new(kept))
                }
            }
        }
        let mut path = Vec::new();
        walk(self, &mut path, keep)
    }

    /// Drop tree levels that hold no blobs transitively. Absent when the
    /// whole node becomes empty. A blob is never removed.
    pub fn remove_empty_nodes(&self) -> Option<TreeNode> {
        match self {
            TreeNode::Blob(_) => Some(self.clone()),
            TreeNode::Tree(children) => {
                let kept: Vec<(String, TreeNode)> = children
                    .iter()
                    .filter_map(|(name, child)| {
                        child
                            .remove_empty_nodes()
                            .map(|cleaned| (name.clone(), cleaned))
                    })
                    .collect();
                if kept.is_empty() {
                    None
                } else {
                    Some(TreeNode::Tree(Arc::new(kept)))
                }
            }
        }
    }
}

/// Iterator behind [`TreeNode::blobs_transitive`].
pub struct TransitiveBlobs {
    stack: Vec<(Vec<String>, TreeNode)>,
}

impl Iterator for TransitiveBlobs {
    type Item = (Vec<String>, Arc<Vec<u8>>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((path, node)) = self.stack.pop() {
            match node {
                TreeNode::Blob(bytes) => return Some((path, bytes)),
                TreeNode::Tree(children) => {
                    for (name, child) in children.iter().rev() {
                        let mut child_path = path.clone();
                        child_path.push(name.clone());
                        self.stack.push((child_path, child.clone()));
                    }
                }
            }
        }
        None
    }
}
