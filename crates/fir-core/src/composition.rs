//! Encoding between the named-tree view and the value model, plus bulk
//! tree construction from pathed blobs.
//!
//! A tree level encodes as a list of two-element lists, each pairing the
//! blob-form name with the encoded child. Decoding is the exact inverse
//! and reports failures with the `(index, name)` path prefix resolved
//! before the failure.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::encode;
use crate::error::FirError;
use crate::tree::TreeNode;
use crate::value::Value;

pub fn value_from_tree(tree: &TreeNode) -> Value {
    match tree {
        TreeNode::Blob(bytes) => Value::blob(bytes.as_ref().clone()),
        TreeNode::Tree(children) => Value::list(
            children
                .iter()
                .map(|(name, child)| {
                    Value::list(vec![
                        encode::blob_value_from_string(name),
                        value_from_tree(child),
                    ])
                })
                .collect(),
        ),
    }
}

pub fn tree_from_value(value: &Value) -> Result<TreeNode, FirError> {
    match value {
        Value::Blob(blob) => Ok(TreeNode::blob(blob.bytes().to_vec())),
        Value::List(list) => {
            let items = list.items();
            let mut children = Vec::with_capacity(items.len());
            for (index, entry) in items.iter().enumerate() {
                let pair = entry.as_list().ok_or_else(|| {
                    FirError::tree_decode(vec![], format!("element {index} is not a list"))
                })?;
                if pair.len() != 2 {
                    return Err(FirError::tree_decode(
                        vec![],
                        format!(
                            "element {index} has {} entries, expected [name, child]",
                            pair.len()
                        ),
                    ));
                }
                let name = encode::string_from_blob_value(&pair[0]).map_err(|err| {
                    FirError::tree_decode(
                        vec![],
                        format!("element {index} has a malformed name: {err}"),
                    )
                })?;
                let child = tree_from_value(&pair[1])
                    .map_err(|err| err.in_tree_child(index, name.clone()))?;
                children.push((name, child));
            }
            Ok(TreeNode::Tree(Arc::new(children)))
        }
    }
}

/// Build a canonical tree by setting each `(path, content)` pair into the
/// empty tree in order; later entries at the same path win.
pub fn sorted_tree_from_blobs<I>(blobs: I) -> TreeNode
where
    I: IntoIterator<Item = (Vec<String>, Vec<u8>)>,
{
    blobs
        .into_iter()
        .fold(TreeNode::empty_tree(), |tree, (path, bytes)| {
            tree.set_node_at_path_sorted(&path, TreeNode::blob(bytes))
        })
}

/// Convenience form of [`sorted_tree_from_blobs`] taking single-string
/// paths delimited by `/` or `\`.
pub fn sorted_tree_from_blobs_with_string_paths<I>(blobs: I) -> TreeNode
where
    I: IntoIterator<Item = (String, Vec<u8>)>,
{
    sorted_tree_from_blobs(blobs.into_iter().map(|(path, bytes)| {
        let segments = path
            .split(['/', '\\'])
            .map(str::to_string)
            .collect::<Vec<String>>();
        (segments, bytes)
    }))
}

/// Flatten a tree into an ordered path-to-content mapping for external
/// file storage. `BTreeMap` over `Vec<String>` keys compares paths
/// element-wise with the same ordinal comparator as the canonical sort.
pub fn tree_to_flat_map(tree: &TreeNode) -> BTreeMap<Vec<String>, Arc<Vec<u8>>> {
    tree.blobs_transitive().collect()
}
