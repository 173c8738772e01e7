//! Property tests over the value model, the named-tree algebra, and the
//! wire encodings.

use proptest::prelude::*;

use fir_core::composition::{sorted_tree_from_blobs, tree_from_value, value_from_tree};
use fir_core::hash::compute_hash;
use fir_core::json::{value_from_json, value_to_json};
use fir_core::{encode, TreeNode, Value};

fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop::collection::vec(any::<u8>(), 0..8).prop_map(Value::blob);
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Value::list)
    })
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,4}"
}

fn tree_strategy() -> impl Strategy<Value = TreeNode> {
    let leaf = prop::collection::vec(any::<u8>(), 0..6).prop_map(TreeNode::blob);
    leaf.prop_recursive(3, 20, 4, |inner| {
        prop::collection::vec((name_strategy(), inner), 0..4)
            .prop_map(TreeNode::non_sorted_tree)
    })
}

proptest! {
    #[test]
    fn tree_value_round_trip(tree in tree_strategy()) {
        let encoded = value_from_tree(&tree);
        prop_assert_eq!(tree_from_value(&encoded), Ok(tree));
    }

    #[test]
    fn decode_is_left_inverse_of_encode(tree in tree_strategy()) {
        let encoded = value_from_tree(&tree);
        if let Ok(decoded) = tree_from_value(&encoded) {
            prop_assert_eq!(value_from_tree(&decoded), encoded);
        }
    }

    #[test]
    fn sort_is_idempotent(tree in tree_strategy()) {
        let once = tree.sorted();
        prop_assert_eq!(once.sorted(), once);
    }

    #[test]
    fn set_then_get_returns_the_node(
        tree in tree_strategy(),
        path in prop::collection::vec(name_strategy(), 1..4),
        content in prop::collection::vec(any::<u8>(), 0..6),
    ) {
        let node = TreeNode::blob(content);
        let updated = tree.set_node_at_path_sorted(&path, node.clone());
        prop_assert_eq!(updated.get_node_at_path(&path), Some(&node));
    }

    #[test]
    fn equal_values_hash_equal(value in value_strategy()) {
        let copy = match &value {
            Value::Blob(blob) => Value::blob(blob.bytes().to_vec()),
            Value::List(list) => Value::list(list.items().to_vec()),
        };
        prop_assert_eq!(compute_hash(&value), compute_hash(&copy));
        prop_assert_eq!(value.cached_hash(), copy.cached_hash());
    }

    #[test]
    fn json_wire_round_trip(value in value_strategy()) {
        let json = value_to_json(&value);
        prop_assert_eq!(value_from_json(&json), Ok(value));
    }

    #[test]
    fn signed_integer_round_trip(n in any::<i64>()) {
        let value = encode::value_from_signed_integer(n);
        prop_assert_eq!(encode::signed_integer_from_value(&value), Ok(n));
    }

    #[test]
    fn string_encodings_round_trip(s in "\\PC{0,12}") {
        let from_blob = encode::string_from_blob_value(&encode::blob_value_from_string(&s));
        prop_assert_eq!(from_blob.as_deref(), Ok(s.as_str()));
        let from_list = encode::string_from_value(&encode::value_from_string(&s));
        prop_assert_eq!(from_list.as_deref(), Ok(s.as_str()));
    }

    #[test]
    fn union_prefers_right_side(
        left in tree_strategy(),
        right in tree_strategy(),
    ) {
        // canonicalize the right side so its blob paths are unique and
        // prefix-free, the form union is specified over
        let right = sorted_tree_from_blobs(
            right
                .blobs_transitive()
                .map(|(path, bytes)| (path, bytes.as_ref().clone())),
        );
        let merged = left.union(&right);
        for (path, bytes) in right.blobs_transitive() {
            prop_assert_eq!(
                merged.get_node_at_path(&path),
                Some(&TreeNode::Blob(bytes))
            );
        }
    }
}
