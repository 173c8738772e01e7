//! Execution core of the fir runtime: canonical content-addressed values,
//! a named-tree view with a path algebra, popular encodings, and the
//! JSON wire form.

pub mod composition;
pub mod encode;
pub mod error;
pub mod hash;
pub mod json;
pub mod tree;
pub mod value;

pub use error::FirError;
pub use tree::TreeNode;
pub use value::{Value, ValueInterner};
