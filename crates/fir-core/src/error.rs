use std::fmt::Write as _;

/// Path prefix resolved before a tree decode failure: `(child index, child name)`
/// pairs from the root down to the level where decoding stopped.
pub type DecodePath = Vec<(usize, String)>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FirError {
    #[error("Tree decode error at {}: {message}", format_decode_path(path))]
    TreeDecode { path: DecodePath, message: String },

    #[error("String decode error: {0}")]
    StringDecode(String),

    #[error("Integer decode error: {0}")]
    IntegerDecode(String),

    #[error("Range error: {0}")]
    Range(String),

    #[error("JSON decode error: {0}")]
    Json(String),

    #[error("Compile error: {0}")]
    Compile(String),
}

impl FirError {
    pub fn tree_decode(path: DecodePath, message: impl Into<String>) -> Self {
        FirError::TreeDecode {
            path,
            message: message.into(),
        }
    }

    pub fn string_decode(message: impl Into<String>) -> Self {
        FirError::StringDecode(message.into())
    }

    pub fn integer_decode(message: impl Into<String>) -> Self {
        FirError::IntegerDecode(message.into())
    }

    pub fn range(message: impl Into<String>) -> Self {
        FirError::Range(message.into())
    }

    pub fn json(message: impl Into<String>) -> Self {
        FirError::Json(message.into())
    }

    pub fn compile(message: impl Into<String>) -> Self {
        FirError::Compile(message.into())
    }

    /// Prepend one `(index, name)` level to a tree decode error's path.
    /// Any other error kind is wrapped into a tree decode error rooted
    /// at that level.
    pub fn in_tree_child(self, index: usize, name: impl Into<String>) -> Self {
        match self {
            FirError::TreeDecode { mut path, message } => {
                path.insert(0, (index, name.into()));
                FirError::TreeDecode { path, message }
            }
            other => FirError::TreeDecode {
                path: vec![(index, name.into())],
                message: other.to_string(),
            },
        }
    }
}

fn format_decode_path(path: &[(usize, String)]) -> String {
    if path.is_empty() {
        return "root".to_string();
    }
    let mut out = String::new();
    for (i, (index, name)) in path.iter().enumerate() {
        if i > 0 {
            out.push_str(" / ");
        }
        let _ = write!(out, "child {index} ('{name}')");
    }
    out
}
