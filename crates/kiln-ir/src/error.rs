//! Error types for the Kiln IR.

/// Errors that can occur when constructing or validating IR.
#[derive(Debug, thiserror::Error)]
pub enum IrError {
    /// A handle index is out of bounds for its arena.
    #[error("function `{func}`: {arena} handle {index} out of bounds (arena size: {size})")]
    BadHandle {
        func: String,
        arena: &'static str,
        index: usize,
        size: usize,
    },

    /// A node refers to a node appended at or after it.
    #[error("function `{func}`: expression {node} refers forward to expression {child}")]
    ForwardReference {
        func: String,
        node: usize,
        child: usize,
    },

    /// A tensor or buffer dimension is not plain index arithmetic.
    #[error("function `{func}`: shape of `{owner}` contains a {kind} node")]
    NonIndexShape {
        func: String,
        owner: String,
        kind: &'static str,
    },

    /// Two functions of one module share a name.
    #[error("duplicate function name `{0}`")]
    DuplicateFunction(String),

    /// A load or store index count differs from the tensor rank.
    #[error("function `{func}`: tensor `{tensor}` has rank {rank} but is indexed with {found} indices")]
    RankMismatch {
        func: String,
        tensor: String,
        rank: usize,
        found: usize,
    },
}
