//! Code generation errors.

use kiln_backend_core::BackendError;
use kiln_ir::{IrError, MemoryType, Target};

/// Errors raised while emitting SYCL source.
///
/// Every variant aborts generation of the whole module.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// The generator was constructed for a non-SYCL target.
    #[error("target {0} is not a SYCL target")]
    InvalidTarget(Target),

    /// A buffer reaching placement has a void element type.
    #[error("buffer `{0}` has void element type")]
    VoidBuffer(String),

    /// An `Alloc` whose destination is not a buffer node.
    #[error("alloc destination is a {0} node, expected a buffer")]
    AllocWithoutBuffer(&'static str),

    /// A temporary buffer in a memory space SYCL device code cannot declare.
    #[error("memory type {memory} of buffer `{buffer}` is not supported in SYCL device code")]
    UnsupportedMemory { buffer: String, memory: MemoryType },

    /// Declarations-only output was requested in runtime-compile mode.
    #[error("header output is not supported when compiling for the runtime compiler")]
    UnsupportedOutputKind,

    /// A construct the SYCL emitter does not handle yet.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// A `Let` whose symbol has no valid type.
    #[error("let binding `{0}` has an invalid type")]
    InvalidLetType(String),

    /// A `Store` whose target is not a tensor.
    #[error("store target is a {0} node, expected a tensor")]
    StoreToNonTensor(&'static str),

    /// A thread or block index variable with an axis other than x, y or z.
    #[error("unknown axis in index variable `{0}`")]
    UnknownAxis(String),

    /// The module failed validation (bad handles, duplicate names, ranks).
    #[error(transparent)]
    InvalidIr(#[from] IrError),
}

impl From<CodegenError> for BackendError {
    fn from(err: CodegenError) -> Self {
        match err {
            CodegenError::NotImplemented(_)
            | CodegenError::UnsupportedMemory { .. }
            | CodegenError::UnsupportedOutputKind => BackendError::Unsupported(err.to_string()),
            CodegenError::InvalidIr(e) => BackendError::Invalid(e),
            other => BackendError::Other(other.to_string()),
        }
    }
}
