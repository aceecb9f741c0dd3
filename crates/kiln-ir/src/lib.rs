//! Kiln intermediate representation.
//!
//! An arena-based IR for kernels that have already been scheduled, tiled
//! and placed: each [`LoweredFunc`] owns the arenas its nodes, tensors and
//! buffers live in, and nodes refer to each other by [`Handle`].

pub mod arena;
mod buffer;
mod builder;
mod display;
mod error;
mod expr;
mod func;
mod infer;
mod target;
mod types;

use serde::{Deserialize, Serialize};

pub use arena::{Arena, Handle};
pub use buffer::{Buffer, MemoryType, Tensor};
pub use builder::FuncBuilder;
pub use display::{dump_module, format_expr};
pub use error::IrError;
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use func::{ArgIo, Argument, AxisInfo, LoweredFunc};
pub use infer::TypeOf;
pub use target::{Arch, Language, Target};
pub use types::{Pointer, ScalarKind, Type};

/// A compilation unit: an ordered list of lowered functions.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub functions: Vec<LoweredFunc>,
}

impl Module {
    /// Validates every function and checks that function names are unique.
    pub fn validate(&self) -> Result<(), IrError> {
        let mut seen = std::collections::HashSet::new();
        for func in &self.functions {
            if !seen.insert(func.name.as_str()) {
                return Err(IrError::DuplicateFunction(func.name.clone()));
            }
            func.validate()?;
        }
        Ok(())
    }
}
