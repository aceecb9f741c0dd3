//! Buffers, tensors and memory placement.

use serde::{Deserialize, Serialize};

use crate::arena::Handle;
use crate::expr::Expr;
use crate::types::Type;

/// Where a buffer's storage lives on the device.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum MemoryType {
    /// Device-global memory, reached through a kernel argument.
    Heap,
    /// Memory shared by the work-items of one work-group.
    GpuShared,
    /// Work-item private memory (registers).
    GpuLocal,
    /// Not yet placed by the upstream pipeline.
    Auto,
}

/// A physical allocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Buffer {
    pub name: String,
    /// Element type.
    pub dtype: Type,
    /// Dimension sizes, outermost first.
    pub shape: Vec<Handle<Expr>>,
    pub memory: MemoryType,
}

impl Buffer {
    /// Name of the tensor a buffer argument binds to.
    ///
    /// Buffers are named `_<tensor>` upstream; the leading underscore is
    /// stripped. Names without it are returned unchanged.
    pub fn tensor_name(&self) -> &str {
        self.name.strip_prefix('_').unwrap_or(&self.name)
    }
}

/// A logical tensor, optionally backed by a [`Buffer`].
///
/// Several tensors may be views over one buffer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    pub name: String,
    pub dtype: Type,
    pub shape: Vec<Handle<Expr>>,
    #[serde(default)]
    pub buffer: Option<Handle<Buffer>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(name: &str) -> Buffer {
        Buffer {
            name: name.into(),
            dtype: Type::F32,
            shape: Vec::new(),
            memory: MemoryType::Heap,
        }
    }

    #[test]
    fn tensor_name_strips_one_underscore() {
        assert_eq!(buffer("_var").tensor_name(), "var");
        assert_eq!(buffer("__var").tensor_name(), "_var");
        assert_eq!(buffer("var").tensor_name(), "var");
    }

    #[test]
    fn tensor_buffer_defaults_to_none() {
        let t: Tensor = serde_json::from_str(
            r#"{"name":"a","dtype":{"kind":"Float","bits":32,"lanes":1},"shape":[]}"#,
        )
        .unwrap();
        assert_eq!(t.buffer, None);
        assert_eq!(t.dtype, Type::F32);
    }
}
