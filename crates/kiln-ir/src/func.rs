//! Lowered functions and their arguments.

use serde::{Deserialize, Serialize};

use crate::arena::{Arena, Handle};
use crate::buffer::{Buffer, Tensor};
use crate::error::IrError;
use crate::expr::Expr;
use crate::infer::TypeOf;

/// Direction of a buffer argument.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum ArgIo {
    Input,
    Output,
    InputOutput,
}

/// A formal argument of a lowered function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Argument {
    /// A device buffer, passed as a pointer.
    Buffer { buffer: Handle<Buffer>, io: ArgIo },
    /// A scalar passed by value.
    Scalar { name: String, ty: crate::Type },
}

impl Argument {
    /// Returns `true` for buffers that are only read.
    pub fn is_input_only(&self) -> bool {
        matches!(
            self,
            Self::Buffer {
                io: ArgIo::Input,
                ..
            }
        )
    }
}

/// Launch geometry bound by the scheduler.
///
/// Each entry is an expression that is either an integer literal or symbolic.
/// Index 0 is the x axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisInfo {
    pub grid_dims: [Handle<Expr>; 3],
    pub block_dims: [Handle<Expr>; 3],
}

/// A kernel past scheduling, ready for code generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoweredFunc {
    pub name: String,
    pub args: Vec<Argument>,
    pub body: Handle<Expr>,
    /// Buffers allocated inside the kernel.
    #[serde(default)]
    pub temp_bufs: Vec<Handle<Buffer>>,
    #[serde(default)]
    pub axis_info: Option<AxisInfo>,
    /// Statements binding named axis variables, run before the body.
    #[serde(default)]
    pub axis_aliases: Vec<Handle<Expr>>,
    pub exprs: Arena<Expr>,
    #[serde(default)]
    pub tensors: Arena<Tensor>,
    #[serde(default)]
    pub buffers: Arena<Buffer>,
}

impl LoweredFunc {
    /// Type queries over this function's arenas.
    pub fn types(&self) -> TypeOf<'_> {
        TypeOf::new(&self.exprs, &self.tensors, &self.buffers)
    }

    /// Checks that every handle reachable from this function is in bounds,
    /// that every node refers only to nodes appended before it (so the node
    /// graph is acyclic), that shapes are index arithmetic and that every
    /// load/store is indexed consistently with its tensor.
    pub fn validate(&self) -> Result<(), IrError> {
        let expr = |h: Handle<Expr>| self.check(&self.exprs, "expression", h);
        let buffer = |h: Handle<Buffer>| self.check(&self.buffers, "buffer", h);

        expr(self.body)?;
        self.axis_aliases.iter().try_for_each(|&h| expr(h))?;
        self.temp_bufs.iter().try_for_each(|&h| buffer(h))?;
        if let Some(info) = &self.axis_info {
            info.grid_dims
                .iter()
                .chain(&info.block_dims)
                .try_for_each(|&h| expr(h))?;
        }
        for arg in &self.args {
            if let Argument::Buffer { buffer: b, .. } = arg {
                buffer(*b)?;
            }
        }
        for (_, buf) in self.buffers.iter() {
            buf.shape.iter().try_for_each(|&h| expr(h))?;
        }
        for (_, tensor) in self.tensors.iter() {
            tensor.shape.iter().try_for_each(|&h| expr(h))?;
            if let Some(b) = tensor.buffer {
                buffer(b)?;
            }
        }
        for (h, node) in self.exprs.iter() {
            for child in node.children() {
                expr(child)?;
                if child.index() >= h.index() {
                    return Err(IrError::ForwardReference {
                        func: self.name.clone(),
                        node: h.index(),
                        child: child.index(),
                    });
                }
            }
            match node {
                Expr::Tensor(t) => self.check(&self.tensors, "tensor", *t)?,
                Expr::Buffer(b) => buffer(*b)?,
                Expr::Load { tensor, indices } | Expr::Store { tensor, indices, .. } => {
                    self.check_rank(*tensor, indices.len())?
                }
                _ => {}
            }
        }
        for (_, buf) in self.buffers.iter() {
            self.check_shape(&buf.name, &buf.shape)?;
        }
        for (_, tensor) in self.tensors.iter() {
            self.check_shape(&tensor.name, &tensor.shape)?;
        }
        Ok(())
    }

    // Shapes feed offset arithmetic, so they may only hold index expressions.
    fn check_shape(&self, owner: &str, shape: &[Handle<Expr>]) -> Result<(), IrError> {
        let mut stack = shape.to_vec();
        while let Some(h) = stack.pop() {
            let node = &self.exprs[h];
            match node {
                Expr::IntImm { .. }
                | Expr::UIntImm { .. }
                | Expr::Var { .. }
                | Expr::Unary { .. }
                | Expr::Binary { .. }
                | Expr::Min { .. }
                | Expr::Max { .. }
                | Expr::Cast { .. } => stack.extend(node.children()),
                other => {
                    return Err(IrError::NonIndexShape {
                        func: self.name.clone(),
                        owner: owner.to_string(),
                        kind: other.kind_name(),
                    })
                }
            }
        }
        Ok(())
    }

    fn check<T>(&self, arena: &Arena<T>, kind: &'static str, h: Handle<T>) -> Result<(), IrError> {
        if arena.contains(h) {
            Ok(())
        } else {
            Err(IrError::BadHandle {
                func: self.name.clone(),
                arena: kind,
                index: h.index(),
                size: arena.len(),
            })
        }
    }

    // A single index is an already-flattened offset and is accepted for any rank.
    fn check_rank(&self, tensor: Handle<Expr>, found: usize) -> Result<(), IrError> {
        let Some(Expr::Tensor(t)) = self.exprs.try_get(tensor) else {
            return Ok(());
        };
        let Some(tensor) = self.tensors.try_get(*t) else {
            return Ok(());
        };
        let rank = tensor.shape.len();
        if found == 1 || found == rank {
            Ok(())
        } else {
            Err(IrError::RankMismatch {
                func: self.name.clone(),
                tensor: tensor.name.clone(),
                rank,
                found,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryType;
    use crate::types::Type;

    fn empty(name: &str) -> LoweredFunc {
        let mut exprs = Arena::new();
        let body = exprs.append(Expr::Block(Vec::new()));
        LoweredFunc {
            name: name.into(),
            args: Vec::new(),
            body,
            temp_bufs: Vec::new(),
            axis_info: None,
            axis_aliases: Vec::new(),
            exprs,
            tensors: Arena::new(),
            buffers: Arena::new(),
        }
    }

    #[test]
    fn self_reference_is_rejected() {
        let mut func = empty("f");
        func.exprs[func.body] = Expr::Block(vec![func.body]);
        assert!(matches!(
            func.validate(),
            Err(IrError::ForwardReference {
                node: 0,
                child: 0,
                ..
            })
        ));
    }

    #[test]
    fn empty_function_validates() {
        empty("f").validate().unwrap();
    }

    #[test]
    fn dangling_child_is_reported() {
        let mut func = empty("f");
        func.exprs[func.body] = Expr::Block(vec![Handle::new(7)]);
        let err = func.validate().unwrap_err();
        assert!(matches!(
            err,
            IrError::BadHandle {
                arena: "expression",
                index: 7,
                ..
            }
        ));
    }

    #[test]
    fn shape_must_be_index_arithmetic() {
        let mut func = empty("f");
        let d = func.exprs.append(Expr::int(4));
        let t = func.tensors.append(Tensor {
            name: "a".into(),
            dtype: Type::F32,
            shape: vec![d],
            buffer: None,
        });
        let te = func.exprs.append(Expr::Tensor(t));
        let ld = func.exprs.append(Expr::Load {
            tensor: te,
            indices: vec![d],
        });
        func.validate().unwrap();
        func.tensors[t].shape = vec![d, ld];
        assert!(matches!(
            func.validate(),
            Err(IrError::NonIndexShape { kind: "Load", ref owner, .. }) if owner == "a"
        ));
    }

    #[test]
    fn dangling_temp_buffer_is_reported() {
        let mut func = empty("f");
        func.temp_bufs.push(Handle::new(0));
        assert!(matches!(
            func.validate(),
            Err(IrError::BadHandle { arena: "buffer", .. })
        ));
    }

    #[test]
    fn rank_mismatch_is_reported() {
        let mut func = empty("f");
        let d = func.exprs.append(Expr::int(4));
        let t = func.tensors.append(Tensor {
            name: "a".into(),
            dtype: Type::F32,
            shape: vec![d, d, d],
            buffer: None,
        });
        let te = func.exprs.append(Expr::Tensor(t));
        func.exprs.append(Expr::Load {
            tensor: te,
            indices: vec![d, d],
        });
        assert!(matches!(
            func.validate(),
            Err(IrError::RankMismatch { rank: 3, found: 2, .. })
        ));
    }

    #[test]
    fn flattened_index_is_accepted() {
        let mut func = empty("f");
        let d = func.exprs.append(Expr::int(4));
        let b = func.buffers.append(Buffer {
            name: "_a".into(),
            dtype: Type::F32,
            shape: vec![d, d],
            memory: MemoryType::Heap,
        });
        let t = func.tensors.append(Tensor {
            name: "a".into(),
            dtype: Type::F32,
            shape: vec![d, d],
            buffer: Some(b),
        });
        let te = func.exprs.append(Expr::Tensor(t));
        func.exprs.append(Expr::Load {
            tensor: te,
            indices: vec![d],
        });
        func.validate().unwrap();
    }

    #[test]
    fn input_only_arguments() {
        let arg = Argument::Buffer {
            buffer: Handle::new(0),
            io: ArgIo::Input,
        };
        assert!(arg.is_input_only());
        let arg = Argument::Buffer {
            buffer: Handle::new(0),
            io: ArgIo::InputOutput,
        };
        assert!(!arg.is_input_only());
    }
}
