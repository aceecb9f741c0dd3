//! Incremental construction of [`LoweredFunc`]s.

use crate::arena::{Arena, Handle};
use crate::buffer::{Buffer, MemoryType, Tensor};
use crate::expr::{BinaryOp, Expr};
use crate::func::{ArgIo, Argument, AxisInfo, LoweredFunc};
use crate::types::Type;

/// Builds a lowered function node by node.
///
/// ```
/// use kiln_ir::{ArgIo, FuncBuilder, MemoryType, Type};
///
/// let mut b = FuncBuilder::new("fill");
/// let buf = b.buffer("_out", Type::F32, &[4], MemoryType::Heap);
/// let out = b.tensor("out", Type::F32, &[4], Some(buf));
/// b.arg_buffer(buf, ArgIo::Output);
/// let i = b.int(0);
/// let v = b.float(1.0);
/// let st = b.store(out, v, vec![i]);
/// let body = b.block(vec![st]);
/// let func = b.finish(body);
/// assert!(func.validate().is_ok());
/// ```
#[derive(Debug, Default)]
pub struct FuncBuilder {
    name: String,
    args: Vec<Argument>,
    temp_bufs: Vec<Handle<Buffer>>,
    axis_info: Option<AxisInfo>,
    axis_aliases: Vec<Handle<Expr>>,
    exprs: Arena<Expr>,
    tensors: Arena<Tensor>,
    buffers: Arena<Buffer>,
}

impl FuncBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn expr(&mut self, expr: Expr) -> Handle<Expr> {
        self.exprs.append(expr)
    }

    pub fn int(&mut self, value: i64) -> Handle<Expr> {
        self.expr(Expr::int(value))
    }

    pub fn float(&mut self, value: f64) -> Handle<Expr> {
        self.expr(Expr::float(value))
    }

    pub fn var(&mut self, name: &str, ty: Type) -> Handle<Expr> {
        self.expr(Expr::var(name, ty))
    }

    pub fn binary(&mut self, op: BinaryOp, a: Handle<Expr>, b: Handle<Expr>) -> Handle<Expr> {
        self.expr(Expr::Binary { op, a, b })
    }

    /// Declares a buffer with constant dimensions.
    pub fn buffer(
        &mut self,
        name: &str,
        dtype: Type,
        shape: &[i64],
        memory: MemoryType,
    ) -> Handle<Buffer> {
        let shape = self.dims(shape);
        self.buffers.append(Buffer {
            name: name.into(),
            dtype,
            shape,
            memory,
        })
    }

    /// Declares a tensor with constant dimensions and returns a node
    /// referring to it.
    pub fn tensor(
        &mut self,
        name: &str,
        dtype: Type,
        shape: &[i64],
        buffer: Option<Handle<Buffer>>,
    ) -> Handle<Expr> {
        let shape = self.dims(shape);
        let t = self.tensors.append(Tensor {
            name: name.into(),
            dtype,
            shape,
            buffer,
        });
        self.expr(Expr::Tensor(t))
    }

    pub fn load(&mut self, tensor: Handle<Expr>, indices: Vec<Handle<Expr>>) -> Handle<Expr> {
        self.expr(Expr::Load { tensor, indices })
    }

    pub fn store(
        &mut self,
        tensor: Handle<Expr>,
        value: Handle<Expr>,
        indices: Vec<Handle<Expr>>,
    ) -> Handle<Expr> {
        self.expr(Expr::Store {
            tensor,
            value,
            indices,
        })
    }

    pub fn block(&mut self, stmts: Vec<Handle<Expr>>) -> Handle<Expr> {
        self.expr(Expr::Block(stmts))
    }

    pub fn arg_buffer(&mut self, buffer: Handle<Buffer>, io: ArgIo) {
        self.args.push(Argument::Buffer { buffer, io });
    }

    pub fn arg_scalar(&mut self, name: &str, ty: Type) {
        self.args.push(Argument::Scalar {
            name: name.into(),
            ty,
        });
    }

    pub fn temp_buf(&mut self, buffer: Handle<Buffer>) {
        self.temp_bufs.push(buffer);
    }

    pub fn axis_info(&mut self, grid_dims: [Handle<Expr>; 3], block_dims: [Handle<Expr>; 3]) {
        self.axis_info = Some(AxisInfo {
            grid_dims,
            block_dims,
        });
    }

    /// Sets all-constant launch dimensions.
    pub fn launch(&mut self, grid: [i64; 3], block: [i64; 3]) {
        let grid = grid.map(|d| self.int(d));
        let block = block.map(|d| self.int(d));
        self.axis_info(grid, block);
    }

    pub fn axis_alias(&mut self, stmt: Handle<Expr>) {
        self.axis_aliases.push(stmt);
    }

    pub fn finish(self, body: Handle<Expr>) -> LoweredFunc {
        LoweredFunc {
            name: self.name,
            args: self.args,
            body,
            temp_bufs: self.temp_bufs,
            axis_info: self.axis_info,
            axis_aliases: self.axis_aliases,
            exprs: self.exprs,
            tensors: self.tensors,
            buffers: self.buffers,
        }
    }

    fn dims(&mut self, shape: &[i64]) -> Vec<Handle<Expr>> {
        shape.iter().map(|&d| self.int(d)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_dims_are_literals() {
        let mut b = FuncBuilder::new("k");
        b.launch([1, 1, 1], [6, 1, 1]);
        let body = b.block(Vec::new());
        let func = b.finish(body);
        let info = func.axis_info.as_ref().unwrap();
        assert_eq!(func.exprs[info.block_dims[0]].as_int(), Some(6));
        assert_eq!(func.exprs[info.grid_dims[2]].as_int(), Some(1));
        func.validate().unwrap();
    }

    #[test]
    fn tensor_node_refers_to_tensor() {
        let mut b = FuncBuilder::new("k");
        let buf = b.buffer("_a", Type::F32, &[2, 3], MemoryType::GpuShared);
        let a = b.tensor("a", Type::F32, &[2, 3], Some(buf));
        let body = b.block(Vec::new());
        let func = b.finish(body);
        let Expr::Tensor(t) = func.exprs[a] else {
            panic!("expected tensor node");
        };
        assert_eq!(func.tensors[t].name, "a");
        assert_eq!(func.tensors[t].buffer, Some(buf));
        assert_eq!(func.buffers[buf].shape.len(), 2);
    }
}
