//! Type inference over expression nodes.

use crate::arena::{Arena, Handle};
use crate::buffer::{Buffer, Tensor};
use crate::expr::Expr;
use crate::types::Type;

/// Borrowed view of the arenas a function's nodes refer into.
///
/// Handles are assumed valid; run [`LoweredFunc::validate`](crate::LoweredFunc::validate)
/// before querying.
#[derive(Clone, Copy)]
pub struct TypeOf<'a> {
    pub exprs: &'a Arena<Expr>,
    pub tensors: &'a Arena<Tensor>,
    pub buffers: &'a Arena<Buffer>,
}

impl<'a> TypeOf<'a> {
    pub fn new(
        exprs: &'a Arena<Expr>,
        tensors: &'a Arena<Tensor>,
        buffers: &'a Arena<Buffer>,
    ) -> Self {
        Self {
            exprs,
            tensors,
            buffers,
        }
    }

    /// Result type of the node at `h`. Statements are `void`.
    pub fn get(&self, h: Handle<Expr>) -> Type {
        match &self.exprs[h] {
            Expr::IntImm { ty, .. }
            | Expr::UIntImm { ty, .. }
            | Expr::FloatImm { ty, .. }
            | Expr::Var { ty, .. }
            | Expr::Cast { ty, .. }
            | Expr::Call { ty, .. } => *ty,
            Expr::StringImm(_) => Type::STRING,
            Expr::Tensor(t) => self.tensors[*t].dtype.element_of().pointer_to(),
            Expr::Buffer(b) => self.buffers[*b].dtype.element_of().pointer_to(),
            Expr::Unary { value, .. } => self.get(*value),
            Expr::Binary { op, a, b } => {
                let (ta, tb) = (self.get(*a), self.get(*b));
                let lanes = ta.lanes.max(tb.lanes);
                if op.is_predicate() {
                    Type::BOOL.with_lanes(lanes)
                } else {
                    ta.with_lanes(lanes)
                }
            }
            Expr::Min { a, b } | Expr::Max { a, b } => {
                let (ta, tb) = (self.get(*a), self.get(*b));
                ta.with_lanes(ta.lanes.max(tb.lanes))
            }
            Expr::Select { true_value, .. } => self.get(*true_value),
            Expr::Ramp { base, lanes, .. } => self.get(*base).with_lanes(*lanes),
            Expr::Broadcast { value, lanes } => self.get(*value).with_lanes(*lanes),
            Expr::Load { tensor, indices } => {
                let elem = match &self.exprs[*tensor] {
                    Expr::Tensor(t) => self.tensors[*t].dtype.element_of(),
                    _ => self.get(*tensor).element_of(),
                };
                let lanes = indices.iter().map(|&i| self.get(i).lanes).max().unwrap_or(1);
                elem.with_lanes(lanes)
            }
            Expr::Store { .. }
            | Expr::Let { .. }
            | Expr::Alloc { .. }
            | Expr::Block(_)
            | Expr::IfThenElse { .. }
            | Expr::For { .. } => Type::VOID,
        }
    }
}
