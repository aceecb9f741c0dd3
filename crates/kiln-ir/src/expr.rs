//! Expression and statement nodes.
//!
//! Lowered kernels do not separate expressions from statements: a `Store` or
//! a `Block` lives in the same arena as the `Add` that computes its offset.
//! Nodes refer to each other by [`Handle`], so a single node may be shared by
//! several parents.

use serde::{Deserialize, Serialize};

use crate::arena::Handle;
use crate::buffer::{Buffer, Tensor};
use crate::types::Type;

/// A unary operator.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum UnaryOp {
    Minus,
    Not,
}

/// A binary operator.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    /// C-family operator token.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
        }
    }

    /// Returns `true` for operators producing a boolean.
    pub fn is_predicate(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge | Self::And | Self::Or
        )
    }
}

/// A node of a lowered function body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Signed integer literal.
    IntImm { ty: Type, value: i64 },
    /// Unsigned integer or boolean literal.
    UIntImm { ty: Type, value: u64 },
    /// Floating-point literal.
    FloatImm { ty: Type, value: f64 },
    /// String literal.
    StringImm(String),
    /// A named scalar or pointer variable.
    Var { name: String, ty: Type },
    /// Reference to a tensor; evaluates to its base address.
    Tensor(Handle<Tensor>),
    /// Reference to a buffer; evaluates to its base address.
    Buffer(Handle<Buffer>),
    Unary {
        op: UnaryOp,
        value: Handle<Expr>,
    },
    Binary {
        op: BinaryOp,
        a: Handle<Expr>,
        b: Handle<Expr>,
    },
    Min {
        a: Handle<Expr>,
        b: Handle<Expr>,
    },
    Max {
        a: Handle<Expr>,
        b: Handle<Expr>,
    },
    Cast {
        ty: Type,
        value: Handle<Expr>,
    },
    Select {
        condition: Handle<Expr>,
        true_value: Handle<Expr>,
        false_value: Handle<Expr>,
    },
    /// `lanes` consecutive values `base, base + stride, ...`.
    Ramp {
        base: Handle<Expr>,
        stride: Handle<Expr>,
        lanes: u16,
    },
    /// A scalar replicated over `lanes` lanes.
    Broadcast {
        value: Handle<Expr>,
        lanes: u16,
    },
    /// Read of `tensor` at a multi-dimensional index.
    Load {
        tensor: Handle<Expr>,
        indices: Vec<Handle<Expr>>,
    },
    /// Write of `value` into `tensor` at a multi-dimensional index.
    Store {
        tensor: Handle<Expr>,
        value: Handle<Expr>,
        indices: Vec<Handle<Expr>>,
    },
    /// Binds `symbol` (a `Var`) to the optional `body` value.
    Let {
        symbol: Handle<Expr>,
        body: Option<Handle<Expr>>,
    },
    /// Materializes the storage of a buffer.
    Alloc { destination: Handle<Expr> },
    /// Call to an extern or builtin function.
    Call {
        name: String,
        ty: Type,
        read_args: Vec<Handle<Expr>>,
        write_args: Vec<Handle<Expr>>,
    },
    Block(Vec<Handle<Expr>>),
    IfThenElse {
        condition: Handle<Expr>,
        true_case: Handle<Expr>,
        false_case: Option<Handle<Expr>>,
    },
    /// Serial loop over `[min, min + extent)` with unit step.
    For {
        loop_var: Handle<Expr>,
        min: Handle<Expr>,
        extent: Handle<Expr>,
        body: Handle<Expr>,
    },
}

impl Expr {
    /// A 32-bit signed integer literal.
    pub fn int(value: i64) -> Self {
        Self::IntImm {
            ty: Type::I32,
            value,
        }
    }

    /// A 32-bit float literal.
    pub fn float(value: f64) -> Self {
        Self::FloatImm {
            ty: Type::F32,
            value,
        }
    }

    pub fn bool(value: bool) -> Self {
        Self::UIntImm {
            ty: Type::BOOL,
            value: u64::from(value),
        }
    }

    /// A variable node.
    pub fn var(name: impl Into<String>, ty: Type) -> Self {
        Self::Var {
            name: name.into(),
            ty,
        }
    }

    /// The value of a signed integer literal.
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Self::IntImm { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Returns `true` for integer, unsigned or float literals.
    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            Self::IntImm { .. } | Self::UIntImm { .. } | Self::FloatImm { .. }
        )
    }

    /// Short kind name, used in diagnostics and the IR dump.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::IntImm { .. } => "IntImm",
            Self::UIntImm { .. } => "UIntImm",
            Self::FloatImm { .. } => "FloatImm",
            Self::StringImm(_) => "StringImm",
            Self::Var { .. } => "Var",
            Self::Tensor(_) => "Tensor",
            Self::Buffer(_) => "Buffer",
            Self::Unary { .. } => "Unary",
            Self::Binary { .. } => "Binary",
            Self::Min { .. } => "Min",
            Self::Max { .. } => "Max",
            Self::Cast { .. } => "Cast",
            Self::Select { .. } => "Select",
            Self::Ramp { .. } => "Ramp",
            Self::Broadcast { .. } => "Broadcast",
            Self::Load { .. } => "Load",
            Self::Store { .. } => "Store",
            Self::Let { .. } => "Let",
            Self::Alloc { .. } => "Alloc",
            Self::Call { .. } => "Call",
            Self::Block(_) => "Block",
            Self::IfThenElse { .. } => "IfThenElse",
            Self::For { .. } => "For",
        }
    }

    /// Handles of every direct child, in evaluation order.
    pub fn children(&self) -> Vec<Handle<Expr>> {
        match self {
            Self::IntImm { .. }
            | Self::UIntImm { .. }
            | Self::FloatImm { .. }
            | Self::StringImm(_)
            | Self::Var { .. }
            | Self::Tensor(_)
            | Self::Buffer(_) => Vec::new(),
            Self::Unary { value, .. }
            | Self::Cast { value, .. }
            | Self::Broadcast { value, .. } => vec![*value],
            Self::Binary { a, b, .. } | Self::Min { a, b } | Self::Max { a, b } => vec![*a, *b],
            Self::Select {
                condition,
                true_value,
                false_value,
            } => vec![*condition, *true_value, *false_value],
            Self::Ramp { base, stride, .. } => vec![*base, *stride],
            Self::Load { tensor, indices } => {
                let mut out = vec![*tensor];
                out.extend(indices.iter().copied());
                out
            }
            Self::Store {
                tensor,
                value,
                indices,
            } => {
                let mut out = vec![*tensor, *value];
                out.extend(indices.iter().copied());
                out
            }
            Self::Let { symbol, body } => {
                let mut out = vec![*symbol];
                out.extend(*body);
                out
            }
            Self::Alloc { destination } => vec![*destination],
            Self::Call {
                read_args,
                write_args,
                ..
            } => read_args.iter().chain(write_args).copied().collect(),
            Self::Block(stmts) => stmts.clone(),
            Self::IfThenElse {
                condition,
                true_case,
                false_case,
            } => {
                let mut out = vec![*condition, *true_case];
                out.extend(*false_case);
                out
            }
            Self::For {
                loop_var,
                min,
                extent,
                body,
            } => vec![*loop_var, *min, *extent, *body],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_op_symbols() {
        assert_eq!(BinaryOp::Add.symbol(), "+");
        assert_eq!(BinaryOp::Le.symbol(), "<=");
        assert_eq!(BinaryOp::Shr.symbol(), ">>");
        assert!(BinaryOp::Lt.is_predicate());
        assert!(!BinaryOp::Mul.is_predicate());
    }

    #[test]
    fn literal_helpers() {
        assert_eq!(Expr::int(3).as_int(), Some(3));
        assert!(Expr::float(1.0).is_constant());
        assert_eq!(Expr::float(1.0).as_int(), None);
        assert_eq!(
            Expr::bool(true),
            Expr::UIntImm {
                ty: Type::BOOL,
                value: 1
            }
        );
    }

    #[test]
    fn children_in_order() {
        let a = Handle::new(0);
        let b = Handle::new(1);
        let c = Handle::new(2);
        let store = Expr::Store {
            tensor: a,
            value: b,
            indices: vec![c],
        };
        assert_eq!(store.children(), vec![a, b, c]);
        let call = Expr::Call {
            name: "f".into(),
            ty: Type::VOID,
            read_args: vec![a],
            write_args: vec![b],
        };
        assert_eq!(call.children(), vec![a, b]);
        assert!(Expr::var("x", Type::I32).children().is_empty());
    }
}
