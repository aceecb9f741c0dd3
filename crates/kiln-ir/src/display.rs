//! Display implementations and text dump for debugging.

use std::fmt::{self, Write as _};

use crate::arena::Handle;
use crate::buffer::MemoryType;
use crate::expr::{Expr, UnaryOp};
use crate::func::{ArgIo, Argument, LoweredFunc};
use crate::types::{Pointer, ScalarKind, Type};
use crate::Module;

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "?"),
            Self::Void => write!(f, "void"),
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "i"),
            Self::UInt => write!(f, "u"),
            Self::Float => write!(f, "f"),
            Self::BFloat => write!(f, "bf"),
            Self::String => write!(f, "str"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ScalarKind::Int | ScalarKind::UInt | ScalarKind::Float | ScalarKind::BFloat => {
                write!(f, "{}{}", self.kind, self.bits)?
            }
            _ => write!(f, "{}", self.kind)?,
        }
        if self.is_vector() {
            write!(f, "x{}", self.lanes)?;
        }
        match self.pointer {
            Pointer::None => Ok(()),
            Pointer::Mut => write!(f, "*"),
            Pointer::Const => write!(f, " const*"),
        }
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heap => write!(f, "heap"),
            Self::GpuShared => write!(f, "gpu_shared"),
            Self::GpuLocal => write!(f, "gpu_local"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

impl fmt::Display for ArgIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "in"),
            Self::Output => write!(f, "out"),
            Self::InputOutput => write!(f, "inout"),
        }
    }
}

/// Formats an expression inline. Statements are rendered on one line.
pub fn format_expr(func: &LoweredFunc, h: Handle<Expr>) -> String {
    let p = |h| format_expr(func, h);
    let list = |hs: &[Handle<Expr>]| hs.iter().map(|&h| p(h)).collect::<Vec<_>>().join(", ");
    let Some(node) = func.exprs.try_get(h) else {
        return format!("<bad {h:?}>");
    };
    match node {
        Expr::IntImm { value, .. } => value.to_string(),
        Expr::UIntImm { ty, value } if ty.is_bool() => (*value != 0).to_string(),
        Expr::UIntImm { value, .. } => format!("{value}u"),
        Expr::FloatImm { value, .. } => format!("{value:?}"),
        Expr::StringImm(s) => format!("{s:?}"),
        Expr::Var { name, .. } => name.clone(),
        Expr::Tensor(t) => match func.tensors.try_get(*t) {
            Some(t) => format!("%{}", t.name),
            None => format!("<bad tensor {t:?}>"),
        },
        Expr::Buffer(b) => match func.buffers.try_get(*b) {
            Some(b) => format!("@{}", b.name),
            None => format!("<bad buffer {b:?}>"),
        },
        Expr::Unary { op, value } => match op {
            UnaryOp::Minus => format!("(-{})", p(*value)),
            UnaryOp::Not => format!("(!{})", p(*value)),
        },
        Expr::Binary { op, a, b } => format!("({} {} {})", p(*a), op.symbol(), p(*b)),
        Expr::Min { a, b } => format!("min({}, {})", p(*a), p(*b)),
        Expr::Max { a, b } => format!("max({}, {})", p(*a), p(*b)),
        Expr::Cast { ty, value } => format!("cast<{ty}>({})", p(*value)),
        Expr::Select {
            condition,
            true_value,
            false_value,
        } => format!(
            "select({}, {}, {})",
            p(*condition),
            p(*true_value),
            p(*false_value)
        ),
        Expr::Ramp {
            base,
            stride,
            lanes,
        } => format!("ramp({}, {}, {lanes})", p(*base), p(*stride)),
        Expr::Broadcast { value, lanes } => format!("broadcast({}, {lanes})", p(*value)),
        Expr::Load { tensor, indices } => format!("{}[{}]", p(*tensor), list(indices)),
        Expr::Store {
            tensor,
            value,
            indices,
        } => format!("{}[{}] = {}", p(*tensor), list(indices), p(*value)),
        Expr::Let { symbol, body } => match body {
            Some(body) => format!("let {} = {}", p(*symbol), p(*body)),
            None => format!("let {}", p(*symbol)),
        },
        Expr::Alloc { destination } => format!("alloc {}", p(*destination)),
        Expr::Call {
            name,
            read_args,
            write_args,
            ..
        } => format!("{name}({}; {})", list(read_args), list(write_args)),
        Expr::Block(stmts) => format!("{{ {} }}", list(stmts)),
        Expr::IfThenElse {
            condition,
            true_case,
            false_case,
        } => match false_case {
            Some(f) => format!("if {} {} else {}", p(*condition), p(*true_case), p(*f)),
            None => format!("if {} {}", p(*condition), p(*true_case)),
        },
        Expr::For {
            loop_var,
            min,
            extent,
            body,
        } => format!(
            "for {} in {}..+{} {}",
            p(*loop_var),
            p(*min),
            p(*extent),
            p(*body)
        ),
    }
}

fn write_stmt(out: &mut String, func: &LoweredFunc, h: Handle<Expr>, indent: usize) {
    let pad = "  ".repeat(indent);
    match func.exprs.try_get(h) {
        Some(Expr::Block(stmts)) => {
            for &s in stmts {
                write_stmt(out, func, s, indent);
            }
        }
        Some(Expr::IfThenElse {
            condition,
            true_case,
            false_case,
        }) => {
            let _ = writeln!(out, "{pad}if {} {{", format_expr(func, *condition));
            write_stmt(out, func, *true_case, indent + 1);
            if let Some(f) = false_case {
                let _ = writeln!(out, "{pad}}} else {{");
                write_stmt(out, func, *f, indent + 1);
            }
            let _ = writeln!(out, "{pad}}}");
        }
        Some(Expr::For {
            loop_var,
            min,
            extent,
            body,
        }) => {
            let _ = writeln!(
                out,
                "{pad}for {} in {}..+{} {{",
                format_expr(func, *loop_var),
                format_expr(func, *min),
                format_expr(func, *extent)
            );
            write_stmt(out, func, *body, indent + 1);
            let _ = writeln!(out, "{pad}}}");
        }
        _ => {
            let _ = writeln!(out, "{pad}{}", format_expr(func, h));
        }
    }
}

fn dump_function(out: &mut String, func: &LoweredFunc) {
    let args: Vec<String> = func
        .args
        .iter()
        .map(|arg| match arg {
            Argument::Buffer { buffer, io } => match func.buffers.try_get(*buffer) {
                Some(b) => format!("{io} {}: {}*", b.name, b.dtype),
                None => format!("{io} <bad buffer {buffer:?}>"),
            },
            Argument::Scalar { name, ty } => format!("{name}: {ty}"),
        })
        .collect();
    let _ = writeln!(out, "  fn {}({}) {{", func.name, args.join(", "));

    if let Some(info) = &func.axis_info {
        let dims = |hs: &[Handle<Expr>; 3]| {
            hs.iter()
                .map(|&h| format_expr(func, h))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let _ = writeln!(
            out,
            "    grid({}) block({})",
            dims(&info.grid_dims),
            dims(&info.block_dims)
        );
    }
    for &b in &func.temp_bufs {
        if let Some(buf) = func.buffers.try_get(b) {
            let shape: Vec<String> = buf.shape.iter().map(|&d| format_expr(func, d)).collect();
            let _ = writeln!(
                out,
                "    temp {}: {}[{}] @{}",
                buf.name,
                buf.dtype,
                shape.join(", "),
                buf.memory
            );
        }
    }
    for &a in &func.axis_aliases {
        write_stmt(out, func, a, 2);
    }
    write_stmt(out, func, func.body, 2);
    out.push_str("  }\n");
}

/// Dumps a module in a human-readable text format.
pub fn dump_module(module: &Module) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "module {} {{", module.name);
    for func in &module.functions {
        dump_function(&mut out, func);
    }
    out.push_str("}\n");
    out
}
