//! Expression and statement translation to SYCL.
//!
//! A single depth-first pass over one function's nodes. The translator owns a
//! clone of the function's expression arena so it can append the nodes it
//! synthesizes (flat offsets, buffer sizes, prologue statements) without
//! touching the input.

use std::collections::HashSet;

use kiln_ir::{Arena, BinaryOp, Expr, Handle, LoweredFunc, Type, TypeOf, UnaryOp};

use crate::error::CodegenError;
use crate::literal;
use crate::memo::IndexMemo;
use crate::naming::{extern_func_name, type_repr};

const BARRIER: &str = "__syncthreads";
const REDUCE_MARKERS: [&str; 2] = ["kiln_block_reduce", "kiln_warp_reduce"];

pub(crate) struct Translator<'f> {
    pub(crate) func: &'f LoweredFunc,
    pub(crate) exprs: Arena<Expr>,
    /// Tensors held in registers; loads and stores use the bare name.
    locals: HashSet<String>,
    memo: IndexMemo,
    out: String,
    indent: usize,
}

impl<'f> Translator<'f> {
    pub(crate) fn new(func: &'f LoweredFunc) -> Self {
        Self {
            func,
            exprs: func.exprs.clone(),
            locals: HashSet::new(),
            memo: IndexMemo::default(),
            out: String::new(),
            indent: 0,
        }
    }

    pub(crate) fn into_output(self) -> String {
        self.out
    }

    pub(crate) fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    pub(crate) fn inc_indent(&mut self) {
        self.indent += 1;
    }

    pub(crate) fn dec_indent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub(crate) fn do_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    pub(crate) fn type_of(&self, h: Handle<Expr>) -> Type {
        TypeOf::new(&self.exprs, &self.func.tensors, &self.func.buffers).get(h)
    }

    /// Emits the node at `h`.
    pub(crate) fn emit(&mut self, h: Handle<Expr>) -> Result<(), CodegenError> {
        match self.exprs[h].clone() {
            Expr::IntImm { ty, value } => self.push(&literal::int_literal(ty, value)),
            Expr::UIntImm { ty, value } => self.push(&literal::uint_literal(ty, value)),
            Expr::FloatImm { ty, value } => self.push(&literal::float_literal(ty, value)),
            Expr::StringImm(s) => self.push(&literal::string_literal(&s)),
            Expr::Var { name, .. } => self.emit_var(&name)?,
            Expr::Tensor(t) => {
                let func = self.func;
                self.push(&func.tensors[t].name);
            }
            Expr::Buffer(b) => {
                let func = self.func;
                self.push(&func.buffers[b].name);
            }
            Expr::Unary { op, value } => {
                self.push(match op {
                    UnaryOp::Minus => "(-",
                    UnaryOp::Not => "(!",
                });
                self.emit(value)?;
                self.push(")");
            }
            Expr::Binary { op, a, b } => {
                self.push("(");
                self.emit(a)?;
                self.push(" ");
                self.push(op.symbol());
                self.push(" ");
                self.emit(b)?;
                self.push(")");
            }
            Expr::Min { a, b } => self.emit_extern_binary(h, "min", a, b)?,
            Expr::Max { a, b } => self.emit_extern_binary(h, "max", a, b)?,
            Expr::Cast { ty, value } => self.emit_cast(ty, value)?,
            Expr::Select {
                condition,
                true_value,
                false_value,
            } => {
                self.push("kiln_sycl_select(");
                self.emit(condition)?;
                self.push(", ");
                self.emit(true_value)?;
                self.push(", ");
                self.emit(false_value)?;
                self.push(")");
            }
            Expr::Ramp {
                base,
                stride,
                lanes,
            } => {
                if self.exprs[stride].as_int() != Some(1) {
                    return Err(CodegenError::NotImplemented(format!(
                        "ramp with non-unit stride in `{}`",
                        self.func.name
                    )));
                }
                self.push(&format!("IndexVec<{lanes}>::Ramp("));
                self.emit(base)?;
                self.push(")");
            }
            Expr::Broadcast { value, .. } => self.emit(value)?,
            Expr::Load { tensor, indices } => self.emit_load(h, tensor, &indices)?,
            Expr::Store {
                tensor,
                value,
                indices,
            } => self.emit_store(h, tensor, value, &indices)?,
            Expr::Let { symbol, body } => self.emit_let(symbol, body)?,
            Expr::Alloc { destination } => match self.exprs[destination] {
                Expr::Buffer(b) => self.emit_temp_buffer(b)?,
                ref other => return Err(CodegenError::AllocWithoutBuffer(other.kind_name())),
            },
            Expr::Call {
                name,
                read_args,
                write_args,
                ..
            } => self.emit_call(&name, &read_args, &write_args)?,
            Expr::Block(stmts) => self.emit_block(&stmts)?,
            Expr::IfThenElse {
                condition,
                true_case,
                false_case,
            } => {
                self.push("if (");
                self.emit(condition)?;
                self.push(") ");
                self.emit_branch(true_case)?;
                if let Some(false_case) = false_case {
                    self.push(" else ");
                    self.emit_branch(false_case)?;
                }
            }
            Expr::For {
                loop_var,
                min,
                extent,
                body,
            } => self.emit_for(loop_var, min, extent, body)?,
        }
        Ok(())
    }

    fn emit_var(&mut self, name: &str) -> Result<(), CodegenError> {
        let accessor = if name.starts_with("threadIdx") {
            "get_local_id"
        } else if name.starts_with("blockIdx") {
            "get_group"
        } else {
            self.push(name);
            return Ok(());
        };
        // SYCL's fastest-varying dimension is the last one.
        let dim = match name.chars().last() {
            Some('x') => 2,
            Some('y') => 1,
            Some('z') => 0,
            _ => return Err(CodegenError::UnknownAxis(name.to_string())),
        };
        self.push(&format!("(int)item.{accessor}({dim})"));
        Ok(())
    }

    fn emit_extern_binary(
        &mut self,
        node: Handle<Expr>,
        op: &str,
        a: Handle<Expr>,
        b: Handle<Expr>,
    ) -> Result<(), CodegenError> {
        let name = extern_func_name(self.type_of(node), op)?;
        self.push(&name);
        self.push("(");
        self.emit(a)?;
        self.push(", ");
        self.emit(b)?;
        self.push(")");
        Ok(())
    }

    fn emit_cast(&mut self, ty: Type, value: Handle<Expr>) -> Result<(), CodegenError> {
        let src = self.type_of(value);
        if src.is_vector() {
            // bool vectors share one representation before and after the cast
            if src.is_bool() {
                return self.emit(value);
            }
            let elem = type_repr(ty.element_of())?;
            self.push(&format!("kiln_sycl_cast<{elem}>("));
            self.emit(value)?;
            self.push(")");
        } else {
            let repr = type_repr(ty)?;
            self.push(&format!("(({repr})("));
            self.emit(value)?;
            self.push("))");
        }
        Ok(())
    }

    fn emit_load(
        &mut self,
        node: Handle<Expr>,
        tensor: Handle<Expr>,
        indices: &[Handle<Expr>],
    ) -> Result<(), CodegenError> {
        let func = self.func;
        let t = match self.exprs[tensor] {
            Expr::Tensor(t) => t,
            ref other => {
                return Err(CodegenError::NotImplemented(format!(
                    "load from a {} node",
                    other.kind_name()
                )))
            }
        };
        let info = &func.tensors[t];
        let exprs = &mut self.exprs;
        let offset = self
            .memo
            .load(node, || kiln_opt::flat_offset(exprs, &info.shape, indices));

        if self.locals.contains(&info.name) {
            self.push(&info.name);
            return Ok(());
        }

        let offset_ty = self.type_of(offset);
        if offset_ty.is_vector() {
            let elem = type_repr(info.dtype.element_of())?;
            self.push(&format!(
                "DataVec<{elem}, {}>::Load({}, ",
                offset_ty.lanes, info.name
            ));
            match self.dense_ramp_start(offset) {
                Some(start) => self.emit(start)?,
                None => self.emit(offset)?,
            }
            self.push(")");
        } else {
            self.push(&info.name);
            self.push("[");
            self.emit(offset)?;
            self.push("]");
        }
        Ok(())
    }

    fn emit_store(
        &mut self,
        node: Handle<Expr>,
        tensor: Handle<Expr>,
        value: Handle<Expr>,
        indices: &[Handle<Expr>],
    ) -> Result<(), CodegenError> {
        let func = self.func;
        let t = match self.exprs[tensor] {
            Expr::Tensor(t) => t,
            ref other => return Err(CodegenError::StoreToNonTensor(other.kind_name())),
        };
        let info = &func.tensors[t];
        let exprs = &mut self.exprs;
        let offset = self
            .memo
            .store(node, || kiln_opt::flat_offset(exprs, &info.shape, indices));

        if self.locals.contains(&info.name) {
            self.push(&format!("auto {} = ", info.name));
            return self.emit(value);
        }
        self.push(&format!("kiln_sycl_store({}, ", info.name));
        self.emit(offset)?;
        self.push(", ");
        self.emit(value)?;
        self.push(")");
        Ok(())
    }

    /// Start offset of a contiguous vector access, if `offset` is provably
    /// one: a unit-stride ramp, possibly shifted by scalar or broadcast terms.
    fn dense_ramp_start(&mut self, offset: Handle<Expr>) -> Option<Handle<Expr>> {
        match self.exprs[offset] {
            Expr::Ramp { base, stride, .. } => {
                (self.exprs[stride].as_int() == Some(1)).then_some(base)
            }
            Expr::Binary {
                op: BinaryOp::Add,
                a,
                b,
            } => {
                let (start, shift) = match (self.dense_ramp_start(a), self.scalar_term(b)) {
                    (Some(start), Some(shift)) => (start, shift),
                    _ => (self.dense_ramp_start(b)?, self.scalar_term(a)?),
                };
                let sum = self.exprs.append(Expr::Binary {
                    op: BinaryOp::Add,
                    a: start,
                    b: shift,
                });
                Some(kiln_opt::simplify(&mut self.exprs, sum))
            }
            _ => None,
        }
    }

    fn scalar_term(&self, h: Handle<Expr>) -> Option<Handle<Expr>> {
        match self.exprs[h] {
            Expr::Broadcast { value, .. } => Some(value),
            _ if !self.type_of(h).is_vector() => Some(h),
            _ => None,
        }
    }

    fn emit_let(
        &mut self,
        symbol: Handle<Expr>,
        body: Option<Handle<Expr>>,
    ) -> Result<(), CodegenError> {
        let (name, ty) = match &self.exprs[symbol] {
            Expr::Var { name, ty } => (name.clone(), *ty),
            other => {
                return Err(CodegenError::NotImplemented(format!(
                    "let binding a {} node",
                    other.kind_name()
                )))
            }
        };
        log::trace!("let `{name}`: {ty}");
        if !ty.is_valid() {
            return Err(CodegenError::InvalidLetType(name));
        }
        if ty.is_pointer() {
            self.push(&format!("{} {name}", type_repr(ty)?));
            if let Some(body) = body {
                self.push(" = ");
                self.emit(body)?;
            }
        } else {
            self.locals.insert(name);
        }
        Ok(())
    }

    fn emit_call(
        &mut self,
        name: &str,
        read_args: &[Handle<Expr>],
        write_args: &[Handle<Expr>],
    ) -> Result<(), CodegenError> {
        log::trace!(
            "call `{name}` with {} read and {} write args",
            read_args.len(),
            write_args.len()
        );
        if name == BARRIER {
            self.push("sycl::group_barrier(item.get_group())");
            return Ok(());
        }
        self.push(name);
        self.push("(");
        for (i, &arg) in read_args.iter().chain(write_args).enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.emit(arg)?;
        }
        // cross-item reductions need the nd_item
        if REDUCE_MARKERS.iter().any(|m| name.contains(m)) {
            self.push(", item");
        }
        self.push(")");
        Ok(())
    }

    /// Emits `{`, one line per statement ending in `;`, then `}`.
    /// Statements that print nothing (local registrations, register
    /// buffers) do not leave an empty line.
    pub(crate) fn emit_block(&mut self, stmts: &[Handle<Expr>]) -> Result<(), CodegenError> {
        self.push("{\n");
        self.inc_indent();
        for &stmt in stmts {
            let line_start = self.out.len();
            self.do_indent();
            let text_start = self.out.len();
            self.emit(stmt)?;
            if self.out.len() == text_start {
                self.out.truncate(line_start);
            } else {
                self.push(";\n");
            }
        }
        self.dec_indent();
        self.do_indent();
        self.push("}");
        Ok(())
    }

    fn emit_branch(&mut self, h: Handle<Expr>) -> Result<(), CodegenError> {
        match &self.exprs[h] {
            Expr::Block(stmts) => {
                let stmts = stmts.clone();
                self.emit_block(&stmts)
            }
            _ => self.emit_block(&[h]),
        }
    }

    fn emit_for(
        &mut self,
        loop_var: Handle<Expr>,
        min: Handle<Expr>,
        extent: Handle<Expr>,
        body: Handle<Expr>,
    ) -> Result<(), CodegenError> {
        let repr = type_repr(self.type_of(loop_var))?;
        let end = if self.exprs[min].as_int() == Some(0) {
            extent
        } else {
            let sum = self.exprs.append(Expr::Binary {
                op: BinaryOp::Add,
                a: min,
                b: extent,
            });
            kiln_opt::simplify(&mut self.exprs, sum)
        };
        self.push(&format!("for ({repr} "));
        self.emit(loop_var)?;
        self.push(" = ");
        self.emit(min)?;
        self.push("; ");
        self.emit(loop_var)?;
        self.push(" < ");
        self.emit(end)?;
        self.push("; ");
        self.emit(loop_var)?;
        self.push(" += 1) ");
        self.emit_branch(body)
    }
}
