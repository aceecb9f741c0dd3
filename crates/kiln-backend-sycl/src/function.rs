//! Per-function SYCL wrapper emission.
//!
//! Each lowered function becomes a host-callable packed function that
//! unpacks its arguments from `void_args`, submits one `parallel_for` to the
//! queue and runs the kernel body inside it.

use kiln_ir::{Argument, Expr, LoweredFunc};

use crate::alias::buffer_alias_lets;
use crate::error::CodegenError;
use crate::naming::{kernel_name, type_repr};
use crate::placement::alloc_temp_buffers;
use crate::translate::Translator;

/// Parameter list shared by every packed function.
pub(crate) const PACKED_PARAMS: &str =
    "sycl::queue &Q, sycl::range<3> dimGrid, sycl::range<3> dimBlock, void** void_args";

const BANNER: &str = "// Kiln: auto-generated SYCL packed function\n";

/// Emits the packed function for `func`, naming its kernel class after
/// module ordinal `ordinal`.
pub(crate) fn emit_function(func: &LoweredFunc, ordinal: usize) -> Result<String, CodegenError> {
    log::debug!("emitting SYCL kernel for `{}`", func.name);
    let mut t = Translator::new(func);
    t.push(BANNER);
    t.push(&format!("void {}({PACKED_PARAMS}) {{\n", func.name));
    t.inc_indent();
    emit_prologue(&mut t)?;

    t.do_indent();
    t.push("Q.submit([&](sycl::handler &h) {\n");
    t.inc_indent();
    t.do_indent();
    t.push(&format!(
        "h.parallel_for<class {}>(sycl::nd_range<3>(dimGrid * dimBlock, dimBlock), \
         [=](sycl::nd_item<3> item) [[intel::kernel_args_restrict]]",
        kernel_name(ordinal, &func.name)
    ));
    if let Some(bound) = launch_bound(func) {
        t.push(&bound);
    }
    t.push("\n");
    emit_body(&mut t)?;
    t.push(");\n");
    t.dec_indent();
    t.do_indent();
    t.push("});\n");
    t.dec_indent();
    t.push("}\n");
    Ok(t.into_output())
}

/// One local per argument, bound from `void_args` by position.
fn emit_prologue(t: &mut Translator<'_>) -> Result<(), CodegenError> {
    let func = t.func;
    for (i, arg) in func.args.iter().enumerate() {
        t.do_indent();
        match arg {
            Argument::Buffer { buffer, .. } => {
                let buffer = &func.buffers[*buffer];
                let elem = type_repr(buffer.dtype.element_of())?;
                let qualifier = if arg.is_input_only() { "const " } else { "" };
                t.push(&format!(
                    "{qualifier}{elem}* {} = ({elem}*)(*(void **)(void_args[{i}]));\n",
                    buffer.tensor_name()
                ));
            }
            Argument::Scalar { name, ty } => {
                let repr = type_repr(*ty)?;
                t.push(&format!("{repr} {name} = *({repr}*)(void_args[{i}]);\n"));
            }
        }
    }
    Ok(())
}

/// `[[intel::max_work_group_size(x, y, z)]]` when every block dimension is
/// a literal.
fn launch_bound(func: &LoweredFunc) -> Option<String> {
    let info = func.axis_info.as_ref()?;
    let mut dims = [0u64; 3];
    for (dim, &h) in dims.iter_mut().zip(&info.block_dims) {
        *dim = match func.exprs[h] {
            Expr::IntImm { value, .. } => u64::try_from(value).ok()?,
            Expr::UIntImm { value, .. } => value,
            _ => return None,
        };
    }
    let [x, y, z] = dims;
    Some(format!("[[intel::max_work_group_size({x}, {y}, {z})]]"))
}

fn emit_body(t: &mut Translator<'_>) -> Result<(), CodegenError> {
    let func = t.func;
    let mut stmts = alloc_temp_buffers(func, &mut t.exprs);
    stmts.extend(buffer_alias_lets(func, &mut t.exprs));
    stmts.extend(func.axis_aliases.iter().copied());
    stmts.push(func.body);
    let merged = t.exprs.append(Expr::Block(stmts));
    let mut body = kiln_opt::simplify_blocks(&mut t.exprs, merged);
    if !matches!(t.exprs[body], Expr::Block(_)) {
        body = t.exprs.append(Expr::Block(vec![body]));
    }
    t.do_indent();
    t.emit(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_ir::{ArgIo, FuncBuilder, MemoryType, Type};

    #[test]
    fn prologue_binds_arguments_by_position() {
        let mut b = FuncBuilder::new("k");
        let x = b.buffer("_x", Type::F32, &[4], MemoryType::Heap);
        let y = b.buffer("_y", Type::I64, &[4], MemoryType::Heap);
        b.arg_buffer(x, ArgIo::Input);
        b.arg_scalar("n", Type::I32);
        b.arg_buffer(y, ArgIo::InputOutput);
        let body = b.block(Vec::new());
        let func = b.finish(body);
        let mut t = Translator::new(&func);
        emit_prologue(&mut t).unwrap();
        assert_eq!(
            t.into_output(),
            "const float* x = (float*)(*(void **)(void_args[0]));\n\
             int32_t n = *(int32_t*)(void_args[1]);\n\
             int64_t* y = (int64_t*)(*(void **)(void_args[2]));\n"
        );
    }

    #[test]
    fn launch_bound_needs_constant_block_dims() {
        let mut b = FuncBuilder::new("k");
        b.launch([4, 1, 1], [128, 2, 1]);
        let body = b.block(Vec::new());
        let func = b.finish(body);
        assert_eq!(
            launch_bound(&func).as_deref(),
            Some("[[intel::max_work_group_size(128, 2, 1)]]")
        );

        let mut b = FuncBuilder::new("k");
        let one = b.int(1);
        let n = b.var("n", Type::I32);
        b.axis_info([one, one, one], [n, one, one]);
        let body = b.block(Vec::new());
        assert_eq!(launch_bound(&b.finish(body)), None);

        let mut b = FuncBuilder::new("k");
        let body = b.block(Vec::new());
        assert_eq!(launch_bound(&b.finish(body)), None);
    }

    #[test]
    fn empty_body_still_emits_a_block() {
        let mut b = FuncBuilder::new("noop");
        let body = b.block(Vec::new());
        let func = b.finish(body);
        let src = emit_function(&func, 3).unwrap();
        assert!(src.contains("h.parallel_for<class space3_noop>"));
        assert!(src.contains("[[intel::kernel_args_restrict]]\n    {\n    });\n  });\n}\n"));
    }

    #[test]
    fn bare_statement_body_is_wrapped() {
        let mut b = FuncBuilder::new("k");
        let call = b.expr(Expr::Call {
            name: "__syncthreads".into(),
            ty: Type::VOID,
            read_args: Vec::new(),
            write_args: Vec::new(),
        });
        let func = b.finish(call);
        let src = emit_function(&func, 0).unwrap();
        assert!(src.contains("    {\n      sycl::group_barrier(item.get_group());\n    });\n"));
    }
}
