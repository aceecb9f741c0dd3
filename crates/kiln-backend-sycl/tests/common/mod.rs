use kiln_backend_core::OutputKind;
use kiln_backend_sycl::{CodeGenSycl, KernelNamer};
use kiln_ir::{ArgIo, BinaryOp, Expr, FuncBuilder, Handle, LoweredFunc, MemoryType, Module, Target, Type};

#[allow(dead_code)]
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Wraps a single function in a module named after it.
#[allow(dead_code)]
pub fn module_of(func: LoweredFunc) -> Module {
    Module {
        name: func.name.clone(),
        functions: vec![func],
    }
}

/// Compiles `module` as an implementation with a fresh kernel namer.
#[allow(dead_code)]
pub fn compile(module: &Module) -> String {
    compile_with(module, &KernelNamer::new())
}

#[allow(dead_code)]
pub fn compile_with(module: &Module, namer: &KernelNamer) -> String {
    init_logger();
    CodeGenSycl::new(Target::sycl())
        .expect("sycl target")
        .compile(module, OutputKind::Implementation, namer)
        .expect("sycl codegen failed")
}

/// Declares an output argument `name` backed by heap buffer `_name`.
#[allow(dead_code)]
pub fn output_arg(b: &mut FuncBuilder, name: &str, dtype: Type, shape: &[i64]) -> Handle<Expr> {
    let buf = b.buffer(&format!("_{name}"), dtype, shape, MemoryType::Heap);
    b.arg_buffer(buf, ArgIo::Output);
    b.tensor(name, dtype, shape, Some(buf))
}

/// `if (threadIdx.x < 6) { var[threadIdx.x] = 1.0 }` over a 6-element output,
/// launched as (1, 1, 1) x (6, 1, 1).
#[allow(dead_code)]
pub fn arange_kernel() -> LoweredFunc {
    let mut b = FuncBuilder::new("fn_arange_0_kernel");
    let var = output_arg(&mut b, "var", Type::F32, &[6]);
    b.launch([1, 1, 1], [6, 1, 1]);
    let tx = b.var("threadIdx.x", Type::I32);
    let six = b.int(6);
    let cond = b.binary(BinaryOp::Lt, tx, six);
    let one = b.float(1.0);
    let st = b.store(var, one, vec![tx]);
    let then = b.block(vec![st]);
    let ite = b.expr(Expr::IfThenElse {
        condition: cond,
        true_case: then,
        false_case: None,
    });
    let body = b.block(vec![ite]);
    b.finish(body)
}

/// Transposes an 8x8 tile through a work-group shared buffer.
#[allow(dead_code)]
pub fn shared_tile_kernel() -> LoweredFunc {
    let mut b = FuncBuilder::new("fn_transpose_kernel");
    let input = b.buffer("_x", Type::F32, &[8, 8], MemoryType::Heap);
    b.arg_buffer(input, ArgIo::Input);
    let x = b.tensor("x", Type::F32, &[8, 8], Some(input));
    let y = output_arg(&mut b, "y", Type::F32, &[8, 8]);
    let shm = b.buffer("_tile", Type::F32, &[8, 8], MemoryType::GpuShared);
    b.temp_buf(shm);
    let tile = b.tensor("tile", Type::F32, &[8, 8], Some(shm));
    b.launch([1, 1, 1], [8, 8, 1]);

    let tx = b.var("threadIdx.x", Type::I32);
    let ty = b.var("threadIdx.y", Type::I32);
    let ld = b.load(x, vec![ty, tx]);
    let fill = b.store(tile, ld, vec![ty, tx]);
    let sync = b.expr(Expr::Call {
        name: "__syncthreads".into(),
        ty: Type::VOID,
        read_args: Vec::new(),
        write_args: Vec::new(),
    });
    let back = b.load(tile, vec![tx, ty]);
    let drain = b.store(y, back, vec![ty, tx]);
    let body = b.block(vec![fill, sync, drain]);
    b.finish(body)
}

/// Two tensors `a` and `b` sharing one shared buffer `buf`.
#[allow(dead_code)]
pub fn aliased_kernel() -> LoweredFunc {
    let mut b = FuncBuilder::new("fn_alias_kernel");
    let out = output_arg(&mut b, "out", Type::F32, &[16]);
    let buf = b.buffer("buf", Type::F32, &[16], MemoryType::GpuShared);
    b.temp_buf(buf);
    let ta = b.tensor("a", Type::F32, &[16], Some(buf));
    let tb = b.tensor("b", Type::F32, &[16], Some(buf));
    b.launch([1, 1, 1], [16, 1, 1]);

    let tx = b.var("threadIdx.x", Type::I32);
    let one = b.float(1.0);
    let init = b.store(ta, one, vec![tx]);
    let la = b.load(ta, vec![tx]);
    let copy = b.store(tb, la, vec![tx]);
    let lb = b.load(tb, vec![tx]);
    let la2 = b.load(ta, vec![tx]);
    let sum = b.binary(BinaryOp::Add, lb, la2);
    let write = b.store(out, sum, vec![tx]);
    let body = b.block(vec![init, copy, write]);
    b.finish(body)
}

/// A barrier call that carries stray arguments.
#[allow(dead_code)]
pub fn barrier_kernel() -> LoweredFunc {
    let mut b = FuncBuilder::new("fn_barrier_kernel");
    b.launch([1, 1, 1], [32, 1, 1]);
    let tx = b.var("threadIdx.x", Type::I32);
    let zero = b.int(0);
    let sync = b.expr(Expr::Call {
        name: "__syncthreads".into(),
        ty: Type::VOID,
        read_args: vec![tx, zero],
        write_args: vec![tx],
    });
    let body = b.block(vec![sync]);
    b.finish(body)
}

/// Copies four contiguous floats per work-item.
#[allow(dead_code)]
pub fn vector_copy_kernel() -> LoweredFunc {
    let mut b = FuncBuilder::new("fn_vcopy_kernel");
    let input = b.buffer("_a", Type::F32, &[256], MemoryType::Heap);
    b.arg_buffer(input, ArgIo::Input);
    let a = b.tensor("a", Type::F32, &[256], Some(input));
    let out = output_arg(&mut b, "o", Type::F32, &[256]);
    b.launch([1, 1, 1], [64, 1, 1]);

    let tx = b.var("threadIdx.x", Type::I32);
    let four = b.int(4);
    let base = b.binary(BinaryOp::Mul, tx, four);
    let one = b.int(1);
    let ramp = b.expr(Expr::Ramp {
        base,
        stride: one,
        lanes: 4,
    });
    let ld = b.load(a, vec![ramp]);
    let st = b.store(out, ld, vec![ramp]);
    let body = b.block(vec![st]);
    b.finish(body)
}

/// Work-group x dimension bound to the scalar argument `n`.
#[allow(dead_code)]
pub fn symbolic_launch_kernel() -> LoweredFunc {
    let mut b = FuncBuilder::new("fn_dyn_kernel");
    let out = output_arg(&mut b, "out", Type::F32, &[1024]);
    b.arg_scalar("n", Type::I32);
    let n = b.var("n", Type::I32);
    let one = b.int(1);
    let four = b.int(4);
    b.axis_info([four, one, one], [n, one, one]);
    let tx = b.var("threadIdx.x", Type::I32);
    let zero = b.float(0.0);
    let st = b.store(out, zero, vec![tx]);
    let body = b.block(vec![st]);
    b.finish(body)
}
