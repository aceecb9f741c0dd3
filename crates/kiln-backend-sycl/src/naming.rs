//! Kernel names, type spellings and extern function names.

use std::sync::atomic::{AtomicUsize, Ordering};

use kiln_ir::{Pointer, ScalarKind, Type};

use crate::error::CodegenError;

/// Hands out kernel-name ordinals.
///
/// SYCL identifies a kernel by the class named in `parallel_for<class ...>`,
/// so every emitted kernel needs a name unique across all modules loaded into
/// one program. Each module emission draws one ordinal and tags its kernels
/// `space<ordinal>_<function>`. Safe to share between threads.
#[derive(Debug, Default)]
pub struct KernelNamer {
    next: AtomicUsize,
}

impl KernelNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A namer whose first ordinal is `first`.
    pub fn starting_at(first: usize) -> Self {
        Self {
            next: AtomicUsize::new(first),
        }
    }

    /// Returns the next ordinal.
    pub fn next_ordinal(&self) -> usize {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Restarts numbering at zero.
    pub fn reset(&self) {
        self.next.store(0, Ordering::Relaxed);
    }
}

/// The `parallel_for` kernel class name of `func` for module ordinal `ordinal`.
pub fn kernel_name(ordinal: usize, func: &str) -> String {
    format!("space{ordinal}_{func}")
}

fn scalar_repr(ty: Type) -> Result<&'static str, CodegenError> {
    let repr = match (ty.kind, ty.bits) {
        (ScalarKind::Void, _) => "void",
        (ScalarKind::Bool, _) => "bool",
        (ScalarKind::Int, 8) => "int8_t",
        (ScalarKind::Int, 16) => "int16_t",
        (ScalarKind::Int, 32) => "int32_t",
        (ScalarKind::Int, 64) => "int64_t",
        (ScalarKind::UInt, 8) => "uint8_t",
        (ScalarKind::UInt, 16) => "uint16_t",
        (ScalarKind::UInt, 32) => "uint32_t",
        (ScalarKind::UInt, 64) => "uint64_t",
        (ScalarKind::Float, 16) => "float16",
        (ScalarKind::Float, 32) => "float",
        (ScalarKind::Float, 64) => "double",
        (ScalarKind::BFloat, 16) => "bfloat16",
        (ScalarKind::String, _) => "char*",
        _ => return Err(CodegenError::NotImplemented(format!("type {ty} in SYCL code"))),
    };
    Ok(repr)
}

/// SYCL spelling of `ty`.
///
/// Vectors are spelled `DataVec<T, lanes>`; pointers append `*`, with a
/// leading `const` for const pointers.
pub fn type_repr(ty: Type) -> Result<String, CodegenError> {
    let elem = scalar_repr(ty)?;
    let base = if ty.is_vector() {
        format!("DataVec<{elem}, {}>", ty.lanes)
    } else {
        elem.to_string()
    };
    Ok(match ty.pointer {
        Pointer::None => base,
        Pointer::Mut => format!("{base}*"),
        Pointer::Const => format!("const {base}*"),
    })
}

/// Name of the runtime-header function implementing `op` for `ty`,
/// e.g. `kiln_sycl_min_fp32`. Lanes are ignored; the helpers are overloaded
/// on vector types.
pub fn extern_func_name(ty: Type, op: &str) -> Result<String, CodegenError> {
    let suffix = match (ty.kind, ty.bits) {
        (ScalarKind::Float, 16) => "fp16",
        (ScalarKind::Float, 32) => "fp32",
        (ScalarKind::Float, 64) => "fp64",
        (ScalarKind::BFloat, 16) => "bf16",
        (ScalarKind::Int, 8) => "int8",
        (ScalarKind::Int, 16) => "int16",
        (ScalarKind::Int, 32) => "int32",
        (ScalarKind::Int, 64) => "int64",
        (ScalarKind::UInt, 8) => "uint8",
        (ScalarKind::UInt, 16) => "uint16",
        (ScalarKind::UInt, 32) => "uint32",
        (ScalarKind::UInt, 64) => "uint64",
        (ScalarKind::Bool, _) => "bool",
        _ => {
            return Err(CodegenError::NotImplemented(format!(
                "extern function `{op}` for type {ty}"
            )))
        }
    };
    Ok(format!("kiln_sycl_{op}_{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namer_counts_and_resets() {
        let namer = KernelNamer::new();
        assert_eq!(namer.next_ordinal(), 0);
        assert_eq!(namer.next_ordinal(), 1);
        namer.reset();
        assert_eq!(namer.next_ordinal(), 0);
        assert_eq!(KernelNamer::starting_at(45).next_ordinal(), 45);
    }

    #[test]
    fn namer_is_unique_across_threads() {
        let namer = std::sync::Arc::new(KernelNamer::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let namer = namer.clone();
                std::thread::spawn(move || (0..100).map(|_| namer.next_ordinal()).collect::<Vec<_>>())
            })
            .collect();
        let mut all: Vec<usize> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 400);
    }

    #[test]
    fn kernel_names() {
        assert_eq!(kernel_name(2, "fn_tan_0_kernel"), "space2_fn_tan_0_kernel");
    }

    #[test]
    fn scalar_and_pointer_types() {
        assert_eq!(type_repr(Type::F32).unwrap(), "float");
        assert_eq!(type_repr(Type::F64).unwrap(), "double");
        assert_eq!(type_repr(Type::F16).unwrap(), "float16");
        assert_eq!(type_repr(Type::BF16).unwrap(), "bfloat16");
        assert_eq!(type_repr(Type::I64).unwrap(), "int64_t");
        assert_eq!(type_repr(Type::U8).unwrap(), "uint8_t");
        assert_eq!(type_repr(Type::BOOL).unwrap(), "bool");
        assert_eq!(type_repr(Type::F32.pointer_to()).unwrap(), "float*");
        assert_eq!(type_repr(Type::F32.const_pointer_to()).unwrap(), "const float*");
    }

    #[test]
    fn vector_types() {
        assert_eq!(
            type_repr(Type::F32.with_lanes(4)).unwrap(),
            "DataVec<float, 4>"
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(matches!(
            type_repr(Type::UNKNOWN),
            Err(CodegenError::NotImplemented(_))
        ));
    }

    #[test]
    fn extern_names() {
        assert_eq!(extern_func_name(Type::F32, "min").unwrap(), "kiln_sycl_min_fp32");
        assert_eq!(extern_func_name(Type::I64, "max").unwrap(), "kiln_sycl_max_int64");
        assert_eq!(
            extern_func_name(Type::F16.with_lanes(8), "max").unwrap(),
            "kiln_sycl_max_fp16"
        );
        assert!(extern_func_name(Type::VOID, "min").is_err());
    }
}
