//! SYCL source backend for Kiln.
//!
//! Turns lowered kernels into SYCL C++ for data-parallel devices. Each
//! function becomes a packed host entry point that unpacks its arguments
//! from `void_args` and submits one `parallel_for` over an `nd_range<3>`:
//!
//! ```text
//! void fn_k(sycl::queue &Q, sycl::range<3> dimGrid, sycl::range<3> dimBlock, void** void_args) {
//!   float* out = (float*)(*(void **)(void_args[0]));
//!   Q.submit([&](sycl::handler &h) {
//!     h.parallel_for<class space0_fn_k>(...)
//!     { ... });
//!   });
//! }
//! ```
//!
//! [`CodeGenSycl`] is the generator proper; [`SyclBackend`] plugs it into a
//! [`kiln_backend_core::BackendRegistry`].

mod alias;
mod error;
mod function;
mod literal;
mod memo;
mod module;
mod naming;
mod placement;
mod translate;

use kiln_backend_core::{
    Backend, BackendError, BackendOptions, BackendOutput, Diagnostic, DiagnosticLevel,
    OutputFile, OutputKind,
};
use kiln_ir::{Module, Target};

pub use error::CodegenError;
pub use literal::{float_literal, int_literal, string_literal, uint_literal};
pub use module::CodeGenSycl;
pub use naming::{extern_func_name, kernel_name, type_repr, KernelNamer};

/// SYCL backend.
///
/// Owns the kernel-name counter for every module it compiles, so kernel
/// class names stay unique across modules compiled by the same instance.
#[derive(Debug, Default)]
pub struct SyclBackend {
    namer: KernelNamer,
}

impl SyclBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend drawing kernel ordinals from `namer`.
    pub fn with_namer(namer: KernelNamer) -> Self {
        Self { namer }
    }

    pub fn namer(&self) -> &KernelNamer {
        &self.namer
    }
}

impl Backend for SyclBackend {
    fn name(&self) -> &str {
        "SYCL"
    }

    fn targets(&self) -> &[&str] {
        &["sycl", "dpcpp"]
    }

    fn compile(
        &self,
        module: &Module,
        opts: &BackendOptions,
    ) -> Result<BackendOutput, BackendError> {
        let codegen = CodeGenSycl::new(Target::sycl())?.runtime_compile(opts.runtime_compile);
        let source = codegen.compile(module, opts.output_kind, &self.namer)?;
        let ext = match opts.output_kind {
            OutputKind::Implementation => "cc",
            OutputKind::Header => "h",
        };
        Ok(BackendOutput {
            files: vec![OutputFile {
                name: format!("{}.{ext}", module.name),
                content: source,
            }],
            diagnostics: vec![Diagnostic {
                level: DiagnosticLevel::Info,
                message: format!(
                    "{} kernel(s) emitted; include kiln_sycl_runtime_source.h when compiling",
                    module.functions.len()
                ),
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_backend_core::BackendRegistry;
    use kiln_ir::{FuncBuilder, IrError};

    fn empty_module() -> Module {
        let mut b = FuncBuilder::new("fn_noop_kernel");
        let body = b.block(Vec::new());
        Module {
            name: "noop".into(),
            functions: vec![b.finish(body)],
        }
    }

    #[test]
    fn backend_metadata() {
        let backend = SyclBackend::new();
        assert_eq!(backend.name(), "SYCL");
        assert!(backend.targets().contains(&"sycl"));
        assert!(backend.targets().contains(&"dpcpp"));
    }

    #[test]
    fn registry_dispatch() {
        let mut reg = BackendRegistry::with_builtins();
        reg.register(Box::new(SyclBackend::new()));
        assert_eq!(reg.find("dpcpp").map(|b| b.name()), Some("SYCL"));
        assert_eq!(reg.list_targets(), vec!["ir-dump", "ir", "sycl", "dpcpp"]);
    }

    #[test]
    fn implementation_file() {
        let output = SyclBackend::new()
            .compile(&empty_module(), &BackendOptions::default())
            .unwrap();
        assert_eq!(output.files.len(), 1);
        assert_eq!(output.files[0].name, "noop.cc");
        let text = &output.files[0].content;
        assert!(text.contains("void fn_noop_kernel(sycl::queue &Q"));
        assert_eq!(output.diagnostics[0].level, DiagnosticLevel::Info);
    }

    #[test]
    fn header_file() {
        let opts = BackendOptions {
            output_kind: OutputKind::Header,
            runtime_compile: false,
        };
        let output = SyclBackend::new().compile(&empty_module(), &opts).unwrap();
        assert_eq!(output.files[0].name, "noop.h");
    }

    #[test]
    fn header_with_runtime_compile_is_unsupported() {
        let opts = BackendOptions {
            output_kind: OutputKind::Header,
            runtime_compile: true,
        };
        let err = SyclBackend::new()
            .compile(&empty_module(), &opts)
            .unwrap_err();
        assert!(matches!(err, BackendError::Unsupported(_)));
    }

    #[test]
    fn invalid_module_maps_to_invalid() {
        let mut module = empty_module();
        module.functions.push(module.functions[0].clone());
        let err = SyclBackend::new()
            .compile(&module, &BackendOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            BackendError::Invalid(IrError::DuplicateFunction(_))
        ));
    }

    #[test]
    fn instance_counter_advances() {
        let backend = SyclBackend::with_namer(KernelNamer::starting_at(7));
        backend
            .compile(&empty_module(), &BackendOptions::default())
            .unwrap();
        assert_eq!(backend.namer().next_ordinal(), 8);
    }
}
