//! Module-level source assembly.

use kiln_backend_core::OutputKind;
use kiln_ir::{Language, LoweredFunc, Module, Target};

use crate::error::CodegenError;
use crate::function::{emit_function, PACKED_PARAMS};
use crate::naming::KernelNamer;

const INCLUDES: &str = "#include <sycl/sycl.hpp>\n#include \"kiln_sycl_runtime_source.h\"\n";
const PREAMBLE: &str = "typedef sycl::half float16;\n";
const EXTERN_C_OPEN: &str = "#ifdef __cplusplus\nextern \"C\" {\n#endif\n";
const EXTERN_C_CLOSE: &str = "\n#ifdef __cplusplus\n}\n#endif\n";

/// SYCL source generator for lowered modules.
///
/// ```
/// use kiln_backend_core::OutputKind;
/// use kiln_backend_sycl::{CodeGenSycl, KernelNamer};
/// use kiln_ir::{Module, Target};
///
/// let codegen = CodeGenSycl::new(Target::sycl()).unwrap();
/// let module = Module { name: "empty".into(), functions: Vec::new() };
/// let header = codegen
///     .compile(&module, OutputKind::Header, &KernelNamer::new())
///     .unwrap();
/// assert!(header.starts_with("#pragma once\n"));
/// ```
#[derive(Clone, Debug)]
pub struct CodeGenSycl {
    target: Target,
    runtime_compile: bool,
}

impl CodeGenSycl {
    /// Creates a generator for `target`, which must be a SYCL target.
    pub fn new(target: Target) -> Result<Self, CodegenError> {
        if target.language != Language::Sycl {
            return Err(CodegenError::InvalidTarget(target));
        }
        Ok(Self {
            target,
            runtime_compile: false,
        })
    }

    /// Wraps emitted functions in C linkage for runtime compilation.
    pub fn runtime_compile(mut self, enabled: bool) -> Self {
        self.runtime_compile = enabled;
        self
    }

    pub fn target(&self) -> Target {
        self.target
    }

    /// Emits `module` as a single source string.
    ///
    /// The module is validated first. Any error aborts the whole module;
    /// partial output is never returned. Implementation output draws one
    /// ordinal from `namer`.
    pub fn compile(
        &self,
        module: &Module,
        kind: OutputKind,
        namer: &KernelNamer,
    ) -> Result<String, CodegenError> {
        module.validate()?;
        log::debug!(
            "compiling module `{}` ({} function(s)) as {kind} for {}",
            module.name,
            module.functions.len(),
            self.target
        );
        match kind {
            OutputKind::Header if self.runtime_compile => Err(CodegenError::UnsupportedOutputKind),
            OutputKind::Header => Ok(self.header(module)),
            OutputKind::Implementation => self.implementation(module, namer.next_ordinal()),
        }
    }

    /// Emits a single function's packed wrapper.
    pub fn compile_function(
        &self,
        func: &LoweredFunc,
        ordinal: usize,
    ) -> Result<String, CodegenError> {
        func.validate()?;
        emit_function(func, ordinal)
    }

    fn implementation(&self, module: &Module, ordinal: usize) -> Result<String, CodegenError> {
        let mut out = String::new();
        out.push_str(INCLUDES);
        out.push('\n');
        out.push_str(PREAMBLE);
        if self.runtime_compile {
            out.push_str(EXTERN_C_OPEN);
        }
        for func in &module.functions {
            out.push('\n');
            out.push_str(&emit_function(func, ordinal)?);
        }
        if self.runtime_compile {
            out.push_str(EXTERN_C_CLOSE);
        }
        Ok(out)
    }

    fn header(&self, module: &Module) -> String {
        let mut out = String::from("#pragma once\n");
        out.push_str(INCLUDES);
        out.push('\n');
        for func in &module.functions {
            out.push_str(&format!("void {}({PACKED_PARAMS});\n", func.name));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_ir::{Arch, FuncBuilder};

    fn module(names: &[&str]) -> Module {
        Module {
            name: "m".into(),
            functions: names
                .iter()
                .map(|name| {
                    let mut b = FuncBuilder::new(*name);
                    let body = b.block(Vec::new());
                    b.finish(body)
                })
                .collect(),
        }
    }

    #[test]
    fn rejects_non_sycl_targets() {
        let cuda = Target::new(Language::Cuda, Arch::NvGpu);
        assert!(matches!(
            CodeGenSycl::new(cuda),
            Err(CodegenError::InvalidTarget(t)) if t == cuda
        ));
    }

    #[test]
    fn implementation_layout() {
        let codegen = CodeGenSycl::new(Target::sycl()).unwrap();
        let namer = KernelNamer::new();
        let src = codegen
            .compile(&module(&["a", "b"]), OutputKind::Implementation, &namer)
            .unwrap();
        assert!(src.starts_with(
            "#include <sycl/sycl.hpp>\n#include \"kiln_sycl_runtime_source.h\"\n\n\
             typedef sycl::half float16;\n\n// Kiln: auto-generated SYCL packed function\nvoid a("
        ));
        assert!(src.contains("class space0_a>"));
        assert!(src.contains("class space0_b>"));
        assert!(!src.contains("extern \"C\""));
    }

    #[test]
    fn runtime_compile_wraps_in_c_linkage() {
        let codegen = CodeGenSycl::new(Target::sycl())
            .unwrap()
            .runtime_compile(true);
        let src = codegen
            .compile(&module(&["a"]), OutputKind::Implementation, &KernelNamer::new())
            .unwrap();
        let open = src.find("extern \"C\" {").unwrap();
        let func = src.find("void a(").unwrap();
        assert!(src.find("typedef sycl::half").unwrap() < open);
        assert!(open < func);
        assert!(src.ends_with("}\n\n#ifdef __cplusplus\n}\n#endif\n"));
    }

    #[test]
    fn header_declarations() {
        let codegen = CodeGenSycl::new(Target::sycl()).unwrap();
        let namer = KernelNamer::new();
        let src = codegen
            .compile(&module(&["a", "b"]), OutputKind::Header, &namer)
            .unwrap();
        assert_eq!(
            src,
            "#pragma once\n#include <sycl/sycl.hpp>\n#include \"kiln_sycl_runtime_source.h\"\n\n\
             void a(sycl::queue &Q, sycl::range<3> dimGrid, sycl::range<3> dimBlock, void** void_args);\n\
             void b(sycl::queue &Q, sycl::range<3> dimGrid, sycl::range<3> dimBlock, void** void_args);\n"
        );
        // headers carry no kernel names
        assert_eq!(namer.next_ordinal(), 0);
    }

    #[test]
    fn header_in_runtime_compile_mode_is_fatal() {
        let codegen = CodeGenSycl::new(Target::sycl())
            .unwrap()
            .runtime_compile(true);
        assert!(matches!(
            codegen.compile(&module(&["a"]), OutputKind::Header, &KernelNamer::new()),
            Err(CodegenError::UnsupportedOutputKind)
        ));
    }

    #[test]
    fn each_module_draws_a_new_ordinal() {
        let codegen = CodeGenSycl::new(Target::sycl()).unwrap();
        let namer = KernelNamer::new();
        let m = module(&["k"]);
        let first = codegen.compile(&m, OutputKind::Implementation, &namer).unwrap();
        let second = codegen.compile(&m, OutputKind::Implementation, &namer).unwrap();
        assert!(first.contains("space0_k"));
        assert!(second.contains("space1_k"));
    }

    #[test]
    fn invalid_module_is_rejected_before_emission() {
        let codegen = CodeGenSycl::new(Target::sycl()).unwrap();
        let namer = KernelNamer::new();
        assert!(matches!(
            codegen.compile(&module(&["a", "a"]), OutputKind::Implementation, &namer),
            Err(CodegenError::InvalidIr(_))
        ));
        assert_eq!(namer.next_ordinal(), 0);
    }
}
