#![no_main]

use kiln_backend_core::OutputKind;
use kiln_backend_sycl::{CodeGenSycl, KernelNamer};
use kiln_ir::Target;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Loading, validation and generation should never panic; a module that
    // passes validation either compiles or yields an error.
    let Ok(module) = serde_json::from_slice::<kiln_ir::Module>(data) else {
        return;
    };
    if module.validate().is_err() {
        return;
    }
    if let Ok(codegen) = CodeGenSycl::new(Target::sycl()) {
        let namer = KernelNamer::new();
        let _ = codegen.compile(&module, OutputKind::Implementation, &namer);
        let _ = codegen.compile(&module, OutputKind::Header, &namer);
    }
});
