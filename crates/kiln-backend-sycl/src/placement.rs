//! Temporary buffer placement.

use std::collections::HashSet;

use kiln_ir::{Arena, Buffer, Expr, Handle, LoweredFunc, MemoryType};

use crate::alias::collect_tensors;
use crate::error::CodegenError;
use crate::naming::type_repr;
use crate::translate::Translator;

/// Builds one `Alloc` statement per temporary buffer the body refers to
/// through a tensor, in `temp_bufs` order.
pub(crate) fn alloc_temp_buffers(func: &LoweredFunc, exprs: &mut Arena<Expr>) -> Vec<Handle<Expr>> {
    let referenced: HashSet<Handle<Buffer>> = collect_tensors(exprs, func.body)
        .into_iter()
        .filter_map(|t| func.tensors[t].buffer)
        .collect();
    let mut placed = HashSet::new();
    let mut allocs = Vec::new();
    for &b in &func.temp_bufs {
        if !placed.insert(b) {
            continue;
        }
        if !referenced.contains(&b) {
            log::debug!(
                "skipping temp buffer `{}` of `{}`: not referenced",
                func.buffers[b].name,
                func.name
            );
            continue;
        }
        let destination = exprs.append(Expr::Buffer(b));
        allocs.push(exprs.append(Expr::Alloc { destination }));
    }
    allocs
}

impl Translator<'_> {
    /// Declares temporary buffer `b` according to its memory space.
    ///
    /// Work-group shared buffers become `group_local_memory` arrays; register
    /// and device-global buffers need no declaration.
    pub(crate) fn emit_temp_buffer(&mut self, b: Handle<Buffer>) -> Result<(), CodegenError> {
        let func = self.func;
        let buffer = &func.buffers[b];
        if buffer.dtype.is_void() {
            return Err(CodegenError::VoidBuffer(buffer.name.clone()));
        }
        log::trace!("placing `{}` in {} memory", buffer.name, buffer.memory);
        match buffer.memory {
            MemoryType::GpuShared => {
                let elem = type_repr(buffer.dtype.element_of())?;
                let size = kiln_opt::product(&mut self.exprs, &buffer.shape);
                self.push(&format!(
                    "auto {} = *sycl::group_local_memory<{elem}[ ",
                    buffer.name
                ));
                self.emit(size)?;
                self.push(" ]>(item.get_group())");
                Ok(())
            }
            MemoryType::GpuLocal | MemoryType::Heap => Ok(()),
            memory @ MemoryType::Auto => Err(CodegenError::UnsupportedMemory {
                buffer: buffer.name.clone(),
                memory,
            }),
        }
    }
}
