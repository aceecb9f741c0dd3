//! Tensor-to-buffer alias bindings.

use std::collections::HashSet;

use kiln_ir::{Arena, Expr, Handle, LoweredFunc, MemoryType, Tensor};

/// Distinct tensors referenced under `root`, in depth-first first-encounter
/// order.
pub(crate) fn collect_tensors(exprs: &Arena<Expr>, root: Handle<Expr>) -> Vec<Handle<Tensor>> {
    let mut visited = HashSet::new();
    let mut seen = HashSet::new();
    let mut tensors = Vec::new();
    let mut stack = vec![root];
    while let Some(h) = stack.pop() {
        if !visited.insert(h) {
            continue;
        }
        let node = &exprs[h];
        if let Expr::Tensor(t) = *node {
            if seen.insert(t) {
                tensors.push(t);
            }
        }
        stack.extend(node.children().into_iter().rev());
    }
    tensors
}

/// Builds `T* tensor = buffer` bindings for body tensors backed by one of
/// the function's temporary buffers.
///
/// Register-resident buffers and tensors already named like their buffer
/// need no alias. At most one binding per tensor.
pub(crate) fn buffer_alias_lets(func: &LoweredFunc, exprs: &mut Arena<Expr>) -> Vec<Handle<Expr>> {
    let temp: HashSet<_> = func.temp_bufs.iter().copied().collect();
    let mut lets = Vec::new();
    for t in collect_tensors(exprs, func.body) {
        let tensor = &func.tensors[t];
        let Some(b) = tensor.buffer.filter(|b| temp.contains(b)) else {
            continue;
        };
        let buffer = &func.buffers[b];
        if buffer.memory == MemoryType::GpuLocal || tensor.name == buffer.name {
            continue;
        }
        log::trace!("aliasing tensor `{}` to buffer `{}`", tensor.name, buffer.name);
        let ptr = tensor.dtype.element_of().pointer_to();
        let symbol = exprs.append(Expr::var(tensor.name.as_str(), ptr));
        let value = exprs.append(Expr::var(buffer.name.as_str(), ptr));
        lets.push(exprs.append(Expr::Let {
            symbol,
            body: Some(value),
        }));
    }
    lets
}
