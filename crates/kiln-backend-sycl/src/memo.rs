//! Per-function flat offset cache.

use std::collections::HashMap;

use kiln_ir::{Expr, Handle};

/// Caches the flat offset computed for each load and store node.
///
/// Keyed by node handle, never by value: two structurally equal loads are
/// distinct entries, and one load visited twice resolves to the same offset
/// handle both times. Lives for one function's emission.
#[derive(Debug, Default)]
pub(crate) struct IndexMemo {
    loads: HashMap<Handle<Expr>, Handle<Expr>>,
    stores: HashMap<Handle<Expr>, Handle<Expr>>,
}

impl IndexMemo {
    /// Offset of load `node`, computed by `compute` on first use.
    pub(crate) fn load(
        &mut self,
        node: Handle<Expr>,
        compute: impl FnOnce() -> Handle<Expr>,
    ) -> Handle<Expr> {
        *self.loads.entry(node).or_insert_with(compute)
    }

    /// Offset of store `node`, computed by `compute` on first use.
    pub(crate) fn store(
        &mut self,
        node: Handle<Expr>,
        compute: impl FnOnce() -> Handle<Expr>,
    ) -> Handle<Expr> {
        *self.stores.entry(node).or_insert_with(compute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_once_per_node() {
        let mut memo = IndexMemo::default();
        let node = Handle::new(3);
        let mut calls = 0;
        let first = memo.load(node, || {
            calls += 1;
            Handle::new(10)
        });
        let second = memo.load(node, || {
            calls += 1;
            Handle::new(11)
        });
        assert_eq!(first, second);
        assert_eq!(calls, 1);
    }

    #[test]
    fn loads_and_stores_are_separate() {
        let mut memo = IndexMemo::default();
        let node = Handle::new(0);
        let l = memo.load(node, || Handle::new(1));
        let s = memo.store(node, || Handle::new(2));
        assert_ne!(l, s);
    }
}
