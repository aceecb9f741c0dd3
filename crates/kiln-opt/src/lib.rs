//! Simplification utilities for the Kiln IR.
//!
//! The code generator uses these to keep the expressions it synthesizes
//! (flat offsets, buffer sizes, merged function bodies) compact. Every
//! routine is non-destructive: nodes that change are appended to the arena
//! and existing nodes are left untouched, so handles held elsewhere keep
//! their meaning. Whole-module rewrites implement [`Pass`].

mod blocks;
mod offset;
mod simplify;

pub use blocks::{simplify_blocks, BlockSimplify};
pub use offset::{flat_offset, product};
pub use simplify::simplify;

use std::fmt::Debug;

use kiln_ir::Module;

/// A rewrite over every function of a module.
pub trait Pass: Debug {
    /// Human-readable name of the pass.
    fn name(&self) -> &str;

    /// Run the pass on a module. Returns `true` if anything was modified.
    fn run(&self, module: &mut Module) -> bool;
}
