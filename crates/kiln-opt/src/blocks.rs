//! Block flattening.

use kiln_ir::{Arena, Expr, Handle, Module};

use crate::Pass;

/// Flattens nested blocks in every function body.
#[derive(Debug)]
pub struct BlockSimplify;

impl Pass for BlockSimplify {
    fn name(&self) -> &str {
        "block-simplify"
    }

    fn run(&self, module: &mut Module) -> bool {
        let mut changed = false;
        for func in &mut module.functions {
            let body = simplify_blocks(&mut func.exprs, func.body);
            if body != func.body {
                log::debug!("{}: flattened body of `{}`", self.name(), func.name);
                func.body = body;
                changed = true;
            }
        }
        changed
    }
}

/// Flattens nested blocks reachable from `root`.
///
/// A block whose only statement is another block is replaced by that block,
/// and block statements directly inside a block are spliced into it.
/// Conditional and loop bodies are simplified in place but never removed,
/// so they stay blocks if they were blocks.
pub fn simplify_blocks(exprs: &mut Arena<Expr>, root: Handle<Expr>) -> Handle<Expr> {
    match exprs[root].clone() {
        Expr::Block(stmts) => {
            if let [only] = stmts[..] {
                if matches!(exprs[only], Expr::Block(_)) {
                    log::trace!("collapsing size-1 block {root:?}");
                    return simplify_blocks(exprs, only);
                }
            }
            let mut flat = Vec::with_capacity(stmts.len());
            for &s in &stmts {
                let s = simplify_blocks(exprs, s);
                match &exprs[s] {
                    Expr::Block(inner) => flat.extend(inner.iter().copied()),
                    _ => flat.push(s),
                }
            }
            if flat == stmts {
                root
            } else {
                exprs.append(Expr::Block(flat))
            }
        }
        Expr::IfThenElse {
            condition,
            true_case,
            false_case,
        } => {
            let t = simplify_blocks(exprs, true_case);
            let f = false_case.map(|f| simplify_blocks(exprs, f));
            if t == true_case && f == false_case {
                root
            } else {
                exprs.append(Expr::IfThenElse {
                    condition,
                    true_case: t,
                    false_case: f,
                })
            }
        }
        Expr::For {
            loop_var,
            min,
            extent,
            body,
        } => {
            let b = simplify_blocks(exprs, body);
            if b == body {
                root
            } else {
                exprs.append(Expr::For {
                    loop_var,
                    min,
                    extent,
                    body: b,
                })
            }
        }
        _ => root,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_ir::Type;

    fn stmt(exprs: &mut Arena<Expr>, name: &str) -> Handle<Expr> {
        exprs.append(Expr::Call {
            name: name.into(),
            ty: Type::VOID,
            read_args: Vec::new(),
            write_args: Vec::new(),
        })
    }

    #[test]
    fn nested_blocks_are_spliced() {
        let mut exprs = Arena::new();
        let a = stmt(&mut exprs, "a");
        let b = stmt(&mut exprs, "b");
        let c = stmt(&mut exprs, "c");
        let inner = exprs.append(Expr::Block(vec![b, c]));
        let outer = exprs.append(Expr::Block(vec![a, inner]));
        let r = simplify_blocks(&mut exprs, outer);
        assert_eq!(exprs[r], Expr::Block(vec![a, b, c]));
        // the input block is untouched
        assert_eq!(exprs[outer], Expr::Block(vec![a, inner]));
    }

    #[test]
    fn size_one_block_of_block_collapses() {
        let mut exprs = Arena::new();
        let a = stmt(&mut exprs, "a");
        let inner = exprs.append(Expr::Block(vec![a]));
        let outer = exprs.append(Expr::Block(vec![inner]));
        assert_eq!(simplify_blocks(&mut exprs, outer), inner);
    }

    #[test]
    fn size_one_block_of_statement_is_kept() {
        let mut exprs = Arena::new();
        let a = stmt(&mut exprs, "a");
        let block = exprs.append(Expr::Block(vec![a]));
        assert_eq!(simplify_blocks(&mut exprs, block), block);
    }

    #[test]
    fn pass_rewrites_function_bodies() {
        let mut b = kiln_ir::FuncBuilder::new("k");
        let one = b.int(1);
        let x = b.var("x", Type::I32);
        let st = b.expr(Expr::Let {
            symbol: x,
            body: Some(one),
        });
        let inner = b.block(vec![st]);
        let outer = b.block(vec![inner]);
        let mut module = Module {
            name: "m".into(),
            functions: vec![b.finish(outer)],
        };
        assert!(BlockSimplify.run(&mut module));
        assert_eq!(module.functions[0].body, inner);
        assert!(!BlockSimplify.run(&mut module));
    }

    #[test]
    fn branch_bodies_stay_blocks() {
        let mut exprs = Arena::new();
        let a = stmt(&mut exprs, "a");
        let inner = exprs.append(Expr::Block(vec![a]));
        let then = exprs.append(Expr::Block(vec![inner]));
        let cond = exprs.append(Expr::bool(true));
        let ite = exprs.append(Expr::IfThenElse {
            condition: cond,
            true_case: then,
            false_case: None,
        });
        let root = exprs.append(Expr::Block(vec![ite]));
        let r = simplify_blocks(&mut exprs, root);
        let Expr::Block(stmts) = &exprs[r] else {
            panic!("expected block");
        };
        let Expr::IfThenElse { true_case, .. } = exprs[stmts[0]] else {
            panic!("expected if");
        };
        assert_eq!(exprs[true_case], Expr::Block(vec![a]));
    }
}
