//! Row-major offsets and buffer sizes.

use kiln_ir::{Arena, BinaryOp, Expr, Handle};

use crate::simplify;

/// Simplified product of `dims`; `1` for a rank-0 shape.
pub fn product(exprs: &mut Arena<Expr>, dims: &[Handle<Expr>]) -> Handle<Expr> {
    let Some((&first, rest)) = dims.split_first() else {
        return exprs.append(Expr::int(1));
    };
    let acc = rest.iter().fold(first, |acc, &d| {
        exprs.append(Expr::Binary {
            op: BinaryOp::Mul,
            a: acc,
            b: d,
        })
    });
    simplify(exprs, acc)
}

/// Flat row-major offset of `indices` into a tensor of `shape`:
/// `((i0 * s1 + i1) * s2 + i2) ...`, simplified.
///
/// A single index is already flat and is returned unchanged.
pub fn flat_offset(
    exprs: &mut Arena<Expr>,
    shape: &[Handle<Expr>],
    indices: &[Handle<Expr>],
) -> Handle<Expr> {
    match indices {
        [] => exprs.append(Expr::int(0)),
        [only] => *only,
        [first, rest @ ..] => {
            let acc = rest
                .iter()
                .zip(shape.iter().skip(1))
                .fold(*first, |acc, (&index, &dim)| {
                    let scaled = exprs.append(Expr::Binary {
                        op: BinaryOp::Mul,
                        a: acc,
                        b: dim,
                    });
                    exprs.append(Expr::Binary {
                        op: BinaryOp::Add,
                        a: scaled,
                        b: index,
                    })
                });
            simplify(exprs, acc)
        }
    }
}
