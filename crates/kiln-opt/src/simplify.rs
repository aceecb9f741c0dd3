//! Integer constant folding, identities and ramp canonicalization.

use kiln_ir::{Arena, BinaryOp, Expr, Handle, Type, UnaryOp};

/// Simplifies the expression at `h`, returning the handle of the result.
///
/// Integer literals are folded (32-bit values wrap like the device would),
/// `x + 0`, `x - 0`, `x * 1` and `x / 1` are reduced, and a ramp combined
/// with a broadcast is rewritten into a single ramp. Floating-point
/// arithmetic is never folded. Returns `h` itself when nothing changed.
pub fn simplify(exprs: &mut Arena<Expr>, h: Handle<Expr>) -> Handle<Expr> {
    match exprs[h].clone() {
        Expr::Binary { op, a, b } => {
            let (sa, sb) = (simplify(exprs, a), simplify(exprs, b));
            if let Some(folded) = fold_binary(exprs, op, sa, sb) {
                return folded;
            }
            if (sa, sb) == (a, b) {
                h
            } else {
                exprs.append(Expr::Binary { op, a: sa, b: sb })
            }
        }
        Expr::Min { a, b } | Expr::Max { a, b } => {
            let is_min = matches!(exprs[h], Expr::Min { .. });
            let (sa, sb) = (simplify(exprs, a), simplify(exprs, b));
            if let (Some((ty, x)), Some((_, y))) = (int_lit(exprs, sa), int_lit(exprs, sb)) {
                let value = if is_min { x.min(y) } else { x.max(y) };
                return exprs.append(Expr::IntImm { ty, value });
            }
            if (sa, sb) == (a, b) {
                h
            } else if is_min {
                exprs.append(Expr::Min { a: sa, b: sb })
            } else {
                exprs.append(Expr::Max { a: sa, b: sb })
            }
        }
        Expr::Unary {
            op: UnaryOp::Minus,
            value,
        } => {
            let sv = simplify(exprs, value);
            if let Some((ty, v)) = int_lit(exprs, sv) {
                return exprs.append(Expr::IntImm {
                    ty,
                    value: wrap(ty, v.wrapping_neg()),
                });
            }
            if sv == value {
                h
            } else {
                exprs.append(Expr::Unary {
                    op: UnaryOp::Minus,
                    value: sv,
                })
            }
        }
        Expr::Cast { ty, value } => {
            let sv = simplify(exprs, value);
            if sv == value {
                h
            } else {
                exprs.append(Expr::Cast { ty, value: sv })
            }
        }
        Expr::Ramp {
            base,
            stride,
            lanes,
        } => {
            let (sb, ss) = (simplify(exprs, base), simplify(exprs, stride));
            if (sb, ss) == (base, stride) {
                h
            } else {
                exprs.append(Expr::Ramp {
                    base: sb,
                    stride: ss,
                    lanes,
                })
            }
        }
        Expr::Broadcast { value, lanes } => {
            let sv = simplify(exprs, value);
            if sv == value {
                h
            } else {
                exprs.append(Expr::Broadcast { value: sv, lanes })
            }
        }
        _ => h,
    }
}

fn int_lit(exprs: &Arena<Expr>, h: Handle<Expr>) -> Option<(Type, i64)> {
    match exprs[h] {
        Expr::IntImm { ty, value } if !ty.is_vector() => Some((ty, value)),
        _ => None,
    }
}

fn is_int(exprs: &Arena<Expr>, h: Handle<Expr>, v: i64) -> bool {
    int_lit(exprs, h).is_some_and(|(_, x)| x == v)
}

fn wrap(ty: Type, v: i64) -> i64 {
    match ty.bits {
        8 => i64::from(v as i8),
        16 => i64::from(v as i16),
        32 => i64::from(v as i32),
        _ => v,
    }
}

fn fold_binary(
    exprs: &mut Arena<Expr>,
    op: BinaryOp,
    a: Handle<Expr>,
    b: Handle<Expr>,
) -> Option<Handle<Expr>> {
    if let (Some((ty, x)), Some((_, y))) = (int_lit(exprs, a), int_lit(exprs, b)) {
        let value = match op {
            BinaryOp::Add => x.wrapping_add(y),
            BinaryOp::Sub => x.wrapping_sub(y),
            BinaryOp::Mul => x.wrapping_mul(y),
            BinaryOp::Div if y != 0 => x.wrapping_div(y),
            BinaryOp::Mod if y != 0 => x.wrapping_rem(y),
            _ => return None,
        };
        return Some(exprs.append(Expr::IntImm {
            ty,
            value: wrap(ty, value),
        }));
    }

    match op {
        BinaryOp::Add if is_int(exprs, b, 0) => Some(a),
        BinaryOp::Add if is_int(exprs, a, 0) => Some(b),
        BinaryOp::Sub if is_int(exprs, b, 0) => Some(a),
        BinaryOp::Mul if is_int(exprs, b, 1) => Some(a),
        BinaryOp::Mul if is_int(exprs, a, 1) => Some(b),
        BinaryOp::Div if is_int(exprs, b, 1) => Some(a),
        BinaryOp::Add | BinaryOp::Mul => fold_ramp(exprs, op, a, b),
        _ => None,
    }
}

// ramp(b, s, n) + broadcast(v, n) => ramp(b + v, s, n)
// ramp(b, s, n) * broadcast(v, n) => ramp(b * v, s * v, n)
fn fold_ramp(
    exprs: &mut Arena<Expr>,
    op: BinaryOp,
    a: Handle<Expr>,
    b: Handle<Expr>,
) -> Option<Handle<Expr>> {
    let (ramp, bcast) = match (exprs[a].clone(), exprs[b].clone()) {
        (ramp @ Expr::Ramp { .. }, bcast @ Expr::Broadcast { .. })
        | (bcast @ Expr::Broadcast { .. }, ramp @ Expr::Ramp { .. }) => (ramp, bcast),
        (
            Expr::Broadcast {
                value: x,
                lanes: la,
            },
            Expr::Broadcast {
                value: y,
                lanes: lb,
            },
        ) if la == lb => {
            let combined = exprs.append(Expr::Binary { op, a: x, b: y });
            let value = simplify(exprs, combined);
            return Some(exprs.append(Expr::Broadcast { value, lanes: la }));
        }
        _ => return None,
    };
    let (
        Expr::Ramp {
            base,
            stride,
            lanes,
        },
        Expr::Broadcast { value, lanes: bl },
    ) = (ramp, bcast)
    else {
        return None;
    };
    if bl != lanes {
        return None;
    }
    log::trace!("canonicalizing {op:?} of ramp and broadcast");
    let (base, stride) = match op {
        BinaryOp::Add => {
            let sum = exprs.append(Expr::Binary {
                op,
                a: base,
                b: value,
            });
            (simplify(exprs, sum), stride)
        }
        _ => {
            let b2 = exprs.append(Expr::Binary {
                op,
                a: base,
                b: value,
            });
            let s2 = exprs.append(Expr::Binary {
                op,
                a: stride,
                b: value,
            });
            (simplify(exprs, b2), simplify(exprs, s2))
        }
    };
    Some(exprs.append(Expr::Ramp {
        base,
        stride,
        lanes,
    }))
}
