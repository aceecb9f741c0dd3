//! Numeric literal spelling.

use kiln_ir::{ScalarKind, Type};

/// Formats `value` like C's `%#.<precision>g`: `precision` significant
/// digits, trailing zeros and the decimal point always kept.
fn format_g(value: f64, precision: usize) -> String {
    let precision = precision.max(1);
    if value == 0.0 {
        return format!("{:.*}", precision - 1, value);
    }
    let sci = format!("{:.*e}", precision - 1, value);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((&sci, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    if exp < -4 || exp >= precision as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        let mantissa = if mantissa.contains('.') {
            mantissa.to_string()
        } else {
            format!("{mantissa}.")
        };
        format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        let fixed = format!("{value:.decimals$}");
        if fixed.contains('.') {
            fixed
        } else {
            format!("{fixed}.")
        }
    }
}

fn non_finite(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("NAN")
    } else if value == f64::INFINITY {
        Some("INFINITY")
    } else if value == f64::NEG_INFINITY {
        Some("-INFINITY")
    } else {
        None
    }
}

/// Spells a floating-point literal of type `ty`.
///
/// `float` uses nine significant digits and an `f` suffix, `double` uses
/// seventeen. Half-precision values are spelled as a cast of the `float`
/// literal. Values that overflow the narrower type spell as its infinity.
pub fn float_literal(ty: Type, value: f64) -> String {
    if ty.kind == ScalarKind::Float && ty.bits == 64 {
        return match non_finite(value) {
            Some(special) => special.to_string(),
            None => format_g(value, 17),
        };
    }
    let narrowed = value as f32 as f64;
    if let Some(special) = non_finite(narrowed) {
        return format!("((float){special})");
    }
    let digits = format_g(narrowed, 9);
    match (ty.kind, ty.bits) {
        (ScalarKind::Float, 16) => format!("((float16){digits}f)"),
        (ScalarKind::BFloat, _) => format!("((bfloat16){digits}f)"),
        _ => format!("{digits}f"),
    }
}

/// Spells a signed integer literal of type `ty`.
///
/// The most negative value has no positive literal to negate, so it is
/// spelled as a subtraction.
pub fn int_literal(ty: Type, value: i64) -> String {
    match (ty.bits, value) {
        (64, i64::MIN) => "(-9223372036854775807ll - 1)".to_string(),
        (64, _) => format!("{value}ll"),
        (_, v) if v == i64::from(i32::MIN) => "(-2147483647 - 1)".to_string(),
        _ => value.to_string(),
    }
}

/// Spells an unsigned or boolean literal of type `ty`.
pub fn uint_literal(ty: Type, value: u64) -> String {
    if ty.is_bool() {
        (value != 0).to_string()
    } else if ty.bits == 64 {
        format!("{value}ull")
    } else {
        format!("{value}u")
    }
}

/// Spells a string literal with C escapes.
pub fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
