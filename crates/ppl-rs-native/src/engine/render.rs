//! Textual form of rows: variables are `A`..`Z`, then `A1`..`Z1`, and so on.

use std::fmt::Write;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use super::linear::{Con, Rel};

pub fn variable_name(var: usize) -> String {
    let letter = char::from(b'A' + (var % 26) as u8);
    match var / 26 {
        0 => letter.to_string(),
        n => format!("{letter}{n}"),
    }
}

/// `3*A - B + 2`; `0` for the zero expression.
pub fn render_terms(coeffs: &[BigInt], constant: &BigInt) -> String {
    let mut out = String::new();
    for (i, c) in coeffs.iter().enumerate() {
        if c.is_zero() {
            continue;
        }
        push_term(&mut out, c, Some(&variable_name(i)));
    }
    if !constant.is_zero() || out.is_empty() {
        push_term(&mut out, constant, None);
    }
    out
}

fn push_term(out: &mut String, c: &BigInt, name: Option<&str>) {
    let magnitude = c.abs();
    if out.is_empty() {
        if c.is_negative() {
            out.push('-');
        }
    } else if c.is_negative() {
        out.push_str(" - ");
    } else {
        out.push_str(" + ");
    }
    match name {
        Some(name) if magnitude.is_one() => out.push_str(name),
        Some(name) => {
            let _ = write!(out, "{magnitude}*{name}");
        }
        None => {
            let _ = write!(out, "{magnitude}");
        }
    }
}

pub fn render_constraint(c: &Con) -> String {
    let zero = BigInt::zero();
    let lhs = render_terms(&c.expr.coeffs, &zero);
    let op = match c.rel {
        Rel::Equal => "=",
        Rel::GreaterOrEqual => ">=",
        Rel::GreaterThan => ">",
    };
    format!("{lhs} {op} {}", -&c.expr.constant)
}

pub fn render_rational(q: &BigRational) -> String {
    if q.is_integer() {
        q.numer().to_string()
    } else {
        format!("{}/{}", q.numer(), q.denom())
    }
}

pub fn join(parts: Vec<String>, empty: &str) -> String {
    if parts.is_empty() {
        empty.to_string()
    } else {
        parts.join(", ")
    }
}
