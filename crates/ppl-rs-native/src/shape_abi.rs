//! Entry points shared by every abstract-object family.
//!
//! `shape_abi!` expands inside a family module and defines one entry point
//! per common operation over that family's tag; the tag wraps a type
//! implementing `Shape`.

use std::ffi::{c_int, c_uint};

use num_bigint::BigInt;

use crate::engine::fm::Sup;
use crate::engine::shape::MAX_SPACE_DIMENSION;
use crate::engine::{Complexity, EResult, EngineError, Gen, GenKind, Shape};
use crate::types::{
    PPL_COMPLEXITY_CLASS_ANY, PPL_COMPLEXITY_CLASS_POLYNOMIAL, PPL_COMPLEXITY_CLASS_SIMPLEX,
    ppl_Coefficient_tag, ppl_Generator_tag,
};
use crate::util::{give, put, store_coefficient};

/// Commit `widened` to `x` unless it loses precision and a token remains,
/// in which case one token is spent and `x` is kept.
///
/// # Safety
///
/// A non-null `tp` must be valid for reads and writes.
pub(crate) unsafe fn commit_with_tokens<S: Shape>(
    x: &mut S,
    widened: S,
    tp: *mut c_uint,
) -> EResult<c_int> {
    // SAFETY: caller contract on `tp`.
    if let Some(tokens) = unsafe { tp.as_mut() } {
        if *tokens > 0 && widened.strictly_contains(x)? {
            *tokens -= 1;
            return Ok(0);
        }
    }
    *x = widened;
    Ok(0)
}

/// Writes a finite extremum and returns `1`; returns `0` for an empty or
/// unbounded one, leaving the outputs untouched.
///
/// # Safety
///
/// Every non-null output must be valid for writes; `n` and `d` must be live
/// coefficients.
pub(crate) unsafe fn write_extremum(
    found: Sup,
    n: *mut ppl_Coefficient_tag,
    d: *mut ppl_Coefficient_tag,
    attained: *mut c_int,
    point: *mut *mut ppl_Generator_tag,
) -> EResult<c_int> {
    let Sup::Finite {
        value,
        attained: exact,
        witness,
    } = found
    else {
        return Ok(0);
    };
    let (num, den): (BigInt, BigInt) = value.into_raw();
    // SAFETY: forwarded caller contract.
    unsafe {
        store_coefficient(n, num)?;
        store_coefficient(d, den)?;
        if !attained.is_null() {
            put(attained, c_int::from(exact))?;
        }
        if !point.is_null() {
            let kind = if exact {
                GenKind::Point
            } else {
                GenKind::ClosurePoint
            };
            give(point, ppl_Generator_tag(Gen::point_at(&witness, kind)))?;
        }
    }
    Ok(1)
}

pub(crate) fn complexity_class(c: c_int) -> EResult<Complexity> {
    Ok(match c {
        PPL_COMPLEXITY_CLASS_POLYNOMIAL => Complexity::Polynomial,
        PPL_COMPLEXITY_CLASS_SIMPLEX => Complexity::Simplex,
        PPL_COMPLEXITY_CLASS_ANY => Complexity::Any,
        other => return Err(EngineError::invalid(format!("unknown complexity class {other}"))),
    })
}

/// Fails with `LengthError` above the largest representable dimension.
pub(crate) fn checked_dimension(d: usize) -> EResult<usize> {
    if d > MAX_SPACE_DIMENSION {
        return Err(EngineError::Length(format!(
            "space dimension {d} exceeds the maximum space dimension"
        )));
    }
    Ok(d)
}

pub(crate) fn relation_code(bits: u32) -> EResult<c_int> {
    c_int::try_from(bits).map_err(|_| EngineError::Internal(format!("relation bits {bits}")))
}

macro_rules! shape_abi {
    ($tag:ident, $what:literal) => {
        use std::collections::BTreeSet;
        use std::ffi::{c_char, c_int, c_uint};

        use crate::engine::{DescSystem, Shape};
        use crate::macros::native_fn;
        use crate::shape_abi::{commit_with_tokens, relation_code, write_extremum};
        use crate::status::flag;
        use crate::types::{
            ppl_Coefficient_tag, ppl_Congruence_System_tag, ppl_Congruence_tag,
            ppl_Constraint_System_tag, ppl_Constraint_tag, ppl_Generator_tag,
            ppl_Linear_Expression_tag, ppl_dimension_type,
        };
        use crate::util::{
            coefficient, get, get_mut, give, give_string, index_slice, put, take_back,
        };

        native_fn! {
            fn copy(px: *mut *mut $tag, y: *const $tag) {
                let y = get(y, $what)?.0.clone();
                give(px, $tag(y))
            }
        }

        native_fn! {
            fn delete(x: *mut $tag) {
                take_back(x)
            }
        }

        native_fn! {
            fn space_dimension(x: *const $tag, out: *mut ppl_dimension_type) {
                put(out, get(x, $what)?.0.space_dimension())
            }
        }

        native_fn! {
            fn affine_dimension(x: *const $tag, out: *mut ppl_dimension_type) {
                put(out, get(x, $what)?.0.affine_dimension()?)
            }
        }

        native_fn! {
            fn is_empty(x: *const $tag) {
                Ok(flag(get(x, $what)?.0.is_empty()?))
            }
        }

        native_fn! {
            fn is_universe(x: *const $tag) {
                Ok(flag(get(x, $what)?.0.is_universe()?))
            }
        }

        native_fn! {
            fn is_bounded(x: *const $tag) {
                Ok(flag(get(x, $what)?.0.is_bounded()?))
            }
        }

        native_fn! {
            fn is_discrete(x: *const $tag) {
                Ok(flag(get(x, $what)?.0.is_discrete()?))
            }
        }

        native_fn! {
            fn is_topologically_closed(x: *const $tag) {
                Ok(flag(get(x, $what)?.0.is_topologically_closed()?))
            }
        }

        native_fn! {
            fn contains(x: *const $tag, y: *const $tag) {
                Ok(flag(get(x, $what)?.0.contains(&get(y, $what)?.0)?))
            }
        }

        native_fn! {
            fn strictly_contains(x: *const $tag, y: *const $tag) {
                Ok(flag(get(x, $what)?.0.strictly_contains(&get(y, $what)?.0)?))
            }
        }

        native_fn! {
            fn is_disjoint_from(x: *const $tag, y: *const $tag) {
                Ok(flag(get(x, $what)?.0.is_disjoint_from(&get(y, $what)?.0)?))
            }
        }

        native_fn! {
            fn equals(x: *const $tag, y: *const $tag) {
                Ok(flag(get(x, $what)?.0.equals(&get(y, $what)?.0)?))
            }
        }

        native_fn! {
            fn constrains(x: *const $tag, var: ppl_dimension_type) {
                Ok(flag(get(x, $what)?.0.constrains(var)?))
            }
        }

        native_fn! {
            fn bounds_from_above(x: *const $tag, le: *const ppl_Linear_Expression_tag) {
                let le = &get(le, "linear expression")?.0;
                Ok(flag(get(x, $what)?.0.bounds_from_above(le)?))
            }
        }

        native_fn! {
            fn bounds_from_below(x: *const $tag, le: *const ppl_Linear_Expression_tag) {
                let le = &get(le, "linear expression")?.0;
                Ok(flag(get(x, $what)?.0.bounds_from_below(le)?))
            }
        }

        native_fn! {
            /// A bitwise OR of `PPL_POLY_CON_RELATION_*` values.
            fn relation_with_constraint(x: *const $tag, c: *const ppl_Constraint_tag) {
                let c = &get(c, "constraint")?.0;
                relation_code(get(x, $what)?.0.relation_with_constraint(c)?)
            }
        }

        native_fn! {
            /// `1` and the supremum `n/d` when it exists; `0` when empty or unbounded.
            fn maximize(
                x: *const $tag,
                le: *const ppl_Linear_Expression_tag,
                n: *mut ppl_Coefficient_tag,
                d: *mut ppl_Coefficient_tag,
                attained: *mut c_int,
                point: *mut *mut ppl_Generator_tag,
            ) {
                let le = &get(le, "linear expression")?.0;
                let found = get(x, $what)?.0.sup(le)?;
                write_extremum(found, n, d, attained, point)
            }
        }

        native_fn! {
            fn minimize(
                x: *const $tag,
                le: *const ppl_Linear_Expression_tag,
                n: *mut ppl_Coefficient_tag,
                d: *mut ppl_Coefficient_tag,
                attained: *mut c_int,
                point: *mut *mut ppl_Generator_tag,
            ) {
                let le = &get(le, "linear expression")?.0;
                let found = get(x, $what)?.0.inf(le)?;
                write_extremum(found, n, d, attained, point)
            }
        }

        native_fn! {
            /// A fresh system owned by the caller.
            fn get_constraints(x: *const $tag, pcs: *mut *mut ppl_Constraint_System_tag) {
                let x = &get(x, $what)?.0;
                let rows = x.constraints()?;
                give(pcs, ppl_Constraint_System_tag(DescSystem::from_items(rows, x.space_dimension())))
            }
        }

        native_fn! {
            fn get_minimized_constraints(
                x: *const $tag,
                pcs: *mut *mut ppl_Constraint_System_tag,
            ) {
                let x = &get(x, $what)?.0;
                let rows = x.minimized_constraints()?;
                give(pcs, ppl_Constraint_System_tag(DescSystem::from_items(rows, x.space_dimension())))
            }
        }

        native_fn! {
            fn get_congruences(x: *const $tag, pcs: *mut *mut ppl_Congruence_System_tag) {
                let x = &get(x, $what)?.0;
                let rows = x.congruences()?;
                give(pcs, ppl_Congruence_System_tag(DescSystem::from_items(rows, x.space_dimension())))
            }
        }

        native_fn! {
            fn get_minimized_congruences(
                x: *const $tag,
                pcs: *mut *mut ppl_Congruence_System_tag,
            ) {
                let x = &get(x, $what)?.0;
                let rows = x.minimized_congruences()?;
                give(pcs, ppl_Congruence_System_tag(DescSystem::from_items(rows, x.space_dimension())))
            }
        }

        native_fn! {
            fn add_constraint(x: *mut $tag, c: *const ppl_Constraint_tag) {
                let c = &get(c, "constraint")?.0;
                get_mut(x, $what)?.0.add_constraint(c)?;
                Ok(0)
            }
        }

        native_fn! {
            fn refine_with_constraint(x: *mut $tag, c: *const ppl_Constraint_tag) {
                let c = &get(c, "constraint")?.0;
                get_mut(x, $what)?.0.refine_with_constraint(c)?;
                Ok(0)
            }
        }

        native_fn! {
            fn add_congruence(x: *mut $tag, c: *const ppl_Congruence_tag) {
                let c = &get(c, "congruence")?.0;
                get_mut(x, $what)?.0.add_congruence(c)?;
                Ok(0)
            }
        }

        native_fn! {
            fn refine_with_congruence(x: *mut $tag, c: *const ppl_Congruence_tag) {
                let c = &get(c, "congruence")?.0;
                get_mut(x, $what)?.0.refine_with_congruence(c)?;
                Ok(0)
            }
        }

        native_fn! {
            /// All or nothing: `x` is unchanged when any constraint is rejected.
            fn add_constraints(x: *mut $tag, cs: *const ppl_Constraint_System_tag) {
                let cs = &get(cs, "constraint system")?.0;
                let x = get_mut(x, $what)?;
                let mut next = x.0.clone();
                for c in cs.items() {
                    next.add_constraint(c)?;
                }
                x.0 = next;
                Ok(0)
            }
        }

        native_fn! {
            fn refine_with_constraints(x: *mut $tag, cs: *const ppl_Constraint_System_tag) {
                let cs = &get(cs, "constraint system")?.0;
                let x = get_mut(x, $what)?;
                let mut next = x.0.clone();
                for c in cs.items() {
                    next.refine_with_constraint(c)?;
                }
                x.0 = next;
                Ok(0)
            }
        }

        native_fn! {
            fn add_congruences(x: *mut $tag, cs: *const ppl_Congruence_System_tag) {
                let cs = &get(cs, "congruence system")?.0;
                let x = get_mut(x, $what)?;
                let mut next = x.0.clone();
                for c in cs.items() {
                    next.add_congruence(c)?;
                }
                x.0 = next;
                Ok(0)
            }
        }

        native_fn! {
            fn refine_with_congruences(x: *mut $tag, cs: *const ppl_Congruence_System_tag) {
                let cs = &get(cs, "congruence system")?.0;
                let x = get_mut(x, $what)?;
                let mut next = x.0.clone();
                for c in cs.items() {
                    next.refine_with_congruence(c)?;
                }
                x.0 = next;
                Ok(0)
            }
        }

        native_fn! {
            fn intersection_assign(x: *mut $tag, y: *const $tag) {
                let y = get(y, $what)?.0.clone();
                get_mut(x, $what)?.0.intersection_assign(&y)?;
                Ok(0)
            }
        }

        native_fn! {
            fn upper_bound_assign(x: *mut $tag, y: *const $tag) {
                let y = get(y, $what)?.0.clone();
                get_mut(x, $what)?.0.upper_bound_assign(&y)?;
                Ok(0)
            }
        }

        native_fn! {
            fn difference_assign(x: *mut $tag, y: *const $tag) {
                let y = get(y, $what)?.0.clone();
                get_mut(x, $what)?.0.difference_assign(&y)?;
                Ok(0)
            }
        }

        native_fn! {
            fn concatenate_assign(x: *mut $tag, y: *const $tag) {
                let y = get(y, $what)?.0.clone();
                get_mut(x, $what)?.0.concatenate_assign(&y)?;
                Ok(0)
            }
        }

        native_fn! {
            fn time_elapse_assign(x: *mut $tag, y: *const $tag) {
                let y = get(y, $what)?.0.clone();
                get_mut(x, $what)?.0.time_elapse_assign(&y)?;
                Ok(0)
            }
        }

        native_fn! {
            fn topological_closure_assign(x: *mut $tag) {
                get_mut(x, $what)?.0.topological_closure_assign()?;
                Ok(0)
            }
        }

        native_fn! {
            /// `var := le / d`.
            fn affine_image(
                x: *mut $tag,
                var: ppl_dimension_type,
                le: *const ppl_Linear_Expression_tag,
                d: *const ppl_Coefficient_tag,
            ) {
                let le = get(le, "linear expression")?.0.clone();
                let d = coefficient(d)?.clone();
                get_mut(x, $what)?.0.affine_image(var, &le, &d)?;
                Ok(0)
            }
        }

        native_fn! {
            fn affine_preimage(
                x: *mut $tag,
                var: ppl_dimension_type,
                le: *const ppl_Linear_Expression_tag,
                d: *const ppl_Coefficient_tag,
            ) {
                let le = get(le, "linear expression")?.0.clone();
                let d = coefficient(d)?.clone();
                get_mut(x, $what)?.0.affine_preimage(var, &le, &d)?;
                Ok(0)
            }
        }

        native_fn! {
            fn unconstrain_space_dimension(x: *mut $tag, var: ppl_dimension_type) {
                get_mut(x, $what)?.0.unconstrain(var)?;
                Ok(0)
            }
        }

        native_fn! {
            fn add_space_dimensions_and_embed(x: *mut $tag, m: ppl_dimension_type) {
                get_mut(x, $what)?.0.add_space_dimensions_and_embed(m)?;
                Ok(0)
            }
        }

        native_fn! {
            fn add_space_dimensions_and_project(x: *mut $tag, m: ppl_dimension_type) {
                get_mut(x, $what)?.0.add_space_dimensions_and_project(m)?;
                Ok(0)
            }
        }

        native_fn! {
            fn remove_space_dimensions(
                x: *mut $tag,
                ds: *const ppl_dimension_type,
                n: usize,
            ) {
                let vars: BTreeSet<usize> = index_slice(ds, n)?.iter().copied().collect();
                get_mut(x, $what)?.0.remove_space_dimensions(&vars)?;
                Ok(0)
            }
        }

        native_fn! {
            fn remove_higher_space_dimensions(x: *mut $tag, d: ppl_dimension_type) {
                get_mut(x, $what)?.0.remove_higher_space_dimensions(d)?;
                Ok(0)
            }
        }

        native_fn! {
            /// The family's standard widening; `tp` may be null.
            fn widening_assign_with_tokens(x: *mut $tag, y: *const $tag, tp: *mut c_uint) {
                let y = get(y, $what)?.0.clone();
                let x = &mut get_mut(x, $what)?.0;
                let widened = x.widened(&y)?;
                commit_with_tokens(x, widened, tp)
            }
        }

        native_fn! {
            fn narrowing_assign(x: *mut $tag, y: *const $tag) {
                let y = get(y, $what)?.0.clone();
                let x = &mut get_mut(x, $what)?.0;
                *x = x.narrowed(&y)?;
                Ok(0)
            }
        }

        native_fn! {
            fn limited_extrapolation_assign_with_tokens(
                x: *mut $tag,
                y: *const $tag,
                cs: *const ppl_Constraint_System_tag,
                tp: *mut c_uint,
            ) {
                let y = get(y, $what)?.0.clone();
                let cs = get(cs, "constraint system")?.0.items().to_vec();
                let x = &mut get_mut(x, $what)?.0;
                let widened = x.limited_extrapolation(&y, &cs)?;
                commit_with_tokens(x, widened, tp)
            }
        }

        native_fn! {
            /// Text released with `ppl_free_string`.
            fn io_asprint(x: *const $tag, out: *mut *mut c_char) {
                give_string(out, get(x, $what)?.0.render()?)
            }
        }
    };
}

pub(crate) use shape_abi;
