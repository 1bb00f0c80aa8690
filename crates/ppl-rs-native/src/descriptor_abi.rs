//! Linear expressions and the four descriptor kinds.
//!
//! Descriptors are immutable once built. Readers fetch one coefficient at a
//! time into a caller-owned coefficient object.

use std::ffi::c_int;

use num_bigint::BigInt;

use crate::engine::{
    Cg, Con, EngineError, Gen, GenKind, GridGen, GridGenKind, LinExpr, Rel, budget,
    shape::MAX_SPACE_DIMENSION,
};
use crate::macros::native_fn;
use crate::types::*;
use crate::util::{coefficient, get, get_mut, give, put, store_coefficient, take_back};

fn constraint_type(c: &Con) -> c_int {
    match c.rel {
        Rel::Equal => PPL_CONSTRAINT_TYPE_EQUAL,
        Rel::GreaterOrEqual => PPL_CONSTRAINT_TYPE_GREATER_OR_EQUAL,
        Rel::GreaterThan => PPL_CONSTRAINT_TYPE_GREATER_THAN,
    }
}

fn generator_kind(t: c_int) -> Result<GenKind, EngineError> {
    Ok(match t {
        PPL_GENERATOR_TYPE_LINE => GenKind::Line,
        PPL_GENERATOR_TYPE_RAY => GenKind::Ray,
        PPL_GENERATOR_TYPE_POINT => GenKind::Point,
        PPL_GENERATOR_TYPE_CLOSURE_POINT => GenKind::ClosurePoint,
        other => return Err(EngineError::invalid(format!("unknown generator type {other}"))),
    })
}

fn grid_generator_kind(t: c_int) -> Result<GridGenKind, EngineError> {
    Ok(match t {
        PPL_GRID_GENERATOR_TYPE_LINE => GridGenKind::Line,
        PPL_GRID_GENERATOR_TYPE_PARAMETER => GridGenKind::Parameter,
        PPL_GRID_GENERATOR_TYPE_POINT => GridGenKind::Point,
        other => {
            return Err(EngineError::invalid(format!("unknown grid generator type {other}")));
        }
    })
}

// Linear expressions.

native_fn! {
    export fn ppl_new_Linear_Expression(ple: *mut *mut ppl_Linear_Expression_tag) {
        give(ple, ppl_Linear_Expression_tag(LinExpr::default()))
    }
}

native_fn! {
    export fn ppl_new_Linear_Expression_with_dimension(
        ple: *mut *mut ppl_Linear_Expression_tag,
        d: ppl_dimension_type,
    ) {
        if d > MAX_SPACE_DIMENSION {
            return Err(EngineError::Length(format!(
                "linear expression of dimension {d} exceeds the maximum space dimension"
            )));
        }
        give(ple, ppl_Linear_Expression_tag(LinExpr::zero(d)))
    }
}

native_fn! {
    export fn ppl_Linear_Expression_space_dimension(
        le: *const ppl_Linear_Expression_tag,
        out: *mut ppl_dimension_type,
    ) {
        put(out, get(le, "linear expression")?.0.space_dimension())
    }
}

native_fn! {
    export fn ppl_Linear_Expression_coefficient(
        le: *const ppl_Linear_Expression_tag,
        var: ppl_dimension_type,
        out: *mut ppl_Coefficient_tag,
    ) {
        store_coefficient(out, get(le, "linear expression")?.0.coeff(var))
    }
}

native_fn! {
    export fn ppl_Linear_Expression_inhomogeneous_term(
        le: *const ppl_Linear_Expression_tag,
        out: *mut ppl_Coefficient_tag,
    ) {
        store_coefficient(out, get(le, "linear expression")?.0.constant.clone())
    }
}

native_fn! {
    /// Adds `c` to the coefficient of `var`, growing the expression as needed.
    export fn ppl_Linear_Expression_add_to_coefficient(
        le: *mut ppl_Linear_Expression_tag,
        var: ppl_dimension_type,
        c: *const ppl_Coefficient_tag,
    ) {
        if var >= MAX_SPACE_DIMENSION {
            return Err(EngineError::Length(format!(
                "variable {var} exceeds the maximum space dimension"
            )));
        }
        let c = coefficient(c)?.clone();
        let le = get_mut(le, "linear expression")?;
        le.0.add_to_coeff(var, &c);
        budget::check_coefficient(&le.0.coeff(var))?;
        Ok(0)
    }
}

native_fn! {
    export fn ppl_Linear_Expression_add_to_inhomogeneous(
        le: *mut ppl_Linear_Expression_tag,
        c: *const ppl_Coefficient_tag,
    ) {
        let c = coefficient(c)?.clone();
        let le = get_mut(le, "linear expression")?;
        le.0.constant += c;
        budget::check_coefficient(&le.0.constant)?;
        Ok(0)
    }
}

native_fn! {
    export fn ppl_delete_Linear_Expression(le: *mut ppl_Linear_Expression_tag) {
        take_back(le)
    }
}

// Constraints.

native_fn! {
    /// `le type 0`; the two "less" types are stored flipped.
    export fn ppl_new_Constraint(
        pc: *mut *mut ppl_Constraint_tag,
        le: *const ppl_Linear_Expression_tag,
        t: c_int,
    ) {
        let e = get(le, "linear expression")?.0.clone();
        let c = match t {
            PPL_CONSTRAINT_TYPE_LESS_THAN => Con::new(e.negated(), Rel::GreaterThan),
            PPL_CONSTRAINT_TYPE_LESS_OR_EQUAL => Con::new(e.negated(), Rel::GreaterOrEqual),
            PPL_CONSTRAINT_TYPE_EQUAL => Con::new(e, Rel::Equal),
            PPL_CONSTRAINT_TYPE_GREATER_OR_EQUAL => Con::new(e, Rel::GreaterOrEqual),
            PPL_CONSTRAINT_TYPE_GREATER_THAN => Con::new(e, Rel::GreaterThan),
            other => return Err(EngineError::invalid(format!("unknown constraint type {other}"))),
        };
        give(pc, ppl_Constraint_tag(c))
    }
}

native_fn! {
    export fn ppl_Constraint_space_dimension(
        c: *const ppl_Constraint_tag,
        out: *mut ppl_dimension_type,
    ) {
        put(out, get(c, "constraint")?.0.space_dimension())
    }
}

native_fn! {
    /// Returns one of the non-"less" `PPL_CONSTRAINT_TYPE_*` values.
    export fn ppl_Constraint_type(c: *const ppl_Constraint_tag) {
        Ok(constraint_type(&get(c, "constraint")?.0))
    }
}

native_fn! {
    export fn ppl_Constraint_coefficient(
        c: *const ppl_Constraint_tag,
        var: ppl_dimension_type,
        out: *mut ppl_Coefficient_tag,
    ) {
        store_coefficient(out, get(c, "constraint")?.0.coeff(var))
    }
}

native_fn! {
    export fn ppl_Constraint_inhomogeneous_term(
        c: *const ppl_Constraint_tag,
        out: *mut ppl_Coefficient_tag,
    ) {
        store_coefficient(out, get(c, "constraint")?.0.expr.constant.clone())
    }
}

native_fn! {
    export fn ppl_delete_Constraint(c: *mut ppl_Constraint_tag) {
        take_back(c)
    }
}

// Congruences.

native_fn! {
    /// `le ≡ 0 (mod m)`; a zero modulus makes an equality.
    export fn ppl_new_Congruence(
        pc: *mut *mut ppl_Congruence_tag,
        le: *const ppl_Linear_Expression_tag,
        m: *const ppl_Coefficient_tag,
    ) {
        let expr = get(le, "linear expression")?.0.clone();
        let modulus = coefficient(m)?.clone();
        if modulus < BigInt::from(0) {
            return Err(EngineError::invalid("negative congruence modulus"));
        }
        give(pc, ppl_Congruence_tag(Cg { expr, modulus }))
    }
}

native_fn! {
    export fn ppl_Congruence_space_dimension(
        c: *const ppl_Congruence_tag,
        out: *mut ppl_dimension_type,
    ) {
        put(out, get(c, "congruence")?.0.space_dimension())
    }
}

native_fn! {
    export fn ppl_Congruence_coefficient(
        c: *const ppl_Congruence_tag,
        var: ppl_dimension_type,
        out: *mut ppl_Coefficient_tag,
    ) {
        store_coefficient(out, get(c, "congruence")?.0.expr.coeff(var))
    }
}

native_fn! {
    export fn ppl_Congruence_inhomogeneous_term(
        c: *const ppl_Congruence_tag,
        out: *mut ppl_Coefficient_tag,
    ) {
        store_coefficient(out, get(c, "congruence")?.0.expr.constant.clone())
    }
}

native_fn! {
    export fn ppl_Congruence_modulus(c: *const ppl_Congruence_tag, out: *mut ppl_Coefficient_tag) {
        store_coefficient(out, get(c, "congruence")?.0.modulus.clone())
    }
}

native_fn! {
    export fn ppl_delete_Congruence(c: *mut ppl_Congruence_tag) {
        take_back(c)
    }
}

// Generators.

native_fn! {
    /// The divisor is ignored for lines and rays and must be non-zero otherwise.
    export fn ppl_new_Generator(
        pg: *mut *mut ppl_Generator_tag,
        le: *const ppl_Linear_Expression_tag,
        t: c_int,
        d: *const ppl_Coefficient_tag,
    ) {
        let kind = generator_kind(t)?;
        let expr = get(le, "linear expression")?.0.clone();
        let divisor = coefficient(d)?.clone();
        give(pg, ppl_Generator_tag(Gen::new(kind, expr, divisor)?))
    }
}

native_fn! {
    export fn ppl_Generator_space_dimension(
        g: *const ppl_Generator_tag,
        out: *mut ppl_dimension_type,
    ) {
        put(out, get(g, "generator")?.0.space_dimension())
    }
}

native_fn! {
    export fn ppl_Generator_type(g: *const ppl_Generator_tag) {
        Ok(match get(g, "generator")?.0.kind {
            GenKind::Line => PPL_GENERATOR_TYPE_LINE,
            GenKind::Ray => PPL_GENERATOR_TYPE_RAY,
            GenKind::Point => PPL_GENERATOR_TYPE_POINT,
            GenKind::ClosurePoint => PPL_GENERATOR_TYPE_CLOSURE_POINT,
        })
    }
}

native_fn! {
    export fn ppl_Generator_coefficient(
        g: *const ppl_Generator_tag,
        var: ppl_dimension_type,
        out: *mut ppl_Coefficient_tag,
    ) {
        store_coefficient(out, get(g, "generator")?.0.expr.coeff(var))
    }
}

native_fn! {
    export fn ppl_Generator_divisor(g: *const ppl_Generator_tag, out: *mut ppl_Coefficient_tag) {
        let g = &get(g, "generator")?.0;
        if !g.is_point_like() {
            return Err(EngineError::invalid("only points and closure points have a divisor"));
        }
        store_coefficient(out, g.divisor.clone())
    }
}

native_fn! {
    export fn ppl_delete_Generator(g: *mut ppl_Generator_tag) {
        take_back(g)
    }
}

// Grid generators.

native_fn! {
    export fn ppl_new_Grid_Generator(
        pg: *mut *mut ppl_Grid_Generator_tag,
        le: *const ppl_Linear_Expression_tag,
        t: c_int,
        d: *const ppl_Coefficient_tag,
    ) {
        let kind = grid_generator_kind(t)?;
        let expr = get(le, "linear expression")?.0.clone();
        let divisor = coefficient(d)?.clone();
        give(pg, ppl_Grid_Generator_tag(GridGen::new(kind, expr, divisor)?))
    }
}

native_fn! {
    export fn ppl_Grid_Generator_space_dimension(
        g: *const ppl_Grid_Generator_tag,
        out: *mut ppl_dimension_type,
    ) {
        put(out, get(g, "grid generator")?.0.space_dimension())
    }
}

native_fn! {
    export fn ppl_Grid_Generator_type(g: *const ppl_Grid_Generator_tag) {
        Ok(match get(g, "grid generator")?.0.kind {
            GridGenKind::Line => PPL_GRID_GENERATOR_TYPE_LINE,
            GridGenKind::Parameter => PPL_GRID_GENERATOR_TYPE_PARAMETER,
            GridGenKind::Point => PPL_GRID_GENERATOR_TYPE_POINT,
        })
    }
}

native_fn! {
    export fn ppl_Grid_Generator_coefficient(
        g: *const ppl_Grid_Generator_tag,
        var: ppl_dimension_type,
        out: *mut ppl_Coefficient_tag,
    ) {
        store_coefficient(out, get(g, "grid generator")?.0.expr.coeff(var))
    }
}

native_fn! {
    export fn ppl_Grid_Generator_divisor(
        g: *const ppl_Grid_Generator_tag,
        out: *mut ppl_Coefficient_tag,
    ) {
        let g = &get(g, "grid generator")?.0;
        if g.kind == GridGenKind::Line {
            return Err(EngineError::invalid("grid lines have no divisor"));
        }
        store_coefficient(out, g.divisor.clone())
    }
}

native_fn! {
    export fn ppl_delete_Grid_Generator(g: *mut ppl_Grid_Generator_tag) {
        take_back(g)
    }
}
