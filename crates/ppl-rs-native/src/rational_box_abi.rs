//! Rational boxes.

use crate::engine::{BoxVal, Poly};
use crate::shape_abi::{checked_dimension, complexity_class, shape_abi};
use crate::types::{ppl_Generator_System_tag, ppl_Polyhedron_tag, ppl_Rational_Box_tag};

shape_abi!(ppl_Rational_Box_tag, "rational box");

native_fn! {
    fn new_from_space_dimension(
        px: *mut *mut ppl_Rational_Box_tag,
        d: ppl_dimension_type,
        empty: c_int,
    ) {
        let d = checked_dimension(d)?;
        let b = if empty != 0 {
            BoxVal::empty(d)?
        } else {
            BoxVal::universe(d)?
        };
        give(px, ppl_Rational_Box_tag(b))
    }
}

native_fn! {
    /// Constraints that are not interval constraints are ignored.
    fn new_from_constraints(
        px: *mut *mut ppl_Rational_Box_tag,
        cs: *const ppl_Constraint_System_tag,
    ) {
        let cs = &get(cs, "constraint system")?.0;
        give(px, ppl_Rational_Box_tag(BoxVal::from_constraints(cs)?))
    }
}

native_fn! {
    fn new_from_congruences(
        px: *mut *mut ppl_Rational_Box_tag,
        cs: *const ppl_Congruence_System_tag,
    ) {
        let cs = &get(cs, "congruence system")?.0;
        give(px, ppl_Rational_Box_tag(BoxVal::from_congruences(cs)?))
    }
}

native_fn! {
    /// The bounding box of the generated set.
    fn new_from_generators(
        px: *mut *mut ppl_Rational_Box_tag,
        gs: *const ppl_Generator_System_tag,
    ) {
        let gs = &get(gs, "generator system")?.0;
        give(px, ppl_Rational_Box_tag(BoxVal::from_generators(gs)?))
    }
}

native_fn! {
    fn new_from_rational_box(
        px: *mut *mut ppl_Rational_Box_tag,
        y: *const ppl_Rational_Box_tag,
        complexity: c_int,
    ) {
        complexity_class(complexity)?;
        let y = get(y, "rational box")?.0.clone();
        give(px, ppl_Rational_Box_tag(y))
    }
}

native_fn! {
    /// Polynomial complexity reads bounds off the constraint rows; the other
    /// classes compute the tightest box.
    fn new_from_polyhedron(
        px: *mut *mut ppl_Rational_Box_tag,
        y: *const ppl_Polyhedron_tag,
        complexity: c_int,
    ) {
        let complexity = complexity_class(complexity)?;
        let y: &Poly = &get(y, "polyhedron")?.0;
        give(px, ppl_Rational_Box_tag(BoxVal::from_poly(y, complexity)?))
    }
}
