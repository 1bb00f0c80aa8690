//! Convex polyhedra. The topology is chosen at construction and checked on
//! every binary operation.

use crate::engine::{BoxVal, EngineError, Poly, Topology};
use crate::shape_abi::{checked_dimension, complexity_class, shape_abi};
use crate::types::{
    PPL_TOPOLOGY_CLOSED, PPL_TOPOLOGY_NNC, ppl_Generator_System_tag, ppl_Polyhedron_tag,
    ppl_Rational_Box_tag,
};

shape_abi!(ppl_Polyhedron_tag, "polyhedron");

fn topology(t: c_int) -> Result<Topology, EngineError> {
    match t {
        PPL_TOPOLOGY_CLOSED => Ok(Topology::Closed),
        PPL_TOPOLOGY_NNC => Ok(Topology::NotNecessarilyClosed),
        other => Err(EngineError::invalid(format!("unknown topology {other}"))),
    }
}

native_fn! {
    /// The universe, or the empty polyhedron when `empty` is non-zero.
    fn new_from_space_dimension(
        px: *mut *mut ppl_Polyhedron_tag,
        t: c_int,
        d: ppl_dimension_type,
        empty: c_int,
    ) {
        let t = topology(t)?;
        let d = checked_dimension(d)?;
        let p = if empty != 0 {
            Poly::empty(d, t)
        } else {
            Poly::universe(d, t)
        };
        give(px, ppl_Polyhedron_tag(p))
    }
}

native_fn! {
    fn new_from_constraints(
        px: *mut *mut ppl_Polyhedron_tag,
        t: c_int,
        cs: *const ppl_Constraint_System_tag,
    ) {
        let t = topology(t)?;
        let cs = &get(cs, "constraint system")?.0;
        give(px, ppl_Polyhedron_tag(Poly::from_constraints(cs, t)?))
    }
}

native_fn! {
    fn new_from_congruences(
        px: *mut *mut ppl_Polyhedron_tag,
        t: c_int,
        cs: *const ppl_Congruence_System_tag,
    ) {
        let t = topology(t)?;
        let cs = &get(cs, "congruence system")?.0;
        give(px, ppl_Polyhedron_tag(Poly::from_congruences(cs, t)?))
    }
}

native_fn! {
    fn new_from_generators(
        px: *mut *mut ppl_Polyhedron_tag,
        t: c_int,
        gs: *const ppl_Generator_System_tag,
    ) {
        let t = topology(t)?;
        let gs = &get(gs, "generator system")?.0;
        give(px, ppl_Polyhedron_tag(Poly::from_generators(gs, t)?))
    }
}

native_fn! {
    /// Exact for every complexity class; closing the set when `t` is closed.
    fn new_from_polyhedron(
        px: *mut *mut ppl_Polyhedron_tag,
        t: c_int,
        y: *const ppl_Polyhedron_tag,
        complexity: c_int,
    ) {
        let t = topology(t)?;
        complexity_class(complexity)?;
        let y = &get(y, "polyhedron")?.0;
        give(px, ppl_Polyhedron_tag(y.converted(t)))
    }
}

native_fn! {
    fn new_from_rational_box(
        px: *mut *mut ppl_Polyhedron_tag,
        t: c_int,
        y: *const ppl_Rational_Box_tag,
        complexity: c_int,
    ) {
        let t = topology(t)?;
        complexity_class(complexity)?;
        let y: &BoxVal = &get(y, "rational box")?.0;
        give(px, ppl_Polyhedron_tag(Poly::from_box(y, t)?))
    }
}

native_fn! {
    /// `PPL_TOPOLOGY_CLOSED` or `PPL_TOPOLOGY_NNC`.
    fn topology_of(x: *const ppl_Polyhedron_tag) {
        Ok(match get(x, "polyhedron")?.0.topology() {
            Topology::Closed => PPL_TOPOLOGY_CLOSED,
            Topology::NotNecessarilyClosed => PPL_TOPOLOGY_NNC,
        })
    }
}

native_fn! {
    fn get_generators(x: *const ppl_Polyhedron_tag, pgs: *mut *mut ppl_Generator_System_tag) {
        let x = &get(x, "polyhedron")?.0;
        let gens = x.generators()?;
        give(pgs, ppl_Generator_System_tag(DescSystem::from_items(gens, x.space_dimension())))
    }
}

native_fn! {
    fn get_minimized_generators(
        x: *const ppl_Polyhedron_tag,
        pgs: *mut *mut ppl_Generator_System_tag,
    ) {
        let x = &get(x, "polyhedron")?.0;
        let gens = x.minimized_generators()?;
        give(pgs, ppl_Generator_System_tag(DescSystem::from_items(gens, x.space_dimension())))
    }
}

native_fn! {
    fn add_generator(x: *mut ppl_Polyhedron_tag, g: *const ppl_Generator_tag) {
        let g = get(g, "generator")?.0.clone();
        get_mut(x, "polyhedron")?.0.add_generator(&g)?;
        Ok(0)
    }
}

native_fn! {
    fn add_generators(x: *mut ppl_Polyhedron_tag, gs: *const ppl_Generator_System_tag) {
        let gs = get(gs, "generator system")?.0.items().to_vec();
        get_mut(x, "polyhedron")?.0.add_generators(&gs)?;
        Ok(0)
    }
}

native_fn! {
    /// Limited H79 extrapolation further bounded by the box widening.
    fn bounded_extrapolation_assign_with_tokens(
        x: *mut ppl_Polyhedron_tag,
        y: *const ppl_Polyhedron_tag,
        cs: *const ppl_Constraint_System_tag,
        tp: *mut c_uint,
    ) {
        let y = get(y, "polyhedron")?.0.clone();
        let cs = get(cs, "constraint system")?.0.items().to_vec();
        let x = &mut get_mut(x, "polyhedron")?.0;
        let widened = x.bounded_h79(&y, &cs)?;
        commit_with_tokens(x, widened, tp)
    }
}
