//! Opaque object types and enumeration constants of the C interface.

use std::ffi::c_int;

use num_bigint::BigInt;

use crate::engine::{BoxVal, Cg, Con, DescSystem, Gen, GridGen, LinExpr, Poly};

pub type ppl_dimension_type = usize;

pub const PPL_CONSTRAINT_TYPE_LESS_THAN: c_int = 0;
pub const PPL_CONSTRAINT_TYPE_LESS_OR_EQUAL: c_int = 1;
pub const PPL_CONSTRAINT_TYPE_EQUAL: c_int = 2;
pub const PPL_CONSTRAINT_TYPE_GREATER_OR_EQUAL: c_int = 3;
pub const PPL_CONSTRAINT_TYPE_GREATER_THAN: c_int = 4;

pub const PPL_GENERATOR_TYPE_LINE: c_int = 0;
pub const PPL_GENERATOR_TYPE_RAY: c_int = 1;
pub const PPL_GENERATOR_TYPE_POINT: c_int = 2;
pub const PPL_GENERATOR_TYPE_CLOSURE_POINT: c_int = 3;

pub const PPL_GRID_GENERATOR_TYPE_LINE: c_int = 0;
pub const PPL_GRID_GENERATOR_TYPE_PARAMETER: c_int = 1;
pub const PPL_GRID_GENERATOR_TYPE_POINT: c_int = 2;

pub const PPL_POLY_CON_RELATION_IS_DISJOINT: c_int = 1;
pub const PPL_POLY_CON_RELATION_STRICTLY_INTERSECTS: c_int = 2;
pub const PPL_POLY_CON_RELATION_IS_INCLUDED: c_int = 4;
pub const PPL_POLY_CON_RELATION_SATURATES: c_int = 8;

pub const PPL_COMPLEXITY_CLASS_POLYNOMIAL: c_int = 0;
pub const PPL_COMPLEXITY_CLASS_SIMPLEX: c_int = 1;
pub const PPL_COMPLEXITY_CLASS_ANY: c_int = 2;

pub const PPL_TOPOLOGY_CLOSED: c_int = 0;
pub const PPL_TOPOLOGY_NNC: c_int = 1;

macro_rules! opaque {
    ($($(#[$meta:meta])* $tag:ident($inner:ty);)*) => {
        $(
            $(#[$meta])*
            #[repr(transparent)]
            pub struct $tag(pub(crate) $inner);
        )*
    };
}

opaque! {
    ppl_Coefficient_tag(BigInt);
    ppl_Linear_Expression_tag(LinExpr);
    ppl_Constraint_tag(Con);
    ppl_Congruence_tag(Cg);
    ppl_Generator_tag(Gen);
    ppl_Grid_Generator_tag(GridGen);
    ppl_Constraint_System_tag(DescSystem<Con>);
    ppl_Congruence_System_tag(DescSystem<Cg>);
    ppl_Generator_System_tag(DescSystem<Gen>);
    ppl_Grid_Generator_System_tag(DescSystem<GridGen>);
    /// Closed or not necessarily closed, fixed at construction.
    ppl_Polyhedron_tag(Poly);
    ppl_Rational_Box_tag(BoxVal);
}

/// Position inside a system; stale once the system is mutated.
pub struct SystemCursor<S> {
    pub(crate) system: *const S,
    pub(crate) index: usize,
}

pub type ppl_Constraint_System_const_iterator_tag = SystemCursor<ppl_Constraint_System_tag>;
pub type ppl_Congruence_System_const_iterator_tag = SystemCursor<ppl_Congruence_System_tag>;
pub type ppl_Generator_System_const_iterator_tag = SystemCursor<ppl_Generator_System_tag>;
pub type ppl_Grid_Generator_System_const_iterator_tag =
    SystemCursor<ppl_Grid_Generator_System_tag>;
