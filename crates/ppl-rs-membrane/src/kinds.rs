//! Handle kinds of every native object type.

use std::ffi::c_int;

use ppl_rs_native::types::*;
use ppl_rs_native::{descriptor_abi, mpz_abi, polyhedron_abi, rational_box_abi, system_abi};

use crate::handle::{ForeignKind, NativeHandle};

macro_rules! kinds {
    ($($(#[$meta:meta])* $kind:ident => $raw:ty, $name:literal, $delete:path;)*) => {
        $(
            $(#[$meta])*
            pub enum $kind {}

            impl ForeignKind for $kind {
                type Raw = $raw;
                const NAME: &'static str = $name;
                const DELETE: unsafe extern "C" fn(*mut $raw) -> c_int = $delete;
            }
        )*
    };
}

kinds! {
    CoefficientKind => ppl_Coefficient_tag, "coefficient", mpz_abi::ppl_delete_Coefficient;
    LinearExpressionKind => ppl_Linear_Expression_tag, "linear expression",
        descriptor_abi::ppl_delete_Linear_Expression;
    ConstraintKind => ppl_Constraint_tag, "constraint", descriptor_abi::ppl_delete_Constraint;
    CongruenceKind => ppl_Congruence_tag, "congruence", descriptor_abi::ppl_delete_Congruence;
    GeneratorKind => ppl_Generator_tag, "generator", descriptor_abi::ppl_delete_Generator;
    GridGeneratorKind => ppl_Grid_Generator_tag, "grid generator",
        descriptor_abi::ppl_delete_Grid_Generator;

    ConstraintSystemKind => ppl_Constraint_System_tag, "constraint system",
        system_abi::constraint_system::delete;
    CongruenceSystemKind => ppl_Congruence_System_tag, "congruence system",
        system_abi::congruence_system::delete;
    GeneratorSystemKind => ppl_Generator_System_tag, "generator system",
        system_abi::generator_system::delete;
    GridGeneratorSystemKind => ppl_Grid_Generator_System_tag, "grid generator system",
        system_abi::grid_generator_system::delete;

    ConstraintCursorKind => ppl_Constraint_System_const_iterator_tag, "constraint cursor",
        system_abi::constraint_system::iterator_delete;
    CongruenceCursorKind => ppl_Congruence_System_const_iterator_tag, "congruence cursor",
        system_abi::congruence_system::iterator_delete;
    GeneratorCursorKind => ppl_Generator_System_const_iterator_tag, "generator cursor",
        system_abi::generator_system::iterator_delete;
    GridGeneratorCursorKind => ppl_Grid_Generator_System_const_iterator_tag,
        "grid generator cursor", system_abi::grid_generator_system::iterator_delete;

    /// Closed or NNC; the topology lives on the native side.
    PolyhedronKind => ppl_Polyhedron_tag, "polyhedron", polyhedron_abi::delete;
    RationalBoxKind => ppl_Rational_Box_tag, "rational box", rational_box_abi::delete;
}

pub type Coefficient = NativeHandle<CoefficientKind>;
