//! Entry points every abstract-object family shares.

use std::ffi::{c_char, c_int, c_uint};

use ppl_rs_native::types::*;

pub(crate) type Unary<T> = unsafe extern "C" fn(*const T) -> c_int;
pub(crate) type Binary<T> = unsafe extern "C" fn(*const T, *const T) -> c_int;
pub(crate) type Assign<T> = unsafe extern "C" fn(*mut T, *const T) -> c_int;
pub(crate) type Dimension<T> = unsafe extern "C" fn(*const T, *mut usize) -> c_int;
pub(crate) type Resize<T> = unsafe extern "C" fn(*mut T, usize) -> c_int;
pub(crate) type Bound<T> = unsafe extern "C" fn(*const T, *const ppl_Linear_Expression_tag) -> c_int;
pub(crate) type Refine<T, D> = unsafe extern "C" fn(*mut T, *const D) -> c_int;
pub(crate) type Extract<T, S> = unsafe extern "C" fn(*const T, *mut *mut S) -> c_int;
pub(crate) type Affine<T> = unsafe extern "C" fn(
    *mut T,
    usize,
    *const ppl_Linear_Expression_tag,
    *const ppl_Coefficient_tag,
) -> c_int;
pub(crate) type Optimize<T> = unsafe extern "C" fn(
    *const T,
    *const ppl_Linear_Expression_tag,
    *mut ppl_Coefficient_tag,
    *mut ppl_Coefficient_tag,
    *mut c_int,
    *mut *mut ppl_Generator_tag,
) -> c_int;
pub(crate) type Limited<T> =
    unsafe extern "C" fn(*mut T, *const T, *const ppl_Constraint_System_tag, *mut c_uint) -> c_int;

#[doc(hidden)]
pub struct FamilyOps<T> {
    pub(crate) copy: unsafe extern "C" fn(*mut *mut T, *const T) -> c_int,
    pub(crate) space_dimension: Dimension<T>,
    pub(crate) affine_dimension: Dimension<T>,
    pub(crate) is_empty: Unary<T>,
    pub(crate) is_universe: Unary<T>,
    pub(crate) is_bounded: Unary<T>,
    pub(crate) is_discrete: Unary<T>,
    pub(crate) is_topologically_closed: Unary<T>,
    pub(crate) contains: Binary<T>,
    pub(crate) strictly_contains: Binary<T>,
    pub(crate) is_disjoint_from: Binary<T>,
    pub(crate) equals: Binary<T>,
    pub(crate) constrains: unsafe extern "C" fn(*const T, usize) -> c_int,
    pub(crate) bounds_from_above: Bound<T>,
    pub(crate) bounds_from_below: Bound<T>,
    pub(crate) relation_with_constraint: unsafe extern "C" fn(*const T, *const ppl_Constraint_tag) -> c_int,
    pub(crate) maximize: Optimize<T>,
    pub(crate) minimize: Optimize<T>,
    pub(crate) get_constraints: Extract<T, ppl_Constraint_System_tag>,
    pub(crate) get_minimized_constraints: Extract<T, ppl_Constraint_System_tag>,
    pub(crate) get_congruences: Extract<T, ppl_Congruence_System_tag>,
    pub(crate) get_minimized_congruences: Extract<T, ppl_Congruence_System_tag>,
    pub(crate) add_constraint: Refine<T, ppl_Constraint_tag>,
    pub(crate) refine_with_constraint: Refine<T, ppl_Constraint_tag>,
    pub(crate) add_congruence: Refine<T, ppl_Congruence_tag>,
    pub(crate) refine_with_congruence: Refine<T, ppl_Congruence_tag>,
    pub(crate) add_constraints: Refine<T, ppl_Constraint_System_tag>,
    pub(crate) refine_with_constraints: Refine<T, ppl_Constraint_System_tag>,
    pub(crate) add_congruences: Refine<T, ppl_Congruence_System_tag>,
    pub(crate) refine_with_congruences: Refine<T, ppl_Congruence_System_tag>,
    pub(crate) intersection_assign: Assign<T>,
    pub(crate) upper_bound_assign: Assign<T>,
    pub(crate) difference_assign: Assign<T>,
    pub(crate) concatenate_assign: Assign<T>,
    pub(crate) time_elapse_assign: Assign<T>,
    pub(crate) topological_closure_assign: unsafe extern "C" fn(*mut T) -> c_int,
    pub(crate) affine_image: Affine<T>,
    pub(crate) affine_preimage: Affine<T>,
    pub(crate) unconstrain_space_dimension: Resize<T>,
    pub(crate) add_space_dimensions_and_embed: Resize<T>,
    pub(crate) add_space_dimensions_and_project: Resize<T>,
    pub(crate) remove_space_dimensions: unsafe extern "C" fn(*mut T, *const usize, usize) -> c_int,
    pub(crate) remove_higher_space_dimensions: Resize<T>,
    pub(crate) widening_assign_with_tokens: unsafe extern "C" fn(*mut T, *const T, *mut c_uint) -> c_int,
    pub(crate) narrowing_assign: Assign<T>,
    pub(crate) limited_extrapolation_assign_with_tokens: Limited<T>,
    pub(crate) io_asprint: unsafe extern "C" fn(*const T, *mut *mut c_char) -> c_int,
}

/// Collect a family module's shared entry points.
macro_rules! family_ops {
    ($module:ident) => {
        $crate::family::FamilyOps {
            copy: ppl_rs_native::$module::copy,
            space_dimension: ppl_rs_native::$module::space_dimension,
            affine_dimension: ppl_rs_native::$module::affine_dimension,
            is_empty: ppl_rs_native::$module::is_empty,
            is_universe: ppl_rs_native::$module::is_universe,
            is_bounded: ppl_rs_native::$module::is_bounded,
            is_discrete: ppl_rs_native::$module::is_discrete,
            is_topologically_closed: ppl_rs_native::$module::is_topologically_closed,
            contains: ppl_rs_native::$module::contains,
            strictly_contains: ppl_rs_native::$module::strictly_contains,
            is_disjoint_from: ppl_rs_native::$module::is_disjoint_from,
            equals: ppl_rs_native::$module::equals,
            constrains: ppl_rs_native::$module::constrains,
            bounds_from_above: ppl_rs_native::$module::bounds_from_above,
            bounds_from_below: ppl_rs_native::$module::bounds_from_below,
            relation_with_constraint: ppl_rs_native::$module::relation_with_constraint,
            maximize: ppl_rs_native::$module::maximize,
            minimize: ppl_rs_native::$module::minimize,
            get_constraints: ppl_rs_native::$module::get_constraints,
            get_minimized_constraints: ppl_rs_native::$module::get_minimized_constraints,
            get_congruences: ppl_rs_native::$module::get_congruences,
            get_minimized_congruences: ppl_rs_native::$module::get_minimized_congruences,
            add_constraint: ppl_rs_native::$module::add_constraint,
            refine_with_constraint: ppl_rs_native::$module::refine_with_constraint,
            add_congruence: ppl_rs_native::$module::add_congruence,
            refine_with_congruence: ppl_rs_native::$module::refine_with_congruence,
            add_constraints: ppl_rs_native::$module::add_constraints,
            refine_with_constraints: ppl_rs_native::$module::refine_with_constraints,
            add_congruences: ppl_rs_native::$module::add_congruences,
            refine_with_congruences: ppl_rs_native::$module::refine_with_congruences,
            intersection_assign: ppl_rs_native::$module::intersection_assign,
            upper_bound_assign: ppl_rs_native::$module::upper_bound_assign,
            difference_assign: ppl_rs_native::$module::difference_assign,
            concatenate_assign: ppl_rs_native::$module::concatenate_assign,
            time_elapse_assign: ppl_rs_native::$module::time_elapse_assign,
            topological_closure_assign: ppl_rs_native::$module::topological_closure_assign,
            affine_image: ppl_rs_native::$module::affine_image,
            affine_preimage: ppl_rs_native::$module::affine_preimage,
            unconstrain_space_dimension: ppl_rs_native::$module::unconstrain_space_dimension,
            add_space_dimensions_and_embed: ppl_rs_native::$module::add_space_dimensions_and_embed,
            add_space_dimensions_and_project: ppl_rs_native::$module::add_space_dimensions_and_project,
            remove_space_dimensions: ppl_rs_native::$module::remove_space_dimensions,
            remove_higher_space_dimensions: ppl_rs_native::$module::remove_higher_space_dimensions,
            widening_assign_with_tokens: ppl_rs_native::$module::widening_assign_with_tokens,
            narrowing_assign: ppl_rs_native::$module::narrowing_assign,
            limited_extrapolation_assign_with_tokens:
                ppl_rs_native::$module::limited_extrapolation_assign_with_tokens,
            io_asprint: ppl_rs_native::$module::io_asprint,
        }
    };
}

pub(crate) use family_ops;
