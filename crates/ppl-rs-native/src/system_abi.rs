//! Descriptor systems and their read cursors.
//!
//! Each system kind gets one module with the same entry points. A cursor is
//! a (system, index) pair; dereferencing yields a pointer into the system that
//! stays valid until the system is next mutated or deleted.

macro_rules! system_abi {
    ($module:ident, $system:ident, $item:ident, $cursor:ident, $what:literal) => {
        pub mod $module {
            use crate::engine::DescSystem;
            use crate::macros::native_fn;
            use crate::types::{$cursor, $item, $system, SystemCursor, ppl_dimension_type};
            use crate::util::{get, get_mut, give, put, take_back};
            use crate::status::flag;

            native_fn! {
                fn new(ps: *mut *mut $system) {
                    give(ps, $system(DescSystem::default()))
                }
            }

            native_fn! {
                fn new_from_item(ps: *mut *mut $system, d: *const $item) {
                    let d = get(d, "descriptor")?.0.clone();
                    give(ps, $system(DescSystem::singleton(d)))
                }
            }

            native_fn! {
                fn copy(ps: *mut *mut $system, s: *const $system) {
                    let s = get(s, $what)?.0.clone();
                    give(ps, $system(s))
                }
            }

            native_fn! {
                fn insert(s: *mut $system, d: *const $item) {
                    let d = get(d, "descriptor")?.0.clone();
                    get_mut(s, $what)?.0.insert(d);
                    Ok(0)
                }
            }

            native_fn! {
                fn clear(s: *mut $system) {
                    get_mut(s, $what)?.0.clear();
                    Ok(0)
                }
            }

            native_fn! {
                /// `1` when the system holds no descriptor.
                fn empty(s: *const $system) {
                    Ok(flag(get(s, $what)?.0.is_empty()))
                }
            }

            native_fn! {
                fn space_dimension(s: *const $system, out: *mut ppl_dimension_type) {
                    put(out, get(s, $what)?.0.space_dimension())
                }
            }

            native_fn! {
                fn delete(s: *mut $system) {
                    take_back(s)
                }
            }

            native_fn! {
                fn begin(s: *const $system, pit: *mut *mut $cursor) {
                    get(s, $what)?;
                    give(pit, SystemCursor { system: s, index: 0 })
                }
            }

            native_fn! {
                fn end(s: *const $system, pit: *mut *mut $cursor) {
                    let len = get(s, $what)?.0.items().len();
                    give(pit, SystemCursor { system: s, index: len })
                }
            }

            native_fn! {
                /// `1` when both cursors denote the same position.
                fn iterator_equal_test(a: *const $cursor, b: *const $cursor) {
                    let a = get(a, "iterator")?;
                    let b = get(b, "iterator")?;
                    Ok(flag(std::ptr::eq(a.system, b.system) && a.index == b.index))
                }
            }

            native_fn! {
                fn iterator_dereference(it: *const $cursor, pd: *mut *const $item) {
                    let it = get(it, "iterator")?;
                    let system = get(it.system, $what)?;
                    let item = system.0.items().get(it.index).ok_or_else(|| {
                        crate::engine::EngineError::invalid("dereferencing an end iterator")
                    })?;
                    // SAFETY: the tag is a transparent wrapper of the item.
                    let item = std::ptr::from_ref(item).cast::<$item>();
                    put(pd, item)
                }
            }

            native_fn! {
                fn iterator_increment(it: *mut $cursor) {
                    let it = get_mut(it, "iterator")?;
                    let len = get(it.system, $what)?.0.items().len();
                    if it.index >= len {
                        return Err(crate::engine::EngineError::invalid(
                            "incrementing an end iterator",
                        ));
                    }
                    it.index += 1;
                    Ok(0)
                }
            }

            native_fn! {
                fn iterator_delete(it: *mut $cursor) {
                    take_back(it)
                }
            }
        }
    };
}

system_abi!(
    constraint_system,
    ppl_Constraint_System_tag,
    ppl_Constraint_tag,
    ppl_Constraint_System_const_iterator_tag,
    "constraint system"
);
system_abi!(
    congruence_system,
    ppl_Congruence_System_tag,
    ppl_Congruence_tag,
    ppl_Congruence_System_const_iterator_tag,
    "congruence system"
);
system_abi!(
    generator_system,
    ppl_Generator_System_tag,
    ppl_Generator_tag,
    ppl_Generator_System_const_iterator_tag,
    "generator system"
);
system_abi!(
    grid_generator_system,
    ppl_Grid_Generator_System_tag,
    ppl_Grid_Generator_tag,
    ppl_Grid_Generator_System_const_iterator_tag,
    "grid generator system"
);
