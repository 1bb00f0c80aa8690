//! Status, error-handler and ownership contract of the C interface.

use std::ffi::{CStr, c_char, c_int, c_long, c_uint};
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use ppl_rs_native::config_abi::*;
use ppl_rs_native::descriptor_abi::*;
use ppl_rs_native::mpz_abi::*;
use ppl_rs_native::system_abi::constraint_system;
use ppl_rs_native::{polyhedron_abi, rational_box_abi};
use ppl_rs_native::*;

static TEST_GUARD_HELD: AtomicBool = AtomicBool::new(false);
static REPORTS: Mutex<Vec<(c_int, String)>> = Mutex::new(Vec::new());

struct TestGuard;

impl Drop for TestGuard {
    fn drop(&mut self) {
        TEST_GUARD_HELD.store(false, Ordering::Release);
    }
}

unsafe extern "C" fn record(code: c_int, message: *const c_char) {
    // SAFETY: the library passes a NUL-terminated message.
    let text = unsafe { CStr::from_ptr(message) }.to_string_lossy().into_owned();
    REPORTS.lock().push((code, text));
}

fn acquire_test_guard() -> TestGuard {
    loop {
        if TEST_GUARD_HELD
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            break;
        }
        std::thread::yield_now();
    }
    unsafe {
        assert_eq!(ppl_initialize(), 0);
        assert_eq!(ppl_set_error_handler(Some(record)), 0);
        assert_eq!(ppl_reset_deterministic_timeout(), 0);
        assert_eq!(ppl_set_coefficient_bits(0), 0);
    }
    REPORTS.lock().clear();
    TestGuard
}

unsafe fn coefficient(v: i64) -> *mut ppl_Coefficient_tag {
    let mut z = mpz_struct::default();
    let mut c = ptr::null_mut();
    unsafe {
        assert_eq!(ppl_mpz_init(&mut z), 0);
        assert_eq!(ppl_mpz_set_si(&mut z, v as c_long), 0);
        assert_eq!(ppl_new_Coefficient_from_mpz_t(&mut c, &z), 0);
        assert_eq!(ppl_mpz_clear(&mut z), 0);
    }
    c
}

unsafe fn value_of(c: *const ppl_Coefficient_tag) -> i64 {
    let mut z = mpz_struct::default();
    let mut out: c_long = 0;
    unsafe {
        assert_eq!(ppl_mpz_init(&mut z), 0);
        assert_eq!(ppl_Coefficient_to_mpz_t(c, &mut z), 0);
        assert_eq!(ppl_mpz_get_si(&z, &mut out), 0);
        assert_eq!(ppl_mpz_clear(&mut z), 0);
    }
    out as i64
}

unsafe fn expression(coeffs: &[i64], constant: i64) -> *mut ppl_Linear_Expression_tag {
    let mut le = ptr::null_mut();
    unsafe {
        assert_eq!(ppl_new_Linear_Expression(&mut le), 0);
        for (var, &v) in coeffs.iter().enumerate() {
            let c = coefficient(v);
            assert_eq!(ppl_Linear_Expression_add_to_coefficient(le, var, c), 0);
            ppl_delete_Coefficient(c);
        }
        let c = coefficient(constant);
        assert_eq!(ppl_Linear_Expression_add_to_inhomogeneous(le, c), 0);
        ppl_delete_Coefficient(c);
    }
    le
}

unsafe fn constraint(coeffs: &[i64], constant: i64, t: c_int) -> *mut ppl_Constraint_tag {
    let mut c = ptr::null_mut();
    unsafe {
        let le = expression(coeffs, constant);
        assert_eq!(ppl_new_Constraint(&mut c, le, t), 0);
        ppl_delete_Linear_Expression(le);
    }
    c
}

unsafe fn system(rows: &[(&[i64], i64, c_int)]) -> *mut ppl_Constraint_System_tag {
    let mut cs = ptr::null_mut();
    unsafe {
        assert_eq!(constraint_system::new(&mut cs), 0);
        for &(coeffs, constant, t) in rows {
            let c = constraint(coeffs, constant, t);
            assert_eq!(constraint_system::insert(cs, c), 0);
            ppl_delete_Constraint(c);
        }
    }
    cs
}

#[test]
fn universe_and_empty_polyhedra() {
    let _guard = acquire_test_guard();
    unsafe {
        for d in [0usize, 1, 5] {
            let mut u = ptr::null_mut();
            let mut e = ptr::null_mut();
            assert_eq!(polyhedron_abi::new_from_space_dimension(&mut u, PPL_TOPOLOGY_CLOSED, d, 0), 0);
            assert_eq!(polyhedron_abi::new_from_space_dimension(&mut e, PPL_TOPOLOGY_NNC, d, 1), 0);
            assert_eq!(polyhedron_abi::is_universe(u), 1);
            assert_eq!(polyhedron_abi::is_empty(e), 1);
            let mut got = usize::MAX;
            assert_eq!(polyhedron_abi::space_dimension(e, &mut got), 0);
            assert_eq!(got, d);
            assert_eq!(polyhedron_abi::affine_dimension(e, &mut got), 0);
            assert_eq!(got, 0);
            assert_eq!(polyhedron_abi::delete(u), 0);
            assert_eq!(polyhedron_abi::delete(e), 0);
        }
    }
    assert!(REPORTS.lock().is_empty());
}

#[test]
fn contradictory_bounds_give_empty_set() {
    let _guard = acquire_test_guard();
    unsafe {
        let cs = system(&[
            (&[1], -3, PPL_CONSTRAINT_TYPE_GREATER_OR_EQUAL),
            (&[1], -2, PPL_CONSTRAINT_TYPE_LESS_OR_EQUAL),
        ]);
        let mut p = ptr::null_mut();
        assert_eq!(polyhedron_abi::new_from_constraints(&mut p, PPL_TOPOLOGY_CLOSED, cs), 0);
        assert_eq!(polyhedron_abi::is_empty(p), 1);
        let mut b = ptr::null_mut();
        assert_eq!(rational_box_abi::new_from_constraints(&mut b, cs), 0);
        assert_eq!(rational_box_abi::is_empty(b), 1);
        polyhedron_abi::delete(p);
        rational_box_abi::delete(b);
        constraint_system::delete(cs);
    }
}

#[test]
fn failure_reports_matching_code_to_handler() {
    let _guard = acquire_test_guard();
    unsafe {
        let mut p = ptr::null_mut();
        assert_eq!(polyhedron_abi::new_from_space_dimension(&mut p, PPL_TOPOLOGY_CLOSED, 1, 0), 0);
        let strict = constraint(&[1], 0, PPL_CONSTRAINT_TYPE_GREATER_THAN);
        assert_eq!(polyhedron_abi::add_constraint(p, strict), PPL_ERROR_DOMAIN_ERROR);
        assert_eq!(polyhedron_abi::refine_with_constraint(p, strict), 0);
        ppl_delete_Constraint(strict);
        polyhedron_abi::delete(p);
    }
    let reports = REPORTS.lock();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].0, PPL_ERROR_DOMAIN_ERROR);
    assert!(!reports[0].1.is_empty());
}

#[test]
fn null_and_oversized_arguments() {
    let _guard = acquire_test_guard();
    unsafe {
        assert_eq!(polyhedron_abi::is_empty(ptr::null()), PPL_ERROR_INVALID_ARGUMENT);
        let mut max = 0usize;
        assert_eq!(ppl_max_space_dimension(&mut max), 0);
        let mut p = ptr::null_mut();
        assert_eq!(
            polyhedron_abi::new_from_space_dimension(&mut p, PPL_TOPOLOGY_CLOSED, max + 1, 0),
            PPL_ERROR_LENGTH_ERROR
        );
        assert!(p.is_null());
    }
    let codes: Vec<c_int> = REPORTS.lock().iter().map(|r| r.0).collect();
    assert_eq!(codes, vec![PPL_ERROR_INVALID_ARGUMENT, PPL_ERROR_LENGTH_ERROR]);
}

#[test]
fn integer_records_pair_init_and_clear() {
    let _guard = acquire_test_guard();
    let before = ppl_mpz_live_records();
    unsafe {
        let mut z = mpz_struct::default();
        assert_eq!(ppl_mpz_init(&mut z), 0);
        assert_eq!(ppl_mpz_live_records(), before + 1);
        let numeral = c"-123456789012345678901234567890";
        assert_eq!(ppl_mpz_set_str(&mut z, numeral.as_ptr(), 10), 0);
        let mut text = ptr::null_mut();
        assert_eq!(ppl_mpz_get_str(&z, &mut text), 0);
        assert_eq!(CStr::from_ptr(text), numeral);
        assert_eq!(ppl_free_string(text), 0);
        let mut small: c_long = 0;
        assert_eq!(ppl_mpz_get_si(&z, &mut small), PPL_ARITHMETIC_OVERFLOW);
        assert_eq!(ppl_mpz_clear(&mut z), 0);
    }
    assert_eq!(ppl_mpz_live_records(), before);
}

#[test]
fn cursors_walk_a_system_in_order() {
    let _guard = acquire_test_guard();
    unsafe {
        let cs = system(&[
            (&[1], 0, PPL_CONSTRAINT_TYPE_GREATER_OR_EQUAL),
            (&[0, 0, 1], -4, PPL_CONSTRAINT_TYPE_EQUAL),
        ]);
        let mut d = 0usize;
        assert_eq!(constraint_system::space_dimension(cs, &mut d), 0);
        assert_eq!(d, 3);
        let mut it = ptr::null_mut();
        let mut end = ptr::null_mut();
        assert_eq!(constraint_system::begin(cs, &mut it), 0);
        assert_eq!(constraint_system::end(cs, &mut end), 0);
        let mut types = Vec::new();
        while constraint_system::iterator_equal_test(it, end) == 0 {
            let mut c: *const ppl_Constraint_tag = ptr::null();
            assert_eq!(constraint_system::iterator_dereference(it, &mut c), 0);
            types.push(ppl_Constraint_type(c));
            assert_eq!(constraint_system::iterator_increment(it), 0);
        }
        assert_eq!(types, vec![PPL_CONSTRAINT_TYPE_GREATER_OR_EQUAL, PPL_CONSTRAINT_TYPE_EQUAL]);
        assert_eq!(constraint_system::iterator_increment(it), PPL_ERROR_INVALID_ARGUMENT);
        constraint_system::iterator_delete(it);
        constraint_system::iterator_delete(end);
        constraint_system::delete(cs);
    }
}

#[test]
fn extrema_of_a_half_line() {
    let _guard = acquire_test_guard();
    unsafe {
        let cs = system(&[(&[1], 3, PPL_CONSTRAINT_TYPE_GREATER_OR_EQUAL)]);
        let mut p = ptr::null_mut();
        assert_eq!(polyhedron_abi::new_from_constraints(&mut p, PPL_TOPOLOGY_CLOSED, cs), 0);
        let x = expression(&[1], 0);
        let n = coefficient(0);
        let d = coefficient(0);
        let mut attained: c_int = -1;
        let mut point = ptr::null_mut();
        assert_eq!(polyhedron_abi::maximize(p, x, n, d, &mut attained, &mut point), 0);
        assert!(point.is_null());
        assert_eq!(polyhedron_abi::minimize(p, x, n, d, &mut attained, &mut point), 1);
        assert_eq!((value_of(n), value_of(d), attained), (-3, 1, 1));
        assert_eq!(ppl_Generator_type(point), PPL_GENERATOR_TYPE_POINT);
        ppl_delete_Generator(point);
        for c in [n, d] {
            ppl_delete_Coefficient(c);
        }
        ppl_delete_Linear_Expression(x);
        polyhedron_abi::delete(p);
        constraint_system::delete(cs);
    }
}

#[test]
fn unreported_failure_skips_the_handler() {
    let _guard = acquire_test_guard();
    unsafe {
        assert_eq!(ppl_rs_fail_unreported(PPL_ERROR_INTERNAL_ERROR), PPL_ERROR_INTERNAL_ERROR);
    }
    assert!(REPORTS.lock().is_empty());
}

#[test]
fn deterministic_timeout_and_reset() {
    let _guard = acquire_test_guard();
    unsafe {
        let cs = system(&[
            (&[1, 0], 0, PPL_CONSTRAINT_TYPE_GREATER_OR_EQUAL),
            (&[0, 1], 0, PPL_CONSTRAINT_TYPE_GREATER_OR_EQUAL),
            (&[1, 1], -1, PPL_CONSTRAINT_TYPE_LESS_OR_EQUAL),
        ]);
        let mut p = ptr::null_mut();
        assert_eq!(polyhedron_abi::new_from_constraints(&mut p, PPL_TOPOLOGY_CLOSED, cs), 0);
        assert_eq!(ppl_set_deterministic_timeout(1), 0);
        assert_eq!(polyhedron_abi::is_empty(p), PPL_TIMEOUT_EXCEPTION);
        assert_eq!(ppl_reset_deterministic_timeout(), 0);
        assert_eq!(polyhedron_abi::is_empty(p), 0);
        polyhedron_abi::delete(p);
        constraint_system::delete(cs);
    }
    assert_eq!(REPORTS.lock()[0].0, PPL_TIMEOUT_EXCEPTION);
}

#[test]
fn widening_tokens_keep_the_receiver() {
    let _guard = acquire_test_guard();
    unsafe {
        let narrow = system(&[
            (&[1], 0, PPL_CONSTRAINT_TYPE_GREATER_OR_EQUAL),
            (&[1], -1, PPL_CONSTRAINT_TYPE_LESS_OR_EQUAL),
        ]);
        let wide = system(&[
            (&[1], 0, PPL_CONSTRAINT_TYPE_GREATER_OR_EQUAL),
            (&[1], -2, PPL_CONSTRAINT_TYPE_LESS_OR_EQUAL),
        ]);
        let mut y = ptr::null_mut();
        let mut x = ptr::null_mut();
        assert_eq!(polyhedron_abi::new_from_constraints(&mut y, PPL_TOPOLOGY_CLOSED, narrow), 0);
        assert_eq!(polyhedron_abi::new_from_constraints(&mut x, PPL_TOPOLOGY_CLOSED, wide), 0);
        let mut tokens: c_uint = 1;
        assert_eq!(polyhedron_abi::widening_assign_with_tokens(x, y, &mut tokens), 0);
        assert_eq!(tokens, 0);
        assert_eq!(polyhedron_abi::is_bounded(x), 1);
        assert_eq!(polyhedron_abi::widening_assign_with_tokens(x, y, &mut tokens), 0);
        assert_eq!(polyhedron_abi::is_bounded(x), 0);
        assert_eq!(polyhedron_abi::contains(x, y), 1);
        polyhedron_abi::delete(x);
        polyhedron_abi::delete(y);
        constraint_system::delete(narrow);
        constraint_system::delete(wide);
    }
}

#[test]
fn rendering_is_caller_freed() {
    let _guard = acquire_test_guard();
    unsafe {
        let cs = system(&[(&[1, -1], 0, PPL_CONSTRAINT_TYPE_GREATER_OR_EQUAL)]);
        let mut p = ptr::null_mut();
        assert_eq!(polyhedron_abi::new_from_constraints(&mut p, PPL_TOPOLOGY_CLOSED, cs), 0);
        let mut text = ptr::null_mut();
        assert_eq!(polyhedron_abi::io_asprint(p, &mut text), 0);
        assert_eq!(CStr::from_ptr(text).to_str().unwrap(), "A - B >= 0");
        assert_eq!(ppl_free_string(text), 0);
        polyhedron_abi::delete(p);
        constraint_system::delete(cs);
    }
}
