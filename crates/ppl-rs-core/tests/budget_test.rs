//! Budgets are process-wide, so every test here holds the guard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use num_bigint::BigInt;
use num_rational::BigRational;
use ppl_rs_core::*;
use ppl_rs_membrane::library;

const X: Variable = Variable::new(0);
const Y: Variable = Variable::new(1);
const Z: Variable = Variable::new(2);

static TEST_GUARD_HELD: AtomicBool = AtomicBool::new(false);

struct TestGuard;

impl Drop for TestGuard {
    fn drop(&mut self) {
        library::reset_timeout().unwrap();
        library::reset_deterministic_timeout().unwrap();
        library::set_coefficient_bits(0).unwrap();
        TEST_GUARD_HELD.store(false, Ordering::Release);
    }
}

fn acquire_test_guard() -> TestGuard {
    loop {
        if TEST_GUARD_HELD
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            return TestGuard;
        }
        thread::yield_now();
    }
}

fn cube() -> CPolyhedron {
    let mut cs = ConstraintSystem::empty().unwrap();
    for v in [X, Y, Z] {
        cs.add(&Constraint::ge(v, 0)).unwrap();
        cs.add(&Constraint::le(v, 10)).unwrap();
    }
    cs.add(&Constraint::le(X + Y + Z, 20)).unwrap();
    Domain::<CPolyhedron>::create_from_constraints(&cs).unwrap()
}

fn sum() -> LinearExpression {
    X + Y + Z
}

#[test]
fn deterministic_budget_interrupts_and_resets() {
    let _guard = acquire_test_guard();
    let p = cube();

    library::set_deterministic_timeout(1).unwrap();
    let err = p.maximize(&sum()).unwrap_err();
    assert!(matches!(err, PplError::Timeout(_)));

    library::reset_deterministic_timeout().unwrap();
    let max = p.maximize(&sum()).unwrap().unwrap();
    assert_eq!(max.value(), BigRational::from_integer(BigInt::from(20)));
}

#[test]
fn generous_deterministic_budget_is_not_hit() {
    let _guard = acquire_test_guard();
    let p = cube();
    library::set_deterministic_timeout(1_000_000).unwrap();
    assert!(p.maximize(&sum()).unwrap().is_some());
}

#[test]
fn zero_budgets_are_rejected() {
    let _guard = acquire_test_guard();
    assert!(matches!(
        library::set_deterministic_timeout(0),
        Err(PplError::InvalidArgument(_))
    ));
    assert!(matches!(library::set_timeout(0), Err(PplError::InvalidArgument(_))));
}

#[test]
fn expired_wall_clock_deadline_interrupts() {
    let _guard = acquire_test_guard();
    let p = cube();
    library::set_timeout(1).unwrap();
    thread::sleep(Duration::from_millis(30));
    let err = p.maximize(&sum()).unwrap_err();
    assert!(matches!(err, PplError::Timeout(_)));

    library::reset_timeout().unwrap();
    assert!(p.maximize(&sum()).unwrap().is_some());
}

#[test]
fn bounded_coefficients_overflow() {
    let _guard = acquire_test_guard();
    let cs = ConstraintSystem::from_descriptors(&[
        Constraint::ge(X, 0),
        Constraint::ge(Y, 0),
        Constraint::le(X * 7 + Y * 9, 100),
    ])
    .unwrap();
    let p = Domain::<CPolyhedron>::create_from_constraints(&cs).unwrap();

    library::set_coefficient_bits(4).unwrap();
    let err = p.maximize(&X.into()).unwrap_err();
    assert!(matches!(err, PplError::ArithmeticOverflow(_)));

    library::set_coefficient_bits(0).unwrap();
    let max = p.maximize(&X.into()).unwrap().unwrap();
    assert_eq!(max.value(), BigRational::new(BigInt::from(100), BigInt::from(7)));
}
