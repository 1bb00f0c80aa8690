use std::ffi::c_int;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use num_bigint::BigInt;
use ppl_rs_membrane::coefficient::{coefficient_from, read_coefficient};
use ppl_rs_membrane::kinds::{LinearExpressionKind, PolyhedronKind};
use ppl_rs_membrane::metrics::{global_metrics, live_handles};
use ppl_rs_membrane::mpz::{MpzRecord, live_records};
use ppl_rs_membrane::text::copy_native_string;
use ppl_rs_membrane::{ForeignKind, NativeHandle, PplError, library};
use ppl_rs_native::{PPL_TOPOLOGY_CLOSED, descriptor_abi, polyhedron_abi};

static TEST_GUARD_HELD: AtomicBool = AtomicBool::new(false);

struct TestGuard;

impl Drop for TestGuard {
    fn drop(&mut self) {
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
        std::thread::yield_now();
    }
}

fn universe(dim: usize) -> NativeHandle<PolyhedronKind> {
    NativeHandle::acquire(|out| unsafe {
        polyhedron_abi::new_from_space_dimension(out, PPL_TOPOLOGY_CLOSED, dim, 0)
    })
    .unwrap()
}

#[test]
fn scoped_handles_return_to_baseline() {
    let _guard = acquire_test_guard();
    let before = live_handles();
    {
        let _a = universe(2);
        let _b = universe(3);
        let c = coefficient_from(&BigInt::from(7)).unwrap();
        assert_eq!(read_coefficient(&c).unwrap(), BigInt::from(7));
        assert_eq!(live_handles(), before + 3);
    }
    assert_eq!(live_handles(), before);

    let explicit = universe(1);
    assert_eq!(live_handles(), before + 1);
    explicit.release().unwrap();
    assert_eq!(live_handles(), before);
}

struct RefusingKind;

impl ForeignKind for RefusingKind {
    type Raw = u8;
    const NAME: &'static str = "Refusing";
    const DELETE: unsafe extern "C" fn(*mut u8) -> c_int = refuse_delete;
}

/// Fails through the native error channel, as a real delete would.
unsafe extern "C" fn refuse_delete(_: *mut u8) -> c_int {
    let mut out = std::ptr::null_mut();
    unsafe { polyhedron_abi::new_from_space_dimension(&mut out, 7, 1, 0) }
}

#[test]
fn only_successful_releases_are_counted() {
    let _guard = acquire_test_guard();
    let released = || global_metrics().snapshot().handles_released;

    let before = released();
    universe(1).release().unwrap();
    assert_eq!(released(), before + 1);

    let refusing = NativeHandle::<RefusingKind>::acquire(|out| {
        // SAFETY: `out` is the handle's output slot.
        unsafe { *out = Box::into_raw(Box::new(0u8)) };
        0
    })
    .unwrap();
    let live = live_handles();
    let err = refusing.release().unwrap_err();
    assert!(matches!(err, PplError::InvalidArgument(_)));
    assert_eq!(released(), before + 1);
    assert_eq!(live_handles(), live);
}

#[test]
fn every_record_init_has_a_clear() {
    let _guard = acquire_test_guard();
    let before = live_records();
    {
        let big: BigInt = "-340282366920938463463374607431768211456".parse().unwrap();
        let a = MpzRecord::from_bigint(&big).unwrap();
        let _b = MpzRecord::new().unwrap();
        assert_eq!(live_records(), before + 2);
        assert_eq!(a.to_bigint().unwrap(), big);
        // Conversion through a coefficient uses temporary records too.
        let c = coefficient_from(&big).unwrap();
        assert_eq!(read_coefficient(&c).unwrap(), big);
        assert_eq!(live_records(), before + 2);
    }
    assert_eq!(live_records(), before);
    let snap = global_metrics().snapshot();
    assert_eq!(
        snap.records_initialized - snap.records_cleared,
        live_records() as u64
    );
}

#[test]
fn failed_factory_registers_no_release() {
    let _guard = acquire_test_guard();
    let before = live_handles();
    let err = NativeHandle::<PolyhedronKind>::acquire(|out| unsafe {
        polyhedron_abi::new_from_space_dimension(out, 7, 2, 0)
    })
    .unwrap_err();
    assert!(matches!(err, PplError::InvalidArgument(_)));
    assert_eq!(err.code(), ppl_rs_native::PPL_ERROR_INVALID_ARGUMENT);
    assert_eq!(live_handles(), before);
}

#[test]
fn oversized_dimension_is_a_length_error() {
    let _guard = acquire_test_guard();
    let max = library::max_space_dimension().unwrap();
    let err = NativeHandle::<PolyhedronKind>::acquire(|out| unsafe {
        polyhedron_abi::new_from_space_dimension(out, PPL_TOPOLOGY_CLOSED, max + 1, 0)
    })
    .unwrap_err();
    assert!(matches!(err, PplError::Length(_)));
}

#[test]
fn rendering_is_copied_and_freed() {
    let _guard = acquire_test_guard();
    let before = global_metrics().snapshot().strings_copied;
    let p = universe(2);
    let ptr = p.as_ptr();
    let text = copy_native_string(|out| unsafe { polyhedron_abi::io_asprint(ptr, out) }).unwrap();
    assert_eq!(text, "true");
    assert_eq!(global_metrics().snapshot().strings_copied, before + 1);
}

#[test]
fn concurrent_use_never_overlaps_foreign_calls() {
    let _guard = acquire_test_guard();
    let before = live_handles();
    let workers: Vec<_> = (0..8)
        .map(|i| {
            thread::spawn(move || -> Result<(), PplError> {
                for round in 0..50 {
                    let mut le = NativeHandle::<LinearExpressionKind>::acquire(|out| unsafe {
                        descriptor_abi::ppl_new_Linear_Expression_with_dimension(out, 3)
                    })?;
                    let c = coefficient_from(&BigInt::from(i * 100 + round))?;
                    let (le_ptr, c_ptr) = (le.as_mut_ptr(), c.as_ptr());
                    library::call(|| unsafe {
                        descriptor_abi::ppl_Linear_Expression_add_to_coefficient(le_ptr, 1, c_ptr)
                    })?;
                    let p = universe(i as usize + 1);
                    drop(p);
                    le.release()?;
                }
                Ok(())
            })
        })
        .collect();
    for w in workers {
        // A Logic error here would mean the native side saw overlapping entry.
        w.join().unwrap().unwrap();
    }
    assert_eq!(live_handles(), before);
}
