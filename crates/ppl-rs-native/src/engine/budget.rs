//! Computation budgets: wall-clock timeout, deterministic timeout and the
//! coefficient bound of bounded mode.
//!
//! The wall-clock timeout is an absolute deadline armed by `set_timeout`; once
//! it passes every budgeted computation fails until it is reset. The
//! deterministic timeout counts elementary combination steps.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use num_bigint::BigInt;
use parking_lot::Mutex;

use super::error::{EResult, EngineError};

static DEADLINE: Mutex<Option<Instant>> = Mutex::new(None);
static DETERMINISTIC_LIMIT: AtomicU64 = AtomicU64::new(0);
static DETERMINISTIC_USED: AtomicU64 = AtomicU64::new(0);
static COEFFICIENT_BITS: AtomicU32 = AtomicU32::new(0);

pub fn set_timeout(csecs: u32) {
    let deadline = Instant::now() + Duration::from_millis(u64::from(csecs) * 10);
    *DEADLINE.lock() = Some(deadline);
}

pub fn reset_timeout() {
    *DEADLINE.lock() = None;
}

pub fn set_deterministic_timeout(weight: u64) {
    DETERMINISTIC_USED.store(0, Ordering::Relaxed);
    DETERMINISTIC_LIMIT.store(weight, Ordering::Relaxed);
}

pub fn reset_deterministic_timeout() {
    DETERMINISTIC_LIMIT.store(0, Ordering::Relaxed);
    DETERMINISTIC_USED.store(0, Ordering::Relaxed);
}

/// `0` disables bounded mode.
pub fn set_coefficient_bits(bits: u32) {
    COEFFICIENT_BITS.store(bits, Ordering::Relaxed);
}

pub fn coefficient_bits() -> u32 {
    COEFFICIENT_BITS.load(Ordering::Relaxed)
}

/// Charge `weight` elementary steps against both budgets.
pub fn tick(weight: u64) -> EResult<()> {
    let limit = DETERMINISTIC_LIMIT.load(Ordering::Relaxed);
    if limit > 0 {
        let used = DETERMINISTIC_USED.fetch_add(weight, Ordering::Relaxed) + weight;
        if used > limit {
            return Err(EngineError::Timeout);
        }
    }
    if let Some(deadline) = *DEADLINE.lock() {
        if Instant::now() >= deadline {
            return Err(EngineError::Timeout);
        }
    }
    Ok(())
}

/// Fails with `Overflow` when bounded mode is on and `value` does not fit.
pub fn check_coefficient(value: &BigInt) -> EResult<()> {
    let bits = coefficient_bits();
    if bits > 0 && value.bits() >= u64::from(bits) {
        return Err(EngineError::Overflow(format!(
            "coefficient {value} exceeds the {bits}-bit bound"
        )));
    }
    Ok(())
}

pub fn check_coefficients<'a>(values: impl IntoIterator<Item = &'a BigInt>) -> EResult<()> {
    values.into_iter().try_for_each(check_coefficient)
}
