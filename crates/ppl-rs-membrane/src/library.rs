//! Global serialization of foreign calls.
//!
//! Every call into the native library, including releases from `Drop`,
//! runs under [`LOCK`]. The lock is reentrant so that a wrapper may group
//! several calls with [`with_lock`]; a foreign call itself never calls back
//! into Rust code that takes it.

use std::ffi::{c_int, c_uint, c_ulong};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::ReentrantMutex;
use ppl_rs_native::config_abi;

use crate::config::config;
use crate::error::{PplError, Result};
use crate::error_channel;
use crate::metrics::{MembraneMetrics, global_metrics};

static LOCK: ReentrantMutex<()> = parking_lot::const_reentrant_mutex(());
static READY: AtomicBool = AtomicBool::new(false);

/// One foreign call, lock already held.
fn dispatch(f: impl FnOnce() -> c_int) -> Result<c_int> {
    error_channel::reset();
    MembraneMetrics::inc(&global_metrics().foreign_calls);
    let status = f();
    if status >= 0 {
        return Ok(status);
    }
    MembraneMetrics::inc(&global_metrics().failed_calls);
    Err(error_channel::consume(status))
}

fn ensure_initialized() -> Result<()> {
    if READY.load(Ordering::Acquire) {
        return Ok(());
    }
    // SAFETY: the handler outlives the process and copies its message.
    dispatch(|| unsafe { config_abi::ppl_set_error_handler(Some(error_channel::capture)) })?;
    // SAFETY: no arguments.
    dispatch(|| unsafe { config_abi::ppl_initialize() })?;
    let cfg = config();
    if let Some(csecs) = cfg.timeout_csecs {
        // SAFETY: scalar argument.
        dispatch(|| unsafe { config_abi::ppl_set_timeout(csecs as c_uint) })?;
    }
    if let Some(weight) = cfg.deterministic_timeout {
        let weight = clamp_weight(weight);
        // SAFETY: scalar argument.
        dispatch(|| unsafe { config_abi::ppl_set_deterministic_timeout(weight) })?;
    }
    if cfg.coefficient_bits > 0 {
        let bits = cfg.coefficient_bits as c_uint;
        // SAFETY: scalar argument.
        dispatch(|| unsafe { config_abi::ppl_set_coefficient_bits(bits) })?;
    }
    READY.store(true, Ordering::Release);
    Ok(())
}

fn clamp_weight(weight: u64) -> c_ulong {
    c_ulong::try_from(weight).unwrap_or(c_ulong::MAX)
}

/// Run one foreign call under the global lock and translate its status.
///
/// `f` must perform exactly one foreign call and return its status.
pub fn call(f: impl FnOnce() -> c_int) -> Result<c_int> {
    let _guard = LOCK.lock();
    ensure_initialized()?;
    dispatch(f)
}

/// A foreign predicate: `1` is true, `0` false.
pub fn call_predicate(f: impl FnOnce() -> c_int) -> Result<bool> {
    match call(f)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(PplError::Internal {
            code: other,
            message: format!("predicate returned {other}"),
        }),
    }
}

/// Hold the global lock across several calls.
pub fn with_lock<R>(f: impl FnOnce() -> R) -> R {
    let _guard = LOCK.lock();
    f()
}

/// Arm a wall-clock budget of `csecs` centiseconds.
pub fn set_timeout(csecs: u32) -> Result<()> {
    let csecs = csecs as c_uint;
    // SAFETY: scalar argument.
    call(|| unsafe { config_abi::ppl_set_timeout(csecs) }).map(drop)
}

pub fn reset_timeout() -> Result<()> {
    // SAFETY: no arguments.
    call(|| unsafe { config_abi::ppl_reset_timeout() }).map(drop)
}

/// Arm a budget of `weight` elementary computation steps.
pub fn set_deterministic_timeout(weight: u64) -> Result<()> {
    let weight = clamp_weight(weight);
    // SAFETY: scalar argument.
    call(|| unsafe { config_abi::ppl_set_deterministic_timeout(weight) }).map(drop)
}

pub fn reset_deterministic_timeout() -> Result<()> {
    // SAFETY: no arguments.
    call(|| unsafe { config_abi::ppl_reset_deterministic_timeout() }).map(drop)
}

/// Bound coefficients to `bits` bits; `0` lifts the bound.
pub fn set_coefficient_bits(bits: u32) -> Result<()> {
    let bits = bits as c_uint;
    // SAFETY: scalar argument.
    call(|| unsafe { config_abi::ppl_set_coefficient_bits(bits) }).map(drop)
}

/// Largest space dimension the native library accepts.
pub fn max_space_dimension() -> Result<usize> {
    let mut out = 0usize;
    // SAFETY: `out` is a live local.
    call(|| unsafe { config_abi::ppl_max_space_dimension(&mut out) })?;
    Ok(out)
}
