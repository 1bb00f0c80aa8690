//! Single-slot side channel filled by the native error handler.
//!
//! Protocol per call, always inside the global critical section:
//! 1. [`reset`] empties the slot.
//! 2. The foreign call runs; on failure the native side invokes [`capture`]
//!    with the code and message before returning.
//! 3. On a negative status, [`consume`] takes the slot and checks that the
//!    captured code equals the returned one.
//!
//! A missing or mismatched capture is a protocol violation, handled per
//! [`ProtocolPolicy`].

use std::ffi::{CStr, c_char, c_int};
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::Mutex;

use crate::config::{ProtocolPolicy, config};
use crate::error::PplError;
use crate::metrics::{MembraneMetrics, global_metrics};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Captured {
    code: c_int,
    message: String,
}

static SLOT: Mutex<Option<Captured>> = Mutex::new(None);

const POLICY_UNSET: u8 = 0;
const POLICY_ABORT: u8 = 1;
const POLICY_REPORT: u8 = 2;

static POLICY: AtomicU8 = AtomicU8::new(POLICY_UNSET);

/// Error handler installed into the native library.
pub(crate) unsafe extern "C" fn capture(code: c_int, message: *const c_char) {
    let message = if message.is_null() {
        String::new()
    } else {
        // SAFETY: the native side passes a NUL-terminated string that lives
        // for the duration of this callback.
        unsafe { CStr::from_ptr(message) }
            .to_string_lossy()
            .into_owned()
    };
    *SLOT.lock() = Some(Captured { code, message });
}

pub(crate) fn reset() {
    *SLOT.lock() = None;
}

/// Translate a negative `status` using the captured report.
pub(crate) fn consume(status: c_int) -> PplError {
    match SLOT.lock().take() {
        Some(Captured { code, message }) if code == status => PplError::from_status(code, message),
        Some(Captured { code, message }) => violation(
            status,
            format!("status {status} but the handler reported {code}: {message}"),
        ),
        None => violation(status, format!("status {status} without an error report")),
    }
}

fn violation(code: c_int, message: String) -> PplError {
    MembraneMetrics::inc(&global_metrics().protocol_violations);
    match protocol_policy() {
        ProtocolPolicy::Report => PplError::Protocol { code, message },
        ProtocolPolicy::Abort => {
            eprintln!("ppl-rs: fatal protocol violation: {message}");
            std::process::abort()
        }
    }
}

/// The policy in force: an override from [`set_protocol_policy`], else the
/// configured one.
#[must_use]
pub fn protocol_policy() -> ProtocolPolicy {
    match POLICY.load(Ordering::Relaxed) {
        POLICY_ABORT => ProtocolPolicy::Abort,
        POLICY_REPORT => ProtocolPolicy::Report,
        _ => config().protocol,
    }
}

/// Override the configured policy for the rest of the process.
pub fn set_protocol_policy(policy: ProtocolPolicy) {
    let raw = match policy {
        ProtocolPolicy::Abort => POLICY_ABORT,
        ProtocolPolicy::Report => POLICY_REPORT,
    };
    POLICY.store(raw, Ordering::Relaxed);
}
