//! Status codes, the error-handler side channel and the entry guard.
//!
//! Every entry point returns a `c_int`: non-negative on success, one of the
//! negative codes below on failure. Before a failing entry point returns, the
//! installed error handler (if any) receives the same code and a message.

use std::ffi::{CString, c_char, c_int};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::engine::EngineError;

pub const PPL_ERROR_OUT_OF_MEMORY: c_int = -2;
pub const PPL_ERROR_INVALID_ARGUMENT: c_int = -3;
pub const PPL_ERROR_DOMAIN_ERROR: c_int = -4;
pub const PPL_ERROR_LENGTH_ERROR: c_int = -5;
pub const PPL_ARITHMETIC_OVERFLOW: c_int = -6;
pub const PPL_STDIO_ERROR: c_int = -7;
pub const PPL_ERROR_INTERNAL_ERROR: c_int = -8;
pub const PPL_ERROR_UNKNOWN_STANDARD_EXCEPTION: c_int = -9;
pub const PPL_ERROR_UNEXPECTED_ERROR: c_int = -10;
pub const PPL_TIMEOUT_EXCEPTION: c_int = -11;
pub const PPL_ERROR_LOGIC_ERROR: c_int = -12;

/// Receives `(code, message)`; the message is only valid during the call.
pub type ppl_error_handler_type = Option<unsafe extern "C" fn(code: c_int, message: *const c_char)>;

static HANDLER: Mutex<ppl_error_handler_type> = Mutex::new(None);
static IN_FLIGHT: AtomicBool = AtomicBool::new(false);
static INITIALIZED: AtomicBool = AtomicBool::new(false);

pub(crate) fn install_handler(handler: ppl_error_handler_type) {
    *HANDLER.lock() = handler;
}

pub(crate) fn set_initialized(on: bool) {
    INITIALIZED.store(on, Ordering::Release);
}

/// Hands `code` and `message` to the error handler and returns `code`.
pub(crate) fn raise(code: c_int, message: &str) -> c_int {
    let handler = *HANDLER.lock();
    if let Some(handler) = handler {
        let text = CString::new(message.replace('\0', " ")).unwrap_or_default();
        // SAFETY: the handler contract only requires a NUL-terminated string
        // that stays alive for the duration of the callback.
        unsafe { handler(code, text.as_ptr()) };
    }
    code
}

pub(crate) fn report(err: &EngineError) -> c_int {
    raise(err.code(), &err.to_string())
}

struct InFlight;

impl Drop for InFlight {
    fn drop(&mut self) {
        IN_FLIGHT.store(false, Ordering::Release);
    }
}

/// Runs one entry point body: detects overlapping entry, converts engine
/// errors and panics into reported status codes.
pub(crate) fn guarded(
    name: &str,
    require_init: bool,
    body: impl FnOnce() -> Result<c_int, EngineError>,
) -> c_int {
    if IN_FLIGHT
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return report(&EngineError::Logic(format!(
            "{name}: entered while another call is in flight"
        )));
    }
    let _in_flight = InFlight;
    if require_init && !INITIALIZED.load(Ordering::Acquire) {
        return report(&EngineError::Logic(format!(
            "{name}: library not initialized"
        )));
    }
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(status)) => status,
        Ok(Err(err)) => report(&err),
        Err(_) => raise(PPL_ERROR_UNEXPECTED_ERROR, &format!("{name}: unexpected error")),
    }
}

pub(crate) fn flag(b: bool) -> c_int {
    c_int::from(b)
}
