//! Library-wide state: initialization, the error handler, budgets and
//! string release.

use std::ffi::{CString, c_char, c_int, c_uint, c_ulong};

use crate::engine::{EngineError, budget, shape::MAX_SPACE_DIMENSION};
use crate::macros::native_fn;
use crate::status::{self, ppl_error_handler_type};
use crate::types::ppl_dimension_type;
use crate::util::put;

native_fn! {
    uninit export fn ppl_initialize() {
        status::set_initialized(true);
        Ok(0)
    }
}

native_fn! {
    uninit export fn ppl_finalize() {
        status::set_initialized(false);
        Ok(0)
    }
}

native_fn! {
    /// Installs (or, with `None`, removes) the error handler.
    uninit export fn ppl_set_error_handler(handler: ppl_error_handler_type) {
        status::install_handler(handler);
        Ok(0)
    }
}

native_fn! {
    uninit export fn ppl_max_space_dimension(out: *mut ppl_dimension_type) {
        put(out, MAX_SPACE_DIMENSION)
    }
}

native_fn! {
    /// Arms a wall-clock budget of `csecs` centiseconds from now.
    export fn ppl_set_timeout(csecs: c_uint) {
        if csecs == 0 {
            return Err(EngineError::invalid("ppl_set_timeout: zero timeout"));
        }
        budget::set_timeout(csecs);
        Ok(0)
    }
}

native_fn! {
    export fn ppl_reset_timeout() {
        budget::reset_timeout();
        Ok(0)
    }
}

native_fn! {
    /// Arms a budget of `weight` elementary computation steps.
    export fn ppl_set_deterministic_timeout(weight: c_ulong) {
        if weight == 0 {
            return Err(EngineError::invalid("ppl_set_deterministic_timeout: zero weight"));
        }
        budget::set_deterministic_timeout(u64::from(weight));
        Ok(0)
    }
}

native_fn! {
    export fn ppl_reset_deterministic_timeout() {
        budget::reset_deterministic_timeout();
        Ok(0)
    }
}

native_fn! {
    /// Bounds coefficient magnitudes to `bits` bits; `0` lifts the bound.
    export fn ppl_set_coefficient_bits(bits: c_uint) {
        budget::set_coefficient_bits(bits);
        Ok(0)
    }
}

native_fn! {
    /// Releases a string produced by any rendering entry point.
    uninit export fn ppl_free_string(text: *mut c_char) {
        if !text.is_null() {
            // SAFETY: every string handed out was produced by `CString::into_raw`.
            drop(CString::from_raw(text));
        }
        Ok(0)
    }
}

native_fn! {
    /// Diagnostics hook: fails with `code` without notifying the error handler.
    export fn ppl_rs_fail_unreported(code: c_int) {
        if code >= 0 {
            return Err(EngineError::invalid("ppl_rs_fail_unreported: non-negative code"));
        }
        Ok(code)
    }
}
