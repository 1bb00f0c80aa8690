//! Fixed-size integer records with explicit init/clear, and coefficient
//! conversion from and to them.
//!
//! A record is one pointer wide. `ppl_mpz_init` allocates its digits and
//! `ppl_mpz_clear` frees them; the live count makes the pairing observable.

use std::ffi::{CStr, c_char, c_int, c_long, c_void};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use crate::engine::{EResult, EngineError, budget};
use crate::macros::native_fn;
use crate::types::ppl_Coefficient_tag;
use crate::util::{coefficient, get, get_mut, give, give_string, put, store_coefficient};

#[repr(C)]
#[allow(non_camel_case_types)]
pub struct mpz_struct {
    digits: *mut c_void,
}

impl mpz_struct {
    pub const fn uninit() -> Self {
        Self {
            digits: ptr::null_mut(),
        }
    }
}

impl Default for mpz_struct {
    fn default() -> Self {
        Self::uninit()
    }
}

static LIVE_RECORDS: AtomicUsize = AtomicUsize::new(0);

unsafe fn value<'a>(z: *const mpz_struct) -> EResult<&'a BigInt> {
    // SAFETY: forwarded caller contract.
    let z = unsafe { get(z, "integer record") }?;
    // SAFETY: initialized records own a boxed BigInt.
    unsafe { z.digits.cast::<BigInt>().as_ref() }
        .ok_or_else(|| EngineError::invalid("integer record used before init"))
}

unsafe fn value_mut<'a>(z: *mut mpz_struct) -> EResult<&'a mut BigInt> {
    // SAFETY: forwarded caller contract.
    let z = unsafe { get_mut(z, "integer record") }?;
    // SAFETY: initialized records own a boxed BigInt.
    unsafe { z.digits.cast::<BigInt>().as_mut() }
        .ok_or_else(|| EngineError::invalid("integer record used before init"))
}

native_fn! {
    uninit export fn ppl_mpz_init(z: *mut mpz_struct) {
        let z = get_mut(z, "integer record")?;
        if !z.digits.is_null() {
            return Err(EngineError::invalid("integer record initialized twice"));
        }
        z.digits = Box::into_raw(Box::new(BigInt::zero())).cast();
        LIVE_RECORDS.fetch_add(1, Ordering::Relaxed);
        Ok(0)
    }
}

native_fn! {
    uninit export fn ppl_mpz_clear(z: *mut mpz_struct) {
        let z = get_mut(z, "integer record")?;
        if z.digits.is_null() {
            return Ok(0);
        }
        // SAFETY: `digits` was produced by `ppl_mpz_init`.
        drop(Box::from_raw(z.digits.cast::<BigInt>()));
        z.digits = ptr::null_mut();
        LIVE_RECORDS.fetch_sub(1, Ordering::Relaxed);
        Ok(0)
    }
}

native_fn! {
    uninit export fn ppl_mpz_set_si(z: *mut mpz_struct, v: c_long) {
        *value_mut(z)? = BigInt::from(v);
        Ok(0)
    }
}

native_fn! {
    /// Parses a signed numeral in `base` (2 to 36).
    uninit export fn ppl_mpz_set_str(z: *mut mpz_struct, text: *const c_char, base: c_int) {
        if text.is_null() {
            return Err(EngineError::invalid("null numeral"));
        }
        let radix = u32::try_from(base)
            .ok()
            .filter(|b| (2..=36).contains(b))
            .ok_or_else(|| EngineError::invalid(format!("unsupported base {base}")))?;
        let text = CStr::from_ptr(text)
            .to_str()
            .map_err(|_| EngineError::invalid("numeral is not UTF-8"))?;
        let parsed = BigInt::parse_bytes(text.trim().as_bytes(), radix)
            .ok_or_else(|| EngineError::invalid(format!("malformed numeral {text:?}")))?;
        *value_mut(z)? = parsed;
        Ok(0)
    }
}

native_fn! {
    uninit export fn ppl_mpz_get_si(z: *const mpz_struct, out: *mut c_long) {
        let v = value(z)?
            .to_i64()
            .and_then(|v| c_long::try_from(v).ok())
            .ok_or_else(|| EngineError::Overflow("integer does not fit in a long".into()))?;
        put(out, v)
    }
}

native_fn! {
    /// Decimal text, released with `ppl_free_string`.
    uninit export fn ppl_mpz_get_str(z: *const mpz_struct, out: *mut *mut c_char) {
        give_string(out, value(z)?.to_string())
    }
}

/// Records initialized and not yet cleared.
#[cfg_attr(not(debug_assertions), unsafe(no_mangle))]
pub extern "C" fn ppl_mpz_live_records() -> usize {
    LIVE_RECORDS.load(Ordering::Relaxed)
}

native_fn! {
    export fn ppl_new_Coefficient(pc: *mut *mut ppl_Coefficient_tag) {
        give(pc, ppl_Coefficient_tag(BigInt::zero()))
    }
}

native_fn! {
    export fn ppl_new_Coefficient_from_mpz_t(
        pc: *mut *mut ppl_Coefficient_tag,
        z: *const mpz_struct,
    ) {
        let v = value(z)?.clone();
        budget::check_coefficient(&v)?;
        give(pc, ppl_Coefficient_tag(v))
    }
}

native_fn! {
    export fn ppl_assign_Coefficient_from_mpz_t(c: *mut ppl_Coefficient_tag, z: *const mpz_struct) {
        let v = value(z)?.clone();
        budget::check_coefficient(&v)?;
        store_coefficient(c, v)
    }
}

native_fn! {
    export fn ppl_Coefficient_to_mpz_t(c: *const ppl_Coefficient_tag, z: *mut mpz_struct) {
        let v = coefficient(c)?.clone();
        *value_mut(z)? = v;
        Ok(0)
    }
}

native_fn! {
    export fn ppl_delete_Coefficient(c: *mut ppl_Coefficient_tag) {
        crate::util::take_back(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_record_is_null() {
        let z = mpz_struct::default();
        assert!(z.digits.is_null());
    }
}
