//! RAII guard over native integer records.
//!
//! Every record is initialized in [`MpzRecord::new`] and cleared exactly
//! once in `Drop`, so no path leaks a record.

use std::ffi::{CString, c_long};

use num_bigint::BigInt;
use ppl_rs_native::mpz_abi::{self, mpz_struct};

use crate::error::{PplError, Result};
use crate::library;
use crate::metrics::{MembraneMetrics, global_metrics};
use crate::text::copy_native_string;

pub struct MpzRecord {
    // Boxed so the address handed to the native side never moves.
    raw: Box<mpz_struct>,
}

impl MpzRecord {
    /// A fresh record holding zero.
    pub fn new() -> Result<Self> {
        let mut raw = Box::new(mpz_struct::uninit());
        let ptr: *mut mpz_struct = &mut *raw;
        // SAFETY: `ptr` points to an uninitialized record we own.
        library::call(|| unsafe { mpz_abi::ppl_mpz_init(ptr) })?;
        MembraneMetrics::inc(&global_metrics().records_initialized);
        Ok(Self { raw })
    }

    pub fn from_bigint(value: &BigInt) -> Result<Self> {
        let mut record = Self::new()?;
        record.set(value)?;
        Ok(record)
    }

    pub fn set(&mut self, value: &BigInt) -> Result<()> {
        let ptr = self.as_mut_ptr();
        if let Ok(small) = c_long::try_from(value) {
            // SAFETY: `ptr` is an initialized record.
            return library::call(|| unsafe { mpz_abi::ppl_mpz_set_si(ptr, small) }).map(drop);
        }
        let text = CString::new(value.to_string()).map_err(|_| {
            PplError::InvalidArgument("integer text contains NUL".into())
        })?;
        // SAFETY: `text` outlives the call.
        library::call(|| unsafe { mpz_abi::ppl_mpz_set_str(ptr, text.as_ptr(), 10) }).map(drop)
    }

    pub fn to_bigint(&self) -> Result<BigInt> {
        let ptr = self.as_ptr();
        // SAFETY: `ptr` is an initialized record.
        let text = copy_native_string(|out| unsafe { mpz_abi::ppl_mpz_get_str(ptr, out) })?;
        text.parse::<BigInt>().map_err(|_| PplError::Internal {
            code: ppl_rs_native::PPL_ERROR_INTERNAL_ERROR,
            message: format!("malformed integer text {text:?}"),
        })
    }

    /// The value when it fits a native `long`.
    pub fn to_long(&self) -> Result<c_long> {
        let ptr = self.as_ptr();
        let mut out: c_long = 0;
        // SAFETY: `ptr` is initialized and `out` a live local.
        library::call(|| unsafe { mpz_abi::ppl_mpz_get_si(ptr, &mut out) })?;
        Ok(out)
    }

    #[must_use]
    pub fn as_ptr(&self) -> *const mpz_struct {
        &*self.raw
    }

    pub fn as_mut_ptr(&mut self) -> *mut mpz_struct {
        &mut *self.raw
    }
}

impl Drop for MpzRecord {
    fn drop(&mut self) {
        let ptr = self.as_mut_ptr();
        // SAFETY: initialized in `new`, cleared only here.
        if library::call(|| unsafe { mpz_abi::ppl_mpz_clear(ptr) }).is_ok() {
            MembraneMetrics::inc(&global_metrics().records_cleared);
        }
    }
}

/// Records initialized and not yet cleared, as counted by the native side.
#[must_use]
pub fn live_records() -> usize {
    library::with_lock(|| mpz_abi::ppl_mpz_live_records())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_and_large_values() {
        let small = MpzRecord::from_bigint(&BigInt::from(-42)).unwrap();
        assert_eq!(small.to_bigint().unwrap(), BigInt::from(-42));
        assert_eq!(small.to_long().unwrap(), -42);

        let big: BigInt = "123456789012345678901234567890".parse().unwrap();
        let large = MpzRecord::from_bigint(&big).unwrap();
        assert_eq!(large.to_bigint().unwrap(), big);
        assert!(matches!(
            large.to_long(),
            Err(PplError::ArithmeticOverflow(_))
        ));
    }
}
