//! Moving big integers across the boundary as native coefficients.
//!
//! Values travel through an [`MpzRecord`], the only integer exchange format
//! the native library accepts.

use num_bigint::BigInt;
use ppl_rs_native::mpz_abi;

use crate::error::Result;
use crate::handle::NativeHandle;
use crate::kinds::Coefficient;
use crate::library;
use crate::mpz::MpzRecord;

/// A native coefficient holding zero, used as an output slot.
pub fn zero_coefficient() -> Result<Coefficient> {
    // SAFETY: the factory writes through the provided out-pointer.
    NativeHandle::acquire(|out| unsafe { mpz_abi::ppl_new_Coefficient(out) })
}

pub fn coefficient_from(value: &BigInt) -> Result<Coefficient> {
    let record = MpzRecord::from_bigint(value)?;
    let z = record.as_ptr();
    // SAFETY: `z` is an initialized record alive for the call.
    NativeHandle::acquire(|out| unsafe { mpz_abi::ppl_new_Coefficient_from_mpz_t(out, z) })
}

pub fn read_coefficient(c: &Coefficient) -> Result<BigInt> {
    let mut record = MpzRecord::new()?;
    let z = record.as_mut_ptr();
    let c = c.as_ptr();
    // SAFETY: both objects are live for the call.
    library::call(|| unsafe { mpz_abi::ppl_Coefficient_to_mpz_t(c, z) })?;
    record.to_bigint()
}

/// Overwrite `c` with `value`.
pub fn assign_coefficient(c: &mut Coefficient, value: &BigInt) -> Result<()> {
    let record = MpzRecord::from_bigint(value)?;
    let z = record.as_ptr();
    let c = c.as_mut_ptr();
    // SAFETY: both objects are live for the call.
    library::call(|| unsafe { mpz_abi::ppl_assign_Coefficient_from_mpz_t(c, z) }).map(drop)
}
