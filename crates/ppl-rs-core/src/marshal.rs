//! Reading scalar and coefficient outputs back from the native library.

use std::ffi::c_int;

use num_bigint::BigInt;
use ppl_rs_membrane::Result;
use ppl_rs_membrane::coefficient::{read_coefficient, zero_coefficient};
use ppl_rs_membrane::kinds::Coefficient;
use ppl_rs_membrane::library;
use ppl_rs_native::ppl_Coefficient_tag;

/// Run a call writing a dimension through its out-parameter.
pub(crate) fn read_dimension(f: impl FnOnce(*mut usize) -> c_int) -> Result<usize> {
    let mut out = 0usize;
    library::call(|| f(&mut out))?;
    Ok(out)
}

/// A native coefficient reused as the output of successive reads.
pub(crate) struct CoefficientSlot(Coefficient);

impl CoefficientSlot {
    pub(crate) fn new() -> Result<Self> {
        zero_coefficient().map(Self)
    }

    pub(crate) fn fill(&mut self, f: impl FnOnce(*mut ppl_Coefficient_tag) -> c_int) -> Result<BigInt> {
        let out = self.0.as_mut_ptr();
        library::call(|| f(out))?;
        read_coefficient(&self.0)
    }

    /// One coefficient per variable below `dim`.
    pub(crate) fn read_terms(
        &mut self,
        dim: usize,
        f: impl Fn(usize, *mut ppl_Coefficient_tag) -> c_int,
    ) -> Result<Vec<BigInt>> {
        (0..dim).map(|var| self.fill(|out| f(var, out))).collect()
    }
}
