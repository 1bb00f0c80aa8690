//! Linear congruences `e ≡ 0 (mod m)`.

use std::fmt;

use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use ppl_rs_membrane::coefficient::coefficient_from;
use ppl_rs_membrane::kinds::CongruenceKind;
use ppl_rs_membrane::{NativeHandle, PplError, Result};
use ppl_rs_native::descriptor_abi;
use ppl_rs_native::types::ppl_Congruence_tag;

use crate::linear::{LinearExpression, Variable, difference};
use crate::marshal::{CoefficientSlot, read_dimension};

/// A zero modulus makes the congruence an equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Congruence {
    expression: LinearExpression,
    modulus: BigInt,
}

impl Congruence {
    /// Fails with `InvalidArgument` on a negative modulus.
    pub fn new(expression: LinearExpression, modulus: impl Into<BigInt>) -> Result<Self> {
        let modulus = modulus.into();
        if modulus.is_negative() {
            return Err(PplError::InvalidArgument(format!(
                "congruence modulus {modulus} is negative"
            )));
        }
        Ok(Self {
            expression,
            modulus,
        })
    }

    /// `lhs ≡ rhs (mod modulus)`.
    pub fn modulo(
        lhs: impl Into<LinearExpression>,
        rhs: impl Into<LinearExpression>,
        modulus: impl Into<BigInt>,
    ) -> Result<Self> {
        Self::new(difference(lhs, rhs), modulus)
    }

    /// `lhs = rhs` as a congruence of modulus zero.
    pub fn equality(lhs: impl Into<LinearExpression>, rhs: impl Into<LinearExpression>) -> Self {
        Self {
            expression: difference(lhs, rhs),
            modulus: BigInt::zero(),
        }
    }

    #[must_use]
    pub fn expression(&self) -> &LinearExpression {
        &self.expression
    }

    #[must_use]
    pub fn coefficient(&self, var: Variable) -> BigInt {
        self.expression.coefficient(var)
    }

    #[must_use]
    pub fn inhomogeneous_term(&self) -> &BigInt {
        self.expression.inhomogeneous_term()
    }

    #[must_use]
    pub fn modulus(&self) -> &BigInt {
        &self.modulus
    }

    #[must_use]
    pub fn is_equality(&self) -> bool {
        self.modulus.is_zero()
    }

    #[must_use]
    pub fn space_dimension(&self) -> usize {
        self.expression.space_dimension()
    }

    pub(crate) fn to_native(&self) -> Result<NativeHandle<CongruenceKind>> {
        let le = self.expression.to_native()?;
        let m = coefficient_from(&self.modulus)?;
        let (le, m) = (le.as_ptr(), m.as_ptr());
        // SAFETY: both arguments are live for the call.
        NativeHandle::acquire(|out| unsafe { descriptor_abi::ppl_new_Congruence(out, le, m) })
    }

    /// # Safety
    ///
    /// `c` must point to a live native congruence.
    pub(crate) unsafe fn from_native(c: *const ppl_Congruence_tag) -> Result<Self> {
        // SAFETY: caller contract on `c`, for every call below.
        let dim = read_dimension(|out| unsafe { descriptor_abi::ppl_Congruence_space_dimension(c, out) })?;
        let mut slot = CoefficientSlot::new()?;
        let coefficients = slot.read_terms(dim, |var, out| unsafe {
            descriptor_abi::ppl_Congruence_coefficient(c, var, out)
        })?;
        let constant =
            slot.fill(|out| unsafe { descriptor_abi::ppl_Congruence_inhomogeneous_term(c, out) })?;
        let modulus = slot.fill(|out| unsafe { descriptor_abi::ppl_Congruence_modulus(c, out) })?;
        Ok(Self {
            expression: LinearExpression::from_parts(coefficients, constant),
            modulus,
        })
    }
}

impl fmt::Display for Congruence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        LinearExpression::write_terms(f, self.expression.coefficients(), None)?;
        let rhs = -self.expression.inhomogeneous_term();
        if self.is_equality() {
            write!(f, " = {rhs}")
        } else {
            write!(f, " = {rhs} (mod {})", self.modulus)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Variable = Variable::new(0);

    #[test]
    fn negative_modulus_is_rejected() {
        assert!(matches!(
            Congruence::modulo(A, 0, -2),
            Err(PplError::InvalidArgument(_))
        ));
        let c = Congruence::modulo(A, 1, 2).unwrap();
        assert!(!c.is_equality());
        assert_eq!(c.to_string(), "A = 1 (mod 2)");
        assert!(Congruence::equality(A, 3).is_equality());
    }
}
