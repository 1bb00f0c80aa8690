//! Generators of polyhedra: lines, rays, points and closure points.

use std::ffi::c_int;
use std::fmt;

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use ppl_rs_membrane::coefficient::coefficient_from;
use ppl_rs_membrane::kinds::GeneratorKind;
use ppl_rs_membrane::{NativeHandle, PplError, Result, library};
use ppl_rs_native::types::*;
use ppl_rs_native::{PPL_ERROR_INTERNAL_ERROR, descriptor_abi};

use crate::linear::{LinearExpression, Variable};
use crate::marshal::{CoefficientSlot, read_dimension};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorType {
    Line,
    Ray,
    Point,
    ClosurePoint,
}

impl GeneratorType {
    fn raw(self) -> c_int {
        match self {
            Self::Line => PPL_GENERATOR_TYPE_LINE,
            Self::Ray => PPL_GENERATOR_TYPE_RAY,
            Self::Point => PPL_GENERATOR_TYPE_POINT,
            Self::ClosurePoint => PPL_GENERATOR_TYPE_CLOSURE_POINT,
        }
    }

    fn from_raw(raw: c_int) -> Result<Self> {
        Ok(match raw {
            PPL_GENERATOR_TYPE_LINE => Self::Line,
            PPL_GENERATOR_TYPE_RAY => Self::Ray,
            PPL_GENERATOR_TYPE_POINT => Self::Point,
            PPL_GENERATOR_TYPE_CLOSURE_POINT => Self::ClosurePoint,
            other => {
                return Err(PplError::Internal {
                    code: PPL_ERROR_INTERNAL_ERROR,
                    message: format!("unknown generator type {other}"),
                });
            }
        })
    }

    #[must_use]
    pub fn is_point_like(self) -> bool {
        matches!(self, Self::Point | Self::ClosurePoint)
    }
}

/// Point-like generators carry a strictly positive divisor; lines and rays
/// have divisor one and a non-zero direction. The inhomogeneous term of the
/// expression is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Generator {
    expression: LinearExpression,
    kind: GeneratorType,
    divisor: BigInt,
}

impl Generator {
    pub fn new(
        expression: impl Into<LinearExpression>,
        kind: GeneratorType,
        divisor: impl Into<BigInt>,
    ) -> Result<Self> {
        let expression: LinearExpression = expression.into();
        let expression = LinearExpression::from_parts(expression.coefficients().to_vec(), BigInt::zero());
        if !kind.is_point_like() {
            if expression.is_homogeneous_zero() {
                return Err(PplError::InvalidArgument(
                    "a line or ray needs a non-zero direction".into(),
                ));
            }
            return Ok(Self {
                expression,
                kind,
                divisor: BigInt::one(),
            });
        }
        let divisor = divisor.into();
        if divisor.is_zero() {
            return Err(PplError::InvalidArgument("zero divisor".into()));
        }
        let (expression, divisor) = if divisor.is_negative() {
            (-expression, -divisor)
        } else {
            (expression, divisor)
        };
        Ok(Self {
            expression,
            kind,
            divisor,
        })
    }

    pub fn line(direction: impl Into<LinearExpression>) -> Result<Self> {
        Self::new(direction, GeneratorType::Line, 1)
    }

    pub fn ray(direction: impl Into<LinearExpression>) -> Result<Self> {
        Self::new(direction, GeneratorType::Ray, 1)
    }

    /// The point `expression / divisor`.
    pub fn point(expression: impl Into<LinearExpression>, divisor: impl Into<BigInt>) -> Result<Self> {
        Self::new(expression, GeneratorType::Point, divisor)
    }

    pub fn closure_point(
        expression: impl Into<LinearExpression>,
        divisor: impl Into<BigInt>,
    ) -> Result<Self> {
        Self::new(expression, GeneratorType::ClosurePoint, divisor)
    }

    #[must_use]
    pub fn generator_type(&self) -> GeneratorType {
        self.kind
    }

    #[must_use]
    pub fn expression(&self) -> &LinearExpression {
        &self.expression
    }

    #[must_use]
    pub fn coefficient(&self, var: Variable) -> BigInt {
        self.expression.coefficient(var)
    }

    /// `None` for lines and rays.
    #[must_use]
    pub fn divisor(&self) -> Option<&BigInt> {
        self.kind.is_point_like().then_some(&self.divisor)
    }

    #[must_use]
    pub fn space_dimension(&self) -> usize {
        self.expression.space_dimension()
    }

    pub(crate) fn to_native(&self) -> Result<NativeHandle<GeneratorKind>> {
        let le = self.expression.to_native()?;
        let d = coefficient_from(&self.divisor)?;
        let (le, t, d) = (le.as_ptr(), self.kind.raw(), d.as_ptr());
        // SAFETY: every argument is live for the call.
        NativeHandle::acquire(|out| unsafe { descriptor_abi::ppl_new_Generator(out, le, t, d) })
    }

    /// # Safety
    ///
    /// `g` must point to a live native generator.
    pub(crate) unsafe fn from_native(g: *const ppl_Generator_tag) -> Result<Self> {
        // SAFETY: caller contract on `g`, for every call below.
        let dim = read_dimension(|out| unsafe { descriptor_abi::ppl_Generator_space_dimension(g, out) })?;
        let kind =
            GeneratorType::from_raw(library::call(|| unsafe { descriptor_abi::ppl_Generator_type(g) })?)?;
        let mut slot = CoefficientSlot::new()?;
        let coefficients = slot.read_terms(dim, |var, out| unsafe {
            descriptor_abi::ppl_Generator_coefficient(g, var, out)
        })?;
        let divisor = if kind.is_point_like() {
            slot.fill(|out| unsafe { descriptor_abi::ppl_Generator_divisor(g, out) })?
        } else {
            BigInt::one()
        };
        Ok(Self {
            expression: LinearExpression::from_parts(coefficients, BigInt::zero()),
            kind,
            divisor,
        })
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            GeneratorType::Line => "l",
            GeneratorType::Ray => "r",
            GeneratorType::Point => "p",
            GeneratorType::ClosurePoint => "c",
        };
        write!(f, "{tag}(")?;
        LinearExpression::write_terms(f, self.expression.coefficients(), None)?;
        if self.kind.is_point_like() && !self.divisor.is_one() {
            write!(f, ")/{}", self.divisor)
        } else {
            f.write_str(")")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Variable = Variable::new(0);
    const B: Variable = Variable::new(1);

    #[test]
    fn divisor_sign_is_normalized() {
        let p = Generator::point(A + B * 2, -3).unwrap();
        assert_eq!(p.divisor(), Some(&BigInt::from(3)));
        assert_eq!(p.coefficient(B), BigInt::from(-2));
        assert_eq!(p.to_string(), "p(-A - 2*B)/3");
    }

    #[test]
    fn degenerate_generators_are_rejected() {
        assert!(Generator::point(A, 0).is_err());
        assert!(Generator::ray(LinearExpression::with_dimension(2)).is_err());
        let l = Generator::line(A).unwrap();
        assert_eq!(l.divisor(), None);
        assert_eq!(l.to_string(), "l(A)");
    }
}
