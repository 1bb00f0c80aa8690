//! Grid generators: lines, parameters and points.

use std::ffi::c_int;
use std::fmt;

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use ppl_rs_membrane::coefficient::coefficient_from;
use ppl_rs_membrane::kinds::GridGeneratorKind;
use ppl_rs_membrane::{NativeHandle, PplError, Result, library};
use ppl_rs_native::types::*;
use ppl_rs_native::{PPL_ERROR_INTERNAL_ERROR, descriptor_abi};

use crate::linear::{LinearExpression, Variable};
use crate::marshal::{CoefficientSlot, read_dimension};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridGeneratorType {
    Line,
    Parameter,
    Point,
}

impl GridGeneratorType {
    fn raw(self) -> c_int {
        match self {
            Self::Line => PPL_GRID_GENERATOR_TYPE_LINE,
            Self::Parameter => PPL_GRID_GENERATOR_TYPE_PARAMETER,
            Self::Point => PPL_GRID_GENERATOR_TYPE_POINT,
        }
    }

    fn from_raw(raw: c_int) -> Result<Self> {
        Ok(match raw {
            PPL_GRID_GENERATOR_TYPE_LINE => Self::Line,
            PPL_GRID_GENERATOR_TYPE_PARAMETER => Self::Parameter,
            PPL_GRID_GENERATOR_TYPE_POINT => Self::Point,
            other => {
                return Err(PplError::Internal {
                    code: PPL_ERROR_INTERNAL_ERROR,
                    message: format!("unknown grid generator type {other}"),
                });
            }
        })
    }
}

/// Parameters and points carry a strictly positive divisor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridGenerator {
    expression: LinearExpression,
    kind: GridGeneratorType,
    divisor: BigInt,
}

impl GridGenerator {
    pub fn new(
        expression: impl Into<LinearExpression>,
        kind: GridGeneratorType,
        divisor: impl Into<BigInt>,
    ) -> Result<Self> {
        let expression: LinearExpression = expression.into();
        let expression = LinearExpression::from_parts(expression.coefficients().to_vec(), BigInt::zero());
        if kind == GridGeneratorType::Line {
            if expression.is_homogeneous_zero() {
                return Err(PplError::InvalidArgument(
                    "a grid line needs a non-zero direction".into(),
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

    pub fn grid_line(direction: impl Into<LinearExpression>) -> Result<Self> {
        Self::new(direction, GridGeneratorType::Line, 1)
    }

    pub fn parameter(
        expression: impl Into<LinearExpression>,
        divisor: impl Into<BigInt>,
    ) -> Result<Self> {
        Self::new(expression, GridGeneratorType::Parameter, divisor)
    }

    pub fn grid_point(
        expression: impl Into<LinearExpression>,
        divisor: impl Into<BigInt>,
    ) -> Result<Self> {
        Self::new(expression, GridGeneratorType::Point, divisor)
    }

    #[must_use]
    pub fn generator_type(&self) -> GridGeneratorType {
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

    /// `None` for grid lines.
    #[must_use]
    pub fn divisor(&self) -> Option<&BigInt> {
        (self.kind != GridGeneratorType::Line).then_some(&self.divisor)
    }

    #[must_use]
    pub fn space_dimension(&self) -> usize {
        self.expression.space_dimension()
    }

    pub(crate) fn to_native(&self) -> Result<NativeHandle<GridGeneratorKind>> {
        let le = self.expression.to_native()?;
        let d = coefficient_from(&self.divisor)?;
        let (le, t, d) = (le.as_ptr(), self.kind.raw(), d.as_ptr());
        // SAFETY: every argument is live for the call.
        NativeHandle::acquire(|out| unsafe {
            descriptor_abi::ppl_new_Grid_Generator(out, le, t, d)
        })
    }

    /// # Safety
    ///
    /// `g` must point to a live native grid generator.
    pub(crate) unsafe fn from_native(g: *const ppl_Grid_Generator_tag) -> Result<Self> {
        // SAFETY: caller contract on `g`, for every call below.
        let dim = read_dimension(|out| unsafe {
            descriptor_abi::ppl_Grid_Generator_space_dimension(g, out)
        })?;
        let kind = GridGeneratorType::from_raw(library::call(|| unsafe {
            descriptor_abi::ppl_Grid_Generator_type(g)
        })?)?;
        let mut slot = CoefficientSlot::new()?;
        let coefficients = slot.read_terms(dim, |var, out| unsafe {
            descriptor_abi::ppl_Grid_Generator_coefficient(g, var, out)
        })?;
        let divisor = if kind == GridGeneratorType::Line {
            BigInt::one()
        } else {
            slot.fill(|out| unsafe { descriptor_abi::ppl_Grid_Generator_divisor(g, out) })?
        };
        Ok(Self {
            expression: LinearExpression::from_parts(coefficients, BigInt::zero()),
            kind,
            divisor,
        })
    }
}

impl fmt::Display for GridGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            GridGeneratorType::Line => "l",
            GridGeneratorType::Parameter => "q",
            GridGeneratorType::Point => "p",
        };
        write!(f, "{tag}(")?;
        LinearExpression::write_terms(f, self.expression.coefficients(), None)?;
        if self.kind != GridGeneratorType::Line && !self.divisor.is_one() {
            write!(f, ")/{}", self.divisor)
        } else {
            f.write_str(")")
        }
    }
}
