//! Linear constraints.

use std::ffi::c_int;
use std::fmt;

use num_bigint::BigInt;
use ppl_rs_membrane::kinds::ConstraintKind;
use ppl_rs_membrane::{NativeHandle, PplError, Result, library};
use ppl_rs_native::types::*;
use ppl_rs_native::{PPL_ERROR_INTERNAL_ERROR, descriptor_abi};

use crate::linear::{LinearExpression, Variable, difference};
use crate::marshal::{CoefficientSlot, read_dimension};

/// The relation of a constraint as requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintType {
    LessThan,
    LessOrEqual,
    Equal,
    GreaterOrEqual,
    GreaterThan,
}

impl ConstraintType {
    fn raw(self) -> c_int {
        match self {
            Self::LessThan => PPL_CONSTRAINT_TYPE_LESS_THAN,
            Self::LessOrEqual => PPL_CONSTRAINT_TYPE_LESS_OR_EQUAL,
            Self::Equal => PPL_CONSTRAINT_TYPE_EQUAL,
            Self::GreaterOrEqual => PPL_CONSTRAINT_TYPE_GREATER_OR_EQUAL,
            Self::GreaterThan => PPL_CONSTRAINT_TYPE_GREATER_THAN,
        }
    }

    fn from_raw(raw: c_int) -> Result<Self> {
        Ok(match raw {
            PPL_CONSTRAINT_TYPE_LESS_THAN => Self::LessThan,
            PPL_CONSTRAINT_TYPE_LESS_OR_EQUAL => Self::LessOrEqual,
            PPL_CONSTRAINT_TYPE_EQUAL => Self::Equal,
            PPL_CONSTRAINT_TYPE_GREATER_OR_EQUAL => Self::GreaterOrEqual,
            PPL_CONSTRAINT_TYPE_GREATER_THAN => Self::GreaterThan,
            other => {
                return Err(PplError::Internal {
                    code: PPL_ERROR_INTERNAL_ERROR,
                    message: format!("unknown constraint type {other}"),
                });
            }
        })
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::LessThan => "<",
            Self::LessOrEqual => "<=",
            Self::Equal => "=",
            Self::GreaterOrEqual => ">=",
            Self::GreaterThan => ">",
        }
    }
}

/// `expression relation 0`, kept in the form the native library stores:
/// the two "less" relations are turned around on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    expression: LinearExpression,
    kind: ConstraintType,
}

impl Constraint {
    #[must_use]
    pub fn new(expression: LinearExpression, kind: ConstraintType) -> Self {
        match kind {
            ConstraintType::LessThan => Self {
                expression: -expression,
                kind: ConstraintType::GreaterThan,
            },
            ConstraintType::LessOrEqual => Self {
                expression: -expression,
                kind: ConstraintType::GreaterOrEqual,
            },
            kind => Self { expression, kind },
        }
    }

    /// `lhs >= rhs`.
    pub fn ge(lhs: impl Into<LinearExpression>, rhs: impl Into<LinearExpression>) -> Self {
        Self::new(difference(lhs, rhs), ConstraintType::GreaterOrEqual)
    }

    pub fn gt(lhs: impl Into<LinearExpression>, rhs: impl Into<LinearExpression>) -> Self {
        Self::new(difference(lhs, rhs), ConstraintType::GreaterThan)
    }

    pub fn le(lhs: impl Into<LinearExpression>, rhs: impl Into<LinearExpression>) -> Self {
        Self::new(difference(lhs, rhs), ConstraintType::LessOrEqual)
    }

    pub fn lt(lhs: impl Into<LinearExpression>, rhs: impl Into<LinearExpression>) -> Self {
        Self::new(difference(lhs, rhs), ConstraintType::LessThan)
    }

    pub fn equal(lhs: impl Into<LinearExpression>, rhs: impl Into<LinearExpression>) -> Self {
        Self::new(difference(lhs, rhs), ConstraintType::Equal)
    }

    /// `Equal`, `GreaterOrEqual` or `GreaterThan`.
    #[must_use]
    pub fn constraint_type(&self) -> ConstraintType {
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

    #[must_use]
    pub fn inhomogeneous_term(&self) -> &BigInt {
        self.expression.inhomogeneous_term()
    }

    #[must_use]
    pub fn space_dimension(&self) -> usize {
        self.expression.space_dimension()
    }

    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.kind == ConstraintType::GreaterThan
    }

    #[must_use]
    pub fn is_equality(&self) -> bool {
        self.kind == ConstraintType::Equal
    }

    pub(crate) fn to_native(&self) -> Result<NativeHandle<ConstraintKind>> {
        let le = self.expression.to_native()?;
        let (le, t) = (le.as_ptr(), self.kind.raw());
        // SAFETY: `le` is live for the call.
        NativeHandle::acquire(|out| unsafe { descriptor_abi::ppl_new_Constraint(out, le, t) })
    }

    /// # Safety
    ///
    /// `c` must point to a live native constraint.
    pub(crate) unsafe fn from_native(c: *const ppl_Constraint_tag) -> Result<Self> {
        // SAFETY: caller contract on `c`, for every call below.
        let dim = read_dimension(|out| unsafe { descriptor_abi::ppl_Constraint_space_dimension(c, out) })?;
        let kind = ConstraintType::from_raw(library::call(|| unsafe {
            descriptor_abi::ppl_Constraint_type(c)
        })?)?;
        let mut slot = CoefficientSlot::new()?;
        let coefficients = slot.read_terms(dim, |var, out| unsafe {
            descriptor_abi::ppl_Constraint_coefficient(c, var, out)
        })?;
        let constant =
            slot.fill(|out| unsafe { descriptor_abi::ppl_Constraint_inhomogeneous_term(c, out) })?;
        Ok(Self {
            expression: LinearExpression::from_parts(coefficients, constant),
            kind,
        })
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        LinearExpression::write_terms(f, self.expression.coefficients(), None)?;
        write!(
            f,
            " {} {}",
            self.kind.symbol(),
            -self.expression.inhomogeneous_term()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Variable = Variable::new(0);
    const B: Variable = Variable::new(1);

    #[test]
    fn less_relations_are_turned_around() {
        let c = Constraint::le(A, 2);
        assert_eq!(c.constraint_type(), ConstraintType::GreaterOrEqual);
        assert_eq!(c.coefficient(A), BigInt::from(-1));
        assert_eq!(*c.inhomogeneous_term(), BigInt::from(2));
        assert_eq!(c, Constraint::ge(-A, -2));
        assert!(Constraint::lt(A, B).is_strict());
    }

    #[test]
    fn rendering() {
        assert_eq!(Constraint::ge(A - B, 0).to_string(), "A - B >= 0");
        assert_eq!(Constraint::equal(A * 2, 3).to_string(), "2*A = 3");
    }
}
