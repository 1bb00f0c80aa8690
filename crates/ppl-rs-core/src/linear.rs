//! Variables and linear expressions.
//!
//! A [`LinearExpression`] is a plain value: an integer coefficient per
//! variable plus an inhomogeneous term. Its space dimension is one more than
//! the highest variable ever given a coefficient; cancellation never shrinks
//! it.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use ppl_rs_membrane::Result;
use ppl_rs_membrane::coefficient::coefficient_from;
use ppl_rs_membrane::kinds::LinearExpressionKind;
use ppl_rs_membrane::{NativeHandle, library};
use ppl_rs_native::descriptor_abi;

/// The variable of index `i`, printed `A`..`Z`, `A1`..`Z1` and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(usize);

impl Variable {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Dimension of the smallest space containing this variable.
    #[must_use]
    pub const fn space_dimension(self) -> usize {
        self.0 + 1
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = char::from(b'A' + (self.0 % 26) as u8);
        match self.0 / 26 {
            0 => write!(f, "{letter}"),
            n => write!(f, "{letter}{n}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LinearExpression {
    coefficients: Vec<BigInt>,
    inhomogeneous: BigInt,
}

impl LinearExpression {
    /// The zero expression of dimension 0.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// The zero expression over `dim` variables.
    #[must_use]
    pub fn with_dimension(dim: usize) -> Self {
        Self {
            coefficients: vec![BigInt::zero(); dim],
            inhomogeneous: BigInt::zero(),
        }
    }

    #[must_use]
    pub fn space_dimension(&self) -> usize {
        self.coefficients.len()
    }

    #[must_use]
    pub fn coefficient(&self, var: Variable) -> BigInt {
        self.coefficients
            .get(var.index())
            .cloned()
            .unwrap_or_else(BigInt::zero)
    }

    #[must_use]
    pub fn inhomogeneous_term(&self) -> &BigInt {
        &self.inhomogeneous
    }

    pub fn coefficients(&self) -> &[BigInt] {
        &self.coefficients
    }

    /// Adds `value` to the coefficient of `var`. Only a nonzero `value` grows
    /// the expression.
    pub fn add_to_coefficient(&mut self, var: Variable, value: &BigInt) -> &mut Self {
        if value.is_zero() {
            return self;
        }
        if self.coefficients.len() <= var.index() {
            self.coefficients.resize(var.space_dimension(), BigInt::zero());
        }
        self.coefficients[var.index()] += value;
        self
    }

    pub fn add_to_inhomogeneous(&mut self, value: &BigInt) -> &mut Self {
        self.inhomogeneous += value;
        self
    }

    /// `true` when every coefficient is zero; the inhomogeneous term is ignored.
    #[must_use]
    pub fn is_homogeneous_zero(&self) -> bool {
        self.coefficients.iter().all(Zero::is_zero)
    }

    #[must_use]
    pub fn scaled(&self, k: &BigInt) -> Self {
        Self {
            coefficients: self.coefficients.iter().map(|c| c * k).collect(),
            inhomogeneous: &self.inhomogeneous * k,
        }
    }

    fn combined(mut self, rhs: &Self, sign: &BigInt) -> Self {
        if self.coefficients.len() < rhs.coefficients.len() {
            self.coefficients
                .resize(rhs.coefficients.len(), BigInt::zero());
        }
        for (lhs, r) in self.coefficients.iter_mut().zip(&rhs.coefficients) {
            *lhs += r * sign;
        }
        self.inhomogeneous += &rhs.inhomogeneous * sign;
        self
    }

    pub(crate) fn to_native(&self) -> Result<NativeHandle<LinearExpressionKind>> {
        let dim = self.space_dimension();
        // SAFETY: the factory writes through the provided out-pointer.
        let mut le = NativeHandle::<LinearExpressionKind>::acquire(|out| unsafe {
            descriptor_abi::ppl_new_Linear_Expression_with_dimension(out, dim)
        })?;
        let le_ptr = le.as_mut_ptr();
        for (var, c) in self.coefficients.iter().enumerate() {
            if c.is_zero() {
                continue;
            }
            let c = coefficient_from(c)?;
            let c_ptr = c.as_ptr();
            // SAFETY: both objects are live for the call.
            library::call(|| unsafe {
                descriptor_abi::ppl_Linear_Expression_add_to_coefficient(le_ptr, var, c_ptr)
            })?;
        }
        if !self.inhomogeneous.is_zero() {
            let c = coefficient_from(&self.inhomogeneous)?;
            let c_ptr = c.as_ptr();
            // SAFETY: both objects are live for the call.
            library::call(|| unsafe {
                descriptor_abi::ppl_Linear_Expression_add_to_inhomogeneous(le_ptr, c_ptr)
            })?;
        }
        Ok(le)
    }

    pub(crate) fn from_parts(coefficients: Vec<BigInt>, inhomogeneous: BigInt) -> Self {
        Self {
            coefficients,
            inhomogeneous,
        }
    }

    /// `3*A - B + 2`, with `0` for the zero expression.
    pub(crate) fn write_terms(
        f: &mut fmt::Formatter<'_>,
        coefficients: &[BigInt],
        constant: Option<&BigInt>,
    ) -> fmt::Result {
        let mut first = true;
        for (i, c) in coefficients.iter().enumerate() {
            if !c.is_zero() {
                write_term(f, first, c, Some(Variable::new(i)))?;
                first = false;
            }
        }
        match constant {
            Some(k) if !k.is_zero() => write_term(f, first, k, None),
            _ if first => f.write_str("0"),
            _ => Ok(()),
        }
    }
}

fn write_term(
    f: &mut fmt::Formatter<'_>,
    first: bool,
    c: &BigInt,
    name: Option<Variable>,
) -> fmt::Result {
    let magnitude = c.abs();
    match (first, c.is_negative()) {
        (true, true) => f.write_str("-")?,
        (true, false) => {}
        (false, true) => f.write_str(" - ")?,
        (false, false) => f.write_str(" + ")?,
    }
    match name {
        Some(v) if magnitude.is_one() => write!(f, "{v}"),
        Some(v) => write!(f, "{magnitude}*{v}"),
        None => write!(f, "{magnitude}"),
    }
}

/// `lhs - rhs`.
pub(crate) fn difference(
    lhs: impl Into<LinearExpression>,
    rhs: impl Into<LinearExpression>,
) -> LinearExpression {
    let lhs: LinearExpression = lhs.into();
    let rhs: LinearExpression = rhs.into();
    lhs - rhs
}

impl fmt::Display for LinearExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Self::write_terms(f, &self.coefficients, Some(&self.inhomogeneous))
    }
}

impl From<Variable> for LinearExpression {
    fn from(v: Variable) -> Self {
        let mut e = Self::with_dimension(v.space_dimension());
        e.coefficients[v.index()] = BigInt::one();
        e
    }
}

impl From<BigInt> for LinearExpression {
    fn from(k: BigInt) -> Self {
        Self {
            coefficients: Vec::new(),
            inhomogeneous: k,
        }
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for LinearExpression {
                fn from(k: $t) -> Self {
                    Self::from(BigInt::from(k))
                }
            }
        )*
    };
}

from_integer!(i32, i64);

impl From<&LinearExpression> for LinearExpression {
    fn from(e: &LinearExpression) -> Self {
        e.clone()
    }
}

impl<R: Into<LinearExpression>> Add<R> for LinearExpression {
    type Output = LinearExpression;

    fn add(self, rhs: R) -> Self::Output {
        self.combined(&rhs.into(), &BigInt::one())
    }
}

impl<R: Into<LinearExpression>> Sub<R> for LinearExpression {
    type Output = LinearExpression;

    fn sub(self, rhs: R) -> Self::Output {
        self.combined(&rhs.into(), &-BigInt::one())
    }
}

impl<R: Into<LinearExpression>> Add<R> for Variable {
    type Output = LinearExpression;

    fn add(self, rhs: R) -> Self::Output {
        LinearExpression::from(self) + rhs
    }
}

impl<R: Into<LinearExpression>> Sub<R> for Variable {
    type Output = LinearExpression;

    fn sub(self, rhs: R) -> Self::Output {
        LinearExpression::from(self) - rhs
    }
}

impl Neg for LinearExpression {
    type Output = LinearExpression;

    fn neg(self) -> Self::Output {
        self.scaled(&-BigInt::one())
    }
}

impl Neg for Variable {
    type Output = LinearExpression;

    fn neg(self) -> Self::Output {
        -LinearExpression::from(self)
    }
}

impl Mul<i64> for LinearExpression {
    type Output = LinearExpression;

    fn mul(self, k: i64) -> Self::Output {
        self.scaled(&BigInt::from(k))
    }
}

impl Mul<i64> for Variable {
    type Output = LinearExpression;

    fn mul(self, k: i64) -> Self::Output {
        LinearExpression::from(self) * k
    }
}
