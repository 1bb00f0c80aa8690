//! Integer rows: linear expressions and the four descriptor kinds.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use super::error::{EResult, EngineError};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LinExpr {
    pub coeffs: Vec<BigInt>,
    pub constant: BigInt,
}

impl LinExpr {
    pub fn zero(dim: usize) -> Self {
        Self {
            coeffs: vec![BigInt::zero(); dim],
            constant: BigInt::zero(),
        }
    }

    pub fn variable(var: usize, dim: usize) -> Self {
        let mut e = Self::zero(dim.max(var + 1));
        e.coeffs[var] = BigInt::one();
        e
    }

    pub fn space_dimension(&self) -> usize {
        self.coeffs.len()
    }

    pub fn coeff(&self, var: usize) -> BigInt {
        self.coeffs.get(var).cloned().unwrap_or_default()
    }

    /// Grows (never shrinks) the coefficient vector.
    pub fn grow(&mut self, dim: usize) {
        if self.coeffs.len() < dim {
            self.coeffs.resize(dim, BigInt::zero());
        }
    }

    pub fn resized(&self, dim: usize) -> Self {
        let mut coeffs = self.coeffs.clone();
        coeffs.resize(dim, BigInt::zero());
        Self {
            coeffs,
            constant: self.constant.clone(),
        }
    }

    pub fn add_to_coeff(&mut self, var: usize, value: &BigInt) {
        if value.is_zero() {
            return;
        }
        self.grow(var + 1);
        self.coeffs[var] += value;
    }

    pub fn is_homogeneous_zero(&self) -> bool {
        self.coeffs.iter().all(Zero::is_zero)
    }

    pub fn negated(&self) -> Self {
        Self {
            coeffs: self.coeffs.iter().map(|c| -c).collect(),
            constant: -&self.constant,
        }
    }

    pub fn scaled(&self, k: &BigInt) -> Self {
        Self {
            coeffs: self.coeffs.iter().map(|c| c * k).collect(),
            constant: &self.constant * k,
        }
    }

    /// `a * self + b * other`, over the larger of the two dimensions.
    pub fn combine(&self, a: &BigInt, other: &LinExpr, b: &BigInt) -> Self {
        let dim = self.space_dimension().max(other.space_dimension());
        let coeffs = (0..dim)
            .map(|i| a * self.coeff(i) + b * other.coeff(i))
            .collect();
        Self {
            coeffs,
            constant: a * &self.constant + b * &other.constant,
        }
    }

    pub fn eval(&self, point: &[BigRational]) -> BigRational {
        let mut acc = BigRational::from_integer(self.constant.clone());
        for (c, x) in self.coeffs.iter().zip(point) {
            if !c.is_zero() {
                acc += BigRational::from_integer(c.clone()) * x;
            }
        }
        acc
    }

    /// Gcd of every coefficient, constant included.
    pub fn content(&self) -> BigInt {
        self.coeffs
            .iter()
            .chain(std::iter::once(&self.constant))
            .fold(BigInt::zero(), |g, c| g.gcd(c))
    }

    pub fn homogeneous_content(&self) -> BigInt {
        self.coeffs
            .iter()
            .fold(BigInt::zero(), |g, c| g.gcd(c))
    }

    pub fn divided(&self, g: &BigInt) -> Self {
        if g.is_zero() || g.is_one() {
            return self.clone();
        }
        Self {
            coeffs: self.coeffs.iter().map(|c| c / g).collect(),
            constant: &self.constant / g,
        }
    }

    /// Substitutes `var := (expr) / den` and multiplies through by `den`.
    pub fn substitute(&self, var: usize, expr: &LinExpr, den: &BigInt) -> Self {
        let a = self.coeff(var);
        let mut base = self.scaled(den);
        if var < base.coeffs.len() {
            base.coeffs[var] = BigInt::zero();
        }
        if a.is_zero() {
            return base;
        }
        base.combine(&BigInt::one(), expr, &a)
    }

    pub fn is_interval_form(&self) -> Option<usize> {
        let mut found = None;
        for (i, c) in self.coeffs.iter().enumerate() {
            if !c.is_zero() {
                if found.is_some() {
                    return None;
                }
                found = Some(i);
            }
        }
        found
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rel {
    Equal,
    GreaterOrEqual,
    GreaterThan,
}

/// `expr rel 0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Con {
    pub expr: LinExpr,
    pub rel: Rel,
}

impl Con {
    pub fn new(expr: LinExpr, rel: Rel) -> Self {
        Self { expr, rel }
    }

    pub fn space_dimension(&self) -> usize {
        self.expr.space_dimension()
    }

    pub fn coeff(&self, var: usize) -> BigInt {
        self.expr.coeff(var)
    }

    pub fn is_strict(&self) -> bool {
        self.rel == Rel::GreaterThan
    }

    pub fn is_equality(&self) -> bool {
        self.rel == Rel::Equal
    }

    /// The unsatisfiable constraint `-1 >= 0`.
    pub fn falsity(dim: usize) -> Self {
        let mut expr = LinExpr::zero(dim);
        expr.constant = -BigInt::one();
        Self::new(expr, Rel::GreaterOrEqual)
    }

    pub fn resized(&self, dim: usize) -> Self {
        Self::new(self.expr.resized(dim), self.rel)
    }

    pub fn closure(&self) -> Self {
        let rel = if self.rel == Rel::GreaterThan {
            Rel::GreaterOrEqual
        } else {
            self.rel
        };
        Self::new(self.expr.clone(), rel)
    }

    /// Divides by the content; equalities get a positive leading coefficient.
    pub fn normalized(&self) -> Self {
        let g = self.expr.content();
        let mut expr = self.expr.divided(&g);
        if self.rel == Rel::Equal {
            if let Some(lead) = expr.coeffs.iter().find(|c| !c.is_zero()) {
                if lead.is_negative() {
                    expr = expr.negated();
                }
            }
        }
        Self::new(expr, self.rel)
    }

    /// `Some(truth)` when the homogeneous part vanishes.
    pub fn trivial(&self) -> Option<bool> {
        if !self.expr.is_homogeneous_zero() {
            return None;
        }
        let b = &self.expr.constant;
        Some(match self.rel {
            Rel::Equal => b.is_zero(),
            Rel::GreaterOrEqual => !b.is_negative(),
            Rel::GreaterThan => b.is_positive(),
        })
    }

    pub fn satisfied_by(&self, point: &[BigRational]) -> bool {
        let v = self.expr.eval(point);
        match self.rel {
            Rel::Equal => v.is_zero(),
            Rel::GreaterOrEqual => !v.is_negative(),
            Rel::GreaterThan => v.is_positive(),
        }
    }

    /// An equality as its two opposite non-strict halves; inequalities as-is.
    pub fn halves(&self) -> Vec<Con> {
        match self.rel {
            Rel::Equal => vec![
                Con::new(self.expr.clone(), Rel::GreaterOrEqual),
                Con::new(self.expr.negated(), Rel::GreaterOrEqual),
            ],
            _ => vec![self.clone()],
        }
    }

    /// The strict complement (`¬(e >= 0)` is `-e > 0`); equalities have none.
    pub fn complement(&self) -> Vec<Con> {
        match self.rel {
            Rel::GreaterOrEqual => vec![Con::new(self.expr.negated(), Rel::GreaterThan)],
            Rel::GreaterThan => vec![Con::new(self.expr.negated(), Rel::GreaterOrEqual)],
            Rel::Equal => vec![
                Con::new(self.expr.clone(), Rel::GreaterThan),
                Con::new(self.expr.negated(), Rel::GreaterThan),
            ],
        }
    }
}

/// `expr ≡ 0 (mod modulus)`; modulus `0` is an equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cg {
    pub expr: LinExpr,
    pub modulus: BigInt,
}

impl Cg {
    pub fn space_dimension(&self) -> usize {
        self.expr.space_dimension()
    }

    pub fn is_equality(&self) -> bool {
        self.modulus.is_zero()
    }

    pub fn as_equality(&self) -> Con {
        Con::new(self.expr.clone(), Rel::Equal)
    }

    pub fn from_equality(c: &Con) -> Self {
        Self {
            expr: c.expr.clone(),
            modulus: BigInt::zero(),
        }
    }

    pub fn trivial(&self) -> Option<bool> {
        if !self.expr.is_homogeneous_zero() {
            return None;
        }
        let b = &self.expr.constant;
        Some(if self.modulus.is_zero() {
            b.is_zero()
        } else {
            b.mod_floor(&self.modulus).is_zero()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenKind {
    Line,
    Ray,
    Point,
    ClosurePoint,
}

/// Generator; `divisor` is 1 for lines and rays and positive otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Gen {
    pub expr: LinExpr,
    pub kind: GenKind,
    pub divisor: BigInt,
}

impl Gen {
    pub fn new(kind: GenKind, mut expr: LinExpr, divisor: BigInt) -> EResult<Self> {
        expr.constant = BigInt::zero();
        match kind {
            GenKind::Line | GenKind::Ray => {
                if expr.is_homogeneous_zero() {
                    return Err(EngineError::invalid("a line or ray needs a non-zero direction"));
                }
                Ok(Self {
                    expr,
                    kind,
                    divisor: BigInt::one(),
                })
            }
            GenKind::Point | GenKind::ClosurePoint => {
                if divisor.is_zero() {
                    return Err(EngineError::invalid("zero divisor"));
                }
                let (expr, divisor) = if divisor.is_negative() {
                    (expr.negated(), -divisor)
                } else {
                    (expr, divisor)
                };
                Ok(Self {
                    expr,
                    kind,
                    divisor,
                })
            }
        }
    }

    pub fn point_at(coords: &[BigRational], kind: GenKind) -> Self {
        let den = coords
            .iter()
            .fold(BigInt::one(), |acc, q| acc.lcm(q.denom()));
        let coeffs = coords
            .iter()
            .map(|q| q.numer() * (&den / q.denom()))
            .collect();
        let mut g = Self {
            expr: LinExpr {
                coeffs,
                constant: BigInt::zero(),
            },
            kind,
            divisor: den,
        };
        g.normalize();
        g
    }

    pub fn space_dimension(&self) -> usize {
        self.expr.space_dimension()
    }

    pub fn is_point_like(&self) -> bool {
        matches!(self.kind, GenKind::Point | GenKind::ClosurePoint)
    }

    pub fn coordinates(&self, dim: usize) -> Vec<BigRational> {
        (0..dim)
            .map(|i| BigRational::new(self.expr.coeff(i), self.divisor.clone()))
            .collect()
    }

    pub fn normalize(&mut self) {
        let g = self.expr.homogeneous_content();
        match self.kind {
            GenKind::Line | GenKind::Ray => {
                self.expr = self.expr.divided(&g);
                if self.kind == GenKind::Line {
                    if let Some(lead) = self.expr.coeffs.iter().find(|c| !c.is_zero()) {
                        if lead.is_negative() {
                            self.expr = self.expr.negated();
                        }
                    }
                }
            }
            GenKind::Point | GenKind::ClosurePoint => {
                let g = g.gcd(&self.divisor);
                if !g.is_zero() && !g.is_one() {
                    self.expr = self.expr.divided(&g);
                    self.divisor = &self.divisor / &g;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridGenKind {
    Line,
    Parameter,
    Point,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridGen {
    pub expr: LinExpr,
    pub kind: GridGenKind,
    pub divisor: BigInt,
}

impl GridGen {
    pub fn new(kind: GridGenKind, mut expr: LinExpr, divisor: BigInt) -> EResult<Self> {
        expr.constant = BigInt::zero();
        if kind == GridGenKind::Line {
            if expr.is_homogeneous_zero() {
                return Err(EngineError::invalid("a grid line needs a non-zero direction"));
            }
            return Ok(Self {
                expr,
                kind,
                divisor: BigInt::one(),
            });
        }
        if divisor.is_zero() {
            return Err(EngineError::invalid("zero divisor"));
        }
        let (expr, divisor) = if divisor.is_negative() {
            (expr.negated(), -divisor)
        } else {
            (expr, divisor)
        };
        Ok(Self {
            expr,
            kind,
            divisor,
        })
    }

    pub fn space_dimension(&self) -> usize {
        self.expr.space_dimension()
    }
}

/// Anything stored in a descriptor system.
pub trait Descriptor: Clone {
    fn space_dimension(&self) -> usize;
}

impl Descriptor for Con {
    fn space_dimension(&self) -> usize {
        Con::space_dimension(self)
    }
}

impl Descriptor for Cg {
    fn space_dimension(&self) -> usize {
        Cg::space_dimension(self)
    }
}

impl Descriptor for Gen {
    fn space_dimension(&self) -> usize {
        Gen::space_dimension(self)
    }
}

impl Descriptor for GridGen {
    fn space_dimension(&self) -> usize {
        GridGen::space_dimension(self)
    }
}

/// Ordered multiset of descriptors with a monotone space dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescSystem<D> {
    items: Vec<D>,
    dim: usize,
}

impl<D> Default for DescSystem<D> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            dim: 0,
        }
    }
}

impl<D: Descriptor> DescSystem<D> {
    pub fn singleton(d: D) -> Self {
        let mut s = Self::default();
        s.insert(d);
        s
    }

    pub fn from_items(items: Vec<D>, dim: usize) -> Self {
        let dim = items.iter().map(D::space_dimension).fold(dim, usize::max);
        Self { items, dim }
    }

    pub fn insert(&mut self, d: D) {
        self.dim = self.dim.max(d.space_dimension());
        self.items.push(d);
    }

    /// Empties the system; its dimension is kept.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[D] {
        &self.items
    }

    pub fn space_dimension(&self) -> usize {
        self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(coeffs: &[i64], constant: i64) -> LinExpr {
        LinExpr {
            coeffs: coeffs.iter().map(|&c| BigInt::from(c)).collect(),
            constant: BigInt::from(constant),
        }
    }

    #[test]
    fn normalization_divides_content_and_orients_equalities() {
        let c = Con::new(expr(&[-2, 4], 6), Rel::Equal).normalized();
        assert_eq!(c.expr, expr(&[1, -2], -3));
        let c = Con::new(expr(&[-2, 4], 6), Rel::GreaterOrEqual).normalized();
        assert_eq!(c.expr, expr(&[-1, 2], 3));
    }

    #[test]
    fn zero_additions_keep_the_dimension() {
        let mut e = LinExpr::zero(0);
        e.add_to_coeff(4, &BigInt::zero());
        assert_eq!(e.space_dimension(), 0);
        e.add_to_coeff(1, &BigInt::from(3));
        assert_eq!(e, expr(&[0, 3], 0));
    }

    #[test]
    fn trivial_constraints() {
        assert_eq!(Con::new(expr(&[0, 0], 1), Rel::GreaterThan).trivial(), Some(true));
        assert_eq!(Con::new(expr(&[0], 0), Rel::GreaterThan).trivial(), Some(false));
        assert_eq!(Con::new(expr(&[1], 0), Rel::Equal).trivial(), None);
    }

    #[test]
    fn point_divisor_is_normalized_positive() {
        let g = Gen::new(GenKind::Point, expr(&[2, 4], 0), BigInt::from(-2)).unwrap();
        assert_eq!(g.divisor, BigInt::from(2));
        assert_eq!(g.expr, expr(&[-2, -4], 0));
        assert!(Gen::new(GenKind::Point, expr(&[1], 0), BigInt::zero()).is_err());
        assert!(Gen::new(GenKind::Ray, expr(&[0], 0), BigInt::one()).is_err());
    }

    #[test]
    fn point_at_uses_common_denominator() {
        let coords = vec![
            BigRational::new(1.into(), 2.into()),
            BigRational::new(2.into(), 3.into()),
        ];
        let g = Gen::point_at(&coords, GenKind::Point);
        assert_eq!(g.divisor, BigInt::from(6));
        assert_eq!(g.coordinates(2), coords);
    }

    #[test]
    fn system_dimension_is_monotone() {
        let mut s = DescSystem::default();
        s.insert(Con::new(expr(&[1, 0, 0], 0), Rel::GreaterOrEqual));
        assert_eq!(s.space_dimension(), 3);
        s.insert(Con::new(expr(&[1], 0), Rel::GreaterOrEqual));
        assert_eq!(s.space_dimension(), 3);
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.space_dimension(), 3);
    }

    #[test]
    fn substitution_scales_by_denominator() {
        // 2x + y + 1 with x := (y + 3) / 2  ->  2(y + 3) + 2y + 2 = 4y + 8
        let e = expr(&[2, 1], 1).substitute(0, &expr(&[0, 1], 3), &BigInt::from(2));
        assert_eq!(e, expr(&[0, 4], 8));
    }
}
