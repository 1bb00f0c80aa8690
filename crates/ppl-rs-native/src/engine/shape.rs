//! Operations shared by every abstract domain of the engine.

use std::collections::BTreeSet;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};

use super::error::{EResult, check_dimension};
use super::fm::Sup;
use super::linear::{Cg, Con, LinExpr, Rel};

pub const IS_DISJOINT: u32 = 1;
pub const STRICTLY_INTERSECTS: u32 = 2;
pub const IS_INCLUDED: u32 = 4;
pub const SATURATES: u32 = 8;

/// Largest space dimension any object may reach.
pub const MAX_SPACE_DIMENSION: usize = (u32::MAX as usize) - 1;

pub trait Shape: Sized + Clone {
    fn space_dimension(&self) -> usize;
    fn affine_dimension(&self) -> EResult<usize>;
    fn is_empty(&self) -> EResult<bool>;
    fn is_universe(&self) -> EResult<bool>;
    fn is_bounded(&self) -> EResult<bool>;
    fn is_discrete(&self) -> EResult<bool>;
    fn is_topologically_closed(&self) -> EResult<bool>;
    fn contains(&self, y: &Self) -> EResult<bool>;
    fn is_disjoint_from(&self, y: &Self) -> EResult<bool>;
    fn constrains(&self, var: usize) -> EResult<bool>;
    fn sup(&self, e: &LinExpr) -> EResult<Sup>;

    fn constraints(&self) -> EResult<Vec<Con>>;
    fn minimized_constraints(&self) -> EResult<Vec<Con>>;
    fn congruences(&self) -> EResult<Vec<Cg>>;
    fn minimized_congruences(&self) -> EResult<Vec<Cg>>;

    fn add_constraint(&mut self, c: &Con) -> EResult<()>;
    fn refine_with_constraint(&mut self, c: &Con) -> EResult<()>;
    fn add_congruence(&mut self, cg: &Cg) -> EResult<()>;
    fn refine_with_congruence(&mut self, cg: &Cg) -> EResult<()>;

    fn intersection_assign(&mut self, y: &Self) -> EResult<()>;
    fn upper_bound_assign(&mut self, y: &Self) -> EResult<()>;
    fn difference_assign(&mut self, y: &Self) -> EResult<()>;
    fn concatenate_assign(&mut self, y: &Self) -> EResult<()>;
    fn time_elapse_assign(&mut self, y: &Self) -> EResult<()>;
    fn topological_closure_assign(&mut self) -> EResult<()>;
    fn affine_image(&mut self, var: usize, e: &LinExpr, d: &BigInt) -> EResult<()>;
    fn affine_preimage(&mut self, var: usize, e: &LinExpr, d: &BigInt) -> EResult<()>;
    fn unconstrain(&mut self, var: usize) -> EResult<()>;
    fn add_space_dimensions_and_embed(&mut self, m: usize) -> EResult<()>;
    fn add_space_dimensions_and_project(&mut self, m: usize) -> EResult<()>;
    fn remove_space_dimensions(&mut self, vars: &BTreeSet<usize>) -> EResult<()>;
    fn remove_higher_space_dimensions(&mut self, new_dim: usize) -> EResult<()>;

    /// The domain's standard widening of `self` with the smaller `y`.
    fn widened(&self, y: &Self) -> EResult<Self>;
    /// The domain's standard narrowing of `self` with the smaller `y`.
    fn narrowed(&self, y: &Self) -> EResult<Self>;
    /// Widening improved by the constraints of `cs` that hold on `self`.
    fn limited_extrapolation(&self, y: &Self, cs: &[Con]) -> EResult<Self>;

    fn render(&self) -> EResult<String>;

    fn inf(&self, e: &LinExpr) -> EResult<Sup> {
        Ok(match self.sup(&e.negated())? {
            Sup::Finite {
                value,
                attained,
                witness,
            } => Sup::Finite {
                value: -value,
                attained,
                witness,
            },
            other => other,
        })
    }

    fn strictly_contains(&self, y: &Self) -> EResult<bool> {
        Ok(self.contains(y)? && !y.contains(self)?)
    }

    fn equals(&self, y: &Self) -> EResult<bool> {
        Ok(self.contains(y)? && y.contains(self)?)
    }

    fn bounds_from_above(&self, e: &LinExpr) -> EResult<bool> {
        check_dimension("bounds_from_above", self.space_dimension(), e.space_dimension())?;
        Ok(!matches!(self.sup(e)?, Sup::Unbounded))
    }

    fn bounds_from_below(&self, e: &LinExpr) -> EResult<bool> {
        check_dimension("bounds_from_below", self.space_dimension(), e.space_dimension())?;
        Ok(!matches!(self.inf(e)?, Sup::Unbounded))
    }

    fn relation_with_constraint(&self, c: &Con) -> EResult<u32> {
        check_dimension("relation_with", self.space_dimension(), c.space_dimension())?;
        if self.is_empty()? {
            return Ok(IS_INCLUDED | IS_DISJOINT | SATURATES);
        }
        let hi = self.sup(&c.expr)?;
        let lo = self.inf(&c.expr)?;
        Ok(relation_flags(c.rel, &lo, &hi))
    }

    /// Constraints of `cs` satisfied by every point of `self`.
    fn entailed(&self, cs: &[Con]) -> EResult<Vec<Con>> {
        let mut out = Vec::new();
        for c in cs {
            if c.space_dimension() > self.space_dimension() {
                continue;
            }
            if self.relation_with_constraint(c)? & IS_INCLUDED != 0 {
                out.push(c.clone());
            }
        }
        Ok(out)
    }
}

fn finite(s: &Sup) -> Option<(&BigRational, bool)> {
    match s {
        Sup::Finite {
            value, attained, ..
        } => Some((value, *attained)),
        _ => None,
    }
}

/// Relation bits of `e rel 0` from the range of `e` over a non-empty set.
pub fn relation_flags(rel: Rel, lo: &Sup, hi: &Sup) -> u32 {
    let lo = finite(lo);
    let hi = finite(hi);
    let saturated = matches!((lo, hi), (Some((l, true)), Some((h, true))) if l.is_zero() && h.is_zero());
    if saturated {
        return match rel {
            Rel::GreaterThan => IS_DISJOINT | SATURATES,
            _ => IS_INCLUDED | SATURATES,
        };
    }
    let (included, disjoint) = match rel {
        Rel::GreaterOrEqual => (
            matches!(lo, Some((l, _)) if !l.is_negative()),
            matches!(hi, Some((h, attained)) if h.is_negative() || (h.is_zero() && !attained)),
        ),
        Rel::GreaterThan => (
            matches!(lo, Some((l, attained)) if l.is_positive() || (l.is_zero() && !attained)),
            matches!(hi, Some((h, _)) if !h.is_positive()),
        ),
        Rel::Equal => (
            false,
            matches!(hi, Some((h, attained)) if h.is_negative() || (h.is_zero() && !attained))
                || matches!(lo, Some((l, attained)) if l.is_positive() || (l.is_zero() && !attained)),
        ),
    };
    if included {
        IS_INCLUDED
    } else if disjoint {
        IS_DISJOINT
    } else {
        STRICTLY_INTERSECTS
    }
}

pub fn check_new_dimension(op: &str, current: usize, extra: usize) -> EResult<usize> {
    current
        .checked_add(extra)
        .filter(|d| *d <= MAX_SPACE_DIMENSION)
        .ok_or_else(|| {
            super::error::EngineError::Length(format!(
                "{op}: dimension {current} + {extra} exceeds the maximum space dimension"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fin(v: i64, attained: bool) -> Sup {
        Sup::Finite {
            value: BigRational::from_integer(v.into()),
            attained,
            witness: Vec::new(),
        }
    }

    #[test]
    fn inequality_relations() {
        assert_eq!(relation_flags(Rel::GreaterOrEqual, &fin(1, true), &fin(5, true)), IS_INCLUDED);
        assert_eq!(relation_flags(Rel::GreaterOrEqual, &fin(-5, true), &fin(-1, true)), IS_DISJOINT);
        assert_eq!(
            relation_flags(Rel::GreaterOrEqual, &fin(-1, true), &fin(1, true)),
            STRICTLY_INTERSECTS
        );
        assert_eq!(relation_flags(Rel::GreaterOrEqual, &Sup::Unbounded, &fin(0, false)), IS_DISJOINT);
        assert_eq!(relation_flags(Rel::GreaterThan, &fin(0, true), &fin(3, true)), STRICTLY_INTERSECTS);
    }

    #[test]
    fn saturation() {
        assert_eq!(relation_flags(Rel::Equal, &fin(0, true), &fin(0, true)), IS_INCLUDED | SATURATES);
        assert_eq!(relation_flags(Rel::GreaterThan, &fin(0, true), &fin(0, true)), IS_DISJOINT | SATURATES);
    }

    #[test]
    fn dimension_growth_is_bounded() {
        assert_eq!(check_new_dimension("op", 2, 3).unwrap(), 5);
        assert!(check_new_dimension("op", MAX_SPACE_DIMENSION, 1).is_err());
        assert!(check_new_dimension("op", usize::MAX, 1).is_err());
    }
}
