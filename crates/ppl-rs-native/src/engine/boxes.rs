//! Rational boxes: one interval per dimension, endpoints open or closed.

use std::collections::BTreeSet;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use super::error::{
    EResult, EngineError, check_dimension, check_same_dimension, check_variable,
};
use super::fm::Sup;
use super::linear::{Cg, Con, DescSystem, Gen, GenKind, LinExpr, Rel};
use super::poly::Poly;
use super::render::{join, render_rational, variable_name};
use super::shape::{Shape, check_new_dimension};

/// Cost allowed when approximating a polyhedron by a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    Polynomial,
    Simplex,
    Any,
}

/// Stop points of the CC76 widening.
const STOP_POINTS: [i64; 5] = [-2, -1, 0, 1, 2];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub value: BigRational,
    pub open: bool,
}

impl Endpoint {
    fn closed(value: BigRational) -> Self {
        Self { value, open: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Interval {
    pub lower: Option<Endpoint>,
    pub upper: Option<Endpoint>,
}

/// `a` is a strictly tighter lower bound than `b`.
fn tighter_lower(a: &Endpoint, b: &Endpoint) -> bool {
    a.value > b.value || (a.value == b.value && a.open && !b.open)
}

fn tighter_upper(a: &Endpoint, b: &Endpoint) -> bool {
    a.value < b.value || (a.value == b.value && a.open && !b.open)
}

impl Interval {
    pub fn universe() -> Self {
        Self::default()
    }

    pub fn point(value: BigRational) -> Self {
        Self {
            lower: Some(Endpoint::closed(value.clone())),
            upper: Some(Endpoint::closed(value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Some(l), Some(u)) => l.value > u.value || (l.value == u.value && (l.open || u.open)),
            _ => false,
        }
    }

    pub fn is_universe(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    pub fn singleton(&self) -> Option<&BigRational> {
        match (&self.lower, &self.upper) {
            (Some(l), Some(u)) if !l.open && !u.open && l.value == u.value => Some(&l.value),
            _ => None,
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.lower.as_ref().is_none_or(|l| !l.open) && self.upper.as_ref().is_none_or(|u| !u.open)
    }

    pub fn refine_lower(&mut self, bound: Endpoint) {
        if self.lower.as_ref().is_none_or(|l| tighter_lower(&bound, l)) {
            self.lower = Some(bound);
        }
    }

    pub fn refine_upper(&mut self, bound: Endpoint) {
        if self.upper.as_ref().is_none_or(|u| tighter_upper(&bound, u)) {
            self.upper = Some(bound);
        }
    }

    pub fn intersect(&mut self, other: &Interval) {
        if let Some(l) = &other.lower {
            self.refine_lower(l.clone());
        }
        if let Some(u) = &other.upper {
            self.refine_upper(u.clone());
        }
    }

    /// Smallest interval containing both; neither may be empty.
    pub fn join(&mut self, other: &Interval) {
        self.lower = match (self.lower.take(), &other.lower) {
            (Some(a), Some(b)) => Some(if tighter_lower(&a, b) { b.clone() } else { a }),
            _ => None,
        };
        self.upper = match (self.upper.take(), &other.upper) {
            (Some(a), Some(b)) => Some(if tighter_upper(&a, b) { b.clone() } else { a }),
            _ => None,
        };
    }

    pub fn contains(&self, other: &Interval) -> bool {
        if other.is_empty() {
            return true;
        }
        if self.is_empty() {
            return false;
        }
        let lower_ok = match (&self.lower, &other.lower) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => !tighter_lower(a, b),
        };
        let upper_ok = match (&self.upper, &other.upper) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => !tighter_upper(a, b),
        };
        lower_ok && upper_ok
    }

    pub fn is_disjoint_from(&self, other: &Interval) -> bool {
        let mut both = self.clone();
        both.intersect(other);
        both.is_empty()
    }

    pub fn close(&mut self) {
        for e in [&mut self.lower, &mut self.upper].into_iter().flatten() {
            e.open = false;
        }
    }

    /// Some member of a non-empty interval.
    pub fn pick(&self) -> BigRational {
        let one = BigRational::one();
        match (&self.lower, &self.upper) {
            (Some(l), _) if !l.open => l.value.clone(),
            (_, Some(u)) if !u.open => u.value.clone(),
            (Some(l), Some(u)) => (&l.value + &u.value) / BigRational::from_integer(2.into()),
            (Some(l), None) => &l.value + &one,
            (None, Some(u)) => &u.value - &one,
            (None, None) => BigRational::zero(),
        }
    }

    fn render(&self) -> String {
        let lower = match &self.lower {
            None => "(-inf".to_string(),
            Some(l) => format!("{}{}", if l.open { "(" } else { "[" }, render_rational(&l.value)),
        };
        let upper = match &self.upper {
            None => "+inf)".to_string(),
            Some(u) => format!("{}{}", render_rational(&u.value), if u.open { ")" } else { "]" }),
        };
        format!("{lower}, {upper}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxVal {
    intervals: Vec<Interval>,
    empty: bool,
}

fn bound_row(dim: usize, var: usize, e: &Endpoint, lower: bool) -> Con {
    // den*x - num >= 0 for a lower bound, num - den*x >= 0 for an upper one
    let mut expr = LinExpr::zero(dim);
    expr.coeffs[var] = e.value.denom().clone();
    expr.constant = -e.value.numer().clone();
    if !lower {
        expr = expr.negated();
    }
    let rel = if e.open {
        Rel::GreaterThan
    } else {
        Rel::GreaterOrEqual
    };
    Con::new(expr, rel)
}

impl BoxVal {
    pub fn universe(dim: usize) -> EResult<Self> {
        let mut intervals = Vec::new();
        intervals
            .try_reserve_exact(dim)
            .map_err(|e| EngineError::OutOfMemory(format!("box of dimension {dim}: {e}")))?;
        intervals.resize(dim, Interval::universe());
        Ok(Self {
            intervals,
            empty: false,
        })
    }

    pub fn empty(dim: usize) -> EResult<Self> {
        let mut b = Self::universe(dim)?;
        b.empty = true;
        Ok(b)
    }

    pub fn interval(&self, var: usize) -> Option<&Interval> {
        self.intervals.get(var)
    }

    fn set_empty(&mut self) {
        self.empty = true;
    }

    fn settle(&mut self) {
        if self.intervals.iter().any(Interval::is_empty) {
            self.empty = true;
        }
    }

    pub fn from_constraints(sys: &DescSystem<Con>) -> EResult<Self> {
        let mut b = Self::universe(sys.space_dimension())?;
        for c in sys.items() {
            match c.trivial() {
                Some(true) => {}
                Some(false) => b.set_empty(),
                None if c.expr.is_interval_form().is_some() => b.add_constraint(c)?,
                None => {}
            }
        }
        Ok(b)
    }

    pub fn from_congruences(sys: &DescSystem<Cg>) -> EResult<Self> {
        let mut b = Self::universe(sys.space_dimension())?;
        for cg in sys.items() {
            match cg.trivial() {
                Some(true) => {}
                Some(false) => b.set_empty(),
                None if cg.is_equality() && cg.expr.is_interval_form().is_some() => {
                    b.add_constraint(&cg.as_equality())?
                }
                None => {}
            }
        }
        Ok(b)
    }

    /// Bounding box of the generated set.
    pub fn from_generators(sys: &DescSystem<Gen>) -> EResult<Self> {
        let dim = sys.space_dimension();
        let gens = sys.items();
        if gens.is_empty() {
            return Self::empty(dim);
        }
        if !gens.iter().any(|g| g.kind == GenKind::Point) {
            return Err(EngineError::invalid(
                "from_generators: non-empty generator system without points",
            ));
        }
        let mut b = Self::universe(dim)?;
        for var in 0..dim {
            let mut lower: Option<Endpoint> = None;
            let mut upper: Option<Endpoint> = None;
            let mut down = false;
            let mut up = false;
            for g in gens {
                let c = g.expr.coeff(var);
                match g.kind {
                    GenKind::Line => {
                        if !c.is_zero() {
                            down = true;
                            up = true;
                        }
                    }
                    GenKind::Ray => {
                        down |= c.is_negative();
                        up |= c.is_positive();
                    }
                    GenKind::Point | GenKind::ClosurePoint => {
                        let at = Endpoint {
                            value: BigRational::new(c, g.divisor.clone()),
                            open: g.kind == GenKind::ClosurePoint,
                        };
                        // A closed occurrence of the same value wins.
                        let lower_wins = lower.as_ref().is_none_or(|l| {
                            at.value < l.value || (at.value == l.value && !at.open)
                        });
                        if lower_wins {
                            lower = Some(at.clone());
                        }
                        let upper_wins = upper.as_ref().is_none_or(|u| {
                            at.value > u.value || (at.value == u.value && !at.open)
                        });
                        if upper_wins {
                            upper = Some(at);
                        }
                    }
                }
            }
            b.intervals[var] = Interval {
                lower: if down { None } else { lower },
                upper: if up { None } else { upper },
            };
        }
        Ok(b)
    }

    pub fn from_poly(p: &Poly, complexity: Complexity) -> EResult<Self> {
        let dim = p.space_dimension();
        if p.is_known_empty() {
            return Self::empty(dim);
        }
        let mut b = Self::universe(dim)?;
        match complexity {
            Complexity::Polynomial => {
                let (interval, other): (Vec<&Con>, Vec<&Con>) = p
                    .rows()
                    .iter()
                    .partition(|c| c.expr.is_interval_form().is_some());
                for c in interval {
                    b.add_constraint(c)?;
                }
                for c in other {
                    b.refine_with_constraint(c)?;
                }
            }
            Complexity::Simplex | Complexity::Any => {
                if p.is_empty()? {
                    return Self::empty(dim);
                }
                for var in 0..dim {
                    let x = LinExpr::variable(var, dim);
                    let mut interval = Interval::universe();
                    if let Sup::Finite {
                        value, attained, ..
                    } = p.sup(&x)?
                    {
                        interval.upper = Some(Endpoint {
                            value,
                            open: !attained,
                        });
                    }
                    if let Sup::Finite {
                        value, attained, ..
                    } = p.inf(&x)?
                    {
                        interval.lower = Some(Endpoint {
                            value,
                            open: !attained,
                        });
                    }
                    b.intervals[var] = interval;
                }
            }
        }
        Ok(b)
    }

    /// Tightens the interval of the single variable of an interval-form row.
    fn apply_interval_row(&mut self, var: usize, c: &Con) {
        let a = c.coeff(var);
        let at = BigRational::new(-c.expr.constant.clone(), a.clone());
        let bound = Endpoint {
            value: at,
            open: c.is_strict(),
        };
        let interval = &mut self.intervals[var];
        match c.rel {
            Rel::Equal => {
                interval.refine_lower(bound.clone());
                interval.refine_upper(bound);
            }
            _ if a.is_positive() => interval.refine_lower(bound),
            _ => interval.refine_upper(bound),
        }
    }

    /// Range of `e` over the box, as lower and upper endpoints.
    fn range(&self, e: &LinExpr) -> (Option<Endpoint>, Option<Endpoint>) {
        let base = BigRational::from_integer(e.constant.clone());
        let mut lo = Some(Endpoint::closed(base.clone()));
        let mut hi = Some(Endpoint::closed(base));
        for (var, c) in e.coeffs.iter().enumerate() {
            if c.is_zero() {
                continue;
            }
            let interval = &self.intervals[var];
            let q = BigRational::from_integer(c.clone());
            let (for_lo, for_hi) = if c.is_positive() {
                (&interval.lower, &interval.upper)
            } else {
                (&interval.upper, &interval.lower)
            };
            lo = match (lo, for_lo) {
                (Some(acc), Some(b)) => Some(Endpoint {
                    value: acc.value + &q * &b.value,
                    open: acc.open || b.open,
                }),
                _ => None,
            };
            hi = match (hi, for_hi) {
                (Some(acc), Some(b)) => Some(Endpoint {
                    value: acc.value + &q * &b.value,
                    open: acc.open || b.open,
                }),
                _ => None,
            };
        }
        (lo, hi)
    }

    /// Bound propagation of `e >= 0` (closed) onto every mentioned variable.
    fn propagate(&mut self, e: &LinExpr) {
        for (var, a) in e.coeffs.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            let mut rest = e.clone();
            rest.coeffs[var] = BigInt::zero();
            // a*x >= -rest >= -max(rest)
            let (_, hi) = self.range(&rest);
            let Some(hi) = hi else {
                continue;
            };
            let value = -hi.value / BigRational::from_integer(a.clone());
            let bound = Endpoint::closed(value);
            if a.is_positive() {
                self.intervals[var].refine_lower(bound);
            } else {
                self.intervals[var].refine_upper(bound);
            }
        }
    }
}

impl Shape for BoxVal {
    fn space_dimension(&self) -> usize {
        self.intervals.len()
    }

    fn affine_dimension(&self) -> EResult<usize> {
        if self.empty {
            return Ok(0);
        }
        Ok(self
            .intervals
            .iter()
            .filter(|i| i.singleton().is_none())
            .count())
    }

    fn is_empty(&self) -> EResult<bool> {
        Ok(self.empty)
    }

    fn is_universe(&self) -> EResult<bool> {
        Ok(!self.empty && self.intervals.iter().all(Interval::is_universe))
    }

    fn is_bounded(&self) -> EResult<bool> {
        Ok(self.empty || self.intervals.iter().all(Interval::is_bounded))
    }

    fn is_discrete(&self) -> EResult<bool> {
        Ok(self.empty || self.intervals.iter().all(|i| i.singleton().is_some()))
    }

    fn is_topologically_closed(&self) -> EResult<bool> {
        Ok(self.empty || self.intervals.iter().all(Interval::is_closed))
    }

    fn contains(&self, y: &Self) -> EResult<bool> {
        check_same_dimension("contains", self.space_dimension(), y.space_dimension())?;
        if y.empty {
            return Ok(true);
        }
        if self.empty {
            return Ok(false);
        }
        Ok(self
            .intervals
            .iter()
            .zip(&y.intervals)
            .all(|(a, b)| a.contains(b)))
    }

    fn is_disjoint_from(&self, y: &Self) -> EResult<bool> {
        check_same_dimension("is_disjoint_from", self.space_dimension(), y.space_dimension())?;
        if self.empty || y.empty {
            return Ok(true);
        }
        Ok(self
            .intervals
            .iter()
            .zip(&y.intervals)
            .any(|(a, b)| a.is_disjoint_from(b)))
    }

    fn constrains(&self, var: usize) -> EResult<bool> {
        check_variable("constrains", self.space_dimension(), var)?;
        Ok(self.empty || !self.intervals[var].is_universe())
    }

    fn sup(&self, e: &LinExpr) -> EResult<Sup> {
        check_dimension("maximize", self.space_dimension(), e.space_dimension())?;
        if self.empty {
            return Ok(Sup::Empty);
        }
        let (_, hi) = self.range(e);
        let Some(hi) = hi else {
            return Ok(Sup::Unbounded);
        };
        let witness = self
            .intervals
            .iter()
            .enumerate()
            .map(|(var, interval)| {
                let c = e.coeff(var);
                let end = if c.is_positive() {
                    interval.upper.as_ref()
                } else if c.is_negative() {
                    interval.lower.as_ref()
                } else {
                    None
                };
                end.map_or_else(|| interval.pick(), |b| b.value.clone())
            })
            .collect();
        Ok(Sup::Finite {
            value: hi.value,
            attained: !hi.open,
            witness,
        })
    }

    fn constraints(&self) -> EResult<Vec<Con>> {
        let dim = self.space_dimension();
        if self.empty {
            return Ok(vec![Con::falsity(dim)]);
        }
        let mut out = Vec::new();
        for (var, interval) in self.intervals.iter().enumerate() {
            if let Some(v) = interval.singleton() {
                let mut expr = LinExpr::zero(dim);
                expr.coeffs[var] = v.denom().clone();
                expr.constant = -v.numer().clone();
                out.push(Con::new(expr, Rel::Equal));
                continue;
            }
            if let Some(l) = &interval.lower {
                out.push(bound_row(dim, var, l, true));
            }
            if let Some(u) = &interval.upper {
                out.push(bound_row(dim, var, u, false));
            }
        }
        Ok(out)
    }

    fn minimized_constraints(&self) -> EResult<Vec<Con>> {
        self.constraints()
    }

    fn congruences(&self) -> EResult<Vec<Cg>> {
        Ok(self
            .constraints()?
            .iter()
            .filter(|c| c.is_equality() || c.trivial() == Some(false))
            .map(|c| Cg::from_equality(&Con::new(c.expr.clone(), Rel::Equal)))
            .collect())
    }

    fn minimized_congruences(&self) -> EResult<Vec<Cg>> {
        self.congruences()
    }

    fn add_constraint(&mut self, c: &Con) -> EResult<()> {
        check_dimension("add_constraint", self.space_dimension(), c.space_dimension())?;
        match c.trivial() {
            Some(true) => return Ok(()),
            Some(false) => {
                self.set_empty();
                return Ok(());
            }
            None => {}
        }
        let Some(var) = c.expr.is_interval_form() else {
            return Err(EngineError::invalid(
                "add_constraint: a box only accepts interval constraints",
            ));
        };
        if !self.empty {
            self.apply_interval_row(var, c);
            self.settle();
        }
        Ok(())
    }

    fn refine_with_constraint(&mut self, c: &Con) -> EResult<()> {
        check_dimension("refine_with_constraint", self.space_dimension(), c.space_dimension())?;
        if c.trivial().is_some() || c.expr.is_interval_form().is_some() {
            return self.add_constraint(c);
        }
        if self.empty {
            return Ok(());
        }
        let e = c.expr.resized(self.space_dimension());
        for _ in 0..2 {
            self.propagate(&e);
            if c.is_equality() {
                self.propagate(&e.negated());
            }
        }
        self.settle();
        Ok(())
    }

    fn add_congruence(&mut self, cg: &Cg) -> EResult<()> {
        check_dimension("add_congruence", self.space_dimension(), cg.space_dimension())?;
        if cg.is_equality() {
            return self.add_constraint(&cg.as_equality());
        }
        match cg.trivial() {
            Some(true) => Ok(()),
            Some(false) => {
                self.set_empty();
                Ok(())
            }
            None => Err(EngineError::invalid(
                "add_congruence: proper congruences are not representable by boxes",
            )),
        }
    }

    fn refine_with_congruence(&mut self, cg: &Cg) -> EResult<()> {
        check_dimension("refine_with_congruence", self.space_dimension(), cg.space_dimension())?;
        if cg.is_equality() {
            return self.refine_with_constraint(&cg.as_equality());
        }
        if cg.trivial() == Some(false) {
            self.set_empty();
        }
        Ok(())
    }

    fn intersection_assign(&mut self, y: &Self) -> EResult<()> {
        check_same_dimension("intersection_assign", self.space_dimension(), y.space_dimension())?;
        if y.empty {
            self.set_empty();
        }
        if self.empty {
            return Ok(());
        }
        for (a, b) in self.intervals.iter_mut().zip(&y.intervals) {
            a.intersect(b);
        }
        self.settle();
        Ok(())
    }

    fn upper_bound_assign(&mut self, y: &Self) -> EResult<()> {
        check_same_dimension("upper_bound_assign", self.space_dimension(), y.space_dimension())?;
        if y.empty {
            return Ok(());
        }
        if self.empty {
            *self = y.clone();
            return Ok(());
        }
        for (a, b) in self.intervals.iter_mut().zip(&y.intervals) {
            a.join(b);
        }
        Ok(())
    }

    fn difference_assign(&mut self, y: &Self) -> EResult<()> {
        check_same_dimension("difference_assign", self.space_dimension(), y.space_dimension())?;
        if self.empty || y.empty || self.is_disjoint_from(y)? {
            return Ok(());
        }
        if y.contains(self)? {
            self.set_empty();
            return Ok(());
        }
        let escaping: Vec<usize> = (0..self.intervals.len())
            .filter(|&i| !y.intervals[i].contains(&self.intervals[i]))
            .collect();
        let &[var] = escaping.as_slice() else {
            return Ok(());
        };
        let x = self.intervals[var].clone();
        let cut = &y.intervals[var];
        let mut pieces = Vec::new();
        if let Some(l) = &cut.lower {
            let mut below = x.clone();
            below.refine_upper(Endpoint {
                value: l.value.clone(),
                open: !l.open,
            });
            pieces.push(below);
        }
        if let Some(u) = &cut.upper {
            let mut above = x.clone();
            above.refine_lower(Endpoint {
                value: u.value.clone(),
                open: !u.open,
            });
            pieces.push(above);
        }
        let mut result: Option<Interval> = None;
        for piece in pieces.into_iter().filter(|p| !p.is_empty()) {
            match &mut result {
                Some(acc) => acc.join(&piece),
                None => result = Some(piece),
            }
        }
        match result {
            Some(interval) => self.intervals[var] = interval,
            None => self.set_empty(),
        }
        Ok(())
    }

    fn concatenate_assign(&mut self, y: &Self) -> EResult<()> {
        let dim = check_new_dimension("concatenate_assign", self.space_dimension(), y.space_dimension())?;
        self.intervals
            .try_reserve(y.intervals.len())
            .map_err(|e| EngineError::OutOfMemory(format!("box of dimension {dim}: {e}")))?;
        self.intervals.extend(y.intervals.iter().cloned());
        self.empty |= y.empty;
        Ok(())
    }

    fn time_elapse_assign(&mut self, y: &Self) -> EResult<()> {
        check_same_dimension("time_elapse_assign", self.space_dimension(), y.space_dimension())?;
        if self.empty || y.empty {
            self.set_empty();
            return Ok(());
        }
        for (a, b) in self.intervals.iter_mut().zip(&y.intervals) {
            if b.upper.as_ref().is_none_or(|u| u.value.is_positive()) {
                a.upper = None;
            }
            if b.lower.as_ref().is_none_or(|l| l.value.is_negative()) {
                a.lower = None;
            }
        }
        Ok(())
    }

    fn topological_closure_assign(&mut self) -> EResult<()> {
        if !self.empty {
            self.intervals.iter_mut().for_each(Interval::close);
        }
        Ok(())
    }

    fn affine_image(&mut self, var: usize, e: &LinExpr, d: &BigInt) -> EResult<()> {
        check_variable("affine_image", self.space_dimension(), var)?;
        check_dimension("affine_image", self.space_dimension(), e.space_dimension())?;
        if d.is_zero() {
            return Err(EngineError::invalid("affine_image: zero denominator"));
        }
        if self.empty {
            return Ok(());
        }
        let (lo, hi) = self.range(e);
        let q = BigRational::from_integer(d.clone());
        let scale = |b: Option<Endpoint>| {
            b.map(|b| Endpoint {
                value: b.value / &q,
                open: b.open,
            })
        };
        let (lo, hi) = (scale(lo), scale(hi));
        self.intervals[var] = if d.is_positive() {
            Interval { lower: lo, upper: hi }
        } else {
            Interval { lower: hi, upper: lo }
        };
        Ok(())
    }

    fn affine_preimage(&mut self, var: usize, e: &LinExpr, d: &BigInt) -> EResult<()> {
        check_variable("affine_preimage", self.space_dimension(), var)?;
        check_dimension("affine_preimage", self.space_dimension(), e.space_dimension())?;
        if d.is_zero() {
            return Err(EngineError::invalid("affine_preimage: zero denominator"));
        }
        if self.empty {
            return Ok(());
        }
        let old = std::mem::take(&mut self.intervals[var]);
        let dim = self.space_dimension();
        let (e, d) = if d.is_negative() {
            (e.negated(), -d)
        } else {
            (e.clone(), d.clone())
        };
        let e = e.resized(dim);
        // e/d >= l  <=>  den*e - d*num >= 0, and symmetrically for upper bounds.
        let mut rows = Vec::new();
        if let Some(l) = &old.lower {
            let mut expr = e.scaled(l.value.denom());
            expr.constant -= &d * l.value.numer();
            rows.push(Con::new(expr, if l.open { Rel::GreaterThan } else { Rel::GreaterOrEqual }));
        }
        if let Some(u) = &old.upper {
            let mut expr = e.scaled(u.value.denom()).negated();
            expr.constant += &d * u.value.numer();
            rows.push(Con::new(expr, if u.open { Rel::GreaterThan } else { Rel::GreaterOrEqual }));
        }
        for c in rows {
            self.refine_with_constraint(&c)?;
        }
        Ok(())
    }

    fn unconstrain(&mut self, var: usize) -> EResult<()> {
        check_variable("unconstrain", self.space_dimension(), var)?;
        if !self.empty {
            self.intervals[var] = Interval::universe();
        }
        Ok(())
    }

    fn add_space_dimensions_and_embed(&mut self, m: usize) -> EResult<()> {
        let dim = check_new_dimension("add_space_dimensions_and_embed", self.space_dimension(), m)?;
        self.intervals
            .try_reserve(m)
            .map_err(|e| EngineError::OutOfMemory(format!("box of dimension {dim}: {e}")))?;
        self.intervals.resize(dim, Interval::universe());
        Ok(())
    }

    fn add_space_dimensions_and_project(&mut self, m: usize) -> EResult<()> {
        let dim = check_new_dimension("add_space_dimensions_and_project", self.space_dimension(), m)?;
        self.intervals
            .try_reserve(m)
            .map_err(|e| EngineError::OutOfMemory(format!("box of dimension {dim}: {e}")))?;
        self.intervals.resize(dim, Interval::point(BigRational::zero()));
        Ok(())
    }

    fn remove_space_dimensions(&mut self, vars: &BTreeSet<usize>) -> EResult<()> {
        if let Some(&last) = vars.iter().next_back() {
            check_variable("remove_space_dimensions", self.space_dimension(), last)?;
        }
        let mut index = 0;
        self.intervals.retain(|_| {
            let keep = !vars.contains(&index);
            index += 1;
            keep
        });
        Ok(())
    }

    fn remove_higher_space_dimensions(&mut self, new_dim: usize) -> EResult<()> {
        if new_dim > self.space_dimension() {
            return Err(EngineError::invalid(format!(
                "remove_higher_space_dimensions: {new_dim} exceeds space dimension {}",
                self.space_dimension()
            )));
        }
        self.intervals.truncate(new_dim);
        Ok(())
    }

    /// CC76: unstable bounds jump to the next stop point, or vanish.
    fn widened(&self, y: &Self) -> EResult<Self> {
        check_same_dimension("CC76_widening_assign", self.space_dimension(), y.space_dimension())?;
        if self.empty || y.empty {
            return Ok(self.clone());
        }
        let mut out = self.clone();
        for (a, b) in out.intervals.iter_mut().zip(&y.intervals) {
            if let (Some(xl), Some(yl)) = (&a.lower, &b.lower) {
                if tighter_lower(yl, xl) {
                    a.lower = STOP_POINTS
                        .iter()
                        .rev()
                        .map(|&s| BigRational::from_integer(s.into()))
                        .find(|s| *s <= xl.value)
                        .map(Endpoint::closed);
                }
            } else if b.lower.is_none() {
                a.lower = None;
            }
            if let (Some(xu), Some(yu)) = (&a.upper, &b.upper) {
                if tighter_upper(yu, xu) {
                    a.upper = STOP_POINTS
                        .iter()
                        .map(|&s| BigRational::from_integer(s.into()))
                        .find(|s| *s >= xu.value)
                        .map(Endpoint::closed);
                }
            } else if b.upper.is_none() {
                a.upper = None;
            }
        }
        Ok(out)
    }

    /// CC76 narrowing: infinite bounds of `self` are replaced by those of `y`.
    fn narrowed(&self, y: &Self) -> EResult<Self> {
        check_same_dimension("CC76_narrowing_assign", self.space_dimension(), y.space_dimension())?;
        if self.empty || y.empty {
            return Ok(self.clone());
        }
        let mut out = self.clone();
        for (a, b) in out.intervals.iter_mut().zip(&y.intervals) {
            if a.lower.is_none() {
                a.lower = b.lower.clone();
            }
            if a.upper.is_none() {
                a.upper = b.upper.clone();
            }
        }
        Ok(out)
    }

    fn limited_extrapolation(&self, y: &Self, cs: &[Con]) -> EResult<Self> {
        let mut out = self.widened(y)?;
        for c in self.entailed(cs)? {
            if c.expr.is_interval_form().is_some() {
                out.add_constraint(&c)?;
            }
        }
        Ok(out)
    }

    fn render(&self) -> EResult<String> {
        if self.empty {
            return Ok("false".to_string());
        }
        let parts = self
            .intervals
            .iter()
            .enumerate()
            .filter(|(_, i)| !i.is_universe())
            .map(|(var, i)| format!("{} in {}", variable_name(var), i.render()))
            .collect();
        Ok(join(parts, "true"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: i64) -> BigRational {
        BigRational::from_integer(n.into())
    }

    fn row(coeffs: &[i64], constant: i64, rel: Rel) -> Con {
        Con::new(
            LinExpr {
                coeffs: coeffs.iter().map(|&c| BigInt::from(c)).collect(),
                constant: BigInt::from(constant),
            },
            rel,
        )
    }

    fn interval_box(bounds: &[(i64, i64)]) -> BoxVal {
        let mut b = BoxVal::universe(bounds.len()).unwrap();
        for (var, &(lo, hi)) in bounds.iter().enumerate() {
            b.intervals[var] = Interval {
                lower: Some(Endpoint::closed(q(lo))),
                upper: Some(Endpoint::closed(q(hi))),
            };
        }
        b
    }

    #[test]
    fn contradictory_bounds_are_empty() {
        let mut b = BoxVal::universe(1).unwrap();
        b.add_constraint(&row(&[1], -3, Rel::GreaterOrEqual)).unwrap();
        b.add_constraint(&row(&[-1], 2, Rel::GreaterOrEqual)).unwrap();
        assert!(b.is_empty().unwrap());
        assert!(b.is_discrete().unwrap());
        assert_eq!(b.affine_dimension().unwrap(), 0);
    }

    #[test]
    fn non_interval_constraints() {
        let mut b = interval_box(&[(0, 4), (0, 4)]);
        let diagonal = row(&[1, 1], -6, Rel::GreaterOrEqual);
        assert!(matches!(b.add_constraint(&diagonal), Err(EngineError::InvalidArgument(_))));
        b.refine_with_constraint(&diagonal).unwrap();
        assert_eq!(b.intervals[0].lower, Some(Endpoint::closed(q(2))));
        assert_eq!(b.intervals[1].lower, Some(Endpoint::closed(q(2))));
    }

    #[test]
    fn proper_congruence_is_rejected() {
        let mut b = BoxVal::universe(1).unwrap();
        let cg = Cg {
            expr: LinExpr::variable(0, 1),
            modulus: BigInt::from(2),
        };
        assert!(matches!(b.add_congruence(&cg), Err(EngineError::InvalidArgument(_))));
        b.refine_with_congruence(&cg).unwrap();
        assert!(b.is_universe().unwrap());
    }

    #[test]
    fn cc76_widening_uses_stop_points() {
        let x = interval_box(&[(0, 1)]);
        let y = interval_box(&[(0, 0)]);
        let w = x.widened(&y).unwrap();
        assert_eq!(w.intervals[0].upper, Some(Endpoint::closed(q(1))));
        let x = interval_box(&[(0, 3)]);
        let y = interval_box(&[(0, 2)]);
        let w = x.widened(&y).unwrap();
        assert_eq!(w.intervals[0].upper, None);
        assert_eq!(w.intervals[0].lower, Some(Endpoint::closed(q(0))));
    }

    #[test]
    fn cc76_narrowing_restores_bounds() {
        let mut x = interval_box(&[(0, 3)]);
        x.intervals[0].upper = None;
        let y = interval_box(&[(0, 5)]);
        let n = x.narrowed(&y).unwrap();
        assert_eq!(n, interval_box(&[(0, 5)]));
    }

    #[test]
    fn maximize_over_box() {
        let b = interval_box(&[(0, 2), (-1, 1)]);
        let e = LinExpr {
            coeffs: vec![1.into(), (-3).into()],
            constant: 0.into(),
        };
        match b.sup(&e).unwrap() {
            Sup::Finite { value, attained, witness } => {
                assert_eq!(value, q(5));
                assert!(attained);
                assert_eq!(witness, vec![q(2), q(-1)]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn affine_image_and_preimage() {
        let mut b = interval_box(&[(1, 2)]);
        let e = LinExpr {
            coeffs: vec![2.into()],
            constant: 1.into(),
        };
        b.affine_image(0, &e, &BigInt::one()).unwrap();
        assert_eq!(b, interval_box(&[(3, 5)]));
        b.affine_preimage(0, &e, &BigInt::one()).unwrap();
        assert_eq!(b, interval_box(&[(1, 2)]));
    }

    #[test]
    fn difference_in_one_dimension() {
        let mut b = interval_box(&[(0, 4), (0, 1)]);
        let cut = interval_box(&[(2, 6), (-1, 2)]);
        b.difference_assign(&cut).unwrap();
        assert_eq!(b.intervals[0].upper, Some(Endpoint { value: q(2), open: true }));
        assert_eq!(b.intervals[1], interval_box(&[(0, 1)]).intervals[0]);
    }

    #[test]
    fn render_lists_constrained_dimensions() {
        let mut b = interval_box(&[(0, 1), (0, 0)]);
        b.intervals[1] = Interval::universe();
        b.intervals[0].upper = Some(Endpoint { value: q(1), open: true });
        assert_eq!(b.render().unwrap(), "A in [0, 1)");
        assert_eq!(BoxVal::universe(2).unwrap().render().unwrap(), "true");
    }
}
