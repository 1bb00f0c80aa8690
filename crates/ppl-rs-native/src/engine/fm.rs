//! Fourier–Motzkin projection over integer rows with strict inequalities.
//!
//! Every system handled here has rows of one common length. `None` stands for
//! an unsatisfiable system throughout.

use std::collections::HashMap;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use super::budget;
use super::error::{EResult, EngineError};
use super::linear::{Con, LinExpr, Rel};

/// Splits a normalized non-trivial row into primitive direction and
/// rational offset: `coeffs·x + constant == g * (dir·x + offset)`.
fn direction(expr: &LinExpr) -> (Vec<BigInt>, BigRational, BigInt) {
    let g = expr.homogeneous_content();
    let dir = expr.coeffs.iter().map(|c| c / &g).collect();
    let offset = BigRational::new(expr.constant.clone(), g.clone());
    (dir, offset, g)
}

fn from_direction(dir: &[BigInt], offset: &BigRational, rel: Rel) -> Con {
    let den = offset.denom().clone();
    let expr = LinExpr {
        coeffs: dir.iter().map(|c| c * &den).collect(),
        constant: offset.numer().clone(),
    };
    Con::new(expr, rel).normalized()
}

fn negate(dir: &[BigInt]) -> Vec<BigInt> {
    dir.iter().map(|c| -c).collect()
}

/// Orients a direction so its leading coefficient is positive.
fn canonical(dir: &[BigInt]) -> (Vec<BigInt>, bool) {
    match dir.iter().find(|c| !c.is_zero()) {
        Some(lead) if lead.is_negative() => (negate(dir), true),
        _ => (dir.to_vec(), false),
    }
}

/// Removes trivial, duplicate and dominated rows, turns opposite tight
/// inequality pairs into equalities and detects direct contradictions.
pub fn simplify(cons: Vec<Con>) -> Option<Vec<Con>> {
    let mut eqs: HashMap<Vec<BigInt>, BigRational> = HashMap::new();
    let mut eq_order: Vec<Vec<BigInt>> = Vec::new();
    let mut ineqs: HashMap<Vec<BigInt>, (BigRational, bool)> = HashMap::new();
    let mut ineq_order: Vec<Vec<BigInt>> = Vec::new();

    fn add_eq(
        eqs: &mut HashMap<Vec<BigInt>, BigRational>,
        order: &mut Vec<Vec<BigInt>>,
        dir: Vec<BigInt>,
        offset: BigRational,
    ) -> bool {
        let (dir, flipped) = canonical(&dir);
        let offset = if flipped { -offset } else { offset };
        match eqs.get(&dir) {
            Some(existing) => *existing == offset,
            None => {
                order.push(dir.clone());
                eqs.insert(dir, offset);
                true
            }
        }
    }

    for c in cons {
        match c.trivial() {
            Some(true) => continue,
            Some(false) => return None,
            None => {}
        }
        let (dir, offset, _) = direction(&c.expr);
        match c.rel {
            Rel::Equal => {
                if !add_eq(&mut eqs, &mut eq_order, dir, offset) {
                    return None;
                }
            }
            Rel::GreaterOrEqual | Rel::GreaterThan => {
                let strict = c.rel == Rel::GreaterThan;
                match ineqs.get_mut(&dir) {
                    Some((k, s)) => {
                        if offset < *k || (offset == *k && strict) {
                            *k = offset;
                            *s = strict;
                        }
                    }
                    None => {
                        ineq_order.push(dir.clone());
                        ineqs.insert(dir, (offset, strict));
                    }
                }
            }
        }
    }

    let mut kept: Vec<(Vec<BigInt>, BigRational, bool)> = Vec::new();
    let mut merged: Vec<Vec<BigInt>> = Vec::new();
    for dir in &ineq_order {
        if merged.contains(dir) {
            continue;
        }
        let Some((k, s)) = ineqs.get(dir).cloned() else {
            continue;
        };
        let opposite = negate(dir);
        if let Some((k2, s2)) = ineqs.get(&opposite) {
            let slack = &k + k2;
            if slack.is_negative() || (slack.is_zero() && (s || *s2)) {
                return None;
            }
            if slack.is_zero() {
                merged.push(opposite);
                merged.push(dir.clone());
                if !add_eq(&mut eqs, &mut eq_order, dir.clone(), k) {
                    return None;
                }
                continue;
            }
        }
        kept.push((dir.clone(), k, s));
    }

    let mut out: Vec<Con> = eq_order
        .iter()
        .filter_map(|dir| eqs.get(dir).map(|k| from_direction(dir, k, Rel::Equal)))
        .collect();
    for (dir, k, strict) in kept {
        let (canon, flipped) = canonical(&dir);
        if let Some(e) = eqs.get(&canon) {
            // dir·x == -sign*e on the equality's hyperplane.
            let at = if flipped { k + e } else { k - e };
            if at.is_negative() || (at.is_zero() && strict) {
                return None;
            }
            continue;
        }
        let rel = if strict {
            Rel::GreaterThan
        } else {
            Rel::GreaterOrEqual
        };
        out.push(from_direction(&dir, &k, rel));
    }
    Some(out)
}

/// Eliminates `var`, substituting through an equality when one mentions it.
pub fn eliminate(cons: &[Con], var: usize) -> EResult<Option<Vec<Con>>> {
    if let Some(pos) = cons
        .iter()
        .position(|c| c.is_equality() && !c.coeff(var).is_zero())
    {
        let mut pivot = cons[pos].expr.clone();
        if pivot.coeff(var).is_negative() {
            pivot = pivot.negated();
        }
        let a = pivot.coeff(var);
        let mut out = Vec::with_capacity(cons.len());
        for (i, c) in cons.iter().enumerate() {
            if i == pos {
                continue;
            }
            let r = c.coeff(var);
            if r.is_zero() {
                out.push(c.clone());
                continue;
            }
            budget::tick(1)?;
            let expr = c.expr.combine(&a, &pivot, &-r);
            budget::check_coefficients(&expr.coeffs)?;
            out.push(Con::new(expr, c.rel));
        }
        return Ok(simplify(out));
    }

    let mut pos = Vec::new();
    let mut neg = Vec::new();
    let mut out = Vec::new();
    for c in cons {
        let a = c.coeff(var);
        if a.is_positive() {
            pos.push(c);
        } else if a.is_negative() {
            neg.push(c);
        } else {
            out.push(c.clone());
        }
    }
    for p in &pos {
        let pa = p.coeff(var);
        for n in &neg {
            budget::tick(1)?;
            let na = -n.coeff(var);
            let expr = p.expr.combine(&na, &n.expr, &pa);
            budget::check_coefficients(&expr.coeffs)?;
            let rel = if p.is_strict() || n.is_strict() {
                Rel::GreaterThan
            } else {
                Rel::GreaterOrEqual
            };
            out.push(Con::new(expr, rel));
        }
    }
    Ok(simplify(out))
}

/// Successive eliminations, kept so that witnesses can be rebuilt.
#[derive(Debug, Clone)]
pub struct Projection {
    /// `stages[k]` is the system before eliminating `order[k]`.
    pub stages: Vec<Vec<Con>>,
    pub order: Vec<usize>,
}

impl Projection {
    pub fn result(&self) -> &[Con] {
        self.stages.last().map(Vec::as_slice).unwrap_or(&[])
    }
}

fn elimination_cost(cons: &[Con], var: usize) -> Option<usize> {
    let mut p = 0usize;
    let mut n = 0usize;
    for c in cons {
        let a = c.coeff(var);
        if a.is_zero() {
            continue;
        }
        if c.is_equality() {
            return Some(0);
        }
        if a.is_positive() {
            p += 1;
        } else {
            n += 1;
        }
    }
    Some(p * n)
}

/// Projects `vars` away, cheapest variable first.
pub fn project(cons: Vec<Con>, vars: &[usize]) -> EResult<Option<Projection>> {
    let Some(first) = simplify(cons) else {
        return Ok(None);
    };
    let mut stages = vec![first];
    let mut order = Vec::with_capacity(vars.len());
    let mut remaining: Vec<usize> = vars.to_vec();
    while !remaining.is_empty() {
        let current = stages.last().map(Vec::as_slice).unwrap_or(&[]);
        let (idx, _) = remaining
            .iter()
            .enumerate()
            .filter_map(|(i, &v)| elimination_cost(current, v).map(|cost| (i, cost)))
            .min_by_key(|&(_, cost)| cost)
            .ok_or_else(|| EngineError::Internal("empty elimination set".into()))?;
        let var = remaining.swap_remove(idx);
        let Some(next) = eliminate(current, var)? else {
            return Ok(None);
        };
        order.push(var);
        stages.push(next);
    }
    Ok(Some(Projection { stages, order }))
}

pub fn is_satisfiable(cons: &[Con], dim: usize) -> EResult<bool> {
    let vars: Vec<usize> = (0..dim).collect();
    Ok(project(cons.to_vec(), &vars)?.is_some())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub value: BigRational,
    pub strict: bool,
}

/// Bounds on `var` implied by rows where every other variable is fixed.
#[derive(Debug, Default, Clone)]
pub struct Range {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
    pub exact: Option<BigRational>,
}

impl Range {
    fn tighten_lower(&mut self, value: BigRational, strict: bool) {
        let replace = match &self.lower {
            None => true,
            Some(b) => value > b.value || (value == b.value && strict),
        };
        if replace {
            self.lower = Some(Bound { value, strict });
        }
    }

    fn tighten_upper(&mut self, value: BigRational, strict: bool) {
        let replace = match &self.upper {
            None => true,
            Some(b) => value < b.value || (value == b.value && strict),
        };
        if replace {
            self.upper = Some(Bound { value, strict });
        }
    }

    /// A value inside the range, central when `interior` is set.
    pub fn pick(&self, interior: bool) -> Option<BigRational> {
        if let Some(v) = &self.exact {
            return Some(v.clone());
        }
        let one = BigRational::one();
        match (&self.lower, &self.upper) {
            (None, None) => Some(BigRational::zero()),
            (Some(l), None) => Some(if l.strict || interior {
                &l.value + &one
            } else {
                l.value.clone()
            }),
            (None, Some(u)) => Some(if u.strict || interior {
                &u.value - &one
            } else {
                u.value.clone()
            }),
            (Some(l), Some(u)) => {
                if l.value > u.value || (l.value == u.value && (l.strict || u.strict)) {
                    return None;
                }
                if l.value == u.value {
                    return Some(l.value.clone());
                }
                if interior || l.strict {
                    if !interior && !u.strict {
                        return Some(u.value.clone());
                    }
                    return Some((&l.value + &u.value) / BigRational::from_integer(2.into()));
                }
                Some(l.value.clone())
            }
        }
    }
}

/// Range of `var` in `cons` given values for every other mentioned variable.
pub fn range_of(cons: &[Con], var: usize, values: &[Option<BigRational>]) -> EResult<Range> {
    let mut range = Range::default();
    for c in cons {
        let a = c.coeff(var);
        if a.is_zero() {
            continue;
        }
        let mut rest = BigRational::from_integer(c.expr.constant.clone());
        for (j, coeff) in c.expr.coeffs.iter().enumerate() {
            if j == var || coeff.is_zero() {
                continue;
            }
            let v = values
                .get(j)
                .and_then(Option::as_ref)
                .ok_or_else(|| EngineError::Internal(format!("unbound variable {j}")))?;
            rest += BigRational::from_integer(coeff.clone()) * v;
        }
        let at = -rest / BigRational::from_integer(a.clone());
        match c.rel {
            Rel::Equal => range.exact = Some(at),
            Rel::GreaterOrEqual | Rel::GreaterThan => {
                let strict = c.is_strict();
                if a.is_positive() {
                    range.tighten_lower(at, strict);
                } else {
                    range.tighten_upper(at, strict);
                }
            }
        }
    }
    Ok(range)
}

/// Back-substitutes through `proj`, filling the eliminated variables.
/// Variables that were never eliminated must already be set in `values`.
pub fn sample(
    proj: &Projection,
    values: &mut [Option<BigRational>],
    interior: bool,
) -> EResult<()> {
    for k in (0..proj.order.len()).rev() {
        let var = proj.order[k];
        let range = range_of(&proj.stages[k], var, values)?;
        let value = range
            .pick(interior)
            .ok_or_else(|| EngineError::Internal("inconsistent back-substitution".into()))?;
        values[var] = Some(value);
    }
    Ok(())
}

/// Result of maximizing a linear form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sup {
    Empty,
    Unbounded,
    Finite {
        value: BigRational,
        attained: bool,
        witness: Vec<BigRational>,
    },
}

fn with_objective(cons: &[Con], dim: usize, objective: &LinExpr) -> Vec<Con> {
    let mut rows: Vec<Con> = cons.iter().map(|c| c.resized(dim + 1)).collect();
    // t - objective == 0
    let mut link = objective.resized(dim).negated();
    link.coeffs.push(BigInt::one());
    rows.push(Con::new(link, Rel::Equal));
    rows
}

/// Supremum of `objective` over `cons` in a space of `dim` variables.
pub fn supremum(cons: &[Con], dim: usize, objective: &LinExpr) -> EResult<Sup> {
    let vars: Vec<usize> = (0..dim).collect();
    let Some(proj) = project(with_objective(cons, dim, objective), &vars)? else {
        return Ok(Sup::Empty);
    };
    let mut values: Vec<Option<BigRational>> = vec![None; dim + 1];
    let range = range_of(proj.result(), dim, &values)?;
    let (value, attained) = match (&range.exact, &range.upper) {
        (Some(v), _) => (v.clone(), true),
        (None, Some(u)) => (u.value.clone(), !u.strict),
        (None, None) => return Ok(Sup::Unbounded),
    };
    values[dim] = Some(value.clone());
    if attained {
        sample(&proj, &mut values, false)?;
    } else {
        let closed: Vec<Con> = cons.iter().map(Con::closure).collect();
        let Some(closed_proj) = project(with_objective(&closed, dim, objective), &vars)? else {
            return Err(EngineError::Internal("closure of a non-empty set is empty".into()));
        };
        sample(&closed_proj, &mut values, false)?;
    }
    let witness = values
        .into_iter()
        .take(dim)
        .map(|v| v.unwrap_or_else(BigRational::zero))
        .collect();
    Ok(Sup::Finite {
        value,
        attained,
        witness,
    })
}

/// Some point of `cons`, central when `interior` is set.
pub fn find_point(cons: &[Con], dim: usize, interior: bool) -> EResult<Option<Vec<BigRational>>> {
    let vars: Vec<usize> = (0..dim).collect();
    let Some(proj) = project(cons.to_vec(), &vars)? else {
        return Ok(None);
    };
    let mut values = vec![None; dim];
    sample(&proj, &mut values, interior)?;
    Ok(Some(
        values.into_iter().map(|v| v.unwrap_or_else(BigRational::zero)).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn con(coeffs: &[i64], constant: i64, rel: Rel) -> Con {
        Con::new(
            LinExpr {
                coeffs: coeffs.iter().map(|&c| BigInt::from(c)).collect(),
                constant: BigInt::from(constant),
            },
            rel,
        )
    }

    fn q(n: i64, d: i64) -> BigRational {
        BigRational::new(n.into(), d.into())
    }

    #[test]
    fn simplify_keeps_tightest_bound() {
        let out = simplify(vec![
            con(&[1], -1, Rel::GreaterOrEqual),
            con(&[2], -6, Rel::GreaterOrEqual),
            con(&[1], -3, Rel::GreaterThan),
        ])
        .unwrap();
        assert_eq!(out, vec![con(&[1], -3, Rel::GreaterThan)]);
    }

    #[test]
    fn simplify_detects_contradiction_and_tight_pairs() {
        // x >= 3 and x <= 2
        assert!(simplify(vec![con(&[1], -3, Rel::GreaterOrEqual), con(&[-1], 2, Rel::GreaterOrEqual)]).is_none());
        // x >= 3 and x <= 3
        let out = simplify(vec![con(&[1], -3, Rel::GreaterOrEqual), con(&[-1], 3, Rel::GreaterOrEqual)]).unwrap();
        assert_eq!(out, vec![con(&[1], -3, Rel::Equal)]);
        // x > 3 and x <= 3
        assert!(simplify(vec![con(&[1], -3, Rel::GreaterThan), con(&[-1], 3, Rel::GreaterOrEqual)]).is_none());
    }

    #[test]
    fn simplify_drops_inequalities_implied_by_equalities() {
        let out = simplify(vec![con(&[1, 1], -2, Rel::Equal), con(&[-1, -1], 5, Rel::GreaterOrEqual)]).unwrap();
        assert_eq!(out, vec![con(&[1, 1], -2, Rel::Equal)]);
        assert!(simplify(vec![con(&[1, 1], -2, Rel::Equal), con(&[1, 1], -5, Rel::GreaterOrEqual)]).is_none());
    }

    #[test]
    fn elimination_combines_strictness() {
        // x - y > 0, y >= 0, 1 - x >= 0  ->  eliminate y: x > 0
        let cons = vec![
            con(&[1, -1], 0, Rel::GreaterThan),
            con(&[0, 1], 0, Rel::GreaterOrEqual),
            con(&[-1, 0], 1, Rel::GreaterOrEqual),
        ];
        let out = eliminate(&cons, 1).unwrap().unwrap();
        assert!(out.contains(&con(&[1, 0], 0, Rel::GreaterThan)));
        assert!(out.contains(&con(&[-1, 0], 1, Rel::GreaterOrEqual)));
    }

    #[test]
    fn supremum_of_triangle() {
        // x >= 0, y >= 0, x + y <= 4; max x + 2y = 8 at (0, 4)
        let cons = vec![
            con(&[1, 0], 0, Rel::GreaterOrEqual),
            con(&[0, 1], 0, Rel::GreaterOrEqual),
            con(&[-1, -1], 4, Rel::GreaterOrEqual),
        ];
        let objective = LinExpr {
            coeffs: vec![1.into(), 2.into()],
            constant: BigInt::zero(),
        };
        match supremum(&cons, 2, &objective).unwrap() {
            Sup::Finite { value, attained, witness } => {
                assert_eq!(value, q(8, 1));
                assert!(attained);
                assert_eq!(witness, vec![q(0, 1), q(4, 1)]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn supremum_not_attained_and_unbounded() {
        let open = vec![con(&[-2], 1, Rel::GreaterThan)];
        let x = LinExpr {
            coeffs: vec![BigInt::one()],
            constant: BigInt::zero(),
        };
        match supremum(&open, 1, &x).unwrap() {
            Sup::Finite { value, attained, witness } => {
                assert_eq!(value, q(1, 2));
                assert!(!attained);
                assert_eq!(witness, vec![q(1, 2)]);
            }
            other => panic!("unexpected {other:?}"),
        }
        let lower = vec![con(&[1], 3, Rel::GreaterOrEqual)];
        assert_eq!(supremum(&lower, 1, &x).unwrap(), Sup::Unbounded);
        let empty = vec![con(&[1], -3, Rel::GreaterOrEqual), con(&[-1], 2, Rel::GreaterOrEqual)];
        assert_eq!(supremum(&empty, 1, &x).unwrap(), Sup::Empty);
    }

    #[test]
    fn interior_point_of_open_square() {
        let cons = vec![
            con(&[1, 0], 0, Rel::GreaterThan),
            con(&[-1, 0], 1, Rel::GreaterThan),
            con(&[0, 1], 0, Rel::GreaterThan),
            con(&[0, -1], 1, Rel::GreaterThan),
        ];
        let p = find_point(&cons, 2, true).unwrap().unwrap();
        assert!(cons.iter().all(|c| c.satisfied_by(&p)));
    }
}
