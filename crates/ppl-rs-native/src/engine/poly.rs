//! Convex polyhedra in constraint form.
//!
//! Generators are computed on demand by projecting the polar cone of the
//! homogenized constraint system; non-closed polyhedra go through the usual
//! epsilon lifting, where a strict row `e > 0` becomes `e - ε >= 0` with
//! `0 <= ε <= 1`.

use std::collections::BTreeSet;

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use super::boxes::{BoxVal, Complexity};
use super::error::{
    EResult, EngineError, check_dimension, check_same_dimension, check_variable,
};
use super::fm::{self, Sup};
use super::linear::{Cg, Con, DescSystem, Gen, GenKind, LinExpr, Rel};
use super::render::{join, render_constraint};
use super::shape::{Shape, check_new_dimension};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Closed,
    NotNecessarilyClosed,
}

#[derive(Debug, Clone)]
pub struct Poly {
    dim: usize,
    topology: Topology,
    rows: Vec<Con>,
    empty: bool,
}

fn unit_row(width: usize, var: usize, rel: Rel) -> Con {
    Con::new(LinExpr::variable(var, width), rel)
}

fn upper_unit_row(width: usize, var: usize) -> Con {
    let mut e = LinExpr::variable(var, width).negated();
    e.constant = BigInt::one();
    Con::new(e, Rel::GreaterOrEqual)
}

fn truncated(rows: Vec<Con>, dim: usize) -> Vec<Con> {
    rows.into_iter()
        .map(|mut c| {
            c.expr.coeffs.truncate(dim);
            c
        })
        .collect()
}

/// Rows of `P × [0, 1]` over `(x, ε)` where strict rows become `e - ε >= 0`.
fn eps_lift(rows: &[Con], dim: usize) -> Vec<Con> {
    let mut out: Vec<Con> = rows
        .iter()
        .map(|c| {
            let mut lifted = c.resized(dim + 1);
            if c.is_strict() {
                lifted.expr.coeffs[dim] = -BigInt::one();
                lifted.rel = Rel::GreaterOrEqual;
            }
            lifted
        })
        .collect();
    out.push(unit_row(dim + 1, dim, Rel::GreaterOrEqual));
    out.push(upper_unit_row(dim + 1, dim));
    out
}

/// Inverse of [`eps_lift`]: the points reachable with `ε > 0`.
fn eps_drop(rows: Vec<Con>, dim: usize) -> EResult<Option<Vec<Con>>> {
    let mut rows = rows;
    rows.push(unit_row(dim + 1, dim, Rel::GreaterThan));
    Ok(fm::project(rows, &[dim])?.map(|p| truncated(p.result().to_vec(), dim)))
}

/// Closed convex hull of two closed systems over `dim` variables.
fn hull_rows(a: &[Con], b: &[Con], dim: usize) -> EResult<Option<Vec<Con>>> {
    let width = 2 * dim + 1;
    let lambda = 2 * dim;
    let mut rows = Vec::with_capacity(a.len() + b.len() + 2);
    for r in a {
        let mut e = LinExpr::zero(width);
        for j in 0..dim {
            e.coeffs[dim + j] = r.coeff(j);
        }
        e.coeffs[lambda] = r.expr.constant.clone();
        rows.push(Con::new(e, r.rel));
    }
    for r in b {
        let mut e = LinExpr::zero(width);
        for j in 0..dim {
            let c = r.coeff(j);
            e.coeffs[dim + j] = -&c;
            e.coeffs[j] = c;
        }
        e.coeffs[lambda] = -&r.expr.constant;
        e.constant = r.expr.constant.clone();
        rows.push(Con::new(e, r.rel));
    }
    rows.push(unit_row(width, lambda, Rel::GreaterOrEqual));
    rows.push(upper_unit_row(width, lambda));
    let aux: Vec<usize> = (dim..width).collect();
    Ok(fm::project(rows, &aux)?.map(|p| truncated(p.result().to_vec(), dim)))
}

/// Constraint rows of the set generated by `gens`.
fn generator_rows(gens: &[Gen], dim: usize) -> EResult<Vec<Con>> {
    let width = dim + gens.len();
    let mut rows = Vec::with_capacity(dim + gens.len() + 2);
    for j in 0..dim {
        let mut e = LinExpr::variable(j, width);
        for (i, g) in gens.iter().enumerate() {
            e.coeffs[dim + i] = -g.expr.coeff(j);
        }
        rows.push(Con::new(e, Rel::Equal));
    }
    let mut total = LinExpr::zero(width);
    total.constant = -BigInt::one();
    let mut from_points = LinExpr::zero(width);
    let mut has_closure = false;
    for (i, g) in gens.iter().enumerate() {
        match g.kind {
            GenKind::Line => {}
            GenKind::Ray => rows.push(unit_row(width, dim + i, Rel::GreaterOrEqual)),
            GenKind::Point | GenKind::ClosurePoint => {
                rows.push(unit_row(width, dim + i, Rel::GreaterOrEqual));
                total.coeffs[dim + i] = g.divisor.clone();
                if g.kind == GenKind::Point {
                    from_points.coeffs[dim + i] = g.divisor.clone();
                } else {
                    has_closure = true;
                }
            }
        }
    }
    rows.push(Con::new(total, Rel::Equal));
    if has_closure {
        rows.push(Con::new(from_points, Rel::GreaterThan));
    }
    let aux: Vec<usize> = (dim..width).collect();
    let projected = fm::project(rows, &aux)?
        .ok_or_else(|| EngineError::Internal("generated set is empty".into()))?;
    Ok(truncated(projected.result().to_vec(), dim))
}

/// Generators of a non-empty closed system, from its polar cone.
fn closed_generators(rows: &[Con], dim: usize) -> EResult<Vec<Gen>> {
    let mut polar: Vec<LinExpr> = Vec::new();
    for c in rows {
        let e = c.expr.resized(dim);
        if c.is_equality() {
            polar.push(e.negated());
        }
        polar.push(e);
    }
    let mut positivity = LinExpr::zero(dim);
    positivity.constant = BigInt::one();
    polar.push(positivity);

    let width = dim + 1 + polar.len();
    let mut sys = Vec::with_capacity(width);
    for j in 0..=dim {
        let mut e = LinExpr::variable(j, width);
        for (i, p) in polar.iter().enumerate() {
            let m = if j < dim { p.coeff(j) } else { p.constant.clone() };
            e.coeffs[dim + 1 + i] = -m;
        }
        sys.push(Con::new(e, Rel::Equal));
    }
    for i in 0..polar.len() {
        sys.push(unit_row(width, dim + 1 + i, Rel::GreaterOrEqual));
    }
    let lambdas: Vec<usize> = (dim + 1..width).collect();
    let cone = fm::project(sys, &lambdas)?
        .ok_or_else(|| EngineError::Internal("polar cone is empty".into()))?;

    let mut gens: Vec<Gen> = Vec::new();
    for row in cone.result() {
        let wx: Vec<BigInt> = (0..dim).map(|j| row.coeff(j)).collect();
        let wt = row.coeff(dim);
        let direction = LinExpr {
            coeffs: wx,
            constant: BigInt::zero(),
        };
        let mut g = match row.rel {
            Rel::Equal if !direction.is_homogeneous_zero() => {
                Gen::new(GenKind::Line, direction, BigInt::one())?
            }
            Rel::Equal => continue,
            _ if wt.is_positive() => Gen::new(GenKind::Point, direction, wt)?,
            _ if !direction.is_homogeneous_zero() => {
                Gen::new(GenKind::Ray, direction, BigInt::one())?
            }
            _ => continue,
        };
        g.normalize();
        if !gens.contains(&g) {
            gens.push(g);
        }
    }
    Ok(gens)
}

fn nnc_generators(rows: &[Con], dim: usize) -> EResult<Vec<Gen>> {
    let lifted = closed_generators(&eps_lift(rows, dim), dim + 1)?;
    let mut out: Vec<Gen> = Vec::new();
    for g in lifted {
        let eps = g.expr.coeff(dim);
        let mut expr = g.expr.clone();
        expr.coeffs.truncate(dim);
        let kind = match g.kind {
            GenKind::Point if eps.is_positive() => GenKind::Point,
            GenKind::Point | GenKind::ClosurePoint => GenKind::ClosurePoint,
            other => other,
        };
        if !g.is_point_like() && expr.is_homogeneous_zero() {
            continue;
        }
        let mut projected = Gen::new(kind, expr, g.divisor.clone())?;
        projected.normalize();
        if !out.contains(&projected) {
            out.push(projected);
        }
    }
    let points: Vec<Gen> = out
        .iter()
        .filter(|g| g.kind == GenKind::Point)
        .cloned()
        .collect();
    out.retain(|g| {
        g.kind != GenKind::ClosurePoint
            || !points
                .iter()
                .any(|p| p.expr == g.expr && p.divisor == g.divisor)
    });
    Ok(out)
}

/// Whether `rows` entail `c` in a space of `dim` variables.
fn entails(rows: &[Con], c: &Con, dim: usize) -> EResult<bool> {
    for piece in c.complement() {
        let mut sys = rows.to_vec();
        sys.push(piece.resized(dim));
        if fm::is_satisfiable(&sys, dim)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Rank of a set of integer rows.
fn rank(mut rows: Vec<Vec<BigInt>>) -> usize {
    let cols = rows.first().map_or(0, Vec::len);
    let mut r = 0;
    for col in 0..cols {
        let Some(pivot) = (r..rows.len()).find(|&i| !rows[i][col].is_zero()) else {
            continue;
        };
        rows.swap(r, pivot);
        let p = rows[r].clone();
        for row in rows.iter_mut().skip(r + 1) {
            let f = row[col].clone();
            if f.is_zero() {
                continue;
            }
            for (x, px) in row.iter_mut().zip(&p) {
                *x = &*x * &p[col] - &f * px;
            }
        }
        r += 1;
    }
    r
}

impl Poly {
    pub fn universe(dim: usize, topology: Topology) -> Self {
        Self {
            dim,
            topology,
            rows: Vec::new(),
            empty: false,
        }
    }

    pub fn empty(dim: usize, topology: Topology) -> Self {
        Self {
            dim,
            topology,
            rows: Vec::new(),
            empty: true,
        }
    }

    fn with_rows(dim: usize, topology: Topology, rows: Vec<Con>) -> Self {
        let rows = rows.into_iter().map(|c| c.resized(dim)).collect();
        match fm::simplify(rows) {
            Some(rows) => Self {
                dim,
                topology,
                rows,
                empty: false,
            },
            None => Self::empty(dim, topology),
        }
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn rows(&self) -> &[Con] {
        &self.rows
    }

    pub fn is_known_empty(&self) -> bool {
        self.empty
    }

    fn check_strict(&self, op: &str, c: &Con) -> EResult<()> {
        if self.topology == Topology::Closed && c.is_strict() {
            return Err(EngineError::Domain(format!(
                "{op}: strict inequality in a closed polyhedron"
            )));
        }
        Ok(())
    }

    fn check_compatible(&self, op: &str, y: &Poly) -> EResult<()> {
        if self.topology != y.topology {
            return Err(EngineError::invalid(format!("{op}: topology mismatch")));
        }
        check_same_dimension(op, self.dim, y.dim)
    }

    pub fn from_constraints(sys: &DescSystem<Con>, topology: Topology) -> EResult<Self> {
        let p = Self::universe(sys.space_dimension(), topology);
        for c in sys.items() {
            p.check_strict("from_constraints", c)?;
        }
        Ok(Self::with_rows(p.dim, topology, sys.items().to_vec()))
    }

    /// Proper congruences are not representable and are ignored.
    pub fn from_congruences(sys: &DescSystem<Cg>, topology: Topology) -> EResult<Self> {
        let mut p = Self::universe(sys.space_dimension(), topology);
        for cg in sys.items() {
            p.refine_with_congruence(cg)?;
        }
        Ok(p)
    }

    pub fn from_generators(sys: &DescSystem<Gen>, topology: Topology) -> EResult<Self> {
        let dim = sys.space_dimension();
        let gens = sys.items();
        if gens.is_empty() {
            return Ok(Self::empty(dim, topology));
        }
        Self::check_generators("from_generators", gens, topology)?;
        Ok(Self::with_rows(dim, topology, generator_rows(gens, dim)?))
    }

    fn check_generators(op: &str, gens: &[Gen], topology: Topology) -> EResult<()> {
        if topology == Topology::Closed && gens.iter().any(|g| g.kind == GenKind::ClosurePoint) {
            return Err(EngineError::Domain(format!(
                "{op}: closure point in a closed polyhedron"
            )));
        }
        if !gens.iter().any(|g| g.kind == GenKind::Point) {
            return Err(EngineError::invalid(format!(
                "{op}: non-empty generator system without points"
            )));
        }
        Ok(())
    }

    /// Same set in the other topology; closing it when needed.
    pub fn converted(&self, topology: Topology) -> Self {
        if self.empty {
            return Self::empty(self.dim, topology);
        }
        let rows = match topology {
            Topology::Closed => self.rows.iter().map(Con::closure).collect(),
            Topology::NotNecessarilyClosed => self.rows.clone(),
        };
        Self::with_rows(self.dim, topology, rows)
    }

    pub fn from_box(b: &BoxVal, topology: Topology) -> EResult<Self> {
        let p = Self::with_rows(b.space_dimension(), Topology::NotNecessarilyClosed, b.constraints()?);
        Ok(p.converted(topology))
    }

    fn live(&self) -> EResult<bool> {
        Ok(!self.empty && fm::is_satisfiable(&self.rows, self.dim)?)
    }

    pub fn generators(&self) -> EResult<Vec<Gen>> {
        if !self.live()? {
            return Ok(Vec::new());
        }
        match self.topology {
            Topology::Closed => closed_generators(&self.rows, self.dim),
            Topology::NotNecessarilyClosed => nnc_generators(&self.rows, self.dim),
        }
    }

    pub fn minimized_generators(&self) -> EResult<Vec<Gen>> {
        let Some(rows) = self.minimized_rows()? else {
            return Ok(Vec::new());
        };
        let mut gens = match self.topology {
            Topology::Closed => closed_generators(&rows, self.dim)?,
            Topology::NotNecessarilyClosed => nnc_generators(&rows, self.dim)?,
        };
        let mut i = 0;
        while i < gens.len() {
            let mut rest = gens.clone();
            rest.remove(i);
            if rest.iter().any(|g| g.kind == GenKind::Point) {
                let candidate = Self::with_rows(self.dim, self.topology, generator_rows(&rest, self.dim)?);
                if candidate.contains(self)? {
                    gens = rest;
                    continue;
                }
            }
            i += 1;
        }
        Ok(gens)
    }

    pub fn add_generator(&mut self, g: &Gen) -> EResult<()> {
        self.add_generators(std::slice::from_ref(g))
    }

    pub fn add_generators(&mut self, added: &[Gen]) -> EResult<()> {
        for g in added {
            check_dimension("add_generator", self.dim, g.space_dimension())?;
        }
        if added.is_empty() {
            return Ok(());
        }
        let mut gens = self.generators()?;
        if gens.is_empty() {
            Self::check_generators("add_generator", added, self.topology)?;
        } else if self.topology == Topology::Closed
            && added.iter().any(|g| g.kind == GenKind::ClosurePoint)
        {
            return Err(EngineError::Domain(
                "add_generator: closure point in a closed polyhedron".into(),
            ));
        }
        gens.extend(added.iter().cloned());
        *self = Self::with_rows(self.dim, self.topology, generator_rows(&gens, self.dim)?);
        Ok(())
    }

    fn minimized_rows(&self) -> EResult<Option<Vec<Con>>> {
        if !self.live()? {
            return Ok(None);
        }
        let mut rows = self.rows.clone();
        for i in 0..rows.len() {
            if rows[i].rel != Rel::GreaterOrEqual {
                continue;
            }
            let mut tightened = rows.clone();
            tightened.push(Con::new(rows[i].expr.clone(), Rel::GreaterThan));
            if !fm::is_satisfiable(&tightened, self.dim)? {
                rows[i].rel = Rel::Equal;
            }
        }
        let mut rows = fm::simplify(rows)
            .ok_or_else(|| EngineError::Internal("minimization emptied a live polyhedron".into()))?;
        let mut i = 0;
        while i < rows.len() {
            let mut others = rows.clone();
            let candidate = others.remove(i);
            if entails(&others, &candidate, self.dim)? {
                rows = others;
            } else {
                i += 1;
            }
        }
        Ok(Some(rows))
    }

    /// Limited extrapolation further bounded by the CC76-widened bounding boxes.
    pub fn bounded_h79(&self, y: &Poly, cs: &[Con]) -> EResult<Poly> {
        let mut out = self.limited_extrapolation(y, cs)?;
        let x_box = BoxVal::from_poly(self, Complexity::Any)?;
        let y_box = BoxVal::from_poly(y, Complexity::Any)?;
        let bounds = Poly::from_box(&x_box.widened(&y_box)?, self.topology)?;
        out.intersection_assign(&bounds)?;
        Ok(out)
    }
}

impl Shape for Poly {
    fn space_dimension(&self) -> usize {
        self.dim
    }

    fn affine_dimension(&self) -> EResult<usize> {
        let Some(rows) = self.minimized_rows()? else {
            return Ok(0);
        };
        let eqs: Vec<Vec<BigInt>> = rows
            .iter()
            .filter(|c| c.is_equality())
            .map(|c| c.expr.coeffs.clone())
            .collect();
        Ok(self.dim - rank(eqs))
    }

    fn is_empty(&self) -> EResult<bool> {
        Ok(!self.live()?)
    }

    fn is_universe(&self) -> EResult<bool> {
        Ok(!self.empty && self.rows.is_empty())
    }

    fn is_bounded(&self) -> EResult<bool> {
        if !self.live()? {
            return Ok(true);
        }
        for var in 0..self.dim {
            let e = LinExpr::variable(var, self.dim);
            if !self.bounds_from_above(&e)? || !self.bounds_from_below(&e)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn is_discrete(&self) -> EResult<bool> {
        Ok(self.affine_dimension()? == 0)
    }

    fn is_topologically_closed(&self) -> EResult<bool> {
        if self.topology == Topology::Closed || !self.live()? {
            return Ok(true);
        }
        let mut closed = self.clone();
        closed.topological_closure_assign()?;
        self.contains(&closed)
    }

    fn contains(&self, y: &Self) -> EResult<bool> {
        self.check_compatible("contains", y)?;
        if !y.live()? {
            return Ok(true);
        }
        if !self.live()? {
            return Ok(false);
        }
        for c in &self.rows {
            if !entails(&y.rows, c, self.dim)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn is_disjoint_from(&self, y: &Self) -> EResult<bool> {
        self.check_compatible("is_disjoint_from", y)?;
        let mut both = self.clone();
        both.intersection_assign(y)?;
        both.is_empty()
    }

    fn constrains(&self, var: usize) -> EResult<bool> {
        check_variable("constrains", self.dim, var)?;
        if !self.live()? {
            return Ok(true);
        }
        let mut cylinder = self.clone();
        cylinder.unconstrain(var)?;
        Ok(!self.contains(&cylinder)?)
    }

    fn sup(&self, e: &LinExpr) -> EResult<Sup> {
        check_dimension("maximize", self.dim, e.space_dimension())?;
        if self.empty {
            return Ok(Sup::Empty);
        }
        fm::supremum(&self.rows, self.dim, &e.resized(self.dim))
    }

    fn constraints(&self) -> EResult<Vec<Con>> {
        if self.empty {
            return Ok(vec![Con::falsity(self.dim)]);
        }
        Ok(self.rows.clone())
    }

    fn minimized_constraints(&self) -> EResult<Vec<Con>> {
        Ok(self
            .minimized_rows()?
            .unwrap_or_else(|| vec![Con::falsity(self.dim)]))
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
        Ok(self
            .minimized_constraints()?
            .iter()
            .filter(|c| c.is_equality() || c.trivial() == Some(false))
            .map(|c| Cg::from_equality(&Con::new(c.expr.clone(), Rel::Equal)))
            .collect())
    }

    fn add_constraint(&mut self, c: &Con) -> EResult<()> {
        check_dimension("add_constraint", self.dim, c.space_dimension())?;
        self.check_strict("add_constraint", c)?;
        if self.empty {
            return Ok(());
        }
        let mut rows = std::mem::take(&mut self.rows);
        rows.push(c.clone());
        *self = Self::with_rows(self.dim, self.topology, rows);
        Ok(())
    }

    fn refine_with_constraint(&mut self, c: &Con) -> EResult<()> {
        let c = match self.topology {
            Topology::Closed => c.closure(),
            Topology::NotNecessarilyClosed => c.clone(),
        };
        self.add_constraint(&c)
    }

    fn add_congruence(&mut self, cg: &Cg) -> EResult<()> {
        check_dimension("add_congruence", self.dim, cg.space_dimension())?;
        if cg.is_equality() {
            return self.add_constraint(&cg.as_equality());
        }
        match cg.trivial() {
            Some(true) => Ok(()),
            Some(false) => {
                *self = Self::empty(self.dim, self.topology);
                Ok(())
            }
            None => Err(EngineError::invalid(
                "add_congruence: proper congruences are not representable by polyhedra",
            )),
        }
    }

    fn refine_with_congruence(&mut self, cg: &Cg) -> EResult<()> {
        check_dimension("refine_with_congruence", self.dim, cg.space_dimension())?;
        if cg.is_equality() || cg.trivial().is_some() {
            return self.add_congruence(cg);
        }
        Ok(())
    }

    fn intersection_assign(&mut self, y: &Self) -> EResult<()> {
        self.check_compatible("intersection_assign", y)?;
        if self.empty || y.empty {
            *self = Self::empty(self.dim, self.topology);
            return Ok(());
        }
        let mut rows = std::mem::take(&mut self.rows);
        rows.extend(y.rows.iter().cloned());
        *self = Self::with_rows(self.dim, self.topology, rows);
        Ok(())
    }

    fn upper_bound_assign(&mut self, y: &Self) -> EResult<()> {
        self.check_compatible("upper_bound_assign", y)?;
        if !y.live()? {
            return Ok(());
        }
        if !self.live()? {
            *self = y.clone();
            return Ok(());
        }
        let dim = self.dim;
        let rows = match self.topology {
            Topology::Closed => hull_rows(&self.rows, &y.rows, dim)?,
            Topology::NotNecessarilyClosed => {
                match hull_rows(&eps_lift(&self.rows, dim), &eps_lift(&y.rows, dim), dim + 1)? {
                    Some(lifted) => eps_drop(lifted, dim)?,
                    None => None,
                }
            }
        };
        *self = match rows {
            Some(rows) => Self::with_rows(dim, self.topology, rows),
            None => Self::empty(dim, self.topology),
        };
        Ok(())
    }

    fn difference_assign(&mut self, y: &Self) -> EResult<()> {
        self.check_compatible("difference_assign", y)?;
        if !y.live()? || !self.live()? {
            return Ok(());
        }
        let mut result = Self::empty(self.dim, self.topology);
        for c in &y.rows {
            for piece in c.complement() {
                let piece = match self.topology {
                    Topology::Closed => piece.closure(),
                    Topology::NotNecessarilyClosed => piece,
                };
                let mut rows = self.rows.clone();
                rows.push(piece);
                let part = Self::with_rows(self.dim, self.topology, rows);
                if part.live()? {
                    result.upper_bound_assign(&part)?;
                }
            }
        }
        *self = result;
        Ok(())
    }

    fn concatenate_assign(&mut self, y: &Self) -> EResult<()> {
        if self.topology != y.topology {
            return Err(EngineError::invalid("concatenate_assign: topology mismatch"));
        }
        let dim = check_new_dimension("concatenate_assign", self.dim, y.dim)?;
        if self.empty || y.empty {
            *self = Self::empty(dim, self.topology);
            return Ok(());
        }
        let mut rows: Vec<Con> = self.rows.iter().map(|c| c.resized(dim)).collect();
        for c in &y.rows {
            let mut coeffs = vec![BigInt::zero(); self.dim];
            coeffs.extend(c.expr.coeffs.iter().cloned());
            rows.push(Con::new(
                LinExpr {
                    coeffs,
                    constant: c.expr.constant.clone(),
                },
                c.rel,
            ));
        }
        *self = Self::with_rows(dim, self.topology, rows);
        Ok(())
    }

    fn time_elapse_assign(&mut self, y: &Self) -> EResult<()> {
        self.check_compatible("time_elapse_assign", y)?;
        if !self.live()? || !y.live()? {
            *self = Self::empty(self.dim, self.topology);
            return Ok(());
        }
        let n = self.dim;
        let width = 2 * n + 1;
        let t = 2 * n;
        let mut rows = Vec::new();
        for c in &self.rows {
            let mut e = LinExpr::zero(width);
            for j in 0..n {
                e.coeffs[n + j] = c.coeff(j);
            }
            e.constant = c.expr.constant.clone();
            rows.push(Con::new(e, c.rel));
        }
        for c in &y.rows {
            let c = c.closure();
            let mut e = LinExpr::zero(width);
            for j in 0..n {
                let a = c.coeff(j);
                e.coeffs[n + j] = -&a;
                e.coeffs[j] = a;
            }
            e.coeffs[t] = c.expr.constant.clone();
            rows.push(Con::new(e, c.rel));
        }
        rows.push(unit_row(width, t, Rel::GreaterOrEqual));
        let aux: Vec<usize> = (n..width).collect();
        *self = match fm::project(rows, &aux)? {
            Some(p) => Self::with_rows(n, self.topology, truncated(p.result().to_vec(), n)),
            None => Self::empty(n, self.topology),
        };
        Ok(())
    }

    fn topological_closure_assign(&mut self) -> EResult<()> {
        if self.topology == Topology::NotNecessarilyClosed && !self.empty {
            let rows = self.rows.iter().map(Con::closure).collect();
            *self = Self::with_rows(self.dim, self.topology, rows);
        }
        Ok(())
    }

    fn affine_image(&mut self, var: usize, e: &LinExpr, d: &BigInt) -> EResult<()> {
        check_variable("affine_image", self.dim, var)?;
        check_dimension("affine_image", self.dim, e.space_dimension())?;
        if d.is_zero() {
            return Err(EngineError::invalid("affine_image: zero denominator"));
        }
        if self.empty {
            return Ok(());
        }
        let n = self.dim;
        let mut rows: Vec<Con> = self.rows.iter().map(|c| c.resized(n + 1)).collect();
        // d*w - e == 0 on a fresh column w
        let mut link = e.resized(n + 1).negated();
        link.coeffs[n] = d.clone();
        rows.push(Con::new(link, Rel::Equal));
        let Some(p) = fm::project(rows, &[var])? else {
            *self = Self::empty(n, self.topology);
            return Ok(());
        };
        let rows = p
            .result()
            .iter()
            .map(|c| {
                let mut c = c.clone();
                c.expr.coeffs[var] = c.expr.coeffs[n].clone();
                c.expr.coeffs.truncate(n);
                c
            })
            .collect();
        *self = Self::with_rows(n, self.topology, rows);
        Ok(())
    }

    fn affine_preimage(&mut self, var: usize, e: &LinExpr, d: &BigInt) -> EResult<()> {
        check_variable("affine_preimage", self.dim, var)?;
        check_dimension("affine_preimage", self.dim, e.space_dimension())?;
        if d.is_zero() {
            return Err(EngineError::invalid("affine_preimage: zero denominator"));
        }
        if self.empty {
            return Ok(());
        }
        let (e, d) = if d.is_negative() {
            (e.negated(), -d)
        } else {
            (e.clone(), d.clone())
        };
        let e = e.resized(self.dim);
        let rows = self
            .rows
            .iter()
            .map(|c| Con::new(c.expr.substitute(var, &e, &d), c.rel))
            .collect();
        *self = Self::with_rows(self.dim, self.topology, rows);
        Ok(())
    }

    fn unconstrain(&mut self, var: usize) -> EResult<()> {
        check_variable("unconstrain", self.dim, var)?;
        if self.empty {
            return Ok(());
        }
        *self = match fm::project(std::mem::take(&mut self.rows), &[var])? {
            Some(p) => Self::with_rows(self.dim, self.topology, p.result().to_vec()),
            None => Self::empty(self.dim, self.topology),
        };
        Ok(())
    }

    fn add_space_dimensions_and_embed(&mut self, m: usize) -> EResult<()> {
        let dim = check_new_dimension("add_space_dimensions_and_embed", self.dim, m)?;
        self.dim = dim;
        for c in &mut self.rows {
            c.expr.grow(dim);
        }
        Ok(())
    }

    fn add_space_dimensions_and_project(&mut self, m: usize) -> EResult<()> {
        let old = self.dim;
        self.add_space_dimensions_and_embed(m)?;
        if !self.empty {
            for var in old..self.dim {
                self.rows.push(unit_row(self.dim, var, Rel::Equal));
            }
        }
        Ok(())
    }

    fn remove_space_dimensions(&mut self, vars: &BTreeSet<usize>) -> EResult<()> {
        if let Some(&last) = vars.iter().next_back() {
            check_variable("remove_space_dimensions", self.dim, last)?;
        }
        let new_dim = self.dim - vars.len();
        if self.empty {
            *self = Self::empty(new_dim, self.topology);
            return Ok(());
        }
        let order: Vec<usize> = vars.iter().copied().collect();
        let Some(p) = fm::project(std::mem::take(&mut self.rows), &order)? else {
            *self = Self::empty(new_dim, self.topology);
            return Ok(());
        };
        let rows = p
            .result()
            .iter()
            .map(|c| {
                let coeffs = c
                    .expr
                    .coeffs
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !vars.contains(i))
                    .map(|(_, v)| v.clone())
                    .collect();
                Con::new(
                    LinExpr {
                        coeffs,
                        constant: c.expr.constant.clone(),
                    },
                    c.rel,
                )
            })
            .collect();
        *self = Self::with_rows(new_dim, self.topology, rows);
        Ok(())
    }

    fn remove_higher_space_dimensions(&mut self, new_dim: usize) -> EResult<()> {
        if new_dim > self.dim {
            return Err(EngineError::invalid(format!(
                "remove_higher_space_dimensions: {new_dim} exceeds space dimension {}",
                self.dim
            )));
        }
        let vars: BTreeSet<usize> = (new_dim..self.dim).collect();
        self.remove_space_dimensions(&vars)
    }

    /// H79: the constraints of `y` that still hold on `self`.
    fn widened(&self, y: &Self) -> EResult<Self> {
        self.check_compatible("H79_widening_assign", y)?;
        let Some(y_rows) = y.minimized_rows()? else {
            return Ok(self.clone());
        };
        if !self.live()? {
            return Ok(self.clone());
        }
        let mut kept = Vec::new();
        for c in y_rows.iter().flat_map(Con::halves) {
            if entails(&self.rows, &c, self.dim)? {
                kept.push(c);
            }
        }
        Ok(Self::with_rows(self.dim, self.topology, kept))
    }

    /// Adds the constraints of `y` whose expression `self` leaves unbounded below.
    fn narrowed(&self, y: &Self) -> EResult<Self> {
        self.check_compatible("narrowing_assign", y)?;
        let Some(y_rows) = y.minimized_rows()? else {
            return Ok(self.clone());
        };
        let mut out = self.clone();
        for c in y_rows.iter().flat_map(Con::halves) {
            if !self.bounds_from_below(&c.expr)? {
                out.add_constraint(&c)?;
            }
        }
        Ok(out)
    }

    fn limited_extrapolation(&self, y: &Self, cs: &[Con]) -> EResult<Self> {
        let mut out = self.widened(y)?;
        for c in self.entailed(cs)? {
            out.refine_with_constraint(&c)?;
        }
        Ok(out)
    }

    fn render(&self) -> EResult<String> {
        let Some(rows) = self.minimized_rows()? else {
            return Ok("false".to_string());
        };
        Ok(join(rows.iter().map(render_constraint).collect(), "true"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_rational::BigRational;

    fn row(coeffs: &[i64], constant: i64, rel: Rel) -> Con {
        Con::new(
            LinExpr {
                coeffs: coeffs.iter().map(|&c| BigInt::from(c)).collect(),
                constant: BigInt::from(constant),
            },
            rel,
        )
    }

    fn poly(dim: usize, rows: Vec<Con>) -> Poly {
        Poly::with_rows(dim, Topology::Closed, rows)
    }

    fn square() -> Poly {
        poly(
            2,
            vec![
                row(&[1, 0], 0, Rel::GreaterOrEqual),
                row(&[-1, 0], 1, Rel::GreaterOrEqual),
                row(&[0, 1], 0, Rel::GreaterOrEqual),
                row(&[0, -1], 1, Rel::GreaterOrEqual),
            ],
        )
    }

    #[test]
    fn contradictory_bounds_are_empty() {
        let p = poly(1, vec![row(&[1], -3, Rel::GreaterOrEqual), row(&[-1], 2, Rel::GreaterOrEqual)]);
        assert!(p.is_empty().unwrap());
        assert_eq!(p.affine_dimension().unwrap(), 0);
        assert!(p.is_discrete().unwrap());
    }

    #[test]
    fn square_generators_are_its_vertices() {
        let gens = square().minimized_generators().unwrap();
        assert_eq!(gens.len(), 4);
        assert!(gens.iter().all(|g| g.kind == GenKind::Point));
        let sys = DescSystem::from_items(gens, 2);
        let back = Poly::from_generators(&sys, Topology::Closed).unwrap();
        assert!(back.equals(&square()).unwrap());
    }

    #[test]
    fn universe_generators_are_point_and_lines() {
        let gens = Poly::universe(2, Topology::Closed).generators().unwrap();
        assert_eq!(gens.iter().filter(|g| g.kind == GenKind::Line).count(), 2);
        assert_eq!(gens.iter().filter(|g| g.kind == GenKind::Point).count(), 1);
    }

    #[test]
    fn hull_of_two_points_is_a_segment() {
        let mut p = poly(1, vec![row(&[1], 0, Rel::Equal)]);
        let q = poly(1, vec![row(&[1], -2, Rel::Equal)]);
        p.upper_bound_assign(&q).unwrap();
        let expected = poly(1, vec![row(&[1], 0, Rel::GreaterOrEqual), row(&[-1], 2, Rel::GreaterOrEqual)]);
        assert!(p.equals(&expected).unwrap());
    }

    #[test]
    fn nnc_hull_keeps_open_end() {
        // (0, 1] joined with {2} is (0, 2]
        let mut p = Poly::with_rows(
            1,
            Topology::NotNecessarilyClosed,
            vec![row(&[1], 0, Rel::GreaterThan), row(&[-1], 1, Rel::GreaterOrEqual)],
        );
        let q = Poly::with_rows(1, Topology::NotNecessarilyClosed, vec![row(&[1], -2, Rel::Equal)]);
        p.upper_bound_assign(&q).unwrap();
        let expected = Poly::with_rows(
            1,
            Topology::NotNecessarilyClosed,
            vec![row(&[1], 0, Rel::GreaterThan), row(&[-1], 2, Rel::GreaterOrEqual)],
        );
        assert!(p.equals(&expected).unwrap());
        assert!(!p.is_topologically_closed().unwrap());
    }

    #[test]
    fn nnc_generators_mark_closure_points() {
        let p = Poly::with_rows(
            1,
            Topology::NotNecessarilyClosed,
            vec![row(&[1], 0, Rel::GreaterOrEqual), row(&[-1], 1, Rel::GreaterThan)],
        );
        let gens = p.minimized_generators().unwrap();
        assert!(gens.iter().any(|g| g.kind == GenKind::Point && g.expr.is_homogeneous_zero()));
        assert!(gens.iter().any(|g| g.kind == GenKind::ClosurePoint && !g.expr.is_homogeneous_zero()));
        let back = Poly::from_generators(&DescSystem::from_items(gens, 1), Topology::NotNecessarilyClosed).unwrap();
        assert!(back.equals(&p).unwrap());
    }

    #[test]
    fn affine_image_translates() {
        let mut p = square();
        // x := x + 2
        let e = LinExpr {
            coeffs: vec![1.into(), 0.into()],
            constant: 2.into(),
        };
        p.affine_image(0, &e, &BigInt::one()).unwrap();
        let lo = p.inf(&LinExpr::variable(0, 2)).unwrap();
        assert!(matches!(lo, Sup::Finite { ref value, .. } if *value == BigRational::from_integer(2.into())));
        let mut q = p.clone();
        q.affine_preimage(0, &e, &BigInt::one()).unwrap();
        assert!(q.equals(&square()).unwrap());
    }

    #[test]
    fn affine_image_with_negative_denominator() {
        let mut p = poly(1, vec![row(&[1], -2, Rel::Equal)]);
        // x := x / -2
        p.affine_image(0, &LinExpr::variable(0, 1), &BigInt::from(-2)).unwrap();
        assert!(p.equals(&poly(1, vec![row(&[1], 1, Rel::Equal)])).unwrap());
    }

    #[test]
    fn h79_drops_unstable_bounds() {
        let x0 = poly(1, vec![row(&[1], 0, Rel::GreaterOrEqual), row(&[-1], 1, Rel::GreaterOrEqual)]);
        let x1 = poly(1, vec![row(&[1], 0, Rel::GreaterOrEqual), row(&[-1], 2, Rel::GreaterOrEqual)]);
        let w = x1.widened(&x0).unwrap();
        assert!(w.equals(&poly(1, vec![row(&[1], 0, Rel::GreaterOrEqual)])).unwrap());
        assert!(w.contains(&x1).unwrap());
    }

    #[test]
    fn difference_of_overlapping_intervals() {
        let mut p = poly(1, vec![row(&[1], 0, Rel::GreaterOrEqual), row(&[-1], 4, Rel::GreaterOrEqual)]);
        let q = poly(1, vec![row(&[1], -2, Rel::GreaterOrEqual)]);
        p.difference_assign(&q).unwrap();
        assert!(p.equals(&poly(1, vec![row(&[1], 0, Rel::GreaterOrEqual), row(&[-1], 2, Rel::GreaterOrEqual)])).unwrap());
    }

    #[test]
    fn time_elapse_opens_directions() {
        let mut p = poly(1, vec![row(&[1], 0, Rel::Equal)]);
        let q = poly(1, vec![row(&[1], -1, Rel::Equal)]);
        p.time_elapse_assign(&q).unwrap();
        assert!(p.equals(&poly(1, vec![row(&[1], 0, Rel::GreaterOrEqual)])).unwrap());
    }

    #[test]
    fn minimized_constraints_drop_redundancy_and_find_equalities() {
        let p = poly(
            2,
            vec![
                row(&[1, 0], 0, Rel::GreaterOrEqual),
                row(&[-1, 0], 0, Rel::GreaterOrEqual),
                row(&[0, 1], 0, Rel::GreaterOrEqual),
                row(&[1, 1], 5, Rel::GreaterOrEqual),
            ],
        );
        let rows = p.minimized_constraints().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(p.affine_dimension().unwrap(), 1);
    }

    #[test]
    fn remove_and_concatenate_dimensions() {
        let mut p = square();
        p.remove_space_dimensions(&BTreeSet::from([0])).unwrap();
        assert_eq!(p.space_dimension(), 1);
        assert!(p.is_bounded().unwrap());
        let mut q = p.clone();
        q.concatenate_assign(&p).unwrap();
        assert_eq!(q.space_dimension(), 2);
        assert!(q.equals(&square()).unwrap());
    }

    #[test]
    fn closed_polyhedra_reject_strict_rows() {
        let mut p = Poly::universe(1, Topology::Closed);
        let strict = row(&[1], 0, Rel::GreaterThan);
        assert!(matches!(p.add_constraint(&strict), Err(EngineError::Domain(_))));
        p.refine_with_constraint(&strict).unwrap();
        assert!(p.contains(&poly(1, vec![row(&[1], 0, Rel::Equal)])).unwrap());
    }

    #[test]
    fn rank_of_dependent_rows() {
        let rows = vec![
            vec![BigInt::from(1), BigInt::from(2)],
            vec![BigInt::from(2), BigInt::from(4)],
        ];
        assert_eq!(rank(rows), 1);
    }
}
