//! The operation set every abstract domain offers.
//!
//! [`Property`] is implemented once per domain by pointing it at that
//! domain's native entry points ([`FamilyOps`]); every operation below is a
//! default method over those pointers. Capabilities that only some domains
//! have are separate traits: [`Generators`], [`Widenable`], [`Narrowable`]
//! and [`FromProperty`].
//!
//! Mutators follow the `_assign` convention and return `&mut Self` so calls
//! chain with `?`.

use std::ffi::c_int;
use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use ppl_rs_membrane::coefficient::{coefficient_from, read_coefficient, zero_coefficient};
use ppl_rs_membrane::kinds::{ConstraintSystemKind, CongruenceSystemKind, GeneratorKind};
use ppl_rs_membrane::text::copy_native_string;
use ppl_rs_membrane::{ForeignKind, NativeHandle, PplError, Result, library};
use ppl_rs_native::types::*;

use crate::congruence::Congruence;
use crate::constraint::Constraint;
use crate::family::{Assign, Binary, Extract, FamilyOps, Optimize, Refine, Resize, Unary};
use crate::generator::Generator;
use crate::linear::{LinearExpression, Variable};
use crate::marshal::read_dimension;
use crate::sealed::Sealed;
use crate::system::{CongruenceSystem, ConstraintSystem, GeneratorSystem};
use crate::widening::{Narrowing, Widening, WideningToken};

pub(crate) type Raw<T> = <<T as Property>::Kind as ForeignKind>::Raw;

/// What a dimension-only constructor builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Degenerate {
    #[default]
    Universe,
    Empty,
}

/// Effort allowed to a cross-domain conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Complexity {
    Polynomial,
    Simplex,
    #[default]
    Any,
}

impl Complexity {
    pub(crate) fn raw(self) -> c_int {
        match self {
            Self::Polynomial => PPL_COMPLEXITY_CLASS_POLYNOMIAL,
            Self::Simplex => PPL_COMPLEXITY_CLASS_SIMPLEX,
            Self::Any => PPL_COMPLEXITY_CLASS_ANY,
        }
    }
}

/// A space dimension given as any integer type.
///
/// Negative and unrepresentable values fail with [`PplError::Length`]; the
/// native library rejects values above its maximum the same way.
pub trait IntoSpaceDimension: Copy + fmt::Display {
    fn into_space_dimension(self) -> Result<usize>;
}

macro_rules! into_space_dimension {
    ($($t:ty),*) => {
        $(
            impl IntoSpaceDimension for $t {
                fn into_space_dimension(self) -> Result<usize> {
                    usize::try_from(self).map_err(|_| {
                        PplError::Length(format!("{self} is not a valid space dimension"))
                    })
                }
            }
        )*
    };
}

into_space_dimension!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

/// How a set relates to a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolyConRelation(c_int);

impl PolyConRelation {
    #[must_use]
    pub fn is_disjoint(self) -> bool {
        self.0 & PPL_POLY_CON_RELATION_IS_DISJOINT != 0
    }

    #[must_use]
    pub fn strictly_intersects(self) -> bool {
        self.0 & PPL_POLY_CON_RELATION_STRICTLY_INTERSECTS != 0
    }

    #[must_use]
    pub fn is_included(self) -> bool {
        self.0 & PPL_POLY_CON_RELATION_IS_INCLUDED != 0
    }

    /// Every point lies on the constraint's boundary.
    #[must_use]
    pub fn saturates(self) -> bool {
        self.0 & PPL_POLY_CON_RELATION_SATURATES != 0
    }
}

/// A finite supremum or infimum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extremum {
    pub numerator: BigInt,
    /// Always positive.
    pub denominator: BigInt,
    pub attained: bool,
    /// A point reaching the value, or a closure point approaching it when
    /// it is not attained.
    pub point: Generator,
}

impl Extremum {
    #[must_use]
    pub fn value(&self) -> BigRational {
        BigRational::new(self.numerator.clone(), self.denominator.clone())
    }
}

pub trait Property: Sized + Sealed {
    #[doc(hidden)]
    type Kind: ForeignKind;
    #[doc(hidden)]
    const OPS: FamilyOps<<Self::Kind as ForeignKind>::Raw>;

    #[doc(hidden)]
    fn handle(&self) -> &NativeHandle<Self::Kind>;
    #[doc(hidden)]
    fn handle_mut(&mut self) -> &mut NativeHandle<Self::Kind>;
    #[doc(hidden)]
    fn from_handle(handle: NativeHandle<Self::Kind>) -> Self;

    /// The universe or the empty set of dimension `dim`.
    fn from_space_dimension(dim: impl IntoSpaceDimension, kind: Degenerate) -> Result<Self>;
    fn from_constraints(cs: &ConstraintSystem) -> Result<Self>;
    fn from_congruences(cgs: &CongruenceSystem) -> Result<Self>;
    fn from_generators(gs: &GeneratorSystem) -> Result<Self>;

    fn space_dimension(&self) -> Result<usize> {
        let (f, x) = (Self::OPS.space_dimension, self.handle().as_ptr());
        // SAFETY: `x` is live for the call.
        read_dimension(|out| unsafe { f(x, out) })
    }

    /// Dimension of the smallest affine subspace containing the set; zero
    /// when empty.
    fn affine_dimension(&self) -> Result<usize> {
        let (f, x) = (Self::OPS.affine_dimension, self.handle().as_ptr());
        // SAFETY: `x` is live for the call.
        read_dimension(|out| unsafe { f(x, out) })
    }

    fn is_empty(&self) -> Result<bool> {
        unary(self, Self::OPS.is_empty)
    }

    fn is_universe(&self) -> Result<bool> {
        unary(self, Self::OPS.is_universe)
    }

    fn is_bounded(&self) -> Result<bool> {
        unary(self, Self::OPS.is_bounded)
    }

    fn is_discrete(&self) -> Result<bool> {
        unary(self, Self::OPS.is_discrete)
    }

    fn is_topologically_closed(&self) -> Result<bool> {
        unary(self, Self::OPS.is_topologically_closed)
    }

    fn contains(&self, y: &Self) -> Result<bool> {
        binary(self, y, Self::OPS.contains)
    }

    fn strictly_contains(&self, y: &Self) -> Result<bool> {
        binary(self, y, Self::OPS.strictly_contains)
    }

    fn is_disjoint_from(&self, y: &Self) -> Result<bool> {
        binary(self, y, Self::OPS.is_disjoint_from)
    }

    fn equals(&self, y: &Self) -> Result<bool> {
        binary(self, y, Self::OPS.equals)
    }

    /// Whether the set restricts `var` at all.
    fn constrains(&self, var: Variable) -> Result<bool> {
        let (f, x, var) = (Self::OPS.constrains, self.handle().as_ptr(), var.index());
        // SAFETY: `x` is live for the call.
        library::call_predicate(|| unsafe { f(x, var) })
    }

    fn bounds_from_above(&self, expr: &LinearExpression) -> Result<bool> {
        let le = expr.to_native()?;
        let (f, x, le) = (Self::OPS.bounds_from_above, self.handle().as_ptr(), le.as_ptr());
        // SAFETY: both objects are live for the call.
        library::call_predicate(|| unsafe { f(x, le) })
    }

    fn bounds_from_below(&self, expr: &LinearExpression) -> Result<bool> {
        let le = expr.to_native()?;
        let (f, x, le) = (Self::OPS.bounds_from_below, self.handle().as_ptr(), le.as_ptr());
        // SAFETY: both objects are live for the call.
        library::call_predicate(|| unsafe { f(x, le) })
    }

    fn relation_with_constraint(&self, c: &Constraint) -> Result<PolyConRelation> {
        let c = c.to_native()?;
        let (f, x, c) = (Self::OPS.relation_with_constraint, self.handle().as_ptr(), c.as_ptr());
        // SAFETY: both objects are live for the call.
        library::call(|| unsafe { f(x, c) }).map(PolyConRelation)
    }

    /// Fails with [`PplError::Domain`] or [`PplError::InvalidArgument`] when
    /// the domain cannot represent `c` exactly.
    fn add_constraint(&mut self, c: &Constraint) -> Result<&mut Self> {
        let c = c.to_native()?;
        refine(self, c.as_ptr(), Self::OPS.add_constraint)
    }

    /// Adds an over-approximation of `c` when it is not exactly representable.
    fn refine_with_constraint(&mut self, c: &Constraint) -> Result<&mut Self> {
        let c = c.to_native()?;
        refine(self, c.as_ptr(), Self::OPS.refine_with_constraint)
    }

    /// Proper congruences that are neither trivially true nor false fail
    /// with [`PplError::InvalidArgument`].
    fn add_congruence(&mut self, cg: &Congruence) -> Result<&mut Self> {
        let cg = cg.to_native()?;
        refine(self, cg.as_ptr(), Self::OPS.add_congruence)
    }

    fn refine_with_congruence(&mut self, cg: &Congruence) -> Result<&mut Self> {
        let cg = cg.to_native()?;
        refine(self, cg.as_ptr(), Self::OPS.refine_with_congruence)
    }

    /// All or nothing: on failure the set is unchanged.
    fn add_constraints(&mut self, cs: &ConstraintSystem) -> Result<&mut Self> {
        refine(self, cs.as_ptr(), Self::OPS.add_constraints)
    }

    fn refine_with_constraints(&mut self, cs: &ConstraintSystem) -> Result<&mut Self> {
        refine(self, cs.as_ptr(), Self::OPS.refine_with_constraints)
    }

    fn add_congruences(&mut self, cgs: &CongruenceSystem) -> Result<&mut Self> {
        refine(self, cgs.as_ptr(), Self::OPS.add_congruences)
    }

    fn refine_with_congruences(&mut self, cgs: &CongruenceSystem) -> Result<&mut Self> {
        refine(self, cgs.as_ptr(), Self::OPS.refine_with_congruences)
    }

    fn intersection_assign(&mut self, y: &Self) -> Result<&mut Self> {
        assign(self, y, Self::OPS.intersection_assign)
    }

    /// The smallest element of the domain containing both sets.
    fn upper_bound_assign(&mut self, y: &Self) -> Result<&mut Self> {
        assign(self, y, Self::OPS.upper_bound_assign)
    }

    fn difference_assign(&mut self, y: &Self) -> Result<&mut Self> {
        assign(self, y, Self::OPS.difference_assign)
    }

    /// Cartesian product; `y`'s dimensions are appended after the receiver's.
    fn concatenate_assign(&mut self, y: &Self) -> Result<&mut Self> {
        assign(self, y, Self::OPS.concatenate_assign)
    }

    fn time_elapse_assign(&mut self, y: &Self) -> Result<&mut Self> {
        assign(self, y, Self::OPS.time_elapse_assign)
    }

    fn topological_closure_assign(&mut self) -> Result<&mut Self> {
        let (f, x) = (Self::OPS.topological_closure_assign, self.handle_mut().as_mut_ptr());
        // SAFETY: `x` is live for the call.
        library::call(|| unsafe { f(x) })?;
        Ok(self)
    }

    /// `var := expr / denominator`.
    fn affine_image(
        &mut self,
        var: Variable,
        expr: &LinearExpression,
        denominator: impl Into<BigInt>,
    ) -> Result<&mut Self> {
        let f = Self::OPS.affine_image;
        affine(self, var, expr, &denominator.into(), f)
    }

    /// The set of points whose image under `var := expr / denominator` lies
    /// in the receiver.
    fn affine_preimage(
        &mut self,
        var: Variable,
        expr: &LinearExpression,
        denominator: impl Into<BigInt>,
    ) -> Result<&mut Self> {
        let f = Self::OPS.affine_preimage;
        affine(self, var, expr, &denominator.into(), f)
    }

    /// Forget every constraint on `var`.
    fn unconstrain(&mut self, var: Variable) -> Result<&mut Self> {
        resize(self, var.index(), Self::OPS.unconstrain_space_dimension)
    }

    /// New dimensions are unconstrained.
    fn add_space_dimensions_and_embed(&mut self, m: impl IntoSpaceDimension) -> Result<&mut Self> {
        resize(self, m.into_space_dimension()?, Self::OPS.add_space_dimensions_and_embed)
    }

    /// New dimensions are fixed at zero.
    fn add_space_dimensions_and_project(&mut self, m: impl IntoSpaceDimension) -> Result<&mut Self> {
        resize(self, m.into_space_dimension()?, Self::OPS.add_space_dimensions_and_project)
    }

    /// Project away `vars`; the remaining dimensions keep their order.
    fn remove_space_dimensions(&mut self, vars: &[Variable]) -> Result<&mut Self> {
        let indices: Vec<usize> = vars.iter().map(|v| v.index()).collect();
        let (f, x) = (Self::OPS.remove_space_dimensions, self.handle_mut().as_mut_ptr());
        let (ds, n) = (indices.as_ptr(), indices.len());
        // SAFETY: `x` and the index slice are live for the call.
        library::call(|| unsafe { f(x, ds, n) })?;
        Ok(self)
    }

    fn remove_higher_space_dimensions(
        &mut self,
        new_dimension: impl IntoSpaceDimension,
    ) -> Result<&mut Self> {
        resize(
            self,
            new_dimension.into_space_dimension()?,
            Self::OPS.remove_higher_space_dimensions,
        )
    }

    fn constraints(&self) -> Result<ConstraintSystem> {
        extract::<Self, ConstraintSystemKind>(self, Self::OPS.get_constraints)
            .map(ConstraintSystem::from_handle)
    }

    fn minimized_constraints(&self) -> Result<ConstraintSystem> {
        extract::<Self, ConstraintSystemKind>(self, Self::OPS.get_minimized_constraints)
            .map(ConstraintSystem::from_handle)
    }

    fn congruences(&self) -> Result<CongruenceSystem> {
        extract::<Self, CongruenceSystemKind>(self, Self::OPS.get_congruences)
            .map(CongruenceSystem::from_handle)
    }

    fn minimized_congruences(&self) -> Result<CongruenceSystem> {
        extract::<Self, CongruenceSystemKind>(self, Self::OPS.get_minimized_congruences)
            .map(CongruenceSystem::from_handle)
    }

    /// `None` when the set is empty or `expr` is unbounded above on it.
    fn maximize(&self, expr: &LinearExpression) -> Result<Option<Extremum>> {
        optimize(self, expr, Self::OPS.maximize)
    }

    /// `None` when the set is empty or `expr` is unbounded below on it.
    fn minimize(&self, expr: &LinearExpression) -> Result<Option<Extremum>> {
        optimize(self, expr, Self::OPS.minimize)
    }

    fn try_clone(&self) -> Result<Self> {
        let (f, x) = (Self::OPS.copy, self.handle().as_ptr());
        // SAFETY: `x` is live for the call.
        NativeHandle::acquire(|out| unsafe { f(out, x) }).map(Self::from_handle)
    }

    /// The native library's textual form of the set.
    fn render(&self) -> Result<String> {
        let (f, x) = (Self::OPS.io_asprint, self.handle().as_ptr());
        // SAFETY: `x` is live for the call.
        copy_native_string(|out| unsafe { f(x, out) })
    }
}

fn unary<T: Property>(x: &T, f: Unary<Raw<T>>) -> Result<bool> {
    let x = x.handle().as_ptr();
    // SAFETY: `x` is live for the call.
    library::call_predicate(|| unsafe { f(x) })
}

fn binary<T: Property>(x: &T, y: &T, f: Binary<Raw<T>>) -> Result<bool> {
    let (x, y) = (x.handle().as_ptr(), y.handle().as_ptr());
    // SAFETY: both objects are live for the call.
    library::call_predicate(|| unsafe { f(x, y) })
}

fn assign<'a, T: Property>(x: &'a mut T, y: &T, f: Assign<Raw<T>>) -> Result<&'a mut T> {
    let (xp, yp) = (x.handle_mut().as_mut_ptr(), y.handle().as_ptr());
    // SAFETY: both objects are live for the call; `&mut` rules out aliasing.
    library::call(|| unsafe { f(xp, yp) })?;
    Ok(x)
}

fn refine<'a, T: Property, D>(x: &'a mut T, d: *const D, f: Refine<Raw<T>, D>) -> Result<&'a mut T> {
    let xp = x.handle_mut().as_mut_ptr();
    // SAFETY: the caller keeps `d` alive across the call.
    library::call(|| unsafe { f(xp, d) })?;
    Ok(x)
}

fn resize<T: Property>(x: &mut T, n: usize, f: Resize<Raw<T>>) -> Result<&mut T> {
    let xp = x.handle_mut().as_mut_ptr();
    // SAFETY: `xp` is live for the call.
    library::call(|| unsafe { f(xp, n) })?;
    Ok(x)
}

fn affine<'a, T: Property>(
    x: &'a mut T,
    var: Variable,
    expr: &LinearExpression,
    denominator: &BigInt,
    f: crate::family::Affine<Raw<T>>,
) -> Result<&'a mut T> {
    let le = expr.to_native()?;
    let d = coefficient_from(denominator)?;
    let (xp, le, d) = (x.handle_mut().as_mut_ptr(), le.as_ptr(), d.as_ptr());
    let var = var.index();
    // SAFETY: every object is live for the call.
    library::call(|| unsafe { f(xp, var, le, d) })?;
    Ok(x)
}

fn extract<T: Property, K: ForeignKind>(
    x: &T,
    f: Extract<Raw<T>, K::Raw>,
) -> Result<NativeHandle<K>> {
    let x = x.handle().as_ptr();
    // SAFETY: `x` is live for the call.
    NativeHandle::acquire(|out| unsafe { f(x, out) })
}

fn optimize<T: Property>(
    x: &T,
    expr: &LinearExpression,
    f: Optimize<Raw<T>>,
) -> Result<Option<Extremum>> {
    let le = expr.to_native()?;
    let mut n = zero_coefficient()?;
    let mut d = zero_coefficient()?;
    let mut attained: c_int = 0;
    let (xp, lep, np, dp) = (x.handle().as_ptr(), le.as_ptr(), n.as_mut_ptr(), d.as_mut_ptr());
    // SAFETY: every object is live for the call; the witness slot is owned
    // by the returned handle when written.
    let witness = NativeHandle::<GeneratorKind>::acquire_optional(|point| unsafe {
        f(xp, lep, np, dp, &mut attained, point)
    })?;
    let Some(witness) = witness else {
        return Ok(None);
    };
    // SAFETY: `witness` is a live native generator.
    let point = unsafe { Generator::from_native(witness.as_ptr()) }?;
    Ok(Some(Extremum {
        numerator: read_coefficient(&n)?,
        denominator: read_coefficient(&d)?,
        attained: attained != 0,
        point,
    }))
}

/// Domains whose sets can also be described by generators.
pub trait Generators: Property {
    fn generators(&self) -> Result<GeneratorSystem>;
    fn minimized_generators(&self) -> Result<GeneratorSystem>;
    /// A closure point added to a closed set fails with [`PplError::Domain`].
    fn add_generator(&mut self, g: &Generator) -> Result<&mut Self>;
    fn add_generators(&mut self, gs: &GeneratorSystem) -> Result<&mut Self>;
}

pub trait Widenable: Property + 'static {
    /// Registered widenings; the first is the domain's standard one.
    #[doc(hidden)]
    const WIDENINGS: &'static [Widening<Self>];

    /// The domain's standard widening of the receiver with the smaller `y`.
    ///
    /// With `tokens`, a step that would lose precision spends a token instead
    /// and leaves the receiver unchanged.
    fn widening_assign(
        &mut self,
        y: &Self,
        tokens: Option<&mut WideningToken>,
    ) -> Result<&mut Self> {
        let f = Self::OPS.widening_assign_with_tokens;
        let (xp, yp, tp) = (
            self.handle_mut().as_mut_ptr(),
            y.handle().as_ptr(),
            WideningToken::as_mut_ptr(tokens),
        );
        // SAFETY: both objects and the token counter are live for the call.
        library::call(|| unsafe { f(xp, yp, tp) })?;
        Ok(self)
    }
}

pub trait Narrowable: Property + 'static {
    #[doc(hidden)]
    const NARROWINGS: &'static [Narrowing<Self>];

    /// The domain's standard narrowing of the receiver with the smaller `y`.
    fn narrowing_assign(&mut self, y: &Self) -> Result<&mut Self> {
        assign(self, y, Self::OPS.narrowing_assign)
    }
}

/// Limited extrapolation shared by every domain: the standard widening,
/// then every constraint of `cs` that holds on the receiver is kept.
pub(crate) fn limited_extrapolation<'a, T: Property>(
    x: &'a mut T,
    y: &T,
    cs: &ConstraintSystem,
    tokens: Option<&mut WideningToken>,
) -> Result<&'a mut T> {
    let f = T::OPS.limited_extrapolation_assign_with_tokens;
    let (xp, yp, csp, tp) = (
        x.handle_mut().as_mut_ptr(),
        y.handle().as_ptr(),
        cs.as_ptr(),
        WideningToken::as_mut_ptr(tokens),
    );
    // SAFETY: every object and the token counter are live for the call.
    library::call(|| unsafe { f(xp, yp, csp, tp) })?;
    Ok(x)
}

/// Conversion from another domain's set.
pub trait FromProperty<S: Property>: Property {
    /// Exact conversions ignore `complexity`; approximating ones use it to
    /// trade precision for time.
    fn from_property(source: &S, complexity: Complexity) -> Result<Self>;
}
