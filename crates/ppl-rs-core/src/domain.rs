//! Factories for the sets of one domain.

use std::marker::PhantomData;

use ppl_rs_membrane::{PplError, Result};

use crate::property::{Complexity, Degenerate, FromProperty, IntoSpaceDimension, Narrowable, Property, Widenable};
use crate::system::{CongruenceSystem, ConstraintSystem, GeneratorSystem};
use crate::widening::{Narrowing, Widening};

/// Entry point for building sets of domain `T`.
///
/// ```ignore
/// let p = Domain::<CPolyhedron>::create(2, Degenerate::Universe)?;
/// let b: RationalBox = Domain::create_from(&p)?;
/// ```
pub struct Domain<T>(PhantomData<fn() -> T>);

impl<T: Property> Domain<T> {
    /// Fails with `Length` for negative dimensions and dimensions above
    /// [`max_space_dimension`](ppl_rs_membrane::library::max_space_dimension).
    pub fn create(dim: impl IntoSpaceDimension, kind: Degenerate) -> Result<T> {
        T::from_space_dimension(dim, kind)
    }

    pub fn create_from_constraints(cs: &ConstraintSystem) -> Result<T> {
        T::from_constraints(cs)
    }

    pub fn create_from_congruences(cgs: &CongruenceSystem) -> Result<T> {
        T::from_congruences(cgs)
    }

    pub fn create_from_generators(gs: &GeneratorSystem) -> Result<T> {
        T::from_generators(gs)
    }

    /// Convert with the most precise complexity class.
    pub fn create_from<S: Property>(source: &S) -> Result<T>
    where
        T: FromProperty<S>,
    {
        T::from_property(source, Complexity::Any)
    }

    pub fn create_from_with_complexity<S: Property>(source: &S, complexity: Complexity) -> Result<T>
    where
        T: FromProperty<S>,
    {
        T::from_property(source, complexity)
    }
}

impl<T: Widenable> Domain<T> {
    /// The widening registered under `name`.
    pub fn widening(name: &str) -> Result<Widening<T>> {
        T::WIDENINGS
            .iter()
            .find(|w| w.name() == name)
            .copied()
            .ok_or_else(|| PplError::InvalidArgument(format!("no widening named {name}")))
    }

    /// The domain's standard widening.
    pub fn standard_widening() -> Result<Widening<T>> {
        T::WIDENINGS
            .first()
            .copied()
            .ok_or_else(|| PplError::InvalidArgument("no widening registered".into()))
    }
}

impl<T: Narrowable> Domain<T> {
    pub fn narrowing(name: &str) -> Result<Narrowing<T>> {
        T::NARROWINGS
            .iter()
            .find(|n| n.name() == name)
            .copied()
            .ok_or_else(|| PplError::InvalidArgument(format!("no narrowing named {name}")))
    }
}
