//! # ppl-rs-core
//!
//! Safe object model over the native polyhedra and rational box library.
//!
//! Descriptors ([`LinearExpression`], [`Constraint`], [`Congruence`],
//! [`Generator`], [`GridGenerator`]) are plain Rust values; they are copied
//! into native objects only for the duration of a call. Systems and abstract
//! sets ([`CPolyhedron`], [`NncPolyhedron`], [`RationalBox`]) live on the
//! native side behind move-only handles.
//!
//! ```ignore
//! use ppl_rs_core::*;
//!
//! let x = Variable::new(0);
//! let mut p = Domain::<CPolyhedron>::create(1, Degenerate::Universe)?;
//! p.add_constraint(&Constraint::ge(x, 3))?;
//! assert!(p.maximize(&x.into())?.is_none());
//! ```
//!
//! Every operation returns [`Result`]; native failures surface as
//! [`PplError`] at the call that triggered them.

mod sealed {
    pub trait Sealed {}
}

pub mod congruence;
pub mod constraint;
pub mod domain;
#[doc(hidden)]
pub mod family;
pub mod fixpoint;
pub mod generator;
pub mod grid_generator;
pub mod linear;
mod marshal;
pub mod polyhedron;
pub mod property;
pub mod rational_box;
pub mod system;
pub mod widening;

pub use congruence::Congruence;
pub use constraint::{Constraint, ConstraintType};
pub use domain::Domain;
pub use fixpoint::{Fixpoint, FixpointOptions, ascending_fixpoint, fixpoint};
pub use generator::{Generator, GeneratorType};
pub use grid_generator::{GridGenerator, GridGeneratorType};
pub use linear::{LinearExpression, Variable};
pub use polyhedron::{CPolyhedron, Closed, NncPolyhedron, NotNecessarilyClosed, Polyhedron, Topology};
pub use property::{
    Complexity, Degenerate, Extremum, FromProperty, Generators, IntoSpaceDimension, Narrowable,
    PolyConRelation, Property, Widenable,
};
pub use rational_box::RationalBox;
pub use system::{
    CongruenceSystem, ConstraintSystem, DescriptorSystem, GeneratorSystem, GridGeneratorSystem,
};
pub use widening::{Narrowing, Widening, WideningToken};

pub use ppl_rs_membrane::{PplError, Result};
