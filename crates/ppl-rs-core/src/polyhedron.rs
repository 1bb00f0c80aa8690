//! Convex polyhedra, closed or not necessarily closed.
//!
//! The topology is a type parameter, so a closed and an NNC polyhedron can
//! never meet in a binary operation; converting between them goes through
//! [`FromProperty`].

use std::ffi::c_int;
use std::fmt;
use std::marker::PhantomData;

use ppl_rs_membrane::kinds::{GeneratorSystemKind, PolyhedronKind};
use ppl_rs_membrane::{NativeHandle, Result, library};
use ppl_rs_native::polyhedron_abi;
use ppl_rs_native::types::{PPL_TOPOLOGY_CLOSED, PPL_TOPOLOGY_NNC};

use crate::family::{FamilyOps, family_ops};
use crate::generator::Generator;
use crate::property::{
    Complexity, Degenerate, FromProperty, Generators, IntoSpaceDimension, Narrowable, Property,
    Widenable, limited_extrapolation,
};
use crate::rational_box::RationalBox;
use crate::sealed::Sealed;
use crate::system::{CongruenceSystem, ConstraintSystem, GeneratorSystem};
use crate::widening::{Narrowing, Widening, WideningToken};

/// Whether strict inequalities are representable.
pub trait Topology: Sealed + 'static {
    #[doc(hidden)]
    const RAW: c_int;
    const NAME: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closed {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotNecessarilyClosed {}

impl Sealed for Closed {}
impl Sealed for NotNecessarilyClosed {}

impl Topology for Closed {
    const RAW: c_int = PPL_TOPOLOGY_CLOSED;
    const NAME: &'static str = "C_Polyhedron";
}

impl Topology for NotNecessarilyClosed {
    const RAW: c_int = PPL_TOPOLOGY_NNC;
    const NAME: &'static str = "NNC_Polyhedron";
}

pub struct Polyhedron<T: Topology> {
    handle: NativeHandle<PolyhedronKind>,
    _topology: PhantomData<fn() -> T>,
}

pub type CPolyhedron = Polyhedron<Closed>;
pub type NncPolyhedron = Polyhedron<NotNecessarilyClosed>;

fn empty_flag(kind: Degenerate) -> c_int {
    c_int::from(kind == Degenerate::Empty)
}

impl<T: Topology> Sealed for Polyhedron<T> {}

impl<T: Topology> Property for Polyhedron<T> {
    type Kind = PolyhedronKind;
    const OPS: FamilyOps<ppl_rs_native::types::ppl_Polyhedron_tag> = family_ops!(polyhedron_abi);

    fn handle(&self) -> &NativeHandle<PolyhedronKind> {
        &self.handle
    }

    fn handle_mut(&mut self) -> &mut NativeHandle<PolyhedronKind> {
        &mut self.handle
    }

    fn from_handle(handle: NativeHandle<PolyhedronKind>) -> Self {
        Self {
            handle,
            _topology: PhantomData,
        }
    }

    fn from_space_dimension(dim: impl IntoSpaceDimension, kind: Degenerate) -> Result<Self> {
        let (d, empty) = (dim.into_space_dimension()?, empty_flag(kind));
        // SAFETY: the factory writes through the provided out-pointer.
        NativeHandle::acquire(|out| unsafe {
            polyhedron_abi::new_from_space_dimension(out, T::RAW, d, empty)
        })
        .map(Self::from_handle)
    }

    /// A strict inequality fails with `Domain` on a closed polyhedron.
    fn from_constraints(cs: &ConstraintSystem) -> Result<Self> {
        let cs = cs.as_ptr();
        // SAFETY: `cs` is live for the call.
        NativeHandle::acquire(|out| unsafe { polyhedron_abi::new_from_constraints(out, T::RAW, cs) })
            .map(Self::from_handle)
    }

    fn from_congruences(cgs: &CongruenceSystem) -> Result<Self> {
        let cgs = cgs.as_ptr();
        // SAFETY: `cgs` is live for the call.
        NativeHandle::acquire(|out| unsafe {
            polyhedron_abi::new_from_congruences(out, T::RAW, cgs)
        })
        .map(Self::from_handle)
    }

    /// The system needs at least one point unless it is empty.
    fn from_generators(gs: &GeneratorSystem) -> Result<Self> {
        let gs = gs.as_ptr();
        // SAFETY: `gs` is live for the call.
        NativeHandle::acquire(|out| unsafe { polyhedron_abi::new_from_generators(out, T::RAW, gs) })
            .map(Self::from_handle)
    }
}

impl<T: Topology> Polyhedron<T> {
    #[must_use]
    pub fn topology_name(&self) -> &'static str {
        T::NAME
    }

    fn h79_widening(&mut self, y: &Self, tokens: Option<&mut WideningToken>) -> Result<()> {
        self.widening_assign(y, tokens).map(drop)
    }

    fn bounded_refinement(&mut self, y: &Self) -> Result<()> {
        self.narrowing_assign(y).map(drop)
    }

    /// H79 widening that keeps every constraint of `cs` holding on the
    /// receiver.
    pub fn limited_h79_extrapolation_assign(
        &mut self,
        y: &Self,
        cs: &ConstraintSystem,
        tokens: Option<&mut WideningToken>,
    ) -> Result<&mut Self> {
        limited_extrapolation(self, y, cs, tokens)
    }

    /// Limited H79 extrapolation further bounded by the box widening of the
    /// two operands.
    pub fn bounded_h79_extrapolation_assign(
        &mut self,
        y: &Self,
        cs: &ConstraintSystem,
        tokens: Option<&mut WideningToken>,
    ) -> Result<&mut Self> {
        let (xp, yp, csp) = (self.handle.as_mut_ptr(), y.handle.as_ptr(), cs.as_ptr());
        let tp = WideningToken::as_mut_ptr(tokens);
        // SAFETY: every object and the token counter are live for the call.
        library::call(|| unsafe {
            polyhedron_abi::bounded_extrapolation_assign_with_tokens(xp, yp, csp, tp)
        })?;
        Ok(self)
    }
}

impl<T: Topology> Generators for Polyhedron<T> {
    fn generators(&self) -> Result<GeneratorSystem> {
        let x = self.handle.as_ptr();
        // SAFETY: `x` is live for the call.
        NativeHandle::<GeneratorSystemKind>::acquire(|out| unsafe {
            polyhedron_abi::get_generators(x, out)
        })
        .map(GeneratorSystem::from_handle)
    }

    fn minimized_generators(&self) -> Result<GeneratorSystem> {
        let x = self.handle.as_ptr();
        // SAFETY: `x` is live for the call.
        NativeHandle::<GeneratorSystemKind>::acquire(|out| unsafe {
            polyhedron_abi::get_minimized_generators(x, out)
        })
        .map(GeneratorSystem::from_handle)
    }

    fn add_generator(&mut self, g: &Generator) -> Result<&mut Self> {
        let g = g.to_native()?;
        let (x, g) = (self.handle.as_mut_ptr(), g.as_ptr());
        // SAFETY: both objects are live for the call.
        library::call(|| unsafe { polyhedron_abi::add_generator(x, g) })?;
        Ok(self)
    }

    fn add_generators(&mut self, gs: &GeneratorSystem) -> Result<&mut Self> {
        let (x, gs) = (self.handle.as_mut_ptr(), gs.as_ptr());
        // SAFETY: both objects are live for the call.
        library::call(|| unsafe { polyhedron_abi::add_generators(x, gs) })?;
        Ok(self)
    }
}

impl<T: Topology> Widenable for Polyhedron<T> {
    const WIDENINGS: &'static [Widening<Self>] = &[Widening::new("H79", Self::h79_widening)];
}

impl<T: Topology> Narrowable for Polyhedron<T> {
    const NARROWINGS: &'static [Narrowing<Self>] =
        &[Narrowing::new("bounded_refinement", Self::bounded_refinement)];
}

/// Exact in both directions; an NNC source is topologically closed on the
/// way into a closed polyhedron.
impl<T: Topology, U: Topology> FromProperty<Polyhedron<U>> for Polyhedron<T> {
    fn from_property(source: &Polyhedron<U>, complexity: Complexity) -> Result<Self> {
        let (y, c) = (source.handle.as_ptr(), complexity.raw());
        // SAFETY: `y` is live for the call.
        NativeHandle::acquire(|out| unsafe {
            polyhedron_abi::new_from_polyhedron(out, T::RAW, y, c)
        })
        .map(Self::from_handle)
    }
}

impl<T: Topology> FromProperty<RationalBox> for Polyhedron<T> {
    fn from_property(source: &RationalBox, complexity: Complexity) -> Result<Self> {
        let (y, c) = (source.handle().as_ptr(), complexity.raw());
        // SAFETY: `y` is live for the call.
        NativeHandle::acquire(|out| unsafe {
            polyhedron_abi::new_from_rational_box(out, T::RAW, y, c)
        })
        .map(Self::from_handle)
    }
}

/// Set equality. A comparison the native side rejects, such as one across
/// space dimensions, reads as unequal; call `equals` to see the error.
impl<T: Topology> PartialEq for Polyhedron<T> {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other).unwrap_or(false)
    }
}

impl<T: Topology> fmt::Display for Polyhedron<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render().map_err(|_| fmt::Error)?)
    }
}

impl<T: Topology> fmt::Debug for Polyhedron<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(T::NAME).field(&self.handle).finish()
    }
}
