//! Boxes of rational intervals, one per dimension.

use std::ffi::c_int;
use std::fmt;

use ppl_rs_membrane::kinds::RationalBoxKind;
use ppl_rs_membrane::{NativeHandle, Result};
use ppl_rs_native::rational_box_abi;
use ppl_rs_native::types::ppl_Rational_Box_tag;

use crate::family::{FamilyOps, family_ops};
use crate::polyhedron::{Polyhedron, Topology};
use crate::property::{
    Complexity, Degenerate, FromProperty, IntoSpaceDimension, Narrowable, Property, Widenable,
    limited_extrapolation,
};
use crate::sealed::Sealed;
use crate::system::{CongruenceSystem, ConstraintSystem, GeneratorSystem};
use crate::widening::{Narrowing, Widening, WideningToken};

/// Only interval constraints `a*x rel b` are represented exactly:
/// `add_constraint` rejects any other with `InvalidArgument`, while
/// `refine_with_constraint` tightens bounds by propagation.
pub struct RationalBox {
    handle: NativeHandle<RationalBoxKind>,
}

impl Sealed for RationalBox {}

impl Property for RationalBox {
    type Kind = RationalBoxKind;
    const OPS: FamilyOps<ppl_Rational_Box_tag> = family_ops!(rational_box_abi);

    fn handle(&self) -> &NativeHandle<RationalBoxKind> {
        &self.handle
    }

    fn handle_mut(&mut self) -> &mut NativeHandle<RationalBoxKind> {
        &mut self.handle
    }

    fn from_handle(handle: NativeHandle<RationalBoxKind>) -> Self {
        Self { handle }
    }

    fn from_space_dimension(dim: impl IntoSpaceDimension, kind: Degenerate) -> Result<Self> {
        let d = dim.into_space_dimension()?;
        let empty = c_int::from(kind == Degenerate::Empty);
        // SAFETY: the factory writes through the provided out-pointer.
        NativeHandle::acquire(|out| unsafe { rational_box_abi::new_from_space_dimension(out, d, empty) })
            .map(Self::from_handle)
    }

    /// Constraints that are not interval constraints are ignored.
    fn from_constraints(cs: &ConstraintSystem) -> Result<Self> {
        let cs = cs.as_ptr();
        // SAFETY: `cs` is live for the call.
        NativeHandle::acquire(|out| unsafe { rational_box_abi::new_from_constraints(out, cs) })
            .map(Self::from_handle)
    }

    fn from_congruences(cgs: &CongruenceSystem) -> Result<Self> {
        let cgs = cgs.as_ptr();
        // SAFETY: `cgs` is live for the call.
        NativeHandle::acquire(|out| unsafe { rational_box_abi::new_from_congruences(out, cgs) })
            .map(Self::from_handle)
    }

    /// The bounding box of the generated set.
    fn from_generators(gs: &GeneratorSystem) -> Result<Self> {
        let gs = gs.as_ptr();
        // SAFETY: `gs` is live for the call.
        NativeHandle::acquire(|out| unsafe { rational_box_abi::new_from_generators(out, gs) })
            .map(Self::from_handle)
    }
}

impl RationalBox {
    fn cc76_widening(&mut self, y: &Self, tokens: Option<&mut WideningToken>) -> Result<()> {
        self.widening_assign(y, tokens).map(drop)
    }

    fn cc76_narrowing(&mut self, y: &Self) -> Result<()> {
        self.narrowing_assign(y).map(drop)
    }

    /// CC76 widening that keeps every interval constraint of `cs` holding on
    /// the receiver.
    pub fn limited_cc76_extrapolation_assign(
        &mut self,
        y: &Self,
        cs: &ConstraintSystem,
        tokens: Option<&mut WideningToken>,
    ) -> Result<&mut Self> {
        limited_extrapolation(self, y, cs, tokens)
    }
}

impl Widenable for RationalBox {
    /// Unstable bounds jump to the next of the stop points -2, -1, 0, 1, 2,
    /// or are dropped past them.
    const WIDENINGS: &'static [Widening<Self>] = &[Widening::new("CC76", Self::cc76_widening)];
}

impl Narrowable for RationalBox {
    const NARROWINGS: &'static [Narrowing<Self>] =
        &[Narrowing::new("CC76", Self::cc76_narrowing)];
}

impl FromProperty<RationalBox> for RationalBox {
    fn from_property(source: &RationalBox, complexity: Complexity) -> Result<Self> {
        let (y, c) = (source.handle.as_ptr(), complexity.raw());
        // SAFETY: `y` is live for the call.
        NativeHandle::acquire(|out| unsafe { rational_box_abi::new_from_rational_box(out, y, c) })
            .map(Self::from_handle)
    }
}

/// `Polynomial` reads the bounds off the constraints as stored; the other
/// classes compute the tightest enclosing box.
impl<T: Topology> FromProperty<Polyhedron<T>> for RationalBox {
    fn from_property(source: &Polyhedron<T>, complexity: Complexity) -> Result<Self> {
        let (y, c) = (source.handle().as_ptr(), complexity.raw());
        // SAFETY: `y` is live for the call.
        NativeHandle::acquire(|out| unsafe { rational_box_abi::new_from_polyhedron(out, y, c) })
            .map(Self::from_handle)
    }
}

/// Set equality. A rejected comparison reads as unequal; `equals` reports it.
impl PartialEq for RationalBox {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other).unwrap_or(false)
    }
}

impl fmt::Display for RationalBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render().map_err(|_| fmt::Error)?)
    }
}

impl fmt::Debug for RationalBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rational_Box").field(&self.handle).finish()
    }
}
