//! Descriptor systems held by the native library.
//!
//! A [`DescriptorSystem`] is an ordered multiset of one descriptor kind. Its
//! space dimension is computed natively: inserting a descriptor raises it to
//! the descriptor's dimension and nothing but an explicit rebuild lowers it.
//! Iteration walks a pair of native cursors; the iterator borrows the system,
//! so the system cannot be mutated while a cursor is open.

use std::ffi::c_int;
use std::fmt;
use std::marker::PhantomData;

use ppl_rs_membrane::kinds::*;
use ppl_rs_membrane::{ForeignKind, NativeHandle, Result, library};
use ppl_rs_native::system_abi;

use crate::congruence::Congruence;
use crate::constraint::Constraint;
use crate::generator::Generator;
use crate::grid_generator::GridGenerator;
use crate::marshal::read_dimension;
use crate::sealed::Sealed;

type Raw<K> = <K as ForeignKind>::Raw;

/// Native entry points of one system kind.
#[doc(hidden)]
pub struct SystemOps<S, I, C> {
    new: unsafe extern "C" fn(*mut *mut S) -> c_int,
    new_from_item: unsafe extern "C" fn(*mut *mut S, *const I) -> c_int,
    copy: unsafe extern "C" fn(*mut *mut S, *const S) -> c_int,
    insert: unsafe extern "C" fn(*mut S, *const I) -> c_int,
    clear: unsafe extern "C" fn(*mut S) -> c_int,
    empty: unsafe extern "C" fn(*const S) -> c_int,
    space_dimension: unsafe extern "C" fn(*const S, *mut usize) -> c_int,
    begin: unsafe extern "C" fn(*const S, *mut *mut C) -> c_int,
    end: unsafe extern "C" fn(*const S, *mut *mut C) -> c_int,
    equal: unsafe extern "C" fn(*const C, *const C) -> c_int,
    dereference: unsafe extern "C" fn(*const C, *mut *const I) -> c_int,
    increment: unsafe extern "C" fn(*mut C) -> c_int,
}

macro_rules! system_ops {
    ($module:ident) => {
        SystemOps {
            new: system_abi::$module::new,
            new_from_item: system_abi::$module::new_from_item,
            copy: system_abi::$module::copy,
            insert: system_abi::$module::insert,
            clear: system_abi::$module::clear,
            empty: system_abi::$module::empty,
            space_dimension: system_abi::$module::space_dimension,
            begin: system_abi::$module::begin,
            end: system_abi::$module::end,
            equal: system_abi::$module::iterator_equal_test,
            dereference: system_abi::$module::iterator_dereference,
            increment: system_abi::$module::iterator_increment,
        }
    };
}

/// A descriptor kind that can live in a system.
pub trait SystemItem: Sized + Sealed {
    #[doc(hidden)]
    type ItemKind: ForeignKind;
    #[doc(hidden)]
    type SystemKind: ForeignKind;
    #[doc(hidden)]
    type CursorKind: ForeignKind;
    #[doc(hidden)]
    const OPS: SystemOps<Raw<Self::SystemKind>, Raw<Self::ItemKind>, Raw<Self::CursorKind>>;

    #[doc(hidden)]
    fn to_native(&self) -> Result<NativeHandle<Self::ItemKind>>;

    /// # Safety
    ///
    /// `raw` must point to a live native descriptor of this kind.
    #[doc(hidden)]
    unsafe fn from_native(raw: *const Raw<Self::ItemKind>) -> Result<Self>;
}

macro_rules! system_item {
    ($item:ty, $item_kind:ty, $system_kind:ty, $cursor_kind:ty, $module:ident) => {
        impl Sealed for $item {}

        impl SystemItem for $item {
            type ItemKind = $item_kind;
            type SystemKind = $system_kind;
            type CursorKind = $cursor_kind;
            const OPS: SystemOps<Raw<$system_kind>, Raw<$item_kind>, Raw<$cursor_kind>> =
                system_ops!($module);

            fn to_native(&self) -> Result<NativeHandle<$item_kind>> {
                <$item>::to_native(self)
            }

            unsafe fn from_native(raw: *const Raw<$item_kind>) -> Result<Self> {
                // SAFETY: forwarded caller contract.
                unsafe { <$item>::from_native(raw) }
            }
        }
    };
}

system_item!(
    Constraint,
    ConstraintKind,
    ConstraintSystemKind,
    ConstraintCursorKind,
    constraint_system
);
system_item!(
    Congruence,
    CongruenceKind,
    CongruenceSystemKind,
    CongruenceCursorKind,
    congruence_system
);
system_item!(
    Generator,
    GeneratorKind,
    GeneratorSystemKind,
    GeneratorCursorKind,
    generator_system
);
system_item!(
    GridGenerator,
    GridGeneratorKind,
    GridGeneratorSystemKind,
    GridGeneratorCursorKind,
    grid_generator_system
);

pub struct DescriptorSystem<D: SystemItem> {
    handle: NativeHandle<D::SystemKind>,
    _item: PhantomData<fn() -> D>,
}

pub type ConstraintSystem = DescriptorSystem<Constraint>;
pub type CongruenceSystem = DescriptorSystem<Congruence>;
pub type GeneratorSystem = DescriptorSystem<Generator>;
pub type GridGeneratorSystem = DescriptorSystem<GridGenerator>;

impl<D: SystemItem> DescriptorSystem<D> {
    /// The empty system of dimension 0.
    pub fn empty() -> Result<Self> {
        let new = D::OPS.new;
        // SAFETY: the factory writes through the provided out-pointer.
        NativeHandle::acquire(|out| unsafe { new(out) }).map(Self::from_handle)
    }

    pub fn singleton(d: &D) -> Result<Self> {
        let item = d.to_native()?;
        let (new_from_item, item) = (D::OPS.new_from_item, item.as_ptr());
        // SAFETY: `item` is live for the call.
        NativeHandle::acquire(|out| unsafe { new_from_item(out, item) }).map(Self::from_handle)
    }

    pub fn from_descriptors<'a>(descriptors: impl IntoIterator<Item = &'a D>) -> Result<Self>
    where
        D: 'a,
    {
        let mut system = Self::empty()?;
        for d in descriptors {
            system.add(d)?;
        }
        Ok(system)
    }

    pub(crate) fn from_handle(handle: NativeHandle<D::SystemKind>) -> Self {
        Self {
            handle,
            _item: PhantomData,
        }
    }

    pub(crate) fn as_ptr(&self) -> *const Raw<D::SystemKind> {
        self.handle.as_ptr()
    }

    /// Insert a copy of `d`, raising the dimension to at least `d`'s.
    pub fn add(&mut self, d: &D) -> Result<&mut Self> {
        let item = d.to_native()?;
        let (insert, system, item) = (D::OPS.insert, self.handle.as_mut_ptr(), item.as_ptr());
        // SAFETY: both objects are live for the call.
        library::call(|| unsafe { insert(system, item) })?;
        Ok(self)
    }

    /// Remove every descriptor; the dimension is kept.
    pub fn clear(&mut self) -> Result<&mut Self> {
        let (clear, system) = (D::OPS.clear, self.handle.as_mut_ptr());
        // SAFETY: `system` is live for the call.
        library::call(|| unsafe { clear(system) })?;
        Ok(self)
    }

    pub fn is_empty(&self) -> Result<bool> {
        let (empty, system) = (D::OPS.empty, self.as_ptr());
        // SAFETY: `system` is live for the call.
        library::call_predicate(|| unsafe { empty(system) })
    }

    pub fn space_dimension(&self) -> Result<usize> {
        let (space_dimension, system) = (D::OPS.space_dimension, self.as_ptr());
        // SAFETY: `system` is live for the call.
        read_dimension(|out| unsafe { space_dimension(system, out) })
    }

    pub fn try_clone(&self) -> Result<Self> {
        let (copy, system) = (D::OPS.copy, self.as_ptr());
        // SAFETY: `system` is live for the call.
        NativeHandle::acquire(|out| unsafe { copy(out, system) }).map(Self::from_handle)
    }

    /// Open a cursor pair over the system.
    pub fn iter(&self) -> Result<Iter<'_, D>> {
        let (begin, end, system) = (D::OPS.begin, D::OPS.end, self.as_ptr());
        // SAFETY: `system` is live, and outlives the cursors through the borrow.
        let cursor = NativeHandle::acquire(|out| unsafe { begin(system, out) })?;
        let end = NativeHandle::acquire(|out| unsafe { end(system, out) })?;
        Ok(Iter {
            cursor,
            end,
            _system: PhantomData,
        })
    }

    /// Number of descriptors, counted by walking the system.
    pub fn len(&self) -> Result<usize> {
        let mut n = 0;
        for d in self.iter()? {
            d?;
            n += 1;
        }
        Ok(n)
    }

    pub fn to_vec(&self) -> Result<Vec<D>> {
        self.iter()?.collect()
    }
}

/// Yields copies of the descriptors in insertion order.
pub struct Iter<'a, D: SystemItem> {
    cursor: NativeHandle<D::CursorKind>,
    end: NativeHandle<D::CursorKind>,
    _system: PhantomData<&'a DescriptorSystem<D>>,
}

impl<D: SystemItem> Iter<'_, D> {
    fn has_next(&self) -> Result<bool> {
        let (equal, cursor, end) = (D::OPS.equal, self.cursor.as_ptr(), self.end.as_ptr());
        // SAFETY: both cursors are live for the call.
        library::call_predicate(|| unsafe { equal(cursor, end) }).map(|at_end| !at_end)
    }

    fn advance(&mut self) -> Result<D> {
        let (dereference, increment) = (D::OPS.dereference, D::OPS.increment);
        let cursor = self.cursor.as_mut_ptr();
        let mut item: *const Raw<D::ItemKind> = std::ptr::null();
        library::with_lock(|| {
            // SAFETY: the cursor is live and the system borrowed, so `item`
            // stays valid until the system is next mutated.
            library::call(|| unsafe { dereference(cursor, &mut item) })?;
            let d = unsafe { D::from_native(item) }?;
            library::call(|| unsafe { increment(cursor) })?;
            Ok(d)
        })
    }
}

impl<D: SystemItem> Iterator for Iter<'_, D> {
    type Item = Result<D>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(true) => Some(self.advance()),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl<D: SystemItem + fmt::Display> fmt::Display for DescriptorSystem<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items = self.to_vec().map_err(|_| fmt::Error)?;
        if items.is_empty() {
            return f.write_str("true");
        }
        for (i, d) in items.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl<D: SystemItem> fmt::Debug for DescriptorSystem<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DescriptorSystem").field(&self.handle).finish()
    }
}
