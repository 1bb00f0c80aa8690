//! Named widening and narrowing operators.
//!
//! Each domain registers its operators under the names the native library
//! documents them by; [`Domain::widening`](crate::Domain::widening) and
//! [`Domain::narrowing`](crate::Domain::narrowing) look them up.

use std::ffi::c_uint;
use std::fmt;
use std::ptr;

use ppl_rs_membrane::Result;

/// A budget of precision-losing steps a widening may refuse.
///
/// While tokens remain, a widening that would lose precision spends one and
/// leaves the receiver unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WideningToken {
    remaining: c_uint,
}

impl WideningToken {
    #[must_use]
    pub const fn new(tokens: u32) -> Self {
        Self { remaining: tokens }
    }

    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    pub(crate) fn as_mut_ptr(tokens: Option<&mut Self>) -> *mut c_uint {
        tokens.map_or(ptr::null_mut(), |t| &mut t.remaining)
    }
}

type WidenFn<T> = fn(&mut T, &T, Option<&mut WideningToken>) -> Result<()>;
type NarrowFn<T> = fn(&mut T, &T) -> Result<()>;

/// `x.widen(y)` requires `y ⊆ x` and yields `x' ⊇ x`; every ascending chain
/// widened this way stabilizes.
pub struct Widening<T> {
    name: &'static str,
    apply: WidenFn<T>,
}

impl<T> Widening<T> {
    pub(crate) const fn new(name: &'static str, apply: WidenFn<T>) -> Self {
        Self { name, apply }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, x: &mut T, y: &T, tokens: Option<&mut WideningToken>) -> Result<()> {
        (self.apply)(x, y, tokens)
    }
}

impl<T> Clone for Widening<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Widening<T> {}

impl<T> fmt::Debug for Widening<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Widening").field(&self.name).finish()
    }
}

/// `x.narrow(y)` requires `x ⊇ y` and yields `y ⊆ x' ⊆ x`.
pub struct Narrowing<T> {
    name: &'static str,
    apply: NarrowFn<T>,
}

impl<T> Narrowing<T> {
    pub(crate) const fn new(name: &'static str, apply: NarrowFn<T>) -> Self {
        Self { name, apply }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, x: &mut T, y: &T) -> Result<()> {
        (self.apply)(x, y)
    }
}

impl<T> Clone for Narrowing<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Narrowing<T> {}

impl<T> fmt::Debug for Narrowing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Narrowing").field(&self.name).finish()
    }
}
