//! Move-only owners of native objects.

use std::ffi::c_int;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use ppl_rs_native::PPL_ERROR_INTERNAL_ERROR;

use crate::error::{PplError, Result};
use crate::library;
use crate::metrics::{MembraneMetrics, global_metrics};

/// A kind of native object and the entry point that frees it.
pub trait ForeignKind {
    type Raw;
    const NAME: &'static str;
    const DELETE: unsafe extern "C" fn(*mut Self::Raw) -> c_int;
}

/// Owns one native object and releases it exactly once.
pub struct NativeHandle<K: ForeignKind> {
    ptr: NonNull<K::Raw>,
    _kind: PhantomData<K>,
}

// SAFETY: the native object is only touched through `library::call`, which
// serializes every access process-wide.
unsafe impl<K: ForeignKind> Send for NativeHandle<K> {}
// SAFETY: as above.
unsafe impl<K: ForeignKind> Sync for NativeHandle<K> {}

impl<K: ForeignKind> NativeHandle<K> {
    /// Run a foreign constructor writing through `out` and take ownership of
    /// the result. On failure nothing is owned.
    pub fn acquire(factory: impl FnOnce(*mut *mut K::Raw) -> c_int) -> Result<Self> {
        let mut raw: *mut K::Raw = ptr::null_mut();
        library::call(|| factory(&mut raw))?;
        let ptr = NonNull::new(raw).ok_or_else(|| PplError::Internal {
            code: PPL_ERROR_INTERNAL_ERROR,
            message: format!("{} factory succeeded without an object", K::NAME),
        })?;
        MembraneMetrics::inc(&global_metrics().handles_acquired);
        Ok(Self {
            ptr,
            _kind: PhantomData,
        })
    }

    /// Like [`acquire`](Self::acquire) for entry points that may legitimately
    /// produce no object.
    pub fn acquire_optional(
        factory: impl FnOnce(*mut *mut K::Raw) -> c_int,
    ) -> Result<Option<Self>> {
        let mut raw: *mut K::Raw = ptr::null_mut();
        library::call(|| factory(&mut raw))?;
        Ok(NonNull::new(raw).map(|ptr| {
            MembraneMetrics::inc(&global_metrics().handles_acquired);
            Self {
                ptr,
                _kind: PhantomData,
            }
        }))
    }

    #[must_use]
    pub fn as_ptr(&self) -> *const K::Raw {
        self.ptr.as_ptr()
    }

    #[must_use]
    pub fn as_mut_ptr(&mut self) -> *mut K::Raw {
        self.ptr.as_ptr()
    }

    /// Release now, surfacing the foreign status.
    pub fn release(self) -> Result<()> {
        let ptr = self.ptr;
        std::mem::forget(self);
        Self::free(ptr)
    }

    fn free(ptr: NonNull<K::Raw>) -> Result<()> {
        // SAFETY: `ptr` came from the matching constructor and ownership ends here.
        library::call(|| unsafe { (K::DELETE)(ptr.as_ptr()) })?;
        MembraneMetrics::inc(&global_metrics().handles_released);
        Ok(())
    }
}

impl<K: ForeignKind> Drop for NativeHandle<K> {
    fn drop(&mut self) {
        let _ = Self::free(self.ptr);
    }
}

impl<K: ForeignKind> fmt::Debug for NativeHandle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(K::NAME).field(&self.ptr).finish()
    }
}
