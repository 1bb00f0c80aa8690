//! Shared pointer plumbing for the entry points.

use std::ffi::{CString, c_char, c_int};

use num_bigint::BigInt;

use crate::engine::{EResult, EngineError, budget};
use crate::types::ppl_Coefficient_tag;

/// Borrow the object behind `ptr`.
///
/// # Safety
///
/// A non-null `ptr` must point to a live object created by this library.
pub(crate) unsafe fn get<'a, T>(ptr: *const T, what: &str) -> EResult<&'a T> {
    // SAFETY: the caller guarantees liveness of non-null pointers.
    unsafe { ptr.as_ref() }.ok_or_else(|| EngineError::invalid(format!("null {what}")))
}

/// # Safety
///
/// As for [`get`], and no other reference to the object may be live.
pub(crate) unsafe fn get_mut<'a, T>(ptr: *mut T, what: &str) -> EResult<&'a mut T> {
    // SAFETY: the caller guarantees exclusive access.
    unsafe { ptr.as_mut() }.ok_or_else(|| EngineError::invalid(format!("null {what}")))
}

/// Write a scalar result through `out`.
///
/// # Safety
///
/// A non-null `out` must be valid for writes.
pub(crate) unsafe fn put<T>(out: *mut T, value: T) -> EResult<c_int> {
    if out.is_null() {
        return Err(EngineError::invalid("null output pointer"));
    }
    // SAFETY: checked non-null; validity is the caller's contract.
    unsafe { out.write(value) };
    Ok(0)
}

/// Move `value` to the heap and hand ownership to the caller through `out`.
///
/// # Safety
///
/// A non-null `out` must be valid for writes.
pub(crate) unsafe fn give<T>(out: *mut *mut T, value: T) -> EResult<c_int> {
    if out.is_null() {
        return Err(EngineError::invalid("null output pointer"));
    }
    // SAFETY: checked non-null; validity is the caller's contract.
    unsafe { out.write(Box::into_raw(Box::new(value))) };
    Ok(0)
}

/// Reclaim an object previously handed out by [`give`]; null is a no-op.
///
/// # Safety
///
/// `ptr` must come from [`give`] with the same `T` and not be freed twice.
pub(crate) unsafe fn take_back<T>(ptr: *mut T) -> EResult<c_int> {
    if !ptr.is_null() {
        // SAFETY: ownership returns from the caller.
        drop(unsafe { Box::from_raw(ptr) });
    }
    Ok(0)
}

/// Hand a library-allocated C string to the caller; freed by `ppl_free_string`.
///
/// # Safety
///
/// A non-null `out` must be valid for writes.
pub(crate) unsafe fn give_string(out: *mut *mut c_char, text: String) -> EResult<c_int> {
    if out.is_null() {
        return Err(EngineError::invalid("null output pointer"));
    }
    let text = CString::new(text)
        .map_err(|_| EngineError::Internal("rendered text contains NUL".into()))?;
    // SAFETY: checked non-null.
    unsafe { out.write(text.into_raw()) };
    Ok(0)
}

/// Read a coefficient argument, enforcing the bounded-mode limit.
///
/// # Safety
///
/// As for [`get`].
pub(crate) unsafe fn coefficient<'a>(
    ptr: *const ppl_Coefficient_tag,
) -> EResult<&'a BigInt> {
    // SAFETY: forwarded contract.
    let c = unsafe { get(ptr, "coefficient") }?;
    budget::check_coefficient(&c.0)?;
    Ok(&c.0)
}

/// Copy `value` into the caller's coefficient.
///
/// # Safety
///
/// As for [`get_mut`].
pub(crate) unsafe fn store_coefficient(
    out: *mut ppl_Coefficient_tag,
    value: BigInt,
) -> EResult<c_int> {
    // SAFETY: forwarded contract.
    let c = unsafe { get_mut(out, "coefficient") }?;
    c.0 = value;
    Ok(0)
}

/// Variables named by a caller array of `n` indices.
///
/// # Safety
///
/// `ptr` must be valid for `n` reads unless `n` is zero.
pub(crate) unsafe fn index_slice<'a>(ptr: *const usize, n: usize) -> EResult<&'a [usize]> {
    if n == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(EngineError::invalid("null index array"));
    }
    // SAFETY: non-null with `n` readable elements per the caller.
    Ok(unsafe { std::slice::from_raw_parts(ptr, n) })
}
