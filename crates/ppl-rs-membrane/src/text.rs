//! Copying text out of native buffers.

use std::ffi::{CStr, c_char, c_int};
use std::ptr;

use ppl_rs_native::{PPL_ERROR_INTERNAL_ERROR, config_abi};

use crate::error::{PplError, Result};
use crate::library;
use crate::metrics::{MembraneMetrics, global_metrics};

/// Run a rendering call writing a native string through its out-parameter,
/// copy the text and hand the buffer back to the native allocator.
pub fn copy_native_string(render: impl FnOnce(*mut *mut c_char) -> c_int) -> Result<String> {
    library::with_lock(|| {
        let mut raw: *mut c_char = ptr::null_mut();
        library::call(|| render(&mut raw))?;
        if raw.is_null() {
            return Err(PplError::Internal {
                code: PPL_ERROR_INTERNAL_ERROR,
                message: "rendering succeeded without a string".into(),
            });
        }
        // SAFETY: a successful rendering call wrote a NUL-terminated buffer.
        let text = unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned();
        // SAFETY: the buffer came from the native allocator and is freed once.
        library::call(|| unsafe { config_abi::ppl_free_string(raw) })?;
        MembraneMetrics::inc(&global_metrics().strings_copied);
        Ok(text)
    })
}
