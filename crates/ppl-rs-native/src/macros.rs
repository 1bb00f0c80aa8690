//! Helper macros for entry point generation.

/// Generate a status-returning `unsafe extern "C" fn`.
///
/// The body evaluates to `Result<c_int, EngineError>`; `?` is available
/// inside it. Failures and panics are reported through the error handler and
/// turned into negative statuses by `status::guarded`.
///
/// ```ignore
/// native_fn! {
///     /// Exported under its own name.
///     export fn ppl_thing(x: *const T) {
///         Ok(0)
///     }
/// }
/// native_fn! {
///     /// Namespaced by the enclosing module; no exported symbol.
///     fn thing(x: *const T) {
///         Ok(0)
///     }
/// }
/// ```
///
/// `uninit` in front of either form lets the entry point run before
/// `ppl_initialize`.
macro_rules! native_fn {
    (@body $name:ident, $init:expr, $body:block) => {
        $crate::status::guarded(stringify!($name), $init, || {
            #[allow(unused_unsafe)]
            unsafe {
                $body
            }
        })
    };

    (
        $(#[$meta:meta])*
        export fn $name:ident( $($arg:ident : $argty:ty),* $(,)? )
        $body:block
    ) => {
        $(#[$meta])*
        #[cfg_attr(not(debug_assertions), unsafe(no_mangle))]
        pub unsafe extern "C" fn $name( $($arg : $argty),* ) -> ::std::ffi::c_int {
            $crate::macros::native_fn!(@body $name, true, $body)
        }
    };

    (
        $(#[$meta:meta])*
        uninit export fn $name:ident( $($arg:ident : $argty:ty),* $(,)? )
        $body:block
    ) => {
        $(#[$meta])*
        #[cfg_attr(not(debug_assertions), unsafe(no_mangle))]
        pub unsafe extern "C" fn $name( $($arg : $argty),* ) -> ::std::ffi::c_int {
            $crate::macros::native_fn!(@body $name, false, $body)
        }
    };

    (
        $(#[$meta:meta])*
        fn $name:ident( $($arg:ident : $argty:ty),* $(,)? )
        $body:block
    ) => {
        $(#[$meta])*
        pub unsafe extern "C" fn $name( $($arg : $argty),* ) -> ::std::ffi::c_int {
            $crate::macros::native_fn!(@body $name, true, $body)
        }
    };
}

pub(crate) use native_fn;
