// Every entry point takes raw pointers from foreign callers and validates them
// at runtime; per-function safety docs would repeat the same contract.
#![allow(clippy::missing_safety_doc)]
#![allow(non_camel_case_types, non_snake_case)]
//! # ppl-rs-native
//!
//! C-ABI numerical library of convex polyhedra and rational boxes.
//!
//! Callers see opaque pointers, integer statuses and an error-handler
//! callback. The exact-rational engine behind them lives in [`engine`] and is
//! not part of the interface.
//!
//! # Conventions
//!
//! ```text
//! status >= 0   success (predicates return 0 or 1)
//! status <  0   one of the PPL_ERROR_* codes, after the error handler ran
//! ```
//!
//! Allocation entry points write through a `*mut *mut T` out-parameter.
//! Object families (`polyhedron_abi`, `rational_box_abi`) and descriptor
//! systems (`system_abi::*`) are namespaced by module; everything else is
//! exported under its `ppl_*` name. Calls must not overlap: a second call
//! entering while one is in flight fails with `PPL_ERROR_LOGIC_ERROR`.

mod macros;

pub mod engine;
pub mod status;
pub mod types;
mod util;

mod shape_abi;

pub mod config_abi;
pub mod descriptor_abi;
pub mod mpz_abi;
pub mod polyhedron_abi;
pub mod rational_box_abi;
pub mod system_abi;

pub use mpz_abi::mpz_struct;
pub use status::*;
pub use types::*;
