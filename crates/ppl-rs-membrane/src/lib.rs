//! Boundary membrane between safe Rust and the native polyhedra library.
//!
//! Every foreign call made by `ppl-rs-core` goes through this crate:
//! - **Serialization** (`library`): one process-wide reentrant lock around
//!   every call, lazy library initialization, runtime budgets
//! - **Error channel** (`error_channel`): the handler slot filled by the
//!   native side and its translation into [`PplError`]
//! - **Handles** (`handle`, `kinds`): move-only owners of native objects,
//!   released exactly once
//! - **Integer records** (`mpz`) and **coefficients** (`coefficient`)
//! - **Strings** (`text`): copying out of caller-freed native buffers
//! - **Configuration** (`config`) and **metrics** (`metrics`)

pub mod coefficient;
pub mod config;
pub mod error;
pub mod error_channel;
pub mod handle;
pub mod kinds;
pub mod library;
pub mod metrics;
pub mod mpz;
pub mod text;

pub use config::{Config, ProtocolPolicy};
pub use error::{PplError, Result};
pub use handle::{ForeignKind, NativeHandle};
pub use metrics::MembraneMetrics;
