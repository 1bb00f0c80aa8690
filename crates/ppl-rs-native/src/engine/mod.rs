//! Exact-rational reference engine behind the C ABI.
//!
//! Polyhedra are kept as constraint rows over `BigInt` and every query is
//! answered by Fourier–Motzkin projection; boxes are one rational interval per
//! dimension. Nothing here is visible above the ABI.

pub mod boxes;
pub mod budget;
pub mod error;
pub mod fm;
pub mod linear;
pub mod poly;
pub mod render;
pub mod shape;

pub use boxes::{BoxVal, Complexity};
pub use error::{EResult, EngineError};
pub use linear::{Cg, Con, DescSystem, Gen, GenKind, GridGen, GridGenKind, LinExpr, Rel};
pub use poly::{Poly, Topology};
pub use shape::Shape;
