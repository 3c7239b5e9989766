//! netpulse store: the rendered-row registry and the status filter that drives row visibility.

#![forbid(unsafe_code)]

pub mod filter;
pub mod registry;

pub use filter::{FilterBanner, FilterEngine, SuppressionGate};
pub use registry::{Row, RowHandle, RowSeed, StatusRegistry};
