//! Utility types and functions for the baker.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam and shading helpers
//! - [`logging`] - tracing subscriber setup

mod error;
mod math;
pub mod logging;

pub use error::*;
pub use math::*;
