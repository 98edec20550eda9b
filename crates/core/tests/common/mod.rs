//! Shared helpers for the core integration tests.
//!
//! - [`fixtures`]: storage layouts, settings and in-memory bundles
//! - [`assertions`]: helpers for driving the scheduler and checking resumptions

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
