//! Dataset loading.

pub mod loader;

pub use loader::*;
