//! # Tessel Core
//!
//! Engine-independent building blocks for the Tessel editor.

pub mod undo;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
