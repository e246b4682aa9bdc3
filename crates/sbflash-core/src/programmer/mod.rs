//! Programmer traits and abstractions
//!
//! This module defines the trait a bus controller implements so that the
//! flash command layer can drive it.

mod traits;

pub use traits::*;
