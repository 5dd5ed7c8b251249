//! fxgate Common Types
//!
//! Shared types used across the fxgate workspace: currency codes and pairs,
//! amount parsing, request validation errors, trace identifiers and time
//! helpers.

pub mod identifiers;
pub mod monetary;
pub mod error;
pub mod time;

pub use identifiers::*;
pub use monetary::*;
pub use error::*;
pub use time::*;
