//! Core types for Souk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod status;

pub use id::*;
pub use price::{MAX_MONEY, MONEY_SCALE, Percentage, PercentageOutOfRange, round_money};
pub use status::*;
