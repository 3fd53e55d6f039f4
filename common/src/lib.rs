//! RateBank Common Types
//!
//! Shared types used across the RateBank rate engine: currency and monetary
//! primitives plus the UTC calendar-date helpers every tier agrees on.

pub mod currency;
pub mod money;
pub mod time;

pub use currency::*;
pub use money::*;
pub use time::*;
