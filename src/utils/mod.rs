//! Utility helpers: generational arena, logging and math extensions.

pub mod allocator;
pub mod logging;
pub mod math;

pub use allocator::{Arena, ForceId};
pub use math::*;
