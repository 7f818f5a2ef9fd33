//! Data models

pub mod lag;
pub mod prediction;

pub use lag::*;
pub use prediction::*;
