//! Physical assets: the storage system and the furnace load it shaves.

/// Battery technology templates, sizing, and capital cost.
pub mod bess;
/// Electric arc furnace parameters and synthetic heat profile.
pub mod eaf;

pub use bess::{BessParams, Technology};
pub use eaf::{CycleProfile, EafParams, PowerSplit, split_power};
