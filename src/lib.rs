//! Bulkhead - flooding and structural integrity for compartmentalized vessels
//!
//! Core modules:
//! - `sim`: Deterministic simulation (rooms, connectors, walls, vessel bodies)
//! - `tuning`: Data-driven simulation constants
//! - `persistence`: Snapshot save/load
//! - `replication`: Ranged quantization for the network layer

pub mod persistence;
pub mod replication;
pub mod sim;
pub mod tuning;

pub use tuning::Tuning;

use glam::Vec2;

/// Simulation constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// How much water a room can hold beyond its own volume
    pub const MAX_COMPRESS: f32 = 10000.0;
    /// Horizontal distance between wave samples
    pub const WAVE_WIDTH: f32 = 32.0;

    /// Length of one wall segment along the wall's long axis
    pub const SECTION_SIZE: i32 = 96;
    /// Fraction of max health at which a segment starts leaking
    pub const LEAK_THRESHOLD: f32 = 0.5;
    /// Breach connectors extend this far past their segment on every side
    pub const BREACH_MARGIN: f32 = 10.0;

    /// Vessels below this world y take depth damage
    pub const DAMAGE_DEPTH: f32 = -30000.0;
    /// Seconds between depth damage events at the damage threshold
    pub const DEPTH_DAMAGE_INTERVAL: f32 = 10.0;

    /// Room grid cell size
    pub const GRID_CELL_SIZE: f32 = 200.0;
    /// Padding around vessel borders when resolving world-space room lookups
    pub const ROOM_LOOKUP_PADDING: f32 = 128.0;

    /// Arena capacities (entities per kind)
    pub const MAX_ROOMS: usize = 4096;
    pub const MAX_CONNECTORS: usize = 16384;
    pub const MAX_STRUCTURES: usize = 16384;
    pub const MAX_VESSELS: usize = 64;
}

/// Rejects NaN and infinities
#[inline]
pub fn is_valid(value: f32) -> bool {
    value.is_finite()
}

/// Rejects vectors with NaN or infinite components
#[inline]
pub fn is_valid_vec(value: Vec2) -> bool {
    value.is_finite()
}

/// Linear interpolation with `t` clamped to [0, 1]
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Vector linear interpolation with `t` clamped to [0, 1]
#[inline]
pub fn lerp_vec(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    a + (b - a) * t.clamp(0.0, 1.0)
}
