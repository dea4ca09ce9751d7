//! Deterministic simulation module
//!
//! All flooding and structural logic lives here. This module must be pure and
//! deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (arena slot order)
//! - No rendering or platform dependencies

pub mod arena;
pub mod collision;
pub mod connector;
pub mod entity;
pub mod geometry;
pub mod grid;
pub mod room;
pub mod state;
pub mod structure;
pub mod tick;
pub mod vessel;

pub use arena::{Arena, Handle};
pub use collision::{Contact, ContactBody, ImpactResponse, LimbContact};
pub use connector::{Connector, FlowPlan, RoomView};
pub use entity::{
    AiTarget, ConnectorId, Detectable, EntityKind, Linkable, Positioned, RoomId, StructureId,
    VesselId,
};
pub use geometry::{Orientation, Rect};
pub use grid::SpatialGrid;
pub use room::Room;
pub use state::{RayHit, SimEvent, World};
pub use structure::{DamageOutcome, Fixture, FixtureKind, Segment, SegmentState, Structure};
pub use tick::{TickInput, advance, tick};
pub use vessel::VesselBody;
