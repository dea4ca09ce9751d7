//! Entity handles and the capabilities shared between entity kinds

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::Handle;
use super::geometry::Rect;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub Handle);

        impl From<Handle> for $name {
            fn from(handle: Handle) -> Self {
                Self(handle)
            }
        }
    };
}

entity_id!(
    /// Handle to a room in the world's room arena
    RoomId
);
entity_id!(
    /// Handle to a connector (door, hatch, duct or breach)
    ConnectorId
);
entity_id!(
    /// Handle to a wall or platform
    StructureId
);
entity_id!(
    /// Handle to a vessel body
    VesselId
);

/// Tagged reference to any placed entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Room(RoomId),
    Connector(ConnectorId),
    Structure(StructureId),
    Vessel(VesselId),
}

/// Something with a vessel-local placement
pub trait Positioned {
    fn rect(&self) -> Rect;

    fn position(&self) -> Vec2 {
        self.rect().center()
    }
}

/// Something that keeps a list of entities it is connected to
pub trait Linkable {
    fn linked(&self) -> Vec<EntityKind>;
}

/// Something AI perception can notice
pub trait Detectable {
    fn ai_target(&self) -> &AiTarget;
    fn ai_target_mut(&mut self) -> &mut AiTarget;
}

/// Perception ranges advertised to AI
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AiTarget {
    pub sound_range: f32,
    pub sight_range: f32,
    pub min_sound_range: f32,
}

impl AiTarget {
    /// Raise the sound range (a noise was made); never lowers it
    pub fn make_noise(&mut self, range: f32) {
        if crate::is_valid(range) {
            self.sound_range = self.sound_range.max(range);
        }
    }

    pub fn decay(&mut self, rate: f32, dt: f32) {
        self.sound_range = (self.sound_range - rate * dt).max(self.min_sound_range);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_target_default_is_silent() {
        let target = AiTarget::default();
        assert_eq!(target.sound_range, 0.0);
        assert_eq!(target.sight_range, 0.0);
        assert_eq!(target.min_sound_range, 0.0);
    }

    #[test]
    fn test_ai_target_decay_stops_at_minimum() {
        let mut target = AiTarget {
            min_sound_range: 50.0,
            ..Default::default()
        };
        target.make_noise(1200.0);
        target.decay(1000.0, 1.0);
        assert_eq!(target.sound_range, 200.0);
        target.decay(1000.0, 1.0);
        assert_eq!(target.sound_range, 50.0);
        target.make_noise(f32::NAN);
        assert_eq!(target.sound_range, 50.0);
    }
}
