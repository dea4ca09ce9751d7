//! Vessel snapshot save/load
//!
//! A snapshot holds what a vessel needs to come back in the same condition:
//! body position and velocity, each room's water and air, and a sparse list
//! of damaged wall segments. Breach connectors are not stored as entities;
//! restoring the damage recreates them.

mod error;

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use error::PersistenceError;

use crate::sim::{ConnectorId, VesselId, World};

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselSnapshot {
    pub version: u32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub rooms: Vec<RoomSnapshot>,
    /// Only structures with at least one damaged segment
    pub structures: Vec<StructureSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    /// Position in the vessel's room list
    pub index: usize,
    pub volume: f32,
    pub oxygen: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureSnapshot {
    /// Position in the vessel's structure list
    pub index: usize,
    pub segments: Vec<SegmentSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSnapshot {
    pub index: usize,
    pub damage: f32,
    /// Breach connector at save time (informational, ids are not stable)
    pub breach: Option<ConnectorId>,
}

impl VesselSnapshot {
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(PersistenceError::VersionMismatch {
                expected_max: SNAPSHOT_VERSION,
                found: snapshot.version,
            });
        }
        Ok(snapshot)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved vessel snapshot to {}", path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let snapshot = Self::from_json(&std::fs::read_to_string(path)?)?;
        log::info!(
            "Loaded vessel snapshot from {} ({} rooms, {} damaged structures)",
            path.display(),
            snapshot.rooms.len(),
            snapshot.structures.len()
        );
        Ok(snapshot)
    }
}

impl World {
    /// Capture a vessel's persistent state
    pub fn snapshot_vessel(&self, vessel: VesselId) -> Option<VesselSnapshot> {
        let body = self.vessel(vessel)?;

        let rooms = body
            .rooms
            .iter()
            .enumerate()
            .filter_map(|(index, id)| {
                let room = self.room(*id)?;
                Some(RoomSnapshot {
                    index,
                    volume: room.volume(),
                    oxygen: room.oxygen(),
                })
            })
            .collect();

        let structures = body
            .structures
            .iter()
            .enumerate()
            .filter_map(|(index, id)| {
                let structure = self.structure(*id)?;
                let segments: Vec<SegmentSnapshot> = structure
                    .segments
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.damage > 0.0)
                    .map(|(i, s)| SegmentSnapshot {
                        index: i,
                        damage: s.damage,
                        breach: s.breach,
                    })
                    .collect();
                (!segments.is_empty()).then_some(StructureSnapshot { index, segments })
            })
            .collect();

        Some(VesselSnapshot {
            version: SNAPSHOT_VERSION,
            position: body.position,
            velocity: body.velocity,
            rooms,
            structures,
        })
    }

    /// Bring a vessel back to a captured state. The snapshot is checked
    /// against the vessel's layout before anything is changed.
    pub fn restore_vessel(&mut self, vessel: VesselId, snapshot: &VesselSnapshot) -> Result<(), PersistenceError> {
        let body = self.vessel(vessel).ok_or(PersistenceError::MissingVessel)?;
        let room_ids = body.rooms.clone();
        let structure_ids = body.structures.clone();

        for room in &snapshot.rooms {
            if room.index >= room_ids.len() {
                return Err(PersistenceError::Mismatch {
                    kind: "room",
                    index: room.index,
                    available: room_ids.len(),
                });
            }
        }
        for entry in &snapshot.structures {
            let count = structure_ids
                .get(entry.index)
                .and_then(|id| self.structure(*id))
                .map(|s| s.segment_count())
                .ok_or(PersistenceError::Mismatch {
                    kind: "structure",
                    index: entry.index,
                    available: structure_ids.len(),
                })?;
            if let Some(segment) = entry.segments.iter().find(|s| s.index >= count) {
                return Err(PersistenceError::Mismatch {
                    kind: "segment",
                    index: segment.index,
                    available: count,
                });
            }
        }

        if let Some(body) = self.vessel_mut(vessel) {
            body.position = snapshot.position;
            body.velocity = snapshot.velocity;
            body.reset_depth_damage_timer();
        }

        for entry in &snapshot.rooms {
            if let Some(room) = self.room_mut(room_ids[entry.index]) {
                room.set_volume(entry.volume);
                room.set_oxygen(entry.oxygen);
            }
        }

        for (index, id) in structure_ids.iter().enumerate() {
            let Some(structure) = self.structure(*id) else {
                continue;
            };
            if !structure.is_damageable() {
                continue;
            }
            let saved = snapshot.structures.iter().find(|s| s.index == index);
            let targets: Vec<(usize, f32)> = (0..structure.segment_count())
                .map(|i| {
                    let damage = saved
                        .and_then(|s| s.segments.iter().find(|seg| seg.index == i))
                        .map(|seg| seg.damage)
                        .unwrap_or(0.0);
                    (i, damage)
                })
                .filter(|(i, damage)| structure.segment_damage(*i) != *damage)
                .collect();
            for (segment, damage) in targets {
                self.set_structure_damage(*id, segment, damage);
            }
        }

        log::debug!(
            "Restored vessel {vessel:?}: {} rooms, {} damaged structures",
            snapshot.rooms.len(),
            snapshot.structures.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tuning;
    use crate::sim::{Rect, RoomId, Structure, StructureId};

    fn build(world: &mut World) -> (VesselId, [RoomId; 2], Vec<StructureId>) {
        let v = world.add_vessel(Vec2::new(100.0, -200.0)).unwrap();
        let a = world.add_room(v, Rect::new(16.0, 96.0, 192.0, 96.0)).unwrap();
        let b = world.add_room(v, Rect::new(208.0, 96.0, 192.0, 96.0)).unwrap();
        let walls = [
            Rect::new(0.0, 0.0, 416.0, 16.0),
            Rect::new(0.0, 96.0, 16.0, 96.0),
            Rect::new(400.0, 96.0, 16.0, 96.0),
        ]
        .into_iter()
        .map(|rect| world.add_structure(Structure::new(rect, 100.0, v)).unwrap())
        .collect();
        (v, [a, b], walls)
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut world = World::new(1, Tuning::default());
        let (v, rooms, walls) = build(&mut world);
        world.room_mut(rooms[0]).unwrap().set_volume(4321.0);
        world.room_mut(rooms[1]).unwrap().set_oxygen(1234.0);
        world.apply_structure_damage(walls[0], 3, 30.0);
        world.apply_structure_damage(walls[1], 0, 75.0);

        let snapshot = world.snapshot_vessel(v).unwrap();
        assert_eq!(snapshot.structures.len(), 2);
        assert!(snapshot.structures[1].segments[0].breach.is_some());
        let json = snapshot.to_json().unwrap();

        let mut fresh = World::new(1, Tuning::default());
        let (v2, rooms2, walls2) = build(&mut fresh);
        fresh
            .restore_vessel(v2, &VesselSnapshot::from_json(&json).unwrap())
            .unwrap();

        assert_eq!(fresh.room(rooms2[0]).unwrap().volume(), 4321.0);
        assert_eq!(fresh.room(rooms2[1]).unwrap().oxygen(), 1234.0);
        assert_eq!(fresh.structure(walls2[0]).unwrap().segment_damage(3), 30.0);
        let west = fresh.structure(walls2[1]).unwrap();
        assert!(west.is_leaking(0));
        let breach = west.segments[0].breach.unwrap();
        assert!((fresh.connector(breach).unwrap().openness() - 0.5).abs() < 1e-5);
        assert_eq!(fresh.vessel(v2).unwrap().position, Vec2::new(100.0, -200.0));
        assert_eq!(fresh.snapshot_vessel(v2).unwrap().structures.len(), 2);
    }

    #[test]
    fn test_restore_heals_unlisted_segments() {
        let mut world = World::new(2, Tuning::default());
        let (v, _, walls) = build(&mut world);
        let clean = world.snapshot_vessel(v).unwrap();
        assert!(clean.structures.is_empty());

        world.apply_structure_damage(walls[2], 0, 100.0);
        assert_eq!(world.connectors.len(), 1);
        world.restore_vessel(v, &clean).unwrap();
        assert_eq!(world.structure(walls[2]).unwrap().segment_damage(0), 0.0);
        assert_eq!(world.connectors.len(), 0);
    }

    #[test]
    fn test_restore_rejects_foreign_layout() {
        let mut world = World::new(3, Tuning::default());
        let (v, rooms, _) = build(&mut world);
        let mut snapshot = world.snapshot_vessel(v).unwrap();
        snapshot.rooms.push(RoomSnapshot {
            index: 9,
            volume: 100.0,
            oxygen: 0.0,
        });
        snapshot.rooms[0].volume = 500.0;

        let err = world.restore_vessel(v, &snapshot).unwrap_err();
        assert!(matches!(err, PersistenceError::Mismatch { kind: "room", index: 9, .. }));
        // Nothing applied
        assert_eq!(world.room(rooms[0]).unwrap().volume(), 0.0);
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let mut world = World::new(4, Tuning::default());
        let (v, _, _) = build(&mut world);
        let mut snapshot = world.snapshot_vessel(v).unwrap();
        snapshot.version = SNAPSHOT_VERSION + 1;
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(matches!(
            VesselSnapshot::from_json(&json),
            Err(PersistenceError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let mut world = World::new(5, Tuning::default());
        let (v, rooms, _) = build(&mut world);
        world.room_mut(rooms[1]).unwrap().set_volume(999.0);
        let snapshot = world.snapshot_vessel(v).unwrap();

        let path = std::env::temp_dir().join(format!("bulkhead-snapshot-{}.json", std::process::id()));
        snapshot.save(&path).unwrap();
        let loaded = VesselSnapshot::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, snapshot);

        assert!(matches!(
            VesselSnapshot::load(std::env::temp_dir().join("bulkhead-missing.json")),
            Err(PersistenceError::Io(_))
        ));
    }
}
