//! Ranged quantization for network replication
//!
//! The network layer sends room water levels and wall damage as small fixed
//! point values. Values are clamped into a known range and mapped onto
//! `bits` bits; 8 bits is the usual width.

use serde::{Deserialize, Serialize};

use crate::sim::{RoomId, StructureId, World};

/// Default width of a quantized value
pub const DEFAULT_BITS: u32 = 8;

/// Range of a replicated room volume (fraction of the room's own volume)
pub const ROOM_VOLUME_RANGE: (f32, f32) = (0.0, 1.5);

/// Largest code representable in `bits` bits (capped at 32)
fn max_code(bits: u32) -> u32 {
    match bits.min(32) {
        0 => 0,
        32 => u32::MAX,
        b => (1u32 << b) - 1,
    }
}

/// Map `value` from `[min, max]` onto `0..=2^bits - 1`. Out-of-range and
/// invalid values clamp; an empty range encodes as 0.
pub fn quantize_ranged(value: f32, min: f32, max: f32, bits: u32) -> u32 {
    let steps = max_code(bits);
    if max <= min || steps == 0 {
        return 0;
    }
    let t = if value.is_nan() { 0.0 } else { ((value - min) / (max - min)).clamp(0.0, 1.0) };
    (t as f64 * steps as f64).round() as u32
}

/// Inverse of [`quantize_ranged`]
pub fn dequantize_ranged(code: u32, min: f32, max: f32, bits: u32) -> f32 {
    let steps = max_code(bits);
    if max <= min || steps == 0 {
        return min;
    }
    let t = (code.min(steps) as f64 / steps as f64) as f32;
    min + (max - min) * t
}

/// Quantized water level of one room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomUpdate {
    pub room: RoomId,
    pub volume: u32,
}

/// Quantized damage fractions of every segment of a wall
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureUpdate {
    pub structure: StructureId,
    pub damage: Vec<u32>,
}

impl World {
    pub fn encode_room(&self, room: RoomId) -> Option<RoomUpdate> {
        let (min, max) = ROOM_VOLUME_RANGE;
        let volume = self.room(room)?.normalized_volume();
        Some(RoomUpdate {
            room,
            volume: quantize_ranged(volume, min, max, DEFAULT_BITS),
        })
    }

    pub fn apply_room_update(&mut self, update: &RoomUpdate) {
        let (min, max) = ROOM_VOLUME_RANGE;
        let fraction = dequantize_ranged(update.volume, min, max, DEFAULT_BITS);
        match self.room_mut(update.room) {
            Some(room) => room.set_from_normalized_volume(fraction),
            None => log::warn!("Room update for missing room {:?}", update.room),
        }
    }

    pub fn encode_structure(&self, structure: StructureId) -> Option<StructureUpdate> {
        let s = self.structure(structure)?;
        let damage = (0..s.segment_count())
            .map(|i| quantize_ranged(s.segment_damage_fraction(i), 0.0, 1.0, DEFAULT_BITS))
            .collect();
        Some(StructureUpdate { structure, damage })
    }

    /// Reconcile wall damage from a peer. Breaches open and seal as they
    /// would locally.
    pub fn apply_structure_update(&mut self, update: &StructureUpdate) {
        let Some(count) = self.structure(update.structure).map(|s| s.segment_count()) else {
            log::warn!("Structure update for missing structure {:?}", update.structure);
            return;
        };
        if update.damage.len() != count {
            log::warn!(
                "Structure update has {} segments, expected {count}",
                update.damage.len()
            );
        }
        for (segment, code) in update.damage.iter().enumerate().take(count) {
            let fraction = dequantize_ranged(*code, 0.0, 1.0, DEFAULT_BITS);
            let current = self
                .structure(update.structure)
                .map(|s| s.segment_damage_fraction(segment))
                .unwrap_or(0.0);
            // Skip segments already within one quantization step
            if quantize_ranged(current, 0.0, 1.0, DEFAULT_BITS) != *code {
                self.set_segment_damage_fraction(update.structure, segment, fraction);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tuning;
    use crate::sim::{Rect, Structure};
    use glam::Vec2;

    #[test]
    fn test_quantize_endpoints() {
        assert_eq!(quantize_ranged(0.0, 0.0, 1.0, 8), 0);
        assert_eq!(quantize_ranged(1.0, 0.0, 1.0, 8), 255);
        assert_eq!(quantize_ranged(0.5, 0.0, 1.0, 8), 128);
        assert_eq!(quantize_ranged(-3.0, 0.0, 1.0, 8), 0);
        assert_eq!(quantize_ranged(7.0, 0.0, 1.0, 8), 255);
        assert_eq!(quantize_ranged(f32::NAN, 0.0, 1.0, 8), 0);
        assert_eq!(quantize_ranged(0.5, 1.0, 1.0, 8), 0);
    }

    #[test]
    fn test_dequantize_error_within_half_step() {
        for value in [0.0, 0.1, 0.33, 0.77, 1.2, 1.5] {
            let code = quantize_ranged(value, 0.0, 1.5, 8);
            let back = dequantize_ranged(code, 0.0, 1.5, 8);
            assert!((back - value).abs() <= 1.5 / 255.0 / 2.0 + 1e-6, "{value} -> {back}");
        }
        assert_eq!(dequantize_ranged(999, 0.0, 1.0, 8), 1.0);
    }

    #[test]
    fn test_wide_codes() {
        assert_eq!(quantize_ranged(1.0, 0.0, 1.0, 16), 65535);
        assert_eq!(quantize_ranged(1.0, 0.0, 1.0, 32), u32::MAX);
        assert_eq!(quantize_ranged(1.0, 0.0, 1.0, 0), 0);
    }

    #[test]
    fn test_room_and_structure_sync_between_peers() {
        let build = || {
            let mut world = World::new(1, Tuning::default());
            let v = world.add_vessel(Vec2::ZERO).unwrap();
            let room = world.add_room(v, Rect::new(16.0, 96.0, 192.0, 96.0)).unwrap();
            let wall = world
                .add_structure(Structure::new(Rect::new(0.0, 96.0, 16.0, 96.0), 100.0, v))
                .unwrap();
            (world, room, wall)
        };
        let (mut host, room, wall) = build();
        let (mut peer, _, _) = build();

        host.room_mut(room).unwrap().set_volume(9216.0);
        host.apply_structure_damage(wall, 0, 80.0);

        peer.apply_room_update(&host.encode_room(room).unwrap());
        peer.apply_structure_update(&host.encode_structure(wall).unwrap());

        let full = peer.room(room).unwrap().full_volume();
        assert!((peer.room(room).unwrap().volume() - 9216.0).abs() <= full * 1.5 / 255.0);
        let s = peer.structure(wall).unwrap();
        assert!(s.is_leaking(0));
        assert!((s.segment_damage(0) - 80.0).abs() < 0.5);
        assert!(s.segments[0].breach.is_some());
    }
}
