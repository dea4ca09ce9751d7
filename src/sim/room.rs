//! Rooms: sealed compartments holding water, air and a surface wave field
//!
//! A room owns only its own scalar state. Water and oxygen move between rooms
//! through connectors, which write into both endpoints during the connector
//! phase of a tick.

use glam::Vec2;

use super::entity::{AiTarget, ConnectorId, Detectable, EntityKind, Linkable, Positioned, VesselId};
use super::geometry::Rect;
use crate::consts::{MAX_COMPRESS, WAVE_WIDTH};
use crate::{Tuning, is_valid, lerp};

/// Waves below this height count as settled
const WAVE_SETTLE_HEIGHT: f32 = 0.1;
/// Rate at which the surface follows the water level
const SURFACE_LERP_RATE: f32 = 10.0;

#[derive(Debug, Clone)]
pub struct Room {
    pub bounds: Rect,
    pub vessel: VesselId,
    volume: f32,
    pressure: f32,
    surface: f32,
    oxygen: f32,
    lethal_pressure: f32,
    pub(crate) wave_height: Vec<f32>,
    pub(crate) wave_velocity: Vec<f32>,
    waves_active: bool,
    pub connectors: Vec<ConnectorId>,
    pub ai_target: AiTarget,
}

impl Room {
    pub fn new(bounds: Rect, vessel: VesselId) -> Self {
        let samples = (bounds.width / WAVE_WIDTH).ceil().max(0.0) as usize + 1;
        let full = bounds.area().max(0.0);
        Self {
            bounds,
            vessel,
            volume: 0.0,
            pressure: bounds.bottom(),
            surface: bounds.bottom(),
            oxygen: full,
            lethal_pressure: 0.0,
            wave_height: vec![0.0; samples],
            wave_velocity: vec![0.0; samples],
            waves_active: false,
            connectors: Vec::new(),
            ai_target: AiTarget::default(),
        }
    }

    /// Water volume of a completely flooded (uncompressed) room
    #[inline]
    pub fn full_volume(&self) -> f32 {
        self.bounds.area().max(0.0)
    }

    #[inline]
    pub fn max_volume(&self) -> f32 {
        self.full_volume() + MAX_COMPRESS
    }

    #[inline]
    pub fn volume(&self) -> f32 {
        self.volume
    }

    #[inline]
    pub fn pressure(&self) -> f32 {
        self.pressure
    }

    #[inline]
    pub fn oxygen(&self) -> f32 {
        self.oxygen
    }

    #[inline]
    pub fn lethal_pressure(&self) -> f32 {
        self.lethal_pressure
    }

    /// Whether the wave field is being simulated
    #[inline]
    pub fn waves_active(&self) -> bool {
        self.waves_active
    }

    /// Vessel-local water surface height
    #[inline]
    pub fn surface(&self) -> f32 {
        self.surface
    }

    pub fn world_surface(&self, vessel_position: Vec2) -> f32 {
        self.surface + vessel_position.y
    }

    pub fn is_full(&self) -> bool {
        self.volume >= self.full_volume()
    }

    /// Remaining room before the volume hits its compression limit
    pub fn capacity_left(&self) -> f32 {
        (self.max_volume() - self.volume).max(0.0)
    }

    pub fn set_volume(&mut self, volume: f32) {
        if !is_valid(volume) {
            return;
        }
        self.volume = volume.clamp(0.0, self.max_volume());
        let full = self.full_volume();
        if self.volume < full {
            if self.bounds.width > 0.0 {
                self.pressure = self.bounds.bottom() + self.volume / self.bounds.width;
            }
        } else {
            self.pressure = self.pressure.max(self.bounds.top());
        }
        if self.volume > 0.0 {
            self.waves_active = true;
        }
    }

    /// Pressure only moves independently once the room is full
    pub fn set_pressure(&mut self, pressure: f32) {
        if !is_valid(pressure) || !self.is_full() {
            return;
        }
        self.pressure = pressure.max(self.bounds.top());
    }

    pub fn set_oxygen(&mut self, oxygen: f32) {
        if !is_valid(oxygen) {
            return;
        }
        self.oxygen = oxygen.clamp(0.0, self.full_volume());
    }

    pub fn set_lethal_pressure(&mut self, pressure: f32) {
        if !is_valid(pressure) {
            return;
        }
        self.lethal_pressure = pressure.clamp(0.0, 100.0);
    }

    pub fn water_percentage(&self) -> f32 {
        let full = self.full_volume();
        if full <= 0.0 {
            return 0.0;
        }
        (self.volume / full * 100.0).min(100.0)
    }

    pub fn oxygen_percentage(&self) -> f32 {
        let full = self.full_volume();
        if full <= 0.0 {
            return 0.0;
        }
        self.oxygen / full * 100.0
    }

    pub fn set_oxygen_percentage(&mut self, percentage: f32) {
        self.set_oxygen(percentage / 100.0 * self.full_volume());
    }

    /// Replicated volume: fraction of the full volume in [0, 1.5]
    pub fn normalized_volume(&self) -> f32 {
        let full = self.full_volume();
        if full <= 0.0 {
            return 0.0;
        }
        (self.volume / full).clamp(0.0, 1.5)
    }

    pub fn set_from_normalized_volume(&mut self, fraction: f32) {
        self.set_volume(fraction * self.full_volume());
    }

    /// Wave sample under a vessel-local x coordinate
    pub fn wave_index(&self, x: f32) -> usize {
        let i = ((x - self.bounds.left()) / WAVE_WIDTH).floor().max(0.0) as usize;
        i.min(self.wave_height.len() - 1)
    }

    pub fn wave_height(&self, index: usize) -> f32 {
        self.wave_height.get(index).copied().unwrap_or(0.0)
    }

    /// Water surface at the left or right wall, waves included
    pub fn edge_surface(&self, right: bool) -> f32 {
        let i = if right { self.wave_height.len() - 1 } else { 0 };
        self.surface + self.wave_height[i]
    }

    /// Push the wave sample at `index`
    pub fn kick_wave(&mut self, index: usize, velocity: f32) {
        if !is_valid(velocity) {
            return;
        }
        if let Some(v) = self.wave_velocity.get_mut(index) {
            *v += velocity;
            self.waves_active = true;
        }
    }

    /// Advance oxygen, the wave field and lethal pressure by `dt`
    pub fn update(&mut self, dt: f32, tuning: &Tuning, at_damage_depth: bool) {
        self.set_oxygen(self.oxygen - tuning.oxygen_deterioration_rate * dt);
        self.ai_target.decay(tuning.sound_range_decay, dt);

        if !self.waves_active {
            self.lethal_pressure = 0.0;
            return;
        }

        let floor = self.bounds.bottom();
        let ceiling = self.bounds.top();
        let mut depth = if self.bounds.width > 0.0 {
            self.volume / self.bounds.width
        } else {
            0.0
        };
        // A film of water doesn't lift the surface off the floor
        if depth < 1.0 {
            depth = 0.0;
        }
        self.surface = lerp(self.surface, floor + depth, dt * SURFACE_LERP_RATE).max(floor);

        self.step_waves(tuning, floor, ceiling);

        if self.volume < self.full_volume() {
            self.set_lethal_pressure(self.lethal_pressure - tuning.lethal_pressure_decay * dt);
            if self.volume <= 0.0 && self.waves_settled(floor) {
                self.waves_active = false;
            }
        } else {
            let growth = if at_damage_depth {
                tuning.lethal_pressure_growth_at_depth
            } else {
                tuning.lethal_pressure_growth
            };
            self.set_lethal_pressure(self.lethal_pressure + growth * dt);
        }
    }

    fn step_waves(&mut self, tuning: &Tuning, floor: f32, ceiling: f32) {
        let n = self.wave_height.len();
        for i in 0..n {
            let a = -tuning.wave_stiffness * self.wave_height[i]
                - tuning.wave_damping * self.wave_velocity[i];
            self.wave_velocity[i] += a;
            self.wave_height[i] += self.wave_velocity[i];

            let level = self.surface + self.wave_height[i];
            if level > ceiling {
                self.wave_height[i] -= level - ceiling;
                self.wave_velocity[i] *= -0.5;
            } else if level < floor {
                self.wave_height[i] -= level - floor;
                self.wave_velocity[i] *= -0.5;
            }
        }

        if n < 3 {
            return;
        }
        let mut left = vec![0.0; n];
        let mut right = vec![0.0; n];
        for _ in 0..2 {
            for i in 1..n - 1 {
                left[i] = tuning.wave_spread * (self.wave_height[i] - self.wave_height[i - 1]);
                right[i] = tuning.wave_spread * (self.wave_height[i] - self.wave_height[i + 1]);
                self.wave_velocity[i - 1] += left[i];
                self.wave_velocity[i + 1] += right[i];
            }
            for i in 1..n - 1 {
                self.wave_height[i - 1] += left[i];
                self.wave_height[i + 1] += right[i];
            }
        }
    }

    fn waves_settled(&self, floor: f32) -> bool {
        self.surface <= floor + 1.0 && self.wave_height.iter().all(|h| h.abs() < WAVE_SETTLE_HEIGHT)
    }
}

impl Positioned for Room {
    fn rect(&self) -> Rect {
        self.bounds
    }
}

impl Linkable for Room {
    fn linked(&self) -> Vec<EntityKind> {
        self.connectors.iter().map(|c| EntityKind::Connector(*c)).collect()
    }
}

impl Detectable for Room {
    fn ai_target(&self) -> &AiTarget {
        &self.ai_target
    }

    fn ai_target_mut(&mut self) -> &mut AiTarget {
        &mut self.ai_target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::arena::Handle;
    use proptest::prelude::*;

    fn vessel() -> VesselId {
        VesselId(Handle {
            index: 0,
            generation: 0,
        })
    }

    fn room() -> Room {
        // 100 wide, 50 tall, floor at y = 0
        Room::new(Rect::new(0.0, 50.0, 100.0, 50.0), vessel())
    }

    #[test]
    fn test_new_room_is_dry_and_breathable() {
        let r = room();
        assert_eq!(r.full_volume(), 5000.0);
        assert_eq!(r.volume(), 0.0);
        assert_eq!(r.oxygen(), 5000.0);
        assert_eq!(r.wave_height.len(), 5);
        assert!(!r.waves_active());
    }

    #[test]
    fn test_pressure_follows_level_until_full() {
        let mut r = room();
        r.set_volume(2500.0);
        assert_eq!(r.pressure(), 25.0);
        assert!(r.waves_active());

        r.set_volume(5000.0);
        assert_eq!(r.pressure(), 50.0);
        r.set_pressure(80.0);
        r.set_volume(6000.0);
        assert_eq!(r.pressure(), 80.0);

        r.set_volume(1e9);
        assert_eq!(r.volume(), 5000.0 + MAX_COMPRESS);
        r.set_volume(f32::NAN);
        assert_eq!(r.volume(), 5000.0 + MAX_COMPRESS);
    }

    #[test]
    fn test_partial_room_ignores_pressure_writes() {
        let mut r = room();
        r.set_volume(1000.0);
        r.set_pressure(500.0);
        assert_eq!(r.pressure(), 10.0);
    }

    #[test]
    fn test_surface_approaches_water_level() {
        let mut r = room();
        let tuning = Tuning::default();
        r.set_volume(2500.0);
        for _ in 0..600 {
            r.update(1.0 / 60.0, &tuning, false);
        }
        assert!((r.surface() - 25.0).abs() < 0.5, "surface {}", r.surface());
        assert!((r.world_surface(Vec2::new(0.0, -100.0)) - (r.surface() - 100.0)).abs() < 1e-4);
    }

    #[test]
    fn test_oxygen_deteriorates() {
        let mut r = room();
        let tuning = Tuning::default();
        r.update(1.0, &tuning, false);
        assert!((r.oxygen() - (5000.0 - 0.3)).abs() < 1e-3);
        r.set_oxygen_percentage(50.0);
        assert_eq!(r.oxygen(), 2500.0);
        assert_eq!(r.oxygen_percentage(), 50.0);
    }

    #[test]
    fn test_waves_deactivate_once_drained_and_settled() {
        let mut r = room();
        let tuning = Tuning::default();
        r.set_volume(2500.0);
        r.kick_wave(2, 5.0);
        r.update(1.0 / 60.0, &tuning, false);
        r.set_volume(0.0);
        for _ in 0..3000 {
            r.update(1.0 / 60.0, &tuning, false);
        }
        assert!(!r.waves_active());
        assert_eq!(r.lethal_pressure(), 0.0);
    }

    #[test]
    fn test_lethal_pressure_builds_when_flooded() {
        let mut r = room();
        let tuning = Tuning::default();
        r.set_volume(r.full_volume());
        r.update(1.0, &tuning, false);
        assert!((r.lethal_pressure() - 10.0).abs() < 1e-4);
        r.update(1.0, &tuning, true);
        assert!((r.lethal_pressure() - 100.0).abs() < 1e-4);

        r.set_volume(1000.0);
        r.update(1.0, &tuning, true);
        assert!((r.lethal_pressure() - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_wave_index_is_clamped() {
        let r = room();
        assert_eq!(r.wave_index(-50.0), 0);
        assert_eq!(r.wave_index(40.0), 1);
        assert_eq!(r.wave_index(1000.0), 4);
    }

    #[test]
    fn test_normalized_volume() {
        let mut r = room();
        r.set_volume(r.max_volume());
        assert_eq!(r.normalized_volume(), 1.5);
        r.set_from_normalized_volume(0.5);
        assert_eq!(r.volume(), 2500.0);
    }

    proptest! {
        #[test]
        fn prop_volume_stays_in_bounds(
            volumes in prop::collection::vec(prop_oneof![
                -1e7f32..1e7f32,
                Just(f32::NAN),
                Just(f32::INFINITY),
                Just(f32::NEG_INFINITY),
            ], 1..64)
        ) {
            let mut r = room();
            for v in volumes {
                r.set_volume(v);
                prop_assert!(r.volume() >= 0.0);
                prop_assert!(r.volume() <= r.full_volume() + MAX_COMPRESS);
            }
        }

        #[test]
        fn prop_oxygen_stays_in_bounds(
            steps in prop::collection::vec((-1e6f32..1e6f32, 0.0f32..2.0), 1..64)
        ) {
            let mut r = room();
            let tuning = Tuning::default();
            for (oxygen, dt) in steps {
                r.set_oxygen(oxygen);
                r.update(dt, &tuning, false);
                prop_assert!(r.oxygen() >= 0.0);
                prop_assert!(r.oxygen() <= r.full_volume());
            }
        }
    }
}
