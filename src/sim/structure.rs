//! Walls and platforms split into independently damaged segments
//!
//! Segment state machine, by damage relative to max health:
//! - Intact: below `LEAK_THRESHOLD`
//! - Leaking: at or above the threshold, water seeps through a breach
//!   connector whose openness grows with damage
//! - Breached: at max health, the segment loses its collision body
//!
//! Fixture rebuilds are lazy: damage only marks the structure dirty and the
//! tick rebuilds each dirty structure once.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{ConnectorId, EntityKind, Linkable, Positioned, VesselId};
use super::geometry::{Orientation, Rect};
use crate::consts::{BREACH_MARGIN, LEAK_THRESHOLD, SECTION_SIZE};
use crate::is_valid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentState {
    Intact,
    Leaking,
    Breached,
}

#[derive(Debug, Clone)]
pub struct Segment {
    pub rect: Rect,
    pub damage: f32,
    /// Breach connector while the segment leaks
    pub breach: Option<ConnectorId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixtureKind {
    /// Collides
    Solid,
    /// Reports overlaps only
    Sensor,
}

/// Collision shape of a structure, vessel-local
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub rect: Rect,
    pub kind: FixtureKind,
}

/// Result of changing a segment's damage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    pub segment: usize,
    pub previous: SegmentState,
    pub current: SegmentState,
    pub damage: f32,
    /// Openness the segment's breach connector should have
    pub openness: f32,
}

impl DamageOutcome {
    pub fn state_changed(&self) -> bool {
        self.previous != self.current
    }
}

#[derive(Debug, Clone)]
pub struct Structure {
    pub rect: Rect,
    /// Axis the wall runs along
    pub orientation: Orientation,
    pub segments: Vec<Segment>,
    pub has_body: bool,
    pub is_platform: bool,
    pub indestructible: bool,
    pub max_health: f32,
    pub vessel: VesselId,
    fixtures: Vec<Fixture>,
    dirty: bool,
}

impl Structure {
    /// A solid wall; the long side of `rect` decides its orientation
    pub fn new(rect: Rect, max_health: f32, vessel: VesselId) -> Self {
        let orientation = if rect.width >= rect.height {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        let mut structure = Self {
            rect,
            orientation,
            segments: Self::partition(rect, orientation),
            has_body: true,
            is_platform: false,
            indestructible: false,
            max_health: if max_health > 0.0 { max_health } else { 1.0 },
            vessel,
            fixtures: Vec::new(),
            dirty: true,
        };
        structure.rebuild_fixtures();
        structure
    }

    pub fn platform(rect: Rect, vessel: VesselId) -> Self {
        let mut structure = Self::new(rect, 1.0, vessel);
        structure.is_platform = true;
        structure.rebuild_fixtures();
        structure
    }

    /// Decoration or background wall without collision
    pub fn bodyless(rect: Rect, vessel: VesselId) -> Self {
        let mut structure = Self::new(rect, 1.0, vessel);
        structure.has_body = false;
        structure.rebuild_fixtures();
        structure
    }

    fn partition(rect: Rect, orientation: Orientation) -> Vec<Segment> {
        let section = SECTION_SIZE as f32;
        let length = match orientation {
            Orientation::Horizontal => rect.width,
            Orientation::Vertical => rect.height,
        };
        let count = ((length / section).ceil() as usize).max(1);
        (0..count)
            .map(|i| {
                let offset = i as f32 * section;
                let size = (length - offset).min(section);
                let seg_rect = match orientation {
                    Orientation::Horizontal => Rect::new(rect.x + offset, rect.y, size, rect.height),
                    Orientation::Vertical => Rect::new(rect.x, rect.y - offset, rect.width, size),
                };
                Segment {
                    rect: seg_rect,
                    damage: 0.0,
                    breach: None,
                }
            })
            .collect()
    }

    /// Walls that take damage and let water through when broken
    pub fn is_damageable(&self) -> bool {
        self.has_body && !self.is_platform && !self.indestructible
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    pub fn solid_fixtures(&self) -> impl Iterator<Item = &Fixture> {
        self.fixtures.iter().filter(|f| f.kind == FixtureKind::Solid)
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    fn state_for(&self, damage: f32) -> SegmentState {
        if damage >= self.max_health {
            SegmentState::Breached
        } else if damage >= self.max_health * LEAK_THRESHOLD {
            SegmentState::Leaking
        } else {
            SegmentState::Intact
        }
    }

    pub fn segment_state(&self, index: usize) -> Option<SegmentState> {
        self.segments.get(index).map(|s| self.state_for(s.damage))
    }

    pub fn is_leaking(&self, index: usize) -> bool {
        self.segment_state(index) == Some(SegmentState::Leaking)
    }

    /// The segment's collision body is gone
    pub fn is_breached(&self, index: usize) -> bool {
        self.segment_state(index) == Some(SegmentState::Breached)
    }

    pub fn segment_damage(&self, index: usize) -> f32 {
        self.segments.get(index).map(|s| s.damage).unwrap_or(0.0)
    }

    /// Damage as a fraction of max health (replicated form)
    pub fn segment_damage_fraction(&self, index: usize) -> f32 {
        self.segment_damage(index) / self.max_health
    }

    pub fn segment_length(&self, index: usize) -> f32 {
        match (self.segments.get(index), self.orientation) {
            (Some(s), Orientation::Horizontal) => s.rect.width,
            (Some(s), Orientation::Vertical) => s.rect.height,
            (None, _) => 0.0,
        }
    }

    pub fn segment_center(&self, index: usize) -> Option<Vec2> {
        self.segments.get(index).map(|s| s.rect.center())
    }

    /// Openness of a segment's breach connector
    pub fn segment_openness(&self, index: usize) -> f32 {
        let damage = self.segment_damage(index);
        match self.segment_state(index) {
            Some(SegmentState::Leaking) => (damage / self.max_health - LEAK_THRESHOLD) * 2.0,
            Some(SegmentState::Breached) => 1.0,
            _ => 0.0,
        }
    }

    /// Rect of the breach connector for a segment
    pub fn breach_rect(&self, index: usize) -> Option<Rect> {
        self.segments.get(index).map(|s| s.rect.expand(BREACH_MARGIN))
    }

    /// Segment under a vessel-local point. With `clamp`, points past either
    /// end map to the first or last segment.
    pub fn find_segment_index(&self, point: Vec2, clamp: bool) -> Option<usize> {
        let section = SECTION_SIZE as f32;
        let offset = match self.orientation {
            Orientation::Horizontal => point.x - self.rect.left(),
            Orientation::Vertical => self.rect.top() - point.y,
        };
        let index = (offset / section).floor();
        let last = self.segments.len() as f32 - 1.0;
        if index >= 0.0 && index <= last {
            Some(index as usize)
        } else if clamp && is_valid(index) {
            Some(index.clamp(0.0, last) as usize)
        } else {
            None
        }
    }

    pub fn nearest_segment(&self, point: Vec2) -> Option<usize> {
        self.segments
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.rect.closest_point(point).distance_squared(point)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    pub fn apply_damage(&mut self, index: usize, amount: f32) -> Option<DamageOutcome> {
        let current = self.segments.get(index)?.damage;
        self.set_damage(index, current + amount)
    }

    /// Set a segment's damage, clamped to `[0, max_health]`
    pub fn set_damage(&mut self, index: usize, damage: f32) -> Option<DamageOutcome> {
        if !is_valid(damage) || index >= self.segments.len() {
            return None;
        }
        if !self.is_damageable() {
            log::warn!(
                "Tried to damage a structure that can't take damage (platform: {}, body: {}, indestructible: {})",
                self.is_platform,
                self.has_body,
                self.indestructible
            );
            return None;
        }

        let previous = self.state_for(self.segments[index].damage);
        let damage = damage.clamp(0.0, self.max_health);
        self.segments[index].damage = damage;
        let current = self.state_for(damage);
        if previous != current {
            self.dirty = true;
        }
        Some(DamageOutcome {
            segment: index,
            previous,
            current,
            damage,
            openness: self.segment_openness(index),
        })
    }

    /// Merge runs of segments that still have a body into solid fixtures
    pub fn rebuild_fixtures(&mut self) {
        self.dirty = false;
        self.fixtures.clear();
        if !self.has_body {
            return;
        }

        let mut run: Option<Rect> = None;
        let mut all_intact = true;
        for i in 0..self.segments.len() {
            let state = self.state_for(self.segments[i].damage);
            all_intact &= state == SegmentState::Intact;
            if state == SegmentState::Breached {
                if let Some(rect) = run.take() {
                    self.fixtures.push(Fixture {
                        rect,
                        kind: FixtureKind::Solid,
                    });
                }
                continue;
            }
            let seg_rect = self.segments[i].rect;
            run = Some(match run {
                Some(rect) => rect.union(&seg_rect),
                None => seg_rect,
            });
        }
        if let Some(rect) = run {
            self.fixtures.push(Fixture {
                rect,
                kind: FixtureKind::Solid,
            });
        }

        if !all_intact || self.fixtures.is_empty() {
            self.fixtures.push(Fixture {
                rect: self.rect,
                kind: FixtureKind::Sensor,
            });
        }
    }

    pub fn breaches(&self) -> impl Iterator<Item = (usize, ConnectorId)> + '_ {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.breach.map(|c| (i, c)))
    }
}

impl Positioned for Structure {
    fn rect(&self) -> Rect {
        self.rect
    }
}

impl Linkable for Structure {
    fn linked(&self) -> Vec<EntityKind> {
        self.breaches().map(|(_, c)| EntityKind::Connector(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::arena::Handle;

    fn vessel() -> VesselId {
        VesselId(Handle {
            index: 0,
            generation: 0,
        })
    }

    fn wall() -> Structure {
        // Four segments, the last one shorter
        Structure::new(Rect::new(0.0, 20.0, 350.0, 20.0), 100.0, vessel())
    }

    #[test]
    fn test_partition_along_long_axis() {
        let w = wall();
        assert_eq!(w.orientation, Orientation::Horizontal);
        assert_eq!(w.segment_count(), 4);
        assert_eq!(w.segment_length(0), 96.0);
        assert_eq!(w.segment_length(3), 350.0 - 3.0 * 96.0);
        assert_eq!(w.segment_length(4), 0.0);

        let v = Structure::new(Rect::new(0.0, 200.0, 16.0, 200.0), 100.0, vessel());
        assert_eq!(v.orientation, Orientation::Vertical);
        assert_eq!(v.segment_count(), 3);
        assert_eq!(v.segments[1].rect.top(), 104.0);
        assert_eq!(v.find_segment_index(Vec2::new(8.0, 100.0), false), Some(1));
    }

    #[test]
    fn test_leak_then_breach() {
        let mut w = Structure::new(Rect::new(0.0, 20.0, 384.0, 20.0), 100.0, vessel());
        let outcome = w.apply_damage(2, 60.0).unwrap();
        assert_eq!(outcome.current, SegmentState::Leaking);
        assert!((outcome.openness - 0.2).abs() < 1e-5);
        assert!(!w.is_breached(2));
        assert!(w.is_leaking(2));

        w.apply_damage(2, 60.0);
        assert!(w.is_breached(2));
        assert_eq!(w.segment_damage(2), 100.0);
        assert!(w.is_dirty());
        w.rebuild_fixtures();

        let gap = w.segments[2].rect;
        for f in w.solid_fixtures() {
            assert!(f.rect.right() <= gap.left() || f.rect.left() >= gap.right());
        }
        assert_eq!(w.solid_fixtures().count(), 2);
        assert!(w.fixtures().iter().any(|f| f.kind == FixtureKind::Sensor));
    }

    #[test]
    fn test_damage_clamps_and_ignores_bad_input() {
        let mut w = wall();
        assert!(w.set_damage(0, f32::NAN).is_none());
        assert!(w.apply_damage(9, 10.0).is_none());
        w.set_damage(0, 1000.0);
        assert_eq!(w.segment_damage(0), 100.0);
        w.set_damage(0, -5.0);
        assert_eq!(w.segment_damage(0), 0.0);
        let before = w.segment_damage(1);
        let outcome = w.apply_damage(1, 0.0).unwrap();
        assert!(!outcome.state_changed());
        assert_eq!(w.segment_damage(1), before);
    }

    #[test]
    fn test_platforms_and_bodyless_walls_take_no_damage() {
        let mut p = Structure::platform(Rect::new(0.0, 10.0, 200.0, 10.0), vessel());
        assert!(p.apply_damage(0, 50.0).is_none());
        assert_eq!(p.segment_damage(0), 0.0);

        let mut b = Structure::bodyless(Rect::new(0.0, 10.0, 200.0, 10.0), vessel());
        assert!(b.apply_damage(0, 50.0).is_none());
        assert!(b.fixtures().is_empty());
    }

    #[test]
    fn test_intact_wall_is_one_solid_fixture() {
        let w = wall();
        assert_eq!(w.fixtures().len(), 1);
        assert_eq!(w.fixtures()[0].kind, FixtureKind::Solid);
        assert_eq!(w.fixtures()[0].rect, w.rect);
    }

    #[test]
    fn test_fully_breached_wall_keeps_sensor() {
        let mut w = wall();
        for i in 0..w.segment_count() {
            w.set_damage(i, 100.0);
        }
        w.rebuild_fixtures();
        assert_eq!(w.fixtures().len(), 1);
        assert_eq!(w.fixtures()[0].kind, FixtureKind::Sensor);
    }

    #[test]
    fn test_find_and_nearest_segment() {
        let w = wall();
        assert_eq!(w.find_segment_index(Vec2::new(100.0, 10.0), false), Some(1));
        assert_eq!(w.find_segment_index(Vec2::new(-50.0, 10.0), false), None);
        assert_eq!(w.find_segment_index(Vec2::new(-50.0, 10.0), true), Some(0));
        assert_eq!(w.find_segment_index(Vec2::new(900.0, 10.0), true), Some(3));
        assert_eq!(w.nearest_segment(Vec2::new(300.0, 200.0)), Some(3));
        assert_eq!(w.breach_rect(0).unwrap(), Rect::new(-10.0, 30.0, 116.0, 40.0));
        assert_eq!(w.segment_center(0), Some(Vec2::new(48.0, 10.0)));
        assert_eq!(w.segment_center(9), None);
    }

    #[test]
    fn test_state_monotonic_under_damage_and_repair() {
        let mut w = wall();
        let mut last = SegmentState::Intact;
        for _ in 0..12 {
            w.apply_damage(0, 10.0);
            let state = w.segment_state(0).unwrap();
            assert!(state as u8 >= last as u8);
            last = state;
        }
        assert_eq!(last, SegmentState::Breached);
        for _ in 0..12 {
            w.apply_damage(0, -10.0);
            let state = w.segment_state(0).unwrap();
            assert!(state as u8 <= last as u8);
            last = state;
        }
        assert_eq!(last, SegmentState::Intact);
    }
}
