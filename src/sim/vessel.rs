//! Vessel rigid body
//!
//! One body per vessel, shaped by the convex hull of its walls. Handles
//! buoyancy from the flooded fraction of the vessel's rooms, quadratic drag,
//! integration and the crush-depth damage timer. Also owns the grid used to
//! find which of its rooms contains a point.

use glam::Vec2;

use super::entity::{EntityKind, Linkable, Positioned, RoomId, StructureId};
use super::geometry::{Rect, gift_wrap};
use super::grid::SpatialGrid;
use crate::consts::{DAMAGE_DEPTH, DEPTH_DAMAGE_INTERVAL, GRID_CELL_SIZE, ROOM_LOOKUP_PADDING};
use crate::{Tuning, is_valid_vec};

/// Scales the buoyancy term into a force
const BUOYANCY_FORCE_SCALE: f32 = 10.0;
/// Extra depth damage per unit below the damage depth
const DEPTH_DAMAGE_PER_UNIT: f32 = 0.01;

#[derive(Debug, Clone)]
pub struct VesselBody {
    pub position: Vec2,
    pub velocity: Vec2,
    mass: f32,
    force: Vec2,
    /// Mass of things docked or attached to the hull (adds drag)
    pub attached_mass: f32,
    hull_vertices: Vec<Vec2>,
    borders: Rect,
    depth_damage_timer: f32,
    pub room_grid: SpatialGrid<RoomId>,
    pub rooms: Vec<RoomId>,
    pub structures: Vec<StructureId>,
}

impl VesselBody {
    pub fn new(position: Vec2) -> Self {
        let borders = Rect::new(0.0, 1.0, 1.0, 1.0);
        Self {
            position,
            velocity: Vec2::ZERO,
            mass: 1.0,
            force: Vec2::ZERO,
            attached_mass: 0.0,
            hull_vertices: fallback_hull(),
            borders,
            depth_damage_timer: DEPTH_DAMAGE_INTERVAL,
            room_grid: SpatialGrid::new(borders.expand(ROOM_LOOKUP_PADDING), GRID_CELL_SIZE),
            rooms: Vec::new(),
            structures: Vec::new(),
        }
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Convex silhouette, vessel-local, counter-clockwise
    pub fn hull_vertices(&self) -> &[Vec2] {
        &self.hull_vertices
    }

    pub fn world_hull(&self) -> Vec<Vec2> {
        self.hull_vertices.iter().map(|v| *v + self.position).collect()
    }

    /// Bounding box of every structure and room, vessel-local
    pub fn borders(&self) -> Rect {
        self.borders
    }

    pub fn world_borders(&self) -> Rect {
        self.borders.translate(self.position)
    }

    pub fn depth_damage_timer(&self) -> f32 {
        self.depth_damage_timer
    }

    pub fn reset_depth_damage_timer(&mut self) {
        self.depth_damage_timer = DEPTH_DAMAGE_INTERVAL;
    }

    pub fn at_damage_depth(&self) -> bool {
        self.position.y < DAMAGE_DEPTH
    }

    /// Recompute silhouette, borders, mass and the room grid
    ///
    /// `walls` are the rects of structures that carry a body, `others` any
    /// remaining structure rects (platforms, decorations).
    pub fn rebuild_shape(
        &mut self,
        walls: &[Rect],
        others: &[Rect],
        rooms: &[(RoomId, Rect)],
        tuning: &Tuning,
    ) {
        let corners: Vec<Vec2> = walls.iter().flat_map(|r| r.corners()).collect();
        self.hull_vertices = if corners.is_empty() {
            log::warn!("Vessel has no walls, using a placeholder silhouette");
            fallback_hull()
        } else {
            gift_wrap(&corners)
        };

        let mut borders: Option<Rect> = None;
        for rect in walls.iter().chain(others).chain(rooms.iter().map(|(_, r)| r)) {
            borders = Some(match borders {
                Some(b) => b.union(rect),
                None => *rect,
            });
        }
        self.borders = borders.unwrap_or(Rect::new(0.0, 1.0, 1.0, 1.0));

        let wall_area: f32 = walls.iter().chain(others).map(|r| r.area()).sum();
        let room_area: f32 = rooms.iter().map(|(_, r)| r.area()).sum();
        let mass = wall_area * tuning.wall_density + room_area * tuning.room_density;
        self.mass = if mass > 0.0 { mass } else { 1.0 };

        self.room_grid = SpatialGrid::new(self.borders.expand(ROOM_LOOKUP_PADDING), GRID_CELL_SIZE);
        for (id, rect) in rooms {
            self.room_grid.insert(*id, *rect);
        }

        log::debug!(
            "Rebuilt vessel shape: {} hull vertices, {} rooms, mass {:.0}",
            self.hull_vertices.len(),
            rooms.len(),
            self.mass
        );
    }

    pub fn apply_force(&mut self, force: Vec2) {
        if is_valid_vec(force) {
            self.force += force;
        }
    }

    pub fn apply_impulse(&mut self, impulse: Vec2) {
        if is_valid_vec(impulse) {
            self.velocity += impulse / self.mass;
        }
    }

    /// Vertical buoyancy force for the flooded fraction of the vessel
    pub fn buoyancy(&self, flood_ratio: f32, tuning: &Tuning) -> f32 {
        let neutral = tuning.neutral_ballast;
        (neutral - flood_ratio).max(-2.0 * neutral) * self.mass * BUOYANCY_FORCE_SCALE
    }

    /// Integrate one step with buoyancy, drag and accumulated forces
    pub fn update(&mut self, dt: f32, flood_ratio: f32, tuning: &Tuning) {
        let mut force = self.force;
        force.y += self.buoyancy(flood_ratio, tuning);
        self.force = Vec2::ZERO;

        self.velocity += force / self.mass * dt;

        // Quadratic drag, never strong enough to reverse the motion
        let extra = self.attached_mass / tuning.attached_mass_drag_scale;
        let drag = Vec2::new(
            (tuning.horizontal_drag + extra).clamp(0.0, tuning.max_drag),
            (tuning.vertical_drag + extra).clamp(0.0, tuning.max_drag),
        );
        let slowdown = self.velocity * self.velocity * drag * dt;
        self.velocity.x -= self.velocity.x.signum() * slowdown.x.min(self.velocity.x.abs());
        self.velocity.y -= self.velocity.y.signum() * slowdown.y.min(self.velocity.y.abs());

        self.velocity = self.velocity.clamp_length_max(tuning.max_velocity);
        if !is_valid_vec(self.velocity) {
            log::warn!("Vessel velocity became invalid, stopping it");
            self.velocity = Vec2::ZERO;
        }
        self.position += self.velocity * dt;
    }

    /// Advance the crush-depth timer. Returns the damage to deal when it
    /// expires.
    pub fn update_depth_damage(&mut self, dt: f32, tuning: &Tuning) -> Option<f32> {
        let beyond = DAMAGE_DEPTH - self.position.y;
        if beyond <= 0.0 {
            return None;
        }
        self.depth_damage_timer -= dt * (1.0 + beyond / tuning.depth_timer_scale);
        if self.depth_damage_timer > 0.0 {
            return None;
        }
        self.depth_damage_timer = DEPTH_DAMAGE_INTERVAL;
        Some(tuning.depth_damage_base + beyond * DEPTH_DAMAGE_PER_UNIT)
    }
}

fn fallback_hull() -> Vec<Vec2> {
    vec![Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)]
}

impl Positioned for VesselBody {
    fn rect(&self) -> Rect {
        self.borders
    }

    fn position(&self) -> Vec2 {
        self.position
    }
}

impl Linkable for VesselBody {
    fn linked(&self) -> Vec<EntityKind> {
        self.rooms
            .iter()
            .map(|r| EntityKind::Room(*r))
            .chain(self.structures.iter().map(|s| EntityKind::Structure(*s)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_walls_falls_back_to_triangle() {
        let mut body = VesselBody::new(Vec2::new(10.0, 0.0));
        body.rebuild_shape(&[], &[], &[], &Tuning::default());
        assert_eq!(body.hull_vertices().len(), 3);
        assert_eq!(body.world_hull()[2], Vec2::new(10.0, 1.0));
        assert_eq!(body.mass(), 1.0);
    }

    #[test]
    fn test_dry_vessel_floats_up_and_flooded_sinks() {
        let tuning = Tuning::default();
        let mut body = VesselBody::new(Vec2::ZERO);
        body.rebuild_shape(&[Rect::new(0.0, 10.0, 100.0, 10.0)], &[], &[], &tuning);
        let dry = body.buoyancy(0.0, &tuning);
        assert!((dry - 0.07 * body.mass() * 10.0).abs() < 1e-3);
        let flooded = body.buoyancy(1.0, &tuning);
        assert!((flooded + 0.14 * body.mass() * 10.0).abs() < 1e-3);

        for _ in 0..60 {
            body.update(1.0 / 60.0, 1.0, &tuning);
        }
        assert!(body.velocity.y < 0.0);
        assert!(body.position.y < 0.0);
    }

    #[test]
    fn test_drag_never_reverses_motion() {
        let tuning = Tuning::default();
        let mut body = VesselBody::new(Vec2::ZERO);
        body.velocity = Vec2::new(1500.0, 0.0);
        body.update(1.0 / 60.0, tuning.neutral_ballast, &tuning);
        assert!(body.velocity.x > 0.0);
        assert!(body.velocity.x < 1500.0);
    }

    #[test]
    fn test_speed_is_capped() {
        let tuning = Tuning::default();
        let mut body = VesselBody::new(Vec2::ZERO);
        body.apply_impulse(Vec2::new(0.0, 1e9));
        body.update(1.0 / 60.0, 0.0, &tuning);
        assert!(body.velocity.length() <= tuning.max_velocity + 1e-3);
    }

    #[test]
    fn test_depth_timer_runs_faster_deeper() {
        let tuning = Tuning::default();
        let mut shallow = VesselBody::new(Vec2::new(0.0, DAMAGE_DEPTH - 100.0));
        let mut deep = VesselBody::new(Vec2::new(0.0, DAMAGE_DEPTH - 20000.0));
        shallow.update_depth_damage(1.0, &tuning);
        deep.update_depth_damage(1.0, &tuning);
        assert!(deep.depth_damage_timer() < shallow.depth_damage_timer());

        let mut above = VesselBody::new(Vec2::ZERO);
        assert!(above.update_depth_damage(100.0, &tuning).is_none());
        assert_eq!(above.depth_damage_timer(), DEPTH_DAMAGE_INTERVAL);
    }

    #[test]
    fn test_depth_damage_fires_and_resets() {
        let tuning = Tuning::default();
        let mut body = VesselBody::new(Vec2::new(0.0, DAMAGE_DEPTH - 1000.0));
        let mut fired = None;
        for _ in 0..(12 * 60) {
            if let Some(d) = body.update_depth_damage(1.0 / 60.0, &tuning) {
                fired = Some(d);
                break;
            }
        }
        let damage = fired.expect("depth damage should fire within 12 s");
        assert!((damage - 20.0).abs() < 1e-3);
        assert_eq!(body.depth_damage_timer(), DEPTH_DAMAGE_INTERVAL);
    }
}
