//! Simulation world and entity topology
//!
//! The world owns every room, connector, structure and vessel in
//! generational arenas, keeps the links between them consistent, and queues
//! fire-and-forget events for the presentation layer.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::collision::{Contact, ContactBody, level_impact, limb_impact, vessel_impact};
use super::connector::{Connector, FlowPlan, RoomView};
use super::entity::{ConnectorId, EntityKind, Linkable, Positioned, RoomId, StructureId, VesselId};
use super::geometry::{Orientation, Rect, point_on_perimeter};
use super::room::Room;
use super::structure::{DamageOutcome, SegmentState, Structure};
use super::vessel::VesselBody;
use crate::Tuning;
use crate::consts::*;

/// Notifications for effects, sound and UI. Drained by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Water gushing through a connector (world position)
    Splash {
        connector: ConnectorId,
        position: Vec2,
        force: Vec2,
    },
    StructureDamaged {
        structure: StructureId,
        segment: usize,
        damage: f32,
    },
    BreachOpened {
        structure: StructureId,
        segment: usize,
        connector: ConnectorId,
    },
    BreachSealed {
        structure: StructureId,
        segment: usize,
        connector: ConnectorId,
    },
    Impact {
        vessel: VesselId,
        point: Vec2,
        impact: f32,
    },
    DepthDamage {
        vessel: VesselId,
        point: Vec2,
        damage: f32,
    },
}

/// First solid structure hit by a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub structure: StructureId,
    pub segment: usize,
    /// World position of the hit
    pub point: Vec2,
    /// Fraction along the ray, 0 at the start
    pub fraction: f32,
}

/// Complete simulation state (deterministic for a given seed and input)
#[derive(Debug, Clone)]
pub struct World {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub rooms: Arena<Room>,
    pub connectors: Arena<Connector>,
    pub structures: Arena<Structure>,
    pub vessels: Arena<VesselBody>,
    /// Ticks simulated so far
    pub tick_count: u64,
    events: Vec<SimEvent>,
    rng: Pcg32,
}

impl World {
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        log::info!("Creating world with seed {seed}");
        Self {
            seed,
            tuning,
            rooms: Arena::with_capacity_limit(MAX_ROOMS),
            connectors: Arena::with_capacity_limit(MAX_CONNECTORS),
            structures: Arena::with_capacity_limit(MAX_STRUCTURES),
            vessels: Arena::with_capacity_limit(MAX_VESSELS),
            tick_count: 0,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: SimEvent) {
        log::debug!("Event: {event:?}");
        self.events.push(event);
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id.0)
    }

    pub fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(id.0)
    }

    pub fn connector(&self, id: ConnectorId) -> Option<&Connector> {
        self.connectors.get(id.0)
    }

    pub fn structure(&self, id: StructureId) -> Option<&Structure> {
        self.structures.get(id.0)
    }

    pub fn vessel(&self, id: VesselId) -> Option<&VesselBody> {
        self.vessels.get(id.0)
    }

    pub fn vessel_mut(&mut self, id: VesselId) -> Option<&mut VesselBody> {
        self.vessels.get_mut(id.0)
    }

    fn vessel_position(&self, id: VesselId) -> Vec2 {
        self.vessel(id).map(|v| v.position).unwrap_or(Vec2::ZERO)
    }

    // === Topology ===

    pub fn add_vessel(&mut self, position: Vec2) -> Option<VesselId> {
        self.vessels.insert(VesselBody::new(position)).map(VesselId)
    }

    pub fn add_room(&mut self, vessel: VesselId, bounds: Rect) -> Option<RoomId> {
        if !self.vessels.contains(vessel.0) {
            log::warn!("Can't add a room to missing vessel {vessel:?}");
            return None;
        }
        let id = RoomId(self.rooms.insert(Room::new(bounds, vessel))?);
        if let Some(body) = self.vessels.get_mut(vessel.0) {
            body.rooms.push(id);
        }
        self.build_vessel_body(vessel);
        Some(id)
    }

    pub fn add_structure(&mut self, structure: Structure) -> Option<StructureId> {
        let vessel = structure.vessel;
        if !self.vessels.contains(vessel.0) {
            log::warn!("Can't add a structure to missing vessel {vessel:?}");
            return None;
        }
        let id = StructureId(self.structures.insert(structure)?);
        if let Some(body) = self.vessels.get_mut(vessel.0) {
            body.structures.push(id);
        }
        self.build_vessel_body(vessel);
        Some(id)
    }

    /// Add a solid wall with the tuned max health
    pub fn add_wall(&mut self, vessel: VesselId, rect: Rect) -> Option<StructureId> {
        let max_health = self.tuning.wall_max_health;
        self.add_structure(Structure::new(rect, max_health, vessel))
    }

    /// Add a door, hatch or duct and link it to the rooms at its ends
    pub fn add_connector(
        &mut self,
        vessel: VesselId,
        bounds: Rect,
        orientation: Orientation,
        openness: f32,
    ) -> Option<ConnectorId> {
        if !self.vessels.contains(vessel.0) {
            log::warn!("Can't add a connector to missing vessel {vessel:?}");
            return None;
        }
        let mut connector = Connector::new(bounds, orientation, vessel);
        connector.set_openness(openness);
        let id = ConnectorId(self.connectors.insert(connector)?);
        self.link_connector(id);
        Some(id)
    }

    /// Recompute silhouette, borders, mass and room grid of a vessel
    pub fn build_vessel_body(&mut self, vessel: VesselId) {
        let Some(body) = self.vessels.get(vessel.0) else {
            return;
        };
        let mut walls = Vec::new();
        let mut others = Vec::new();
        for s in body.structures.iter().filter_map(|id| self.structures.get(id.0)) {
            if s.has_body && !s.is_platform {
                walls.push(s.rect);
            } else {
                others.push(s.rect);
            }
        }
        let rooms: Vec<(RoomId, Rect)> = body
            .rooms
            .iter()
            .filter_map(|id| self.rooms.get(id.0).map(|r| (*id, r.bounds)))
            .collect();
        if let Some(body) = self.vessels.get_mut(vessel.0) {
            body.rebuild_shape(&walls, &others, &rooms, &self.tuning);
        }
    }

    /// Room containing a vessel-local point
    pub fn find_room(&self, vessel: VesselId, point: Vec2) -> Option<RoomId> {
        self.vessel(vessel)?.room_grid.query_point(point).first().copied()
    }

    /// Vessel and room containing a world point
    pub fn find_room_at(&self, world_point: Vec2) -> Option<(VesselId, RoomId)> {
        self.vessels.iter().find_map(|(handle, body)| {
            if !body.world_borders().expand(ROOM_LOOKUP_PADDING).contains(world_point) {
                return None;
            }
            let id = VesselId(handle);
            self.find_room(id, world_point - body.position).map(|room| (id, room))
        })
    }

    /// Re-resolve a connector's endpoint rooms from its rect
    pub fn link_connector(&mut self, id: ConnectorId) {
        let Some(connector) = self.connectors.get(id.0) else {
            return;
        };
        let b = connector.bounds;
        let vessel = connector.vessel;
        let (p1, p2) = match connector.orientation {
            Orientation::Horizontal => (
                Vec2::new(b.left(), b.center().y),
                Vec2::new(b.right(), b.center().y),
            ),
            Orientation::Vertical => (
                Vec2::new(b.center().x, b.top()),
                Vec2::new(b.center().x, b.bottom()),
            ),
        };
        let first = self.find_room(vessel, p1);
        let second = self.find_room(vessel, p2).filter(|r| Some(*r) != first);
        let old = connector.rooms;

        for room in old.iter().flatten() {
            if let Some(r) = self.rooms.get_mut(room.0) {
                r.connectors.retain(|c| *c != id);
            }
        }
        if let Some(c) = self.connectors.get_mut(id.0) {
            c.link(first, second);
        }
        for room in [first, second].iter().flatten() {
            if let Some(r) = self.rooms.get_mut(room.0) {
                r.connectors.push(id);
            }
        }
    }

    pub fn remove_connector(&mut self, id: ConnectorId) -> Option<Connector> {
        let connector = self.connectors.remove(id.0)?;
        for room in connector.rooms.iter().flatten() {
            if let Some(r) = self.rooms.get_mut(room.0) {
                r.connectors.retain(|c| *c != id);
            }
        }
        if let Some((structure, segment)) = connector.owner
            && let Some(seg) = self
                .structures
                .get_mut(structure.0)
                .and_then(|s| s.segments.get_mut(segment))
        {
            seg.breach = None;
        }
        Some(connector)
    }

    pub fn remove_room(&mut self, id: RoomId) -> Option<Room> {
        let room = self.rooms.remove(id.0)?;
        for c in &room.connectors {
            if let Some(connector) = self.connectors.get_mut(c.0) {
                connector.unlink_room(id);
            }
        }
        if let Some(body) = self.vessels.get_mut(room.vessel.0) {
            body.rooms.retain(|r| *r != id);
        }
        self.build_vessel_body(room.vessel);
        Some(room)
    }

    /// Remove a wall together with its breaches and reshape the vessel
    pub fn remove_structure(&mut self, id: StructureId) -> Option<Structure> {
        let breaches: Vec<ConnectorId> = self.structure(id)?.breaches().map(|(_, c)| c).collect();
        for c in breaches {
            self.remove_connector(c);
        }
        let structure = self.structures.remove(id.0)?;
        if let Some(body) = self.vessels.get_mut(structure.vessel.0) {
            body.structures.retain(|s| *s != id);
        }
        self.build_vessel_body(structure.vessel);
        Some(structure)
    }

    /// Bounding rect of an entity, vessel-local
    pub fn entity_rect(&self, entity: EntityKind) -> Option<Rect> {
        match entity {
            EntityKind::Room(id) => self.room(id).map(|r| r.rect()),
            EntityKind::Connector(id) => self.connector(id).map(|c| c.rect()),
            EntityKind::Structure(id) => self.structure(id).map(|s| s.rect()),
            EntityKind::Vessel(id) => self.vessel(id).map(|v| v.rect()),
        }
    }

    /// Entities directly linked to an entity
    pub fn linked(&self, entity: EntityKind) -> Vec<EntityKind> {
        match entity {
            EntityKind::Room(id) => self.room(id).map(|r| r.linked()),
            EntityKind::Connector(id) => self.connector(id).map(|c| c.linked()),
            EntityKind::Structure(id) => self.structure(id).map(|s| s.linked()),
            EntityKind::Vessel(id) => self.vessel(id).map(|v| v.linked()),
        }
        .unwrap_or_default()
    }

    // === Structural damage ===

    pub fn apply_structure_damage(
        &mut self,
        id: StructureId,
        segment: usize,
        amount: f32,
    ) -> Option<DamageOutcome> {
        let current = self.structure(id)?.segments.get(segment)?.damage;
        self.set_structure_damage(id, segment, current + amount)
    }

    /// Set a segment's damage and open, adjust or seal its breach
    pub fn set_structure_damage(
        &mut self,
        id: StructureId,
        segment: usize,
        damage: f32,
    ) -> Option<DamageOutcome> {
        let Some(structure) = self.structures.get_mut(id.0) else {
            log::warn!("Tried to damage missing structure {id:?}");
            return None;
        };
        let outcome = structure.set_damage(segment, damage)?;
        let breach = structure.segments[segment].breach;

        self.emit(SimEvent::StructureDamaged {
            structure: id,
            segment,
            damage: outcome.damage,
        });

        match (outcome.current, breach) {
            (SegmentState::Intact, Some(connector)) => {
                self.remove_connector(connector);
                self.emit(SimEvent::BreachSealed {
                    structure: id,
                    segment,
                    connector,
                });
            }
            (SegmentState::Intact, None) => {}
            (_, Some(connector)) => {
                if let Some(c) = self.connectors.get_mut(connector.0) {
                    c.set_openness(outcome.openness);
                }
            }
            (_, None) => self.open_breach(id, segment, outcome.openness),
        }
        Some(outcome)
    }

    fn open_breach(&mut self, id: StructureId, segment: usize, openness: f32) {
        let Some(structure) = self.structure(id) else {
            return;
        };
        let Some(rect) = structure.breach_rect(segment) else {
            return;
        };
        let mut connector = Connector::new(rect, structure.orientation.opposite(), structure.vessel);
        connector.owner = Some((id, segment));
        connector.set_openness(openness);
        let Some(handle) = self.connectors.insert(connector) else {
            return;
        };
        let connector = ConnectorId(handle);
        self.link_connector(connector);
        if let Some(seg) = self
            .structures
            .get_mut(id.0)
            .and_then(|s| s.segments.get_mut(segment))
        {
            seg.breach = Some(connector);
        }
        self.emit(SimEvent::BreachOpened {
            structure: id,
            segment,
            connector,
        });
    }

    /// Replicated damage: fraction of the segment's max health
    pub fn set_segment_damage_fraction(
        &mut self,
        id: StructureId,
        segment: usize,
        fraction: f32,
    ) -> Option<DamageOutcome> {
        let max = self.structure(id)?.max_health;
        self.set_structure_damage(id, segment, fraction * max)
    }

    /// Explosion-style damage: every damageable segment of the vessel within
    /// `range` of `world_point` takes damage falling off linearly with
    /// distance. Returns the total damage dealt.
    pub fn ranged_structure_damage(
        &mut self,
        vessel: VesselId,
        world_point: Vec2,
        range: f32,
        damage: f32,
    ) -> f32 {
        let Some(body) = self.vessel(vessel) else {
            return 0.0;
        };
        if range <= 0.0 {
            return 0.0;
        }
        let local = world_point - body.position;

        let mut hits = Vec::new();
        for id in &body.structures {
            let Some(structure) = self.structures.get(id.0) else {
                continue;
            };
            if !structure.is_damageable() {
                continue;
            }
            for (i, seg) in structure.segments.iter().enumerate() {
                let dist = seg.rect.closest_point(local).distance(local);
                if dist < range {
                    hits.push((*id, i, damage * (1.0 - dist / range)));
                }
            }
        }

        let mut total = 0.0;
        for (id, segment, amount) in hits {
            if self.apply_structure_damage(id, segment, amount).is_some() {
                total += amount;
            }
        }
        total
    }

    /// Damage the damageable segment closest to a vessel-local point
    fn damage_nearest_segment(&mut self, vessel: VesselId, local: Vec2, damage: f32) {
        let Some(body) = self.vessel(vessel) else {
            return;
        };
        let nearest = body
            .structures
            .iter()
            .filter_map(|id| self.structures.get(id.0).map(|s| (*id, s)))
            .filter(|(_, s)| s.is_damageable())
            .filter_map(|(id, s)| {
                let i = s.nearest_segment(local)?;
                Some((id, i, s.segments[i].rect.closest_point(local).distance_squared(local)))
            })
            .min_by(|a, b| a.2.total_cmp(&b.2));
        if let Some((id, segment, _)) = nearest {
            self.apply_structure_damage(id, segment, damage);
        }
    }

    // === Queries ===

    /// First solid structure fixture of a vessel crossed by the world-space
    /// segment `a -> b`
    pub fn cast_ray(&self, vessel: VesselId, a: Vec2, b: Vec2) -> Option<RayHit> {
        let body = self.vessel(vessel)?;
        let (la, lb) = (a - body.position, b - body.position);
        let mut best: Option<(StructureId, f32)> = None;
        for id in &body.structures {
            let Some(structure) = self.structures.get(id.0) else {
                continue;
            };
            for fixture in structure.solid_fixtures() {
                if let Some(t) = fixture.rect.segment_entry(la, lb)
                    && best.is_none_or(|(_, bt)| t < bt)
                {
                    best = Some((*id, t));
                }
            }
        }
        let (id, t) = best?;
        let local = la + (lb - la) * t;
        let segment = self.structure(id)?.find_segment_index(local, true)?;
        Some(RayHit {
            structure: id,
            segment,
            point: local + body.position,
            fraction: t,
        })
    }

    /// Fraction of the vessel's room volume that is flooded
    pub fn flood_ratio(&self, vessel: VesselId) -> f32 {
        let Some(body) = self.vessel(vessel) else {
            return 0.0;
        };
        let (water, volume) = body
            .rooms
            .iter()
            .filter_map(|id| self.rooms.get(id.0))
            .fold((0.0, 0.0), |(w, v), r| (w + r.volume(), v + r.full_volume()));
        if volume <= 0.0 { 0.0 } else { water / volume }
    }

    /// Bounding rect of all rooms of a vessel, vessel-local
    pub fn room_borders(&self, vessel: VesselId) -> Option<Rect> {
        self.vessel(vessel)?
            .rooms
            .iter()
            .filter_map(|id| self.rooms.get(id.0).map(|r| r.bounds))
            .reduce(|a, b| a.union(&b))
    }

    /// Rooms reachable from `start` through open room-to-room connectors,
    /// at most `depth` connectors away (start included)
    pub fn connected_rooms(&self, start: RoomId, depth: usize) -> Vec<RoomId> {
        if self.room(start).is_none() {
            return Vec::new();
        }
        let mut found = vec![start];
        let mut frontier = vec![start];
        for _ in 0..depth {
            let mut next = Vec::new();
            for room in &frontier {
                for other in self.open_neighbours(*room) {
                    if !found.contains(&other) {
                        found.push(other);
                        next.push(other);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        found
    }

    /// `(neighbour room, connector center)` through open connectors
    fn open_neighbours_with_gaps(&self, room: RoomId) -> Vec<(RoomId, Vec2)> {
        let Some(r) = self.room(room) else {
            return Vec::new();
        };
        r.connectors
            .iter()
            .filter_map(|id| self.connector(*id))
            .filter(|c| c.openness() > 0.0 && c.is_room_to_room())
            .filter_map(|c| {
                let other = c.rooms.iter().flatten().find(|r| **r != room)?;
                Some((*other, c.bounds.center()))
            })
            .collect()
    }

    fn open_neighbours(&self, room: RoomId) -> Vec<RoomId> {
        self.open_neighbours_with_gaps(room).into_iter().map(|(r, _)| r).collect()
    }

    /// Walking distance from `start_pos` in `from` to `end_pos` in `to`
    /// through open connectors, greedy depth-first. `None` when unreachable
    /// within `max_distance`.
    pub fn approximate_distance(
        &self,
        start_pos: Vec2,
        end_pos: Vec2,
        from: RoomId,
        to: RoomId,
        max_distance: f32,
    ) -> Option<f32> {
        let mut visited = vec![from];
        self.walk_distance(from, to, start_pos, end_pos, 0.0, max_distance, &mut visited)
    }

    #[allow(clippy::too_many_arguments)]
    fn walk_distance(
        &self,
        room: RoomId,
        target: RoomId,
        pos: Vec2,
        end_pos: Vec2,
        walked: f32,
        max_distance: f32,
        visited: &mut Vec<RoomId>,
    ) -> Option<f32> {
        if room == target {
            let total = walked + pos.distance(end_pos);
            return (total < max_distance).then_some(total);
        }
        for (other, gap) in self.open_neighbours_with_gaps(room) {
            if visited.contains(&other) {
                continue;
            }
            let distance = walked + pos.distance(gap);
            if distance >= max_distance {
                continue;
            }
            visited.push(other);
            if let Some(total) = self.walk_distance(other, target, gap, end_pos, distance, max_distance, visited) {
                return Some(total);
            }
        }
        None
    }

    /// Water push felt at a vessel-local position in a room
    pub fn flow_force_at(&self, room: RoomId, position: Vec2) -> Vec2 {
        let Some(r) = self.room(room) else {
            return Vec2::ZERO;
        };
        r.connectors
            .iter()
            .filter_map(|id| self.connector(*id))
            .filter(|c| c.openness() > 0.0)
            .map(|c| {
                let falloff = (position.distance_squared(c.bounds.center()) / 1000.0).max(1.0);
                c.lerped_flow_force() / falloff
            })
            .sum()
    }

    /// First open exterior connector near a vessel-local position that a
    /// character could pass through
    pub fn find_adjacent(&self, vessel: VesselId, position: Vec2, max_distance: f32) -> Option<ConnectorId> {
        self.connectors.iter().find_map(|(handle, c)| {
            if c.vessel != vessel || c.openness() <= 0.0 || !c.is_room_to_exterior() {
                return None;
            }
            if let Some((structure, segment)) = c.owner {
                let breached = self.structure(structure).is_some_and(|s| s.is_breached(segment));
                if !breached {
                    return None;
                }
            }
            c.spans(position, max_distance).then_some(ConnectorId(handle))
        })
    }

    // === Collisions ===

    /// React to a contact reported by the physics engine. Returns whether
    /// the bodies should collide (false lets a limb pass through a breach).
    pub fn handle_contact(&mut self, vessel: VesselId, contact: &Contact) -> bool {
        let Some(body) = self.vessel(vessel) else {
            return true;
        };
        let (velocity, mass, position) = (body.velocity, body.mass(), body.position);

        let response = match contact.other {
            ContactBody::Level => level_impact(velocity, contact.normal, &self.tuning),
            ContactBody::Vessel {
                mass: other_mass,
                velocity: other_velocity,
                ..
            } => vessel_impact(velocity, mass, other_velocity, other_mass, contact.normal, &self.tuning),
            ContactBody::Limb(limb) => {
                if limb.can_enter_vessels
                    && self
                        .find_adjacent(vessel, limb.position - position, self.tuning.limb_breach_distance)
                        .is_some()
                {
                    return false;
                }
                if let Some(r) = limb_impact(&limb, mass, contact.normal, &self.tuning)
                    && let Some(body) = self.vessel_mut(vessel)
                {
                    body.velocity += r.velocity_change;
                }
                return true;
            }
        };

        if let Some(r) = response {
            if let Some(body) = self.vessel_mut(vessel) {
                body.velocity += r.velocity_change;
            }
            self.emit(SimEvent::Impact {
                vessel,
                point: contact.point,
                impact: r.impact,
            });
            self.damage_nearest_segment(vessel, contact.point - position, r.damage);
        }
        true
    }

    // === Per-tick phases ===

    pub(crate) fn update_vessels(&mut self, dt: f32) {
        for handle in self.vessels.handles() {
            let id = VesselId(handle);
            let flood = self.flood_ratio(id);
            let Some(body) = self.vessels.get_mut(handle) else {
                continue;
            };
            body.update(dt, flood, &self.tuning);
            let Some(damage) = body.update_depth_damage(dt, &self.tuning) else {
                continue;
            };
            let range = self.tuning.depth_damage_range;

            let t: f32 = self.rng.random();
            let local = point_on_perimeter(body.hull_vertices(), t);
            let point = local + body.position;
            let dealt = self.ranged_structure_damage(id, point, range, damage);
            log::info!("Depth damage on {id:?} at {point:?}: {dealt:.1}");
            self.emit(SimEvent::DepthDamage {
                vessel: id,
                point,
                damage: dealt,
            });
        }
    }

    pub(crate) fn update_rooms(&mut self, dt: f32) {
        let deep: Vec<VesselId> = self
            .vessels
            .iter()
            .filter(|(_, v)| v.at_damage_depth())
            .map(|(h, _)| VesselId(h))
            .collect();
        for (_, room) in self.rooms.iter_mut() {
            room.update(dt, &self.tuning, deep.contains(&room.vessel));
        }
    }

    pub(crate) fn update_connectors(&mut self, dt: f32) {
        // Couple wave fields across open doors first
        for (_, c) in self.connectors.iter() {
            if let [Some(left), Some(right)] = c.rooms
                && let Some((l, r)) = self.rooms.get2_mut(left.0, right.0)
                && l.vessel == c.vessel
                && r.vessel == c.vessel
            {
                c.couple_surface_waves(l, r, &self.tuning);
            }
        }

        let plans: Vec<(ConnectorId, FlowPlan)> = self
            .connectors
            .iter()
            .map(|(handle, c)| {
                let origin = self.vessel_position(c.vessel);
                let views = c.rooms.map(|slot| {
                    slot.and_then(|id| {
                        let room = self.rooms.get(id.0)?;
                        let offset = self.vessel_position(room.vessel) - origin;
                        Some(RoomView::of(id, room, offset, room.vessel == c.vessel))
                    })
                });
                let plan = c.plan([views[0].as_ref(), views[1].as_ref()], dt, &self.tuning);
                (ConnectorId(handle), plan)
            })
            .collect();

        for (id, plan) in plans {
            let moved = plan.apply(&mut self.rooms);
            let Some(c) = self.connectors.get_mut(id.0) else {
                continue;
            };
            let lerped = c.record_flow(&plan, moved, dt, &self.tuning);
            if lerped.length_squared() <= self.tuning.splash_threshold {
                continue;
            }
            let center = c.bounds.center();
            let vessel = c.vessel;
            let target_full = plan
                .flow_target
                .and_then(|t| self.rooms.get(t.0))
                .is_none_or(|r| r.is_full());
            if !target_full {
                let position = center + self.vessel_position(vessel);
                self.emit(SimEvent::Splash {
                    connector: id,
                    position,
                    force: lerped,
                });
            }
        }
    }

    pub(crate) fn rebuild_dirty_structures(&mut self) {
        for (_, structure) in self.structures.iter_mut() {
            if structure.is_dirty() {
                structure.rebuild_fixtures();
            }
        }
    }
}
