//! Connectors: apertures between two rooms or between a room and the sea
//!
//! Water moves in two phases so that the result doesn't depend on the order
//! connectors are visited in:
//! - `Connector::plan` reads a snapshot of its endpoint rooms (`RoomView`)
//!   and describes what it wants to move
//! - `FlowPlan::apply` moves it, re-clamping every amount against the live
//!   room state, so water is never created or destroyed between rooms

use glam::Vec2;

use super::arena::Arena;
use super::entity::{EntityKind, Linkable, Positioned, RoomId, StructureId, VesselId};
use super::geometry::{Orientation, Rect};
use super::room::Room;
use crate::consts::MAX_COMPRESS;
use crate::{Tuning, is_valid};

/// Pressure-driven flow multiplier for horizontal room-to-room apertures
pub const HORIZONTAL_FLOW_RATE: f32 = 5.0;
/// Upward flow per second when a pressurized lower room pushes back
pub const VERTICAL_BACKFLOW_RATE: f32 = 8000.0;
/// Downward flow per second through a floor hatch
pub const VERTICAL_DRAIN_RATE: f32 = 25000.0;
/// Pressure gained per update by a room the sea keeps pushing into
pub const OVERFULL_PRESSURE_STEP: f32 = 0.5;
/// Room-to-room transfers above this make waves at the aperture
const WAVE_KICK_TRANSFER: f32 = 100.0;
/// Surfaces closer than this snap together across a horizontal aperture
const WAVE_SNAP_DIFF: f32 = 32.0;

#[derive(Debug, Clone)]
pub struct Connector {
    pub bounds: Rect,
    pub orientation: Orientation,
    openness: f32,
    /// Horizontal: `[left, right]`, vertical: `[upper, lower]`. A single
    /// room always sits in the first slot.
    pub rooms: [Option<RoomId>; 2],
    /// Wall segment this connector is a breach of
    pub owner: Option<(StructureId, usize)>,
    pub vessel: VesselId,
    flow_force: Vec2,
    lerped_flow_force: Vec2,
    flow_target: Option<RoomId>,
}

impl Connector {
    pub fn new(bounds: Rect, orientation: Orientation, vessel: VesselId) -> Self {
        Self {
            bounds,
            orientation,
            openness: 0.0,
            rooms: [None, None],
            owner: None,
            vessel,
            flow_force: Vec2::ZERO,
            lerped_flow_force: Vec2::ZERO,
            flow_target: None,
        }
    }

    #[inline]
    pub fn openness(&self) -> f32 {
        self.openness
    }

    pub fn set_openness(&mut self, openness: f32) {
        if is_valid(openness) {
            self.openness = openness.clamp(0.0, 1.0);
        }
    }

    #[inline]
    pub fn is_horizontal(&self) -> bool {
        self.orientation == Orientation::Horizontal
    }

    pub fn is_room_to_room(&self) -> bool {
        self.rooms[0].is_some() && self.rooms[1].is_some()
    }

    pub fn is_room_to_exterior(&self) -> bool {
        self.rooms[0].is_some() != self.rooms[1].is_some()
    }

    /// Aperture size across the flow direction
    pub fn span(&self) -> f32 {
        match self.orientation {
            Orientation::Horizontal => self.bounds.height,
            Orientation::Vertical => self.bounds.width,
        }
    }

    pub fn flow_force(&self) -> Vec2 {
        self.flow_force
    }

    pub fn lerped_flow_force(&self) -> Vec2 {
        self.lerped_flow_force
    }

    pub fn flow_target(&self) -> Option<RoomId> {
        self.flow_target
    }

    /// Store endpoint rooms; a lone room always goes in the first slot
    pub fn link(&mut self, first: Option<RoomId>, second: Option<RoomId>) {
        self.rooms = match (first, second) {
            (None, Some(room)) => [Some(room), None],
            (a, b) if a.is_some() && a == b => [a, None],
            (a, b) => [a, b],
        };
    }

    pub fn unlink_room(&mut self, room: RoomId) {
        let remaining: Vec<RoomId> = self.rooms.iter().flatten().copied().filter(|r| *r != room).collect();
        self.link(remaining.first().copied(), remaining.get(1).copied());
    }

    /// Whether the aperture covers `pos` along its long axis and lies within
    /// `max_dist` of it across
    pub fn spans(&self, pos: Vec2, max_dist: f32) -> bool {
        let center = self.bounds.center();
        match self.orientation {
            Orientation::Horizontal => {
                pos.y >= self.bounds.bottom()
                    && pos.y <= self.bounds.top()
                    && (pos.x - center.x).abs() <= max_dist
            }
            Orientation::Vertical => {
                pos.x >= self.bounds.left()
                    && pos.x <= self.bounds.right()
                    && (pos.y - center.y).abs() <= max_dist
            }
        }
    }

    /// Describe this update's water and oxygen movement against a snapshot
    /// of the endpoint rooms
    pub fn plan(&self, rooms: [Option<&RoomView>; 2], dt: f32, tuning: &Tuning) -> FlowPlan {
        let mut plan = FlowPlan::default();
        if self.openness <= 0.0 {
            return plan;
        }
        match rooms {
            [Some(a), Some(b)] => {
                plan.oxygen = self.plan_oxygen(a, b, tuning);
                if self.is_horizontal() {
                    self.plan_horizontal(a, b, &mut plan);
                } else {
                    self.plan_vertical(a, b, dt, &mut plan);
                }
                if a.is_full && b.is_full {
                    plan.share_lethal = Some((a.id, b.id));
                }
            }
            [Some(room), None] | [None, Some(room)] => self.plan_exterior(room, dt, &mut plan),
            [None, None] => return plan,
        }
        plan.active = true;
        plan
    }

    fn plan_oxygen(&self, a: &RoomView, b: &RoomView, tuning: &Tuning) -> Option<OxygenTransfer> {
        // Water above the aperture top blocks air exchange
        if self.is_horizontal() && a.right_edge.max(b.left_edge) > self.bounds.top() {
            return None;
        }
        let total_volume = a.full_volume + b.full_volume;
        if total_volume <= 0.0 {
            return None;
        }
        let total = a.oxygen + b.oxygen;
        let delta = (total * a.full_volume / total_volume - a.oxygen)
            .clamp(-tuning.oxygen_distribution_rate, tuning.oxygen_distribution_rate);
        Some(OxygenTransfer {
            gaining: a.id,
            losing: b.id,
            amount: delta,
        })
    }

    fn plan_exterior(&self, room: &RoomView, dt: f32, plan: &mut FlowPlan) {
        let delta = (MAX_COMPRESS * self.span() * self.openness * self.openness * dt)
            .min(room.capacity_left());
        plan.flow_target = Some(room.id);
        plan.exterior_pressure = Some(room.id);

        let center = self.bounds.center();
        let room_center = room.bounds.center();
        plan.force_direction = match self.orientation {
            Orientation::Horizontal if center.x > room_center.x => Vec2::NEG_X,
            Orientation::Horizontal => Vec2::X,
            Orientation::Vertical if center.y > room_center.y => Vec2::NEG_Y,
            Orientation::Vertical => Vec2::Y,
        };

        if delta > 0.0 {
            plan.water = Some(WaterTransfer {
                from: None,
                to: room.id,
                amount: delta,
            });
        }

        // Water jetting in from the side makes waves on that side
        if self.is_horizontal() && !room.is_full && room.surface < self.bounds.top() {
            let (i1, i2) = if center.x > room_center.x {
                (room.wave_samples - 1, room.wave_samples.saturating_sub(2))
            } else {
                (0, 1.min(room.wave_samples - 1))
            };
            let edge = if i1 == 0 { room.left_edge } else { room.right_edge };
            let strength = (delta / 200.0).min(1.0);
            let velocity = (center.y - edge) * strength;
            if velocity > 0.0 {
                plan.wave_kicks.push((room.id, i1, velocity * dt));
                plan.wave_kicks.push((room.id, i2, velocity * dt));
            }
        }
    }

    fn plan_horizontal(&self, left: &RoomView, right: &RoomView, plan: &mut FlowPlan) {
        if left.volume <= 0.0 && right.volume <= 0.0 {
            return;
        }
        let higher = left.right_edge.max(right.left_edge);
        if higher <= self.bounds.bottom() {
            return;
        }

        let size_factor = self.span() / 100.0 * self.openness;
        let (src, dst, direction) = if left.pressure > right.pressure {
            (left, right, Vec2::X)
        } else {
            (right, left, Vec2::NEG_X)
        };
        plan.flow_target = Some(dst.id);
        plan.force_direction = direction;
        if src.volume <= 0.0 {
            return;
        }

        let delta = ((src.pressure - dst.pressure) * HORIZONTAL_FLOW_RATE * size_factor)
            .min(src.volume.min(src.full_volume))
            .min(dst.capacity_left());
        if delta <= 0.0 {
            return;
        }
        plan.water = Some(WaterTransfer {
            from: Some(src.id),
            to: dst.id,
            amount: delta,
        });
        plan.overfull_pressure = Some((dst.id, (dst.pressure + src.pressure) / 2.0));

        if delta > WAVE_KICK_TRANSFER && left.same_vessel && right.same_vessel {
            let average = (left.surface + right.surface) / 2.0;
            let top = self.bounds.top();
            if !left.is_full && left.right_edge < top {
                let v = (average - left.right_edge) * 0.1;
                let last = left.wave_samples - 1;
                plan.wave_kicks.push((left.id, last, v));
                plan.wave_kicks.push((left.id, last.saturating_sub(1), v));
            }
            if !right.is_full && right.left_edge < top {
                let v = (average - right.left_edge) * 0.1;
                plan.wave_kicks.push((right.id, 0, v));
                plan.wave_kicks.push((right.id, 1.min(right.wave_samples - 1), v));
            }
        }
    }

    fn plan_vertical(&self, upper: &RoomView, lower: &RoomView, dt: f32, plan: &mut FlowPlan) {
        let size_factor = self.span() / 100.0 * self.openness;
        if lower.pressure > upper.pressure && lower.volume > 0.0 {
            let delta = (lower.volume - lower.full_volume + MAX_COMPRESS)
                .min(VERTICAL_BACKFLOW_RATE * size_factor * dt)
                .min(upper.capacity_left())
                .max(0.0);
            plan.flow_target = Some(upper.id);
            plan.force_direction = Vec2::Y;
            if delta > 0.0 {
                plan.water = Some(WaterTransfer {
                    from: Some(lower.id),
                    to: upper.id,
                    amount: delta,
                });
                plan.overfull_pressure = Some((upper.id, (upper.pressure + lower.pressure) / 2.0));
            }
        } else if upper.volume > 0.0 {
            let delta = upper
                .volume
                .min(VERTICAL_DRAIN_RATE * size_factor * dt)
                .min(lower.capacity_left());
            plan.flow_target = Some(lower.id);
            plan.force_direction = Vec2::NEG_Y;
            if delta > 0.0 {
                plan.water = Some(WaterTransfer {
                    from: Some(upper.id),
                    to: lower.id,
                    amount: delta,
                });
                plan.overfull_pressure = Some((lower.id, (upper.pressure + lower.pressure) / 2.0));
            }
        }
    }

    /// Store the applied flow and smooth it. Returns the smoothed force.
    pub fn record_flow(&mut self, plan: &FlowPlan, applied: f32, dt: f32, tuning: &Tuning) -> Vec2 {
        if !plan.active {
            self.flow_force = Vec2::ZERO;
            self.lerped_flow_force = Vec2::ZERO;
            return Vec2::ZERO;
        }
        self.flow_target = plan.flow_target;
        self.flow_force = plan.force_direction * applied;
        self.lerped_flow_force = crate::lerp_vec(
            self.lerped_flow_force,
            self.flow_force,
            tuning.flow_force_lerp_rate * dt,
        );
        self.lerped_flow_force
    }

    /// Couple the wave samples on either side of an open horizontal aperture
    /// between `left` and `right`
    pub fn couple_surface_waves(&self, left: &mut Room, right: &mut Room, tuning: &Tuning) {
        if !self.is_horizontal() || self.openness <= 0.0 {
            return;
        }
        let within = |s: f32| s <= self.bounds.top() && s >= self.bounds.bottom();
        if !within(left.surface()) || !within(right.surface()) {
            return;
        }

        let diff = (left.surface() - right.surface()) * self.openness;
        let last = left.wave_height.len() - 1;
        for _ in 0..2 {
            let d = tuning.wave_spread * (right.wave_height[0] - left.wave_height[last] - diff) * 0.5;
            left.wave_velocity[last] += d;
            left.wave_height[last] += d;

            let d = tuning.wave_spread * (left.wave_height[last] - right.wave_height[0] + diff) * 0.5;
            right.wave_velocity[0] += d;
            right.wave_height[0] += d;
        }
        if diff.abs() < WAVE_SNAP_DIFF {
            right.wave_height[0] = diff * 0.5;
            left.wave_height[last] = -diff * 0.5;
        }
    }
}

impl Positioned for Connector {
    fn rect(&self) -> Rect {
        self.bounds
    }
}

impl Linkable for Connector {
    fn linked(&self) -> Vec<EntityKind> {
        let mut linked: Vec<EntityKind> = self.rooms.iter().flatten().map(|r| EntityKind::Room(*r)).collect();
        if let Some((structure, _)) = self.owner {
            linked.push(EntityKind::Structure(structure));
        }
        linked
    }
}

/// Read-only copy of the room state a connector plans against, expressed in
/// the connector's vessel frame
#[derive(Debug, Clone, Copy)]
pub struct RoomView {
    pub id: RoomId,
    pub bounds: Rect,
    pub volume: f32,
    pub full_volume: f32,
    pub pressure: f32,
    pub surface: f32,
    /// Surface plus the leftmost wave sample
    pub left_edge: f32,
    /// Surface plus the rightmost wave sample
    pub right_edge: f32,
    pub oxygen: f32,
    pub is_full: bool,
    pub wave_samples: usize,
    /// The room belongs to the connector's vessel
    pub same_vessel: bool,
}

impl RoomView {
    /// Snapshot `room`, shifted by `offset` into the connector's frame
    pub fn of(id: RoomId, room: &Room, offset: Vec2, same_vessel: bool) -> Self {
        Self {
            id,
            bounds: room.bounds.translate(offset),
            volume: room.volume(),
            full_volume: room.full_volume(),
            pressure: room.pressure() + offset.y,
            surface: room.surface() + offset.y,
            left_edge: room.edge_surface(false) + offset.y,
            right_edge: room.edge_surface(true) + offset.y,
            oxygen: room.oxygen(),
            is_full: room.is_full(),
            wave_samples: room.wave_height.len(),
            same_vessel,
        }
    }

    pub fn capacity_left(&self) -> f32 {
        (self.full_volume + MAX_COMPRESS - self.volume).max(0.0)
    }
}

/// Water moved from a room (or the sea, when `from` is `None`) into a room
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterTransfer {
    pub from: Option<RoomId>,
    pub to: RoomId,
    pub amount: f32,
}

/// Oxygen moved from `losing` to `gaining` (negative amounts flow back)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OxygenTransfer {
    pub gaining: RoomId,
    pub losing: RoomId,
    pub amount: f32,
}

/// Everything one connector update wants to change
#[derive(Debug, Clone, Default)]
pub struct FlowPlan {
    /// False for closed or unlinked connectors
    pub active: bool,
    pub water: Option<WaterTransfer>,
    pub oxygen: Option<OxygenTransfer>,
    /// Room to pressurize if it ends up over full after the sea flows in
    pub exterior_pressure: Option<RoomId>,
    /// Destination room and the pressure it rises to if it ends up over full
    pub overfull_pressure: Option<(RoomId, f32)>,
    pub share_lethal: Option<(RoomId, RoomId)>,
    /// `(room, sample, velocity)`
    pub wave_kicks: Vec<(RoomId, usize, f32)>,
    pub force_direction: Vec2,
    pub flow_target: Option<RoomId>,
}

impl FlowPlan {
    /// Apply against the live rooms. Returns the amount of water moved.
    pub fn apply(&self, rooms: &mut Arena<Room>) -> f32 {
        if let Some(transfer) = self.oxygen {
            apply_oxygen(rooms, transfer);
        }

        let moved = self.water.map(|t| apply_water(rooms, t)).unwrap_or(0.0);

        if let Some(room) = self.exterior_pressure.and_then(|id| rooms.get_mut(id.0))
            && room.volume() > room.full_volume()
        {
            room.set_pressure(room.pressure() + OVERFULL_PRESSURE_STEP);
        }
        if let Some((id, pressure)) = self.overfull_pressure
            && let Some(room) = rooms.get_mut(id.0)
            && room.volume() > room.full_volume()
        {
            room.set_pressure(room.pressure().max(pressure));
        }

        if let Some((a, b)) = self.share_lethal
            && let Some((ra, rb)) = rooms.get2_mut(a.0, b.0)
            && ra.is_full()
            && rb.is_full()
        {
            let average = (ra.lethal_pressure() + rb.lethal_pressure()) / 2.0;
            ra.set_lethal_pressure(average);
            rb.set_lethal_pressure(average);
        }

        for (id, index, velocity) in &self.wave_kicks {
            if let Some(room) = rooms.get_mut(id.0) {
                room.kick_wave(*index, *velocity);
            }
        }
        moved
    }
}

fn apply_water(rooms: &mut Arena<Room>, transfer: WaterTransfer) -> f32 {
    let Some(to) = rooms.get(transfer.to.0) else {
        return 0.0;
    };
    let mut amount = transfer.amount.min(to.capacity_left());
    if let Some(from) = transfer.from {
        match rooms.get(from.0) {
            Some(room) => amount = amount.min(room.volume()),
            None => return 0.0,
        }
    }
    if !(amount > 0.0) {
        return 0.0;
    }

    if let Some(room) = transfer.from.and_then(|from| rooms.get_mut(from.0)) {
        room.set_volume(room.volume() - amount);
    }
    if let Some(room) = rooms.get_mut(transfer.to.0) {
        room.set_volume(room.volume() + amount);
    }
    amount
}

fn apply_oxygen(rooms: &mut Arena<Room>, transfer: OxygenTransfer) {
    let Some((gaining, losing)) = rooms.get2_mut(transfer.gaining.0, transfer.losing.0) else {
        return;
    };
    let low = (-gaining.oxygen()).max(losing.oxygen() - losing.full_volume());
    let high = (gaining.full_volume() - gaining.oxygen()).min(losing.oxygen());
    if low > high {
        return;
    }
    let amount = transfer.amount.clamp(low, high);
    gaining.set_oxygen(gaining.oxygen() + amount);
    losing.set_oxygen(losing.oxygen() - amount);
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

    fn arena_with(rooms: Vec<Room>) -> (Arena<Room>, Vec<RoomId>) {
        let mut arena = Arena::with_capacity_limit(16);
        let ids = rooms.into_iter().map(|r| RoomId(arena.insert(r).unwrap())).collect();
        (arena, ids)
    }

    fn views(arena: &Arena<Room>, ids: &[RoomId]) -> Vec<RoomView> {
        ids.iter()
            .map(|id| RoomView::of(*id, arena.get(id.0).unwrap(), Vec2::ZERO, true))
            .collect()
    }

    #[test]
    fn test_link_puts_single_room_first() {
        let (_, ids) = arena_with(vec![Room::new(Rect::new(0.0, 10.0, 10.0, 10.0), vessel())]);
        let mut c = Connector::new(Rect::new(0.0, 10.0, 2.0, 10.0), Orientation::Horizontal, vessel());
        c.link(None, Some(ids[0]));
        assert_eq!(c.rooms, [Some(ids[0]), None]);
        assert!(c.is_room_to_exterior());
        c.unlink_room(ids[0]);
        assert_eq!(c.rooms, [None, None]);
    }

    #[test]
    fn test_closed_exterior_connector_moves_nothing() {
        let (mut arena, ids) = arena_with(vec![Room::new(Rect::new(0.0, 100.0, 100.0, 100.0), vessel())]);
        arena.get_mut(ids[0].0).unwrap().set_volume(1234.5);
        let mut c = Connector::new(Rect::new(100.0, 100.0, 10.0, 100.0), Orientation::Horizontal, vessel());
        c.link(Some(ids[0]), None);
        let tuning = Tuning::default();
        for _ in 0..100 {
            let v = views(&arena, &ids);
            let plan = c.plan([Some(&v[0]), None], 1.0 / 60.0, &tuning);
            let moved = plan.apply(&mut arena);
            c.record_flow(&plan, moved, 1.0 / 60.0, &tuning);
        }
        assert_eq!(arena.get(ids[0].0).unwrap().volume(), 1234.5);
        assert_eq!(c.lerped_flow_force(), Vec2::ZERO);
    }

    #[test]
    fn test_exterior_inflow_points_into_room() {
        let (mut arena, ids) = arena_with(vec![Room::new(Rect::new(0.0, 100.0, 100.0, 100.0), vessel())]);
        let mut c = Connector::new(Rect::new(100.0, 100.0, 10.0, 50.0), Orientation::Horizontal, vessel());
        c.link(Some(ids[0]), None);
        c.set_openness(0.5);
        let tuning = Tuning::default();
        let dt = 1.0 / 60.0;
        let v = views(&arena, &ids);
        let plan = c.plan([Some(&v[0]), None], dt, &tuning);
        let moved = plan.apply(&mut arena);
        let expected = MAX_COMPRESS * 50.0 * 0.25 * dt;
        assert!((moved - expected).abs() < 1e-2);
        c.record_flow(&plan, moved, dt, &tuning);
        assert!(c.flow_force().x < 0.0);
        assert_eq!(c.flow_target(), Some(ids[0]));
    }

    #[test]
    fn test_exterior_inflow_pressurizes_full_room() {
        let (mut arena, ids) = arena_with(vec![Room::new(Rect::new(0.0, 100.0, 100.0, 100.0), vessel())]);
        arena.get_mut(ids[0].0).unwrap().set_volume(10000.0);
        let mut c = Connector::new(Rect::new(40.0, 2.0, 20.0, 4.0), Orientation::Vertical, vessel());
        c.link(Some(ids[0]), None);
        c.set_openness(1.0);
        let tuning = Tuning::default();
        let v = views(&arena, &ids);
        let plan = c.plan([Some(&v[0]), None], 1.0 / 60.0, &tuning);
        plan.apply(&mut arena);
        let room = arena.get(ids[0].0).unwrap();
        assert!((room.pressure() - 100.5).abs() < 1e-4);
        assert!(room.volume() <= room.max_volume());
    }

    #[test]
    fn test_horizontal_flow_conserves_volume() {
        let (mut arena, ids) = arena_with(vec![
            Room::new(Rect::new(0.0, 100.0, 100.0, 100.0), vessel()),
            Room::new(Rect::new(100.0, 100.0, 100.0, 100.0), vessel()),
        ]);
        arena.get_mut(ids[0].0).unwrap().set_volume(8000.0);
        let mut c = Connector::new(Rect::new(95.0, 100.0, 10.0, 100.0), Orientation::Horizontal, vessel());
        c.link(Some(ids[0]), Some(ids[1]));
        c.set_openness(1.0);
        let tuning = Tuning::default();
        for _ in 0..200 {
            for id in &ids {
                arena.get_mut(id.0).unwrap().update(1.0 / 60.0, &tuning, false);
            }
            let v = views(&arena, &ids);
            let plan = c.plan([Some(&v[0]), Some(&v[1])], 1.0 / 60.0, &tuning);
            plan.apply(&mut arena);
        }
        let a = arena.get(ids[0].0).unwrap().volume();
        let b = arena.get(ids[1].0).unwrap().volume();
        assert!((a + b - 8000.0).abs() < 0.5, "total {}", a + b);
        assert!((a - b).abs() < 100.0, "levels should even out: {a} vs {b}");
    }

    #[test]
    fn test_oxygen_diffuses_toward_equal_share() {
        let (mut arena, ids) = arena_with(vec![
            Room::new(Rect::new(0.0, 100.0, 100.0, 100.0), vessel()),
            Room::new(Rect::new(0.0, 0.0, 100.0, 100.0), vessel()),
        ]);
        arena.get_mut(ids[1].0).unwrap().set_oxygen(0.0);
        let mut c = Connector::new(Rect::new(40.0, 2.0, 20.0, 4.0), Orientation::Vertical, vessel());
        c.link(Some(ids[0]), Some(ids[1]));
        c.set_openness(1.0);
        let tuning = Tuning::default();
        let v = views(&arena, &ids);
        c.plan([Some(&v[0]), Some(&v[1])], 1.0 / 60.0, &tuning).apply(&mut arena);
        assert_eq!(arena.get(ids[0].0).unwrap().oxygen(), 9500.0);
        assert_eq!(arena.get(ids[1].0).unwrap().oxygen(), 500.0);
    }

    #[test]
    fn test_flooded_rooms_share_lethal_pressure() {
        let (mut arena, ids) = arena_with(vec![
            Room::new(Rect::new(0.0, 100.0, 100.0, 100.0), vessel()),
            Room::new(Rect::new(100.0, 100.0, 100.0, 100.0), vessel()),
        ]);
        for (id, lethal) in ids.iter().zip([80.0, 20.0]) {
            let room = arena.get_mut(id.0).unwrap();
            room.set_volume(10000.0);
            room.set_lethal_pressure(lethal);
        }
        let mut c = Connector::new(Rect::new(95.0, 100.0, 10.0, 100.0), Orientation::Horizontal, vessel());
        c.link(Some(ids[0]), Some(ids[1]));
        c.set_openness(1.0);
        let v = views(&arena, &ids);
        c.plan([Some(&v[0]), Some(&v[1])], 1.0 / 60.0, &Tuning::default())
            .apply(&mut arena);
        assert_eq!(arena.get(ids[0].0).unwrap().lethal_pressure(), 50.0);
        assert_eq!(arena.get(ids[1].0).unwrap().lethal_pressure(), 50.0);
    }

    #[test]
    fn test_spans() {
        let c = Connector::new(Rect::new(100.0, 100.0, 10.0, 50.0), Orientation::Horizontal, vessel());
        assert!(c.spans(Vec2::new(150.0, 75.0), 50.0));
        assert!(!c.spans(Vec2::new(160.0, 75.0), 50.0));
        assert!(!c.spans(Vec2::new(105.0, 120.0), 50.0));
    }
}
