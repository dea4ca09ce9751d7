//! Fixed timestep simulation tick
//!
//! Advances the world deterministically: vessel physics and depth damage,
//! then every room, then every connector (plan all, apply all), then the
//! fixture rebuild of structures whose segment states changed.

use glam::Vec2;

use super::collision::Contact;
use super::entity::VesselId;
use super::state::World;
use crate::consts::{MAX_SUBSTEPS, SIM_DT};

/// Frame times above this are clamped before they reach the accumulator
const MAX_FRAME_DT: f32 = 0.1;

/// External input for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Contacts reported by the physics engine since the last tick
    pub contacts: Vec<(VesselId, Contact)>,
    /// Forces to accumulate on vessel bodies (engines, tow cables)
    pub forces: Vec<(VesselId, Vec2)>,
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, input: &TickInput, dt: f32) {
    for (vessel, contact) in &input.contacts {
        world.handle_contact(*vessel, contact);
    }
    for (vessel, force) in &input.forces {
        match world.vessel_mut(*vessel) {
            Some(body) => body.apply_force(*force),
            None => log::warn!("Force for missing vessel {vessel:?} ignored"),
        }
    }

    world.update_vessels(dt);
    world.update_rooms(dt);
    world.update_connectors(dt);
    world.rebuild_dirty_structures();

    world.tick_count += 1;
}

/// Run as many fixed ticks as the accumulated frame time allows. The input
/// is consumed by the first substep. Returns the number of ticks run.
pub fn advance(world: &mut World, accumulator: &mut f32, frame_dt: f32, input: &mut TickInput) -> u32 {
    *accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

    let mut substeps = 0;
    while *accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
        tick(world, input, SIM_DT);
        *accumulator -= SIM_DT;
        substeps += 1;

        // Contacts and forces are one-shot
        input.contacts.clear();
        input.forces.clear();
    }
    if substeps == MAX_SUBSTEPS && *accumulator >= SIM_DT {
        log::debug!("Simulation falling behind, dropping {:.3}s", *accumulator);
        *accumulator = 0.0;
    }
    substeps
}
