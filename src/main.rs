//! Bulkhead - headless runner
//!
//! Builds a small demo vessel, punches a hole in its hull and logs how the
//! water spreads through the rooms.
//!
//! Usage: `bulkhead [tuning.json] [seconds]`

#[cfg(not(target_arch = "wasm32"))]
use std::process::ExitCode;

#[cfg(not(target_arch = "wasm32"))]
use bulkhead::Tuning;
#[cfg(not(target_arch = "wasm32"))]
use bulkhead::consts::SIM_DT;
#[cfg(not(target_arch = "wasm32"))]
use bulkhead::sim::{Orientation, Rect, RoomId, SimEvent, StructureId, TickInput, VesselId, World, tick};
#[cfg(not(target_arch = "wasm32"))]
use glam::Vec2;

#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_SECONDS: u32 = 20;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> ExitCode {
    env_logger::init();
    log::info!("Bulkhead (headless) starting...");

    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => match Tuning::load(&path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Could not load tuning from {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => Tuning::default(),
    };
    let seconds = args.next().and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_SECONDS);

    let seed = 0x5eed;
    let mut world = World::new(seed, tuning);
    let Some((vessel, rooms, hull)) = build_demo_vessel(&mut world) else {
        log::error!("Failed to build the demo vessel");
        return ExitCode::FAILURE;
    };

    // Half-breach the lower hull under the stern room
    let damage = world.tuning.wall_max_health * 0.75;
    world.apply_structure_damage(hull, 0, damage);
    log::info!("Hull damaged, running {seconds}s of simulation");

    let ticks_per_second = (1.0 / SIM_DT).round() as u32;
    let input = TickInput::default();
    for second in 1..=seconds {
        for _ in 0..ticks_per_second {
            tick(&mut world, &input, SIM_DT);
        }
        log_second(&mut world, vessel, &rooms, second);
    }

    match world.snapshot_vessel(vessel).map(|s| s.to_json()) {
        Some(Ok(json)) => log::debug!("Final snapshot:\n{json}"),
        Some(Err(e)) => log::warn!("Could not encode final snapshot: {e}"),
        None => {}
    }
    ExitCode::SUCCESS
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host on wasm; nothing to run here
}

/// Three rooms in a row inside a 16-unit hull, doors between them
#[cfg(not(target_arch = "wasm32"))]
fn build_demo_vessel(world: &mut World) -> Option<(VesselId, Vec<RoomId>, StructureId)> {
    let vessel = world.add_vessel(Vec2::new(0.0, -2000.0))?;

    let mut rooms = Vec::new();
    for i in 0..3 {
        let x = 16.0 + i as f32 * 192.0;
        rooms.push(world.add_room(vessel, Rect::new(x, 192.0, 192.0, 192.0))?);
    }

    let floor = world.add_wall(vessel, Rect::new(0.0, 0.0, 608.0, 16.0))?;
    world.add_wall(vessel, Rect::new(0.0, 208.0, 608.0, 16.0))?;
    world.add_wall(vessel, Rect::new(0.0, 192.0, 16.0, 192.0))?;
    world.add_wall(vessel, Rect::new(592.0, 192.0, 16.0, 192.0))?;

    for x in [200.0, 392.0] {
        world.add_wall(vessel, Rect::new(x, 192.0, 16.0, 192.0))?;
        world.add_connector(vessel, Rect::new(x, 96.0, 16.0, 96.0), Orientation::Horizontal, 1.0)?;
    }

    log::info!(
        "Demo vessel ready: {} rooms, mass {:.0}",
        rooms.len(),
        world.vessel(vessel).map(|v| v.mass()).unwrap_or(0.0)
    );
    Some((vessel, rooms, floor))
}

#[cfg(not(target_arch = "wasm32"))]
fn log_second(world: &mut World, vessel: VesselId, rooms: &[RoomId], second: u32) {
    let levels: Vec<String> = rooms
        .iter()
        .filter_map(|id| world.room(*id))
        .map(|r| format!("{:5.1}%", r.water_percentage()))
        .collect();
    let depth = world.vessel(vessel).map(|v| v.position.y).unwrap_or(0.0);
    log::info!(
        "t={second:3}s  water [{}]  flooded {:4.1}%  y {depth:.0}",
        levels.join(", "),
        world.flood_ratio(vessel) * 100.0
    );

    for event in world.drain_events() {
        match event {
            SimEvent::BreachOpened { structure, segment, .. } => {
                log::info!("Breach opened in {structure:?} segment {segment}")
            }
            SimEvent::BreachSealed { structure, segment, .. } => {
                log::info!("Breach sealed in {structure:?} segment {segment}")
            }
            SimEvent::DepthDamage { damage, .. } => log::warn!("Crush depth damage: {damage:.1}"),
            SimEvent::Impact { impact, .. } => log::warn!("Impact: {impact:.1}"),
            SimEvent::Splash { .. } | SimEvent::StructureDamaged { .. } => {}
        }
    }
}
