//! Contact response for vessel bodies
//!
//! The physics engine's narrow phase hands the world plain `Contact` values.
//! This module turns them into impacts: how hard the hit was, how the
//! vessel's velocity changes and how much structural damage it deals. The
//! world decides which segment takes the damage.

use glam::Vec2;

use super::entity::VesselId;
use crate::Tuning;

/// A touching point between a vessel and something else, in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub point: Vec2,
    /// Unit normal pointing from the other body toward the vessel
    pub normal: Vec2,
    pub other: ContactBody,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactBody {
    /// Level geometry (static)
    Level,
    /// A character limb
    Limb(LimbContact),
    /// Another vessel
    Vessel {
        id: VesselId,
        mass: f32,
        velocity: Vec2,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimbContact {
    pub mass: f32,
    pub velocity: Vec2,
    pub position: Vec2,
    /// Characters that can climb through breaches into the vessel
    pub can_enter_vessels: bool,
}

/// Outcome of a hit on the vessel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactResponse {
    /// Closing speed along the normal, scaled by the mass ratio for vessels
    pub impact: f32,
    pub velocity_change: Vec2,
    /// Structural damage to deal at the contact point
    pub damage: f32,
}

/// Vessel hitting static level geometry. The velocity into the surface is
/// removed entirely.
pub fn level_impact(velocity: Vec2, normal: Vec2, tuning: &Tuning) -> Option<ImpactResponse> {
    let impact = velocity.dot(-normal);
    if impact < tuning.min_collision_impact {
        return None;
    }
    Some(ImpactResponse {
        impact,
        velocity_change: normal * impact,
        damage: impact * tuning.impact_damage_multiplier,
    })
}

/// Vessel hitting another vessel. The lighter vessel takes the larger share.
pub fn vessel_impact(
    velocity: Vec2,
    mass: f32,
    other_velocity: Vec2,
    other_mass: f32,
    normal: Vec2,
    tuning: &Tuning,
) -> Option<ImpactResponse> {
    let total = mass + other_mass;
    if total <= 0.0 {
        return None;
    }
    let closing = (velocity - other_velocity).dot(-normal);
    let impact = closing * other_mass / total;
    if impact < tuning.min_collision_impact {
        return None;
    }
    Some(ImpactResponse {
        impact,
        velocity_change: normal * impact,
        damage: impact * tuning.impact_damage_multiplier,
    })
}

/// Push from a heavy limb: moves the vessel but never damages it
pub fn limb_impact(limb: &LimbContact, vessel_mass: f32, normal: Vec2, tuning: &Tuning) -> Option<ImpactResponse> {
    if limb.mass <= tuning.min_limb_impact_mass || vessel_mass <= 0.0 {
        return None;
    }
    // The limb moves along the normal when it pushes into the vessel
    let closing = limb.velocity.dot(normal);
    if closing <= 0.0 {
        return None;
    }
    Some(ImpactResponse {
        impact: closing,
        velocity_change: normal * closing * limb.mass / vessel_mass,
        damage: 0.0,
    })
}
