//! Simulation tuning
//!
//! Rates and coefficients that shape how a vessel floods and breaks.
//! Loaded from JSON; any field missing from the file keeps its default.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors raised while loading a tuning file
#[derive(Debug)]
pub enum TuningError {
    /// The file could not be read
    Io(std::io::Error),
    /// The contents are not valid tuning JSON
    Parse(serde_json::Error),
    /// A field holds a value the simulation cannot use
    Invalid { field: &'static str, value: f32 },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Io(e) => write!(f, "failed to read tuning file: {e}"),
            TuningError::Parse(e) => write!(f, "failed to parse tuning JSON: {e}"),
            TuningError::Invalid { field, value } => {
                write!(f, "tuning field `{field}` has unusable value {value}")
            }
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Io(e) => Some(e),
            TuningError::Parse(e) => Some(e),
            TuningError::Invalid { .. } => None,
        }
    }
}

impl From<std::io::Error> for TuningError {
    fn from(e: std::io::Error) -> Self {
        TuningError::Io(e)
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(e: serde_json::Error) -> Self {
        TuningError::Parse(e)
    }
}

/// Tunable simulation coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Rooms ===
    /// Oxygen lost per second in every room
    pub oxygen_deterioration_rate: f32,
    /// Max oxygen moved through one connector per update
    pub oxygen_distribution_rate: f32,
    pub wave_stiffness: f32,
    pub wave_spread: f32,
    pub wave_damping: f32,
    /// AI sound range lost per second
    pub sound_range_decay: f32,
    pub lethal_pressure_decay: f32,
    pub lethal_pressure_growth: f32,
    /// Lethal pressure growth in a flooded room below the damage depth
    pub lethal_pressure_growth_at_depth: f32,

    // === Connectors ===
    /// Rate at which the smoothed flow force follows the raw one
    pub flow_force_lerp_rate: f32,
    /// Squared smoothed flow force above which a splash is reported
    pub splash_threshold: f32,

    // === Structures ===
    /// Max health given to walls that don't specify one
    pub wall_max_health: f32,
    /// Mass per unit of wall area
    pub wall_density: f32,
    /// Mass per unit of room area
    pub room_density: f32,

    // === Vessel body ===
    /// Flooded fraction at which a vessel neither rises nor sinks
    pub neutral_ballast: f32,
    pub horizontal_drag: f32,
    pub vertical_drag: f32,
    pub max_drag: f32,
    /// Attached mass that adds 1.0 to both drag coefficients
    pub attached_mass_drag_scale: f32,
    pub max_velocity: f32,

    // === Depth damage ===
    /// Depth below the damage threshold that doubles the timer rate
    pub depth_timer_scale: f32,
    pub depth_damage_base: f32,
    pub depth_damage_range: f32,

    // === Collisions ===
    /// Impacts weaker than this are ignored
    pub min_collision_impact: f32,
    pub impact_damage_multiplier: f32,
    /// Limbs lighter than this don't push the vessel
    pub min_limb_impact_mass: f32,
    /// Search distance for a breach a limb could pass through
    pub limb_breach_distance: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            // Rooms
            oxygen_deterioration_rate: 0.3,
            oxygen_distribution_rate: 500.0,
            wave_stiffness: 0.02,
            wave_spread: 0.05,
            wave_damping: 0.05,
            sound_range_decay: 1000.0,
            lethal_pressure_decay: 10.0,
            lethal_pressure_growth: 10.0,
            lethal_pressure_growth_at_depth: 100.0,

            // Connectors
            flow_force_lerp_rate: 5.0,
            splash_threshold: 20000.0,

            // Structures
            wall_max_health: 100.0,
            wall_density: 1.0,
            room_density: 0.05,

            // Vessel body
            neutral_ballast: 0.07,
            horizontal_drag: 0.01,
            vertical_drag: 0.05,
            max_drag: 0.1,
            attached_mass_drag_scale: 5000.0,
            max_velocity: 2000.0,

            // Depth damage
            depth_timer_scale: 10000.0,
            depth_damage_base: 10.0,
            depth_damage_range: 500.0,

            // Collisions
            min_collision_impact: 3.0,
            impact_damage_multiplier: 10.0,
            min_limb_impact_mass: 10.0,
            limb_breach_distance: 500.0,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning JSON
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Every coefficient must be finite and non-negative; the timer scale
    /// and max velocity must be positive
    pub fn validate(&self) -> Result<(), TuningError> {
        let fields = [
            ("oxygen_deterioration_rate", self.oxygen_deterioration_rate),
            ("oxygen_distribution_rate", self.oxygen_distribution_rate),
            ("wave_stiffness", self.wave_stiffness),
            ("wave_spread", self.wave_spread),
            ("wave_damping", self.wave_damping),
            ("sound_range_decay", self.sound_range_decay),
            ("lethal_pressure_decay", self.lethal_pressure_decay),
            ("lethal_pressure_growth", self.lethal_pressure_growth),
            ("lethal_pressure_growth_at_depth", self.lethal_pressure_growth_at_depth),
            ("flow_force_lerp_rate", self.flow_force_lerp_rate),
            ("splash_threshold", self.splash_threshold),
            ("wall_max_health", self.wall_max_health),
            ("wall_density", self.wall_density),
            ("room_density", self.room_density),
            ("neutral_ballast", self.neutral_ballast),
            ("horizontal_drag", self.horizontal_drag),
            ("vertical_drag", self.vertical_drag),
            ("max_drag", self.max_drag),
            ("attached_mass_drag_scale", self.attached_mass_drag_scale),
            ("max_velocity", self.max_velocity),
            ("depth_timer_scale", self.depth_timer_scale),
            ("depth_damage_base", self.depth_damage_base),
            ("depth_damage_range", self.depth_damage_range),
            ("min_collision_impact", self.min_collision_impact),
            ("impact_damage_multiplier", self.impact_damage_multiplier),
            ("min_limb_impact_mass", self.min_limb_impact_mass),
            ("limb_breach_distance", self.limb_breach_distance),
        ];
        for (field, value) in fields {
            if !crate::is_valid(value) || value < 0.0 {
                return Err(TuningError::Invalid { field, value });
            }
        }
        for (field, value) in [
            ("depth_timer_scale", self.depth_timer_scale),
            ("max_velocity", self.max_velocity),
            ("attached_mass_drag_scale", self.attached_mass_drag_scale),
        ] {
            if value <= 0.0 {
                return Err(TuningError::Invalid { field, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "wave_stiffness": 0.04, "max_velocity": 500.0 }"#).unwrap();
        assert_eq!(tuning.wave_stiffness, 0.04);
        assert_eq!(tuning.max_velocity, 500.0);
        assert_eq!(tuning.oxygen_deterioration_rate, 0.3);
        assert_eq!(tuning.neutral_ballast, 0.07);
    }

    #[test]
    fn test_json_round_trip() {
        let tuning = Tuning::default();
        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = Tuning::from_json(r#"{ "wave_damping": -1.0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "wave_damping", .. }));

        let err = Tuning::from_json(r#"{ "depth_timer_scale": 0.0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "depth_timer_scale", .. }));

        assert!(matches!(Tuning::from_json("not json"), Err(TuningError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = Tuning::load("/nonexistent/bulkhead-tuning.json").unwrap_err();
        assert!(matches!(err, TuningError::Io(_)));
        assert!(err.to_string().starts_with("failed to read"));
    }
}
