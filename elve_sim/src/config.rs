// Data-driven game configuration.
//
// All tunable movement parameters live here in `GameConfig`, loaded from JSON
// at startup (`GameConfig::from_json`) or taken from `Default`. The sim never
// uses magic numbers for speeds, costs, or durations; it reads them from the
// config. Every section is `#[serde(default)]`, so a config file only needs
// the fields it overrides.
//
// Groups:
// - `PathingConfig`: the movement-kind -> cost table, the optional search
//   heuristic, and an optional expansion cap.
// - `LocomotionConfig`: speeds, animation durations, and the clinging-surface
//   offsets (wall standoff, corner lift) as fractions of a cell.
//
// `MotionParams` is the integer form of `LocomotionConfig` for one tick
// length: sub-cell steps per tick and tick counts per animation. The state
// machine only ever sees `MotionParams`, so it runs in exact integers.
//
// See also: `sim.rs` which owns the `GameConfig` as part of `SimState`,
// `nav.rs` for `MovementKind`, `body.rs` for `SUBCELL`.
//
// **Critical constraint: determinism.** Config values feed directly into
// simulation logic. The float -> integer conversion happens once, here.

use crate::body::SUBCELL;
use crate::nav::MovementKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Pathing
// ---------------------------------------------------------------------------

/// Search cost of each movement kind. Exactly one entry per kind; mounting
/// and dropping off a ledge are priced separately. Setting both ledge costs
/// to the same value gives a single shared ledge category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementCosts {
    pub walk: f32,
    pub climb_wall: f32,
    pub climb_over_ledge: f32,
    pub drop_down_from_ledge: f32,
}

impl MovementCosts {
    pub fn cost(&self, kind: MovementKind) -> f32 {
        match kind {
            MovementKind::Walk => self.walk,
            MovementKind::ClimbWall => self.climb_wall,
            MovementKind::ClimbOverLedge => self.climb_over_ledge,
            MovementKind::DropDownFromLedge => self.drop_down_from_ledge,
        }
    }

    /// All costs equal to `cost`.
    pub fn uniform(cost: f32) -> Self {
        Self {
            walk: cost,
            climb_wall: cost,
            climb_over_ledge: cost,
            drop_down_from_ledge: cost,
        }
    }
}

impl Default for MovementCosts {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

/// How the search orders its frontier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeuristicMode {
    /// Accumulated cost only. Paths are cost-optimal.
    #[default]
    Dijkstra,
    /// Accumulated cost plus squared straight-line distance to the target.
    /// Usually expands fewer nodes, but the bias can overestimate, so the
    /// returned path is not guaranteed to be the cheapest.
    SquaredEuclidean,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathingConfig {
    pub costs: MovementCosts,
    pub heuristic: HeuristicMode,
    /// Give up after expanding this many nodes. `None` searches until the
    /// frontier is exhausted.
    pub max_expansions: Option<usize>,
}

// ---------------------------------------------------------------------------
// Locomotion
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Cells per second along a floor or ceiling.
    pub walk_speed: f32,
    /// Cells per second along a wall.
    pub climb_speed: f32,
    /// Duration of a rotate-onto-another-surface animation.
    pub change_surface_ms: u32,
    /// Duration of a ledge crossing animation.
    pub cross_ledge_ms: u32,
    /// Gap, as a fraction of a cell, between an agent that just left a wall
    /// and that wall.
    pub wall_standoff: f32,
    /// Vertical nudge, as a fraction of a cell, applied when rotating from a
    /// floor or ceiling onto a wall so the body clears the corner.
    pub corner_lift: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            walk_speed: 1.0,
            climb_speed: 1.0,
            change_surface_ms: 400,
            cross_ledge_ms: 600,
            wall_standoff: 0.05,
            corner_lift: 0.1,
        }
    }
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Top-level configuration. Never mutated while the sim runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Wall-clock length of one simulation tick.
    pub tick_duration_ms: u32,
    pub pathing: PathingConfig,
    pub locomotion: LocomotionConfig,
    /// How long planting a seed takes once the Elve has arrived.
    pub plant_seed_ms: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_duration_ms: 100,
            pathing: PathingConfig::default(),
            locomotion: LocomotionConfig::default(),
            plant_seed_ms: 5000,
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_duration_ms == 0 {
            return Err(invalid("tick_duration_ms", "must be positive"));
        }

        let costs = &self.pathing.costs;
        for (field, value) in [
            ("pathing.costs.walk", costs.walk),
            ("pathing.costs.climb_wall", costs.climb_wall),
            ("pathing.costs.climb_over_ledge", costs.climb_over_ledge),
            (
                "pathing.costs.drop_down_from_ledge",
                costs.drop_down_from_ledge,
            ),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, format!("{value} is not a finite cost >= 0")));
            }
        }

        let loco = &self.locomotion;
        for (field, value) in [
            ("locomotion.walk_speed", loco.walk_speed),
            ("locomotion.climb_speed", loco.climb_speed),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(field, format!("{value} is not a positive speed")));
            }
        }
        for (field, value) in [
            ("locomotion.wall_standoff", loco.wall_standoff),
            ("locomotion.corner_lift", loco.corner_lift),
        ] {
            if !(0.0..0.5).contains(&value) {
                return Err(invalid(field, format!("{value} is outside [0, 0.5)")));
            }
        }
        Ok(())
    }

    /// Integer motion parameters for this config's tick length.
    pub fn motion(&self) -> MotionParams {
        MotionParams::new(&self.locomotion, self.tick_duration_ms)
    }
}

// ---------------------------------------------------------------------------
// MotionParams
// ---------------------------------------------------------------------------

/// `LocomotionConfig` converted to sub-cell units and tick counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MotionParams {
    /// Sub-cell units moved per tick while walking. In `1..=SUBCELL`.
    pub walk_step: i32,
    /// Sub-cell units moved per tick while climbing. In `1..=SUBCELL`.
    pub climb_step: i32,
    pub change_surface_ticks: u32,
    pub cross_ledge_ticks: u32,
    /// Wall standoff in sub-cell units.
    pub wall_standoff: i32,
    /// Corner lift in sub-cell units.
    pub corner_lift: i32,
    tick_duration_ms: u32,
}

impl MotionParams {
    pub fn new(loco: &LocomotionConfig, tick_duration_ms: u32) -> Self {
        let tick_ms = tick_duration_ms.max(1);
        let step = |speed: f32| {
            let per_tick = speed * tick_ms as f32 / 1000.0 * SUBCELL as f32;
            (per_tick.round() as i32).clamp(1, SUBCELL)
        };
        let subcell = |frac: f32| ((frac * SUBCELL as f32).round() as i32).clamp(0, SUBCELL / 2);
        Self {
            walk_step: step(loco.walk_speed),
            climb_step: step(loco.climb_speed),
            change_surface_ticks: ticks_for(loco.change_surface_ms, tick_ms),
            cross_ledge_ticks: ticks_for(loco.cross_ledge_ms, tick_ms),
            wall_standoff: subcell(loco.wall_standoff),
            corner_lift: subcell(loco.corner_lift),
            tick_duration_ms: tick_ms,
        }
    }

    /// Number of ticks a timed action of `ms` milliseconds lasts.
    pub fn ticks_for_ms(&self, ms: u32) -> u32 {
        ticks_for(ms, self.tick_duration_ms)
    }
}

impl Default for MotionParams {
    fn default() -> Self {
        GameConfig::default().motion()
    }
}

fn ticks_for(ms: u32, tick_ms: u32) -> u32 {
    ms.div_ceil(tick_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = GameConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored: GameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn default_config_is_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn config_loads_from_json_string() {
        let json = r#"{
            "tick_duration_ms": 50,
            "pathing": {
                "costs": {
                    "walk": 1.0,
                    "climb_wall": 2.0,
                    "climb_over_ledge": 3.0,
                    "drop_down_from_ledge": 1.5
                },
                "heuristic": "SquaredEuclidean",
                "max_expansions": 10000
            },
            "locomotion": {
                "walk_speed": 2.0,
                "climb_speed": 0.5,
                "change_surface_ms": 200,
                "cross_ledge_ms": 300,
                "wall_standoff": 0.05,
                "corner_lift": 0.1
            },
            "plant_seed_ms": 2500
        }"#;
        let config = GameConfig::from_json(json).unwrap();
        assert_eq!(config.tick_duration_ms, 50);
        assert_eq!(config.pathing.costs.cost(MovementKind::ClimbWall), 2.0);
        assert_eq!(config.pathing.costs.cost(MovementKind::DropDownFromLedge), 1.5);
        assert_eq!(config.pathing.heuristic, HeuristicMode::SquaredEuclidean);
        assert_eq!(config.pathing.max_expansions, Some(10000));
        assert_eq!(config.plant_seed_ms, 2500);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = GameConfig::from_json(r#"{ "pathing": { "costs": { "walk": 4.0 } } }"#)
            .unwrap();
        assert_eq!(config.pathing.costs.walk, 4.0);
        assert_eq!(config.pathing.costs.climb_wall, 1.0);
        assert_eq!(config.pathing.heuristic, HeuristicMode::Dijkstra);
        assert_eq!(config.tick_duration_ms, 100);
    }

    #[test]
    fn rejects_bad_values() {
        let err = GameConfig::from_json(r#"{ "tick_duration_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "tick_duration_ms", .. }));

        let err = GameConfig::from_json(r#"{ "pathing": { "costs": { "walk": -1.0 } } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "pathing.costs.walk", .. }));

        let err = GameConfig::from_json(r#"{ "locomotion": { "climb_speed": 0.0 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = GameConfig::from_json(r#"{ "locomotion": { "wall_standoff": 0.5 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = GameConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn motion_params_from_defaults() {
        let motion = GameConfig::default().motion();
        // 1 cell/s at 100 ms per tick is a tenth of a cell per tick.
        assert_eq!(motion.walk_step, (SUBCELL as f32 * 0.1).round() as i32);
        assert_eq!(motion.change_surface_ticks, 4);
        assert_eq!(motion.cross_ledge_ticks, 6);
        assert_eq!(motion.ticks_for_ms(5000), 50);
        assert_eq!(motion.ticks_for_ms(0), 0);
        assert_eq!(motion.ticks_for_ms(101), 2);
        assert_eq!(motion.wall_standoff, (SUBCELL as f32 * 0.05).round() as i32);
    }

    #[test]
    fn motion_steps_are_clamped() {
        let fast = LocomotionConfig {
            walk_speed: 1000.0,
            climb_speed: 0.0001,
            ..LocomotionConfig::default()
        };
        let motion = MotionParams::new(&fast, 100);
        assert_eq!(motion.walk_step, SUBCELL);
        assert_eq!(motion.climb_step, 1);
    }
}
