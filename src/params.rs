/*
 * Swarm Parameters Module
 *
 * This module defines the SwarmParams struct holding every construction-time
 * option of a swarm, together with its validation. The defaults are the
 * tuned values the flight looks right with. It also provides the parameter
 * ranges used by the UI sliders and snapshot-based change detection.
 */

use nannou::prelude::{vec3, Vec3};
use std::f32::consts::FRAC_PI_2;
use std::fmt;
use std::ops::RangeInclusive;

use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn component(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }

    pub fn component_mut(self, v: &mut Vec3) -> &mut f32 {
        match self {
            Axis::X => &mut v.x,
            Axis::Y => &mut v.y,
            Axis::Z => &mut v.z,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

/// Axis-aligned confinement box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: vec3(-75.0, 10.0, -75.0),
            max: vec3(75.0, 75.0, 75.0),
        }
    }
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        Axis::ALL.iter().all(|&axis| {
            let p = axis.component(point);
            p >= axis.component(self.min) && p <= axis.component(self.max)
        })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for axis in Axis::ALL {
            let min = axis.component(self.min);
            let max = axis.component(self.max);
            if !min.is_finite() || !max.is_finite() {
                return Err(ConfigError::NonFinite { field: "bounds" });
            }
            if min > max {
                return Err(ConfigError::InvertedBounds { axis, min, max });
            }
            // Spawning samples across the box, so its extent must be finite too
            if !(max - min).is_finite() {
                return Err(ConfigError::NonFinite { field: "bounds extent" });
            }
        }
        Ok(())
    }
}

// Parameters for a swarm; the adjustable ones are exposed in the UI
#[derive(Clone, Debug, PartialEq)]
pub struct SwarmParams {
    pub num_butterflies: usize,
    pub bounds: Bounds,
    // Neighbours closer than this trigger separation
    pub min_distance: f32,
    // Per-axis speed limit, in units per reference frame
    pub max_speed: f32,
    pub cohesion_gain: f32,
    // Speed a butterfly is shoved back with when it leaves the bounds
    pub correction_speed: f32,
    // Phase advance per reference frame, in radians
    pub phase_step: f32,
    // Initial phase difference between consecutive butterflies
    pub phase_spacing: f32,
    // Initial position of butterfly i is i * spawn_spacing
    pub spawn_spacing: Vec3,
    pub initial_velocity: Vec3,
    // Frame rate the per-frame constants above are tuned for
    pub reference_fps: f32,
    pub enable_parallel: bool,
    // Seed for randomized spawning; None uses entropy
    pub seed: Option<u64>,
}

impl Default for SwarmParams {
    fn default() -> Self {
        Self {
            num_butterflies: 3,
            bounds: Bounds::default(),
            min_distance: 20.0,
            max_speed: 0.25,
            cohesion_gain: 0.0005,
            correction_speed: 0.05,
            phase_step: 0.07,
            phase_spacing: FRAC_PI_2,
            spawn_spacing: vec3(26.0, 38.0, 14.0),
            initial_velocity: vec3(0.15, 0.0, 0.15),
            reference_fps: 60.0,
            enable_parallel: false,
            seed: None,
        }
    }
}

impl SwarmParams {
    // Check every option and fail on the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_butterflies == 0 {
            return Err(ConfigError::EmptySwarm);
        }
        self.bounds.validate()?;

        finite("min_distance", self.min_distance)?;
        finite("max_speed", self.max_speed)?;
        finite("cohesion_gain", self.cohesion_gain)?;
        finite("correction_speed", self.correction_speed)?;
        finite("phase_step", self.phase_step)?;
        finite("phase_spacing", self.phase_spacing)?;
        finite("reference_fps", self.reference_fps)?;
        finite_vec("spawn_spacing", self.spawn_spacing)?;
        finite_vec("initial_velocity", self.initial_velocity)?;

        positive("max_speed", self.max_speed)?;
        positive("reference_fps", self.reference_fps)?;
        non_negative("min_distance", self.min_distance)?;
        non_negative("cohesion_gain", self.cohesion_gain)?;
        non_negative("correction_speed", self.correction_speed)?;

        Ok(())
    }

    // Length of one reference frame in seconds
    pub fn reference_dt(&self) -> f32 {
        1.0 / self.reference_fps
    }

    // Get parameter ranges for UI sliders
    pub fn get_num_butterflies_range() -> RangeInclusive<usize> {
        1..=200
    }

    pub fn get_max_speed_range() -> RangeInclusive<f32> {
        0.05..=2.0
    }

    pub fn get_min_distance_range() -> RangeInclusive<f32> {
        0.0..=60.0
    }

    pub fn get_cohesion_gain_range() -> RangeInclusive<f32> {
        0.0..=0.01
    }

    pub fn get_phase_step_range() -> RangeInclusive<f32> {
        0.01..=0.5
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field })
    }
}

fn finite_vec(field: &'static str, value: Vec3) -> Result<(), ConfigError> {
    finite(field, value.x)?;
    finite(field, value.y)?;
    finite(field, value.z)
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

// A snapshot of the values the UI can change, used for change detection
#[derive(Clone, Debug, PartialEq)]
struct ParamSnapshot {
    num_butterflies: usize,
    max_speed: f32,
    min_distance: f32,
    cohesion_gain: f32,
    phase_step: f32,
    enable_parallel: bool,
    show_debug: bool,
    pause_simulation: bool,
}

/// What changed between two UI frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParamChanges {
    pub count_changed: bool,
    pub tuning_changed: bool,
    pub any_changed: bool,
}

// Viewer-side settings plus the change tracker for the UI
#[derive(Default)]
pub struct ViewSettings {
    pub show_debug: bool,
    pub pause_simulation: bool,
    previous_values: Option<ParamSnapshot>,
}

impl ViewSettings {
    // Take a snapshot of current parameter values for change detection
    pub fn take_snapshot(&mut self, params: &SwarmParams) {
        self.previous_values = Some(self.snapshot(params));
    }

    // Compare against the last snapshot; nothing has changed without one
    pub fn detect_changes(&self, params: &SwarmParams) -> ParamChanges {
        let Some(prev) = &self.previous_values else {
            return ParamChanges::default();
        };
        let now = self.snapshot(params);

        let count_changed = now.num_butterflies != prev.num_butterflies;
        let tuning_changed = now.max_speed != prev.max_speed
            || now.min_distance != prev.min_distance
            || now.cohesion_gain != prev.cohesion_gain
            || now.phase_step != prev.phase_step
            || now.enable_parallel != prev.enable_parallel;

        ParamChanges {
            count_changed,
            tuning_changed,
            any_changed: now != *prev,
        }
    }

    fn snapshot(&self, params: &SwarmParams) -> ParamSnapshot {
        ParamSnapshot {
            num_butterflies: params.num_butterflies,
            max_speed: params.max_speed,
            min_distance: params.min_distance,
            cohesion_gain: params.cohesion_gain,
            phase_step: params.phase_step,
            enable_parallel: params.enable_parallel,
            show_debug: self.show_debug,
            pause_simulation: self.pause_simulation,
        }
    }
}
