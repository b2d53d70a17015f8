/*
 * Oscillator Module
 *
 * Pure phase-driven signals shared by the wing kinematics and the body pose.
 * A single running phase drives every wing edge with a different lag, which
 * is what makes four rigid panels read as a flexible membrane.
 */

use std::f32::consts::{PI, TAU};

// Lag of the hindwings behind the forewings
pub const HIND_LAG: f32 = PI / 32.0;
// Lag applied to the vertical (up/down) stroke of the back tips
pub const VERTICAL_LAG: f32 = 1.0;
// Lag applied to the span-wise flutter of the front tips
pub const HORIZONTAL_LAG: f32 = 0.3;

// Wrap any phase into [0, 2π)
pub fn wrap_phase(phase: f32) -> f32 {
    let wrapped = phase.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Scale a signal with one factor on its non-negative half and another on
/// its negative half. Zero takes the non-negative branch.
#[inline]
pub fn asymmetric(signal: f32, non_negative_scale: f32, negative_scale: f32) -> f32 {
    if signal >= 0.0 {
        signal * non_negative_scale
    } else {
        signal * negative_scale
    }
}

// The named signals derived from one phase value
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WingSignals {
    pub vertical_fore: f32,
    pub horizontal_fore: f32,
    pub horizontal_hind: f32,
    pub lag_vertical_fore: f32,
    pub lag_vertical_hind: f32,
    pub lag_horizontal_fore: f32,
    pub lag_horizontal_hind: f32,
}

impl WingSignals {
    // Compute every signal from a phase; the phase is wrapped first
    pub fn from_phase(phase: f32) -> Self {
        let t = wrap_phase(phase);
        let p = t - HIND_LAG;

        Self {
            vertical_fore: t.sin(),
            horizontal_fore: t.cos(),
            horizontal_hind: p.cos(),
            lag_vertical_fore: (t - VERTICAL_LAG).sin(),
            lag_vertical_hind: (p - VERTICAL_LAG).sin(),
            lag_horizontal_fore: (t - HORIZONTAL_LAG).cos(),
            lag_horizontal_hind: (p - HORIZONTAL_LAG).cos(),
        }
    }

    pub fn as_array(&self) -> [f32; 7] {
        [
            self.vertical_fore,
            self.horizontal_fore,
            self.horizontal_hind,
            self.lag_vertical_fore,
            self.lag_vertical_hind,
            self.lag_horizontal_fore,
            self.lag_horizontal_hind,
        ]
    }
}
