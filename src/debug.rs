/*
 * Debug Information Module
 *
 * This module defines the DebugInfo struct that contains performance metrics
 * and swarm state to be displayed in the UI.
 */

use nannou::prelude::Vec3;
use std::time::Duration;

// Debug information to display
pub struct DebugInfo {
    pub fps: f32,
    pub frame_time: Duration,
    // Wall time spent inside the last swarm tick
    pub tick_time: Duration,
    pub ticks: u64,
    pub centroid: Vec3,
    // Panels re-uploaded by the last publish
    pub dirty_panels: usize,
}

impl Default for DebugInfo {
    fn default() -> Self {
        Self {
            fps: 0.0,
            frame_time: Duration::ZERO,
            tick_time: Duration::ZERO,
            ticks: 0,
            centroid: Vec3::ZERO,
            dirty_panels: 0,
        }
    }
}
