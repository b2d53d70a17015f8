/*
 * Error Module
 *
 * Configuration errors surfaced when a swarm is built. The tick loop itself
 * cannot fail, so this is the only error type in the crate.
 */

use crate::params::Axis;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("a swarm needs at least one butterfly")]
    EmptySwarm,

    #[error("confinement bounds on {axis} are inverted: min {min} > max {max}")]
    InvertedBounds { axis: Axis, min: f32, max: f32 },

    #[error("{field} must be finite")]
    NonFinite { field: &'static str },

    #[error("{field} must be greater than zero (got {value})")]
    NonPositive { field: &'static str, value: f32 },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f32 },

    #[error("expected initial state for {expected} butterflies, got {actual}")]
    AgentCountMismatch { expected: usize, actual: usize },
}
