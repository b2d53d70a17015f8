/*
 * Butterfly Swarm - Module Definitions
 *
 * This file defines the module structure of the crate. The simulation core
 * (oscillator, wing, body, frame, butterfly, swarm) has no dependency on the
 * viewer modules (app, renderer, ui, camera, debug) and can be driven by any
 * host through Swarm::tick and the RenderTarget trait.
 */

// Re-export key components for easier access
pub use butterfly::Butterfly;
pub use camera::Camera;
pub use debug::DebugInfo;
pub use error::ConfigError;
pub use frame::Frame;
pub use params::{Axis, Bounds, SwarmParams};
pub use render::{RenderBuffers, RenderTarget};
pub use swarm::{AgentInit, Swarm};
pub use wing::{PanelSlot, WingKinematics};
pub use app::Model;

// Simulation core
pub mod oscillator;
pub mod wing;
pub mod body;
pub mod frame;
pub mod butterfly;
pub mod swarm;
pub mod params;
pub mod error;
pub mod render;

// Viewer
pub mod camera;
pub mod debug;
pub mod app;
pub mod ui;
pub mod renderer;
