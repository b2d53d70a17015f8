/*
 * Application Module
 *
 * This module defines the viewer's model and its nannou callbacks. The
 * viewer is a thin host: it owns one swarm, ticks it with the frame time,
 * publishes the result into render buffers and lets the egui panel retune
 * or rebuild the swarm.
 */

use nannou::prelude::*;
use nannou_egui::Egui;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use tracing::{info, warn};

use crate::camera::Camera;
use crate::debug::DebugInfo;
use crate::params::{SwarmParams, ViewSettings};
use crate::render::RenderBuffers;
use crate::renderer;
use crate::swarm::Swarm;
use crate::ui;

// Longest step a single frame may take, in seconds
const MAX_FRAME_DT: f32 = 0.1;

// Main model for the application
pub struct Model {
    pub swarm: Swarm,
    pub params: SwarmParams,
    pub settings: ViewSettings,
    pub buffers: RenderBuffers,
    pub egui: Egui,
    pub debug_info: DebugInfo,
    pub camera: Camera,
    rng: StdRng,
}

// Initialize the model
pub fn model(app: &App) -> Model {
    let window_id = app
        .new_window()
        .title("Butterflies")
        .size(1280, 800)
        .view(renderer::view)
        .raw_event(raw_window_event)
        .build()
        .expect("failed to build the viewer window");

    let window = app.window(window_id).expect("viewer window closed during setup");
    let egui = Egui::from_window(&window);

    let params = SwarmParams {
        num_butterflies: 12,
        ..SwarmParams::default()
    };
    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let swarm = Swarm::scattered(params.clone(), &mut rng).expect("built-in swarm parameters are valid");
    info!(count = swarm.len(), "spawned swarm");

    let mut buffers = RenderBuffers::with_capacity(swarm.len());
    swarm.publish(&mut buffers);

    Model {
        camera: Camera::framing(&params.bounds),
        swarm,
        params,
        settings: ViewSettings::default(),
        buffers,
        egui,
        debug_info: DebugInfo::default(),
        rng,
    }
}

// Update the model
pub fn update(app: &App, model: &mut Model, update: Update) {
    model.debug_info.fps = app.fps();
    model.debug_info.frame_time = update.since_last;

    let (should_reset, changes) = ui::update_ui(
        &mut model.egui,
        &mut model.params,
        &mut model.settings,
        &model.debug_info,
    );

    if should_reset || changes.count_changed {
        rebuild_swarm(model);
    } else if changes.tuning_changed {
        if let Err(err) = model.swarm.retune(model.params.clone()) {
            warn!(%err, "rejected swarm parameters");
            model.params = model.swarm.params().clone();
        }
    }

    if !model.settings.pause_simulation {
        let started = Instant::now();
        let dt = update.since_last.as_secs_f32().min(MAX_FRAME_DT);
        model.swarm.tick(dt);
        model.debug_info.tick_time = started.elapsed();
    }

    model.swarm.publish(&mut model.buffers);
    model.debug_info.dirty_panels = model.buffers.take_dirty().len();
    model.debug_info.ticks = model.swarm.ticks();
    model.debug_info.centroid = model.swarm.centroid();
}

// Respawn with the current parameters, keeping the old swarm on failure
fn rebuild_swarm(model: &mut Model) {
    match Swarm::scattered(model.params.clone(), &mut model.rng) {
        Ok(swarm) => {
            info!(count = swarm.len(), "respawned swarm");
            model.swarm = swarm;
            model.buffers.clear();
        }
        Err(err) => {
            warn!(%err, "rejected swarm parameters");
            model.params = model.swarm.params().clone();
        }
    }
}

// Handle raw window events for egui
pub fn raw_window_event(_app: &App, model: &mut Model, event: &nannou::winit::event::WindowEvent) {
    model.egui.handle_raw_event(event);
}
