/*
 * UI Module
 *
 * This module contains functions for creating and updating the user interface
 * using nannou_egui. It provides controls for the tunable swarm parameters
 * and draws the debug overlay.
 */

use nannou_egui::{egui, Egui};

use crate::debug::DebugInfo;
use crate::params::{ParamChanges, SwarmParams, ViewSettings};

// Update the UI and return whether the swarm should be reset, plus what changed
pub fn update_ui(
    egui: &mut Egui,
    params: &mut SwarmParams,
    settings: &mut ViewSettings,
    debug_info: &DebugInfo,
) -> (bool, ParamChanges) {
    let mut should_reset = false;

    settings.take_snapshot(params);

    let ctx = egui.begin_frame();

    egui::Window::new("Swarm Controls")
        .default_pos([10.0, 10.0])
        .show(&ctx, |ui| {
            ui.collapsing("Swarm", |ui| {
                ui.add(
                    egui::Slider::new(&mut params.num_butterflies, SwarmParams::get_num_butterflies_range())
                        .text("Number of Butterflies"),
                );

                if ui.button("Reset Swarm").clicked() {
                    should_reset = true;
                }

                ui.add(egui::Slider::new(&mut params.max_speed, SwarmParams::get_max_speed_range()).text("Max Speed"));
            });

            ui.collapsing("Flocking Behavior", |ui| {
                ui.add(
                    egui::Slider::new(&mut params.min_distance, SwarmParams::get_min_distance_range())
                        .text("Min Distance"),
                );
                ui.add(
                    egui::Slider::new(&mut params.cohesion_gain, SwarmParams::get_cohesion_gain_range())
                        .text("Cohesion Gain"),
                );
            });

            ui.collapsing("Wings", |ui| {
                ui.add(
                    egui::Slider::new(&mut params.phase_step, SwarmParams::get_phase_step_range())
                        .text("Phase Step"),
                );
            });

            ui.collapsing("Performance", |ui| {
                ui.checkbox(&mut params.enable_parallel, "Enable Parallel Processing");

                ui.separator();

                ui.label(format!("FPS: {:.1}", debug_info.fps));
                ui.label(format!("Tick time: {:.3} ms", debug_info.tick_time.as_secs_f64() * 1000.0));
                ui.label(format!("Butterflies: {}", params.num_butterflies));
            });

            ui.checkbox(&mut settings.show_debug, "Show Debug Info");
            ui.checkbox(&mut settings.pause_simulation, "Pause Simulation");
        });

    let changes = settings.detect_changes(params);

    (should_reset, changes)
}

// Draw debug information on the screen
pub fn draw_debug_info(
    draw: &nannou::Draw,
    debug_info: &DebugInfo,
    window_rect: nannou::geom::Rect,
    butterflies: usize,
) {
    let margin = 20.0;
    let line_height = 20.0;
    let panel_width = 220.0;
    let panel_height = line_height * 6.0 + margin;
    let panel_x = window_rect.right() - panel_width / 2.0;
    let panel_y = window_rect.top() - panel_height / 2.0;

    draw.rect()
        .x_y(panel_x, panel_y)
        .w_h(panel_width, panel_height)
        .color(nannou::color::rgba(0.0, 0.0, 0.0, 0.5));

    let text_x = window_rect.right() - panel_width + margin;
    let text_y = window_rect.top() - margin;

    let c = debug_info.centroid;
    let debug_texts = [
        format!("FPS: {:.1}", debug_info.fps),
        format!("Frame time: {:.2} ms", debug_info.frame_time.as_secs_f64() * 1000.0),
        format!("Butterflies: {}", butterflies),
        format!("Ticks: {}", debug_info.ticks),
        format!("Centroid: ({:.1}, {:.1}, {:.1})", c.x, c.y, c.z),
        format!("Dirty panels: {}", debug_info.dirty_panels),
    ];

    for (i, text) in debug_texts.iter().enumerate() {
        let y = text_y - (i as f32 * line_height);

        // Left-align by offsetting the centred text box
        draw.text(text)
            .x_y(text_x + 80.0, y)
            .w(180.0)
            .left_justify()
            .color(nannou::color::WHITE)
            .font_size(14);
    }
}
