/*
 * Butterfly Swarm Viewer
 *
 * A small flock of flapping butterflies confined to a box. Each butterfly
 * steers away from neighbours that fly too close, drifts toward the rest of
 * the swarm and is pushed back when it leaves the box.
 *
 * The simulation includes interactive sliders to adjust parameters in real-time
 * and displays debug information about the current state.
 * Set RUST_LOG (e.g. RUST_LOG=butterflies=trace) to see per-tick logging.
 */

use butterflies::app::{model, update};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    nannou::app(model).update(update).run();
}
