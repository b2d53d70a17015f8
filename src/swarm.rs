/*
 * Swarm Module
 *
 * This module owns the butterflies and steps the flock. Each tick follows
 * the same order:
 * 1. Snapshot every position and velocity
 * 2. Compute each butterfly's steering delta (separation + cohesion) from
 *    the snapshot into a scratch buffer, optionally in parallel
 * 3. Apply the delta, shove strays back into the bounds, clamp speed
 * 4. Turn to face the velocity, integrate, then flap
 *
 * No butterfly sees another's state from the current tick, so the result
 * does not depend on iteration order or on the parallel setting.
 */

use std::sync::atomic::{AtomicU64, Ordering};

use nannou::prelude::{vec3, Vec3};
use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::butterfly::Butterfly;
use crate::error::ConfigError;
use crate::params::{Axis, SwarmParams};
use crate::render::RenderTarget;
use crate::wing::PanelSlot;

/// Initial state of one butterfly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentInit {
    pub position: Vec3,
    pub velocity: Vec3,
    pub phase: f32,
}

impl AgentInit {
    pub fn new(position: Vec3, velocity: Vec3, phase: f32) -> Self {
        Self {
            position,
            velocity,
            phase,
        }
    }
}

// Per-tick constants shared by every delta computation
#[derive(Clone, Copy)]
struct Steering {
    sum: Vec3,
    count: usize,
    min_distance_sq: f32,
    cohesion_gain: f32,
    steps: f32,
}

impl Steering {
    fn delta(&self, i: usize, positions: &[Vec3], velocities: &[Vec3]) -> Vec3 {
        let position = positions[i];
        let velocity = velocities[i];

        // Separation: push away from the velocity of anyone too close
        let mut separation = Vec3::ZERO;
        for (j, (&other_position, &other_velocity)) in positions.iter().zip(velocities).enumerate() {
            if j == i {
                continue;
            }
            if position.distance_squared(other_position) < self.min_distance_sq {
                separation += velocity - other_velocity;
            }
        }

        // Cohesion: pull toward the centroid, spread over everyone else
        let cohesion = if self.count > 1 {
            let centroid = self.sum / self.count as f32;
            (centroid - position) / (self.count - 1) as f32 * self.cohesion_gain
        } else {
            Vec3::ZERO
        };

        (separation + cohesion) * self.steps
    }
}

// Identity handed to render targets; unique per swarm and per clone
static NEXT_SOURCE: AtomicU64 = AtomicU64::new(1);

fn next_source() -> u64 {
    NEXT_SOURCE.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug)]
pub struct Swarm {
    params: SwarmParams,
    butterflies: Vec<Butterfly>,
    // Scratch buffers reused across ticks
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    deltas: Vec<Vec3>,
    ticks: u64,
    source: u64,
}

impl Clone for Swarm {
    // A clone flies on independently, so it publishes as a new source
    fn clone(&self) -> Self {
        Self {
            params: self.params.clone(),
            butterflies: self.butterflies.clone(),
            positions: self.positions.clone(),
            velocities: self.velocities.clone(),
            deltas: self.deltas.clone(),
            ticks: self.ticks,
            source: next_source(),
        }
    }
}

impl Swarm {
    // Butterfly i starts at i * spawn_spacing with phase i * phase_spacing
    pub fn new(params: SwarmParams) -> Result<Self, ConfigError> {
        params.validate()?;

        let agents = (0..params.num_butterflies)
            .map(|i| {
                let index = i as f32;
                AgentInit::new(
                    params.spawn_spacing * index,
                    params.initial_velocity,
                    params.phase_spacing * index,
                )
            })
            .collect();

        Ok(Self::build(params, agents))
    }

    pub fn from_agents(params: SwarmParams, agents: Vec<AgentInit>) -> Result<Self, ConfigError> {
        params.validate()?;
        if agents.len() != params.num_butterflies {
            return Err(ConfigError::AgentCountMismatch {
                expected: params.num_butterflies,
                actual: agents.len(),
            });
        }
        for agent in &agents {
            check_finite("agent position", agent.position)?;
            check_finite("agent velocity", agent.velocity)?;
            if !agent.phase.is_finite() {
                return Err(ConfigError::NonFinite { field: "agent phase" });
            }
        }

        Ok(Self::build(params, agents))
    }

    // Spawn uniformly inside the bounds, heading for a random point on the
    // edge of the horizontal plane, with a random phase
    pub fn scattered<R: Rng + ?Sized>(params: SwarmParams, rng: &mut R) -> Result<Self, ConfigError> {
        params.validate()?;

        let speed = params
            .initial_velocity
            .x
            .abs()
            .max(params.initial_velocity.z.abs())
            .min(params.max_speed);
        let bounds = params.bounds;

        let agents = (0..params.num_butterflies)
            .map(|_| {
                let position = vec3(
                    rng.gen_range(bounds.min.x..=bounds.max.x),
                    rng.gen_range(bounds.min.y..=bounds.max.y),
                    rng.gen_range(bounds.min.z..=bounds.max.z),
                );
                let phase = rng.gen_range(0.0..std::f32::consts::TAU);
                AgentInit::new(position, perimeter_direction(&mut *rng, speed), phase)
            })
            .collect();

        Ok(Self::build(params, agents))
    }

    fn build(params: SwarmParams, agents: Vec<AgentInit>) -> Self {
        let butterflies: Vec<Butterfly> = agents
            .into_iter()
            .enumerate()
            .map(|(id, init)| Butterfly::new(id, init.position, init.velocity, init.phase))
            .collect();
        let count = butterflies.len();

        debug!(count, parallel = params.enable_parallel, "built swarm");

        Self {
            params,
            butterflies,
            positions: Vec::with_capacity(count),
            velocities: Vec::with_capacity(count),
            deltas: vec![Vec3::ZERO; count],
            ticks: 0,
            source: next_source(),
        }
    }

    pub fn params(&self) -> &SwarmParams {
        &self.params
    }

    pub fn butterflies(&self) -> &[Butterfly] {
        &self.butterflies
    }

    pub fn butterfly(&self, id: usize) -> Option<&Butterfly> {
        self.butterflies.get(id)
    }

    pub fn len(&self) -> usize {
        self.butterflies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.butterflies.is_empty()
    }

    // Number of ticks that moved the swarm
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    // Swap in new tuning without touching flight state; the count is fixed
    pub fn retune(&mut self, params: SwarmParams) -> Result<(), ConfigError> {
        params.validate()?;
        if params.num_butterflies != self.butterflies.len() {
            return Err(ConfigError::AgentCountMismatch {
                expected: self.butterflies.len(),
                actual: params.num_butterflies,
            });
        }
        debug!(
            max_speed = params.max_speed,
            min_distance = params.min_distance,
            cohesion_gain = params.cohesion_gain,
            "retuned swarm"
        );
        self.params = params;
        Ok(())
    }

    // Mean position of all butterflies
    pub fn centroid(&self) -> Vec3 {
        let sum = self
            .butterflies
            .iter()
            .fold(Vec3::ZERO, |acc, b| acc + b.position);
        sum / self.butterflies.len().max(1) as f32
    }

    // One tick at the reference frame rate
    pub fn tick_frame(&mut self) {
        self.tick(self.params.reference_dt());
    }

    // Step the flock by `dt` seconds. Velocities are in units per reference
    // frame, so the step is measured in reference frames.
    pub fn tick(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let steps = dt * self.params.reference_fps;

        self.take_snapshot();
        let steering = Steering {
            sum: self.positions.iter().fold(Vec3::ZERO, |acc, &p| acc + p),
            count: self.positions.len(),
            min_distance_sq: self.params.min_distance * self.params.min_distance,
            cohesion_gain: self.params.cohesion_gain,
            steps,
        };
        self.compute_deltas(&steering);

        let params = &self.params;
        for (butterfly, &delta) in self.butterflies.iter_mut().zip(&self.deltas) {
            let mut velocity = butterfly.velocity + delta;
            confine(&mut velocity, butterfly.position, params);
            butterfly.velocity = velocity.clamp(Vec3::splat(-params.max_speed), Vec3::splat(params.max_speed));

            butterfly.orient_to_velocity();
            butterfly.advance(steps);
            butterfly.animate(steps, params.phase_step);
        }

        self.ticks += 1;
        trace!(
            tick = self.ticks,
            steps,
            centroid = ?(steering.sum / steering.count.max(1) as f32),
            "swarm tick"
        );
    }

    fn take_snapshot(&mut self) {
        self.positions.clear();
        self.velocities.clear();
        for butterfly in &self.butterflies {
            self.positions.push(butterfly.position);
            self.velocities.push(butterfly.velocity);
        }
        self.deltas.resize(self.butterflies.len(), Vec3::ZERO);
    }

    fn compute_deltas(&mut self, steering: &Steering) {
        let positions = &self.positions;
        let velocities = &self.velocities;

        if self.params.enable_parallel {
            self.deltas
                .par_iter_mut()
                .enumerate()
                .for_each(|(i, delta)| *delta = steering.delta(i, positions, velocities));
        } else {
            for (i, delta) in self.deltas.iter_mut().enumerate() {
                *delta = steering.delta(i, positions, velocities);
            }
        }
    }

    // Push transforms, and the panels that changed since the target last saw
    // them. Revisions only compare within one source, so a target that was
    // last fed by another swarm gets every panel again.
    pub fn publish<T: RenderTarget + ?Sized>(&self, target: &mut T) {
        target.begin_publish(self.source);
        for butterfly in &self.butterflies {
            let id = butterfly.id();
            target.set_transform(id, butterfly.position, butterfly.frame());

            for slot in PanelSlot::ALL {
                let revision = butterfly.wings().panel(slot).revision();
                if target.last_revision(id, slot) == Some(revision) {
                    continue;
                }
                target.write_panel(id, slot, &butterfly.panel_local_corners(slot));
                target.mark_dirty(id, slot, revision);
            }
        }
    }
}

// Outside the box on an axis, head back in at the correction speed
fn confine(velocity: &mut Vec3, position: Vec3, params: &SwarmParams) {
    let bounds = &params.bounds;
    for axis in Axis::ALL {
        let p = axis.component(position);
        if p < axis.component(bounds.min) {
            *axis.component_mut(velocity) = params.correction_speed;
        } else if p > axis.component(bounds.max) {
            *axis.component_mut(velocity) = -params.correction_speed;
        }
    }
}

// A point on the edge of the square [-len, len] in the XZ plane
fn perimeter_direction<R: Rng + ?Sized>(rng: &mut R, len: f32) -> Vec3 {
    let along = if len > 0.0 { rng.gen_range(-len..=len) } else { 0.0 };
    let edge = if rng.gen_bool(0.5) { len } else { -len };
    if rng.gen_bool(0.5) {
        vec3(edge, 0.0, along)
    } else {
        vec3(along, 0.0, edge)
    }
}

fn check_finite(field: &'static str, v: Vec3) -> Result<(), ConfigError> {
    if v.x.is_finite() && v.y.is_finite() && v.z.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Bounds;
    use crate::render::RenderBuffers;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn still(position: Vec3) -> AgentInit {
        AgentInit::new(position, Vec3::ZERO, 0.0)
    }

    fn params_for(count: usize) -> SwarmParams {
        SwarmParams {
            num_butterflies: count,
            ..SwarmParams::default()
        }
    }

    #[test]
    fn default_layout_spaces_agents() {
        let swarm = Swarm::new(SwarmParams::default()).unwrap();
        assert_eq!(swarm.len(), 3);
        let b2 = swarm.butterfly(2).unwrap();
        assert_eq!(b2.position, vec3(52.0, 76.0, 28.0));
        assert_eq!(b2.velocity, vec3(0.15, 0.0, 0.15));
        assert!((b2.phase() - std::f32::consts::PI).abs() < 1.0e-6);
    }

    #[test]
    fn rejects_mismatched_agent_list() {
        let err = Swarm::from_agents(params_for(2), vec![still(Vec3::ZERO)]).unwrap_err();
        assert_eq!(err, ConfigError::AgentCountMismatch { expected: 2, actual: 1 });
    }

    #[test]
    fn rejects_non_finite_agent() {
        let agents = vec![AgentInit::new(vec3(f32::NAN, 0.0, 0.0), Vec3::ZERO, 0.0)];
        let err = Swarm::from_agents(params_for(1), agents).unwrap_err();
        assert_eq!(err, ConfigError::NonFinite { field: "agent position" });
    }

    #[test]
    fn single_agent_has_no_cohesion() {
        let mut swarm = Swarm::from_agents(params_for(1), vec![still(vec3(0.0, 40.0, 0.0))]).unwrap();
        swarm.tick_frame();
        assert_eq!(swarm.butterfly(0).unwrap().velocity, Vec3::ZERO);
        assert_eq!(swarm.butterfly(0).unwrap().position, vec3(0.0, 40.0, 0.0));
    }

    #[test]
    fn cohesion_uses_start_of_tick_snapshot() {
        let params = SwarmParams {
            min_distance: 0.0,
            ..params_for(3)
        };
        let agents = vec![
            still(vec3(0.0, 40.0, 0.0)),
            still(vec3(10.0, 40.0, 0.0)),
            still(vec3(-10.0, 40.0, 0.0)),
        ];
        let mut swarm = Swarm::from_agents(params, agents).unwrap();
        swarm.tick_frame();

        // gain * (centroid - p) / (n - 1): -0.0025, 0, +0.0025
        let v1 = swarm.butterfly(1).unwrap().velocity;
        let v2 = swarm.butterfly(2).unwrap().velocity;
        assert!((v1.x + 0.0025).abs() < 1.0e-7, "v1.x = {}", v1.x);
        assert!((v2.x - 0.0025).abs() < 1.0e-7, "v2.x = {}", v2.x);
        assert_eq!(v1.x, -v2.x);
        assert_eq!(swarm.butterfly(0).unwrap().velocity.x, 0.0);
    }

    #[test]
    fn zero_or_invalid_dt_is_ignored() {
        let mut swarm = Swarm::new(SwarmParams::default()).unwrap();
        let before: Vec<Vec3> = swarm.butterflies().iter().map(|b| b.position).collect();
        swarm.tick(0.0);
        swarm.tick(-1.0);
        swarm.tick(f32::NAN);
        let after: Vec<Vec3> = swarm.butterflies().iter().map(|b| b.position).collect();
        assert_eq!(before, after);
        assert_eq!(swarm.ticks(), 0);
    }

    #[test]
    fn split_ticks_match_whole_ticks_for_free_flight() {
        // Far apart, well inside the bounds, no cohesion: pure integration
        let params = SwarmParams {
            cohesion_gain: 0.0,
            ..params_for(2)
        };
        let agents = vec![
            AgentInit::new(vec3(-30.0, 40.0, 0.0), vec3(0.1, 0.0, 0.0), 0.0),
            AgentInit::new(vec3(30.0, 40.0, 0.0), vec3(0.0, 0.0, 0.1), 1.0),
        ];
        let mut whole = Swarm::from_agents(params.clone(), agents.clone()).unwrap();
        let mut split = Swarm::from_agents(params, agents).unwrap();

        whole.tick(1.0 / 60.0);
        split.tick(0.5 / 60.0);
        split.tick(0.5 / 60.0);

        for (a, b) in whole.butterflies().iter().zip(split.butterflies()) {
            assert!((a.position - b.position).length() < 1.0e-5);
            assert!((a.phase() - b.phase()).abs() < 1.0e-5);
        }
    }

    #[test]
    fn parallel_pass_matches_sequential() {
        let mut rng = StdRng::seed_from_u64(11);
        let params = params_for(40);
        let sequential = Swarm::scattered(params.clone(), &mut rng).unwrap();
        let mut parallel = sequential.clone();
        parallel
            .retune(SwarmParams {
                enable_parallel: true,
                ..params
            })
            .unwrap();
        let mut sequential = sequential;

        for _ in 0..50 {
            sequential.tick_frame();
            parallel.tick_frame();
        }
        for (a, b) in sequential.butterflies().iter().zip(parallel.butterflies()) {
            assert_eq!(a.position, b.position);
            assert_eq!(a.velocity, b.velocity);
        }
    }

    #[test]
    fn scattered_spawns_inside_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let swarm = Swarm::scattered(params_for(64), &mut rng).unwrap();
        let bounds = swarm.params().bounds;
        for b in swarm.butterflies() {
            assert!(bounds.contains(b.position));
            assert_eq!(b.velocity.y, 0.0);
            // One horizontal component sits on the perimeter
            assert!((b.velocity.x.abs() - 0.15).abs() < 1.0e-6 || (b.velocity.z.abs() - 0.15).abs() < 1.0e-6);
        }
    }

    #[test]
    fn retune_keeps_count_fixed() {
        let mut swarm = Swarm::new(SwarmParams::default()).unwrap();
        let err = swarm.retune(params_for(5)).unwrap_err();
        assert_eq!(err, ConfigError::AgentCountMismatch { expected: 3, actual: 5 });
        assert!(swarm
            .retune(SwarmParams {
                max_speed: 1.0,
                ..SwarmParams::default()
            })
            .is_ok());
        assert_eq!(swarm.params().max_speed, 1.0);
    }

    #[test]
    fn publish_sends_only_changed_panels() {
        let mut swarm = Swarm::new(SwarmParams::default()).unwrap();
        let mut buffers = RenderBuffers::new();

        swarm.publish(&mut buffers);
        assert_eq!(buffers.take_dirty().len(), 3 * 4);

        // Nothing moved, nothing to re-upload
        swarm.publish(&mut buffers);
        assert!(buffers.take_dirty().is_empty());

        swarm.tick_frame();
        swarm.publish(&mut buffers);
        assert_eq!(buffers.take_dirty().len(), 3 * 4);

        let b = swarm.butterfly(1).unwrap();
        assert_eq!(buffers.transform(1).map(|t| t.position), Some(b.position));
        let world = buffers.world_panel(1, PanelSlot::HindLeft).unwrap();
        let expected = b.panel_world_corners(PanelSlot::HindLeft);
        for (w, e) in world.iter().zip(expected.iter()) {
            assert!((*w - *e).length() < 1.0e-4);
        }
    }

    #[test]
    fn publishing_another_swarm_rewrites_every_panel() {
        let first = Swarm::new(SwarmParams::default()).unwrap();
        let agents = (0..3)
            .map(|i| AgentInit::new(vec3(i as f32 * 10.0, 40.0, 0.0), Vec3::ZERO, 1.0 + i as f32))
            .collect();
        let second = Swarm::from_agents(SwarmParams::default(), agents).unwrap();
        let mut buffers = RenderBuffers::new();

        first.publish(&mut buffers);
        buffers.take_dirty();

        // Same revisions, different swarm: nothing may be skipped
        second.publish(&mut buffers);
        assert_eq!(buffers.take_dirty().len(), 3 * 4);
        for b in second.butterflies() {
            for slot in PanelSlot::ALL {
                assert_eq!(buffers.panel(b.id(), slot), Some(&b.panel_local_corners(slot)));
            }
        }
    }

    #[test]
    fn clones_publish_as_a_new_source() {
        let swarm = Swarm::new(SwarmParams::default()).unwrap();
        let copy = swarm.clone();
        assert_ne!(swarm.source, copy.source);

        let mut buffers = RenderBuffers::new();
        swarm.publish(&mut buffers);
        buffers.take_dirty();
        copy.publish(&mut buffers);
        assert_eq!(buffers.take_dirty().len(), 3 * 4);
    }

    #[test]
    fn scattered_rejects_unmeasurable_bounds() {
        let params = SwarmParams {
            bounds: Bounds::new(Vec3::splat(-f32::MAX), Vec3::splat(f32::MAX)),
            ..params_for(4)
        };
        let mut rng = StdRng::seed_from_u64(5);
        let err = Swarm::scattered(params, &mut rng).unwrap_err();
        assert_eq!(err, ConfigError::NonFinite { field: "bounds extent" });
    }

    #[test]
    fn every_butterfly_faces_its_velocity_after_a_tick() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut swarm = Swarm::scattered(params_for(20), &mut rng).unwrap();
        for _ in 0..100 {
            swarm.tick(rng.gen_range(0.005..0.05));
            for b in swarm.butterflies() {
                if b.velocity.length() > 1.0e-4 {
                    let expected = b.velocity.normalize();
                    assert!((b.frame().forward() - expected).length() < 1.0e-5);
                }
            }
        }
    }
}
