/*
 * Render Module
 *
 * The boundary between the simulation and whatever draws it. The swarm
 * pushes agent transforms and wing vertex data through the RenderTarget
 * trait; a target never writes back into the simulation.
 *
 * RenderBuffers is a flat implementation: one transform per agent, one
 * eight-vertex buffer per panel, and a dirty flag per panel that the drawing
 * side drains once it has re-uploaded the data.
 */

use nannou::prelude::Vec3;

use crate::frame::Frame;
use crate::wing::PanelSlot;

const PANELS_PER_AGENT: usize = 4;

pub trait RenderTarget {
    // Called at the start of every publish with the publishing swarm's
    // identity. Revisions recorded for a different source must be forgotten.
    fn begin_publish(&mut self, source: u64);

    fn set_transform(&mut self, agent: usize, position: Vec3, frame: &Frame);

    // Overwrite a panel's vertex buffer with corners in the agent's body frame
    fn write_panel(&mut self, agent: usize, slot: PanelSlot, corners: &[Vec3; 8]);

    // Flag a panel for re-upload and remember the revision it now holds
    fn mark_dirty(&mut self, agent: usize, slot: PanelSlot, revision: u64);

    // Revision of the panel data last written, if any
    fn last_revision(&self, agent: usize, slot: PanelSlot) -> Option<u64>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentTransform {
    pub position: Vec3,
    pub frame: Frame,
}

impl Default for AgentTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            frame: Frame::IDENTITY,
        }
    }
}

impl AgentTransform {
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.frame.to_world(self.position, local)
    }
}

#[derive(Clone, Debug, Default)]
pub struct RenderBuffers {
    transforms: Vec<AgentTransform>,
    panels: Vec<[Vec3; 8]>,
    revisions: Vec<Option<u64>>,
    dirty: Vec<bool>,
    source: Option<u64>,
}

impl RenderBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(agents: usize) -> Self {
        let mut buffers = Self::default();
        if agents > 0 {
            buffers.ensure_agent(agents - 1);
        }
        buffers
    }

    // Number of agents with storage allocated
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    // Forget everything, e.g. after the swarm was rebuilt with a new size
    pub fn clear(&mut self) {
        self.transforms.clear();
        self.panels.clear();
        self.revisions.clear();
        self.dirty.clear();
        self.source = None;
    }

    pub fn transform(&self, agent: usize) -> Option<&AgentTransform> {
        self.transforms.get(agent)
    }

    pub fn panel(&self, agent: usize, slot: PanelSlot) -> Option<&[Vec3; 8]> {
        self.panels.get(Self::panel_index(agent, slot))
    }

    // Panel corners with the agent transform applied
    pub fn world_panel(&self, agent: usize, slot: PanelSlot) -> Option<[Vec3; 8]> {
        let transform = self.transform(agent)?;
        let corners = self.panel(agent, slot)?;
        Some(corners.map(|c| transform.to_world(c)))
    }

    pub fn is_dirty(&self, agent: usize, slot: PanelSlot) -> bool {
        self.dirty
            .get(Self::panel_index(agent, slot))
            .copied()
            .unwrap_or(false)
    }

    // Drain the dirty flags, returning the panels that changed
    pub fn take_dirty(&mut self) -> Vec<(usize, PanelSlot)> {
        let mut changed = Vec::new();
        for (index, flag) in self.dirty.iter_mut().enumerate() {
            if std::mem::take(flag) {
                changed.push((index / PANELS_PER_AGENT, PanelSlot::ALL[index % PANELS_PER_AGENT]));
            }
        }
        changed
    }

    fn panel_index(agent: usize, slot: PanelSlot) -> usize {
        agent * PANELS_PER_AGENT + slot.index()
    }

    fn ensure_agent(&mut self, agent: usize) {
        let agents = agent + 1;
        if self.transforms.len() < agents {
            self.transforms.resize(agents, AgentTransform::default());
            self.panels.resize(agents * PANELS_PER_AGENT, [Vec3::ZERO; 8]);
            self.revisions.resize(agents * PANELS_PER_AGENT, None);
            self.dirty.resize(agents * PANELS_PER_AGENT, false);
        }
    }
}

impl RenderTarget for RenderBuffers {
    fn begin_publish(&mut self, source: u64) {
        if self.source != Some(source) {
            self.revisions.iter_mut().for_each(|r| *r = None);
            self.source = Some(source);
        }
    }

    fn set_transform(&mut self, agent: usize, position: Vec3, frame: &Frame) {
        self.ensure_agent(agent);
        self.transforms[agent] = AgentTransform {
            position,
            frame: *frame,
        };
    }

    fn write_panel(&mut self, agent: usize, slot: PanelSlot, corners: &[Vec3; 8]) {
        self.ensure_agent(agent);
        self.panels[Self::panel_index(agent, slot)] = *corners;
    }

    fn mark_dirty(&mut self, agent: usize, slot: PanelSlot, revision: u64) {
        self.ensure_agent(agent);
        let index = Self::panel_index(agent, slot);
        self.revisions[index] = Some(revision);
        self.dirty[index] = true;
    }

    fn last_revision(&self, agent: usize, slot: PanelSlot) -> Option<u64> {
        self.revisions
            .get(Self::panel_index(agent, slot))
            .copied()
            .flatten()
    }
}
