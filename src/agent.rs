//! Agent records and the startup spawn.
//!
//! An agent is identified by its index in the store; there is no separate id
//! and the store is never reordered or resized. Every record is rewritten in
//! full each tick by the motion stage.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use rand::Rng;

/// One agent record in GPU layout: position, heading, and a reserved slot
/// that pads the record out to a full vec4.
///
/// Positions live in the unit square `[0, 1)` on both axes; `heading` is an
/// angle in radians and is allowed to grow without bound (only its sine and
/// cosine are ever taken).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct AgentRecord {
    pub position: Vec2,
    pub heading: f32,
    pub reserved: f32,
}

impl AgentRecord {
    /// Build a record at the given position and heading.
    pub fn new(position: Vec2, heading: f32) -> Self {
        Self {
            position,
            heading,
            reserved: 0.0,
        }
    }
}

/// Spawn the full agent population: everyone starts at the centre of the
/// domain with a uniformly random heading in `[0, 2π)`.
pub fn spawn<R: Rng>(count: u32, rng: &mut R) -> Vec<AgentRecord> {
    (0..count)
        .map(|_| {
            AgentRecord::new(
                Vec2::new(0.5, 0.5),
                rng.gen_range(0.0..std::f32::consts::TAU),
            )
        })
        .collect()
}
