//! Headless CPU pipeline.
//!
//! Runs the exact tick semantics of the GPU path on the host: the motion and
//! decay stages fan out over `rayon` with each lane writing only its own
//! output slot, and the deposition stage runs in agent index order so that
//! overlapping splats resolve deterministically. Used for tests, headless
//! runs, and as the executable reference for the WGSL kernels.
//!
//! # Example
//!
//! ```ignore
//! use myxo::{CpuPipeline, SimConfig};
//!
//! let mut sim = CpuPipeline::new(SimConfig::default(), 640, 360, 42);
//! for _ in 0..100 {
//!     sim.tick();
//! }
//! println!("trail mass: {}", sim.field().total_intensity());
//! ```

use glam::Vec2;
use rand::{rngs::SmallRng, SeedableRng};
use rayon::prelude::*;

use crate::agent::{self, AgentRecord};
use crate::buffers::{Generation, PingPong};
use crate::config::SimConfig;
use crate::field::TrailField;
use crate::kernels;

/// The full simulation state with a host-side tick loop.
pub struct CpuPipeline {
    config: SimConfig,
    agents: PingPong<Vec<AgentRecord>>,
    fields: PingPong<TrailField>,
    generation: Generation,
    ticks: u64,
}

impl CpuPipeline {
    /// Spawn the standard population (everyone at the centre, random
    /// headings from the given seed) over a zeroed field.
    pub fn new(config: SimConfig, width: u32, height: u32, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let spawned = agent::spawn(config.agent_count, &mut rng);
        Self::from_agents(config, width, height, spawned)
    }

    /// Build a pipeline over an explicit initial population.
    pub fn from_agents(
        config: SimConfig,
        width: u32,
        height: u32,
        agents: Vec<AgentRecord>,
    ) -> Self {
        assert_eq!(
            agents.len() as u32,
            config.agent_count,
            "population must match the configured agent count"
        );
        let back = vec![AgentRecord::new(Vec2::ZERO, 0.0); agents.len()];
        Self {
            config,
            agents: PingPong::new(agents, back),
            fields: PingPong::new(TrailField::new(width, height), TrailField::new(width, height)),
            generation: Generation::A,
            ticks: 0,
        }
    }

    /// Run one full tick: motion & sensing, deposition, decay, flip.
    pub fn tick(&mut self) {
        let generation = self.generation;
        let config = &self.config;

        // Motion & sensing: agents[g] + field[g] -> agents[g^1]. Each lane
        // owns exactly one output record.
        {
            let field = self.fields.read(generation);
            let (src, dst) = self.agents.split(generation);
            dst.par_iter_mut().enumerate().for_each(|(index, out)| {
                *out = kernels::step_agent(index as u32, src[index], field, config);
            });
        }

        // Deposition: agents[g^1] rasterized on top of field[g], which then
        // holds the pre-decay state for this tick.
        {
            let agents = self.agents.read(generation.flip());
            kernels::deposit(self.fields.read_mut(generation), agents, config);
        }

        // Decay/diffusion: field[g] -> field[g^1], one lane per output row.
        {
            let (src, dst) = self.fields.split(generation);
            let width = dst.width() as usize;
            dst.cells_mut()
                .par_chunks_mut(width)
                .enumerate()
                .for_each(|(py, row)| {
                    for (px, cell) in row.iter_mut().enumerate() {
                        *cell = kernels::blur_decay_cell(src, px as u32, py as u32, config);
                    }
                });
        }

        self.generation = generation.flip();
        self.ticks += 1;
    }

    /// The current agent generation.
    pub fn agents(&self) -> &[AgentRecord] {
        self.agents.read(self.generation)
    }

    /// The current (post-decay) field generation.
    pub fn field(&self) -> &TrailField {
        self.fields.read(self.generation)
    }

    /// The generation the next tick will read from.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The configuration this pipeline was built with.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
