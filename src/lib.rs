//! # myxo
//!
//! A Physarum-style trail simulator: thousands of agents advance, sense the
//! trail field through three probes and steer toward the strongest reading,
//! while their deposits blur and fade underneath them. The emergent result
//! is an organic vein network that reinforces itself where agents agree.
//!
//! The whole engine is built on strict double buffering: the agent table
//! and the trail field each exist as a generation-indexed pair of buffers,
//! and every stage reads one generation while writing the other. No locks,
//! no atomics on the hot path; the buffer orientation is the only
//! synchronization there is.
//!
//! ## Quick Start
//!
//! ```ignore
//! use myxo::{scheduler, SimConfig};
//!
//! fn main() {
//!     env_logger::init();
//!     scheduler::run(SimConfig::default()).unwrap();
//! }
//! ```
//!
//! ## Two execution paths, one set of semantics
//!
//! - [`gpu::GpuState`] runs the tick as three compute passes plus a present
//!   pass, with all tuning constants baked into generated WGSL
//!   ([`shaders`]).
//! - [`CpuPipeline`] runs the identical per-lane kernels ([`kernels`]) on
//!   the host with `rayon`, for tests and headless use.
//!
//! The CPU kernels are the executable reference for the WGSL; the two are
//! kept in lockstep by hand and by the shader validation tests.

pub mod agent;
pub mod buffers;
pub mod config;
pub mod error;
pub mod field;
pub mod gpu;
pub mod kernels;
pub mod pipeline;
pub mod scheduler;
pub mod shaders;

pub use agent::AgentRecord;
pub use buffers::{Generation, PingPong};
pub use config::SimConfig;
pub use error::{GpuError, SimulationError};
pub use field::TrailField;
pub use glam::Vec2;
pub use pipeline::CpuPipeline;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::agent::AgentRecord;
    pub use crate::buffers::{Generation, PingPong};
    pub use crate::config::SimConfig;
    pub use crate::error::{GpuError, SimulationError};
    pub use crate::field::TrailField;
    pub use crate::pipeline::CpuPipeline;
    pub use crate::scheduler;
    pub use crate::Vec2;
}
