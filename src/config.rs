//! Simulation configuration.
//!
//! All tuning constants are fixed at startup: they are baked into the
//! generated WGSL kernels and captured by the CPU pipeline at construction.
//! There is no runtime reconfiguration path; change a value, rebuild, rerun.
//!
//! # Example
//!
//! ```ignore
//! use myxo::SimConfig;
//!
//! let config = SimConfig::new()
//!     .with_agent_count(8192)
//!     .with_move_speed(0.003)
//!     .with_fade_speed(0.08);
//! ```

/// Immutable simulation parameters.
///
/// The defaults are the tuned values the visuals were designed around; some
/// are deliberately not "nice" numbers (see [`SimConfig::blur_normalizer`]).
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Number of agents, fixed for the lifetime of the run.
    pub agent_count: u32,

    /// Side length of the square splat each agent deposits, in pixels.
    pub point_size: f32,

    /// Maximum heading change per tick, in radians (scaled by the per-agent
    /// pseudo-random draw).
    pub turn_speed: f32,

    /// Distance travelled along the heading per tick, in normalized units.
    pub move_speed: f32,

    /// Trail fade control; the amount subtracted from every channel each
    /// tick is `fade_speed * 0.001`.
    pub fade_speed: f32,

    /// Half-width of the square neighborhood summed by each sensor probe,
    /// in normalized units.
    pub sensor_radius: f32,

    /// Distance of each sensor probe centre from the agent position, in
    /// normalized units.
    pub sensor_offset: f32,

    /// Number of evenly spaced blur directions around the circle.
    pub blur_directions: u32,

    /// Number of sample radii per blur direction.
    pub blur_quality: u32,

    /// Outer blur radius in pixels.
    pub blur_size: f32,

    /// RGBA color written for every deposited point.
    pub deposit_color: [f32; 4],
}

impl SimConfig {
    /// Create a configuration with the stock defaults.
    pub fn new() -> Self {
        Self {
            agent_count: 4096,
            point_size: 2.0,
            turn_speed: 0.2,
            move_speed: 0.002,
            fade_speed: 0.05,
            sensor_radius: 0.02,
            sensor_offset: 0.02,
            blur_directions: 4,
            blur_quality: 3,
            blur_size: 3.0,
            deposit_color: [0.282, 0.909, 1.0, 1.0],
        }
    }

    /// Set the number of agents.
    pub fn with_agent_count(mut self, count: u32) -> Self {
        assert!(count >= 1, "agent count must be at least 1");
        self.agent_count = count;
        self
    }

    /// Set the deposited point size in pixels.
    pub fn with_point_size(mut self, size: f32) -> Self {
        assert!(size >= 1.0, "point size must be at least 1 pixel");
        self.point_size = size;
        self
    }

    /// Set the turn speed in radians per tick.
    pub fn with_turn_speed(mut self, speed: f32) -> Self {
        self.turn_speed = speed;
        self
    }

    /// Set the move speed in normalized units per tick.
    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    /// Set the fade control (per-tick fade is `fade_speed * 0.001`).
    pub fn with_fade_speed(mut self, speed: f32) -> Self {
        self.fade_speed = speed;
        self
    }

    /// Set the sensor neighborhood half-width in normalized units.
    pub fn with_sensor_radius(mut self, radius: f32) -> Self {
        self.sensor_radius = radius;
        self
    }

    /// Set the sensor probe offset distance in normalized units.
    pub fn with_sensor_offset(mut self, offset: f32) -> Self {
        self.sensor_offset = offset;
        self
    }

    /// Set the blur direction and radius counts and the outer radius.
    pub fn with_blur(mut self, directions: u32, quality: u32, size: f32) -> Self {
        assert!(directions >= 1, "blur needs at least one direction");
        assert!(quality >= 1, "blur needs at least one radius");
        self.blur_directions = directions;
        self.blur_quality = quality;
        self.blur_size = size;
        self
    }

    /// Set the deposited trail color.
    pub fn with_deposit_color(mut self, color: [f32; 4]) -> Self {
        self.deposit_color = color;
        self
    }

    /// The amount subtracted from every field channel each tick.
    #[inline]
    pub fn fade_per_tick(&self) -> f32 {
        self.fade_speed * 0.001
    }

    /// Divisor applied to the blur sample sum.
    ///
    /// This is NOT the true sample average (`quality * directions + 1`); the
    /// `- 2.8` keeps a little gain in the loop and is part of the tuned
    /// look. Do not correct it.
    #[inline]
    pub fn blur_normalizer(&self) -> f32 {
        self.blur_quality as f32 * self.blur_directions as f32 - 2.8
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_defaults() {
        let config = SimConfig::new();
        assert_eq!(config.agent_count, 4096);
        assert!((config.point_size - 2.0).abs() < 1e-6);
        assert!((config.turn_speed - 0.2).abs() < 1e-6);
        assert!((config.move_speed - 0.002).abs() < 1e-6);
        assert!((config.fade_speed - 0.05).abs() < 1e-6);
        assert!((config.sensor_radius - 0.02).abs() < 1e-6);
        assert!((config.sensor_offset - 0.02).abs() < 1e-6);
        assert_eq!(config.blur_directions, 4);
        assert_eq!(config.blur_quality, 3);
        assert!((config.blur_size - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_builder_chaining() {
        let config = SimConfig::new()
            .with_agent_count(512)
            .with_move_speed(0.01)
            .with_turn_speed(0.5)
            .with_blur(8, 4, 2.0);

        assert_eq!(config.agent_count, 512);
        assert!((config.move_speed - 0.01).abs() < 1e-6);
        assert!((config.turn_speed - 0.5).abs() < 1e-6);
        assert_eq!(config.blur_directions, 8);
        assert_eq!(config.blur_quality, 4);
    }

    #[test]
    fn test_fade_per_tick() {
        let config = SimConfig::new();
        assert!((config.fade_per_tick() - 0.05 * 0.001).abs() < 1e-9);
    }

    #[test]
    fn test_blur_normalizer_keeps_empirical_constant() {
        let config = SimConfig::new();
        // 3 * 4 - 2.8, not the true average divisor 13.
        assert!((config.blur_normalizer() - 9.2).abs() < 1e-5);
    }

    #[test]
    #[should_panic(expected = "agent count must be at least 1")]
    fn test_zero_agents_rejected() {
        SimConfig::new().with_agent_count(0);
    }

    #[test]
    #[should_panic(expected = "at least one direction")]
    fn test_zero_blur_directions_rejected() {
        SimConfig::new().with_blur(0, 3, 3.0);
    }
}
