//! Per-lane simulation kernels.
//!
//! Every function here is a pure function of (lane index, input records,
//! configuration): the CPU pipeline dispatches them with `rayon`, and the
//! WGSL kernels in [`crate::shaders`] are line-for-line ports of the same
//! logic. Behavioral changes must land in both places.

use glam::Vec2;

use crate::agent::AgentRecord;
use crate::config::SimConfig;
use crate::field::TrailField;

/// Avalanching integer mixer used for the per-agent random draw.
///
/// Pure and stateless: the same input always hashes to the same output.
#[inline]
pub fn hash(mut x: u32) -> u32 {
    x ^= 2747636419;
    x = x.wrapping_mul(2654435769);
    x ^= x >> 16;
    x = x.wrapping_mul(2654435769);
    x ^= x >> 16;
    x = x.wrapping_mul(2654435769);
    x
}

/// Deterministic pseudo-random scalar in `[0, 1)` for an agent index.
#[inline]
pub fn pseudo_random(index: u32) -> f32 {
    hash(index) as f32 / 4294967295.0
}

/// Sum the trail strength over a square neighborhood around a sensor probe.
///
/// The probe sits `sensor_offset` away from the agent along `heading +
/// offset`; the neighborhood spans `±sensor_radius` sampled one pixel apart
/// in normalized units.
pub fn sense(
    field: &TrailField,
    position: Vec2,
    heading: f32,
    offset: f32,
    config: &SimConfig,
) -> f32 {
    let angle = heading + offset;
    let centre = position + Vec2::new(angle.cos(), angle.sin()) * config.sensor_offset;
    let step_x = 1.0 / field.width() as f32;
    let step_y = 1.0 / field.height() as f32;

    let mut sum = 0.0;
    let mut i = -config.sensor_radius;
    while i <= config.sensor_radius {
        let mut j = -config.sensor_radius;
        while j <= config.sensor_radius {
            sum += field.trail(centre + Vec2::new(i, j));
            j += step_y;
        }
        i += step_x;
    }
    sum
}

/// Motion & sensing step for one agent: advance along the heading, reflect
/// at the domain boundary, then steer toward the strongest sensor reading.
///
/// The steering branches are evaluated in a fixed order and the first match
/// wins; when all three readings tie, the heading is left alone.
pub fn step_agent(
    index: u32,
    agent: AgentRecord,
    field: &TrailField,
    config: &SimConfig,
) -> AgentRecord {
    let draw = pseudo_random(index);

    let mut position = agent.position
        + Vec2::new(agent.heading.cos(), agent.heading.sin()) * config.move_speed;
    let mut heading = agent.heading;

    // Leaving the unit square reverses the heading outright; both axes are
    // pulled back into [0, 0.99] even when only one overflowed.
    if !(0.0..=1.0).contains(&position.x) || !(0.0..=1.0).contains(&position.y) {
        position = position.clamp(Vec2::ZERO, Vec2::splat(0.99));
        heading += std::f32::consts::PI;
    }

    let forward = sense(field, position, heading, 0.0, config);
    let left = sense(field, position, heading, 1.0, config);
    let right = sense(field, position, heading, -1.0, config);

    if forward > left && forward > right {
        // Hold course.
    } else if forward < left && forward < right {
        heading += (draw - 0.5) * config.turn_speed;
    } else if right > left {
        heading -= draw * config.turn_speed;
    } else if right < left {
        heading += draw * config.turn_speed;
    }

    AgentRecord {
        position,
        heading,
        reserved: agent.reserved,
    }
}

/// Rasterize every agent as a fixed-size, fixed-color square splat into the
/// field, in index order.
///
/// Overlapping splats overwrite each other; iterating in index order makes
/// the winner deterministic here, which is more than the GPU kernel promises
/// (its lanes race and the last hardware write wins).
pub fn deposit(field: &mut TrailField, agents: &[AgentRecord], config: &SimConfig) {
    let width = field.width() as i64;
    let height = field.height() as i64;
    let side = config.point_size.round().max(1.0) as i64;
    let half = config.point_size * 0.5;

    for agent in agents {
        let fx = agent.position.x * width as f32;
        let fy = agent.position.y * height as f32;
        let x0 = (fx - half + 0.5).floor() as i64;
        let y0 = (fy - half + 0.5).floor() as i64;

        for dy in 0..side {
            for dx in 0..side {
                let px = x0 + dx;
                let py = y0 + dy;
                if px >= 0 && px < width && py >= 0 && py < height {
                    field.set(px as u32, py as u32, config.deposit_color);
                }
            }
        }
    }
}

/// Blur-and-fade for one output cell: sum the centre plus `quality` radii
/// along each of `directions` evenly spaced angles, divide by the empirical
/// normalizer, subtract the per-tick fade, and clamp each channel to [0, 1]
/// (the range the display pipeline would impose anyway).
pub fn blur_decay_cell(src: &TrailField, px: u32, py: u32, config: &SimConfig) -> [f32; 4] {
    let width = src.width() as f32;
    let height = src.height() as f32;
    let centre = Vec2::new((px as f32 + 0.5) / width, (py as f32 + 0.5) / height);
    let radius = Vec2::new(config.blur_size / width, config.blur_size / height);

    let mut color = src.sample(centre);
    let angle_step = std::f32::consts::TAU / config.blur_directions as f32;
    for dir in 0..config.blur_directions {
        let angle = dir as f32 * angle_step;
        for ring in 1..=config.blur_quality {
            let reach = ring as f32 / config.blur_quality as f32;
            let s = src.sample(centre + Vec2::new(angle.cos(), angle.sin()) * radius * reach);
            for c in 0..4 {
                color[c] += s[c];
            }
        }
    }

    let normalizer = config.blur_normalizer();
    let fade = config.fade_per_tick();
    let mut out = [0.0; 4];
    for c in 0..4 {
        out[c] = (color[c] / normalizer - fade).clamp(0.0, 1.0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn probe_config() -> SimConfig {
        // Zero move speed keeps the probe geometry anchored at the spawn
        // position, and a widened probe offset separates the three sensor
        // windows (at the stock offset they overlap).
        SimConfig::new().with_move_speed(0.0).with_sensor_offset(0.1)
    }

    // ========== Hash Tests ==========

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash(0), hash(0));
        assert_eq!(hash(12345), hash(12345));
        assert_ne!(hash(1), hash(2));
    }

    #[test]
    fn test_pseudo_random_in_unit_range() {
        for index in [0u32, 1, 17, 4095, u32::MAX] {
            let draw = pseudo_random(index);
            assert!((0.0..=1.0).contains(&draw), "draw {} out of range", draw);
        }
    }

    // ========== Motion Tests ==========

    #[test]
    fn test_empty_field_advances_straight() {
        let config = SimConfig::new();
        let field = TrailField::new(64, 64);
        let agent = AgentRecord::new(Vec2::new(0.5, 0.5), 0.0);

        let next = step_agent(0, agent, &field, &config);

        assert!((next.position.x - (0.5 + config.move_speed)).abs() < 1e-6);
        assert!((next.position.y - 0.5).abs() < 1e-6);
        // All three sensor readings tie at zero, so the heading holds.
        assert_eq!(next.heading, 0.0);
    }

    #[test]
    fn test_boundary_reverses_heading_and_reclamps_both_axes() {
        let config = SimConfig::new();
        let field = TrailField::new(64, 64);
        let agent = AgentRecord::new(Vec2::new(0.999, 0.5), 0.0);

        let next = step_agent(0, agent, &field, &config);

        assert_eq!(next.position.x, 0.99);
        assert_eq!(next.position.y, 0.5); // already inside [0, 0.99], unchanged
        assert!((next.heading - PI).abs() < 1e-6);
    }

    #[test]
    fn test_boundary_reversal_applies_on_y_axis_too() {
        let config = SimConfig::new();
        let field = TrailField::new(64, 64);
        let agent = AgentRecord::new(Vec2::new(0.5, 0.9995), PI / 2.0);

        let next = step_agent(0, agent, &field, &config);

        assert_eq!(next.position.y, 0.99);
        assert!((next.heading - (PI / 2.0 + PI)).abs() < 1e-5);
    }

    // ========== Sensing & Steering Tests ==========
    //
    // Geometry for a 100x100 field, agent at (0.5, 0.5), heading 0, probe
    // offset 0.1, sensor radius 0.02: the probe centres sit at pixels
    // (60, 50) forward, (55.4, 58.4) left (heading + 1 rad) and (55.4, 41.6)
    // right (heading - 1 rad), each summing a window of about +/-2 pixels.
    // The lit cells below sit in the middle of exactly one window.

    fn field_with(cells: &[(u32, u32)]) -> TrailField {
        let mut field = TrailField::new(100, 100);
        for &(px, py) in cells {
            field.set(px, py, [1.0, 0.0, 0.0, 0.0]);
        }
        field
    }

    #[test]
    fn test_forward_strongest_holds_course() {
        let config = probe_config();
        let field = field_with(&[(60, 50)]); // forward window only
        let agent = AgentRecord::new(Vec2::new(0.5, 0.5), 0.0);

        let next = step_agent(0, agent, &field, &config);
        assert_eq!(next.heading, 0.0);
    }

    #[test]
    fn test_left_strongest_turns_left() {
        let config = probe_config();
        let field = field_with(&[(55, 58)]); // left window only
        let agent = AgentRecord::new(Vec2::new(0.5, 0.5), 0.0);

        let next = step_agent(3, agent, &field, &config);
        let expected = pseudo_random(3) * config.turn_speed;
        assert!((next.heading - expected).abs() < 1e-6);
    }

    #[test]
    fn test_right_strongest_turns_right() {
        let config = probe_config();
        let field = field_with(&[(55, 42)]); // right window only
        let agent = AgentRecord::new(Vec2::new(0.5, 0.5), 0.0);

        let next = step_agent(3, agent, &field, &config);
        let expected = -pseudo_random(3) * config.turn_speed;
        assert!((next.heading - expected).abs() < 1e-6);
    }

    #[test]
    fn test_forward_weakest_jitters_around_heading() {
        let config = probe_config();
        // Both side windows lit, forward dark.
        let field = field_with(&[(55, 58), (55, 42)]);
        let agent = AgentRecord::new(Vec2::new(0.5, 0.5), 0.0);

        let next = step_agent(9, agent, &field, &config);
        let expected = (pseudo_random(9) - 0.5) * config.turn_speed;
        assert!((next.heading - expected).abs() < 1e-6);
    }

    #[test]
    fn test_three_way_tie_keeps_heading() {
        let config = probe_config();
        let field = TrailField::new(100, 100);
        let agent = AgentRecord::new(Vec2::new(0.5, 0.5), 1.234);

        let next = step_agent(7, agent, &field, &config);
        assert_eq!(next.heading, 1.234);
    }

    // ========== Deposition Tests ==========

    #[test]
    fn test_deposit_writes_point_size_splat() {
        let config = SimConfig::new();
        let mut field = TrailField::new(100, 100);
        let agents = [AgentRecord::new(Vec2::new(0.5, 0.5), 0.0)];

        deposit(&mut field, &agents, &config);

        // A 2x2 splat centred on pixel coordinate (50, 50).
        for (px, py) in [(49, 49), (50, 49), (49, 50), (50, 50)] {
            assert_eq!(field.get(px, py), config.deposit_color);
        }
        assert_eq!(field.get(51, 50), [0.0; 4]);
        assert_eq!(field.get(48, 50), [0.0; 4]);
    }

    #[test]
    fn test_deposit_clips_at_domain_edge() {
        let config = SimConfig::new();
        let mut field = TrailField::new(100, 100);
        let agents = [AgentRecord::new(Vec2::new(0.999, 0.999), 0.0)];

        deposit(&mut field, &agents, &config);

        // The splat straddles the edge; only the in-bounds pixels land.
        assert_eq!(field.get(99, 99), config.deposit_color);
    }

    #[test]
    fn test_deposit_last_writer_wins_in_index_order() {
        let config = SimConfig::new().with_deposit_color([0.5, 0.5, 0.5, 1.0]);
        let mut field = TrailField::new(100, 100);
        field.set(50, 50, [9.0, 9.0, 9.0, 9.0]);
        let agents = [
            AgentRecord::new(Vec2::new(0.5, 0.5), 0.0),
            AgentRecord::new(Vec2::new(0.5, 0.5), 1.0),
        ];

        deposit(&mut field, &agents, &config);

        // Both agents cover the pixel; the later one overwrote it with the
        // same fixed color (no accumulation).
        assert_eq!(field.get(50, 50), [0.5, 0.5, 0.5, 1.0]);
    }

    // ========== Blur/Decay Tests ==========

    #[test]
    fn test_uniform_field_blur_value() {
        let config = SimConfig::new();
        let mut field = TrailField::new(32, 32);
        for cell in field.cells_mut() {
            *cell = [0.5, 0.0, 0.0, 0.0];
        }

        // Interior cell: all 13 samples read 0.5.
        let out = blur_decay_cell(&field, 16, 16, &config);
        let expected = (0.5 * 13.0 / config.blur_normalizer()) - config.fade_per_tick();
        assert!((out[0] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_isolated_cell_attenuates() {
        let config = SimConfig::new();
        let mut field = TrailField::new(32, 32);
        field.set(16, 16, [1.0, 1.0, 1.0, 1.0]);

        let out = blur_decay_cell(&field, 16, 16, &config);
        // Only the centre sample is lit: 1 / 9.2, minus the fade.
        let expected = 1.0 / config.blur_normalizer() - config.fade_per_tick();
        assert!((out[0] - expected).abs() < 1e-5);
        assert!(out[0] < 1.0);
    }

    #[test]
    fn test_blur_output_is_clamped_non_negative() {
        let config = SimConfig::new();
        let field = TrailField::new(32, 32);

        let out = blur_decay_cell(&field, 10, 10, &config);
        // A dark cell minus the fade must floor at zero, not go negative.
        assert_eq!(out, [0.0; 4]);
    }

    #[test]
    fn test_blur_output_is_clamped_to_display_range() {
        let config = SimConfig::new();
        let mut field = TrailField::new(32, 32);
        for cell in field.cells_mut() {
            *cell = [1.0, 1.0, 1.0, 1.0];
        }

        // Saturated input has 13/9.2 gain before the clamp.
        let out = blur_decay_cell(&field, 16, 16, &config);
        assert_eq!(out[0], 1.0);
    }
}
