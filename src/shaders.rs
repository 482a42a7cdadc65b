//! WGSL kernel generation.
//!
//! Every kernel is generated from the immutable [`SimConfig`] with all
//! tuning constants baked into the source text, so the GPU never reads a
//! uniform that could drift from the configuration the run started with.
//! The generated code mirrors [`crate::kernels`] statement for statement;
//! keep the two in lockstep.

use crate::config::SimConfig;

/// Lanes per compute workgroup, shared by every kernel.
pub const WORKGROUP_SIZE: u32 = 256;

/// Motion & sensing kernel: `agents_in` + `field_in` -> `agents_out`.
///
/// One lane per agent. Reads only the previous generation of both stores and
/// writes only its own slot of the next agent generation.
pub fn motion(config: &SimConfig, width: u32, height: u32) -> String {
    format!(
        r#"struct Agent {{
    position: vec2<f32>,
    heading: f32,
    reserved: f32,
}};

@group(0) @binding(0)
var<storage, read> agents_in: array<Agent>;

@group(0) @binding(1)
var<storage, read_write> agents_out: array<Agent>;

@group(0) @binding(2)
var<storage, read> field_in: array<vec4<f32>>;

const MOVE_SPEED: f32 = {move_speed:.4};
const TURN_SPEED: f32 = {turn_speed:.4};
const SENSOR_RADIUS: f32 = {sensor_radius:.4};
const SENSOR_OFFSET: f32 = {sensor_offset:.4};
const WIDTH: f32 = {width}.0;
const HEIGHT: f32 = {height}.0;
const WIDTH_I: i32 = {width};
const HEIGHT_I: i32 = {height};
const PI: f32 = 3.14159265;

fn hash(v: u32) -> u32 {{
    var x = v;
    x ^= 2747636419u;
    x *= 2654435769u;
    x ^= x >> 16u;
    x *= 2654435769u;
    x ^= x >> 16u;
    x *= 2654435769u;
    return x;
}}

// Nearest-neighbor, clamp-to-edge read of the trail channel.
fn trail_at(at: vec2<f32>) -> f32 {{
    let px = clamp(i32(at.x * WIDTH), 0, WIDTH_I - 1);
    let py = clamp(i32(at.y * HEIGHT), 0, HEIGHT_I - 1);
    return field_in[py * WIDTH_I + px].x;
}}

fn sense(position: vec2<f32>, heading: f32, offset: f32) -> f32 {{
    let angle = heading + offset;
    let centre = position + vec2<f32>(cos(angle), sin(angle)) * SENSOR_OFFSET;
    var sum = 0.0;
    for (var i = -SENSOR_RADIUS; i <= SENSOR_RADIUS; i += 1.0 / WIDTH) {{
        for (var j = -SENSOR_RADIUS; j <= SENSOR_RADIUS; j += 1.0 / HEIGHT) {{
            sum += trail_at(centre + vec2<f32>(i, j));
        }}
    }}
    return sum;
}}

@compute @workgroup_size({workgroup_size})
fn main(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let index = global_id.x;
    if index >= arrayLength(&agents_in) {{
        return;
    }}

    let a = agents_in[index];
    let draw = f32(hash(index)) / 4294967295.0;

    var position = a.position + vec2<f32>(cos(a.heading), sin(a.heading)) * MOVE_SPEED;
    var heading = a.heading;

    // Leaving the unit square reverses the heading; both axes re-clamp.
    if position.x < 0.0 || position.x > 1.0 || position.y < 0.0 || position.y > 1.0 {{
        position = clamp(position, vec2<f32>(0.0), vec2<f32>(0.99));
        heading += PI;
    }}

    let forward = sense(position, heading, 0.0);
    let left = sense(position, heading, 1.0);
    let right = sense(position, heading, -1.0);

    // First match wins; a three-way tie falls through with no turn.
    if forward > left && forward > right {{
        heading += 0.0;
    }} else if forward < left && forward < right {{
        heading += (draw - 0.5) * TURN_SPEED;
    }} else if right > left {{
        heading -= draw * TURN_SPEED;
    }} else if right < left {{
        heading += draw * TURN_SPEED;
    }}

    agents_out[index] = Agent(position, heading, a.reserved);
}}
"#,
        move_speed = config.move_speed,
        turn_speed = config.turn_speed,
        sensor_radius = config.sensor_radius,
        sensor_offset = config.sensor_offset,
        width = width,
        height = height,
        workgroup_size = WORKGROUP_SIZE,
    )
}

/// Deposition kernel: `agents` splatted on top of `field`.
///
/// One lane per agent, plain stores; when two lanes cover the same pixel in
/// one tick the last hardware write wins.
pub fn deposit(config: &SimConfig, width: u32, height: u32) -> String {
    format!(
        r#"struct Agent {{
    position: vec2<f32>,
    heading: f32,
    reserved: f32,
}};

@group(0) @binding(0)
var<storage, read> agents: array<Agent>;

@group(0) @binding(1)
var<storage, read_write> field: array<vec4<f32>>;

const WIDTH: f32 = {width}.0;
const HEIGHT: f32 = {height}.0;
const WIDTH_I: i32 = {width};
const HEIGHT_I: i32 = {height};
const POINT_HALF: f32 = {point_half:.4};
const SPLAT_SIDE: i32 = {splat_side};
const DEPOSIT_COLOR: vec4<f32> = vec4<f32>({r:.4}, {g:.4}, {b:.4}, {a:.4});

@compute @workgroup_size({workgroup_size})
fn main(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let index = global_id.x;
    if index >= arrayLength(&agents) {{
        return;
    }}

    let agent = agents[index];
    let x0 = i32(floor(agent.position.x * WIDTH - POINT_HALF + 0.5));
    let y0 = i32(floor(agent.position.y * HEIGHT - POINT_HALF + 0.5));

    for (var dy = 0; dy < SPLAT_SIDE; dy++) {{
        for (var dx = 0; dx < SPLAT_SIDE; dx++) {{
            let px = x0 + dx;
            let py = y0 + dy;
            if px >= 0 && px < WIDTH_I && py >= 0 && py < HEIGHT_I {{
                field[py * WIDTH_I + px] = DEPOSIT_COLOR;
            }}
        }}
    }}
}}
"#,
        width = width,
        height = height,
        point_half = config.point_size * 0.5,
        splat_side = config.point_size.round().max(1.0) as i32,
        r = config.deposit_color[0],
        g = config.deposit_color[1],
        b = config.deposit_color[2],
        a = config.deposit_color[3],
        workgroup_size = WORKGROUP_SIZE,
    )
}

/// Decay/diffusion kernel: `field_in` -> `field_out`.
///
/// One lane per output pixel. The `- 2.8` in the normalizer is not a true
/// average; it is part of the tuned look and must survive any refactor.
pub fn decay(config: &SimConfig, width: u32, height: u32) -> String {
    format!(
        r#"@group(0) @binding(0)
var<storage, read> field_in: array<vec4<f32>>;

@group(0) @binding(1)
var<storage, read_write> field_out: array<vec4<f32>>;

const WIDTH: f32 = {width}.0;
const HEIGHT: f32 = {height}.0;
const WIDTH_U: u32 = {width}u;
const TOTAL: u32 = {total}u;
const WIDTH_I: i32 = {width};
const HEIGHT_I: i32 = {height};
const TAU: f32 = 6.28318530718;
const DIRECTIONS: i32 = {directions};
const QUALITY: i32 = {quality};
const DIRECTIONS_F: f32 = {directions}.0;
const QUALITY_F: f32 = {quality}.0;
const BLUR_SIZE: f32 = {blur_size:.4};
const NORMALIZER: f32 = QUALITY_F * DIRECTIONS_F - 2.8;
const FADE: f32 = {fade:.8};

fn tap(u: f32, v: f32) -> vec4<f32> {{
    let px = clamp(i32(u * WIDTH), 0, WIDTH_I - 1);
    let py = clamp(i32(v * HEIGHT), 0, HEIGHT_I - 1);
    return field_in[py * WIDTH_I + px];
}}

@compute @workgroup_size({workgroup_size})
fn main(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let index = global_id.x;
    if index >= TOTAL {{
        return;
    }}

    let px = index % WIDTH_U;
    let py = index / WIDTH_U;
    let u = (f32(px) + 0.5) / WIDTH;
    let v = (f32(py) + 0.5) / HEIGHT;
    let radius = vec2<f32>(BLUR_SIZE / WIDTH, BLUR_SIZE / HEIGHT);

    var color = tap(u, v);
    for (var dir = 0; dir < DIRECTIONS; dir++) {{
        let angle = f32(dir) * (TAU / DIRECTIONS_F);
        for (var ring = 1; ring <= QUALITY; ring++) {{
            let reach = f32(ring) / QUALITY_F;
            color += tap(u + cos(angle) * radius.x * reach, v + sin(angle) * radius.y * reach);
        }}
    }}

    color = color / NORMALIZER - vec4<f32>(FADE);
    field_out[index] = clamp(color, vec4<f32>(0.0), vec4<f32>(1.0));
}}
"#,
        width = width,
        height = height,
        total = width * height,
        directions = config.blur_directions,
        quality = config.blur_quality,
        blur_size = config.blur_size,
        fade = config.fade_per_tick(),
        workgroup_size = WORKGROUP_SIZE,
    )
}

/// Present shader: fullscreen triangle sampling the final field buffer.
pub fn present(width: u32, height: u32) -> String {
    format!(
        r#"@group(0) @binding(0)
var<storage, read> field: array<vec4<f32>>;

const WIDTH_U: u32 = {width}u;
const HEIGHT_U: u32 = {height}u;

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> @builtin(position) vec4<f32> {{
    var corners = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -3.0),
        vec2<f32>( 3.0,  1.0),
        vec2<f32>(-1.0,  1.0),
    );
    return vec4<f32>(corners[vertex_index], 0.0, 1.0);
}}

@fragment
fn fs_main(@builtin(position) pos: vec4<f32>) -> @location(0) vec4<f32> {{
    let px = min(u32(pos.x), WIDTH_U - 1u);
    let py = min(u32(pos.y), HEIGHT_U - 1u);
    let cell = field[py * WIDTH_U + px];
    return vec4<f32>(cell.rgb, 1.0);
}}
"#,
        width = width,
        height = height,
    )
}
