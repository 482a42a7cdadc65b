//! The trail field: a display-resolution grid agents deposit into and sense
//! from.
//!
//! Each cell holds four channels; only channel 0 carries the trail strength
//! the sensors read, the rest round out a pixel. The same layout lives in an
//! `array<vec4<f32>>` storage buffer on the GPU side.

use glam::Vec2;

/// A 2D RGBA f32 grid in row-major order.
#[derive(Clone, Debug)]
pub struct TrailField {
    width: u32,
    height: u32,
    cells: Vec<[f32; 4]>,
}

impl TrailField {
    /// Create a zeroed field at the given resolution.
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "field must have a nonzero area");
        Self {
            width,
            height,
            cells: vec![[0.0; 4]; (width * height) as usize],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Cell at integer pixel coordinates. Caller must stay in bounds.
    #[inline]
    pub fn get(&self, px: u32, py: u32) -> [f32; 4] {
        debug_assert!(px < self.width && py < self.height);
        self.cells[(py * self.width + px) as usize]
    }

    /// Overwrite the cell at integer pixel coordinates.
    #[inline]
    pub fn set(&mut self, px: u32, py: u32, value: [f32; 4]) {
        debug_assert!(px < self.width && py < self.height);
        self.cells[(py * self.width + px) as usize] = value;
    }

    /// Sample at normalized coordinates with nearest-neighbor lookup and
    /// clamp-to-edge addressing, matching the GPU texture semantics.
    #[inline]
    pub fn sample(&self, at: Vec2) -> [f32; 4] {
        let px = ((at.x * self.width as f32) as i64).clamp(0, self.width as i64 - 1);
        let py = ((at.y * self.height as f32) as i64).clamp(0, self.height as i64 - 1);
        self.cells[(py * self.width as i64 + px) as usize]
    }

    /// Trail strength (channel 0) at normalized coordinates.
    #[inline]
    pub fn trail(&self, at: Vec2) -> f32 {
        self.sample(at)[0]
    }

    /// All cells, row-major.
    #[inline]
    pub fn cells(&self) -> &[[f32; 4]] {
        &self.cells
    }

    /// Mutable cells, row-major.
    #[inline]
    pub fn cells_mut(&mut self) -> &mut [[f32; 4]] {
        &mut self.cells
    }

    /// Sum of channel 0 over the whole field.
    pub fn total_intensity(&self) -> f64 {
        self.cells.iter().map(|c| c[0] as f64).sum()
    }
}
