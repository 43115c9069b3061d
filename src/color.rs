//! Color types used by materials and render targets.

pub use rgb::{Rgb, Rgba};

/// The color type used throughout the gallery. RGBA with f32 components in [0.0, 1.0].
pub type Color = Rgba<f32>;

/// Opaque white.
pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

/// Fully transparent black, the clear color of every canvas.
pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

/// Converts a color into the array layout expected by uniform buffers.
#[inline]
pub fn to_array(color: Color) -> [f32; 4] {
    [color.r, color.g, color.b, color.a]
}

/// Converts a wgpu-compatible clear color.
#[inline]
pub fn to_wgpu(color: Color) -> wgpu::Color {
    wgpu::Color {
        r: color.r as f64,
        g: color.g as f64,
        b: color.b as f64,
        a: color.a as f64,
    }
}
