//! Two-tone perforated ring, drawn every tick from a [`GeometryDescriptor`].
//!
//! Drawing goes through the minimal [`DrawSurface`] capability so the same
//! plan can target the software rasterizer here or any other 2D backend.
//!
//! [`GeometryDescriptor`]: crate::animation::GeometryDescriptor

mod layout;
mod raster;

pub use layout::{plan_ring, render_ring, DrawCommand, RingLayout, PERFORATION_COUNT};
pub use raster::RasterSurface;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Straight (non-premultiplied) color with float opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }
}

/// Soft shadow painted under a fill, canvas style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub color: Rgba,
    pub blur: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillParams {
    pub color: Rgba,
    pub shadow: Option<Shadow>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingRadii {
    pub outer: f32,
    pub inner: f32,
}

/// Immediate-mode drawing capability in physical pixels.
pub trait DrawSurface {
    /// Physical buffer size in pixels (width, height).
    fn physical_size(&self) -> (u32, u32);

    /// Reallocate the physical buffer; contents are cleared.
    fn resize(&mut self, width: u32, height: u32);

    fn clear(&mut self);

    fn draw_ring(&mut self, center: Point, radii: RingRadii, fill: &FillParams);

    fn draw_dot(&mut self, center: Point, radius: f32, fill: &FillParams);
}
