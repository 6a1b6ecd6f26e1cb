use super::{DrawSurface, FillParams, Point, Rgba, RingRadii, Shadow};
use crate::animation::GeometryDescriptor;
use std::f32::consts::TAU;

/// Evenly spaced marks on the inner circle.
pub const PERFORATION_COUNT: usize = 8;

const RING_FILL: Rgba = Rgba::rgb(0xE0, 0xE5, 0xEC);
const AMBIENT_SHADOW: Rgba = Rgba::rgb(143, 157, 178);
const HIGHLIGHT_GLOW: Rgba = Rgba::rgb(255, 255, 255);
const PERFORATION_FILL: Rgba = Rgba::rgb(0x91, 0x90, 0x93);
const PERFORATION_SHADOW_ALPHA: f32 = 0.4;

/// Ring geometry derived from the component's logical size and pixel ratio.
///
/// Radii are computed in logical pixels (floored like a CSS layout would) and
/// then multiplied by the pixel ratio, so the ring stays a perfect circle in a
/// square physical buffer at any density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingLayout {
    logical_size: u32,
    pixel_ratio: f32,
}

impl RingLayout {
    pub fn new(logical_size: u32, pixel_ratio: f32) -> Self {
        Self {
            logical_size: logical_size.max(1),
            pixel_ratio: if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
                pixel_ratio
            } else {
                1.0
            },
        }
    }

    pub fn on_resize(&mut self, logical_size: u32) {
        self.logical_size = logical_size.max(1);
    }

    pub fn on_pixel_ratio_change(&mut self, pixel_ratio: f32) {
        *self = Self::new(self.logical_size, pixel_ratio);
    }

    pub fn logical_size(&self) -> u32 {
        self.logical_size
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Side of the square physical buffer.
    pub fn physical_size(&self) -> u32 {
        ((self.logical_size as f32 * self.pixel_ratio).round() as u32).max(1)
    }

    fn logical_fraction(&self, fraction: f64) -> f32 {
        (f64::from(self.logical_size) * fraction).floor() as f32
    }

    pub fn center(&self) -> Point {
        let half = self.physical_size() as f32 / 2.0;
        Point::new(half, half)
    }

    pub fn base_radius(&self) -> f32 {
        self.logical_fraction(0.35) * self.pixel_ratio
    }

    pub fn ring_width(&self) -> f32 {
        self.logical_fraction(0.08) * self.pixel_ratio
    }

    pub fn perforation_circle_radius(&self) -> f32 {
        (self.base_radius() - self.ring_width()) * 0.45
    }

    pub fn perforation_radius(&self) -> f32 {
        self.logical_fraction(0.02) * self.pixel_ratio
    }

    pub fn radii(&self, scale: f32) -> RingRadii {
        RingRadii {
            outer: self.base_radius() * scale,
            inner: (self.base_radius() - self.ring_width()) * scale,
        }
    }

    pub fn perforation_centers(&self) -> Vec<Point> {
        let center = self.center();
        let radius = self.perforation_circle_radius();
        (0..PERFORATION_COUNT)
            .map(|i| {
                let angle = i as f32 / PERFORATION_COUNT as f32 * TAU;
                Point::new(
                    center.x + radius * angle.cos(),
                    center.y + radius * angle.sin(),
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Ring {
        center: Point,
        radii: RingRadii,
        fill: FillParams,
    },
    Dot {
        center: Point,
        radius: f32,
        fill: FillParams,
    },
}

/// Draw list for one tick: clear, shadow pass, glow pass, perforations.
pub fn plan_ring(layout: &RingLayout, geometry: &GeometryDescriptor) -> Vec<DrawCommand> {
    let dpr = layout.pixel_ratio();
    let envelope = geometry.envelope.clamp(0.0, 1.0);
    let center = layout.center();
    let radii = layout.radii(geometry.scale);
    let glow_offset = layout.logical_fraction(0.05) * geometry.scale;

    let mut commands = Vec::with_capacity(3 + PERFORATION_COUNT);
    commands.push(DrawCommand::Clear);
    commands.push(DrawCommand::Ring {
        center,
        radii,
        fill: FillParams {
            color: RING_FILL,
            shadow: Some(Shadow {
                color: AMBIENT_SHADOW.with_alpha(geometry.shadow_intensity),
                blur: ((12.0 + envelope * 6.0) * dpr).floor(),
                offset_x: (4.0 * dpr).floor(),
                offset_y: (4.0 * dpr).floor(),
            }),
        },
    });
    commands.push(DrawCommand::Ring {
        center,
        radii,
        fill: FillParams {
            color: RING_FILL,
            shadow: Some(Shadow {
                color: HIGHLIGHT_GLOW.with_alpha(geometry.glow_intensity),
                blur: ((14.0 + envelope * 5.0) * dpr).floor(),
                offset_x: -glow_offset,
                offset_y: -glow_offset,
            }),
        },
    });

    let perforation = FillParams {
        color: PERFORATION_FILL,
        shadow: Some(Shadow {
            color: AMBIENT_SHADOW.with_alpha(PERFORATION_SHADOW_ALPHA),
            blur: 0.5 * dpr,
            offset_x: 0.3 * dpr,
            offset_y: 0.3 * dpr,
        }),
    };
    let radius = layout.perforation_radius();
    commands.extend(
        layout
            .perforation_centers()
            .into_iter()
            .map(|center| DrawCommand::Dot {
                center,
                radius,
                fill: perforation,
            }),
    );
    commands
}

/// Draw one tick onto `surface`, resizing its buffer first if the layout changed.
pub fn render_ring(
    layout: &RingLayout,
    geometry: &GeometryDescriptor,
    surface: &mut dyn DrawSurface,
) {
    let side = layout.physical_size();
    if surface.physical_size() != (side, side) {
        surface.resize(side, side);
    }
    for command in plan_ring(layout, geometry) {
        match command {
            DrawCommand::Clear => surface.clear(),
            DrawCommand::Ring {
                center,
                radii,
                fill,
            } => surface.draw_ring(center, radii, &fill),
            DrawCommand::Dot {
                center,
                radius,
                fill,
            } => surface.draw_dot(center, radius, &fill),
        }
    }
}
