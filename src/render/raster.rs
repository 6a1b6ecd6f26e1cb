//! Software rasterizer backing [`DrawSurface`] with an RGBA image buffer.
//!
//! Shapes are evaluated per pixel from their signed distance, which gives
//! anti-aliased edges and lets a shadow's blur widen the falloff band.

use super::{DrawSurface, FillParams, Point, Rgba, RingRadii, Shadow};
use image::{Rgba as Pixel, RgbaImage};
use std::path::Path;

/// Distance field of a drawable shape, positive outside.
#[derive(Debug, Clone, Copy)]
enum Shape {
    Ring { radii: RingRadii },
    Disc { radius: f32 },
}

impl Shape {
    fn signed_distance(&self, d: f32) -> f32 {
        match *self {
            Shape::Ring { radii } => (d - radii.outer).max(radii.inner - d),
            Shape::Disc { radius } => d - radius,
        }
    }

    fn extent(&self) -> f32 {
        match *self {
            Shape::Ring { radii } => radii.outer,
            Shape::Disc { radius } => radius,
        }
    }
}

/// Coverage of a pixel whose center sits `sd` from the edge, softened over `width`.
fn coverage(sd: f32, width: f32) -> f32 {
    let width = width.max(1.0);
    (0.5 - sd / width).clamp(0.0, 1.0)
}

pub struct RasterSurface {
    image: RgbaImage,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width.max(1), height.max(1)),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x < self.image.width() && y < self.image.height() {
            Some(self.image.get_pixel(x, y).0)
        } else {
            None
        }
    }

    /// Write the current buffer as PNG.
    pub fn save_png(&self, path: &Path) -> image::ImageResult<()> {
        self.image.save_with_format(path, image::ImageFormat::Png)
    }

    fn paint(&mut self, center: Point, shape: Shape, color: Rgba, softness: f32) {
        let reach = shape.extent() + softness.max(1.0);
        let (width, height) = self.image.dimensions();
        let x0 = (center.x - reach).floor().max(0.0) as u32;
        let y0 = (center.y - reach).floor().max(0.0) as u32;
        let x1 = ((center.x + reach).ceil().max(0.0) as u32).min(width);
        let y1 = ((center.y + reach).ceil().max(0.0) as u32).min(height);
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - center.x;
                let dy = y as f32 + 0.5 - center.y;
                let d = (dx * dx + dy * dy).sqrt();
                let alpha = coverage(shape.signed_distance(d), softness) * color.a;
                if alpha > 0.0 {
                    blend(self.image.get_pixel_mut(x, y), color, alpha);
                }
            }
        }
    }

    fn fill(&mut self, center: Point, shape: Shape, fill: &FillParams) {
        if let Some(Shadow {
            color,
            blur,
            offset_x,
            offset_y,
        }) = fill.shadow
        {
            let shadow_center = Point::new(center.x + offset_x, center.y + offset_y);
            self.paint(shadow_center, shape, color, blur);
        }
        self.paint(center, shape, fill.color, 1.0);
    }
}

/// Source-over compositing of a straight-alpha color.
fn blend(dst: &mut Pixel<u8>, color: Rgba, alpha: f32) {
    let da = f32::from(dst.0[3]) / 255.0;
    let out_a = alpha + da * (1.0 - alpha);
    if out_a <= 0.0 {
        return;
    }
    let mix = |src: u8, dst: u8| {
        let value = (f32::from(src) * alpha + f32::from(dst) * da * (1.0 - alpha)) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };
    dst.0 = [
        mix(color.r, dst.0[0]),
        mix(color.g, dst.0[1]),
        mix(color.b, dst.0[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ];
}

impl DrawSurface for RasterSurface {
    fn physical_size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::new(width.max(1), height.max(1));
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            pixel.0 = [0, 0, 0, 0];
        }
    }

    fn draw_ring(&mut self, center: Point, radii: RingRadii, fill: &FillParams) {
        self.fill(center, Shape::Ring { radii }, fill);
    }

    fn draw_dot(&mut self, center: Point, radius: f32, fill: &FillParams) {
        self.fill(center, Shape::Disc { radius }, fill);
    }
}
