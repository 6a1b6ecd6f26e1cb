//! Compact perceptual signature of a camera frame.
//!
//! The signature is a blurhash-style summary: a handful of low-frequency
//! cosine components computed in linear light, quantized, and written as
//! base-83 text. Frames that look alike share most characters, which is what
//! the gate's positional difference relies on.

use crate::error::{Result, VoxringError};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::f32::consts::PI;

/// Width of the comparison copy.
pub const DEFAULT_HASH_WIDTH: u32 = 32;
/// Horizontal x vertical cosine components.
pub const DEFAULT_COMPONENTS: (u32, u32) = (4, 3);

const BASE83: &[u8; 83] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz#$%*+,-.:;=?@[]^_{|}~";

/// Perceptual signature; compare with [`FrameSignature::difference`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameSignature(String);

impl FrameSignature {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Percentage of differing positions over the shorter signature, 0-100.
    pub fn difference(&self, other: &FrameSignature) -> f32 {
        if self == other {
            return 0.0;
        }
        let a = self.0.as_bytes();
        let b = other.0.as_bytes();
        let overlap = a.len().min(b.len());
        if overlap == 0 {
            return 100.0;
        }
        let differing = a.iter().zip(b).filter(|(x, y)| x != y).count();
        100.0 * differing as f32 / overlap as f32
    }
}

impl std::fmt::Display for FrameSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Difference against an optional reference; a missing reference is maximal.
pub fn difference(candidate: &FrameSignature, reference: Option<&FrameSignature>) -> f32 {
    reference.map_or(100.0, |reference| candidate.difference(reference))
}

/// Tallest preview, in multiples of its width. Taller frames are squashed.
pub const MAX_PREVIEW_ASPECT: u32 = 16;

/// Comparison copy: `width` pixels wide, height scaled to keep the aspect
/// up to [`MAX_PREVIEW_ASPECT`].
pub fn downsample(frame: &RgbaImage, width: u32) -> Result<RgbaImage> {
    let (w, h) = frame.dimensions();
    if w == 0 || h == 0 {
        return Err(VoxringError::HashComputationFailure(format!(
            "cannot downsample empty {w}x{h} frame"
        )));
    }
    let width = width.max(1);
    let max_height = u64::from(width) * u64::from(MAX_PREVIEW_ASPECT);
    let height = ((u64::from(h) * u64::from(width)) / u64::from(w)).clamp(1, max_height) as u32;
    Ok(imageops::resize(frame, width, height, FilterType::Triangle))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerceptualHasher {
    width: u32,
    components_x: u32,
    components_y: u32,
}

impl PerceptualHasher {
    pub fn new(width: u32) -> Self {
        Self {
            width: width.max(1),
            components_x: DEFAULT_COMPONENTS.0,
            components_y: DEFAULT_COMPONENTS.1,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Signature length in characters for this component grid.
    pub fn signature_len(&self) -> usize {
        6 + 2 * (self.components_x * self.components_y - 1) as usize
    }

    /// Downsample `frame` and hash it.
    pub fn hash_frame(&self, frame: &RgbaImage) -> Result<FrameSignature> {
        let preview = downsample(frame, self.width)?;
        self.hash_preview(&preview)
    }

    /// Hash an already downsampled copy.
    pub fn hash_preview(&self, preview: &RgbaImage) -> Result<FrameSignature> {
        encode(preview, self.components_x, self.components_y)
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_WIDTH)
    }
}

fn encode(image: &RgbaImage, nx: u32, ny: u32) -> Result<FrameSignature> {
    if !(1..=9).contains(&nx) || !(1..=9).contains(&ny) {
        return Err(VoxringError::HashComputationFailure(format!(
            "component grid {nx}x{ny} outside 1..=9"
        )));
    }
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(VoxringError::HashComputationFailure(format!(
            "cannot hash empty {width}x{height} frame"
        )));
    }

    let linear: Vec<[f32; 3]> = image
        .pixels()
        .map(|p| {
            [
                srgb_to_linear(p.0[0]),
                srgb_to_linear(p.0[1]),
                srgb_to_linear(p.0[2]),
            ]
        })
        .collect();

    let mut factors = Vec::with_capacity((nx * ny) as usize);
    for j in 0..ny {
        for i in 0..nx {
            factors.push(basis_factor(&linear, width, height, i, j));
        }
    }

    let mut hash = String::with_capacity(6 + 2 * factors.len());
    push_base83(&mut hash, (nx - 1) + (ny - 1) * 9, 1);

    let (dc, ac) = factors.split_at(1);
    let max_value = if ac.is_empty() {
        push_base83(&mut hash, 0, 1);
        1.0
    } else {
        let actual_max = ac
            .iter()
            .flat_map(|f| f.iter())
            .fold(0.0f32, |acc, v| acc.max(v.abs()));
        let quantised = (actual_max * 166.0 - 0.5).floor().clamp(0.0, 82.0) as u32;
        push_base83(&mut hash, quantised, 1);
        (quantised as f32 + 1.0) / 166.0
    };

    push_base83(&mut hash, encode_dc(dc[0]), 4);
    for factor in ac {
        push_base83(&mut hash, encode_ac(*factor, max_value), 2);
    }
    Ok(FrameSignature(hash))
}

fn basis_factor(linear: &[[f32; 3]], width: u32, height: u32, i: u32, j: u32) -> [f32; 3] {
    let normalisation = if i == 0 && j == 0 { 1.0 } else { 2.0 };
    let mut sum = [0.0f32; 3];
    for y in 0..height {
        let basis_y = (PI * j as f32 * y as f32 / height as f32).cos();
        for x in 0..width {
            let basis = (PI * i as f32 * x as f32 / width as f32).cos() * basis_y;
            let pixel = linear[(y * width + x) as usize];
            sum[0] += basis * pixel[0];
            sum[1] += basis * pixel[1];
            sum[2] += basis * pixel[2];
        }
    }
    let scale = normalisation / (width * height) as f32;
    [sum[0] * scale, sum[1] * scale, sum[2] * scale]
}

fn srgb_to_linear(value: u8) -> f32 {
    let v = f32::from(value) / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(value: f32) -> u32 {
    let v = value.clamp(0.0, 1.0);
    let srgb = if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    };
    (srgb * 255.0 + 0.5).floor().clamp(0.0, 255.0) as u32
}

fn encode_dc(value: [f32; 3]) -> u32 {
    (linear_to_srgb(value[0]) << 16) + (linear_to_srgb(value[1]) << 8) + linear_to_srgb(value[2])
}

fn encode_ac(value: [f32; 3], max_value: f32) -> u32 {
    let quant = |v: f32| {
        let scaled = sign_pow(v / max_value, 0.5) * 9.0 + 9.5;
        scaled.floor().clamp(0.0, 18.0) as u32
    };
    quant(value[0]) * 19 * 19 + quant(value[1]) * 19 + quant(value[2])
}

fn sign_pow(value: f32, exp: f32) -> f32 {
    value.abs().powf(exp).copysign(value)
}

fn push_base83(out: &mut String, value: u32, length: u32) {
    for i in 1..=length {
        let digit = (value / 83u32.pow(length - i)) % 83;
        out.push(BASE83[digit as usize] as char);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    fn gradient(width: u32, height: u32, shift: u8) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let r = ((x * 255) / width.max(1)) as u8;
            let g = ((y * 255) / height.max(1)) as u8;
            Rgba([r.saturating_add(shift), g, 128, 255])
        })
    }

    #[test]
    fn difference_of_identical_signatures_is_zero() {
        let a = FrameSignature::new("LEHV6nWB2yk8pyo0adR*.7kCMdnj");
        assert_eq!(a.difference(&a), 0.0);
        let empty = FrameSignature::new("");
        assert_eq!(empty.difference(&empty), 0.0);
    }

    #[test]
    fn difference_is_symmetric() {
        let pairs = [("AAAA", "AAAB"), ("AAAA", "ZZ"), ("", "abc"), ("xyz", "xzy")];
        for (a, b) in pairs {
            let a = FrameSignature::new(a);
            let b = FrameSignature::new(b);
            assert_eq!(a.difference(&b), b.difference(&a));
        }
    }

    #[test]
    fn difference_counts_positions_over_shorter_length() {
        let a = FrameSignature::new("AAAA");
        assert_eq!(a.difference(&FrameSignature::new("AAAB")), 25.0);
        assert_eq!(a.difference(&FrameSignature::new("ZZZZ")), 100.0);
        assert_eq!(a.difference(&FrameSignature::new("AB")), 50.0);
        assert_eq!(a.difference(&FrameSignature::new("")), 100.0);
    }

    #[test]
    fn missing_reference_is_maximal() {
        assert_eq!(difference(&FrameSignature::new("AAAA"), None), 100.0);
    }

    #[test]
    fn signature_has_fixed_length() {
        let hasher = PerceptualHasher::default();
        let sig = hasher.hash_frame(&gradient(640, 480, 0)).expect("hash");
        assert_eq!(sig.len(), hasher.signature_len());
        assert_eq!(sig.len(), 28);
    }

    #[test]
    fn hashing_is_deterministic() {
        let hasher = PerceptualHasher::default();
        let frame = gradient(320, 240, 10);
        assert_eq!(hasher.hash_frame(&frame).ok(), hasher.hash_frame(&frame).ok());
    }

    #[test]
    fn similar_frames_are_closer_than_different_ones() {
        let hasher = PerceptualHasher::default();
        let base = hasher.hash_frame(&gradient(320, 240, 0)).expect("hash");
        let nudged = hasher.hash_frame(&gradient(320, 240, 3)).expect("hash");
        let other = hasher.hash_frame(&solid(320, 240, [250, 20, 20])).expect("hash");
        assert!(base.difference(&nudged) < base.difference(&other));
    }

    #[test]
    fn solid_frame_encodes_its_color_in_dc() {
        let hasher = PerceptualHasher::default();
        let black = hasher.hash_frame(&solid(64, 64, [0, 0, 0])).expect("hash");
        // Size flag for 4x3, zero max AC, DC of pure black.
        assert!(black.as_str().starts_with("L00000"), "{black}");
    }

    #[test]
    fn sliver_frame_preview_is_capped() {
        let sliver = solid(1, 100_000, [9, 9, 9]);
        let preview = downsample(&sliver, 32).expect("downsample");
        assert_eq!(preview.dimensions(), (32, 32 * MAX_PREVIEW_ASPECT));
        let signature = PerceptualHasher::new(32).hash_frame(&sliver).expect("hash");
        assert_eq!(signature.len(), 28);
    }

    #[test]
    fn downsample_preserves_aspect() {
        let preview = downsample(&solid(1280, 720, [1, 2, 3]), 32).expect("downsample");
        assert_eq!(preview.dimensions(), (32, 18));
        let tall = downsample(&solid(100, 1000, [1, 2, 3]), 32).expect("downsample");
        assert_eq!(tall.dimensions(), (32, 320));
        let flat = downsample(&solid(1000, 5, [1, 2, 3]), 32).expect("downsample");
        assert_eq!(flat.dimensions(), (32, 1));
    }

    #[test]
    fn empty_frame_is_a_hash_failure() {
        let hasher = PerceptualHasher::default();
        let err = hasher.hash_frame(&RgbaImage::new(0, 0)).unwrap_err();
        assert_eq!(err.label(), "hash_failure");
    }

    #[test]
    fn base83_digits_are_big_endian() {
        let mut out = String::new();
        push_base83(&mut out, 83 + 2, 2);
        assert_eq!(out, "12");
    }
}
