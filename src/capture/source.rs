use super::hash::downsample;
use crate::error::{DeviceKind, Result, VoxringError};
use crate::log_debug;
use image::RgbaImage;
use std::fs;
use std::path::{Path, PathBuf};

/// One camera frame plus the small copy used for hashing.
#[derive(Debug, Clone)]
pub struct SourceFrame {
    pub full: RgbaImage,
    pub preview: RgbaImage,
}

impl SourceFrame {
    pub fn new(full: RgbaImage, preview_width: u32) -> Result<Self> {
        let preview = downsample(&full, preview_width)?;
        Ok(Self { full, preview })
    }
}

/// Live video feed.
pub trait VideoFrameSource {
    /// Next frame, or `Ok(None)` if the feed has nothing new yet.
    fn next_frame(&mut self) -> Result<Option<SourceFrame>>;
    fn name(&self) -> &str;
}

/// Opens a video source on the capture thread; sources need not be `Send`.
pub trait VideoSourceFactory: Send {
    fn open(&mut self) -> Result<Box<dyn VideoFrameSource>>;
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Replays the images of a directory in name order, looping at the end.
#[derive(Debug)]
pub struct ImageSequenceSource {
    name: String,
    paths: Vec<PathBuf>,
    cursor: usize,
    preview_width: u32,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path, preview_width: u32) -> Result<Self> {
        let entries = fs::read_dir(dir).map_err(|err| {
            VoxringError::device(DeviceKind::Camera, format!("{}: {err}", dir.display()))
        })?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_image_extension(path))
            .collect();
        paths.sort();
        if paths.is_empty() {
            return Err(VoxringError::device(
                DeviceKind::Camera,
                format!("no frames in {}", dir.display()),
            ));
        }
        log_debug(&format!(
            "image sequence source: {} frame(s) from {}",
            paths.len(),
            dir.display()
        ));
        Ok(Self {
            name: dir.display().to_string(),
            paths,
            cursor: 0,
            preview_width,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl VideoFrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>> {
        let path = &self.paths[self.cursor % self.paths.len()];
        self.cursor = (self.cursor + 1) % self.paths.len();
        let full = image::open(path)
            .map_err(|err| {
                VoxringError::device(DeviceKind::Camera, format!("{}: {err}", path.display()))
            })?
            .into_rgba8();
        SourceFrame::new(full, self.preview_width).map(Some)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub struct ImageSequenceFactory {
    dir: PathBuf,
    preview_width: u32,
}

impl ImageSequenceFactory {
    pub fn new(dir: PathBuf, preview_width: u32) -> Self {
        Self { dir, preview_width }
    }
}

impl VideoSourceFactory for ImageSequenceFactory {
    fn open(&mut self) -> Result<Box<dyn VideoFrameSource>> {
        Ok(Box::new(ImageSequenceSource::open(
            &self.dir,
            self.preview_width,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn write_frame(dir: &Path, name: &str, shade: u8) {
        RgbaImage::from_pixel(40, 20, Rgba([shade, shade, shade, 255]))
            .save(dir.join(name))
            .expect("write frame");
    }

    #[test]
    fn frames_replay_in_name_order_and_loop() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_frame(dir.path(), "b.png", 200);
        write_frame(dir.path(), "a.png", 10);
        fs::write(dir.path().join("notes.txt"), "skip me").expect("write");

        let mut source = ImageSequenceSource::open(dir.path(), 32).expect("open");
        assert_eq!(source.len(), 2);
        let shade = |frame: SourceFrame| frame.full.get_pixel(0, 0).0[0];
        assert_eq!(shade(source.next_frame().expect("frame").expect("some")), 10);
        assert_eq!(shade(source.next_frame().expect("frame").expect("some")), 200);
        assert_eq!(shade(source.next_frame().expect("frame").expect("some")), 10);
    }

    #[test]
    fn preview_is_downsampled() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_frame(dir.path(), "only.png", 90);
        let mut source = ImageSequenceSource::open(dir.path(), 32).expect("open");
        let frame = source.next_frame().expect("frame").expect("some");
        assert_eq!(frame.full.dimensions(), (40, 20));
        assert_eq!(frame.preview.dimensions(), (32, 16));
    }

    #[test]
    fn missing_or_empty_directory_is_camera_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = ImageSequenceSource::open(dir.path(), 32).unwrap_err();
        assert!(matches!(
            err,
            VoxringError::DeviceUnavailable {
                device: DeviceKind::Camera,
                ..
            }
        ));
        let err = ImageSequenceSource::open(&dir.path().join("nope"), 32).unwrap_err();
        assert_eq!(err.label(), "device_unavailable");
    }
}
