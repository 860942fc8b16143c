//! Live frame sources.

use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use image::{Rgba, RgbaImage};

use crate::error::CaptureError;

/// Anything that can hand out the most recent video frame.
pub trait FrameSource {
    fn name(&self) -> &str;

    /// Reported frame size; `(0, 0)` when the device does not know yet.
    fn dimensions(&self) -> (u32, u32);

    fn is_ready(&self) -> bool;

    /// The most recent frame, if one is available.
    fn frame(&mut self) -> Option<RgbaImage>;
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Plays the images of a folder (or a single image) as a slow slideshow.
pub struct DirectorySource {
    label: String,
    frames: Vec<RgbaImage>,
    hold: Duration,
    started: Instant,
}

impl DirectorySource {
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let unavailable = |why: String| CaptureError::DeviceUnavailable(format!("{}: {why}", path.display()));
        let files: Vec<PathBuf> = if path.is_dir() {
            let mut files: Vec<PathBuf> = fs::read_dir(path)
                .map_err(|e| unavailable(e.to_string()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| {
                    p.extension()
                        .and_then(|ext| ext.to_str())
                        .map_or(false, |ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                })
                .collect();
            files.sort();
            files
        } else if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            return Err(unavailable("no such device".into()));
        };

        let mut frames = Vec::with_capacity(files.len());
        for file in &files {
            match image::open(file) {
                Ok(img) => frames.push(img.to_rgba8()),
                Err(err) => log::warn!("Skipping frame {}: {err}", file.display()),
            }
        }
        if frames.is_empty() {
            return Err(unavailable("no readable frames".into()));
        }
        log::info!("Opened {} with {} frame(s)", path.display(), frames.len());
        Ok(Self {
            label: path.display().to_string(),
            frames,
            hold: Duration::from_secs(2),
            started: Instant::now(),
        })
    }

    fn current_index(&self) -> usize {
        let step = self.started.elapsed().as_millis() / self.hold.as_millis().max(1);
        (step % self.frames.len() as u128) as usize
    }
}

impl FrameSource for DirectorySource {
    fn name(&self) -> &str {
        &self.label
    }

    fn dimensions(&self) -> (u32, u32) {
        self.frames[self.current_index()].dimensions()
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn frame(&mut self) -> Option<RgbaImage> {
        self.frames.get(self.current_index()).cloned()
    }
}

/// Animated colour bars with a sweeping white line.
pub struct TestPattern {
    width: u32,
    height: u32,
    started: Instant,
}

const BARS: [[u8; 3]; 7] = [
    [192, 192, 192],
    [192, 192, 0],
    [0, 192, 192],
    [0, 192, 0],
    [192, 0, 192],
    [192, 0, 0],
    [0, 0, 192],
];

impl TestPattern {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            started: Instant::now(),
        }
    }

    pub fn render(width: u32, height: u32, sweep: u32) -> RgbaImage {
        let bar_w = (width / BARS.len() as u32).max(1);
        RgbaImage::from_fn(width, height, |x, y| {
            if height > 0 && y == sweep % height {
                return Rgba([255, 255, 255, 255]);
            }
            let [r, g, b] = BARS[((x / bar_w) as usize).min(BARS.len() - 1)];
            Rgba([r, g, b, 255])
        })
    }
}

impl FrameSource for TestPattern {
    fn name(&self) -> &str {
        "test pattern"
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn frame(&mut self) -> Option<RgbaImage> {
        let sweep = (self.started.elapsed().as_millis() / 16) as u32;
        Some(Self::render(self.width, self.height, sweep))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_is_a_device_failure() {
        let err = DirectorySource::open(Path::new("/definitely/not/here"))
            .err()
            .unwrap();
        assert!(matches!(err, CaptureError::DeviceUnavailable(_)));
    }

    #[test]
    fn empty_directory_is_a_device_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        assert!(matches!(
            DirectorySource::open(dir.path()),
            Err(CaptureError::DeviceUnavailable(_))
        ));
    }

    #[test]
    fn directory_frames_are_served() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(64, 48, Rgba([1, 2, 3, 255]))
            .save(dir.path().join("a.png"))
            .unwrap();
        let mut source = DirectorySource::open(dir.path()).unwrap();
        assert!(source.is_ready());
        assert_eq!(source.dimensions(), (64, 48));
        assert_eq!(*source.frame().unwrap().get_pixel(0, 0), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn test_pattern_draws_bars() {
        let img = TestPattern::render(70, 10, 5);
        assert_eq!(*img.get_pixel(0, 0), Rgba([192, 192, 192, 255]));
        assert_eq!(*img.get_pixel(69, 0), Rgba([0, 0, 192, 255]));
        assert_eq!(*img.get_pixel(30, 5), Rgba([255, 255, 255, 255]));
    }
}
