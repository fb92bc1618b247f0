use anyhow::Context;
use fuzzy_line_follower::core_modules::frame::{Frame, Orientation};
use fuzzy_line_follower::{ControlError, FrameEvent, FrameSource};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::debug;

const EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "ppm"];

/// Replays recorded camera frames, oriented the way the robot mounts its camera.
pub struct DirectoryFrameSource {
    pending: VecDeque<PathBuf>,
    orientation: Orientation,
}

impl DirectoryFrameSource {
    pub fn new(dir: impl AsRef<Path>, orientation: Orientation) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if is_image {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(Self {
            pending: paths.into(),
            orientation,
        })
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl FrameSource for DirectoryFrameSource {
    fn next_frame(&mut self) -> Result<FrameEvent, ControlError> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(FrameEvent::Finished);
        };
        debug!(path = %path.display(), "loading frame");
        let raw = Frame::open(&path)?;
        let frame = Frame::new(self.orientation.apply(raw.into_image()))?;
        Ok(FrameEvent::Frame(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn replays_images_in_name_order_then_finishes() {
        let dir = std::env::temp_dir().join(format!("track_runner_frames_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        RgbImage::from_pixel(8, 4, Rgb([0, 0, 0])).save(dir.join("b.png")).unwrap();
        RgbImage::from_pixel(6, 4, Rgb([0, 0, 0])).save(dir.join("a.png")).unwrap();
        std::fs::write(dir.join("notes.txt"), "not a frame").unwrap();

        let mut source = DirectoryFrameSource::new(&dir, Orientation::default()).unwrap();
        assert_eq!(source.remaining(), 2);
        let widths: Vec<u32> = std::iter::from_fn(|| match source.next_frame().unwrap() {
            FrameEvent::Frame(f) => Some(f.width()),
            _ => None,
        })
        .collect();
        assert_eq!(widths, vec![6, 8]);
        assert!(matches!(source.next_frame().unwrap(), FrameEvent::Finished));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
