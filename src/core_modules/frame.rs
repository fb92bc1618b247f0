// THEORY:
// The `frame` module is the entry point for image data. A `Frame` is an immutable,
// owned RGB image handed to the core once per control tick. It knows how to build
// itself from the raw buffers camera drivers hand out and how to reduce itself to
// the two representations the extractor needs: single-channel intensity and an
// inverted binary mask where dark pixels (the tracked line) are foreground.
//
// Orientation (rotation, scaling, mirroring) is a property of how the camera is
// mounted, not of the control law. It lives here as a small value type so frame
// sources can apply it before the core ever sees the frame.

use crate::core_modules::contour::Mask;
use crate::error::FrameError;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

const RGB_CHANNELS: usize = 3;
const BGRA_CHANNELS: usize = 4;

/// One color frame, width x height x 3 channels.
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Result<Self, FrameError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(FrameError::EmptyFrame { width, height });
        }
        Ok(Self { image })
    }

    /// Wraps a tightly packed RGB8 buffer.
    pub fn from_rgb(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self, FrameError> {
        let actual = bytes.len();
        check_buffer(width, height, RGB_CHANNELS, actual)?;
        let image = RgbImage::from_raw(width, height, bytes).ok_or(FrameError::BufferSize {
            width,
            height,
            channels: RGB_CHANNELS,
            expected: width as usize * height as usize * RGB_CHANNELS,
            actual,
        })?;
        Self::new(image)
    }

    /// Converts a BGRA8 buffer, the layout most camera drivers deliver, dropping alpha.
    pub fn from_bgra(width: u32, height: u32, bytes: &[u8]) -> Result<Self, FrameError> {
        check_buffer(width, height, BGRA_CHANNELS, bytes.len())?;
        let mut rgb = Vec::with_capacity(width as usize * height as usize * RGB_CHANNELS);
        for px in bytes.chunks_exact(BGRA_CHANNELS) {
            rgb.extend_from_slice(&[px[2], px[1], px[0]]);
        }
        Self::from_rgb(width, height, rgb)
    }

    /// Decodes any image format the `image` crate understands.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FrameError> {
        let image = image::open(path)?.to_rgb8();
        Self::new(image)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Rec. 601 luma, the same weighting broadcast-era grayscale conversions use.
    pub fn intensity(&self) -> GrayImage {
        GrayImage::from_fn(self.width(), self.height(), |x, y| {
            let [r, g, b] = self.image.get_pixel(x, y).0;
            let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
            Luma([luma.round().clamp(0.0, 255.0) as u8])
        })
    }

    /// Inverted binarization: a pixel is foreground when its intensity is at or
    /// below `threshold`.
    pub fn binarize(&self, threshold: u8) -> Mask {
        let gray = self.intensity();
        Mask::from_fn(self.width(), self.height(), |x, y| {
            gray.get_pixel(x, y).0[0] <= threshold
        })
    }
}

fn check_buffer(width: u32, height: u32, channels: usize, actual: usize) -> Result<(), FrameError> {
    if width == 0 || height == 0 {
        return Err(FrameError::EmptyFrame { width, height });
    }
    let expected = width as usize * height as usize * channels;
    if actual != expected {
        return Err(FrameError::BufferSize {
            width,
            height,
            channels,
            expected,
            actual,
        });
    }
    Ok(())
}

/// How a raw camera image must be turned so that the bottom of the frame is the
/// part of the floor nearest the robot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Orientation {
    /// Rotate 90 degrees clockwise.
    pub rotate_clockwise: bool,
    /// Uniform scale factor applied after rotation.
    pub scale: f32,
    /// Mirror left-right after scaling.
    pub mirror: bool,
}

impl Default for Orientation {
    fn default() -> Self {
        Self {
            rotate_clockwise: false,
            scale: 1.0,
            mirror: false,
        }
    }
}

impl Orientation {
    /// A sideways, low-resolution sensor seen through a mirror: rotate clockwise,
    /// scale up 3.5x, then mirror.
    pub fn side_mounted_camera() -> Self {
        Self {
            rotate_clockwise: true,
            scale: 3.5,
            mirror: true,
        }
    }

    pub fn is_identity(&self) -> bool {
        !self.rotate_clockwise && !self.mirror && (self.scale - 1.0).abs() < f32::EPSILON
    }

    pub fn apply(&self, image: RgbImage) -> RgbImage {
        if self.is_identity() {
            return image;
        }
        let mut out = if self.rotate_clockwise {
            imageops::rotate90(&image)
        } else {
            image
        };
        if (self.scale - 1.0).abs() >= f32::EPSILON && self.scale > 0.0 {
            let width = ((out.width() as f32 * self.scale).round() as u32).max(1);
            let height = ((out.height() as f32 * self.scale).round() as u32).max(1);
            out = imageops::resize(&out, width, height, FilterType::Triangle);
        }
        if self.mirror {
            imageops::flip_horizontal_in_place(&mut out);
        }
        out
    }
}
