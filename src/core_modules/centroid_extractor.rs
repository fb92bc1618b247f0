// THEORY:
// The `centroid_extractor` reduces a frame to one point: where the tracked line is.
// It is a stateless utility, one frame in and one `Extraction` out.
//
// 1.  **Thresholding**: intensity at or below the threshold is foreground, so a
//     dark line on a light floor lights up.
// 2.  **Contours**: every external contour of the foreground is found.
// 3.  **Filtering**: a contour is valid when its area lies strictly between the
//     configured bounds (rejecting specks and whole-frame shadows) and its lower
//     edge reaches into the bottom half of the frame, the part nearest the robot.
// 4.  **Selection**: the largest valid contour wins and its raster-moment centroid
//     is the answer.
//
// No valid contour is not a failure. The centroid stays at the (0, 0) sentinel
// and the status says why.

use crate::core_modules::contour::{Contour, Point, find_external_contours};
use crate::core_modules::frame::Frame;
use serde::{Deserialize, Serialize};

/// Tuning for line detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Intensities at or below this are treated as line.
    pub threshold: u8,
    /// Exclusive lower bound on contour area, in pixels.
    pub min_area: f64,
    /// Exclusive upper bound on contour area, in pixels.
    pub max_area: f64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            threshold: 127,
            min_area: 500.0,
            max_area: 5000.0,
        }
    }
}

/// How the centroid was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    Detected,
    /// No contour survived filtering.
    NoLineDetected,
    /// The selected contour had no mass.
    DegenerateContour,
}

/// Result of analysing one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// `(0, 0)` unless `status` is `Detected`.
    pub centroid: Point,
    pub valid_contours: Vec<Contour>,
    pub status: LineStatus,
}

impl Extraction {
    pub fn is_detected(&self) -> bool {
        self.status == LineStatus::Detected
    }
}

pub const NOT_FOUND: Point = Point { x: 0, y: 0 };

pub mod centroid_extractor {
    use super::*;

    /// Finds the tracked line's centroid in `frame`.
    pub fn extract(frame: &Frame, config: &ExtractorConfig) -> Extraction {
        // --- 1. Segmentation ---
        // Dark pixels are the line; only outer contours matter, holes are filled.
        let mask = frame.binarize(config.threshold);
        let contours = find_external_contours(&mask);

        // --- 2. Filtering ---
        // Specks and shadows fail the area bounds; anything ending above the
        // midline is too far ahead to steer on.
        let midline = frame.height() / 2;
        let valid_contours: Vec<Contour> = contours
            .into_iter()
            .filter(|c| {
                let keep = is_valid(c, config, midline);
                tracing::trace!(
                    area = c.area,
                    bottom = c.bounding_box.bottom(),
                    keep,
                    "contour filtered"
                );
                keep
            })
            .collect();

        // --- 3. Selection ---
        // Largest area wins; the first of equal maxima is kept.
        let selected = valid_contours
            .iter()
            .reduce(|best, c| if c.area > best.area { c } else { best });

        // --- 4. Centroid ---
        // Moments of the selected contour, with (0, 0) when there is nothing to use.
        let (centroid, status) = match selected {
            None => (NOT_FOUND, LineStatus::NoLineDetected),
            Some(contour) => match contour.moments.centroid() {
                Some(point) => (point, LineStatus::Detected),
                None => (NOT_FOUND, LineStatus::DegenerateContour),
            },
        };

        Extraction {
            centroid,
            valid_contours,
            status,
        }
    }

    /// Area strictly within bounds and lower edge strictly below the midline.
    pub fn is_valid(contour: &Contour, config: &ExtractorConfig, midline: u32) -> bool {
        contour.area > config.min_area && contour.area < config.max_area && contour.bounding_box.bottom() > midline
    }
}
