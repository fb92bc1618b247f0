// Diagnostic overlay for an external viewer. Nothing in the control path reads it.

use crate::core_modules::centroid_extractor::Extraction;
use crate::core_modules::frame::Frame;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;

const CONTOUR_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const CONTOUR_THICKNESS: u32 = 5;
const CENTROID_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const CENTROID_RADIUS: i32 = 3;
const CENTER_LINE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const CENTER_LINE_THICKNESS: u32 = 2;

/// Copies the frame and draws valid contours, the centroid (when detected) and
/// the vertical center reference line.
pub fn annotate(frame: &Frame, extraction: &Extraction) -> RgbImage {
    let mut canvas = frame.as_image().clone();

    // --- 1. Contours ---
    // A thick outline is a square brush stamped on every boundary pixel.
    let half = (CONTOUR_THICKNESS / 2) as i32;
    for contour in &extraction.valid_contours {
        for p in &contour.boundary {
            let brush = Rect::at(p.x as i32 - half, p.y as i32 - half).of_size(CONTOUR_THICKNESS, CONTOUR_THICKNESS);
            draw_filled_rect_mut(&mut canvas, brush, CONTOUR_COLOR);
        }
    }

    // --- 2. Centroid ---
    if extraction.is_detected() {
        let center = (extraction.centroid.x as i32, extraction.centroid.y as i32);
        draw_filled_circle_mut(&mut canvas, center, CENTROID_RADIUS, CENTROID_COLOR);
    }

    // --- 3. Center Reference ---
    let first = (canvas.width() / 2).saturating_sub(CENTER_LINE_THICKNESS / 2);
    let line = Rect::at(first as i32, 0).of_size(CENTER_LINE_THICKNESS, canvas.height());
    draw_filled_rect_mut(&mut canvas, line, CENTER_LINE_COLOR);

    canvas
}
