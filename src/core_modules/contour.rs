// THEORY:
// The `contour` module turns a binary mask into the list of external contours a
// downstream selector can reason about. It replaces what a vision library would
// provide with three explicit passes:
//
// 1.  **Hole Filling**: Background pixels that cannot reach the image border
//     (4-connected) are enclosed by foreground and belong to the region around
//     them. Only external boundaries matter, so the enclosed area of a ring is
//     the area of the disc it draws.
// 2.  **Region Labelling**: 8-connected components of the filled mask are grown
//     with an explicit stack. While growing, each region accumulates its raster
//     moments (m00, m10, m01) and bounding box, so nothing is re-scanned.
// 3.  **Boundary Tracing**: Starting from each region's first pixel in raster
//     order, a Moore-neighbour walk produces the ordered outer boundary. It is
//     carried for annotation; area and moments come from the raster pass.

use serde::Serialize;

/// A pixel coordinate in the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

/// A row-major binary image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
        }
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if f(x, y) {
                    mask.set(x, y, true);
                }
            }
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.bits[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        let i = self.index(x, y);
        self.bits[i] = value;
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Axis-aligned box; `x + width` and `y + height` are exclusive edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// The exclusive lower edge, `y + h`.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Zeroth and first raster moments of a region.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RasterMoments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl RasterMoments {
    fn accumulate(&mut self, x: u32, y: u32) {
        self.m00 += 1.0;
        self.m10 += x as f64;
        self.m01 += y as f64;
    }

    /// Integer centroid, truncated toward zero. `None` when the region has no mass.
    pub fn centroid(&self) -> Option<Point> {
        if self.m00 == 0.0 {
            return None;
        }
        Some(Point {
            x: (self.m10 / self.m00) as u32,
            y: (self.m01 / self.m00) as u32,
        })
    }
}

/// One external contour and the region it encloses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contour {
    /// Ordered outer boundary, clockwise in image coordinates.
    pub boundary: Vec<Point>,
    /// Enclosed area in pixels, holes included.
    pub area: f64,
    pub bounding_box: BoundingBox,
    pub moments: RasterMoments,
}

// Clockwise starting east, with y growing downwards.
const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];
const WEST: usize = 4;

/// Finds every external contour of the foreground in `mask`, in raster order of
/// their top-left-most pixel.
pub fn find_external_contours(mask: &Mask) -> Vec<Contour> {
    // --- 1. Hole Filling ---
    // Only the outer outline of each shape counts, so holes become foreground.
    let filled = fill_holes(mask);
    let (width, height) = (filled.width, filled.height);
    let mut labels = vec![0u32; filled.bits.len()];
    let mut contours = Vec::new();
    let mut next_label = 1u32;

    // --- 2. Region Scan ---
    // The first unlabelled foreground pixel in raster order is the top-left-most
    // pixel of a new region, which is also where boundary tracing must start.
    for y in 0..height {
        for x in 0..width {
            let i = filled.index(x, y);
            if !filled.bits[i] || labels[i] != 0 {
                continue;
            }
            // --- 3. Region Growing ---
            let (moments, bounding_box) = grow_region(&filled, &mut labels, Point { x, y }, next_label);
            // --- 4. Boundary Tracing ---
            let boundary = trace_boundary(&filled, &labels, Point { x, y }, next_label);
            contours.push(Contour {
                boundary,
                area: moments.m00,
                bounding_box,
                moments,
            });
            next_label += 1;
        }
    }
    contours
}

/// Marks background reachable from the border, then returns foreground plus
/// everything unreachable.
fn fill_holes(mask: &Mask) -> Mask {
    let (width, height) = (mask.width, mask.height);
    let mut outside = vec![false; mask.bits.len()];
    let mut stack: Vec<Point> = Vec::new();

    let seed = |x: u32, y: u32, outside: &mut Vec<bool>, stack: &mut Vec<Point>| {
        let i = mask.index(x, y);
        if !mask.bits[i] && !outside[i] {
            outside[i] = true;
            stack.push(Point { x, y });
        }
    };
    for x in 0..width {
        seed(x, 0, &mut outside, &mut stack);
        if height > 1 {
            seed(x, height - 1, &mut outside, &mut stack);
        }
    }
    for y in 0..height {
        seed(0, y, &mut outside, &mut stack);
        if width > 1 {
            seed(width - 1, y, &mut outside, &mut stack);
        }
    }

    while let Some(current) = stack.pop() {
        for (dx, dy) in [(0, 1), (0, -1), (1, 0), (-1, 0)] {
            let Some(n) = offset(current, dx, dy, width, height) else {
                continue;
            };
            let i = mask.index(n.x, n.y);
            if !mask.bits[i] && !outside[i] {
                outside[i] = true;
                stack.push(n);
            }
        }
    }

    Mask {
        width,
        height,
        bits: mask
            .bits
            .iter()
            .zip(&outside)
            .map(|(fg, out)| *fg || !*out)
            .collect(),
    }
}

fn grow_region(mask: &Mask, labels: &mut [u32], seed: Point, label: u32) -> (RasterMoments, BoundingBox) {
    let mut moments = RasterMoments::default();
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (seed.x, seed.y, seed.x, seed.y);
    let mut stack = vec![seed];
    labels[mask.index(seed.x, seed.y)] = label;

    while let Some(current) = stack.pop() {
        moments.accumulate(current.x, current.y);
        min_x = min_x.min(current.x);
        min_y = min_y.min(current.y);
        max_x = max_x.max(current.x);
        max_y = max_y.max(current.y);

        for (dx, dy) in DIRECTIONS {
            let Some(n) = offset(current, dx, dy, mask.width, mask.height) else {
                continue;
            };
            let i = mask.index(n.x, n.y);
            if mask.bits[i] && labels[i] == 0 {
                labels[i] = label;
                stack.push(n);
            }
        }
    }

    let bounding_box = BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    };
    (moments, bounding_box)
}

/// Moore-neighbour tracing. `start` must be the region's first pixel in raster
/// order, which guarantees its west neighbour is outside the region.
fn trace_boundary(mask: &Mask, labels: &[u32], start: Point, label: u32) -> Vec<Point> {
    let inside = |p: Point| labels[mask.index(p.x, p.y)] == label;
    let mut boundary = vec![start];
    let mut current = start;
    let mut backtrack = WEST;
    let mut second: Option<Point> = None;
    // Every boundary pixel is entered at most once per incident direction.
    let limit = 8 * mask.bits.len() + 8;

    for _ in 0..limit {
        let mut found = None;
        for k in 1..=8 {
            let dir = (backtrack + k) % 8;
            let (dx, dy) = DIRECTIONS[dir];
            if let Some(n) = offset(current, dx, dy, mask.width, mask.height) {
                if inside(n) {
                    found = Some((n, dir));
                    break;
                }
            }
        }
        // Isolated pixel.
        let Some((next, dir)) = found else {
            break;
        };

        if current == start {
            match second {
                Some(s) if s == next => break,
                None => second = Some(next),
                _ => {}
            }
        }

        // The neighbour examined just before `next`, seen from `next`.
        let (px, py) = DIRECTIONS[(dir + 7) % 8];
        let (nx, ny) = DIRECTIONS[dir];
        backtrack = direction_index(px - nx, py - ny);
        boundary.push(next);
        current = next;
    }

    if boundary.len() > 1 && boundary.last() == Some(&start) {
        boundary.pop();
    }
    boundary
}

fn direction_index(dx: i32, dy: i32) -> usize {
    DIRECTIONS
        .iter()
        .position(|d| *d == (dx, dy))
        .unwrap_or(WEST)
}

fn offset(p: Point, dx: i32, dy: i32, width: u32, height: u32) -> Option<Point> {
    let x = p.x as i64 + dx as i64;
    let y = p.y as i64 + dy as i64;
    if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
        return None;
    }
    Some(Point {
        x: x as u32,
        y: y as u32,
    })
}
