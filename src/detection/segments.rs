//! Probabilistic segment accumulation over a binary edge map.
//!
//! Edge pixels vote one at a time into a (theta, rho) accumulator. As soon
//! as a bin reaches the vote threshold, the corridor along that line is
//! walked in both directions to find the segment, its pixels are removed
//! from the map and, if the segment is long enough, their votes are
//! withdrawn. Points are visited in a fixed pseudo-random order so the
//! result is reproducible for identical input.

use std::f32::consts::PI;

use image::GrayImage;

use crate::models::LineSegment;

const SHIFT: u32 = 16;

/// Accumulator and walk parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentParams {
    /// Distance resolution in pixels.
    pub rho: f32,
    /// Angular resolution in radians.
    pub theta: f32,
    /// Votes a bin needs before its line is walked.
    pub vote_threshold: i32,
    /// Segments shorter than this along their major axis are dropped.
    pub min_line_length: i32,
    /// Largest run of missing pixels bridged while walking.
    pub max_line_gap: i32,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            rho: 1.0,
            theta: PI / 180.0,
            vote_threshold: 50,
            min_line_length: 50,
            max_line_gap: 10,
        }
    }
}

/// Visiting order for edge points: sorted by a multiplicative hash of their
/// scan index, which scatters neighbours without any random state.
fn visit_order(count: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..count).collect();
    order.sort_by_key(|&i| ((i as u64).wrapping_add(1)).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    order
}

struct Accumulator {
    bins: Vec<i32>,
    num_rho: usize,
    cos: Vec<f32>,
    sin: Vec<f32>,
}

impl Accumulator {
    fn new(width: u32, height: u32, params: &SegmentParams) -> Self {
        let num_angle = ((PI / params.theta).round() as usize).max(1);
        let num_rho = (((width + height) * 2 + 1) as f32 / params.rho).round() as usize;
        let irho = 1.0 / params.rho;
        let (cos, sin): (Vec<f32>, Vec<f32>) = (0..num_angle)
            .map(|n| {
                let angle = n as f32 * params.theta;
                (angle.cos() * irho, angle.sin() * irho)
            })
            .unzip();
        Self {
            bins: vec![0; num_angle * num_rho],
            num_rho,
            cos,
            sin,
        }
    }

    fn rho_index(&self, n: usize, x: i64, y: i64) -> usize {
        let r = (x as f32 * self.cos[n] + y as f32 * self.sin[n]).round() as i64;
        (r + (self.num_rho as i64 - 1) / 2) as usize
    }

    /// Add one point's votes; returns the strongest angle and its count.
    fn vote(&mut self, x: i64, y: i64) -> (usize, i32) {
        let mut best = (0, i32::MIN);
        for n in 0..self.cos.len() {
            let idx = n * self.num_rho + self.rho_index(n, x, y);
            self.bins[idx] += 1;
            if self.bins[idx] > best.1 {
                best = (n, self.bins[idx]);
            }
        }
        best
    }

    fn withdraw(&mut self, x: i64, y: i64) {
        for n in 0..self.cos.len() {
            let idx = n * self.num_rho + self.rho_index(n, x, y);
            self.bins[idx] -= 1;
        }
    }
}

/// Fixed-point stepping along a line: one axis advances by whole pixels,
/// the other by a 16.16 fraction.
#[derive(Clone, Copy)]
struct Walk {
    x0: i64,
    y0: i64,
    dx: i64,
    dy: i64,
    x_major: bool,
}

impl Walk {
    fn new(x: i64, y: i64, sin: f32, cos: f32) -> Self {
        let a = -sin;
        let b = cos;
        let one = (1i64 << SHIFT) as f32;
        if a.abs() > b.abs() {
            Self {
                x0: x,
                y0: (y << SHIFT) + (1 << (SHIFT - 1)),
                dx: if a > 0.0 { 1 } else { -1 },
                dy: (b * one / a.abs()).round() as i64,
                x_major: true,
            }
        } else {
            Self {
                x0: (x << SHIFT) + (1 << (SHIFT - 1)),
                y0: y,
                dx: (a * one / b.abs()).round() as i64,
                dy: if b > 0.0 { 1 } else { -1 },
                x_major: false,
            }
        }
    }

    fn pixel(&self, x: i64, y: i64) -> (i64, i64) {
        if self.x_major {
            (x, y >> SHIFT)
        } else {
            (x >> SHIFT, y)
        }
    }

    fn direction(&self, k: usize) -> (i64, i64) {
        if k == 0 {
            (self.dx, self.dy)
        } else {
            (-self.dx, -self.dy)
        }
    }
}

/// Extract straight segments from a binary edge map (non-zero = edge).
///
/// Output order is emission order.
pub fn detect_segments(edges: &GrayImage, params: &SegmentParams) -> Vec<LineSegment> {
    let (width, height) = edges.dimensions();
    let (w, h) = (width as i64, height as i64);
    let mut mask = vec![false; (width * height) as usize];
    let mut points = Vec::new();
    for (x, y, p) in edges.enumerate_pixels() {
        if p[0] != 0 {
            mask[(y * width + x) as usize] = true;
            points.push((x as i64, y as i64));
        }
    }

    let mut acc = Accumulator::new(width, height, params);
    let mut segments = Vec::new();
    let inside = |x: i64, y: i64| x >= 0 && x < w && y >= 0 && y < h;

    for idx in visit_order(points.len()) {
        let (px, py) = points[idx];
        // already consumed by an earlier segment
        if !mask[(py * w + px) as usize] {
            continue;
        }

        let (best_n, votes) = acc.vote(px, py);
        if votes < params.vote_threshold {
            continue;
        }

        let walk = Walk::new(px, py, acc.sin[best_n], acc.cos[best_n]);
        let mut ends = [(px, py); 2];

        for (k, end) in ends.iter_mut().enumerate() {
            let (dx, dy) = walk.direction(k);
            let (mut x, mut y) = (walk.x0, walk.y0);
            let mut gap = 0;
            loop {
                let (j, i) = walk.pixel(x, y);
                if !inside(j, i) {
                    break;
                }
                if mask[(i * w + j) as usize] {
                    gap = 0;
                    *end = (j, i);
                } else {
                    gap += 1;
                    if gap > params.max_line_gap {
                        break;
                    }
                }
                x += dx;
                y += dy;
            }
        }

        let good_line = (ends[1].0 - ends[0].0).abs() >= params.min_line_length as i64
            || (ends[1].1 - ends[0].1).abs() >= params.min_line_length as i64;

        for (k, end) in ends.iter().enumerate() {
            let (dx, dy) = walk.direction(k);
            let (mut x, mut y) = (walk.x0, walk.y0);
            loop {
                let (j, i) = walk.pixel(x, y);
                let cell = (i * w + j) as usize;
                if mask[cell] {
                    if good_line {
                        acc.withdraw(j, i);
                    }
                    mask[cell] = false;
                }
                if (j, i) == *end {
                    break;
                }
                x += dx;
                y += dy;
            }
        }

        if good_line {
            segments.push(LineSegment::new(
                ends[0].0 as i32,
                ends[0].1 as i32,
                ends[1].0 as i32,
                ends[1].1 as i32,
            ));
        }
    }

    segments
}
