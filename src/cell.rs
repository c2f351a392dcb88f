//! Cell extractor.
//! Locates each of the 90 intersections by linear interpolation between the mapped corners
//! and cuts a square crop around it. Crops that would leave the image are skipped, not clipped.

use crate::board::{COLS, ROWS};
use crate::geometry::Geometry;
use image::{RgbImage, imageops};
use serde::Serialize;

/// Square pixel region analyzed for one board intersection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CellRegion {
    pub row: usize,
    pub col: usize,
    pub center_x: f64,
    pub center_y: f64,
    /// Top-left corner of the crop
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Center of intersection (`row`, `col`) in capture pixels. Exact at both corners.
pub fn cell_center(geometry: &Geometry, row: usize, col: usize) -> (f64, f64) {
    let tx = col as f64 / (COLS - 1) as f64;
    let ty = row as f64 / (ROWS - 1) as f64;
    (
        lerp(geometry.origin_x, geometry.extent_x, tx),
        lerp(geometry.origin_y, geometry.extent_y, ty),
    )
}

/// Crop region for a cell, or `None` when any edge falls outside the image.
pub fn cell_region(geometry: &Geometry, row: usize, col: usize) -> Option<CellRegion> {
    let (center_x, center_y) = cell_center(geometry, row, col);
    let half = (geometry.cell_size / 2.0).floor() as i64;
    if half <= 0 {
        return None;
    }
    let (cx, cy) = (center_x.floor() as i64, center_y.floor() as i64);
    let (x1, y1, x2, y2) = (cx - half, cy - half, cx + half, cy + half);
    if x1 < 0
        || y1 < 0
        || x2 > i64::from(geometry.image_width)
        || y2 > i64::from(geometry.image_height)
    {
        return None;
    }
    Some(CellRegion {
        row,
        col,
        center_x,
        center_y,
        x: x1 as u32,
        y: y1 as u32,
        size: (2 * half) as u32,
    })
}

/// Copies the region's pixels out of the capture.
pub fn extract(image: &RgbImage, region: &CellRegion) -> RgbImage {
    imageops::crop_imm(image, region.x, region.y, region.size, region.size).to_image()
}
