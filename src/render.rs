//! Debug rendering.
//! Consumes a finished `ScanResult`; nothing here feeds back into detection.
//! - `OverlayRenderer` boxes every scanned crop and labels accepted pieces with their code.
//! - `comparison_sheet` puts a crop next to the template it matched, with a score bar underneath.

use crate::piece::Piece;
use crate::scan::ScanResult;
use image::{Rgb, RgbImage, imageops};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

/// Produces an annotated copy of the capture for visual verification.
pub trait Renderer: Send + Sync {
    fn render(&self, image: &RgbImage, result: &ScanResult) -> RgbImage;
}

#[derive(Clone, Copy, Debug)]
pub struct OverlayRenderer {
    pub box_color: Rgb<u8>,
    pub label_color: Rgb<u8>,
    pub outline_color: Rgb<u8>,
    /// Pixels per glyph dot
    pub label_scale: u32,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self {
            box_color: Rgb([0, 255, 0]),
            label_color: Rgb([255, 255, 0]),
            outline_color: Rgb([0, 0, 0]),
            label_scale: 3,
        }
    }
}

impl Renderer for OverlayRenderer {
    fn render(&self, image: &RgbImage, result: &ScanResult) -> RgbImage {
        let mut canvas = image.clone();
        for report in &result.cells {
            let Some(region) = report.region else { continue };
            draw_hollow_rect_mut(
                &mut canvas,
                Rect::at(region.x as i32, region.y as i32).of_size(region.size, region.size),
                self.box_color,
            );
            if let Some(piece) = report.detection.piece {
                let s = self.label_scale as i32;
                let x = region.center_x as i32 - GLYPH_WIDTH as i32 * s / 2;
                let y = region.center_y as i32 - GLYPH_HEIGHT as i32 * s / 2;
                for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                    draw_glyph(&mut canvas, piece, x + dx, y + dy, self.label_scale, self.outline_color);
                }
                draw_glyph(&mut canvas, piece, x, y, self.label_scale, self.label_color);
            }
        }
        canvas
    }
}

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

/// 5x7 bitmaps, one row per byte, most significant of the low five bits is the leftmost dot.
fn glyph(code: char) -> [u8; 7] {
    match code {
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'r' => [0b00000, 0b00000, 0b10110, 0b11001, 0b10000, 0b10000, 0b10000],
        'n' => [0b00000, 0b00000, 0b10110, 0b11001, 0b10001, 0b10001, 0b10001],
        'b' => [0b10000, 0b10000, 0b10110, 0b11001, 0b10001, 0b10001, 0b11110],
        'a' => [0b00000, 0b00000, 0b01110, 0b00001, 0b01111, 0b10001, 0b01111],
        'k' => [0b10000, 0b10000, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010],
        'c' => [0b00000, 0b00000, 0b01110, 0b10000, 0b10000, 0b10001, 0b01110],
        'p' => [0b00000, 0b00000, 0b11110, 0b10001, 0b11110, 0b10000, 0b10000],
        _ => [0b11111; 7],
    }
}

fn draw_glyph(canvas: &mut RgbImage, piece: Piece, x: i32, y: i32, scale: u32, color: Rgb<u8>) {
    let s = scale.max(1);
    for (row, bits) in glyph(piece.code()).iter().enumerate() {
        for col in 0..GLYPH_WIDTH {
            if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                continue;
            }
            let px = x + (col * s) as i32;
            let py = y + (row as u32 * s) as i32;
            draw_filled_rect_mut(canvas, Rect::at(px, py).of_size(s, s), color);
        }
    }
}

const SCORE_BAR_HEIGHT: u32 = 6;

/// Crop on the left, template on the right, score bar along the bottom.
pub fn comparison_sheet(crop: &RgbImage, template: &RgbImage, score: f32) -> RgbImage {
    let width = crop.width() + template.width();
    let height = crop.height().max(template.height());
    let mut sheet = RgbImage::new(width, height + SCORE_BAR_HEIGHT);
    imageops::replace(&mut sheet, crop, 0, 0);
    imageops::replace(&mut sheet, template, i64::from(crop.width()), 0);

    let filled = (score.clamp(0.0, 1.0) * width as f32).round() as u32;
    if filled > 0 {
        draw_filled_rect_mut(
            &mut sheet,
            Rect::at(0, height as i32).of_size(filled, SCORE_BAR_HEIGHT),
            Rgb([0, 255, 255]),
        );
    }
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::geometry::Geometry;
    use crate::matcher::Detection;
    use crate::scan::scan;
    use crate::templates::TemplateCatalog;

    fn empty_scan(image: &RgbImage) -> ScanResult {
        let catalog = TemplateCatalog::from_entries(std::iter::empty());
        scan(image, &catalog, &ScanConfig::default(), false).unwrap()
    }

    #[test]
    fn test_overlay_boxes_every_scanned_cell() {
        let image = RgbImage::from_pixel(1920, 1080, Rgb([255, 255, 255]));
        let result = empty_scan(&image);
        let out = OverlayRenderer::default().render(&image, &result);
        let region = result.cell(0, 0).region.unwrap();
        assert_eq!(out.get_pixel(region.x, region.y), &Rgb([0, 255, 0]));
        assert_eq!(out.get_pixel(region.x + region.size - 1, region.y + 10), &Rgb([0, 255, 0]));
        // Interior untouched when no piece was found.
        assert_eq!(out.get_pixel(region.x + 5, region.y + 5), &Rgb([255, 255, 255]));
        // Input is not modified.
        assert_eq!(image.get_pixel(region.x, region.y), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_overlay_labels_detected_pieces() {
        let image = RgbImage::from_pixel(1920, 1080, Rgb([255, 255, 255]));
        let mut result = empty_scan(&image);
        let piece = Piece::from_code('K').unwrap();
        result.cells[0].detection = Detection {
            piece: Some(piece),
            confidence: 0.9,
            ..Detection::EMPTY
        };
        let out = OverlayRenderer::default().render(&image, &result);
        let region = result.cell(0, 0).region.unwrap();
        let (cx, cy) = (region.center_x as u32, region.center_y as u32);
        let label = Rgb([255, 255, 0]);
        let labelled = (cx - 10..cx + 10)
            .flat_map(|x| (cy - 12..cy + 12).map(move |y| (x, y)))
            .filter(|&(x, y)| out.get_pixel(x, y) == &label)
            .count();
        assert!(labelled > 0);
        let g = Geometry::map(1920, 1080, &ScanConfig::default()).unwrap();
        assert_eq!(g.origin_x as u32, cx);
    }

    #[test]
    fn test_glyphs_fit_five_columns() {
        for piece in crate::piece::CATALOG {
            assert!(glyph(piece.code()).iter().all(|row| *row < 32));
            assert_ne!(glyph(piece.code()), [0b11111; 7]);
        }
    }

    #[test]
    fn test_comparison_sheet_layout() {
        let crop = RgbImage::from_pixel(54, 54, Rgb([10, 20, 30]));
        let template = RgbImage::from_pixel(50, 48, Rgb([200, 100, 0]));
        let sheet = comparison_sheet(&crop, &template, 0.5);
        assert_eq!(sheet.dimensions(), (104, 60));
        assert_eq!(sheet.get_pixel(0, 0), &Rgb([10, 20, 30]));
        assert_eq!(sheet.get_pixel(54, 0), &Rgb([200, 100, 0]));
        assert_eq!(sheet.get_pixel(0, 57), &Rgb([0, 255, 255]));
        assert_eq!(sheet.get_pixel(103, 57), &Rgb([0, 0, 0]));
    }
}
