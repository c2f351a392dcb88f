//! Scan entry point.
//! Wires the pipeline together: map geometry, rescale templates, then for each of the 90 cells
//! extract -> classify side -> match. Cells are independent; with the `rayon` feature they are
//! evaluated in parallel and collected back in row-major order.

use crate::board::{Board, COLS, ROWS, POSITION_SUFFIX};
use crate::cell::{self, CellRegion};
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::geometry::Geometry;
use crate::matcher::{self, Detection};
use crate::piece::Side;
use crate::render::Renderer;
use crate::side;
use crate::templates::TemplateCatalog;
use image::RgbImage;
use log::Level;
use serde::Serialize;
use std::time::Instant;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Diagnostics for one board intersection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CellReport {
    pub row: usize,
    pub col: usize,
    /// `None` when the crop fell outside the image and the cell was skipped
    pub region: Option<CellRegion>,
    pub side: Option<Side>,
    pub detection: Detection,
}

impl CellReport {
    fn skipped(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            region: None,
            side: None,
            detection: Detection::EMPTY,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ScanResult {
    pub board: Board,
    /// Board field only; see `full_position` for the suffixed form
    pub position: String,
    pub geometry: Geometry,
    /// Row-major, one per cell
    pub cells: Vec<CellReport>,
    #[serde(skip)]
    pub annotated: Option<RgbImage>,
}

impl ScanResult {
    pub fn full_position(&self) -> String {
        format!("{}{}", self.position, POSITION_SUFFIX)
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellReport {
        &self.cells[row * COLS + col]
    }

    /// Accepted detections scoring below `ceiling`.
    pub fn low_confidence(&self, ceiling: f32) -> impl Iterator<Item = &CellReport> {
        self.cells
            .iter()
            .filter(move |c| c.detection.piece.is_some() && c.detection.confidence < ceiling)
    }

    pub fn skipped_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.region.is_none()).count()
    }
}

fn scan_cell(
    image: &RgbImage,
    geometry: &Geometry,
    templates: &TemplateCatalog,
    threshold: f32,
    row: usize,
    col: usize,
) -> CellReport {
    let Some(region) = cell::cell_region(geometry, row, col) else {
        return CellReport::skipped(row, col);
    };
    let crop = cell::extract(image, &region);
    let side = side::classify(&crop);
    let detection = matcher::match_piece(&crop, templates, side, threshold);
    CellReport {
        row,
        col,
        region: Some(region),
        side: Some(side),
        detection,
    }
}

fn log_cell(report: &CellReport, level: Level) {
    let (row, col) = (report.row, report.col);
    let d = &report.detection;
    match (d.piece, d.best) {
        (Some(piece), _) => log::log!(level, "[{row},{col}] '{piece}' - {:.2}%", d.confidence * 100.0),
        (None, Some(best)) if best.score > 0.0 => {
            log::log!(level, "[{row},{col}] Empty (score: {:.2}%)", best.score * 100.0)
        }
        (None, None) if report.region.is_some() => log::trace!(
            "[{row},{col}] no eligible {} template",
            report.side.map(|s| s.to_string()).unwrap_or_default()
        ),
        _ => {}
    }
}

/// Scans a captured board. `templates` is the catalog at its native scale; a copy rescaled to
/// this capture is derived for every call.
pub fn scan(
    image: &RgbImage,
    templates: &TemplateCatalog,
    config: &ScanConfig,
    verbose: bool,
) -> Result<ScanResult, ScanError> {
    let start = Instant::now();
    let geometry = Geometry::map(image.width(), image.height(), config)?;
    log::info!(
        "Scanning board ({:.0}x{:.0} px, scale {:.3}, {} geometry)...",
        geometry.board_width(),
        geometry.board_height(),
        geometry.scale,
        config.geometry
    );

    let scaled = templates.at_scale(geometry.scale);
    if scaled.is_empty() {
        log::warn!("No templates loaded; every cell will read as empty");
    }

    let coords: Vec<(usize, usize)> = (0..ROWS)
        .flat_map(|r| (0..COLS).map(move |c| (r, c)))
        .collect();
    let evaluate = |(row, col): (usize, usize)| {
        scan_cell(image, &geometry, &scaled, config.threshold, row, col)
    };

    #[cfg(feature = "rayon")]
    let cells: Vec<CellReport> = coords.into_par_iter().map(evaluate).collect();
    #[cfg(not(feature = "rayon"))]
    let cells: Vec<CellReport> = coords.into_iter().map(evaluate).collect();

    let level = if verbose { Level::Info } else { Level::Debug };
    let mut board = Board::new();
    for report in &cells {
        log_cell(report, level);
        board[(report.row, report.col)] = report.detection.piece;
    }

    let position = board.to_position();
    log::info!(
        "Found {} pieces ({} cells skipped) in {:?}",
        board.piece_count(),
        cells.iter().filter(|c| c.region.is_none()).count(),
        start.elapsed()
    );

    Ok(ScanResult {
        board,
        position,
        geometry,
        cells,
        annotated: None,
    })
}

/// Same as `scan`, then hands the result to `renderer` for an annotated copy of the capture.
pub fn scan_annotated(
    image: &RgbImage,
    templates: &TemplateCatalog,
    config: &ScanConfig,
    verbose: bool,
    renderer: &dyn Renderer,
) -> Result<ScanResult, ScanError> {
    let mut result = scan(image, templates, config, verbose)?;
    result.annotated = Some(renderer.render(image, &result));
    Ok(result)
}
