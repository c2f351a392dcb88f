//! Xiangqi board scanner.
//! Turns a screenshot of a Chinese chess board into a 10x9 grid of piece codes and a
//! run-length position string (`rnbakabnr/9/...`).
//!
//! Pipeline per scan: `geometry` maps the calibrated layout onto the capture, `templates`
//! rescales the reference pieces, then each cell goes through `cell` -> `side` -> `matcher`
//! and lands in a `board::Board`. Rendering is separate and only reads the result.

pub mod board;
pub mod cell;
pub mod config;
pub mod error;
pub mod geometry;
pub mod matcher;
pub mod piece;
pub mod render;
pub mod scan;
pub mod side;
pub mod templates;

pub use board::{Board, POSITION_SUFFIX};
pub use config::{GeometryPolicy, ReferenceLayout, ScanConfig};
pub use error::ScanError;
pub use geometry::Geometry;
pub use matcher::Detection;
pub use piece::{Piece, PieceKind, Side};
pub use render::{OverlayRenderer, Renderer};
pub use scan::{CellReport, ScanResult, scan, scan_annotated};
pub use templates::TemplateCatalog;
