//! Template store.
//! Loads the reference piece images from the template directory and derives a copy at the
//! current detection scale. A file that fails to load is logged and left out; matching then
//! simply has one candidate fewer.

use crate::piece::{CATALOG, Piece, Side};
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::path::Path;

/// One reference bitmap and the piece it depicts.
#[derive(Clone, Debug)]
pub struct TemplateEntry {
    pub piece: Piece,
    pub image: RgbImage,
}

/// Templates in fixed catalog order, at most one per piece code.
#[derive(Clone, Debug)]
pub struct TemplateCatalog {
    entries: Vec<TemplateEntry>,
    scale: f64,
}

fn catalog_index(piece: Piece) -> usize {
    CATALOG.iter().position(|&p| p == piece).unwrap_or(CATALOG.len())
}

impl TemplateCatalog {
    /// Loads every catalog template from `dir`. Unreadable files are skipped with a warning.
    pub fn load(dir: &Path) -> Self {
        let mut entries = Vec::with_capacity(CATALOG.len());
        for piece in CATALOG {
            let path = dir.join(piece.template_file());
            match image::open(&path) {
                Ok(img) => entries.push(TemplateEntry { piece, image: img.to_rgb8() }),
                Err(e) => log::warn!(
                    "Template for '{}' unavailable ({}): {}",
                    piece,
                    path.display(),
                    e
                ),
            }
        }
        log::debug!("Loaded {}/{} templates from {}", entries.len(), CATALOG.len(), dir.display());
        Self { entries, scale: 1.0 }
    }

    /// Builds a catalog from in-memory images. A second image for the same piece is ignored.
    pub fn from_entries(images: impl IntoIterator<Item = (Piece, RgbImage)>) -> Self {
        let mut entries: Vec<TemplateEntry> = Vec::new();
        for (piece, image) in images {
            if entries.iter().any(|e| e.piece == piece) {
                log::warn!("Duplicate template for '{}' ignored", piece);
                continue;
            }
            entries.push(TemplateEntry { piece, image });
        }
        entries.sort_by_key(|e| catalog_index(e.piece));
        Self { entries, scale: 1.0 }
    }

    /// Returns a new catalog with every template resized by `scale` (cubic filter).
    /// At `scale == 1.0` the images are used as loaded.
    pub fn at_scale(&self, scale: f64) -> Self {
        let factor = scale / self.scale;
        if factor == 1.0 {
            return self.clone();
        }
        let entries = self
            .entries
            .iter()
            .map(|e| {
                let w = ((f64::from(e.image.width()) * factor).round() as u32).max(1);
                let h = ((f64::from(e.image.height()) * factor).round() as u32).max(1);
                TemplateEntry {
                    piece: e.piece,
                    image: imageops::resize(&e.image, w, h, FilterType::CatmullRom),
                }
            })
            .collect();
        Self { entries, scale }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn get(&self, piece: Piece) -> Option<&TemplateEntry> {
        self.entries.iter().find(|e| e.piece == piece)
    }

    /// Candidates for one side, in catalog order.
    pub fn for_side(&self, side: Side) -> impl Iterator<Item = &TemplateEntry> {
        self.entries.iter().filter(move |e| e.piece.side == side)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemplateEntry> {
        self.entries.iter()
    }

    /// Catalog pieces with no loaded template.
    pub fn missing(&self) -> Vec<Piece> {
        CATALOG
            .into_iter()
            .filter(|&p| self.get(p).is_none())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn piece(code: char) -> Piece {
        Piece::from_code(code).unwrap()
    }

    #[test]
    fn test_from_entries_orders_by_catalog_and_dedupes() {
        let catalog = TemplateCatalog::from_entries([
            (piece('p'), RgbImage::new(4, 4)),
            (piece('R'), RgbImage::new(4, 4)),
            (piece('K'), RgbImage::new(4, 4)),
            (piece('R'), RgbImage::new(9, 9)),
        ]);
        let codes: Vec<char> = catalog.iter().map(|e| e.piece.code()).collect();
        assert_eq!(codes, vec!['R', 'K', 'p']);
        assert_eq!(catalog.get(piece('R')).unwrap().image.width(), 4);
    }

    #[test]
    fn test_for_side_filters_by_tag() {
        let catalog = TemplateCatalog::from_entries(CATALOG.map(|p| (p, RgbImage::new(2, 2))));
        assert_eq!(catalog.len(), 14);
        assert!(catalog.for_side(Side::Red).all(|e| e.piece.side == Side::Red));
        assert_eq!(catalog.for_side(Side::Black).count(), 7);
    }

    #[test]
    fn test_at_scale_resizes_into_new_catalog() {
        let base = TemplateCatalog::from_entries([(
            piece('C'),
            RgbImage::from_pixel(40, 30, Rgb([200, 0, 0])),
        )]);
        let scaled = base.at_scale(1.5);
        assert_eq!(scaled.get(piece('C')).unwrap().image.dimensions(), (60, 45));
        assert_eq!(scaled.scale(), 1.5);
        // Source is untouched.
        assert_eq!(base.get(piece('C')).unwrap().image.dimensions(), (40, 30));

        let half = scaled.at_scale(0.5);
        assert_eq!(half.get(piece('C')).unwrap().image.dimensions(), (20, 15));
    }

    #[test]
    fn test_unit_scale_keeps_images() {
        let img = RgbImage::from_fn(5, 7, |x, y| Rgb([x as u8, y as u8, 3]));
        let base = TemplateCatalog::from_entries([(piece('a'), img.clone())]);
        assert_eq!(base.at_scale(1.0).get(piece('a')).unwrap().image, img);
    }

    #[test]
    fn test_load_missing_dir_yields_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = TemplateCatalog::load(&dir.path().join("nope"));
        assert!(catalog.is_empty());
        assert_eq!(catalog.missing().len(), 14);
    }

    #[test]
    #[ignore = "requires the 14 piece PNGs in ./templates"]
    fn test_load_bundled_templates() {
        let catalog = TemplateCatalog::load(Path::new("templates"));
        assert!(catalog.missing().is_empty(), "missing: {:?}", catalog.missing());
    }

    #[test]
    fn test_load_skips_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(10, 10, Rgb([20, 20, 20]))
            .save(dir.path().join("black_general.png"))
            .unwrap();
        std::fs::write(dir.path().join("red_general.png"), b"not a png").unwrap();

        let catalog = TemplateCatalog::load(dir.path());
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get(piece('k')).is_some());
        assert!(catalog.get(piece('K')).is_none());
        assert_eq!(catalog.missing().len(), 13);
    }
}
