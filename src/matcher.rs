//! Piece matcher.
//! Scores a crop against every template of the classified side with normalized cross-correlation
//! (mean-subtracted, all three channels) and keeps the best one if it clears the threshold.

use crate::piece::{Piece, Side};
use crate::templates::TemplateCatalog;
use image::RgbImage;
use serde::Serialize;

const FLAT_EPSILON: f64 = 1e-9;

/// Best-scoring template for a crop, whether or not it was accepted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Candidate {
    pub piece: Piece,
    pub score: f32,
}

/// Outcome of matching one crop.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Detection {
    /// Accepted piece, `None` for an empty cell
    pub piece: Option<Piece>,
    /// Score of the accepted piece, 0 when empty
    pub confidence: f32,
    /// `None` when no template was eligible (none loaded for the side, or all larger than the crop)
    pub best: Option<Candidate>,
}

impl Detection {
    pub const EMPTY: Detection = Detection {
        piece: None,
        confidence: 0.0,
        best: None,
    };

    /// True when matching had nothing to compare against, as opposed to a real sub-threshold score.
    pub fn had_no_candidate(&self) -> bool {
        self.best.is_none()
    }
}

/// Template with per-channel means removed, ready to slide over windows.
struct CenteredTemplate {
    width: u32,
    height: u32,
    values: Vec<f64>,
    norm_sq: f64,
}

impl CenteredTemplate {
    fn new(template: &RgbImage) -> Self {
        let n = f64::from(template.width() * template.height());
        let mut means = [0.0f64; 3];
        for px in template.pixels() {
            for c in 0..3 {
                means[c] += f64::from(px[c]);
            }
        }
        means.iter_mut().for_each(|m| *m /= n);

        let values: Vec<f64> = template
            .pixels()
            .flat_map(|px| (0..3).map(move |c| f64::from(px[c]) - means[c]))
            .collect();
        let norm_sq = values.iter().map(|v| v * v).sum();
        Self {
            width: template.width(),
            height: template.height(),
            values,
            norm_sq,
        }
    }

    fn score_at(&self, image: &RgbImage, ox: u32, oy: u32) -> f64 {
        let n = f64::from(self.width * self.height);
        let mut sum = [0.0f64; 3];
        let mut sum_sq = 0.0f64;
        let mut cross = 0.0f64;
        let raw = image.as_raw();
        let stride = image.width() as usize * 3;
        let row_len = self.width as usize * 3;
        for (y, t_row) in self.values.chunks_exact(row_len).enumerate() {
            let start = (oy as usize + y) * stride + ox as usize * 3;
            let window = &raw[start..start + row_len];
            for (i, (&p, &t)) in window.iter().zip(t_row).enumerate() {
                let v = f64::from(p);
                sum[i % 3] += v;
                sum_sq += v * v;
                // Template is zero-mean, so the window mean drops out of the numerator.
                cross += v * t;
            }
        }
        let window_var = sum_sq - sum.iter().map(|s| s * s / n).sum::<f64>();
        let denom = (window_var.max(0.0) * self.norm_sq).sqrt();
        if denom < FLAT_EPSILON {
            return 0.0;
        }
        (cross / denom).clamp(-1.0, 1.0)
    }
}

/// Peak normalized cross-correlation of `template` over every position inside `image`.
/// `None` when the template is larger than the image in either dimension.
pub fn ncc_peak(image: &RgbImage, template: &RgbImage) -> Option<f32> {
    if template.width() == 0
        || template.height() == 0
        || template.width() > image.width()
        || template.height() > image.height()
    {
        return None;
    }
    let centered = CenteredTemplate::new(template);
    let mut peak = f64::NEG_INFINITY;
    for oy in 0..=(image.height() - template.height()) {
        for ox in 0..=(image.width() - template.width()) {
            peak = peak.max(centered.score_at(image, ox, oy));
        }
    }
    Some(peak as f32)
}

/// Matches `crop` against the templates of `side` and applies `threshold` (inclusive).
pub fn match_piece(crop: &RgbImage, templates: &TemplateCatalog, side: Side, threshold: f32) -> Detection {
    let mut best: Option<Candidate> = None;
    for entry in templates.for_side(side) {
        let Some(score) = ncc_peak(crop, &entry.image) else {
            continue;
        };
        if best.is_none_or(|b| score > b.score) {
            best = Some(Candidate { piece: entry.piece, score });
        }
    }

    match best {
        Some(c) if c.score >= threshold => Detection {
            piece: Some(c.piece),
            confidence: c.score,
            best,
        },
        _ => Detection { best, ..Detection::EMPTY },
    }
}
