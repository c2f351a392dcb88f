//! Side classifier.
//! Decides whether a crop shows a red or a black piece by counting pixels in two HSV masks.
//! The decision is forced: an empty crop still gets a side, and the matcher decides whether a piece is there.

use crate::piece::Side;
use image::{Rgb, RgbImage};

/// Hue/saturation/value in the 8-bit convention: hue in `0..=180`, saturation and value in `0..=255`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl From<Rgb<u8>> for Hsv {
    fn from(Rgb([r, g, b]): Rgb<u8>) -> Self {
        let (rf, gf, bf) = (f32::from(r), f32::from(g), f32::from(b));
        let max = rf.max(gf).max(bf);
        let min = rf.min(gf).min(bf);
        let diff = max - min;

        let s = if max > 0.0 { diff / max * 255.0 } else { 0.0 };
        let mut h = if diff == 0.0 {
            0.0
        } else if max == rf {
            60.0 * (gf - bf) / diff
        } else if max == gf {
            120.0 + 60.0 * (bf - rf) / diff
        } else {
            240.0 + 60.0 * (rf - gf) / diff
        };
        if h < 0.0 {
            h += 360.0;
        }

        Self {
            h: (h / 2.0).round() as u8,
            s: s.round() as u8,
            v: max as u8,
        }
    }
}

const RED_HUE_LOW: u8 = 10;
const RED_HUE_HIGH: u8 = 170;
const RED_MIN_SATURATION: u8 = 50;
const RED_MIN_VALUE: u8 = 50;
const BLACK_MAX_VALUE: u8 = 70;

fn is_red(hsv: Hsv) -> bool {
    (hsv.h <= RED_HUE_LOW || hsv.h >= RED_HUE_HIGH)
        && hsv.s >= RED_MIN_SATURATION
        && hsv.v >= RED_MIN_VALUE
}

fn is_black(hsv: Hsv) -> bool {
    hsv.v <= BLACK_MAX_VALUE
}

/// Pixel counts for both masks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColorCounts {
    pub red: u32,
    pub black: u32,
}

pub fn count_colors(crop: &RgbImage) -> ColorCounts {
    crop.pixels().fold(ColorCounts::default(), |mut acc, &px| {
        let hsv = Hsv::from(px);
        acc.red += u32::from(is_red(hsv));
        acc.black += u32::from(is_black(hsv));
        acc
    })
}

/// Red only when strictly more pixels are red than dark.
pub fn classify(crop: &RgbImage) -> Side {
    let counts = count_colors(crop);
    if counts.red > counts.black {
        Side::Red
    } else {
        Side::Black
    }
}
