//! Forehead region of interest derived from a detected face.

use crate::config::RoiConfig;
use crate::constants::GREEN_CHANNEL;
use crate::face_detection::FaceRegion;
use crate::frame::Frame;
use crate::utils::safe_cast::{f64_to_usize_clamp, usize_to_f64};
use ndarray::s;

/// Sampling rectangle, always non-empty and inside the frame it was derived for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    /// Left edge in pixels
    pub x: usize,
    /// Top edge in pixels
    pub y: usize,
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
}

impl Roi {
    /// Exclusive right edge
    #[must_use]
    pub fn right(&self) -> usize {
        self.x + self.width
    }

    /// Exclusive bottom edge
    #[must_use]
    pub fn bottom(&self) -> usize {
        self.y + self.height
    }

    /// Number of pixels covered
    #[must_use]
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

/// Clamp `[start, end)` into `[0, limit)` keeping at least one pixel
fn clamp_span(start: f64, end: f64, limit: usize) -> (usize, usize) {
    let lo = f64_to_usize_clamp(start.floor(), 0, limit);
    let mut hi = f64_to_usize_clamp(end.floor(), 0, limit);
    if hi <= lo {
        hi = lo + 1;
    }
    if hi > limit {
        return (limit - 1, limit);
    }
    (lo, hi)
}

/// Derive the forehead ROI from a face box.
///
/// The band is centred horizontally on the face, `width_fraction` of the face
/// wide, starting `top_fraction` of the face height below the face's top edge
/// and `height_fraction` of the face height tall. The result is clamped to the
/// frame and never empty.
///
/// `frame_width` and `frame_height` must be non-zero.
#[must_use]
pub fn derive_roi(face: &FaceRegion, frame_width: usize, frame_height: usize, config: &RoiConfig) -> Roi {
    let face_w = usize_to_f64(face.width);
    let face_h = usize_to_f64(face.height);

    let center_x = usize_to_f64(face.x) + face_w / 2.0;
    let half_width = face_w * config.width_fraction / 2.0;
    let top = usize_to_f64(face.y) + face_h * config.top_fraction;
    let bottom = top + face_h * config.height_fraction;

    let (x0, x1) = clamp_span(center_x - half_width, center_x + half_width, frame_width.max(1));
    let (y0, y1) = clamp_span(top, bottom, frame_height.max(1));

    Roi {
        x: x0,
        y: y0,
        width: x1 - x0,
        height: y1 - y0,
    }
}

/// Mean green intensity over the ROI, `None` if the ROI does not fit the frame
#[must_use]
pub fn mean_green(frame: &Frame, roi: &Roi) -> Option<f64> {
    if roi.area() == 0 || roi.right() > frame.width() || roi.bottom() > frame.height() {
        return None;
    }

    let pixels = frame.pixels();
    let green = pixels.slice(s![roi.y..roi.bottom(), roi.x..roi.right(), GREEN_CHANNEL]);
    let sum: f64 = green.iter().map(|&v| f64::from(v)).sum();
    Some(sum / usize_to_f64(roi.area()))
}
