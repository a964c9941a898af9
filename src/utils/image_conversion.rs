//! Image conversion utilities between OpenCV Mat and [`Frame`].

use crate::frame::Frame;
use crate::utils::safe_cast::{i32_to_usize, usize_to_i32};
use crate::{Error, Result};
use opencv::core::{Mat, Scalar, Vec3b, CV_8UC3};
use opencv::prelude::*;

/// Convert an 8-bit 3-channel OpenCV Mat into a [`Frame`]
///
/// # Arguments
/// * `mat` - OpenCV Mat with type CV_8UC3 (BGR as delivered by `VideoCapture`)
/// * `timestamp` - capture time in seconds
///
/// # Errors
/// * Returns error if Mat dimensions or type are invalid
/// * Returns error if Mat data cannot be accessed
pub fn mat_to_frame(mat: &Mat, timestamp: f64) -> Result<Frame> {
    let rows = mat.rows();
    let cols = mat.cols();

    if rows <= 0 || cols <= 0 {
        return Err(Error::InvalidInput(format!("Invalid Mat dimensions: {cols}x{rows}")));
    }
    if mat.typ() != CV_8UC3 {
        return Err(Error::InvalidInput(format!(
            "Expected 8-bit 3-channel Mat, got type {}",
            mat.typ()
        )));
    }

    let height = i32_to_usize(rows)?;
    let width = i32_to_usize(cols)?;

    // Continuous Mats can be copied in one go
    let data = if mat.is_continuous() {
        mat.data_bytes()?.to_vec()
    } else {
        let mut data = Vec::with_capacity(height * width * 3);
        for row in 0..rows {
            for col in 0..cols {
                let pixel = mat.at_2d::<Vec3b>(row, col)?;
                data.extend_from_slice(&[pixel[0], pixel[1], pixel[2]]);
            }
        }
        data
    };

    Frame::from_raw(width, height, data, timestamp)
}

/// Convert a [`Frame`] into an 8-bit 3-channel OpenCV Mat
///
/// # Errors
/// * Returns error if the frame is too large for OpenCV indices
/// * Returns error if Mat creation fails
pub fn frame_to_mat(frame: &Frame) -> Result<Mat> {
    let height = usize_to_i32(frame.height())?;
    let width = usize_to_i32(frame.width())?;

    let mut mat = Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::default())?;

    // Both sides are row-major H×W×3, so the bytes copy across unchanged
    let pixels = frame.pixels();
    let bytes = mat.data_bytes_mut()?;
    if bytes.len() != pixels.len() {
        return Err(Error::InvalidInput(format!(
            "Mat holds {} bytes, frame has {}",
            bytes.len(),
            pixels.len()
        )));
    }
    if let Some(slice) = pixels.as_slice() {
        bytes.copy_from_slice(slice);
    } else {
        for (dst, src) in bytes.iter_mut().zip(pixels.iter()) {
            *dst = *src;
        }
    }

    Ok(mat)
}
