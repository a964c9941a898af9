//! Linear detrending and standardisation.

use crate::constants::EPSILON;
use crate::utils::safe_cast::usize_to_f64;
use crate::{Error, Result};

/// Remove the least-squares linear trend over sample index, then scale to
/// zero mean and unit population standard deviation.
///
/// A trace with no variance left after detrending comes back as all zeros.
///
/// # Errors
///
/// Returns `Error::InsufficientData` for fewer than two samples
pub fn detrend(values: &[f64]) -> Result<Vec<f64>> {
    let n = values.len();
    if n < 2 {
        return Err(Error::InsufficientData { samples: n, required: 2 });
    }

    let count = usize_to_f64(n);
    let mean_x = (count - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / count;

    let (sxy, sxx) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sxy, sxx), (i, &y)| {
            let dx = usize_to_f64(i) - mean_x;
            (sxy + dx * (y - mean_y), sxx + dx * dx)
        });
    let slope = sxy / sxx;

    let residuals: Vec<f64> = values
        .iter()
        .enumerate()
        .map(|(i, &y)| y - mean_y - slope * (usize_to_f64(i) - mean_x))
        .collect();

    // Residuals of a least-squares fit already have zero mean
    let variance = residuals.iter().map(|r| r * r).sum::<f64>() / count;
    let std_dev = variance.sqrt();

    if std_dev <= EPSILON {
        return Ok(vec![0.0; n]);
    }

    Ok(residuals.into_iter().map(|r| r / std_dev).collect())
}
