//! Utility functions for numeric conversions and `OpenCV` interoperability.

pub mod safe_cast;

#[cfg(feature = "opencv")]
pub mod image_conversion;
