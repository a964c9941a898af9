use crate::frame::Frame;
use crate::{Error, Result};
use log::debug;

#[cfg(feature = "opencv")]
use crate::utils::image_conversion::frame_to_mat;
#[cfg(feature = "opencv")]
use opencv::core::{Mat, Rect, Size, Vector};
#[cfg(feature = "opencv")]
use opencv::imgproc;
#[cfg(feature = "opencv")]
use opencv::objdetect::CascadeClassifier;
#[cfg(feature = "opencv")]
use opencv::prelude::*;
#[cfg(feature = "opencv")]
use std::path::Path;

/// Face rectangle in frame coordinates, guaranteed non-empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRegion {
    /// Left edge in pixels
    pub x: usize,
    /// Top edge in pixels
    pub y: usize,
    /// Width in pixels, always > 0
    pub width: usize,
    /// Height in pixels, always > 0
    pub height: usize,
}

impl FaceRegion {
    /// Create a face region
    ///
    /// # Errors
    ///
    /// Returns an error if width or height is zero
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidInput(format!("Face region must be non-empty, got {width}x{height}")));
        }
        Ok(Self { x, y, width, height })
    }

    /// Area in square pixels
    #[must_use]
    pub fn area(&self) -> usize {
        self.width * self.height
    }

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

    /// Whether the region lies entirely inside a `frame_width` × `frame_height` frame
    #[must_use]
    pub fn is_within(&self, frame_width: usize, frame_height: usize) -> bool {
        self.right() <= frame_width && self.bottom() <= frame_height
    }
}

/// Raw classifier output; may extend past the frame edges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceCandidate {
    /// Left edge in pixels (may be negative)
    pub x: i32,
    /// Top edge in pixels (may be negative)
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
    /// Classifier-specific detection score, higher is better
    pub score: f32,
}

impl FaceCandidate {
    /// Intersect the candidate with the frame, `None` if nothing remains
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to [0, frame dim] first
    pub fn clamp_to_frame(&self, frame_width: usize, frame_height: usize) -> Option<FaceRegion> {
        let max_x = i64::try_from(frame_width).unwrap_or(i64::MAX);
        let max_y = i64::try_from(frame_height).unwrap_or(i64::MAX);

        let x0 = i64::from(self.x).clamp(0, max_x);
        let y0 = i64::from(self.y).clamp(0, max_y);
        let x1 = (i64::from(self.x) + i64::from(self.width)).clamp(0, max_x);
        let y1 = (i64::from(self.y) + i64::from(self.height)).clamp(0, max_y);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(FaceRegion {
            x: x0 as usize,
            y: y0 as usize,
            width: (x1 - x0) as usize,
            height: (y1 - y0) as usize,
        })
    }
}

/// Capability interface over a face detection backend
pub trait FaceClassifier: Send {
    /// Return all face candidates found in the frame
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails on this frame
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceCandidate>>;

    /// Get classifier name
    fn name(&self) -> &str;
}

/// Classifier that always reports one preset rectangle.
///
/// Useful when the host application already tracks the face, or when the
/// subject is known to sit in a fixed part of the picture.
#[derive(Debug, Clone)]
pub struct FixedRegionClassifier {
    candidate: FaceCandidate,
}

impl FixedRegionClassifier {
    /// Create a classifier reporting the given rectangle
    #[must_use]
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            candidate: FaceCandidate {
                x,
                y,
                width,
                height,
                score: 1.0,
            },
        }
    }
}

impl FaceClassifier for FixedRegionClassifier {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<FaceCandidate>> {
        Ok(vec![self.candidate])
    }

    fn name(&self) -> &str {
        "FixedRegionClassifier"
    }
}

/// Pick one face deterministically: largest clamped area, then higher score,
/// then topmost, then leftmost.
#[must_use]
pub fn select_face(candidates: &[FaceCandidate], frame_width: usize, frame_height: usize) -> Option<FaceRegion> {
    candidates
        .iter()
        .filter_map(|c| c.clamp_to_frame(frame_width, frame_height).map(|region| (region, c.score)))
        .max_by(|(a, score_a), (b, score_b)| {
            a.area()
                .cmp(&b.area())
                .then_with(|| score_a.total_cmp(score_b))
                .then_with(|| b.y.cmp(&a.y))
                .then_with(|| b.x.cmp(&a.x))
        })
        .map(|(region, _)| region)
}

/// Finds the face to sample in each frame
pub struct FaceLocator {
    classifier: Box<dyn FaceClassifier>,
}

impl FaceLocator {
    /// Create a locator on top of a classifier backend
    #[must_use]
    pub fn new(classifier: Box<dyn FaceClassifier>) -> Self {
        Self { classifier }
    }

    /// Locate the face to sample in this frame
    ///
    /// # Errors
    ///
    /// Returns `Error::NoFaceDetected` if no usable candidate exists, or the
    /// classifier's own error if detection failed
    pub fn locate(&mut self, frame: &Frame) -> Result<FaceRegion> {
        let candidates = self.classifier.detect(frame)?;
        debug!(
            "{} returned {} face candidate(s)",
            self.classifier.name(),
            candidates.len()
        );
        select_face(&candidates, frame.width(), frame.height()).ok_or(Error::NoFaceDetected)
    }

    /// Name of the underlying classifier
    #[must_use]
    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }
}

/// Frontal face detector backed by an `OpenCV` Haar cascade
#[cfg(feature = "opencv")]
pub struct HaarCascadeClassifier {
    cascade: CascadeClassifier,
    scale_factor: f64,
    min_neighbors: i32,
    min_size: i32,
}

#[cfg(feature = "opencv")]
impl HaarCascadeClassifier {
    /// Load a cascade from an `OpenCV` XML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, the path is not valid UTF-8,
    /// or `OpenCV` cannot load a usable cascade from it
    pub fn new<P: AsRef<Path>>(cascade_path: P, scale_factor: f64, min_neighbors: i32, min_size: i32) -> Result<Self> {
        let path = cascade_path.as_ref();
        if !path.exists() {
            return Err(Error::InvalidConfiguration(format!(
                "Face cascade not found: {}",
                path.display()
            )));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| Error::InvalidConfiguration(format!("Cascade path is not valid UTF-8: {}", path.display())))?;

        let cascade = CascadeClassifier::new(path_str)?;
        if cascade.empty()? {
            return Err(Error::InvalidConfiguration(format!(
                "Cascade file could not be loaded: {}",
                path.display()
            )));
        }

        Ok(Self {
            cascade,
            scale_factor,
            min_neighbors,
            min_size,
        })
    }
}

#[cfg(feature = "opencv")]
impl FaceClassifier for HaarCascadeClassifier {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceCandidate>> {
        let image = frame_to_mat(frame)?;

        let mut gray = Mat::default();
        imgproc::cvt_color(&image, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;

        let mut objects = Vector::<Rect>::new();
        let mut num_detections = Vector::<i32>::new();
        self.cascade.detect_multi_scale2(
            &gray,
            &mut objects,
            &mut num_detections,
            self.scale_factor,
            self.min_neighbors,
            0,
            Size::new(self.min_size, self.min_size),
            Size::default(),
        )?;

        #[allow(clippy::cast_precision_loss)] // neighbour counts are small
        let candidates = objects
            .iter()
            .enumerate()
            .map(|(i, rect)| FaceCandidate {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                score: num_detections.get(i).map_or(0.0, |n| n as f32),
            })
            .collect();

        Ok(candidates)
    }

    fn name(&self) -> &str {
        "HaarCascadeClassifier"
    }
}
