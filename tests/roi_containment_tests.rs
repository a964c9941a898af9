//! Property tests for face selection and ROI containment

use heart_rate_estimation::{
    config::RoiConfig,
    face_detection::{select_face, FaceCandidate, FaceRegion},
    roi::{derive_roi, mean_green},
    Frame,
};
use proptest::prelude::*;

fn candidate_strategy() -> impl Strategy<Value = FaceCandidate> {
    (-500i32..2000, -500i32..2000, -50i32..1500, -50i32..1500, 0.0f32..10.0).prop_map(
        |(x, y, width, height, score)| FaceCandidate {
            x,
            y,
            width,
            height,
            score,
        },
    )
}

proptest! {
    #[test]
    fn prop_roi_always_inside_frame(
        frame_width in 1usize..1920,
        frame_height in 1usize..1080,
        x in 0usize..2000,
        y in 0usize..2000,
        width in 1usize..2000,
        height in 1usize..2000,
        width_fraction in 0.01f64..2.0,
        top_fraction in -1.0f64..2.0,
        height_fraction in 0.01f64..2.0,
    ) {
        let face = FaceRegion::new(x, y, width, height).unwrap();
        let config = RoiConfig { width_fraction, top_fraction, height_fraction };
        let roi = derive_roi(&face, frame_width, frame_height, &config);

        prop_assert!(roi.width > 0 && roi.height > 0);
        prop_assert!(roi.right() <= frame_width);
        prop_assert!(roi.bottom() <= frame_height);
    }

    #[test]
    fn prop_selected_face_is_inside_frame(
        candidates in proptest::collection::vec(candidate_strategy(), 0..8),
        frame_width in 1usize..1920,
        frame_height in 1usize..1080,
    ) {
        if let Some(face) = select_face(&candidates, frame_width, frame_height) {
            prop_assert!(face.width > 0 && face.height > 0);
            prop_assert!(face.is_within(frame_width, frame_height));

            // Nothing larger was passed over
            for c in &candidates {
                if let Some(region) = c.clamp_to_frame(frame_width, frame_height) {
                    prop_assert!(region.area() <= face.area());
                }
            }
        }
    }

    #[test]
    fn prop_selection_ignores_candidate_order(
        mut candidates in proptest::collection::vec(candidate_strategy(), 1..6),
    ) {
        let forward = select_face(&candidates, 640, 480);
        candidates.reverse();
        prop_assert_eq!(forward, select_face(&candidates, 640, 480));
    }

    #[test]
    fn prop_mean_green_of_uniform_frame(green in 0u8..=255, x in 0usize..60, y in 0usize..40) {
        let frame = Frame::filled(64, 48, [10, green, 200], 0.0).unwrap();
        let face = FaceRegion::new(x, y, 20, 20).unwrap();
        let roi = derive_roi(&face, 64, 48, &RoiConfig::default());
        prop_assert_eq!(mean_green(&frame, &roi), Some(f64::from(green)));
    }
}
