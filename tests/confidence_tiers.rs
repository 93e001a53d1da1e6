use face_intake::detector::neural::apply_confidence_tiers;
use face_intake::detector::{BoundingBox, Detection};

fn scored(x: i32, score: f32) -> Detection {
    Detection::new(BoundingBox::new(x, 0, 10, 10), Some(score))
}

#[test]
fn primary_tier_wins_when_non_empty() {
    let raw = vec![scored(0, 0.9), scored(20, 0.4)];
    let kept = apply_confidence_tiers(raw, 0.6, 0.3);
    assert_eq!(kept, vec![scored(0, 0.9)]);
}

#[test]
fn fallback_tier_activates_for_borderline_photos() {
    let raw = vec![scored(0, 0.45), scored(20, 0.31), scored(40, 0.1)];
    let kept = apply_confidence_tiers(raw, 0.6, 0.3);
    assert_eq!(kept, vec![scored(0, 0.45), scored(20, 0.31)]);
}

#[test]
fn fallback_can_still_be_empty() {
    let raw = vec![scored(0, 0.2)];
    assert!(apply_confidence_tiers(raw, 0.6, 0.3).is_empty());
}

#[test]
fn no_raw_detections_stays_empty() {
    assert!(apply_confidence_tiers(Vec::new(), 0.6, 0.3).is_empty());
}

#[test]
fn thresholds_are_inclusive() {
    let kept = apply_confidence_tiers(vec![scored(0, 0.6)], 0.6, 0.3);
    assert_eq!(kept.len(), 1);
}
