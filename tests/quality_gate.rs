mod common;

use common::{FailingDetector, ScriptedDetector, photo_with_faces};
use face_intake::detector::{BoundingBox, Detection};
use face_intake::quality::{QualityGate, Verdict, classify, select_main_face};
use face_intake::report::ImageRejection;
use face_intake::storage::{create_job, save_upload};

#[test]
fn classification_rule() {
    assert_eq!(classify(0), Verdict::Rejected(ImageRejection::NoFace));
    assert_eq!(classify(1), Verdict::Passed);
    assert_eq!(classify(2), Verdict::Rejected(ImageRejection::MultipleFaces));
    assert_eq!(classify(7), Verdict::Rejected(ImageRejection::MultipleFaces));
}

#[test]
fn main_face_prefers_area_times_score() {
    let dets = [
        Detection::new(BoundingBox::new(0, 0, 100, 100), Some(0.5)),
        Detection::new(BoundingBox::new(0, 0, 80, 80), Some(0.9)),
        Detection::new(BoundingBox::new(0, 0, 10, 10), None),
    ];
    // 5000 vs 5760 vs 100
    assert_eq!(select_main_face(&dets), Some(1));
    assert_eq!(select_main_face(&dets), select_main_face(&dets));
}

#[test]
fn main_face_missing_score_counts_as_one() {
    let dets = [
        Detection::new(BoundingBox::new(0, 0, 10, 10), Some(0.99)),
        Detection::new(BoundingBox::new(0, 0, 10, 10), None),
    ];
    assert_eq!(select_main_face(&dets), Some(1));
}

#[test]
fn main_face_ties_go_to_first() {
    let dets = [
        Detection::new(BoundingBox::new(50, 0, 20, 20), None),
        Detection::new(BoundingBox::new(0, 0, 20, 20), None),
    ];
    assert_eq!(select_main_face(&dets), Some(0));
    assert_eq!(select_main_face(&[]), None);
}

#[test]
fn gate_preserves_upload_order_and_records_reasons() {
    let tmp = tempfile::tempdir().unwrap();
    let job = create_job(tmp.path()).unwrap();
    let uploads = job.uploads_dir();

    let names = vec![
        save_upload(&photo_with_faces(1), "one.png", &uploads).unwrap(),
        save_upload(&photo_with_faces(0), "none.png", &uploads).unwrap(),
        save_upload(b"not an image", "broken.jpg", &uploads).unwrap(),
        save_upload(&photo_with_faces(2), "pair.jpg", &uploads).unwrap(),
        save_upload(&photo_with_faces(1), "another.webp", &uploads).unwrap(),
    ];

    let check = QualityGate::new(&ScriptedDetector, true).run(&job, &names);

    let passed: Vec<&str> = check.passed.iter().map(|p| p.filename.as_str()).collect();
    assert_eq!(passed, vec![names[0].as_str(), names[4].as_str()]);
    assert!(check.passed.iter().all(|p| p.faces_detected == 1));

    let rejected: Vec<(&str, ImageRejection, Option<usize>)> = check
        .rejected
        .iter()
        .map(|r| (r.filename.as_str(), r.reason, r.faces_detected))
        .collect();
    assert_eq!(
        rejected,
        vec![
            (names[1].as_str(), ImageRejection::NoFace, None),
            (names[2].as_str(), ImageRejection::Unreadable, None),
            (names[3].as_str(), ImageRejection::MultipleFaces, Some(2)),
        ]
    );
}

#[test]
fn previews_written_to_work_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let job = create_job(tmp.path()).unwrap();
    let name = save_upload(&photo_with_faces(2), "pair.png", &job.uploads_dir()).unwrap();

    let check = QualityGate::new(&ScriptedDetector, true).run(&job, &[name.clone()]);

    let preview = check.rejected[0].preview.clone().expect("preview recorded");
    assert_eq!(preview, format!("work/preview__{name}"));
    assert!(job.root.join(&preview).is_file());
    assert!(image::open(job.root.join(&preview)).is_ok());
}

#[test]
fn previews_can_be_disabled() {
    let tmp = tempfile::tempdir().unwrap();
    let job = create_job(tmp.path()).unwrap();
    let name = save_upload(&photo_with_faces(1), "one.png", &job.uploads_dir()).unwrap();

    let check = QualityGate::new(&ScriptedDetector, false).run(&job, &[name]);

    assert_eq!(check.passed.len(), 1);
    assert!(check.passed[0].preview.is_none());
    assert_eq!(std::fs::read_dir(job.work_dir()).unwrap().count(), 0);
}

#[test]
fn detector_failure_rejects_only_that_image() {
    let tmp = tempfile::tempdir().unwrap();
    let job = create_job(tmp.path()).unwrap();
    let names = vec![
        save_upload(&photo_with_faces(1), "a.png", &job.uploads_dir()).unwrap(),
        save_upload(&photo_with_faces(1), "b.png", &job.uploads_dir()).unwrap(),
    ];

    let check = QualityGate::new(&FailingDetector, true).run(&job, &names);

    assert!(check.passed.is_empty());
    assert_eq!(check.rejected.len(), 2);
    assert!(check
        .rejected
        .iter()
        .all(|r| r.reason == ImageRejection::DetectionFailed));
}
