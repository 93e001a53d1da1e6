use axum::http::StatusCode;
use axum::response::IntoResponse;
use face_intake::error::IntakeError;
use face_intake::server::AppError;
use std::path::PathBuf;

#[test]
fn validation_maps_to_bad_request() {
    let err = AppError(IntakeError::Validation("No files uploaded.".into()));
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
}

#[test]
fn missing_report_maps_to_not_found() {
    let err = AppError(IntakeError::ReportNotFound(PathBuf::from("x")));
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[test]
fn other_errors_are_internal() {
    let err = AppError(IntakeError::DetectorUnavailable("gone".into()));
    assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn report_encode_failure_is_internal() {
    let source = serde_json::from_str::<u32>("x").unwrap_err();
    let err = AppError(IntakeError::ReportEncode(source));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(err.0.to_string().starts_with("report serialization failed"));
}
