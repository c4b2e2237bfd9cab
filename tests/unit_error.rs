use std::path::PathBuf;

use axum::http::StatusCode;
use command_center::error::{Error, ErrorBody};

#[test]
fn status_codes_map_correctly() {
    let validation = Error::Validation("Missing title".to_string());
    assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);

    let unavailable = Error::NotAvailable("No log found".to_string());
    assert_eq!(unavailable.status_code(), StatusCode::OK);

    let lock = Error::LockFailed(PathBuf::from("data/tasks.json.lock"));
    assert_eq!(lock.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    let corrupt = Error::Corrupt {
        path: PathBuf::from("data/tasks.json"),
        reason: "EOF".to_string(),
    };
    assert_eq!(corrupt.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn error_body_echoes_message() {
    let err = Error::Validation("Missing type".to_string());
    let body = ErrorBody::from(&err);
    assert!(!body.ok);
    assert_eq!(body.error, "Missing type");

    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(value, serde_json::json!({ "ok": false, "error": "Missing type" }));
}
