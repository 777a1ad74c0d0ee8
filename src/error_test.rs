use super::*;

#[test]
fn server_error_is_network_failure() {
    let err = ClientError::Server { status: 502, message: "bad gateway".into() };
    assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    assert_eq!(err.error_code(), "E_SERVER");
    assert!(err.retryable());
    assert_eq!(err.to_string(), "server returned 502: bad gateway");
}

#[test]
fn client_side_status_is_not_retryable() {
    let err = ClientError::Server { status: 400, message: "Missing fields".into() };
    assert!(!err.retryable());
}

#[test]
fn viewport_not_ready_is_geometry_kind() {
    let err = ClientError::ViewportNotReady;
    assert_eq!(err.kind(), ErrorKind::GeometryUnavailable);
    assert_eq!(err.error_code(), "E_VIEWPORT_NOT_READY");
}

#[test]
fn validation_is_validation_kind() {
    let err = ClientError::validation("recipient email is required");
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    assert_eq!(err.to_string(), "recipient email is required");
    assert!(!err.retryable());
}

#[test]
fn draft_errors_map_to_client_errors() {
    assert!(matches!(ClientError::from(DraftError::ViewportNotReady), ClientError::ViewportNotReady));
    let err = ClientError::from(DraftError::NotPlacing);
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    assert!(err.to_string().contains("no signature is being placed"));
}

#[test]
fn io_error_is_local_storage() {
    let err = ClientError::from(std::io::Error::other("disk full"));
    assert_eq!(err.kind(), ErrorKind::LocalStorage);
    assert_eq!(err.error_code(), "E_STORAGE");
}

#[test]
fn invalid_link_keeps_its_cause() {
    let cause = ClientError::Server { status: 404, message: "Link not found".into() };
    let err = ClientError::InvalidLink(Box::new(cause));
    assert_eq!(err.to_string(), "invalid or expired link");
    assert_eq!(err.error_code(), "E_INVALID_LINK");
    assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    let source = std::error::Error::source(&err).unwrap();
    assert_eq!(source.to_string(), "server returned 404: Link not found");
}
