use super::*;
use rstest::rstest;

#[rstest]
#[case(AppError::Unauthorized("x".into()), 401, "UNAUTHORIZED")]
#[case(AppError::Validation("x".into()), 400, "VALIDATION_ERROR")]
#[case(AppError::PermissionDenied("x".into()), 403, "PERMISSION_DENIED")]
#[case(AppError::SodViolation("x".into()), 403, "SOD_VIOLATION")]
#[case(AppError::InvalidStateTransition("x".into()), 409, "INVALID_STATE_TRANSITION")]
#[case(AppError::PeriodClosed("x".into()), 409, "PERIOD_CLOSED")]
#[case(AppError::ChecklistIncomplete("x".into()), 409, "CHECKLIST_INCOMPLETE")]
#[case(AppError::AmountMismatch("x".into()), 409, "AMOUNT_MISMATCH")]
#[case(AppError::AlreadyReconciled("x".into()), 409, "ALREADY_RECONCILED")]
#[case(AppError::AlreadyGenerated("x".into()), 409, "ALREADY_GENERATED")]
#[case(AppError::NotFound("x".into()), 404, "NOT_FOUND")]
#[case(AppError::Database("x".into()), 500, "DATABASE_ERROR")]
#[case(AppError::Internal("x".into()), 500, "INTERNAL_ERROR")]
fn test_status_and_code(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
    assert_eq!(err.status_code(), status);
    assert_eq!(err.error_code(), code);
    assert_eq!(err.message(), "x");
}

#[test]
fn test_error_display() {
    assert_eq!(
        AppError::PeriodClosed("period is closed".into()).to_string(),
        "Period closed: period is closed"
    );
    assert_eq!(
        AppError::SodViolation("creator cannot approve".into()).to_string(),
        "Segregation of duties violation: creator cannot approve"
    );
}

#[test]
fn test_server_errors() {
    assert!(AppError::Database(String::new()).is_server_error());
    assert!(AppError::Internal(String::new()).is_server_error());
    assert!(!AppError::Validation(String::new()).is_server_error());
    assert!(!AppError::AmountMismatch(String::new()).is_server_error());
}
