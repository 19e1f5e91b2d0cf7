use chrono::{DateTime, Utc};
use serde_json::{Value as JsonValue, json};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

/// Machine-readable error codes, grouped by prefix family.
///
/// The rendered form (`db/not-found`, `auth/user-not-found`, ...) is what
/// reaches structured logs and crash reports; the family prefix decides the
/// error kind when a code is handed to [`AppError::generic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ValidationFailed,
    DataIntegrity,
    AuthUserNotFound,
    AuthSessionExpired,
    DbNotFound,
    DbPermissionDenied,
    DbUnavailable,
    DbReadFailed,
    DbWriteFailed,
    DbOperationFailed,
    NetworkUnavailable,
    NetworkTimeout,
    BatchPartialFailure,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "validation/failed",
            ErrorCode::DataIntegrity => "validation/data-integrity",
            ErrorCode::AuthUserNotFound => "auth/user-not-found",
            ErrorCode::AuthSessionExpired => "auth/session-expired",
            ErrorCode::DbNotFound => "db/not-found",
            ErrorCode::DbPermissionDenied => "db/permission-denied",
            ErrorCode::DbUnavailable => "db/unavailable",
            ErrorCode::DbReadFailed => "db/read-failed",
            ErrorCode::DbWriteFailed => "db/write-failed",
            ErrorCode::DbOperationFailed => "db/operation-failed",
            ErrorCode::NetworkUnavailable => "network/unavailable",
            ErrorCode::NetworkTimeout => "network/timeout",
            ErrorCode::BatchPartialFailure => "batch/partial-failure",
        }
    }

    /// Prefix family (`validation`, `auth`, `db`, `network`, `batch`).
    pub fn family(&self) -> &'static str {
        self.as_str().split('/').next().unwrap_or("db")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure domain of an [`AppError`].
///
/// All kinds share the same field set on `AppError`; the kind exists for
/// call-site discrimination only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    RemoteStore,
    Network,
    Aggregated,
}

impl ErrorKind {
    /// Kind selection for generically constructed errors: the code's prefix
    /// family decides, and unknown families fall back to the remote store.
    fn from_code(code: ErrorCode) -> Self {
        match code.family() {
            "auth" => ErrorKind::Auth,
            "network" => ErrorKind::Network,
            _ => ErrorKind::RemoteStore,
        }
    }
}

/// One failed sub-operation inside an aggregated batch failure.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub operation: String,
    pub error: AppError,
}

/// Partial-failure report attached to aggregated errors.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub failures: Vec<BatchFailure>,
    pub success_count: usize,
}

impl BatchReport {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// A single failing field reported by schema validation.
///
/// `path` holds the segments from the document root down to the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub path: Vec<String>,
    pub message: String,
}

impl FieldIssue {
    pub fn new<I, S>(path: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }

    /// Dotted form of the path, e.g. `config.name` or `items.3.item_name`.
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

/// Structured application error used across every fallible operation.
///
/// Construction is pure: nothing here logs or reports. Callers decide what
/// to do with the error; `user_message` is the only text a UI may show.
#[derive(Debug, Clone, Error)]
#[error("[{code}] {message} ({context})")]
pub struct AppError {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    /// Developer-facing description.
    pub message: String,
    /// End-user-facing description, composed at construction time.
    pub user_message: String,
    /// Component/method/entity the error originated from.
    pub context: String,
    /// Free-form structured detail, e.g. per-field validation failures.
    pub metadata: Option<JsonValue>,
    pub retryable: bool,
    pub timestamp: DateTime<Utc>,
    /// Populated for `ErrorKind::Aggregated` only.
    pub batch: Option<BatchReport>,
}

const USER_MESSAGE_GENERIC: &str = "Something went wrong. Please try again.";
const USER_MESSAGE_VALIDATION: &str = "Please check the highlighted fields and try again.";
const USER_MESSAGE_INTEGRITY: &str =
    "We couldn't read your saved data. Please contact support if this keeps happening.";
const USER_MESSAGE_PERMISSION: &str = "You don't have permission to do this.";
const USER_MESSAGE_NOT_FOUND: &str = "We couldn't find what you were looking for.";
const USER_MESSAGE_UNAVAILABLE: &str =
    "The service is temporarily unavailable. Please try again in a moment.";

impl AppError {
    /// Generic constructor; the concrete kind is chosen from the code's
    /// prefix family (`auth` / `db` / `network`, default remote store).
    pub fn generic(
        code: ErrorCode,
        message: impl Into<String>,
        user_message: impl Into<String>,
        context: impl Into<String>,
        metadata: Option<JsonValue>,
        retryable: bool,
    ) -> Self {
        Self {
            kind: ErrorKind::from_code(code),
            code,
            message: message.into(),
            user_message: user_message.into(),
            context: context.into(),
            metadata,
            retryable,
            timestamp: Utc::now(),
            batch: None,
        }
    }

    /// Validation failure: the caller can fix it by correcting input.
    pub fn validation(
        message: impl Into<String>,
        context: impl Into<String>,
        metadata: Option<JsonValue>,
    ) -> Self {
        Self {
            kind: ErrorKind::Validation,
            code: ErrorCode::ValidationFailed,
            message: message.into(),
            user_message: USER_MESSAGE_VALIDATION.to_string(),
            context: context.into(),
            metadata,
            retryable: false,
            timestamp: Utc::now(),
            batch: None,
        }
    }

    /// Data read back from the store failed defensive validation.
    ///
    /// Not retryable: retrying re-reads the same corrupt document.
    pub fn data_integrity(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            code: ErrorCode::DataIntegrity,
            message: message.into(),
            user_message: USER_MESSAGE_INTEGRITY.to_string(),
            context: context.into(),
            metadata: None,
            retryable: false,
            timestamp: Utc::now(),
            batch: None,
        }
    }

    /// Classifies a raw platform failure from the remote store.
    ///
    /// The platform does not reliably expose structured codes, so this
    /// matches on message substrings. Anything unrecognized is treated as a
    /// retryable store error so transient failures are never mistaken for
    /// permanent ones.
    pub fn from_remote_store<E: fmt::Display>(raw: &E, context: impl Into<String>) -> Self {
        let raw_message = raw.to_string();
        let lowered = raw_message.to_lowercase();
        let context = context.into();

        if lowered.contains("permission-denied") || lowered.contains("permission denied") {
            return Self::generic(
                ErrorCode::DbPermissionDenied,
                format!("Remote store denied access: {}", raw_message),
                USER_MESSAGE_PERMISSION,
                context,
                None,
                false,
            );
        }

        if lowered.contains("not-found") || lowered.contains("not found") {
            return Self::generic(
                ErrorCode::DbNotFound,
                format!("Remote document not found: {}", raw_message),
                USER_MESSAGE_NOT_FOUND,
                context,
                None,
                false,
            );
        }

        if lowered.contains("unavailable") {
            return Self::generic(
                ErrorCode::DbUnavailable,
                format!("Remote store unavailable: {}", raw_message),
                USER_MESSAGE_UNAVAILABLE,
                context,
                None,
                true,
            );
        }

        Self::generic(
            ErrorCode::DbOperationFailed,
            format!("Remote store operation failed: {}", raw_message),
            USER_MESSAGE_GENERIC,
            context,
            None,
            true,
        )
    }

    /// Converts schema validation issues into a validation error carrying a
    /// `field_errors` map of dotted path -> message.
    pub fn from_schema_issues(issues: &[FieldIssue], context: impl Into<String>) -> Self {
        let field_errors: BTreeMap<String, String> = issues
            .iter()
            .map(|issue| (issue.dotted_path(), issue.message.clone()))
            .collect();

        Self::validation(
            format!("Schema validation failed for {} field(s)", field_errors.len()),
            context,
            Some(json!({ "field_errors": field_errors })),
        )
    }

    /// Aggregated partial failure of a batch of independent sub-operations.
    ///
    /// Retryable iff any underlying failure is retryable.
    pub fn aggregated(
        code: ErrorCode,
        message: impl Into<String>,
        user_message: impl Into<String>,
        context: impl Into<String>,
        failures: Vec<BatchFailure>,
        success_count: usize,
    ) -> Self {
        let retryable = failures.iter().any(|failure| failure.error.retryable);
        Self {
            kind: ErrorKind::Aggregated,
            code,
            message: message.into(),
            user_message: user_message.into(),
            context: context.into(),
            metadata: None,
            retryable,
            timestamp: Utc::now(),
            batch: Some(BatchReport {
                failures,
                success_count,
            }),
        }
    }

    pub fn user_not_found(context: impl Into<String>) -> Self {
        Self::generic(
            ErrorCode::AuthUserNotFound,
            "User account not found",
            "We couldn't find your account. Please sign in again.",
            context,
            None,
            false,
        )
    }

    pub fn entity_not_found(context: impl Into<String>) -> Self {
        Self::generic(
            ErrorCode::DbNotFound,
            "Requested entity does not exist",
            USER_MESSAGE_NOT_FOUND,
            context,
            None,
            false,
        )
    }

    pub fn is_validation(&self) -> bool {
        self.kind == ErrorKind::Validation
    }

    pub fn is_auth(&self) -> bool {
        self.kind == ErrorKind::Auth
    }

    pub fn is_remote_store(&self) -> bool {
        self.kind == ErrorKind::RemoteStore
    }

    pub fn is_network(&self) -> bool {
        self.kind == ErrorKind::Network
    }

    pub fn is_aggregated(&self) -> bool {
        self.kind == ErrorKind::Aggregated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct RawFailure(&'static str);

    impl fmt::Display for RawFailure {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    #[test]
    fn generic_selects_kind_from_code_family() {
        let auth = AppError::generic(
            ErrorCode::AuthSessionExpired,
            "expired",
            "Please sign in again.",
            "ctx",
            None,
            false,
        );
        assert_eq!(auth.kind, ErrorKind::Auth);

        let network = AppError::generic(
            ErrorCode::NetworkTimeout,
            "timeout",
            "Check your connection.",
            "ctx",
            None,
            true,
        );
        assert_eq!(network.kind, ErrorKind::Network);

        let store = AppError::generic(
            ErrorCode::DbWriteFailed,
            "write failed",
            "Try again.",
            "ctx",
            None,
            true,
        );
        assert_eq!(store.kind, ErrorKind::RemoteStore);

        // Codes outside the auth/network families fall back to remote store.
        let fallback = AppError::generic(
            ErrorCode::BatchPartialFailure,
            "partial",
            "Try again.",
            "ctx",
            None,
            false,
        );
        assert_eq!(fallback.kind, ErrorKind::RemoteStore);
    }

    #[test]
    fn remote_store_classification_permission_denied() {
        let err = AppError::from_remote_store(&RawFailure("permission-denied"), "ctx");
        assert_eq!(err.code, ErrorCode::DbPermissionDenied);
        assert!(!err.retryable);
        assert_eq!(err.context, "ctx");
    }

    #[test]
    fn remote_store_classification_not_found() {
        let err = AppError::from_remote_store(&RawFailure("document not-found"), "ctx");
        assert_eq!(err.code, ErrorCode::DbNotFound);
        assert!(!err.retryable);
    }

    #[test]
    fn remote_store_classification_unavailable_is_retryable() {
        let err = AppError::from_remote_store(&RawFailure("service unavailable"), "ctx");
        assert_eq!(err.code, ErrorCode::DbUnavailable);
        assert!(err.retryable);
    }

    #[test]
    fn remote_store_classification_defaults_to_retryable() {
        let err = AppError::from_remote_store(&RawFailure("deadline exceeded"), "ctx");
        assert_eq!(err.code, ErrorCode::DbOperationFailed);
        assert!(err.retryable, "unrecognized failures must stay retryable");
    }

    #[test]
    fn schema_issues_become_field_error_map() {
        let issues = vec![
            FieldIssue::new(["config", "name"], "must not be empty"),
            FieldIssue::new(["items", "0", "item_name"], "missing"),
        ];
        let err = AppError::from_schema_issues(&issues, "ctx");

        assert!(err.is_validation());
        assert!(!err.retryable);
        let metadata = err.metadata.expect("field_errors metadata");
        let field_errors = metadata.get("field_errors").expect("map present");
        assert_eq!(
            field_errors.get("config.name").and_then(|v| v.as_str()),
            Some("must not be empty")
        );
        assert_eq!(
            field_errors
                .get("items.0.item_name")
                .and_then(|v| v.as_str()),
            Some("missing")
        );
    }

    #[test]
    fn aggregated_retryable_iff_any_constituent_retryable() {
        let permanent = AppError::validation("bad", "ctx", None);
        let transient = AppError::from_remote_store(&RawFailure("unavailable"), "ctx");

        let only_permanent = AppError::aggregated(
            ErrorCode::BatchPartialFailure,
            "1 of 2 failed",
            "Some lists could not be set up.",
            "ctx",
            vec![BatchFailure {
                operation: "tasks".to_string(),
                error: permanent.clone(),
            }],
            1,
        );
        assert!(!only_permanent.retryable);

        let with_transient = AppError::aggregated(
            ErrorCode::BatchPartialFailure,
            "2 of 3 failed",
            "Some lists could not be set up.",
            "ctx",
            vec![
                BatchFailure {
                    operation: "tasks".to_string(),
                    error: permanent,
                },
                BatchFailure {
                    operation: "kit".to_string(),
                    error: transient,
                },
            ],
            1,
        );
        assert!(with_transient.retryable);
        assert_eq!(with_transient.batch.as_ref().unwrap().failure_count(), 2);
        assert_eq!(with_transient.batch.as_ref().unwrap().success_count, 1);
    }

    #[test]
    fn convenience_constructors() {
        let user = AppError::user_not_found("AuthGate::resolve");
        assert!(user.is_auth());
        assert_eq!(user.code, ErrorCode::AuthUserNotFound);

        let entity = AppError::entity_not_found("ListRepository::get");
        assert!(entity.is_remote_store());
        assert_eq!(entity.code, ErrorCode::DbNotFound);
    }
}
