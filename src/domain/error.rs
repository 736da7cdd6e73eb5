//! Application error types with proper error chaining.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use super::listing::ListingStatus;
use super::money::Currency;

/// Business rule violation raised by the listing aggregate and its value objects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0}")]
    Invalid(String),
    #[error("Only {} listings can be {verb}", .required.as_str().to_lowercase())]
    InvalidTransition {
        required: ListingStatus,
        current: ListingStatus,
        verb: &'static str,
    },
    #[error("Cannot modify archived listings")]
    ArchivedListing,
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl DomainError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        DomainError::Invalid(message.into())
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Cannot {operation} Money with different currencies ({left} vs {right}).")]
    CurrencyMismatch {
        operation: &'static str,
        left: Currency,
        right: Currency,
    },
    #[error("Cannot divide Money by zero.")]
    DivideByZero,
    #[error("Money {operation} overflowed.")]
    Overflow { operation: &'static str },
}

/// Error codes used to classify every failure reported to clients.
///
/// [`as_str`](Self::as_str) is the `type` field of an error response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceErrorCode {
    /// Malformed request that never reached the domain.
    #[default]
    General,
    NotFound,
    /// A business rule rejected the operation.
    InvalidOperation,
    Conflict,
    ValidationFailed,
    /// Infrastructure or programming failure; details stay in the logs.
    Internal,
}

impl ServiceErrorCode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "bad_request",
            Self::NotFound => "not_found",
            Self::InvalidOperation => "invalid_operation",
            Self::Conflict => "conflict",
            Self::ValidationFailed => "validation_failed",
            Self::Internal => "internal_error",
        }
    }
}

impl fmt::Display for ServiceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure raised by the application layer, tagged with an error code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ServiceError {
    pub code: ServiceErrorCode,
    pub message: String,
}

impl ServiceError {
    pub fn new(code: ServiceErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ServiceErrorCode::NotFound,
            format!("{resource} with id '{id}' was not found."),
        )
    }

    pub fn listing_not_found(id: Uuid) -> Self {
        Self::not_found("Listing", id)
    }
}

#[derive(Error, Debug, Clone)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Query execution failed: {0}")]
    Query(String),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Duplicate record: {0}")]
    Duplicate(String),
    #[error("Pool exhausted: {0}")]
    PoolExhausted(String),
    #[error("Transient failure: {0}")]
    Transient(String),
    #[error("Migration failed: {0}")]
    Migration(String),
}

impl DatabaseError {
    /// Whether re-running the whole unit of work may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DatabaseError::Connection(_) | DatabaseError::PoolExhausted(_) | DatabaseError::Transient(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Error, Debug)]
pub enum ValidationError {
    /// Unparseable body or query string.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    /// Well-formed input that breaks field rules.
    #[error("Validation failed: {0}")]
    Multiple(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The error code this failure is reported under.
    #[must_use]
    pub fn code(&self) -> ServiceErrorCode {
        match self {
            AppError::Domain(_) => ServiceErrorCode::InvalidOperation,
            AppError::Service(err) => err.code,
            AppError::Validation(ValidationError::InvalidFormat(_)) => ServiceErrorCode::General,
            AppError::Validation(ValidationError::Multiple(_)) => ServiceErrorCode::ValidationFailed,
            AppError::Database(DatabaseError::NotFound(_)) => ServiceErrorCode::NotFound,
            AppError::Database(DatabaseError::Duplicate(_)) => ServiceErrorCode::Conflict,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                ServiceErrorCode::Internal
            }
        }
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Database(err) if err.is_transient())
    }
}

impl From<MoneyError> for AppError {
    fn from(err: MoneyError) -> Self {
        AppError::Domain(DomainError::Money(err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(ValidationError::Multiple(err.to_string()))
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Row not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted("Pool timed out".to_string()),
            sqlx::Error::Io(io) => DatabaseError::Connection(io.to_string()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => DatabaseError::Duplicate(db_err.message().to_string()),
                // serialization_failure, deadlock_detected
                Some("40001" | "40P01") => DatabaseError::Transient(db_err.message().to_string()),
                _ => DatabaseError::Query(db_err.message().to_string()),
            },
            _ => DatabaseError::Query(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(DatabaseError::from(err))
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(DatabaseError::Migration(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_conversions() {
        let not_found = DatabaseError::from(sqlx::Error::RowNotFound);
        assert!(matches!(not_found, DatabaseError::NotFound(_)));

        let pool_timeout = DatabaseError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(pool_timeout, DatabaseError::PoolExhausted(_)));

        let io = DatabaseError::from(sqlx::Error::Io(std::io::Error::other("reset")));
        assert!(matches!(io, DatabaseError::Connection(_)));

        let generic = DatabaseError::from(sqlx::Error::WorkerCrashed);
        assert!(matches!(generic, DatabaseError::Query(_)));
    }

    #[test]
    fn test_database_error_transience() {
        assert!(DatabaseError::Connection("reset".into()).is_transient());
        assert!(DatabaseError::PoolExhausted("busy".into()).is_transient());
        assert!(DatabaseError::Transient("40001".into()).is_transient());
        assert!(!DatabaseError::Duplicate("pk".into()).is_transient());
        assert!(!DatabaseError::Query("syntax".into()).is_transient());
    }

    #[test]
    fn test_validation_conversion() {
        use validator::Validate;

        #[derive(Validate)]
        struct TestStruct {
            #[validate(length(max = 3))]
            val: String,
        }

        let s = TestStruct {
            val: "too long".to_string(),
        };
        let err = s.validate().unwrap_err();
        let app_err = AppError::from(err);

        assert!(matches!(
            app_err,
            AppError::Validation(ValidationError::Multiple(_))
        ));
        assert_eq!(app_err.code(), ServiceErrorCode::ValidationFailed);
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = DomainError::InvalidTransition {
            required: ListingStatus::Draft,
            current: ListingStatus::Published,
            verb: "published",
        };
        assert_eq!(err.to_string(), "Only draft listings can be published");
    }

    #[test]
    fn test_money_error_display() {
        let err = MoneyError::CurrencyMismatch {
            operation: "add",
            left: Currency::Usd,
            right: Currency::Eur,
        };
        assert_eq!(
            err.to_string(),
            "Cannot add Money with different currencies (USD vs EUR)."
        );
        assert_eq!(
            MoneyError::DivideByZero.to_string(),
            "Cannot divide Money by zero."
        );
        assert_eq!(
            MoneyError::Overflow { operation: "multiply" }.to_string(),
            "Money multiply overflowed."
        );
    }

    #[test]
    fn test_service_error_not_found_message() {
        let id = Uuid::nil();
        let err = ServiceError::listing_not_found(id);
        assert_eq!(err.code, ServiceErrorCode::NotFound);
        assert_eq!(
            err.to_string(),
            "Listing with id '00000000-0000-0000-0000-000000000000' was not found."
        );
    }

    #[test]
    fn test_app_error_codes() {
        let domain: AppError = DomainError::ArchivedListing.into();
        assert_eq!(domain.code(), ServiceErrorCode::InvalidOperation);

        let conflict: AppError = ServiceError::new(ServiceErrorCode::Conflict, "taken").into();
        assert_eq!(conflict.code(), ServiceErrorCode::Conflict);

        let duplicate: AppError = DatabaseError::Duplicate("pk".into()).into();
        assert_eq!(duplicate.code(), ServiceErrorCode::Conflict);

        let missing_row: AppError = DatabaseError::NotFound("row".into()).into();
        assert_eq!(missing_row.code(), ServiceErrorCode::NotFound);

        let broken_json = AppError::Validation(ValidationError::InvalidFormat("eof".into()));
        assert_eq!(broken_json.code(), ServiceErrorCode::General);

        for internal in [
            AppError::Internal("boom".into()),
            AppError::Config(ConfigError::MissingEnvVar("DATABASE_URL".into())),
            AppError::Database(DatabaseError::Query("syntax".into())),
            AppError::Database(DatabaseError::Connection("reset".into())),
        ] {
            assert_eq!(internal.code(), ServiceErrorCode::Internal, "{internal:?}");
        }
    }

    #[test]
    fn test_error_code_labels() {
        let labels: Vec<_> = [
            ServiceErrorCode::General,
            ServiceErrorCode::NotFound,
            ServiceErrorCode::InvalidOperation,
            ServiceErrorCode::Conflict,
            ServiceErrorCode::ValidationFailed,
            ServiceErrorCode::Internal,
        ]
        .iter()
        .map(ServiceErrorCode::as_str)
        .collect();
        assert_eq!(
            labels,
            [
                "bad_request",
                "not_found",
                "invalid_operation",
                "conflict",
                "validation_failed",
                "internal_error"
            ]
        );
    }

    #[test]
    fn test_app_error_transience() {
        let transient: AppError = DatabaseError::Transient("deadlock".into()).into();
        assert!(transient.is_transient());

        let domain: AppError = DomainError::ArchivedListing.into();
        assert!(!domain.is_transient());
    }

    #[test]
    fn test_database_error_display() {
        let err = DatabaseError::Connection("timeout".to_string());
        assert_eq!(err.to_string(), "Connection failed: timeout");

        let err = DatabaseError::NotFound("listing".to_string());
        assert_eq!(err.to_string(), "Record not found: listing");

        let err = DatabaseError::Transient("deadlock".to_string());
        assert_eq!(err.to_string(), "Transient failure: deadlock");

        let err = DatabaseError::Migration("failed".to_string());
        assert_eq!(err.to_string(), "Migration failed: failed");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingEnvVar("DATABASE_URL".to_string());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: DATABASE_URL"
        );

        let err = ConfigError::InvalidValue {
            key: "PORT".to_string(),
            message: "not a number".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid value for 'PORT': not a number");
    }

    #[test]
    fn test_app_error_from_migrate_error() {
        let mig_err = sqlx::migrate::MigrateError::VersionMissing(1);
        let app_err: AppError = mig_err.into();

        match app_err {
            AppError::Database(DatabaseError::Migration(msg)) => {
                assert!(msg.contains("migration 1 was previously applied"));
            }
            _ => panic!("Expected DatabaseError::Migration, got {:?}", app_err),
        }
    }
}
