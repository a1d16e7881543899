//! Conversions from external infrastructure errors into domain errors.

use r2d2::Error as PoolError;
use reqwest::{Error as HttpError, StatusCode};
use rendezvous_domain::RendezvousError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub RendezvousError);

impl From<InfraError> for RendezvousError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<RendezvousError> for InfraError {
    fn from(value: RendezvousError) -> Self {
        Self(value)
    }
}

trait IntoRendezvousError {
    fn into_rendezvous(self) -> RendezvousError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → RendezvousError */
/* -------------------------------------------------------------------------- */

impl IntoRendezvousError for SqlError {
    fn into_rendezvous(self) -> RendezvousError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        RendezvousError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        RendezvousError::Database("database is locked".into())
                    }
                    // SQLITE_CONSTRAINT_UNIQUE / SQLITE_CONSTRAINT_PRIMARYKEY
                    (ErrorCode::ConstraintViolation, 2067 | 1555) => {
                        RendezvousError::Conflict(format!("unique constraint violation: {message}"))
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        RendezvousError::Database("foreign key constraint violation".into())
                    }
                    _ => RendezvousError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => {
                RendezvousError::NotFound("no rows returned by query".into())
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                RendezvousError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                RendezvousError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => RendezvousError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => RendezvousError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        Self(value.into_rendezvous())
    }
}

impl From<PoolError> for InfraError {
    fn from(value: PoolError) -> Self {
        Self(RendezvousError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → RendezvousError */
/* -------------------------------------------------------------------------- */

impl IntoRendezvousError for HttpError {
    fn into_rendezvous(self) -> RendezvousError {
        if self.is_timeout() {
            return RendezvousError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return RendezvousError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            return status_error(status, "");
        }

        if self.is_decode() {
            return RendezvousError::Network(format!("malformed response body: {self}"));
        }

        RendezvousError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_rendezvous())
    }
}

/// Map a non-success HTTP status onto the domain taxonomy
///
/// `detail` is appended to the message when it is not empty.
pub fn status_error(status: StatusCode, detail: &str) -> RendezvousError {
    let code = status.as_u16();
    let mut message =
        format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));
    let detail = detail.trim();
    if !detail.is_empty() {
        message.push_str(": ");
        message.push_str(detail);
    }

    match code {
        401 | 403 => RendezvousError::Unauthorized(message),
        404 => RendezvousError::NotFound(message),
        408 | 429 => RendezvousError::Network(message),
        400..=499 => RendezvousError::InvalidInput(message),
        _ => RendezvousError::Network(message),
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
