use thiserror::Error;
use tonic::{Code, Status};

/// Errore unico dell'applicazione: ogni operazione dei motori restituisce
/// uno di questi, e il livello RPC lo converte in `tonic::Status`.
#[derive(Debug, Error)]
pub enum AppError {
    // Errori di logica/input
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    AlreadyExists(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    FailedPrecondition(String),
    #[error("Invalid credentials")]
    Unauthenticated,

    // Errori interni
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn already_exists(msg: impl Into<String>) -> Self {
        AppError::AlreadyExists(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        AppError::InvalidArgument(msg.into())
    }

    pub fn denied(msg: impl Into<String>) -> Self {
        AppError::PermissionDenied(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        AppError::FailedPrecondition(msg.into())
    }

    /// Codice gRPC corrispondente alla variante.
    pub fn code(&self) -> Code {
        match self {
            AppError::NotFound(_) => Code::NotFound,
            AppError::AlreadyExists(_) => Code::AlreadyExists,
            AppError::InvalidArgument(_) => Code::InvalidArgument,
            AppError::PermissionDenied(_) => Code::PermissionDenied,
            AppError::FailedPrecondition(_) => Code::FailedPrecondition,
            AppError::Unauthenticated => Code::Unauthenticated,
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::PasswordHash(_)
            | AppError::Internal(_) => Code::Internal,
        }
    }
}

/// Vero se l'errore del database è una violazione di un vincolo UNIQUE.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("blocking task failed: {e}"))
    }
}

// Gli errori interni vengono loggati qui con tutto il contesto; al client
// arriva solo un messaggio generico.
impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        let code = err.code();
        if code == Code::Internal {
            tracing::error!(error = ?err, "Internal error while handling request");
            return Status::internal("An internal server error occurred");
        }
        Status::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_keep_their_message() {
        let status = Status::from(AppError::invalid("Cannot add yourself"));
        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "Cannot add yourself");

        let status = Status::from(AppError::Unauthenticated);
        assert_eq!(status.code(), Code::Unauthenticated);
    }

    #[test]
    fn internal_errors_are_masked() {
        let status = Status::from(AppError::Internal("select * from users where name='x'".into()));
        assert_eq!(status.code(), Code::Internal);
        assert_eq!(status.message(), "An internal server error occurred");

        let status = Status::from(AppError::Database(sqlx::Error::RowNotFound));
        assert_eq!(status.code(), Code::Internal);
    }
}
