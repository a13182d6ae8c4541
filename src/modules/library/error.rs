use std::fmt;

use serde_json::json;
use shelf_db::StorageError;
use shelf_http::error::AppError;
use thiserror::Error;

use super::validation::FieldError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Book,
    Borrower,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Book => "Book",
            Self::Borrower => "Borrower",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    AlreadyBorrowed,
    NotBorrowed,
    DuplicateEmail,
    /// Another writer changed the book between read and write.
    ConcurrentModification,
}

impl ConflictKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::AlreadyBorrowed => "already_borrowed",
            Self::NotBorrowed => "not_borrowed",
            Self::DuplicateEmail => "duplicate_email",
            Self::ConcurrentModification => "concurrent_modification",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AlreadyBorrowed => "Book already borrowed",
            Self::NotBorrowed => "Book has not been borrowed",
            Self::DuplicateEmail => "A borrower with this email is already registered",
            Self::ConcurrentModification => "Book was modified concurrently; retry the request",
        })
    }
}

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("{0} not found")]
    NotFound(EntityKind),

    #[error("{0}")]
    Conflict(ConflictKind),

    #[error("validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for LibraryError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UniqueViolation { entity: "borrower", ref field } if field == "email" => {
                Self::Conflict(ConflictKind::DuplicateEmail)
            }
            StorageError::StaleVersion { .. } => {
                Self::Conflict(ConflictKind::ConcurrentModification)
            }
            other => Self::Storage(other),
        }
    }
}

pub type LibraryResult<T> = Result<T, LibraryError>;

impl From<LibraryError> for AppError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::NotFound(kind) => {
                let code = match kind {
                    EntityKind::Book => "book_not_found",
                    EntityKind::Borrower => "borrower_not_found",
                };
                AppError::not_found(format!("{kind} not found")).with_code(code)
            }
            LibraryError::Conflict(kind) => {
                AppError::conflict(vec![json!({ "reason": kind.code() })], kind.to_string())
                    .with_code(kind.code())
            }
            LibraryError::Validation(fields) => {
                let details = fields
                    .into_iter()
                    .map(|f| json!({ "field": f.field, "error": f.error }))
                    .collect();
                AppError::validation(details, "request validation failed")
            }
            LibraryError::Storage(source) => AppError::Internal(source.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn unique_email_violation_becomes_conflict() {
        let err: LibraryError = StorageError::UniqueViolation {
            entity: "borrower",
            field: "email".to_string(),
        }
        .into();
        assert!(matches!(err, LibraryError::Conflict(ConflictKind::DuplicateEmail)));
    }

    #[test]
    fn stale_version_becomes_conflict() {
        let err: LibraryError = StorageError::StaleVersion {
            entity: "book",
            id: "1".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            LibraryError::Conflict(ConflictKind::ConcurrentModification)
        ));
    }

    #[test]
    fn other_storage_errors_stay_internal() {
        let err: LibraryError = StorageError::Poisoned.into();
        assert!(matches!(err, LibraryError::Storage(StorageError::Poisoned)));
        assert_eq!(AppError::from(err).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn boundary_statuses_are_distinct() {
        let cases = [
            (LibraryError::NotFound(EntityKind::Book), StatusCode::NOT_FOUND),
            (LibraryError::NotFound(EntityKind::Borrower), StatusCode::NOT_FOUND),
            (
                LibraryError::Conflict(ConflictKind::AlreadyBorrowed),
                StatusCode::CONFLICT,
            ),
            (
                LibraryError::Conflict(ConflictKind::NotBorrowed),
                StatusCode::CONFLICT,
            ),
            (
                LibraryError::Validation(vec![FieldError::new("isbn", "must not be blank")]),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn not_found_codes_name_the_entity() {
        match AppError::from(LibraryError::NotFound(EntityKind::Borrower)) {
            AppError::NotFound { code, message } => {
                assert_eq!(code, "borrower_not_found");
                assert_eq!(message, "Borrower not found");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
