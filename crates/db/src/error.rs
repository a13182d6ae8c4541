use thiserror::Error;

/// Failures raised by persistence gateways.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("unique constraint violated on {entity}.{field}")]
    UniqueViolation { entity: &'static str, field: String },

    #[error("{entity} {id} was modified by another writer")]
    StaleVersion { entity: &'static str, id: String },

    #[error("{entity} records cannot be changed once stored")]
    Immutable { entity: &'static str },

    #[error("{entity} {id} does not exist")]
    Missing { entity: &'static str, id: String },

    #[error("in-memory store lock poisoned")]
    Poisoned,

    #[error("migration {module}/{id} failed")]
    Migration {
        module: String,
        id: String,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;
