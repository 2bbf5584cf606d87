use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found")]
    NotFound,

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden")]
    Forbidden,

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("{0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("payload exceeds the upload size limit")]
    TooLarge,

    #[error("declared content type does not match the payload")]
    TypeMismatch,

    #[error("requested range is not satisfiable")]
    RangeNotSatisfiable,

    #[error("assets cannot be deleted")]
    Immutable,

    #[error("token space exhausted")]
    CapacityExhausted,

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
