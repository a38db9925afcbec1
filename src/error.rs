use thiserror::Error;

use crate::uploads::ImageStorageError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("username already exists")]
    DuplicateUsername,

    #[error("email already registered")]
    DuplicateEmail,

    #[error("team '{0}' already exists")]
    DuplicateTeam(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("error reading CSV file: {0}")]
    Csv(String),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("forbidden")]
    Forbidden,

    #[error("you cannot modify your own account")]
    SelfModificationDenied,

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<ImageStorageError> for Error {
    fn from(e: ImageStorageError) -> Self {
        match e {
            ImageStorageError::InvalidExtension | ImageStorageError::InvalidFilename => {
                Error::Validation(e.to_string())
            }
            ImageStorageError::TooLarge { .. } => Error::PayloadTooLarge(e.to_string()),
            ImageStorageError::Io(io) => Error::Io(io),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Csv(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
