use std::time::Duration;
use uuid::Uuid;

use directory_core::{AddressError, CompatibilityError, IdentifierError, SessionError};
use directory_persistence::RepositoryError;
use directory_types::ResultCode;

/// Every way a coordinator operation can fail. Each variant maps to exactly
/// one wire [`ResultCode`].
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("request invalid: {0}")]
    RequestInvalid(String),
    #[error("player {0} is already signed in")]
    AlreadyLoggedIn(Uuid),
    #[error("account not found")]
    AccountNotFound,
    #[error("server not found")]
    ServerNotFound,
    #[error("account already exists")]
    AccountAlreadyExists,
    #[error("store failure: {0}")]
    Store(#[source] RepositoryError),
    #[error("store did not answer within {0:?}")]
    StoreTimeout(Duration),
}

impl DirectoryError {
    pub fn code(&self) -> ResultCode {
        match self {
            DirectoryError::RequestInvalid(_) => ResultCode::RequestInvalid,
            DirectoryError::AlreadyLoggedIn(_) => ResultCode::AlreadyLoggedInError,
            DirectoryError::AccountNotFound => ResultCode::AccountNotFound,
            DirectoryError::ServerNotFound => ResultCode::ServerNotFound,
            DirectoryError::AccountAlreadyExists => ResultCode::AccountAlreadyExists,
            DirectoryError::Store(_) | DirectoryError::StoreTimeout(_) => ResultCode::Error,
        }
    }
}

impl From<IdentifierError> for DirectoryError {
    fn from(err: IdentifierError) -> Self {
        DirectoryError::RequestInvalid(err.to_string())
    }
}

impl From<AddressError> for DirectoryError {
    fn from(err: AddressError) -> Self {
        DirectoryError::RequestInvalid(err.to_string())
    }
}

impl From<CompatibilityError> for DirectoryError {
    fn from(err: CompatibilityError) -> Self {
        DirectoryError::RequestInvalid(err.to_string())
    }
}

impl From<SessionError> for DirectoryError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::AlreadyActive(player_id) => DirectoryError::AlreadyLoggedIn(player_id),
        }
    }
}
