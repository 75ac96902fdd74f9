use sea_orm::{DbErr, SqlErr};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    AlreadyExists,
    #[error("stored record is invalid: {0}")]
    InvalidRecord(String),
    #[error(transparent)]
    Database(DbErr),
}

impl From<DbErr> for RepositoryError {
    fn from(err: DbErr) -> Self {
        // Unique indexes back up the lookup-before-insert checks
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => RepositoryError::AlreadyExists,
            _ => RepositoryError::Database(err),
        }
    }
}
