pub mod connection;
pub mod entities;
pub mod error;
pub mod locks;
pub mod repositories;

pub use error::RepositoryError;
