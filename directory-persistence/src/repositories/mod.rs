pub mod player_repository;
pub mod server_repository;

pub use player_repository::PlayerRepository;
pub use server_repository::{NewServer, ServerRepository};
