pub use super::players::Entity as Players;
pub use super::servers::Entity as Servers;
