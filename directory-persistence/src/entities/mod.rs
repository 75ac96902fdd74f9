pub mod prelude;

pub mod players;
pub mod servers;
