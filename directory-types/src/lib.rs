pub mod messages;
pub mod player;
pub mod region;
pub mod result;
pub mod server;

// Re-export all types
pub use messages::*;
pub use player::*;
pub use region::*;
pub use result::*;
pub use server::*;
