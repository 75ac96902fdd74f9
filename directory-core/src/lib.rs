pub mod address;
pub mod compatibility;
pub mod identifiers;
pub mod session;

// Re-export main components
pub use address::*;
pub use compatibility::*;
pub use identifiers::*;
pub use session::*;
