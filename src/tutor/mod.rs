// Seams to the remote tutor services and the state they drive
pub mod explanation;
pub mod quiz;
pub mod session;

pub use explanation::*;
pub use quiz::*;
pub use session::*;
