pub mod dashboard;
pub mod logger;
pub mod session;

pub use dashboard::{Dashboard, Message, Task};
pub use session::{Session, SessionError};
