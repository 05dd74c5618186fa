pub mod service;
pub mod session;

pub use service::{StreamHandle, StreamService};
pub use session::{StreamControl, StreamSession, StreamState};
