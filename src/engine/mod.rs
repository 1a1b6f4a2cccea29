//! Engine collaborator seam and the session that owns its lifecycle.

mod backend;
mod session;
mod stub;

pub use backend::{AudioBackend, EngineConfig, EngineHandle, NullStreamListener, StreamListener};
pub use session::{EngineSession, ShutdownPolicy};
pub use stub::{StubBackend, StubEngineHandle};
