//! Recording session management
//!
//! This module provides the recording session state machine:
//! - Lifecycle states and transitions (prepare/start/stop/reset)
//! - Per-frame admission through the frame sampler
//! - The writer task feeding kept frames to the encoder sink
//! - Session statistics and the typed error taxonomy

mod error;
mod options;
mod session;
mod state;
mod stats;

pub use error::{SessionError, SessionResult};
pub use options::SessionOptions;
pub use session::RecordingSession;
pub use state::SessionState;
pub use stats::{RecordingSummary, SessionStats};
