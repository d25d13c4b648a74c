use serde::{Deserialize, Serialize};

/// Lifecycle state of a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No session; awaiting prepare
    Idle,
    /// Destination validated and options stored; awaiting start
    Prepared,
    /// Accepting frames
    Recording,
    /// Stop requested; encoder is draining and sealing the asset
    Stopping,
    /// Output asset sealed and playable
    Finalized,
    /// Fatal encoder error; only reset is accepted
    Failed,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}
