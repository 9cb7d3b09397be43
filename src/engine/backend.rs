//! Audio backend start-up.
//!
//! Output devices often refuse to run until something unlocks them (a user
//! gesture, a permission prompt, a device that takes a moment to open). The
//! engine asks its backend to unlock on the first note and keeps asking on
//! later notes until the backend reports it is running. `unlock` is never
//! called again while an earlier unlock is still pending; `poll` is used
//! instead.

use thiserror::Error;

/// Result of an unlock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockState {
    /// Audio is flowing.
    Running,
    /// The request is in flight; ask again with [`AudioBackend::poll`].
    Pending,
}

/// The backend refused to start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

pub trait AudioBackend: Send {
    /// Begin starting audio output.
    fn unlock(&mut self) -> Result<UnlockState, BackendError>;

    /// Check on an unlock that returned [`UnlockState::Pending`].
    fn poll(&mut self) -> Result<UnlockState, BackendError> {
        Ok(UnlockState::Running)
    }
}

/// Backend for hosts that drive rendering themselves (offline rendering,
/// tests, or a device that is already open). Always running.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBackend;

impl AudioBackend for NoopBackend {
    fn unlock(&mut self) -> Result<UnlockState, BackendError> {
        Ok(UnlockState::Running)
    }
}
