use frame_rotate::FrameError;
use thiserror::Error;

pub type Result<T, E = SessionError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no camera selected")]
    NoCamera,
    #[error("camera not found: {0}")]
    NotFound(String),
    #[error("capture session already running")]
    AlreadyRunning,
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Frame(#[from] FrameError),
}
