use thiserror::Error;

/// Failure of a best-effort environment capability (wake lock, bell).
///
/// These are logged where they occur and never reach the session.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("capability not supported on this system")]
    Unsupported,
    #[error("capability request denied: {0}")]
    Denied(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
