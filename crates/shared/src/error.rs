use thiserror::Error;

/// Failure talking to the signup store. Front ends collapse every variant into
/// a single "submission failed, please retry" notice; the variants exist so
/// diagnostic logs can tell the causes apart.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("signup store request failed: {0}")]
    Transport(String),
    #[error("signup store returned HTTP {status}")]
    Status { status: u16 },
    #[error("signup store acknowledgement was malformed: {0}")]
    InvalidAck(String),
}
