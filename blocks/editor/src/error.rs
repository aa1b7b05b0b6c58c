use fieldnote_atoms::media::CompressionError;
use fieldnote_shared::{AuthError, ConfigError, GatewayError};
use export_block::ExportError;

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// The viewer does not own the report
    #[error("this report is read-only")]
    ReadOnly,
    #[error("no point with id {0}")]
    UnknownPoint(String),
    #[error("image {0} is not attached to this point")]
    UnknownImage(String),
    #[error("image could not be prepared: {0}")]
    Compression(#[from] CompressionError),
    #[error("save failed: {0}")]
    Persist(GatewayError),
    #[error("upload failed: {0}")]
    Upload(GatewayError),
    #[error("image unavailable: {0}")]
    Storage(GatewayError),
    #[error("capture was cancelled")]
    CaptureCancelled,
    #[error("capture failed: {0}")]
    Capture(String),
    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// Fatal: the app cannot run without its backend parameters
    #[error(transparent)]
    NotConfigured(#[from] ConfigError),
    #[error("sign in first")]
    SignedOut,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("no report with id {0}")]
    UnknownReport(String),
    #[error("only the owner can delete this report")]
    NotOwner,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
