//! Report editing: autosave, image attachment, capture and navigation.

pub mod capture;
pub mod error;
pub mod session;
pub mod shell;
pub mod sync;

pub use capture::{capture_channel, CaptureError, CaptureResponder, CaptureSession, Dictation, PhotoCapture};
pub use error::{EditorError, ShellError};
pub use session::EditorSession;
pub use shell::{Screen, Shell};
pub use sync::{SyncController, SyncStatus, DEFAULT_DEBOUNCE};
