//! Host capabilities (dictation, camera) as request/response pairs.
//!
//! The host keeps the [`CaptureResponder`] and owns the device for as long as
//! the matching [`CaptureSession`] is alive. Cancelling or dropping the
//! session signals the responder to release the microphone or camera.

use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("capture cancelled")]
    Cancelled,
    #[error("capture failed: {0}")]
    Failed(String),
}

/// Consumer side: await the outcome or cancel
#[derive(Debug)]
pub struct CaptureSession<T> {
    result: oneshot::Receiver<Result<T, String>>,
    cancel: Option<oneshot::Sender<()>>,
}

/// Host side: deliver one result, or notice that nobody wants it any more
#[derive(Debug)]
pub struct CaptureResponder<T> {
    result: oneshot::Sender<Result<T, String>>,
    cancel: oneshot::Receiver<()>,
    released: bool,
}

/// Transcript from speech recognition
pub type Dictation = CaptureSession<String>;
/// Encoded still image from the camera
pub type PhotoCapture = CaptureSession<Vec<u8>>;

pub fn capture_channel<T>() -> (CaptureSession<T>, CaptureResponder<T>) {
    let (result_tx, result_rx) = oneshot::channel();
    let (cancel_tx, cancel_rx) = oneshot::channel();
    (
        CaptureSession {
            result: result_rx,
            cancel: Some(cancel_tx),
        },
        CaptureResponder {
            result: result_tx,
            cancel: cancel_rx,
            released: false,
        },
    )
}

impl<T> CaptureSession<T> {
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }

    /// Wait for the host. A responder dropped without answering counts as cancelled.
    pub async fn outcome(mut self) -> Result<T, CaptureError> {
        let received = (&mut self.result).await;
        // The device is no longer needed either way
        self.cancel();
        match received {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(CaptureError::Failed(message)),
            Err(_) => Err(CaptureError::Cancelled),
        }
    }
}

impl<T> Drop for CaptureSession<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<T> CaptureResponder<T> {
    /// Deliver the result. `false` if the session is already gone.
    pub fn respond(self, result: Result<T, String>) -> bool {
        self.result.send(result).is_ok()
    }

    /// Resolves once the session cancels, finishes or is dropped
    pub async fn released(&mut self) {
        if !self.released {
            let _ = (&mut self.cancel).await;
            self.released = true;
        }
    }

    pub fn is_released(&mut self) -> bool {
        if !self.released {
            self.released = !matches!(self.cancel.try_recv(), Err(oneshot::error::TryRecvError::Empty));
        }
        self.released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_result() {
        let (session, responder) = capture_channel::<String>();
        assert!(responder.respond(Ok("crack above door".to_string())));
        assert_eq!(session.outcome().await.unwrap(), "crack above door");
    }

    #[tokio::test]
    async fn host_failure_is_reported() {
        let (session, responder) = capture_channel::<Vec<u8>>();
        responder.respond(Err("camera busy".to_string()));
        assert_eq!(session.outcome().await.unwrap_err(), CaptureError::Failed("camera busy".to_string()));
    }

    #[tokio::test]
    async fn cancel_releases_the_device() {
        let (mut session, mut responder) = capture_channel::<String>();
        assert!(!responder.is_released());
        session.cancel();
        responder.released().await;
        assert!(responder.is_released());
    }

    #[tokio::test]
    async fn dropping_the_session_releases_too() {
        let (session, mut responder) = capture_channel::<String>();
        drop(session);
        assert!(responder.is_released());
        assert!(!responder.respond(Ok("too late".to_string())));
    }

    #[tokio::test]
    async fn dropped_responder_reads_as_cancelled() {
        let (session, responder) = capture_channel::<String>();
        drop(responder);
        assert_eq!(session.outcome().await.unwrap_err(), CaptureError::Cancelled);
    }
}
