use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    Info,
    Error,
}

/// Transient user-facing notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

/// Sending half of the toast channel. Cheap to clone; sends never block.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Toast>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Toast>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn info(&self, message: impl Into<String>) {
        self.send(ToastLevel::Info, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(ToastLevel::Error, message.into());
    }

    fn send(&self, level: ToastLevel, message: String) {
        // Nobody listening means no UI to show it on
        let _ = self.tx.send(Toast { level, message });
    }
}
