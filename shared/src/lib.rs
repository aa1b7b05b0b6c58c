pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod gateways;
pub mod notify;
pub mod state;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use auth::{AuthSession, CognitoIdentity, IdentityProvider};
pub use config::{AppConfig, ConfigError};
pub use context::{AppContext, AppServices};
pub use error::{AuthError, GatewayError};
pub use gateways::{BlobStorage, DocumentStore};
pub use notify::{Notifier, Toast, ToastLevel};
pub use state::AppState;

// ========== DOMAIN ==========
pub use fieldnote_atoms::reports::{Point, Report};
pub use fieldnote_atoms::users::Principal;
