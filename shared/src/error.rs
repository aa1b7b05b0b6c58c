/// Sign-in and sign-out failures. Always recoverable; shown inline on the sign-in screen.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Incorrect email or password")]
    InvalidCredentials,
    #[error("Sign-in needs an extra step ({0}) that this client does not support")]
    ChallengeRequired(String),
    #[error("Identity provider error: {0}")]
    Provider(String),
}

/// Document store and blob storage failures. Service messages are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("document store: {0}")]
    Store(String),
    #[error("storage: {0}")]
    Storage(String),
}
