use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::operation::initiate_auth::InitiateAuthError;
use aws_sdk_cognitoidentityprovider::types::AuthFlowType;
use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::AuthError;
use fieldnote_atoms::users::Principal;

type HmacSha256 = Hmac<Sha256>;

/// Signed-in principal plus the tokens of this sign-in
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub principal: Principal,
    pub access_token: String,
    /// Revoked on sign-out; absent when the app client issues none
    pub refresh_token: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;
    /// Ends this session only. Other devices of the same user stay signed in.
    async fn sign_out(&self, session: &AuthSession) -> Result<(), AuthError>;
}

/// Cognito user pool, USER_PASSWORD_AUTH flow
pub struct CognitoIdentity {
    client: CognitoClient,
    client_id: String,
    client_secret: Option<String>,
}

impl CognitoIdentity {
    pub fn new(client: CognitoClient, client_id: String, client_secret: Option<String>) -> Self {
        Self {
            client,
            client_id,
            client_secret,
        }
    }
}

#[async_trait]
impl IdentityProvider for CognitoIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let mut request = self
            .client
            .initiate_auth()
            .auth_flow(AuthFlowType::UserPasswordAuth)
            .client_id(&self.client_id)
            .auth_parameters("USERNAME", email)
            .auth_parameters("PASSWORD", password);

        if let Some(secret) = &self.client_secret {
            request = request.auth_parameters("SECRET_HASH", secret_hash(email, &self.client_id, secret)?);
        }

        let output = request.send().await.map_err(|e| match e.into_service_error() {
            InitiateAuthError::NotAuthorizedException(_) | InitiateAuthError::UserNotFoundException(_) => {
                AuthError::InvalidCredentials
            }
            other => AuthError::Provider(other.to_string()),
        })?;

        let refresh_token = output
            .authentication_result()
            .and_then(|r| r.refresh_token())
            .map(|t| t.to_string());
        let Some(access_token) = output
            .authentication_result()
            .and_then(|r| r.access_token())
            .map(|t| t.to_string())
        else {
            let challenge = output
                .challenge_name()
                .map(|c| c.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            return Err(AuthError::ChallengeRequired(challenge));
        };

        let user = self
            .client
            .get_user()
            .access_token(&access_token)
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("Cognito get_user error: {}", e)))?;

        let attribute = |name: &str| {
            user.user_attributes()
                .iter()
                .find(|a| a.name() == name)
                .and_then(|a| a.value())
                .map(|v| v.to_string())
        };

        let principal = Principal {
            user_id: attribute("sub").unwrap_or_else(|| user.username().to_string()),
            email: attribute("email").unwrap_or_else(|| email.to_string()),
        };

        tracing::info!("🔑 Signed in {}", principal.email);
        Ok(AuthSession {
            principal,
            access_token,
            refresh_token,
        })
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), AuthError> {
        let Some(refresh_token) = &session.refresh_token else {
            tracing::debug!("No refresh token for {}, nothing to revoke", session.principal.email);
            return Ok(());
        };

        // RevokeToken invalidates this refresh token and the access tokens minted from it
        self.client
            .revoke_token()
            .token(refresh_token)
            .client_id(&self.client_id)
            .set_client_secret(self.client_secret.clone())
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("Cognito revoke_token error: {}", e)))?;

        tracing::info!("Revoked session of {}", session.principal.email);
        Ok(())
    }
}

/// Cognito SECRET_HASH: base64(HMAC-SHA256(client_secret, username + client_id))
pub fn secret_hash(username: &str, client_id: &str, client_secret: &str) -> Result<String, AuthError> {
    let mut mac = HmacSha256::new_from_slice(client_secret.as_bytes())
        .map_err(|e| AuthError::Provider(format!("Invalid client secret: {}", e)))?;
    mac.update(username.as_bytes());
    mac.update(client_id.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
