//! Authentication endpoints
//!
//! The two entry points here are the only unauthenticated routes the
//! backend exposes. A successful sign-in persists the token and the user
//! profile, which is what arms the rest of the client.

use crate::client::NutrilogClient;
use crate::error::ApiResult;
use nutrilog_core::credentials::{TOKEN_KEY, USER_INFO_KEY};
use nutrilog_core::token::{TokenInfo, UserProfile};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Mobile platform reported to the sign-in endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// iOS client
    Ios,
    /// Android client
    Android,
    /// Anything else (CLI, tests)
    Other,
}

/// Response of `POST /auth/mobile/google-auth`
///
/// `user_id` and `expires_in` arrive as JSON numbers on this route (unlike
/// the refresh response, which carries strings); they are stringified when
/// the session is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleAuthResponse {
    /// Identity-provider subject ID
    pub id: String,
    /// Backend user ID
    pub user_id: i64,
    /// Display name
    pub name: String,
    /// Account email
    pub email: String,
    /// Avatar URL, when the provider supplied one
    pub picture: Option<String>,
    /// Issued access token
    pub access_token: String,
    /// Issued refresh token
    pub refresh_token: String,
    /// Advisory token lifetime in seconds
    pub expires_in: i64,
    /// Opaque user reference echoed on token refresh
    pub user: String,
}

impl GoogleAuthResponse {
    /// The credential pair to persist under the `token` key
    #[must_use]
    pub fn token_info(&self) -> TokenInfo {
        TokenInfo {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_in: self.expires_in.to_string(),
            user: self.user.clone(),
        }
    }

    /// The profile to persist under the `userInfo` key
    #[must_use]
    pub fn user_profile(&self) -> UserProfile {
        UserProfile {
            google_id: self.id.clone(),
            user_id: self.user_id.to_string(),
            name: self.name.clone(),
            email: self.email.clone(),
            picture: self.picture.clone(),
        }
    }
}

/// Authentication API interface
#[derive(Clone)]
pub struct AuthApi {
    client: NutrilogClient,
}

impl AuthApi {
    /// Create a new auth API interface
    pub(crate) fn new(client: NutrilogClient) -> Self {
        Self { client }
    }

    /// Exchange a Google ID token for a Nutrilog session
    ///
    /// POST /auth/mobile/google-auth (unauthenticated)
    ///
    /// On success the issued token and profile are persisted to the
    /// credential store, unblocking any calls parked in the token wait
    /// loop.
    pub async fn google_sign_in(
        &self,
        id_token: &str,
        platform: Platform,
    ) -> ApiResult<GoogleAuthResponse> {
        let response: GoogleAuthResponse = self
            .client
            .post_json_public(
                "/auth/mobile/google-auth",
                &serde_json::json!({ "id_token": id_token, "platform": platform }),
            )
            .await?;

        let store = self.client.store();
        store
            .set(TOKEN_KEY, &response.token_info().to_blob()?)
            .await?;
        store
            .set(USER_INFO_KEY, &serde_json::to_string(&response.user_profile())?)
            .await?;
        info!(user_id = %response.user_id, "signed in, session persisted");

        Ok(response)
    }

    /// Mint a new token pair from a refresh token
    ///
    /// POST /auth/refresh_token (unauthenticated)
    ///
    /// The client calls this itself on a 401; it is exposed for flows that
    /// manage token persistence on their own.
    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<TokenInfo> {
        self.client.refresh_access_token(refresh_token).await
    }

    /// Clear the stored session and notify the logout sink
    pub async fn sign_out(&self) {
        self.client.force_logout().await;
    }

    /// Check an invite code during onboarding
    ///
    /// POST /auth/validate_invite_code (authenticated)
    pub async fn validate_invite_code(
        &self,
        google_id: &str,
        invite_code: &str,
    ) -> ApiResult<bool> {
        let result: InviteCodeValidation = self
            .client
            .post_json(
                "/auth/validate_invite_code",
                &serde_json::json!({ "invite_code": invite_code, "google_id": google_id }),
            )
            .await?;
        Ok(result.is_valid)
    }

    /// Mint an invite code for the current user
    ///
    /// POST /auth/generate_invite_code (authenticated)
    pub async fn generate_invite_code(&self) -> ApiResult<String> {
        let result: InviteCodeResponse = self
            .client
            .post_json("/auth/generate_invite_code", &serde_json::json!({}))
            .await?;
        Ok(result.invite_code)
    }
}

/// Response of `POST /auth/validate_invite_code`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InviteCodeValidation {
    #[serde(default)]
    is_valid: bool,
}

/// Response of `POST /auth/generate_invite_code`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InviteCodeResponse {
    invite_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Platform::Ios).unwrap(), "\"ios\"");
        assert_eq!(
            serde_json::to_string(&Platform::Android).unwrap(),
            "\"android\""
        );
    }

    #[test]
    fn auth_response_splits_into_token_and_profile() {
        // user_id and expires_in are numbers on the wire for this route
        let json = r#"{
            "id": "g-123",
            "user_id": 42,
            "name": "Dana",
            "email": "dana@example.com",
            "picture": null,
            "access_token": "A1",
            "refresh_token": "R1",
            "expires_in": 3600,
            "user": "u1"
        }"#;

        let response: GoogleAuthResponse = serde_json::from_str(json).unwrap();

        let token = response.token_info();
        assert_eq!(token.access_token, "A1");
        assert_eq!(token.refresh_token, "R1");
        assert_eq!(token.expires_in, "3600");
        assert!(token.has_access_token());

        let profile = response.user_profile();
        assert_eq!(profile.google_id, "g-123");
        assert_eq!(profile.user_id, "42");
        assert!(profile.picture.is_none());
    }
}
