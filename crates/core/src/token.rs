//! Token and user-profile models
//!
//! `TokenInfo` is the credential pair the backend issues on sign-in and on
//! refresh. It round-trips through the credential store byte-identically:
//! no field renames, no extra fields.

use serde::{Deserialize, Serialize};

/// Bearer credential pair issued by the backend
///
/// `expires_in` is advisory only. The client never runs a local expiry
/// clock; an expired access token is discovered reactively via a 401 and
/// recovered through the refresh endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Short-lived bearer credential attached to every API call
    #[serde(default)]
    pub access_token: String,
    /// Longer-lived credential used to mint a new access token
    #[serde(default)]
    pub refresh_token: String,
    /// Advisory lifetime in seconds, as reported by the backend
    #[serde(default)]
    pub expires_in: String,
    /// Opaque user reference echoed by the backend
    #[serde(default)]
    pub user: String,
}

impl TokenInfo {
    /// Parse a stored token blob, tolerating partial or empty JSON
    ///
    /// Returns `None` for a blob that is empty, whitespace, or not valid
    /// JSON. A valid object with missing fields parses with those fields
    /// empty; callers gate on [`has_access_token`](Self::has_access_token).
    pub fn from_blob(blob: &str) -> Option<Self> {
        if blob.trim().is_empty() {
            return None;
        }
        serde_json::from_str(blob).ok()
    }

    /// Serialize for the credential store
    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Whether an authenticated call can proceed with this token
    #[must_use]
    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Whether a 401 can be recovered through the refresh endpoint
    #[must_use]
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

/// User profile persisted alongside the token under the `userInfo` key
///
/// Field names are camelCase on disk to stay compatible with blobs written
/// by the mobile client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Identity-provider subject ID
    pub google_id: String,
    /// Backend user ID
    pub user_id: String,
    /// Display name
    pub name: String,
    /// Account email
    pub email: String,
    /// Avatar URL, when the provider supplied one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_blob_round_trip_is_byte_identical() {
        let token = TokenInfo {
            access_token: "A1".to_string(),
            refresh_token: "R1".to_string(),
            expires_in: "3600".to_string(),
            user: "u1".to_string(),
        };

        let blob = token.to_blob().unwrap();
        let back = TokenInfo::from_blob(&blob).unwrap();
        assert_eq!(back, token);
        assert_eq!(back.to_blob().unwrap(), blob);
    }

    #[test]
    fn empty_and_invalid_blobs_parse_to_none() {
        assert!(TokenInfo::from_blob("").is_none());
        assert!(TokenInfo::from_blob("   ").is_none());
        assert!(TokenInfo::from_blob("not json").is_none());
    }

    #[test]
    fn partial_blob_parses_with_empty_fields() {
        let token = TokenInfo::from_blob("{}").unwrap();
        assert!(!token.has_access_token());
        assert!(!token.has_refresh_token());

        let token = TokenInfo::from_blob(r#"{"access_token":"A1"}"#).unwrap();
        assert!(token.has_access_token());
        assert!(!token.has_refresh_token());
    }

    #[test]
    fn user_profile_is_camel_case_on_disk() {
        let profile = UserProfile {
            google_id: "g-1".to_string(),
            user_id: "42".to_string(),
            name: "Dana".to_string(),
            email: "dana@example.com".to_string(),
            picture: None,
        };

        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"googleId\""));
        assert!(json.contains("\"userId\""));
        assert!(!json.contains("picture"));
    }
}
