use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Stored authorization material for one user of the remote store.
///
/// Created by the external authorization flow and only ever read by the
/// relay; refresh and expiry handling stay on the authorization side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl Credential {
    /// Builds a credential carrying only an access token.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            scope: None,
            token_type: None,
        }
    }

    /// Parses a serialized token payload.
    ///
    /// Strictly structural: a malformed payload is a [`StoreError::Corrupt`],
    /// never anything executable.
    pub fn from_json(payload: &str) -> Result<Self, StoreError> {
        serde_json::from_str(payload).map_err(|source| StoreError::Corrupt {
            context: "credential payload".into(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_payload() {
        let json = r#"{
            "access_token": "ya29.a0",
            "refresh_token": "1//r",
            "expires_at": "2026-01-01T00:00:00Z",
            "scope": "drive.file",
            "token_type": "Bearer"
        }"#;
        let cred = Credential::from_json(json).unwrap();
        assert_eq!(cred.access_token, "ya29.a0");
        assert_eq!(cred.refresh_token.as_deref(), Some("1//r"));
        assert_eq!(cred.token_type.as_deref(), Some("Bearer"));
    }

    #[test]
    fn optional_fields_default() {
        let cred = Credential::from_json(r#"{"access_token":"t"}"#).unwrap();
        assert_eq!(cred, Credential::bearer("t"));
    }

    #[test]
    fn malformed_payload_is_corrupt() {
        let result = Credential::from_json("__import__('os')");
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));

        let result = Credential::from_json(r#"{"access_token": 42}"#);
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }
}
