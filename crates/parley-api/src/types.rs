//! Wire types for the parley HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An invitation code record as returned by `GET /api/codes`.
///
/// `is_valid` is computed server-side (`call_count < max_calls` and not yet
/// expired); clients never recompute it except to sub-classify an invalid
/// code for display (see [`crate::CodeStatus`]).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvitationCode {
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub max_calls: u32,
    pub call_count: u32,
    pub is_valid: bool,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Successful response from `POST /api/validate-code`.
///
/// Held in memory for the duration of one session attempt; the first name
/// personalizes the voice session later on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvitationData {
    pub valid: bool,
    pub code: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Response from `POST /token`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Response from `GET /api/signed-url`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignedUrlResponse {
    #[serde(rename = "signedUrl")]
    pub signed_url: String,
}

/// Response from `GET /api/getAgentId`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentIdResponse {
    #[serde(rename = "agentId")]
    pub agent_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invitation_code_deserializes_backend_shape() {
        let json = r#"{
            "code": "ABC123",
            "created_at": "2025-01-10T09:00:00Z",
            "expires_at": "2025-02-10T09:00:00Z",
            "max_calls": 5,
            "call_count": 2,
            "is_valid": true,
            "first_name": "Ada"
        }"#;
        let code: InvitationCode = serde_json::from_str(json).unwrap();
        assert_eq!(code.code, "ABC123");
        assert_eq!(code.max_calls, 5);
        assert_eq!(code.call_count, 2);
        assert!(code.is_valid);
        assert_eq!(code.first_name.as_deref(), Some("Ada"));
        assert_eq!(code.last_name, None);
    }

    #[test]
    fn test_invitation_data_name_fields_are_optional() {
        let data: InvitationData =
            serde_json::from_str(r#"{"valid": true, "code": "XYZ1"}"#).unwrap();
        assert!(data.valid);
        assert_eq!(data.first_name, None);
    }

    #[test]
    fn test_camel_case_wire_fields() {
        let signed: SignedUrlResponse =
            serde_json::from_str(r#"{"signedUrl": "wss://example/session?sig=abc"}"#).unwrap();
        assert_eq!(signed.signed_url, "wss://example/session?sig=abc");

        let agent: AgentIdResponse = serde_json::from_str(r#"{"agentId": "agent-7"}"#).unwrap();
        assert_eq!(agent.agent_id, "agent-7");
    }
}
