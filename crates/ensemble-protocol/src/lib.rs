#![forbid(unsafe_code)]

mod views;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub use views::{
    ApplicationView, ApplyOutcomeView, GroupScopeView, GroupView, InvitationView,
    InviteOutcomeView, MembershipView, RoleView,
};

/// Current wire format version.
pub const PROTOCOL_VERSION: u16 = 1;
/// Maximum accepted request payload bytes.
pub const MAX_PAYLOAD_BYTES: usize = 16 * 1024;

/// Body of every rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Role create/edit payload. Permissions travel as snake_case names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RolePayload {
    pub name: String,
    #[serde(default)]
    pub intro: String,
    pub level: i32,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Partial update of a group's join policy. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupPolicyPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_apply_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_check_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_members: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_role_id: Option<String>,
}

/// Parse an incoming payload at the network boundary.
///
/// # Errors
/// Returns [`ProtocolError`] if the payload exceeds limits or does not match
/// the expected shape.
pub fn parse_payload<T: DeserializeOwned>(input: &[u8]) -> Result<T, ProtocolError> {
    if input.len() > MAX_PAYLOAD_BYTES {
        return Err(ProtocolError::OversizedPayload {
            max: MAX_PAYLOAD_BYTES,
            actual: input.len(),
        });
    }

    Ok(serde_json::from_slice(input)?)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("payload exceeds max size: max={max} bytes actual={actual} bytes")]
    OversizedPayload { max: usize, actual: usize },
    #[error("invalid json payload")]
    InvalidJson,
}

impl From<serde_json::Error> for ProtocolError {
    fn from(_: serde_json::Error) -> Self {
        Self::InvalidJson
    }
}
