use std::fmt::Display;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::Amount;

/// Access types grantable by an Open Payments authorization server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessType {
    IncomingPayment,
    Quote,
    OutgoingPayment,
}

impl AccessType {
    /// The standardized wire name of the access type.
    pub fn wire_name(&self) -> &'static str {
        match self {
            AccessType::IncomingPayment => "incoming-payment",
            AccessType::Quote => "quote",
            AccessType::OutgoingPayment => "outgoing-payment",
        }
    }

    /// Ordered spellings to try against servers predating the standardized
    /// naming. Each is attempted at most once, in this order.
    pub fn compat_names(&self) -> &'static [&'static str] {
        match self {
            AccessType::IncomingPayment => &[
                "incoming_payment",
                "incoming-payment",
                "incoming-payments",
                "incoming_payments",
            ],
            AccessType::Quote => &["quote"],
            AccessType::OutgoingPayment => &["outgoing-payment"],
        }
    }
}

impl Display for AccessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

impl Serialize for AccessType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for AccessType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        for access_type in [
            AccessType::IncomingPayment,
            AccessType::Quote,
            AccessType::OutgoingPayment,
        ] {
            if access_type.compat_names().contains(&s.as_str()) {
                return Ok(access_type);
            }
        }
        Err(serde::de::Error::custom(format!(
            "unknown access type: {s}"
        )))
    }
}

/// Lifecycle state of a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantState {
    /// Requested, response not yet classified.
    Requested,
    /// Pending user approval; carries a continuation handle.
    Interactive,
    /// Authorized; carries an access token. Terminal.
    Finalized,
    /// Rejected or abandoned. Terminal.
    Failed,
    /// Access token lifetime elapsed before use.
    Expired,
}

impl Display for GrantState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GrantState::Requested => "Requested",
            GrantState::Interactive => "Interactive",
            GrantState::Finalized => "Finalized",
            GrantState::Failed => "Failed",
            GrantState::Expired => "Expired",
        };
        write!(f, "{name}")
    }
}

/// Access token issued with a finalized grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manage: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

/// Handle for re-checking a pending grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Continuation {
    pub uri: Url,
    pub access_token: String,
    /// Seconds the server asks clients to wait between continuation calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<u64>,
}

/// An authorization grant as tracked by the negotiator.
///
/// The access token is present exactly when the grant is `Finalized`; the
/// continuation handle only while `Interactive`. `Finalized` and `Failed`
/// are terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub access_type: AccessType,
    pub state: GrantState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<AccessToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation: Option<Continuation>,
    /// URL the user must visit to approve an interactive grant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interact_redirect: Option<Url>,
}

impl Grant {
    pub fn is_finalized(&self) -> bool {
        self.state == GrantState::Finalized
    }

    /// The access token value, present only on finalized grants.
    pub fn token(&self) -> Option<&str> {
        self.access_token.as_ref().map(|token| token.value.as_str())
    }
}

// ---------------------------------------------------------------------------
// GNAP wire structs
// ---------------------------------------------------------------------------

/// Body of a grant request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantRequest {
    pub access_token: AccessTokenRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interact: Option<InteractRequest>,
    /// Wallet address identifying the requesting client; filled in by the
    /// protocol client from its configuration when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<Url>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenRequest {
    pub access: Vec<AccessItem>,
}

/// One requested access entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessItem {
    /// Access type name on the wire; may be a compatibility spelling.
    #[serde(rename = "type")]
    pub access_type: String,
    pub actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<AccessLimits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Url>,
}

/// Resource limits declared on an access request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debit_amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_amount: Option<Amount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractRequest {
    /// Interaction modes the client can drive, e.g. `["redirect"]`.
    pub start: Vec<String>,
}

/// Response to a grant request or continuation call.
///
/// A response carrying `access_token` is finalized; one carrying only a
/// `continue` handle (and possibly an `interact.redirect` URL) is pending
/// user approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<AccessToken>,
    #[serde(
        rename = "continue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub continuation: Option<ContinueResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interact: Option<InteractResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinueResponse {
    pub access_token: TokenValue,
    pub uri: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenValue {
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<String>,
}
