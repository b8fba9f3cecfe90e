//! Error types for grant negotiation and flow orchestration.

use url::Url;

use crate::types::{AccessType, FlowState, GrantState};

/// Transport-level failure reported by a protocol client implementation.
///
/// Diagnostic detail (endpoint, HTTP status, response body) is retained for
/// observability; correctness never depends on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("HTTP error calling {endpoint}: {detail}")]
    Http { endpoint: String, detail: String },
    /// The server answered with a non-2xx status.
    #[error("{endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// The response body did not match the expected shape.
    #[error("failed to deserialize response from {endpoint}: {detail}")]
    Deserialization { endpoint: String, detail: String },
    /// A request URL could not be built.
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// HTTP status of the response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a continuation poll may try again after this error.
    ///
    /// A 4xx is the server rejecting the request outright; transport
    /// failures and 5xx responses may clear up on a later attempt.
    pub fn is_retriable(&self) -> bool {
        !matches!(self, ClientError::Api { status, .. } if (400..500).contains(status))
    }
}

/// Failure of the flow store collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("flow store error: {0}")]
pub struct StoreError(pub String);

/// Everything that can terminate a payment flow.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// A wallet address URL did not resolve.
    #[error("failed to resolve wallet address {url}: {source}")]
    WalletResolution {
        url: Url,
        #[source]
        source: ClientError,
    },

    /// The authorization server declined the grant; not retriable.
    #[error("{access_type} grant rejected: {detail}")]
    GrantRejected {
        access_type: AccessType,
        detail: String,
    },

    /// Continuation polling exhausted its attempt budget.
    #[error("{access_type} grant not finalized after {attempts} continuation attempts")]
    GrantTimeout {
        access_type: AccessType,
        attempts: u32,
        /// Server diagnostic from the last failed attempt, when one failed.
        detail: Option<String>,
    },

    /// The continuation poll was cancelled by the caller before the grant
    /// finalized. Caller-initiated, not a protocol condition.
    #[error("{access_type} grant continuation cancelled after {attempts} attempts")]
    Cancelled {
        access_type: AccessType,
        attempts: u32,
    },

    /// The grant needs the user to approve out-of-band. Expected steady
    /// state, not a bug: carries what the caller needs to resume.
    #[error("{access_type} grant requires manual interaction (redirect: {redirect:?})")]
    RequiresManualInteraction {
        access_type: AccessType,
        /// Where the user must go to approve the grant.
        redirect: Option<Url>,
        /// Continuation endpoint to re-check after approval, when issued.
        continue_uri: Option<Url>,
    },

    /// A resource server refused to create the payment resource.
    #[error("failed to create {kind}: {source}")]
    ResourceCreation {
        kind: AccessType,
        #[source]
        source: ClientError,
    },

    /// A resource step was attempted against the wrong grant. Programming
    /// error, raised before any adapter call.
    #[error("grant precondition failed: need finalized {expected} grant, got {found} in state {state}")]
    PreconditionFailed {
        expected: AccessType,
        found: AccessType,
        state: GrantState,
    },

    /// Malformed or out-of-range payment amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// No grant record stored under the given key.
    #[error("no grant stored under key {0}")]
    UnknownGrant(String),

    /// The flow store collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FlowError {
    /// The interaction redirect URL, for failures that carry one.
    pub fn redirect_url(&self) -> Option<&Url> {
        match self {
            FlowError::RequiresManualInteraction { redirect, .. } => redirect.as_ref(),
            _ => None,
        }
    }
}

/// Terminal failure of a payment flow: the reason plus the furthest state
/// the flow reached before failing.
#[derive(Debug, thiserror::Error)]
#[error("payment flow {flow_id} failed at {state}: {error}")]
pub struct FlowFailure {
    pub flow_id: String,
    /// Furthest state reached; already-created resources up to this state
    /// remain in the store and are not rolled back.
    pub state: FlowState,
    #[source]
    pub error: FlowError,
}
