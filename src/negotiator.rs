//! Grant negotiation against Open Payments authorization servers.
//!
//! A grant request is classified from its response: finalized (token issued
//! synchronously), interactive (continuation handle issued, user approval
//! pending), or manual-only (redirect URL without a handle — negotiation
//! cannot proceed unattended). Interactive grants are driven to finalization
//! by a bounded, cancellable continuation poll.

use std::future::Future;
use std::time::Duration;

use url::Url;

use crate::concepts::OpenPaymentsClient;
use crate::errors::{ClientError, FlowError};
use crate::types::{
    AccessItem, AccessLimits, AccessTokenRequest, AccessType, Continuation, Grant, GrantRequest,
    GrantResponse, GrantState, InteractRequest,
};

/// Constraints attached to a grant request.
#[derive(bon::Builder, Debug, Clone, Default)]
pub struct GrantConstraints {
    /// Actions requested on the resource type.
    #[builder(default = vec!["create".to_string()])]
    pub actions: Vec<String>,
    /// Resource limits, e.g. a debit amount ceiling.
    pub limits: Option<AccessLimits>,
    /// Wallet address the access is scoped to.
    pub identifier: Option<Url>,
    /// Request interactive (redirect) authorization start.
    #[builder(default)]
    pub interactive: bool,
}

impl GrantConstraints {
    /// Constraints for a plain `create` grant with no limits.
    pub fn create() -> Self {
        GrantConstraints::builder().build()
    }

    fn to_request(&self, type_name: &str) -> GrantRequest {
        GrantRequest {
            access_token: AccessTokenRequest {
                access: vec![AccessItem {
                    access_type: type_name.to_string(),
                    actions: if self.actions.is_empty() {
                        vec!["create".to_string()]
                    } else {
                        self.actions.clone()
                    },
                    limits: self.limits.clone(),
                    identifier: self.identifier.clone(),
                }],
            },
            interact: self.interactive.then(|| InteractRequest {
                start: vec!["redirect".to_string()],
            }),
            client: None,
        }
    }
}

/// Continuation poll schedule. Defaults to 12 attempts at 5 second
/// intervals, roughly a one minute ceiling.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            max_attempts: 12,
            interval: Duration::from_secs(5),
        }
    }
}

/// Classify a grant response into a [`Grant`].
///
/// A redirect URL with no continuation handle means negotiation cannot
/// proceed unattended; that surfaces as `RequiresManualInteraction` rather
/// than a grant to poll.
pub fn classify_grant(
    access_type: AccessType,
    response: GrantResponse,
) -> Result<Grant, FlowError> {
    if let Some(token) = response.access_token {
        return Ok(Grant {
            access_type,
            state: GrantState::Finalized,
            access_token: Some(token),
            continuation: None,
            interact_redirect: None,
        });
    }

    let redirect = response.interact.and_then(|interact| interact.redirect);
    match response.continuation {
        Some(cont) => Ok(Grant {
            access_type,
            state: GrantState::Interactive,
            access_token: None,
            continuation: Some(Continuation {
                uri: cont.uri,
                access_token: cont.access_token.value,
                wait: cont.wait,
            }),
            interact_redirect: redirect,
        }),
        None if redirect.is_some() => Err(FlowError::RequiresManualInteraction {
            access_type,
            redirect,
            continue_uri: None,
        }),
        None => Err(FlowError::GrantRejected {
            access_type,
            detail: "grant response carried neither an access token nor a continuation handle"
                .to_string(),
        }),
    }
}

async fn request_named<C: OpenPaymentsClient>(
    client: &C,
    auth_server: &Url,
    type_name: &str,
    constraints: &GrantConstraints,
) -> Result<GrantResponse, ClientError> {
    let request = constraints.to_request(type_name);
    client.request_grant(auth_server, &request).await
}

/// Request a grant for one access type using its standardized name.
pub async fn request_grant<C: OpenPaymentsClient>(
    client: &C,
    auth_server: &Url,
    access_type: AccessType,
    constraints: &GrantConstraints,
) -> Result<Grant, FlowError> {
    let response = request_named(client, auth_server, access_type.wire_name(), constraints)
        .await
        .map_err(|err| FlowError::GrantRejected {
            access_type,
            detail: err.to_string(),
        })?;
    classify_grant(access_type, response)
}

/// Request a grant, falling back through the access type's compatibility
/// spellings.
///
/// Servers predating the standardized naming reject the canonical name;
/// each spelling in [`AccessType::compat_names`] is tried at most once, in
/// order, and the first accepted response wins. Exhausting the list
/// surfaces the last rejection.
pub async fn request_grant_with_fallback<C: OpenPaymentsClient>(
    client: &C,
    auth_server: &Url,
    access_type: AccessType,
    constraints: &GrantConstraints,
) -> Result<Grant, FlowError> {
    let mut last_err: Option<ClientError> = None;
    for type_name in access_type.compat_names() {
        #[cfg(feature = "tracing")]
        tracing::debug!("requesting {access_type} grant as '{type_name}'");

        match request_named(client, auth_server, type_name, constraints).await {
            Ok(response) => return classify_grant(access_type, response),
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    status = ?err.status(),
                    "grant request for type '{type_name}' failed: {err}"
                );
                last_err = Some(err);
            }
        }
    }

    Err(FlowError::GrantRejected {
        access_type,
        detail: last_err
            .map(|err| err.to_string())
            .unwrap_or_else(|| "no access type spelling accepted".to_string()),
    })
}

async fn continue_attempt<C: OpenPaymentsClient>(
    client: &C,
    access_type: AccessType,
    cont: &Continuation,
    redirect: Option<&Url>,
) -> Result<Grant, ClientError> {
    let response = client.continue_grant(&cont.uri, &cont.access_token).await?;

    if let Some(token) = response.access_token {
        return Ok(Grant {
            access_type,
            state: GrantState::Finalized,
            access_token: Some(token),
            continuation: None,
            interact_redirect: None,
        });
    }

    // Still pending. The server may rotate the continuation handle; keep
    // the old one when the response carries none.
    let refreshed = response
        .continuation
        .map(|next| Continuation {
            uri: next.uri,
            access_token: next.access_token.value,
            wait: next.wait,
        })
        .unwrap_or_else(|| cont.clone());
    let redirect = response
        .interact
        .and_then(|interact| interact.redirect)
        .or_else(|| redirect.cloned());

    Ok(Grant {
        access_type,
        state: GrantState::Interactive,
        access_token: None,
        continuation: Some(refreshed),
        interact_redirect: redirect,
    })
}

/// One continuation attempt against an interactive grant.
///
/// Success with a token finalizes the grant; success without one leaves it
/// interactive (with a refreshed handle if the server rotated it). On error
/// the grant is untouched and the caller decides whether to retry.
pub async fn continue_grant<C: OpenPaymentsClient>(
    client: &C,
    grant: &Grant,
) -> Result<Grant, FlowError> {
    if grant.is_finalized() {
        return Ok(grant.clone());
    }
    let access_type = grant.access_type;
    let Some(cont) = &grant.continuation else {
        return Err(FlowError::RequiresManualInteraction {
            access_type,
            redirect: grant.interact_redirect.clone(),
            continue_uri: None,
        });
    };
    continue_attempt(client, access_type, cont, grant.interact_redirect.as_ref())
        .await
        .map_err(|err| FlowError::GrantRejected {
            access_type,
            detail: err.to_string(),
        })
}

/// Drive an interactive grant to finalization with a bounded poll.
///
/// Performs at most `config.max_attempts` continuation calls with
/// `config.interval` between them. Retriable failures (transport errors,
/// 5xx) are logged and counted against the budget; a 4xx rejection aborts
/// immediately as `GrantRejected`. Exhausting the budget yields
/// `GrantTimeout`. The wait is cancellable: when `cancel` resolves the poll
/// stops without waiting out the remaining interval.
pub async fn poll_until_finalized<C: OpenPaymentsClient>(
    client: &C,
    grant: Grant,
    config: &PollConfig,
    cancel: impl Future<Output = ()>,
) -> Result<Grant, FlowError> {
    if grant.is_finalized() {
        return Ok(grant);
    }
    let access_type = grant.access_type;
    if grant.continuation.is_none() {
        return Err(FlowError::RequiresManualInteraction {
            access_type,
            redirect: grant.interact_redirect,
            continue_uri: None,
        });
    }

    tokio::pin!(cancel);
    let mut current = grant;
    let mut attempts = 0u32;
    let mut last_err: Option<String> = None;

    while attempts < config.max_attempts {
        if attempts > 0 {
            tokio::select! {
                _ = &mut cancel => {
                    return Err(FlowError::Cancelled { access_type, attempts });
                }
                _ = tokio::time::sleep(config.interval) => {}
            }
        }
        attempts += 1;

        let Some(cont) = current.continuation.clone() else {
            return Err(FlowError::RequiresManualInteraction {
                access_type,
                redirect: current.interact_redirect,
                continue_uri: None,
            });
        };
        match continue_attempt(client, access_type, &cont, current.interact_redirect.as_ref())
            .await
        {
            Ok(next) if next.is_finalized() => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    attempts,
                    "{access_type} grant finalized via continuation"
                );
                return Ok(next);
            }
            Ok(next) => current = next,
            Err(err) if err.is_retriable() => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    attempt = attempts,
                    max_attempts = config.max_attempts,
                    status = ?err.status(),
                    "grant continuation attempt failed: {err}"
                );
                last_err = Some(err.to_string());
            }
            Err(err) => {
                return Err(FlowError::GrantRejected {
                    access_type,
                    detail: err.to_string(),
                });
            }
        }
    }

    Err(FlowError::GrantTimeout {
        access_type,
        attempts,
        detail: last_err,
    })
}
