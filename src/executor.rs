//! Resource creation steps, gated by finalized grants.
//!
//! Each step requires a grant in state `Finalized` whose access type matches
//! the resource being created; a mismatch is a programming error surfaced as
//! `PreconditionFailed` before any call leaves the process.

use url::Url;

use crate::concepts::OpenPaymentsClient;
use crate::errors::FlowError;
use crate::types::{
    AccessType, Amount, AmountValue, Grant, GrantState, IncomingPayment, IncomingPaymentRequest,
    OutgoingPayment, OutgoingPaymentRequest, Quote, QuoteRequest, WalletAddress,
};

const ILP_METHOD: &str = "ilp";

fn require_finalized(grant: &Grant, expected: AccessType) -> Result<&str, FlowError> {
    if grant.access_type != expected || grant.state != GrantState::Finalized {
        return Err(FlowError::PreconditionFailed {
            expected,
            found: grant.access_type,
            state: grant.state,
        });
    }
    grant.token().ok_or(FlowError::PreconditionFailed {
        expected,
        found: grant.access_type,
        state: grant.state,
    })
}

/// Create an incoming payment on the receiver's resource server.
///
/// The amount is denominated in the receiver's asset; `AmountValue`
/// guarantees the wire string is a lossless unsigned integer.
pub async fn create_incoming_payment<C: OpenPaymentsClient>(
    client: &C,
    grant: &Grant,
    receiver: &WalletAddress,
    amount: AmountValue,
) -> Result<IncomingPayment, FlowError> {
    let token = require_finalized(grant, AccessType::IncomingPayment)?;
    let request = IncomingPaymentRequest {
        wallet_address: receiver.id.clone(),
        incoming_amount: Amount {
            value: amount,
            asset_code: receiver.asset_code.clone(),
            asset_scale: receiver.asset_scale,
        },
    };
    client
        .create_incoming_payment(&receiver.resource_server, token, &request)
        .await
        .map_err(|source| FlowError::ResourceCreation {
            kind: AccessType::IncomingPayment,
            source,
        })
}

/// Create a quote pricing delivery into `incoming_payment`.
///
/// The quote is created on the receiver's resource server with the sender's
/// wallet as the paying account; its debit amount becomes the spending
/// ceiling for the outgoing-payment grant.
pub async fn create_quote<C: OpenPaymentsClient>(
    client: &C,
    grant: &Grant,
    sender: &WalletAddress,
    receiver: &WalletAddress,
    incoming_payment: &Url,
) -> Result<Quote, FlowError> {
    let token = require_finalized(grant, AccessType::Quote)?;
    let request = QuoteRequest {
        wallet_address: sender.id.clone(),
        receiver: incoming_payment.clone(),
        method: ILP_METHOD.to_string(),
    };
    client
        .create_quote(&receiver.resource_server, token, &request)
        .await
        .map_err(|source| FlowError::ResourceCreation {
            kind: AccessType::Quote,
            source,
        })
}

/// Create the outgoing payment executing a finalized quote.
pub async fn create_outgoing_payment<C: OpenPaymentsClient>(
    client: &C,
    grant: &Grant,
    sender: &WalletAddress,
    quote_id: &Url,
) -> Result<OutgoingPayment, FlowError> {
    let token = require_finalized(grant, AccessType::OutgoingPayment)?;
    let request = OutgoingPaymentRequest {
        wallet_address: sender.id.clone(),
        quote_id: quote_id.clone(),
    };
    client
        .create_outgoing_payment(&sender.resource_server, token, &request)
        .await
        .map_err(|source| FlowError::ResourceCreation {
            kind: AccessType::OutgoingPayment,
            source,
        })
}
