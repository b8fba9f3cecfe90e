use std::fmt::Display;

use bon::Builder;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::{Amount, AmountValue};

/// What the caller wants moved: sender, receiver, amount.
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Sender's wallet address URL.
    pub sender: Url,
    /// Receiver's wallet address URL.
    pub receiver: Url,
    /// Amount in the receiver's smallest asset unit.
    #[builder(into)]
    pub amount: AmountValue,
}

/// States of a payment flow, advanced strictly in order. `Failed` is
/// reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowState {
    Init,
    WalletsResolved,
    IncomingGrantFinalized,
    IncomingPaymentCreated,
    QuoteGrantFinalized,
    QuoteCreated,
    OutgoingGrantPending,
    OutgoingGrantFinalized,
    Completed,
    Failed,
}

impl Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FlowState::Init => "Init",
            FlowState::WalletsResolved => "WalletsResolved",
            FlowState::IncomingGrantFinalized => "IncomingGrantFinalized",
            FlowState::IncomingPaymentCreated => "IncomingPaymentCreated",
            FlowState::QuoteGrantFinalized => "QuoteGrantFinalized",
            FlowState::QuoteCreated => "QuoteCreated",
            FlowState::OutgoingGrantPending => "OutgoingGrantPending",
            FlowState::OutgoingGrantFinalized => "OutgoingGrantFinalized",
            FlowState::Completed => "Completed",
            FlowState::Failed => "Failed",
        };
        write!(f, "{name}")
    }
}

/// Aggregate record of one settlement attempt.
///
/// Holds store keys for the grants and resources created so far; the store
/// owns the canonical records. Never reused after reaching `Completed` or
/// `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentFlow {
    pub id: String,
    pub intent: PaymentIntent,
    pub state: FlowState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_grant_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_payment_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_grant_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing_grant_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing_payment_key: Option<String>,
    /// Failure reason once the flow terminates in `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl PaymentFlow {
    pub fn new(id: String, intent: PaymentIntent) -> Self {
        PaymentFlow {
            id,
            intent,
            state: FlowState::Init,
            incoming_grant_key: None,
            incoming_payment_key: None,
            quote_grant_key: None,
            quote_key: None,
            outgoing_grant_key: None,
            outgoing_payment_key: None,
            failure: None,
        }
    }
}

/// Successful settlement summary returned to the inbound caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResult {
    pub flow_id: String,
    pub incoming_payment: Url,
    pub quote: Url,
    pub outgoing_payment: Url,
    /// What the sender was committed to be debited.
    pub debit_amount: Amount,
}
