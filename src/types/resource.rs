use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::AmountValue;

/// A protocol amount: value in smallest units plus asset information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amount {
    pub value: AmountValue,
    pub asset_code: String,
    pub asset_scale: u8,
}

/// Body for creating an incoming payment on the receiver's resource server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingPaymentRequest {
    pub wallet_address: Url,
    pub incoming_amount: Amount,
}

/// An incoming payment resource. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingPayment {
    pub id: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_amount: Option<Amount>,
    #[serde(default)]
    pub completed: bool,
}

/// Body for creating a quote. `receiver` is the incoming payment URL the
/// quote prices delivery into.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub wallet_address: Url,
    pub receiver: Url,
    /// Transfer method; always `"ilp"` here.
    pub method: String,
}

/// A quote resource: a priced, time-bounded commitment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: Url,
    /// What the sender will be debited, spending ceiling for the
    /// outgoing-payment grant.
    pub debit_amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

/// Body for creating an outgoing payment against a finalized quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingPaymentRequest {
    pub wallet_address: Url,
    pub quote_id: Url,
}

/// An outgoing payment resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingPayment {
    pub id: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_amount: Option<Amount>,
    #[serde(default)]
    pub failed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outgoing_payment_request_uses_quote_id_field() {
        let request = OutgoingPaymentRequest {
            wallet_address: "https://wallet.example/alice".parse().unwrap(),
            quote_id: "https://backend.example/quotes/1".parse().unwrap(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "walletAddress": "https://wallet.example/alice",
                "quoteId": "https://backend.example/quotes/1"
            })
        );
    }

    #[test]
    fn parses_quote_with_debit_amount() {
        let quote: Quote = serde_json::from_value(serde_json::json!({
            "id": "https://backend.example/quotes/1",
            "debitAmount": { "value": "213", "assetCode": "USD", "assetScale": 2 },
            "receiveAmount": { "value": "200", "assetCode": "EUR", "assetScale": 2 }
        }))
        .unwrap();
        assert_eq!(quote.debit_amount.value, 213u32.into());
        assert_eq!(quote.receive_amount.unwrap().asset_code, "EUR");
        assert!(quote.expires_at.is_none());
    }
}
