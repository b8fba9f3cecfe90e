//! End-to-end payment flow scenarios against a scripted protocol client.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use url::Url;

use openpay_kit::{
    concepts::OpenPaymentsClient,
    errors::{ClientError, FlowError},
    negotiator::PollConfig,
    orchestrator::PaymentOrchestrator,
    store::{FlowStore, InMemoryFlowStore, keys},
    types::{
        FlowState, GrantRequest, GrantResponse, GrantState, IncomingPayment,
        IncomingPaymentRequest, OutgoingPayment, OutgoingPaymentRequest, PaymentIntent, Quote,
        QuoteRequest, WalletAddress,
    },
};

const INCOMING_TOKEN: &str = "in-tok";
const QUOTE_TOKEN: &str = "q-tok";
const OUTGOING_TOKEN: &str = "out-tok";

#[derive(Clone, Copy)]
enum OutgoingGrantMode {
    /// Interactive grant with a continuation handle and redirect URL.
    Interactive,
    /// Redirect URL without a continuation handle.
    RedirectOnly,
}

/// Plays both wallets' servers for one scripted flow.
struct MockClient {
    sender: WalletAddress,
    receiver: WalletAddress,
    outgoing_mode: OutgoingGrantMode,
    reject_quote_grant: bool,
    /// Continuation call number on which the outgoing grant finalizes;
    /// zero means never.
    finalize_on_attempt: u32,
    continue_calls: AtomicU32,
}

fn wallet(id: &str, auth: &str, resources: &str) -> WalletAddress {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "assetCode": "USD",
        "assetScale": 2,
        "authServer": auth,
        "resourceServer": resources,
    }))
    .unwrap()
}

impl MockClient {
    fn new(finalize_on_attempt: u32) -> Self {
        MockClient {
            sender: wallet(
                "https://wallet.example/alice",
                "https://auth.example/alice/",
                "https://backend.example/alice/",
            ),
            receiver: wallet(
                "https://wallet.example/bob",
                "https://auth.example/bob/",
                "https://backend.example/bob/",
            ),
            outgoing_mode: OutgoingGrantMode::Interactive,
            reject_quote_grant: false,
            finalize_on_attempt,
            continue_calls: AtomicU32::new(0),
        }
    }

    fn finalized(token: &str) -> GrantResponse {
        serde_json::from_value(serde_json::json!({
            "access_token": { "value": token }
        }))
        .unwrap()
    }

    fn pending() -> GrantResponse {
        serde_json::from_value(serde_json::json!({
            "continue": {
                "access_token": { "value": "cont-token" },
                "uri": "https://auth.example/alice/continue/1"
            },
            "interact": { "redirect": "https://auth.example/alice/interact/1" }
        }))
        .unwrap()
    }

    fn intent(&self) -> PaymentIntent {
        PaymentIntent::builder()
            .sender(self.sender.id.clone())
            .receiver(self.receiver.id.clone())
            .amount(100u64)
            .build()
    }
}

impl OpenPaymentsClient for MockClient {
    async fn resolve_wallet_address(&self, url: &Url) -> Result<WalletAddress, ClientError> {
        if *url == self.sender.id {
            Ok(self.sender.clone())
        } else if *url == self.receiver.id {
            Ok(self.receiver.clone())
        } else {
            Err(ClientError::Api {
                endpoint: url.to_string(),
                status: 404,
                body: "no such wallet".to_string(),
            })
        }
    }

    async fn request_grant(
        &self,
        _auth_server: &Url,
        request: &GrantRequest,
    ) -> Result<GrantResponse, ClientError> {
        let type_name = request.access_token.access[0].access_type.as_str();
        match type_name {
            name if name.starts_with("incoming") => Ok(Self::finalized(INCOMING_TOKEN)),
            "quote" => {
                if self.reject_quote_grant {
                    Err(ClientError::Api {
                        endpoint: "grant".to_string(),
                        status: 403,
                        body: "quote access denied".to_string(),
                    })
                } else {
                    Ok(Self::finalized(QUOTE_TOKEN))
                }
            }
            "outgoing-payment" => match self.outgoing_mode {
                OutgoingGrantMode::Interactive => Ok(Self::pending()),
                OutgoingGrantMode::RedirectOnly => Ok(serde_json::from_value(
                    serde_json::json!({
                        "interact": { "redirect": "https://auth.example/alice/interact/manual" }
                    }),
                )
                .unwrap()),
            },
            other => panic!("unexpected access type requested: {other}"),
        }
    }

    async fn continue_grant(
        &self,
        _continue_uri: &Url,
        _continue_token: &str,
    ) -> Result<GrantResponse, ClientError> {
        let call = self.continue_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.finalize_on_attempt != 0 && call >= self.finalize_on_attempt {
            Ok(Self::finalized(OUTGOING_TOKEN))
        } else {
            Ok(Self::pending())
        }
    }

    async fn create_incoming_payment(
        &self,
        resource_server: &Url,
        access_token: &str,
        request: &IncomingPaymentRequest,
    ) -> Result<IncomingPayment, ClientError> {
        assert_eq!(*resource_server, self.receiver.resource_server);
        assert_eq!(access_token, INCOMING_TOKEN);
        assert_eq!(request.wallet_address, self.receiver.id);
        assert_eq!(request.incoming_amount.value, 100u64.into());
        Ok(serde_json::from_value(serde_json::json!({
            "id": "https://backend.example/bob/incoming-payments/ip1",
            "incomingAmount": { "value": "100", "assetCode": "USD", "assetScale": 2 }
        }))
        .unwrap())
    }

    async fn create_quote(
        &self,
        resource_server: &Url,
        access_token: &str,
        request: &QuoteRequest,
    ) -> Result<Quote, ClientError> {
        assert_eq!(*resource_server, self.receiver.resource_server);
        assert_eq!(access_token, QUOTE_TOKEN);
        assert_eq!(request.wallet_address, self.sender.id);
        assert_eq!(
            request.receiver.as_str(),
            "https://backend.example/bob/incoming-payments/ip1"
        );
        assert_eq!(request.method, "ilp");
        Ok(serde_json::from_value(serde_json::json!({
            "id": "https://backend.example/bob/quotes/qt1",
            "debitAmount": { "value": "102", "assetCode": "USD", "assetScale": 2 },
            "receiveAmount": { "value": "100", "assetCode": "USD", "assetScale": 2 }
        }))
        .unwrap())
    }

    async fn create_outgoing_payment(
        &self,
        resource_server: &Url,
        access_token: &str,
        request: &OutgoingPaymentRequest,
    ) -> Result<OutgoingPayment, ClientError> {
        assert_eq!(*resource_server, self.sender.resource_server);
        assert_eq!(access_token, OUTGOING_TOKEN);
        assert_eq!(
            request.quote_id.as_str(),
            "https://backend.example/bob/quotes/qt1"
        );
        Ok(serde_json::from_value(serde_json::json!({
            "id": "https://backend.example/alice/outgoing-payments/out1",
            "sentAmount": { "value": "102", "assetCode": "USD", "assetScale": 2 }
        }))
        .unwrap())
    }
}

fn fast_poll(max_attempts: u32) -> PollConfig {
    PollConfig {
        max_attempts,
        interval: Duration::ZERO,
    }
}

fn orchestrator(client: MockClient) -> PaymentOrchestrator<MockClient, InMemoryFlowStore> {
    PaymentOrchestrator::new(client, Arc::new(InMemoryFlowStore::new())).with_poll_config(fast_poll(3))
}

async fn count(store: &InMemoryFlowStore, prefix: &str) -> usize {
    store.list(prefix).await.unwrap().len()
}

#[tokio::test]
async fn settles_end_to_end_through_an_interactive_outgoing_grant() {
    let client = MockClient::new(2);
    let intent = client.intent();
    let orchestrator = orchestrator(client);

    let settlement = orchestrator.run(intent).await.unwrap();
    assert_eq!(
        settlement.outgoing_payment.as_str(),
        "https://backend.example/alice/outgoing-payments/out1"
    );
    assert_eq!(settlement.debit_amount.value, 102u64.into());

    let store = orchestrator.store();
    assert_eq!(count(store, keys::GRANT_PREFIX).await, 3);
    assert_eq!(count(store, keys::INCOMING_PAYMENT_PREFIX).await, 1);
    assert_eq!(count(store, keys::QUOTE_PREFIX).await, 1);
    assert_eq!(count(store, keys::OUTGOING_PAYMENT_PREFIX).await, 1);

    let flow = orchestrator.flow(&settlement.flow_id).await.unwrap().unwrap();
    assert_eq!(flow.state, FlowState::Completed);
    assert!(flow.failure.is_none());
    assert!(flow.outgoing_payment_key.is_some());
}

#[tokio::test]
async fn outgoing_grant_timeout_keeps_partial_progress() {
    let client = MockClient::new(0);
    let intent = client.intent();
    let orchestrator = orchestrator(client);

    let failure = orchestrator.run(intent).await.unwrap_err();
    assert_eq!(failure.state, FlowState::OutgoingGrantPending);
    assert!(matches!(
        failure.error,
        FlowError::GrantTimeout { attempts: 3, .. }
    ));

    // The incoming payment and quote survive the failed settlement.
    let store = orchestrator.store();
    assert_eq!(count(store, keys::INCOMING_PAYMENT_PREFIX).await, 1);
    assert_eq!(count(store, keys::QUOTE_PREFIX).await, 1);
    assert_eq!(count(store, keys::OUTGOING_PAYMENT_PREFIX).await, 0);

    let flow = orchestrator.flow(&failure.flow_id).await.unwrap().unwrap();
    assert_eq!(flow.state, FlowState::Failed);
    assert!(flow.failure.is_some());
    assert!(flow.outgoing_grant_key.is_some());
}

#[tokio::test]
async fn redirect_only_outgoing_grant_surfaces_the_url() {
    let mut client = MockClient::new(0);
    client.outgoing_mode = OutgoingGrantMode::RedirectOnly;
    let intent = client.intent();
    let orchestrator = orchestrator(client);

    let failure = orchestrator.run(intent).await.unwrap_err();
    assert_eq!(failure.state, FlowState::QuoteCreated);
    assert_eq!(
        failure.error.redirect_url().map(Url::as_str),
        Some("https://auth.example/alice/interact/manual")
    );
}

#[tokio::test]
async fn quote_grant_rejection_stops_before_the_quote() {
    let mut client = MockClient::new(0);
    client.reject_quote_grant = true;
    let intent = client.intent();
    let orchestrator = orchestrator(client);

    let failure = orchestrator.run(intent).await.unwrap_err();
    assert_eq!(failure.state, FlowState::IncomingPaymentCreated);
    assert!(matches!(failure.error, FlowError::GrantRejected { .. }));

    let store = orchestrator.store();
    assert_eq!(count(store, keys::GRANT_PREFIX).await, 1);
    assert_eq!(count(store, keys::INCOMING_PAYMENT_PREFIX).await, 1);
    assert_eq!(count(store, keys::QUOTE_PREFIX).await, 0);
}

#[tokio::test]
async fn unknown_wallet_fails_before_any_grant() {
    let client = MockClient::new(0);
    let intent = PaymentIntent::builder()
        .sender("https://wallet.example/nobody".parse().unwrap())
        .receiver(client.receiver.id.clone())
        .amount(100u64)
        .build();
    let orchestrator = orchestrator(client);

    let failure = orchestrator.run(intent).await.unwrap_err();
    assert_eq!(failure.state, FlowState::Init);
    assert!(matches!(failure.error, FlowError::WalletResolution { .. }));
    assert_eq!(count(orchestrator.store(), keys::GRANT_PREFIX).await, 0);
}

#[tokio::test]
async fn cancellation_interrupts_the_continuation_wait() {
    let client = MockClient::new(0);
    let intent = client.intent();
    let orchestrator = PaymentOrchestrator::new(client, Arc::new(InMemoryFlowStore::new()))
        .with_poll_config(PollConfig {
            max_attempts: 12,
            interval: Duration::from_secs(3600),
        });

    let failure = orchestrator
        .run_with_cancel(intent, std::future::ready(()))
        .await
        .unwrap_err();
    assert_eq!(failure.state, FlowState::OutgoingGrantPending);
    assert!(matches!(failure.error, FlowError::Cancelled { .. }));
}

#[tokio::test]
async fn stored_grant_can_be_continued_after_a_timeout() {
    // Finalizes on the 5th continuation call; the flow's 3-attempt budget
    // times out first, then out-of-band continuation picks it up.
    let client = MockClient::new(5);
    let intent = client.intent();
    let orchestrator = orchestrator(client);

    let failure = orchestrator.run(intent).await.unwrap_err();
    assert!(matches!(failure.error, FlowError::GrantTimeout { .. }));

    let flow = orchestrator.flow(&failure.flow_id).await.unwrap().unwrap();
    let grant_key = flow.outgoing_grant_key.unwrap();

    let still_pending = orchestrator.continue_stored_grant(&grant_key).await.unwrap();
    assert_eq!(still_pending.state, GrantState::Interactive);

    let finalized = orchestrator.continue_stored_grant(&grant_key).await.unwrap();
    assert!(finalized.is_finalized());
    assert_eq!(finalized.token(), Some(OUTGOING_TOKEN));

    // The stored record was replaced with the finalized grant.
    let record = orchestrator.store().get(&grant_key).await.unwrap().unwrap();
    assert!(record.as_grant().unwrap().is_finalized());
}

#[tokio::test]
async fn continuing_an_unknown_key_is_an_error() {
    let orchestrator = orchestrator(MockClient::new(0));
    let err = orchestrator
        .continue_stored_grant("g_missing")
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::UnknownGrant { .. }));
}
