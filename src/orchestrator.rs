//! Sequencing of grants and resources for one payment flow.
//!
//! A flow is one logical unit of sequential work: resolve wallets, negotiate
//! the incoming-payment grant, create the incoming payment, negotiate the
//! quote grant, create the quote, negotiate the interactive outgoing-payment
//! grant, drive it to finalization, create the outgoing payment. The first
//! unrecoverable failure terminates the flow; partial progress stays in the
//! store for a later attempt to reuse.

use std::future::Future;
use std::sync::Arc;

use crate::concepts::OpenPaymentsClient;
use crate::errors::{FlowError, FlowFailure};
use crate::executor;
use crate::negotiator::{self, GrantConstraints, PollConfig};
use crate::store::{FlowRecord, FlowStore, keys};
use crate::types::{
    AccessLimits, AccessType, FlowState, Grant, IncomingPayment, OutgoingPayment, PaymentFlow,
    PaymentIntent, SettlementResult,
};

/// Runs payment flows against one protocol client and one shared store.
///
/// Flows may run concurrently; they share no mutable state except the store.
pub struct PaymentOrchestrator<C, S> {
    client: C,
    store: Arc<S>,
    poll: PollConfig,
}

impl<C, S> PaymentOrchestrator<C, S>
where
    C: OpenPaymentsClient,
    S: FlowStore,
{
    pub fn new(client: C, store: Arc<S>) -> Self {
        PaymentOrchestrator {
            client,
            store,
            poll: PollConfig::default(),
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run a payment flow to completion.
    pub async fn run(&self, intent: PaymentIntent) -> Result<SettlementResult, FlowFailure> {
        self.run_with_cancel(intent, std::future::pending()).await
    }

    /// Run a payment flow, aborting the continuation wait when `cancel`
    /// resolves. Cancellation only interrupts the poll — the single
    /// suspending operation; every other step runs to its own completion.
    pub async fn run_with_cancel(
        &self,
        intent: PaymentIntent,
        cancel: impl Future<Output = ()>,
    ) -> Result<SettlementResult, FlowFailure> {
        let mut flow = PaymentFlow::new(keys::flow(), intent);
        match self.execute(&mut flow, cancel).await {
            Ok(result) => Ok(result),
            Err(error) => {
                let reached = flow.state;
                flow.state = FlowState::Failed;
                flow.failure = Some(error.to_string());
                // Best effort: the failure itself is what the caller needs.
                if let Err(store_err) = self.checkpoint(&flow).await {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("failed to record flow failure: {store_err}");
                    #[cfg(not(feature = "tracing"))]
                    let _ = store_err;
                }
                Err(FlowFailure {
                    flow_id: flow.id,
                    state: reached,
                    error,
                })
            }
        }
    }

    async fn execute(
        &self,
        flow: &mut PaymentFlow,
        cancel: impl Future<Output = ()>,
    ) -> Result<SettlementResult, FlowError> {
        // Init -> WalletsResolved
        let sender = self
            .client
            .resolve_wallet_address(&flow.intent.sender)
            .await
            .map_err(|source| FlowError::WalletResolution {
                url: flow.intent.sender.clone(),
                source,
            })?;
        let receiver = self
            .client
            .resolve_wallet_address(&flow.intent.receiver)
            .await
            .map_err(|source| FlowError::WalletResolution {
                url: flow.intent.receiver.clone(),
                source,
            })?;
        flow.state = FlowState::WalletsResolved;
        self.checkpoint(flow).await?;

        // -> IncomingGrantFinalized, with the access-type naming shim.
        let incoming_grant = expect_finalized(
            negotiator::request_grant_with_fallback(
                &self.client,
                &receiver.auth_server,
                AccessType::IncomingPayment,
                &GrantConstraints::create(),
            )
            .await?,
        )?;
        flow.incoming_grant_key = Some(self.put_grant(&incoming_grant).await?);
        flow.state = FlowState::IncomingGrantFinalized;
        self.checkpoint(flow).await?;

        // -> IncomingPaymentCreated
        let incoming = executor::create_incoming_payment(
            &self.client,
            &incoming_grant,
            &receiver,
            flow.intent.amount,
        )
        .await?;
        let incoming_key = keys::incoming_payment();
        self.store
            .put(&incoming_key, FlowRecord::IncomingPayment(incoming.clone()))
            .await?;
        flow.incoming_payment_key = Some(incoming_key);
        flow.state = FlowState::IncomingPaymentCreated;
        self.checkpoint(flow).await?;

        // -> QuoteGrantFinalized
        let quote_grant = expect_finalized(
            negotiator::request_grant(
                &self.client,
                &sender.auth_server,
                AccessType::Quote,
                &GrantConstraints::create(),
            )
            .await?,
        )?;
        flow.quote_grant_key = Some(self.put_grant(&quote_grant).await?);
        flow.state = FlowState::QuoteGrantFinalized;
        self.checkpoint(flow).await?;

        // -> QuoteCreated
        let quote = executor::create_quote(
            &self.client,
            &quote_grant,
            &sender,
            &receiver,
            &incoming.id,
        )
        .await?;
        let quote_key = keys::quote();
        self.store
            .put(&quote_key, FlowRecord::Quote(quote.clone()))
            .await?;
        flow.quote_key = Some(quote_key);
        flow.state = FlowState::QuoteCreated;
        self.checkpoint(flow).await?;

        // -> OutgoingGrantPending: debit ceiling from the quote, redirect
        // interaction requested.
        let constraints = GrantConstraints::builder()
            .limits(AccessLimits {
                debit_amount: Some(quote.debit_amount.clone()),
                receive_amount: None,
            })
            .identifier(sender.id.clone())
            .interactive(true)
            .build();
        let outgoing_grant = negotiator::request_grant(
            &self.client,
            &sender.auth_server,
            AccessType::OutgoingPayment,
            &constraints,
        )
        .await?;
        let outgoing_grant_key = self.put_grant(&outgoing_grant).await?;
        flow.outgoing_grant_key = Some(outgoing_grant_key.clone());
        flow.state = FlowState::OutgoingGrantPending;
        self.checkpoint(flow).await?;

        // -> OutgoingGrantFinalized: the only suspending step.
        let finalized =
            negotiator::poll_until_finalized(&self.client, outgoing_grant, &self.poll, cancel)
                .await?;
        self.store
            .put(&outgoing_grant_key, FlowRecord::Grant(finalized.clone()))
            .await?;
        flow.state = FlowState::OutgoingGrantFinalized;
        self.checkpoint(flow).await?;

        // -> Completed
        let outgoing =
            executor::create_outgoing_payment(&self.client, &finalized, &sender, &quote.id)
                .await?;
        let outgoing_key = keys::outgoing_payment();
        self.store
            .put(&outgoing_key, FlowRecord::OutgoingPayment(outgoing.clone()))
            .await?;
        flow.outgoing_payment_key = Some(outgoing_key);
        flow.state = FlowState::Completed;
        self.checkpoint(flow).await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(flow_id = %flow.id, outgoing_payment = %outgoing.id, "payment flow completed");

        Ok(SettlementResult {
            flow_id: flow.id.clone(),
            incoming_payment: incoming.id,
            quote: quote.id,
            outgoing_payment: outgoing.id,
            debit_amount: quote.debit_amount,
        })
    }

    async fn put_grant(&self, grant: &Grant) -> Result<String, FlowError> {
        let key = keys::grant();
        self.store
            .put(&key, FlowRecord::Grant(grant.clone()))
            .await?;
        Ok(key)
    }

    async fn checkpoint(&self, flow: &PaymentFlow) -> Result<(), FlowError> {
        self.store
            .put(&flow.id, FlowRecord::Flow(flow.clone()))
            .await?;
        Ok(())
    }

    /// One out-of-band continuation attempt against a stored interactive
    /// grant, e.g. after the user approved the redirect. The updated grant
    /// replaces the stored record.
    pub async fn continue_stored_grant(&self, grant_key: &str) -> Result<Grant, FlowError> {
        let record = self.store.get(grant_key).await?;
        let Some(FlowRecord::Grant(grant)) = record else {
            return Err(FlowError::UnknownGrant(grant_key.to_string()));
        };
        let updated = negotiator::continue_grant(&self.client, &grant).await?;
        self.store
            .put(grant_key, FlowRecord::Grant(updated.clone()))
            .await?;
        Ok(updated)
    }

    /// A stored flow record, for status lookups and resumption.
    pub async fn flow(&self, flow_id: &str) -> Result<Option<PaymentFlow>, FlowError> {
        let record = self.store.get(flow_id).await?;
        Ok(record.and_then(|record| record.as_flow().cloned()))
    }

    /// All incoming payments recorded so far, keyed.
    pub async fn list_incoming_payments(
        &self,
    ) -> Result<Vec<(String, IncomingPayment)>, FlowError> {
        let records = self.store.list(keys::INCOMING_PAYMENT_PREFIX).await?;
        Ok(records
            .into_iter()
            .filter_map(|(key, record)| {
                record.as_incoming_payment().cloned().map(|p| (key, p))
            })
            .collect())
    }

    /// All outgoing payments recorded so far, keyed.
    pub async fn list_outgoing_payments(
        &self,
    ) -> Result<Vec<(String, OutgoingPayment)>, FlowError> {
        let records = self.store.list(keys::OUTGOING_PAYMENT_PREFIX).await?;
        Ok(records
            .into_iter()
            .filter_map(|(key, record)| {
                record.as_outgoing_payment().cloned().map(|p| (key, p))
            })
            .collect())
    }
}

/// Grants for the synchronous steps must finalize immediately; a pending
/// one means the server wants an interaction this flow cannot drive.
fn expect_finalized(grant: Grant) -> Result<Grant, FlowError> {
    if grant.is_finalized() {
        return Ok(grant);
    }
    Err(FlowError::RequiresManualInteraction {
        access_type: grant.access_type,
        redirect: grant.interact_redirect,
        continue_uri: grant.continuation.map(|cont| cont.uri),
    })
}
