//! # OpenPay Kit
//!
//! OpenPay Kit is a modular SDK for orchestrating Open Payments flows: grant
//! negotiation against GNAP authorization servers, bounded continuation
//! polling for interactive grants, and the incoming-payment, quote, and
//! outgoing-payment resource steps that settle a payment between two wallets.
//!
//! The kit is **not a wallet** — it drives the protocol on behalf of an
//! application that already holds client credentials.
//!
//! ## Core Components Overview
//!
//! - **[`concepts`]**: The [`concepts::OpenPaymentsClient`] trait every
//!   protocol transport implements.
//! - **[`types`]**: Wallet, grant, resource, and flow types, including the
//!   GNAP wire structs.
//! - **[`negotiator`]**: Grant requests, sync/interactive classification,
//!   and cancellable continuation polling.
//! - **[`executor`]**: Resource creation steps gated by finalized grants.
//! - **[`orchestrator`]**: The end-to-end payment flow state machine.
//! - **[`store`]**: The [`store::FlowStore`] persistence port and an
//!   in-memory implementation.
//! - **[`client`]**: A `reqwest`-backed protocol client (feature
//!   `http-client`, on by default).
//!
//! ## Running a Payment Flow
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use openpay_kit::{
//!     client::RemoteOpenPaymentsClient,
//!     config::{ClientConfig, PrivateKey},
//!     orchestrator::PaymentOrchestrator,
//!     store::InMemoryFlowStore,
//!     types::PaymentIntent,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::builder()
//!     .wallet_address_url("https://wallet.example/app".parse()?)
//!     .key_id("key-1")
//!     .private_key(PrivateKey::from_path("client-key.pem"))
//!     .build();
//!
//! let orchestrator = PaymentOrchestrator::new(
//!     RemoteOpenPaymentsClient::new(config),
//!     Arc::new(InMemoryFlowStore::default()),
//! );
//!
//! let intent = PaymentIntent::builder()
//!     .sender("https://wallet.example/alice".parse()?)
//!     .receiver("https://wallet.example/bob".parse()?)
//!     .amount(100u64)
//!     .build();
//!
//! let settlement = orchestrator.run(intent).await?;
//! println!("paid via {}", settlement.outgoing_payment);
//! # Ok(())
//! # }
//! ```
//!
//! When the outgoing-payment grant needs user approval, the flow polls the
//! continuation endpoint for a bounded number of attempts; a failed flow
//! reports the furthest state it reached, and everything created up to that
//! point stays in the store for inspection or resumption.

pub mod concepts;
pub mod config;
pub mod errors;
pub mod executor;
pub mod negotiator;
pub mod orchestrator;
pub mod store;
pub mod types;

#[cfg(feature = "http-client")]
pub mod client;
