//! Core traits used across the kit.

use std::future::Future;

use url::Url;

use crate::{
    errors::ClientError,
    types::{
        GrantRequest, GrantResponse, IncomingPayment, IncomingPaymentRequest, OutgoingPayment,
        OutgoingPaymentRequest, Quote, QuoteRequest, WalletAddress,
    },
};

/// Open Payments protocol client interface.
///
/// Implementations perform the signed HTTP calls against authorization and
/// resource servers; the kit consumes this contract and never reimplements
/// request signing. Every call is a plain request/response with its own
/// timeout — no operation here spawns background work.
pub trait OpenPaymentsClient {
    /// Fetch the public wallet address document at `url`.
    fn resolve_wallet_address(
        &self,
        url: &Url,
    ) -> impl Future<Output = Result<WalletAddress, ClientError>>;

    /// Request a grant from an authorization server.
    fn request_grant(
        &self,
        auth_server: &Url,
        request: &GrantRequest,
    ) -> impl Future<Output = Result<GrantResponse, ClientError>>;

    /// Re-check a pending grant using its continuation handle.
    fn continue_grant(
        &self,
        continue_uri: &Url,
        continue_token: &str,
    ) -> impl Future<Output = Result<GrantResponse, ClientError>>;

    /// Create an incoming payment on a resource server.
    fn create_incoming_payment(
        &self,
        resource_server: &Url,
        access_token: &str,
        request: &IncomingPaymentRequest,
    ) -> impl Future<Output = Result<IncomingPayment, ClientError>>;

    /// Create a quote on a resource server.
    fn create_quote(
        &self,
        resource_server: &Url,
        access_token: &str,
        request: &QuoteRequest,
    ) -> impl Future<Output = Result<Quote, ClientError>>;

    /// Create an outgoing payment on a resource server.
    fn create_outgoing_payment(
        &self,
        resource_server: &Url,
        access_token: &str,
        request: &OutgoingPaymentRequest,
    ) -> impl Future<Output = Result<OutgoingPayment, ClientError>>;
}
