//! A remote Open Payments client that communicates over HTTP.
//!
//! Implements [`OpenPaymentsClient`] with `reqwest`. Grant and resource
//! calls carry GNAP `Authorization` headers; HTTP message signing is left to
//! the deployment (signing proxy or transport middleware), which is what the
//! [`crate::config::ClientConfig`] key material is handed to.

use http::{HeaderMap, HeaderName, HeaderValue, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    concepts::OpenPaymentsClient,
    config::ClientConfig,
    errors::ClientError,
    types::{
        GrantRequest, GrantResponse, IncomingPayment, IncomingPaymentRequest, OutgoingPayment,
        OutgoingPaymentRequest, Quote, QuoteRequest, WalletAddress,
    },
};

const INCOMING_PAYMENTS_PATH: &str = "incoming-payments";
const QUOTES_PATH: &str = "quotes";
const OUTGOING_PAYMENTS_PATH: &str = "outgoing-payments";

/// A remote Open Payments client.
#[derive(Debug, Clone)]
pub struct RemoteOpenPaymentsClient {
    config: ClientConfig,
    client: reqwest::Client,
    default_headers: HeaderMap,
}

impl RemoteOpenPaymentsClient {
    pub fn new(config: ClientConfig) -> Self {
        RemoteOpenPaymentsClient {
            config,
            client: reqwest::Client::new(),
            default_headers: HeaderMap::new(),
        }
    }

    /// Add a header to every request this client sends.
    pub fn header(mut self, key: &HeaderName, value: &HeaderValue) -> Self {
        self.default_headers.insert(key, value.to_owned());
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn gnap_header(token: &str) -> Result<HeaderValue, ClientError> {
        HeaderValue::from_str(&format!("GNAP {token}")).map_err(|err| ClientError::Http {
            endpoint: "authorization header".to_string(),
            detail: err.to_string(),
        })
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: Url,
        token: Option<&str>,
        body: &B,
    ) -> Result<T, ClientError> {
        let endpoint = url.to_string();
        let mut request = self
            .client
            .post(url)
            .headers(self.default_headers.clone())
            .json(body);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, Self::gnap_header(token)?);
        }
        let response = request.send().await.map_err(|err| ClientError::Http {
            endpoint: endpoint.clone(),
            detail: err.to_string(),
        })?;
        Self::parse_json(endpoint, response).await
    }

    async fn parse_json<T: DeserializeOwned>(
        endpoint: String,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }
        response
            .json()
            .await
            .map_err(|err| ClientError::Deserialization {
                endpoint,
                detail: err.to_string(),
            })
    }
}

impl OpenPaymentsClient for RemoteOpenPaymentsClient {
    async fn resolve_wallet_address(&self, url: &Url) -> Result<WalletAddress, ClientError> {
        let endpoint = url.to_string();
        let response = self
            .client
            .get(url.clone())
            .headers(self.default_headers.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| ClientError::Http {
                endpoint: endpoint.clone(),
                detail: err.to_string(),
            })?;
        Self::parse_json(endpoint, response).await
    }

    async fn request_grant(
        &self,
        auth_server: &Url,
        request: &GrantRequest,
    ) -> Result<GrantResponse, ClientError> {
        // The grant endpoint is the authorization server base URL itself.
        let mut body = request.clone();
        if body.client.is_none() {
            body.client = Some(self.config.wallet_address_url.clone());
        }
        self.post_json(auth_server.clone(), None, &body).await
    }

    async fn continue_grant(
        &self,
        continue_uri: &Url,
        continue_token: &str,
    ) -> Result<GrantResponse, ClientError> {
        self.post_json(
            continue_uri.clone(),
            Some(continue_token),
            &serde_json::json!({}),
        )
        .await
    }

    async fn create_incoming_payment(
        &self,
        resource_server: &Url,
        access_token: &str,
        request: &IncomingPaymentRequest,
    ) -> Result<IncomingPayment, ClientError> {
        let url = resource_server.join(INCOMING_PAYMENTS_PATH)?;
        self.post_json(url, Some(access_token), request).await
    }

    async fn create_quote(
        &self,
        resource_server: &Url,
        access_token: &str,
        request: &QuoteRequest,
    ) -> Result<Quote, ClientError> {
        let url = resource_server.join(QUOTES_PATH)?;
        self.post_json(url, Some(access_token), request).await
    }

    async fn create_outgoing_payment(
        &self,
        resource_server: &Url,
        access_token: &str,
        request: &OutgoingPaymentRequest,
    ) -> Result<OutgoingPayment, ClientError> {
        let url = resource_server.join(OUTGOING_PAYMENTS_PATH)?;
        self.post_json(url, Some(access_token), request).await
    }
}
