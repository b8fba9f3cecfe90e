use serde::{Deserialize, Serialize};
use url::Url;

/// A resolved wallet address document.
///
/// Fetched fresh per flow from the wallet's public endpoint; immutable once
/// resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAddress {
    /// Canonical identifier of the wallet.
    pub id: Url,
    /// Human-readable name, if the wallet publishes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_name: Option<String>,
    /// Asset code of the underlying account (e.g. "USD").
    pub asset_code: String,
    /// Number of decimal places in the smallest asset unit.
    pub asset_scale: u8,
    /// GNAP authorization server issuing grants for this wallet.
    pub auth_server: Url,
    /// Resource server hosting the wallet's payment resources.
    pub resource_server: Url,
}
