//! XRPL testnet fee lookup
//!
//! Queries the rippled JSON-RPC `fee` method and turns the open-ledger fee
//! into an advisory per-transfer estimate.

use super::{LedgerProvider, TransferEstimate};
use crate::error::OrchestrationError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const PROVIDER: &str = "XRPL testnet";
const DROPS_PER_XRP: f64 = 1_000_000.0;
/// Typical validated-ledger close interval
const LEDGER_CLOSE_SECS: f64 = 4.0;

pub struct XrplTestnetClient {
    client: Client,
    rpc_url: String,
}

impl XrplTestnetClient {
    pub fn new(rpc_url: String) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self { client, rpc_url })
    }
}

#[derive(Debug, Deserialize)]
struct FeeEnvelope {
    result: FeeResult,
}

#[derive(Debug, Deserialize)]
struct FeeResult {
    #[serde(default)]
    status: Option<String>,
    drops: Option<FeeDrops>,
}

#[derive(Debug, Deserialize)]
struct FeeDrops {
    open_ledger_fee: Option<String>,
    base_fee: Option<String>,
}

fn fee_in_xrp(envelope: &FeeEnvelope) -> Option<f64> {
    let drops = envelope.result.drops.as_ref()?;
    let raw = drops
        .open_ledger_fee
        .as_deref()
        .or(drops.base_fee.as_deref())?;
    raw.parse::<f64>().ok().map(|d| d / DROPS_PER_XRP)
}

#[async_trait]
impl LedgerProvider for XrplTestnetClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn estimate(
        &self,
        amount: Option<f64>,
        source: Option<&str>,
        destination: Option<&str>,
    ) -> crate::Result<TransferEstimate> {
        debug!(?amount, ?source, ?destination, "Querying XRPL testnet fee");

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&json!({ "method": "fee", "params": [{}] }))
            .send()
            .await
            .map_err(|e| OrchestrationError::external(PROVIDER, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(OrchestrationError::external(
                PROVIDER,
                format!("status {}", response.status()),
            ));
        }

        let envelope: FeeEnvelope = response
            .json()
            .await
            .map_err(|e| OrchestrationError::external(PROVIDER, format!("unreadable response: {}", e)))?;

        if envelope.result.status.as_deref() != Some("success") {
            warn!(status = ?envelope.result.status, "XRPL fee call did not report success");
        }

        let fee = fee_in_xrp(&envelope)
            .ok_or_else(|| OrchestrationError::external(PROVIDER, "fee missing from response"))?;

        Ok(TransferEstimate {
            network: "xrpl-testnet".to_string(),
            fee,
            fee_currency: "XRP".to_string(),
            settlement_secs: LEDGER_CLOSE_SECS,
        })
    }
}
