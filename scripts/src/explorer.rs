//! Block explorer integration: source and proxy verification on Etherscan-family
//! explorers, and address links

use std::time::Duration;

use alloy::primitives::{hex, Address, Bytes};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    artifacts::VerificationInput,
    config::{Config, NetworkProfile},
    constants::{
        ETHERSCAN_V2_API_URL, EXPLORER_POLL_ATTEMPTS, EXPLORER_POLL_INTERVAL_MS,
        STANDARD_JSON_CODE_FORMAT,
    },
    errors::ScriptError,
};

/// Browser URLs of the explorers known without configuration, by chain ID.
/// Their API is the Etherscan V2 endpoint.
const BUILTIN_EXPLORERS: [(u64, &str); 4] = [
    (56, "https://bscscan.com/"),
    (97, "https://testnet.bscscan.com/"),
    (137, "https://polygonscan.com/"),
    (11155111, "https://sepolia.etherscan.io/"),
];

/// The explorer of a network
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Explorer {
    /// The API endpoint
    pub api_url: Url,
    /// The human-facing site
    pub browser_url: Url,
    /// The chain sent as `chainid` with every request
    pub chain_id: u64,
}

/// The envelope of every Etherscan API response
#[derive(Debug, Deserialize)]
pub struct ExplorerResponse {
    /// `"1"` on success, `"0"` otherwise
    pub status: String,
    /// A short status message
    pub message: String,
    /// The payload, a guid or a human-readable result
    pub result: String,
}

/// The state of a submitted verification
#[derive(Debug, PartialEq, Eq)]
pub enum VerificationStatus {
    /// The explorer accepted the contract
    Verified(String),
    /// The explorer is still processing the request
    Pending,
    /// The explorer rejected the request
    Failed(String),
}

impl ExplorerResponse {
    /// Interpret a `checkproxyverification` or `checkverifystatus` response
    pub fn verification_status(&self) -> VerificationStatus {
        if self.status == "1" || self.already_verified() {
            return VerificationStatus::Verified(self.result.clone());
        }

        if self.result.to_lowercase().contains("pending") {
            VerificationStatus::Pending
        } else {
            VerificationStatus::Failed(self.result.clone())
        }
    }

    /// Whether the explorer reports the contract as verified before this request
    fn already_verified(&self) -> bool {
        self.result.to_lowercase().contains("already verified")
    }
}

/// The explorer serving the given network, custom chains first
pub fn resolve_explorer(
    config: &Config,
    network: &NetworkProfile,
) -> Result<Explorer, ScriptError> {
    if let Some(custom) = config.custom_chain(&network.name) {
        if custom.chain_id != network.chain_id {
            return Err(ScriptError::Config(format!(
                "explorer for `{}` is registered for chain {}, network is chain {}",
                network.name, custom.chain_id, network.chain_id
            )));
        }
        return Ok(Explorer {
            api_url: custom.urls.api_url.clone(),
            browser_url: custom.urls.browser_url.clone(),
            chain_id: custom.chain_id,
        });
    }

    let (chain_id, browser_url) = BUILTIN_EXPLORERS
        .iter()
        .find(|(chain_id, _)| *chain_id == network.chain_id)
        .ok_or_else(|| {
            ScriptError::Explorer(format!(
                "no explorer known for network `{}` (chain {})",
                network.name, network.chain_id
            ))
        })?;

    Ok(Explorer {
        api_url: parse_url(ETHERSCAN_V2_API_URL)?,
        browser_url: parse_url(browser_url)?,
        chain_id: *chain_id,
    })
}

/// The explorer page of an address
pub fn address_link(explorer: &Explorer, address: Address) -> Result<Url, ScriptError> {
    explorer
        .browser_url
        .join(&format!("address/{address}"))
        .map_err(|e| ScriptError::Explorer(e.to_string()))
}

/// Ask the explorer to treat the given address as a proxy and link it to its implementation.
///
/// Polls until the explorer reports a result; returns the explorer's message.
pub async fn verify_proxy(
    explorer: &Explorer,
    api_key: &str,
    proxy: Address,
    expected_implementation: Option<Address>,
) -> Result<String, ScriptError> {
    let mut form = vec![
        ("module", "contract".to_string()),
        ("action", "verifyproxycontract".to_string()),
        ("address", proxy.to_string()),
        ("apikey", api_key.to_string()),
    ];
    if let Some(implementation) = expected_implementation {
        form.push(("expectedimplementation", implementation.to_string()));
    }

    let http = reqwest::Client::new();
    let submitted = submit(&http, explorer, &form).await?;
    if submitted.status != "1" {
        return Err(ScriptError::Explorer(format!(
            "{}: {}",
            submitted.message, submitted.result
        )));
    }

    let guid = submitted.result;
    info!(%proxy, %guid, "proxy verification submitted");
    poll(&http, explorer, api_key, "checkproxyverification", &guid).await
}

/// Submit the standard JSON input of a contract for source verification.
///
/// Polls until the explorer reports a result; returns the explorer's message. A
/// contract the explorer already verified counts as verified.
pub async fn verify_source(
    explorer: &Explorer,
    api_key: &str,
    address: Address,
    input: &VerificationInput,
    constructor_args: &Bytes,
) -> Result<String, ScriptError> {
    let source_code = serde_json::to_string(&input.standard_json)
        .map_err(|e| ScriptError::Explorer(e.to_string()))?;
    let form = vec![
        ("module", "contract".to_string()),
        ("action", "verifysourcecode".to_string()),
        ("apikey", api_key.to_string()),
        ("contractaddress", address.to_string()),
        ("sourceCode", source_code),
        ("codeformat", STANDARD_JSON_CODE_FORMAT.to_string()),
        ("contractname", input.contract_name.clone()),
        ("compilerversion", format!("v{}", input.compiler_version)),
        // Etherscan's spelling
        ("constructorArguements", hex::encode(constructor_args)),
    ];

    let http = reqwest::Client::new();
    let submitted = submit(&http, explorer, &form).await?;
    if submitted.already_verified() {
        return Ok(submitted.result);
    }
    if submitted.status != "1" {
        return Err(ScriptError::Explorer(format!(
            "{}: {}",
            submitted.message, submitted.result
        )));
    }

    let guid = submitted.result;
    info!(%address, %guid, "source verification submitted");
    poll(&http, explorer, api_key, "checkverifystatus", &guid).await
}

/// Post a form to the explorer API
async fn submit(
    http: &reqwest::Client,
    explorer: &Explorer,
    form: &[(&str, String)],
) -> Result<ExplorerResponse, ScriptError> {
    http.post(explorer.api_url.clone())
        .query(&[("chainid", explorer.chain_id)])
        .form(form)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| ScriptError::Explorer(e.to_string()))?
        .json()
        .await
        .map_err(|e| ScriptError::Explorer(e.to_string()))
}

/// Poll a submitted request until the explorer reports a result
async fn poll(
    http: &reqwest::Client,
    explorer: &Explorer,
    api_key: &str,
    action: &str,
    guid: &str,
) -> Result<String, ScriptError> {
    let chain_id = explorer.chain_id.to_string();
    for attempt in 1..=EXPLORER_POLL_ATTEMPTS {
        tokio::time::sleep(Duration::from_millis(EXPLORER_POLL_INTERVAL_MS)).await;

        let status: ExplorerResponse = http
            .get(explorer.api_url.clone())
            .query(&[
                ("chainid", chain_id.as_str()),
                ("module", "contract"),
                ("action", action),
                ("guid", guid),
                ("apikey", api_key),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ScriptError::Explorer(e.to_string()))?
            .json()
            .await
            .map_err(|e| ScriptError::Explorer(e.to_string()))?;

        match status.verification_status() {
            VerificationStatus::Verified(message) => return Ok(message),
            VerificationStatus::Failed(message) => return Err(ScriptError::Explorer(message)),
            VerificationStatus::Pending => debug!(attempt, action, "verification pending"),
        }
    }

    warn!(%guid, action, "explorer did not finish verification in time");
    Err(ScriptError::Explorer(format!("verification {guid} still pending")))
}

/// Parse a built-in URL
fn parse_url(url: &str) -> Result<Url, ScriptError> {
    Url::parse(url).map_err(|e| ScriptError::Explorer(e.to_string()))
}
