//! Static configuration of the target networks, compiler settings, and explorer credentials.
//!
//! A [`Config`] is constructed once at process start, either from the built-in
//! network set or from a JSON file, and passed by reference into each command.

use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::signers::local::PrivateKeySigner;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::{
    constants::{
        BSC_API_KEY_ENV_VAR, DEFAULT_ARTIFACTS_PATH, DEFAULT_DEPLOYMENTS_PATH, DEFAULT_NETWORK,
        DEFAULT_OPTIMIZER_RUNS, DEFAULT_SOLC_VERSION, ETHERSCAN_V2_API_URL, POLYGON_API_KEY_ENV_VAR,
        PRIVATE_KEY_ENV_VAR, SEPOLIA_API_KEY_ENV_VAR,
    },
    errors::ScriptError,
};

/// The gas limit policy of a network
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GasLimit {
    /// Let the node estimate the gas limit of each transaction
    #[default]
    Auto,
    /// Use a fixed gas limit for every transaction
    Fixed(u64),
}

/// How transactions on a network are priced and limited
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPolicy {
    /// The gas limit policy
    #[serde(default)]
    pub gas: GasLimit,
    /// A fixed gas price in wei, estimated by the node when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u64>,
}

/// A named bundle of chain connection parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkProfile {
    /// The name the network is selected by, filled in from its key in the config
    #[serde(default, skip_serializing)]
    pub name: String,
    /// The JSON-RPC endpoint
    pub url: Url,
    /// The chain ID the endpoint must report
    pub chain_id: u64,
    /// The name of the environment variable holding the signing key
    #[serde(default = "default_accounts")]
    pub accounts: String,
    /// The gas policy applied to every transaction
    #[serde(default)]
    pub gas: GasPolicy,
}

/// The default signing key environment variable
fn default_accounts() -> String {
    PRIVATE_KEY_ENV_VAR.to_string()
}

impl NetworkProfile {
    /// Construct a profile signing with the default key variable
    fn new(name: &str, url: &str, chain_id: u64, gas: GasPolicy) -> Result<Self, ScriptError> {
        let url = Url::parse(url).map_err(|e| ScriptError::Config(e.to_string()))?;
        Ok(Self { name: name.to_string(), url, chain_id, accounts: default_accounts(), gas })
    }

    /// Resolve the signing key of this network.
    ///
    /// An explicit key takes precedence over the environment. Fails before any
    /// RPC traffic if neither holds a key.
    pub fn signing_key(&self, explicit: Option<&str>) -> Result<PrivateKeySigner, ScriptError> {
        let key = match explicit {
            Some(key) => key.to_string(),
            None => env::var(&self.accounts).unwrap_or_default(),
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(ScriptError::MissingCredential(format!(
                "`{}` is not set, network `{}` cannot sign transactions",
                self.accounts, self.name
            )));
        }

        PrivateKeySigner::from_str(key).map_err(|e| {
            ScriptError::Config(format!("malformed signing key for network `{}`: {e}", self.name))
        })
    }

    /// Validate a single profile
    fn validate(&self, key: &str) -> Result<(), ScriptError> {
        if self.name != key {
            return Err(ScriptError::Config(format!(
                "network `{key}` is named `{}`",
                self.name
            )));
        }
        if self.chain_id == 0 {
            return Err(ScriptError::Config(format!("network `{key}` has chain id 0")));
        }
        if !matches!(self.url.scheme(), "http" | "https") {
            return Err(ScriptError::Config(format!(
                "network `{key}` has unsupported url scheme `{}`",
                self.url.scheme()
            )));
        }
        if self.accounts.trim().is_empty() {
            return Err(ScriptError::Config(format!(
                "network `{key}` names no signing key variable"
            )));
        }
        if self.gas.gas == GasLimit::Fixed(0) {
            return Err(ScriptError::Config(format!("network `{key}` has a zero gas limit")));
        }

        Ok(())
    }
}

/// Solidity optimizer settings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Whether the optimizer is enabled
    pub enabled: bool,
    /// The number of optimizer runs
    pub runs: u64,
}

/// Solidity compiler settings the artifacts are expected to be built with
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolidityConfig {
    /// The compiler version, e.g. `0.8.26`
    pub version: String,
    /// The optimizer settings
    pub optimizer: OptimizerConfig,
}

/// The endpoints of a block explorer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerUrls {
    /// The API endpoint
    pub api_url: Url,
    /// The human-facing explorer
    pub browser_url: Url,
}

/// An explorer for a chain not known to the built-in explorer table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomChain {
    /// The network the explorer serves
    pub network: String,
    /// The chain ID of the network
    pub chain_id: u64,
    /// The explorer endpoints
    pub urls: ExplorerUrls,
}

/// Block explorer verification settings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Network name -> name of the environment variable holding its API key
    #[serde(default)]
    pub api_keys: BTreeMap<String, String>,
    /// Explorers overriding or extending the built-in table
    #[serde(default)]
    pub custom_chains: Vec<CustomChain>,
}

/// Filesystem locations used by the scripts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// The compilation artifacts directory
    pub artifacts: PathBuf,
    /// The deployments file
    pub deployments: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            artifacts: PathBuf::from(DEFAULT_ARTIFACTS_PATH),
            deployments: PathBuf::from(DEFAULT_DEPLOYMENTS_PATH),
        }
    }
}

/// The full configuration of the deployment scripts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// The network used when none is selected explicitly
    pub default_network: String,
    /// The compiler settings
    pub solidity: SolidityConfig,
    /// The known networks, keyed by name
    pub networks: BTreeMap<String, NetworkProfile>,
    /// The explorer settings
    #[serde(default)]
    pub etherscan: ExplorerConfig,
    /// The filesystem locations
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// The built-in configuration
    pub fn builtin() -> Result<Self, ScriptError> {
        let auto = GasPolicy::default();
        let networks = [
            NetworkProfile::new("hardhat", "http://127.0.0.1:8545", 31337, auto)?,
            NetworkProfile::new("ganache", "http://127.0.0.1:8545", 1337, auto)?,
            NetworkProfile::new("bsc", "https://bsc-dataseed.binance.org/", 56, auto)?,
            NetworkProfile::new(
                "sepolia",
                "https://ethereum-sepolia-rpc.publicnode.com",
                11155111,
                auto,
            )?,
            NetworkProfile::new(
                "bscTestnet",
                "https://data-seed-prebsc-1-s3.binance.org:8545/",
                97,
                auto,
            )?,
            NetworkProfile::new("polygon", "https://rpc.ankr.com/polygon", 137, auto)?,
        ]
        .into_iter()
        .map(|profile| (profile.name.clone(), profile))
        .collect();

        let api_keys = [
            ("bscTestnet", BSC_API_KEY_ENV_VAR),
            ("bsc", BSC_API_KEY_ENV_VAR),
            ("polygon", POLYGON_API_KEY_ENV_VAR),
            ("sepolia", SEPOLIA_API_KEY_ENV_VAR),
        ]
        .into_iter()
        .map(|(network, var)| (network.to_string(), var.to_string()))
        .collect();

        let sepolia_explorer = CustomChain {
            network: "sepolia".to_string(),
            chain_id: 11155111,
            urls: ExplorerUrls {
                api_url: parse_url(ETHERSCAN_V2_API_URL)?,
                browser_url: parse_url("https://sepolia.etherscan.io/")?,
            },
        };

        let config = Self {
            default_network: DEFAULT_NETWORK.to_string(),
            solidity: SolidityConfig {
                version: DEFAULT_SOLC_VERSION.to_string(),
                optimizer: OptimizerConfig { enabled: true, runs: DEFAULT_OPTIMIZER_RUNS },
            },
            networks,
            etherscan: ExplorerConfig { api_keys, custom_chains: vec![sepolia_explorer] },
            paths: PathsConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn from_file(path: &Path) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ScriptError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_json(&contents)?;
        debug!(path = %path.display(), networks = config.networks.len(), "loaded config file");
        Ok(config)
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(contents: &str) -> Result<Self, ScriptError> {
        let mut config: Config =
            serde_json::from_str(contents).map_err(|e| ScriptError::Config(e.to_string()))?;

        for (key, profile) in config.networks.iter_mut() {
            if profile.name.is_empty() {
                profile.name = key.clone();
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ScriptError> {
        if !self.networks.contains_key(&self.default_network) {
            return Err(ScriptError::Config(format!(
                "default network `{}` is not defined",
                self.default_network
            )));
        }

        for (key, profile) in &self.networks {
            profile.validate(key)?;
        }

        if self.solidity.optimizer.enabled && self.solidity.optimizer.runs == 0 {
            return Err(ScriptError::Config("optimizer enabled with zero runs".to_string()));
        }

        if let Some(network) =
            self.etherscan.api_keys.keys().find(|network| !self.networks.contains_key(*network))
        {
            return Err(ScriptError::Config(format!(
                "explorer api key configured for unknown network `{network}`"
            )));
        }

        Ok(())
    }

    /// Select a network by name, falling back to the default network
    pub fn network(&self, name: Option<&str>) -> Result<&NetworkProfile, ScriptError> {
        let name = name.unwrap_or(&self.default_network);
        self.networks.get(name).ok_or_else(|| {
            let known = self.networks.keys().cloned().collect::<Vec<_>>().join(", ");
            ScriptError::Config(format!("unknown network `{name}` (known: {known})"))
        })
    }

    /// Read the explorer API key of the given network from the environment
    pub fn explorer_api_key(&self, network: &str) -> Result<String, ScriptError> {
        let var = self.etherscan.api_keys.get(network).ok_or_else(|| {
            ScriptError::MissingCredential(format!(
                "no explorer api key configured for `{network}`"
            ))
        })?;

        env::var(var).ok().filter(|key| !key.trim().is_empty()).ok_or_else(|| {
            ScriptError::MissingCredential(format!("`{var}` is not set for network `{network}`"))
        })
    }

    /// The custom explorer registered for the given network, if any
    pub fn custom_chain(&self, network: &str) -> Option<&CustomChain> {
        self.etherscan.custom_chains.iter().find(|chain| chain.network == network)
    }
}

/// Parse a built-in URL
fn parse_url(url: &str) -> Result<Url, ScriptError> {
    Url::parse(url).map_err(|e| ScriptError::Config(e.to_string()))
}
