//! The persisted record of deployed proxies, keyed by network and contract name

use std::{collections::BTreeMap, fs, path::Path};

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{errors::ScriptError, types::ProxyKind};

/// A deployed proxy and what sits behind it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// The chain the proxy lives on
    pub chain_id: u64,
    /// The proxy address
    pub proxy: Address,
    /// The current implementation address
    pub implementation: Address,
    /// The proxy admin address, for transparent proxies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<Address>,
    /// The proxy pattern
    pub kind: ProxyKind,
}

/// The contents of the deployments file
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deployments {
    /// Network name -> contract name -> record
    networks: BTreeMap<String, BTreeMap<String, DeploymentRecord>>,
}

impl Deployments {
    /// Load the deployments file, treating a missing file as empty
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        if !path.exists() {
            debug!(path = %path.display(), "no deployments file yet");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScriptError::ReadDeployments(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&contents)
            .map_err(|e| ScriptError::ReadDeployments(format!("{}: {e}", path.display())))
    }

    /// Write the deployments file, creating its parent directory if needed
    pub fn save(&self, path: &Path) -> Result<(), ScriptError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        fs::write(path, contents + "\n")
            .map_err(|e| ScriptError::WriteDeployments(format!("{}: {e}", path.display())))
    }

    /// Look up the record of a contract on a network
    pub fn get(&self, network: &str, contract: &str) -> Option<&DeploymentRecord> {
        self.networks.get(network)?.get(contract)
    }

    /// Record a deployment, replacing any previous record for the same contract
    pub fn insert(&mut self, network: &str, contract: &str, record: DeploymentRecord) {
        self.networks.entry(network.to_string()).or_default().insert(contract.to_string(), record);
    }

    /// Point an existing record at a new implementation
    pub fn set_implementation(
        &mut self,
        network: &str,
        contract: &str,
        implementation: Address,
    ) -> Option<&DeploymentRecord> {
        let record = self.networks.get_mut(network)?.get_mut(contract)?;
        record.implementation = implementation;
        Some(record)
    }

    /// Resolve the proxy of a contract, requiring the record to belong to the given chain
    pub fn proxy_address(
        &self,
        network: &str,
        contract: &str,
        chain_id: u64,
    ) -> Result<Address, ScriptError> {
        let record = self.get(network, contract).ok_or_else(|| {
            ScriptError::ReadDeployments(format!(
                "no deployment of `{contract}` recorded for network `{network}`, pass --proxy"
            ))
        })?;

        if record.chain_id != chain_id {
            return Err(ScriptError::ReadDeployments(format!(
                "`{contract}` on `{network}` was recorded for chain {}, not {chain_id}",
                record.chain_id
            )));
        }

        Ok(record.proxy)
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;
    use tempfile::TempDir;

    use super::*;

    /// A transparent proxy record
    fn record() -> DeploymentRecord {
        DeploymentRecord {
            chain_id: 31337,
            proxy: address!("9cdf42574e31CA0b0a9415ff4572dc50881dC023"),
            implementation: address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
            admin: Some(address!("Cf7Ed3AccA5a467e9e704C703E8D87F634fB0Fc9")),
            kind: ProxyKind::Transparent,
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let deployments = Deployments::load(&dir.path().join("deployments.json")).unwrap();

        assert_eq!(deployments, Deployments::default());
    }

    #[test]
    fn records_survive_a_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deployments.json");

        let mut deployments = Deployments::default();
        deployments.insert("hardhat", "MultiSigWalletFactory", record());
        deployments.save(&path).unwrap();

        let loaded = Deployments::load(&path).unwrap();
        assert_eq!(loaded.get("hardhat", "MultiSigWalletFactory"), Some(&record()));
        assert_eq!(loaded.get("sepolia", "MultiSigWalletFactory"), None);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["hardhat"]["MultiSigWalletFactory"]["kind"], "transparent");
    }

    #[test]
    fn proxy_lookup_checks_the_chain() {
        let mut deployments = Deployments::default();
        deployments.insert("hardhat", "MultiSigWalletFactory", record());

        let proxy = deployments.proxy_address("hardhat", "MultiSigWalletFactory", 31337).unwrap();
        assert_eq!(proxy, record().proxy);

        assert!(deployments.proxy_address("hardhat", "MultiSigWalletFactory", 1).is_err());
        assert!(deployments.proxy_address("hardhat", "Other", 31337).is_err());
    }

    #[test]
    fn upgrade_updates_the_implementation() {
        let mut deployments = Deployments::default();
        deployments.insert("hardhat", "MultiSigWalletFactory", record());

        let new_impl = address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512");
        let updated =
            deployments.set_implementation("hardhat", "MultiSigWalletFactory", new_impl).unwrap();
        assert_eq!(updated.implementation, new_impl);
        assert_eq!(updated.proxy, record().proxy);

        let missing = deployments.set_implementation("sepolia", "MultiSigWalletFactory", new_impl);
        assert!(missing.is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deployments.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Deployments::load(&path), Err(ScriptError::ReadDeployments(_))));
    }
}
