//! Definitions of errors that can occur during the execution of the deployment scripts

use thiserror::Error;

/// Errors that can occur during the execution of the deployment scripts
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The configuration is malformed or names an unknown network
    #[error("invalid configuration: {0}")]
    Config(String),
    /// A credential the selected network requires is absent from the environment
    #[error("missing credential: {0}")]
    MissingCredential(String),
    /// Error reading the deployments file
    #[error("error reading deployments: {0}")]
    ReadDeployments(String),
    /// Error writing the deployments file
    #[error("error writing deployments: {0}")]
    WriteDeployments(String),
    /// No build artifact exists for the named contract
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),
    /// Error parsing a Solidity compilation artifact
    #[error("error parsing artifact: {0}")]
    ArtifactParsing(String),
    /// The artifact was built with compiler settings other than the configured ones
    #[error("compiler settings mismatch: {0}")]
    CompilerMismatch(String),
    /// Error initializing the RPC client
    #[error("error initializing client: {0}")]
    ClientInitialization(String),
    /// The node reports a chain ID other than the one the network profile names
    #[error("chain id mismatch: expected {expected}, node reports {actual}")]
    ChainIdMismatch {
        /// The chain ID of the selected network profile
        expected: u64,
        /// The chain ID reported by the node
        actual: u64,
    },
    /// Error constructing calldata for a contract method
    #[error("error constructing calldata: {0}")]
    CalldataConstruction(String),
    /// Error deploying a contract
    #[error("error deploying contract: {0}")]
    ContractDeployment(String),
    /// Error calling a contract method or querying chain state
    #[error("error interacting with contract: {0}")]
    ContractInteraction(String),
    /// The address holds no contract code
    #[error("no contract code at {0}")]
    NoCode(String),
    /// The address holds code but is not an EIP-1967 proxy
    #[error("not an upgradeable proxy: {0}")]
    NotAProxy(String),
    /// The upgrade transaction succeeded but the implementation slot did not change
    #[error("upgrade not applied: {0}")]
    UpgradeNotApplied(String),
    /// Error talking to a block explorer API
    #[error("explorer error: {0}")]
    Explorer(String),
}
