//! Constants used in the integration tests

/// The default hostport that the local devnet node runs on
pub(crate) const DEFAULT_DEVNET_HOSTPORT: &str = "http://127.0.0.1:8545";

/// The default private key for the tests, the first default account in an Anvil or Hardhat node
pub(crate) const DEFAULT_DEVNET_PKEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// The chain ID of a local Anvil or Hardhat node
pub(crate) const DEFAULT_DEVNET_CHAIN_ID: u64 = 31337;

/// The network profile the devnet is registered under
pub(crate) const DEVNET_NETWORK: &str = "hardhat";

/// A key variable that is never set, used to exercise the missing-credential path
pub(crate) const UNSET_KEY_VARIABLE: &str = "WALLET_FACTORY_INTEGRATION_UNSET_KEY";
