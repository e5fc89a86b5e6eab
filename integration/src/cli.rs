//! Definition of the CLI arguments for integration tests

use std::path::PathBuf;

use clap::Parser;
use url::Url;

use crate::constants::{DEFAULT_DEVNET_CHAIN_ID, DEFAULT_DEVNET_HOSTPORT, DEFAULT_DEVNET_PKEY};

/// CLI tool for running the deployment scripts against a running devnet node.
///
/// Assumes the wallet factory and the OpenZeppelin proxy contracts have been compiled
/// into the artifacts directory.
#[derive(Debug, Clone, Parser)]
pub(crate) struct Cli {
    /// Path to the compilation artifacts directory
    #[arg(short, long, default_value = "../artifacts")]
    pub(crate) artifacts: PathBuf,

    /// Devnet private key, defaults to the first default account of an Anvil node
    #[arg(short, long, default_value = DEFAULT_DEVNET_PKEY)]
    pub(crate) priv_key: String,

    /// Devnet RPC URL
    #[arg(short, long, default_value = DEFAULT_DEVNET_HOSTPORT)]
    pub(crate) rpc_url: Url,

    /// Chain ID the devnet reports
    #[arg(long, default_value_t = DEFAULT_DEVNET_CHAIN_ID)]
    pub(crate) chain_id: u64,

    /// Only run the tests whose name contains this filter
    #[arg(short, long)]
    pub(crate) test: Option<String>,
}
