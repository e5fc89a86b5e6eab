//! Definitions of CLI arguments and commands for the deployment scripts

use std::path::PathBuf;

use alloy::primitives::{Address, Bytes};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::{
    commands::{deploy, inspect, upgrade, verify, verify_proxy, ScriptContext},
    config::Config,
    constants::DEFAULT_CONTRACT_NAME,
    errors::ScriptError,
    types::ProxyKind,
    utils::setup_client,
};

/// Deploy and upgrade the wallet factory behind an upgradeable proxy
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Network to run against, defaults to the configured default network
    #[arg(short, long, env = "NETWORK")]
    pub network: Option<String>,

    /// Path to a JSON config file replacing the built-in networks
    #[arg(short, long, env = "DEPLOY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Private key of the deployer, overriding the network's key variable
    #[arg(short, long)]
    pub priv_key: Option<String>,

    /// Path to the compilation artifacts directory
    #[arg(long)]
    pub artifacts: Option<PathBuf>,

    /// Path to the deployments file
    #[arg(long)]
    pub deployments: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Build the process configuration: the config file or the built-in set,
    /// with path overrides from the command line applied
    pub fn load_config(&self) -> Result<Config, ScriptError> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::builtin()?,
        };

        if let Some(artifacts) = &self.artifacts {
            config.paths.artifacts = artifacts.clone();
        }
        if let Some(deployments) = &self.deployments {
            config.paths.deployments = deployments.clone();
        }

        Ok(config)
    }
}

/// The scripts that can be run
#[derive(Subcommand)]
pub enum Command {
    /// Deploy a contract behind a new upgradeable proxy
    Deploy(DeployArgs),
    /// Upgrade the implementation behind an existing proxy
    Upgrade(UpgradeArgs),
    /// Show the live implementation and admin of a deployed proxy
    Inspect(InspectArgs),
    /// Mark a deployed proxy as a proxy on the network's block explorer
    VerifyProxy(VerifyProxyArgs),
    /// Submit the source of a deployed contract to the network's block explorer
    Verify(VerifyArgs),
}

impl Command {
    /// Whether the command broadcasts transactions and so needs a signing key
    fn needs_signer(&self) -> bool {
        matches!(self, Command::Deploy(_) | Command::Upgrade(_))
    }

    /// Run the command against the selected network, printing its result to stdout
    pub async fn run(
        self,
        config: &Config,
        network: Option<&str>,
        priv_key: Option<&str>,
    ) -> Result<(), ScriptError> {
        let network = config.network(network)?;
        // The signing key is resolved before any RPC traffic
        let signer = match self.needs_signer() {
            true => Some(network.signing_key(priv_key)?),
            false => None,
        };

        info!(network = %network.name, url = %network.url, "selected network");
        let client = setup_client(network, signer).await?;
        let ctx = ScriptContext { config, network, client };

        match self {
            Command::Deploy(args) => {
                let outcome = deploy(args, &ctx).await?;
                println!("Contract deployed to: {}", outcome.proxy);
            }
            Command::Upgrade(args) => {
                let outcome = upgrade(args, &ctx).await?;
                println!("Contract Upgraded: {}", outcome.proxy);
            }
            Command::Inspect(args) => {
                inspect(args, &ctx).await?;
            }
            Command::VerifyProxy(args) => {
                let message = verify_proxy(args, &ctx).await?;
                println!("{message}");
            }
            Command::Verify(args) => {
                let message = verify(args, &ctx).await?;
                println!("{message}");
            }
        }

        Ok(())
    }
}

/// Deploy a contract behind a new upgradeable proxy.
///
/// Transparent proxies are a [`TransparentUpgradeableProxy`](https://docs.openzeppelin.com/contracts/5.x/api/proxy#transparent_proxy),
/// which itself deploys a `ProxyAdmin` contract owned by `--owner`. Upgrade calls can only
/// be made to the proxy through the `ProxyAdmin`.
///
/// UUPS proxies are a plain `ERC1967Proxy`; the implementation carries the upgrade logic.
#[derive(Args)]
pub struct DeployArgs {
    /// Name of the contract to deploy, optionally fully qualified (`path/File.sol:Name`)
    #[arg(long, default_value = DEFAULT_CONTRACT_NAME)]
    pub contract: String,

    /// Proxy pattern, detected from the contract ABI when omitted
    #[arg(short, long)]
    pub kind: Option<ProxyKind>,

    /// Initializer called through the proxy, `initialize` if the contract has one
    #[arg(short, long)]
    pub initializer: Option<String>,

    /// Argument of the initializer, repeated once per parameter
    #[arg(long = "init-arg")]
    pub init_args: Vec<String>,

    /// Owner of the proxy admin contract, defaults to the deployer
    #[arg(short, long)]
    pub owner: Option<Address>,
}

/// Upgrade the implementation behind an existing proxy
#[derive(Args)]
pub struct UpgradeArgs {
    /// Name of the contract whose new build is swapped in
    #[arg(long, default_value = DEFAULT_CONTRACT_NAME)]
    pub contract: String,

    /// Address of the proxy contract, read from the deployments file when omitted
    #[arg(long)]
    pub proxy: Option<Address>,

    /// Optional function of the new implementation to call during the upgrade
    #[arg(long)]
    pub call: Option<String>,

    /// Argument of the upgrade call, repeated once per parameter
    #[arg(long = "call-arg")]
    pub call_args: Vec<String>,
}

/// Show the live implementation and admin of a deployed proxy
#[derive(Args)]
pub struct InspectArgs {
    /// Name of the contract to look up in the deployments file
    #[arg(long, default_value = DEFAULT_CONTRACT_NAME)]
    pub contract: String,

    /// Address of the proxy contract, read from the deployments file when omitted
    #[arg(long)]
    pub proxy: Option<Address>,
}

/// Mark a deployed proxy as a proxy on the network's block explorer
#[derive(Args)]
pub struct VerifyProxyArgs {
    /// Name of the contract to look up in the deployments file
    #[arg(long, default_value = DEFAULT_CONTRACT_NAME)]
    pub contract: String,

    /// Address of the proxy contract, read from the deployments file when omitted
    #[arg(long)]
    pub proxy: Option<Address>,

    /// Implementation the explorer should find, defaults to the one currently behind the proxy
    #[arg(long)]
    pub expected_implementation: Option<Address>,
}

/// Submit the source of a deployed contract to the network's block explorer.
///
/// The standard JSON input comes from the Hardhat build info of the contract, or
/// is rebuilt from the solc metadata of a Foundry artifact.
#[derive(Args)]
pub struct VerifyArgs {
    /// Name of the contract to verify, optionally fully qualified (`path/File.sol:Name`)
    #[arg(long, default_value = DEFAULT_CONTRACT_NAME)]
    pub contract: String,

    /// Address of the deployed contract, defaults to the implementation behind the proxy
    #[arg(long)]
    pub address: Option<Address>,

    /// Address of the proxy contract, read from the deployments file when omitted
    #[arg(long)]
    pub proxy: Option<Address>,

    /// ABI-encoded constructor arguments of the deployed contract
    #[arg(long, default_value = "0x")]
    pub constructor_args: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The environment variable the unreachable network signs with, never set
    const UNSET_KEY_VAR: &str = "WALLET_FACTORY_TEST_NEVER_SET_KEY";

    /// The built-in configuration with the local network pointed at a closed port
    /// and signing with a key variable that is never set
    fn unreachable_config() -> Config {
        let mut config = Config::builtin().unwrap();
        let local = config.networks.get_mut("hardhat").unwrap();
        local.url = "http://127.0.0.1:1".parse().unwrap();
        local.accounts = UNSET_KEY_VAR.to_string();
        config
    }

    #[test]
    fn deploy_needs_no_arguments() {
        let cli = Cli::try_parse_from(["deploy-scripts", "deploy"]).unwrap();
        let Command::Deploy(args) = &cli.command else {
            panic!("expected the deploy command");
        };

        assert_eq!(args.contract, DEFAULT_CONTRACT_NAME);
        assert!(args.kind.is_none() && args.init_args.is_empty());
        assert!(cli.command.needs_signer());
    }

    #[test]
    fn upgrade_takes_a_proxy_parameter() {
        let cli = Cli::try_parse_from([
            "deploy-scripts",
            "--network",
            "hardhat",
            "upgrade",
            "--proxy",
            "0x9cdf42574e31ca0b0a9415ff4572dc50881dc023",
        ])
        .unwrap();
        let Command::Upgrade(args) = &cli.command else {
            panic!("expected the upgrade command");
        };

        assert_eq!(cli.network.as_deref(), Some("hardhat"));
        assert!(args.proxy.is_some());
        assert!(Cli::try_parse_from(["deploy-scripts", "upgrade", "--proxy", "0x1234"]).is_err());
    }

    #[test]
    fn read_only_commands_need_no_signer() {
        let cli = Cli::try_parse_from(["deploy-scripts", "inspect"]).unwrap();
        assert!(!cli.command.needs_signer());
    }

    #[test]
    fn path_overrides_apply_to_the_config() {
        let cli = Cli::try_parse_from([
            "deploy-scripts",
            "--artifacts",
            "out",
            "--deployments",
            "deployments/sepolia.json",
            "deploy",
        ])
        .unwrap();

        let config = cli.load_config().unwrap();
        assert_eq!(config.paths.artifacts, PathBuf::from("out"));
        assert_eq!(config.paths.deployments, PathBuf::from("deployments/sepolia.json"));
    }

    #[test]
    fn verify_defaults_to_the_proxied_implementation() {
        let cli = Cli::try_parse_from(["deploy-scripts", "verify"]).unwrap();
        let Command::Verify(args) = &cli.command else {
            panic!("expected the verify command");
        };

        assert_eq!(args.contract, DEFAULT_CONTRACT_NAME);
        assert!(args.address.is_none() && args.proxy.is_none());
        assert!(args.constructor_args.is_empty());
        assert!(!cli.command.needs_signer());
    }

    #[tokio::test]
    async fn deploy_without_credential_fails_before_rpc() {
        let config = unreachable_config();
        for command in ["deploy", "upgrade"] {
            let cli = Cli::try_parse_from(["deploy-scripts", command]).unwrap();
            let err = cli.command.run(&config, Some("hardhat"), None).await.unwrap_err();
            assert!(matches!(err, ScriptError::MissingCredential(_)), "{err}");
        }
    }

    #[tokio::test]
    async fn read_only_commands_reach_the_node_without_credential() {
        let config = unreachable_config();
        let cli = Cli::try_parse_from(["deploy-scripts", "inspect"]).unwrap();

        let err = cli.command.run(&config, Some("hardhat"), None).await.unwrap_err();
        assert!(matches!(err, ScriptError::ClientInitialization(_)), "{err}");
    }
}
