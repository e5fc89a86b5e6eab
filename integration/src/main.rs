//! Integration tests for the deployment scripts. These assume that a devnet is already running
//! locally and that the contracts have been compiled into the artifacts directory.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(unsafe_code)]

use std::{sync::Arc, time::Instant};

use clap::Parser;
use cli::Cli;
use colored::Colorize;
use constants::DEVNET_NETWORK;
use eyre::{eyre, Result};
use itertools::Itertools;
use scripts::{config::Config, utils::setup_client};
use test_inventory::{IntegrationTest, TestArgs};
use tracing_subscriber::EnvFilter;

mod cli;
mod constants;
mod test_inventory;
mod tests;

/// Run the registered integration tests against the devnet
#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let args = setup(&cli).await?;

    let tests = inventory::iter::<IntegrationTest>
        .into_iter()
        .filter(|test| cli.test.as_deref().map_or(true, |filter| test.name.contains(filter)))
        .sorted_by_key(|test| test.name)
        .collect_vec();

    let mut failures = Vec::new();
    for test in tests.iter() {
        let start = Instant::now();
        let res = (test.test_fn)(args.clone()).await;
        let elapsed = format!("({:.2?})", start.elapsed()).dimmed();

        match res {
            Ok(()) => println!("{} {} {elapsed}", "PASS".green().bold(), test.name),
            Err(e) => {
                println!("{} {} {elapsed}\n    {e:?}", "FAIL".red().bold(), test.name);
                failures.push(test.name);
            }
        }
    }

    let summary = format!("{} passed, {} failed", tests.len() - failures.len(), failures.len());
    if failures.is_empty() {
        println!("\n{}", summary.green());
        Ok(())
    } else {
        println!("\n{}", summary.red());
        Err(eyre!("failed tests: {}", failures.join(", ")))
    }
}

/// Build the arguments shared by every test: the devnet profile, a client for it, and a
/// configuration writing deployments to a scratch directory
async fn setup(cli: &Cli) -> Result<TestArgs> {
    let scratch = tempfile::tempdir()?;

    let mut config = Config::builtin()?;
    config.paths.artifacts = cli.artifacts.clone();
    config.paths.deployments = scratch.path().join("deployments.json");

    let mut network = config.network(Some(DEVNET_NETWORK))?.clone();
    network.url = cli.rpc_url.clone();
    network.chain_id = cli.chain_id;

    let signer = network.signing_key(Some(cli.priv_key.as_str()))?;
    let client = setup_client(&network, Some(signer.clone())).await?;

    Ok(TestArgs {
        config: Arc::new(config),
        network,
        signer,
        client,
        _scratch: Arc::new(scratch),
    })
}
