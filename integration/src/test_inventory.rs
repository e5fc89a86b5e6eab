//! Defines types and utilities for managing the inventory of integration tests

use std::{future::Future, pin::Pin, sync::Arc};

use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use eyre::Result;
use scripts::{
    commands::ScriptContext,
    config::{Config, NetworkProfile},
    utils::DeployClient,
};
use tempfile::TempDir;

/// The arguments provided to each integration test
#[derive(Clone)]
pub struct TestArgs {
    /// The configuration the scripts run with, pointing at a scratch deployments file
    pub config: Arc<Config>,
    /// The devnet network profile
    pub network: NetworkProfile,
    /// The devnet signer
    pub signer: PrivateKeySigner,
    /// A client connected to the devnet with the signer attached
    pub client: DeployClient,
    /// Holds the scratch directory of the deployments file for the duration of the run
    pub(crate) _scratch: Arc<TempDir>,
}

impl TestArgs {
    /// The context the deployment scripts run in
    pub fn context(&self) -> ScriptContext<'_> {
        ScriptContext { config: &self.config, network: &self.network, client: self.client.clone() }
    }

    /// The address of the devnet signer
    pub fn deployer(&self) -> Address {
        self.signer.address()
    }
}

/// The signature of an integration test
type TestFn = fn(TestArgs) -> Pin<Box<dyn Future<Output = Result<()>>>>;

/// A struct representing an integration test
pub struct IntegrationTest {
    /// The name of the test
    pub name: &'static str,
    /// The test function
    pub test_fn: TestFn,
}

// Collect the integration tests into an iterable
inventory::collect!(IntegrationTest);

/// Macro to register an integration test
#[macro_export]
macro_rules! integration_test {
    ($test_fn:ident) => {
        inventory::submit!($crate::test_inventory::IntegrationTest {
            name: stringify!($test_fn),
            test_fn: move |args| std::boxed::Box::pin($test_fn(args)),
        });
    };
}
