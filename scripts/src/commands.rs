//! Implementations of the various deployment scripts

use alloy::{
    primitives::{Address, Bytes},
    sol_types::{SolCall, SolValue},
};
use tracing::{info, warn};

use crate::{
    artifacts::{contract_name, proxy_creation_code, resolve_artifact},
    cli::{DeployArgs, InspectArgs, UpgradeArgs, VerifyArgs, VerifyProxyArgs},
    config::{Config, NetworkProfile},
    constants::DEFAULT_INITIALIZER,
    deployments::{DeploymentRecord, Deployments},
    errors::ScriptError,
    explorer::{
        address_link, resolve_explorer, verify_proxy as submit_proxy_verification,
        verify_source as submit_source_verification,
    },
    solidity::{upgradeAndCallCall, upgradeToAndCallCall},
    types::{DeployOutcome, ProxyKind, ProxyState, UpgradeOutcome},
    utils::{
        deploy_bytecode, ensure_has_code, proxy_admin_owner, proxy_state, send_call, DeployClient,
    },
};

/// Everything a script needs: the configuration, the selected network, and a client for it
pub struct ScriptContext<'a> {
    /// The process configuration
    pub config: &'a Config,
    /// The selected network
    pub network: &'a NetworkProfile,
    /// A client connected to the selected network
    pub client: DeployClient,
}

impl ScriptContext<'_> {
    /// Resolve the proxy to act on: the explicit address, or the one recorded for the contract
    fn proxy_address(
        &self,
        explicit: Option<Address>,
        contract: &str,
    ) -> Result<Address, ScriptError> {
        match explicit {
            Some(proxy) => Ok(proxy),
            None => Deployments::load(&self.config.paths.deployments)?.proxy_address(
                &self.network.name,
                contract_name(contract),
                self.client.chain_id,
            ),
        }
    }
}

/// Deploy the named contract behind a new upgradeable proxy.
///
/// Deploys the implementation, then the proxy pointing at it with the initializer
/// calldata, and records the deployment under the contract's name. Every call
/// creates a fresh proxy.
pub async fn deploy(
    args: DeployArgs,
    ctx: &ScriptContext<'_>,
) -> Result<DeployOutcome, ScriptError> {
    let artifacts_dir = &ctx.config.paths.artifacts;
    let artifact = resolve_artifact(artifacts_dir, &args.contract)?;
    artifact.check_compiler(&ctx.config.solidity)?;

    let kind = args.kind.unwrap_or_else(|| artifact.proxy_kind());
    if kind == ProxyKind::Uups && artifact.proxy_kind() != ProxyKind::Uups {
        return Err(ScriptError::ArtifactParsing(format!(
            "`{}` has no UUPS upgrade entrypoint, it cannot sit behind a UUPS proxy",
            args.contract
        )));
    }

    let proxy_code = proxy_creation_code(artifacts_dir, kind)?;

    let init_data = artifact.initializer_calldata(
        args.initializer.as_deref(),
        DEFAULT_INITIALIZER,
        &args.init_args,
    )?;

    let deployer = ctx.client.deployer()?;
    info!(
        contract = %artifact.name,
        network = %ctx.network.name,
        %kind,
        %deployer,
        "deploying implementation"
    );
    let implementation = deploy_bytecode(&ctx.client, artifact.bytecode.clone()).await?;

    let constructor_args = match kind {
        ProxyKind::Transparent => {
            let owner = args.owner.unwrap_or(deployer);
            (implementation, owner, init_data).abi_encode_params()
        }
        ProxyKind::Uups => (implementation, init_data).abi_encode_params(),
    };
    let creation_code = [proxy_code.as_ref(), constructor_args.as_slice()].concat();

    info!(%implementation, "deploying proxy");
    let proxy = deploy_bytecode(&ctx.client, creation_code.into()).await?;

    let state = proxy_state(&ctx.client, proxy).await?;
    if state.implementation != implementation {
        return Err(ScriptError::ContractDeployment(format!(
            "proxy {proxy} points at {}, expected {implementation}",
            state.implementation
        )));
    }

    let outcome = DeployOutcome {
        chain_id: ctx.client.chain_id,
        proxy,
        implementation,
        admin: (kind == ProxyKind::Transparent).then_some(state.admin),
        kind,
    };
    info!(%proxy, %implementation, admin = ?outcome.admin, "proxy deployed");

    let deployments_path = &ctx.config.paths.deployments;
    let mut deployments = Deployments::load(deployments_path)?;
    deployments.insert(
        &ctx.network.name,
        &artifact.name,
        DeploymentRecord {
            chain_id: outcome.chain_id,
            proxy,
            implementation,
            admin: outcome.admin,
            kind,
        },
    );
    deployments.save(deployments_path)?;

    Ok(outcome)
}

/// Upgrade an existing proxy to a freshly deployed implementation of the named contract.
///
/// The proxy address is unchanged; the implementation slot must point at the new
/// implementation once the upgrade is confirmed.
pub async fn upgrade(
    args: UpgradeArgs,
    ctx: &ScriptContext<'_>,
) -> Result<UpgradeOutcome, ScriptError> {
    let artifact = resolve_artifact(&ctx.config.paths.artifacts, &args.contract)?;
    artifact.check_compiler(&ctx.config.solidity)?;

    let proxy = ctx.proxy_address(args.proxy, &artifact.name)?;
    let before = proxy_state(&ctx.client, proxy).await?;
    let kind = before.kind();
    if kind == ProxyKind::Uups && artifact.proxy_kind() != ProxyKind::Uups {
        return Err(ScriptError::UpgradeNotApplied(format!(
            "new `{}` has no UUPS upgrade entrypoint, the proxy would lose its upgrade path",
            args.contract
        )));
    }

    let data = match &args.call {
        Some(function) => artifact.encode_call(function, &args.call_args)?,
        None => Bytes::new(),
    };

    info!(
        contract = %artifact.name,
        network = %ctx.network.name,
        %proxy,
        %kind,
        previous = %before.implementation,
        "deploying new implementation"
    );
    let implementation = deploy_bytecode(&ctx.client, artifact.bytecode.clone()).await?;

    let (target, calldata) = match kind {
        ProxyKind::Transparent => {
            let call = upgradeAndCallCall { proxy, implementation, data };
            (before.admin, call.abi_encode())
        }
        ProxyKind::Uups => {
            let call = upgradeToAndCallCall { newImplementation: implementation, data };
            (proxy, call.abi_encode())
        }
    };
    send_call(&ctx.client, target, calldata.into()).await?;

    let after = proxy_state(&ctx.client, proxy).await?;
    if after.implementation != implementation {
        return Err(ScriptError::UpgradeNotApplied(format!(
            "proxy {proxy} points at {}, expected {implementation}",
            after.implementation
        )));
    }
    info!(%proxy, %implementation, "proxy upgraded");

    let deployments_path = &ctx.config.paths.deployments;
    let mut deployments = Deployments::load(deployments_path)?;
    let network = &ctx.network.name;
    let recorded = deployments.set_implementation(network, &artifact.name, implementation);
    if recorded.is_none() {
        warn!(%proxy, "upgraded a proxy with no deployment record, recording it now");
        deployments.insert(
            network,
            &artifact.name,
            DeploymentRecord {
                chain_id: ctx.client.chain_id,
                proxy,
                implementation,
                admin: (kind == ProxyKind::Transparent).then_some(after.admin),
                kind,
            },
        );
    }
    deployments.save(deployments_path)?;

    Ok(UpgradeOutcome { proxy, previous_implementation: before.implementation, implementation })
}

/// Read the live state of a deployed proxy and print it
pub async fn inspect(
    args: InspectArgs,
    ctx: &ScriptContext<'_>,
) -> Result<ProxyState, ScriptError> {
    let proxy = ctx.proxy_address(args.proxy, &args.contract)?;
    let state = proxy_state(&ctx.client, proxy).await?;

    println!("Proxy:          {}", state.proxy);
    println!("Kind:           {}", state.kind());
    println!("Implementation: {}", state.implementation);
    if state.kind() == ProxyKind::Transparent {
        let owner = proxy_admin_owner(&ctx.client, state.admin).await?;
        println!("Proxy admin:    {}", state.admin);
        println!("Admin owner:    {owner}");
    }

    match resolve_explorer(ctx.config, ctx.network) {
        Ok(explorer) => println!("Explorer:       {}", address_link(&explorer, proxy)?),
        Err(e) => info!("no explorer link: {e}"),
    }

    Ok(state)
}

/// Mark a deployed proxy as a proxy on the network's block explorer
pub async fn verify_proxy(
    args: VerifyProxyArgs,
    ctx: &ScriptContext<'_>,
) -> Result<String, ScriptError> {
    let api_key = ctx.config.explorer_api_key(&ctx.network.name)?;
    let explorer = resolve_explorer(ctx.config, ctx.network)?;

    let proxy = ctx.proxy_address(args.proxy, &args.contract)?;
    let state = proxy_state(&ctx.client, proxy).await?;
    let expected = args.expected_implementation.unwrap_or(state.implementation);

    submit_proxy_verification(&explorer, &api_key, proxy, Some(expected)).await
}

/// Submit the source of a deployed contract to the network's block explorer.
///
/// Verifies the implementation behind the contract's proxy unless an address is given.
/// Returns the explorer's message.
pub async fn verify(args: VerifyArgs, ctx: &ScriptContext<'_>) -> Result<String, ScriptError> {
    let api_key = ctx.config.explorer_api_key(&ctx.network.name)?;
    let explorer = resolve_explorer(ctx.config, ctx.network)?;

    let artifacts_dir = &ctx.config.paths.artifacts;
    let artifact = resolve_artifact(artifacts_dir, &args.contract)?;
    let input = artifact.verification_input(artifacts_dir)?;

    let address = match args.address {
        Some(address) => {
            ensure_has_code(&ctx.client, address).await?;
            address
        }
        None => {
            let proxy = ctx.proxy_address(args.proxy, &artifact.name)?;
            proxy_state(&ctx.client, proxy).await?.implementation
        }
    };

    info!(
        contract = %input.contract_name,
        compiler = %input.compiler_version,
        %address,
        "submitting source verification"
    );
    let message =
        submit_source_verification(&explorer, &api_key, address, &input, &args.constructor_args)
            .await?;
    let link = address_link(&explorer, address)?;
    info!(%link, "source verified");

    Ok(message)
}
