//! Utilities for the deployment scripts: client setup, transactions, and proxy storage reads

use alloy::{
    network::{Ethereum, EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
    sol_types::SolCall,
};
use tracing::{debug, info};

use crate::{
    config::{GasLimit, GasPolicy, NetworkProfile},
    constants::{
        IMPLEMENTATION_STORAGE_SLOT, NUM_BYTES_ADDRESS, NUM_BYTES_STORAGE_SLOT,
        NUM_DEPLOY_CONFIRMATIONS, PROXY_ADMIN_STORAGE_SLOT,
    },
    errors::ScriptError,
    solidity::ownerCall,
    types::ProxyState,
};

/// The provider type used by the scripts
pub type DeployProvider = DynProvider<Ethereum>;

/// An RPC client bound to a single network
#[derive(Clone)]
pub struct DeployClient {
    /// The underlying provider, signing with the deployer's key if one was given
    pub provider: DeployProvider,
    /// The chain ID the node reported
    pub chain_id: u64,
    /// The gas policy applied to every transaction
    pub gas: GasPolicy,
    /// The address transactions are sent from
    deployer: Option<Address>,
}

impl DeployClient {
    /// The address transactions are sent from
    pub fn deployer(&self) -> Result<Address, ScriptError> {
        self.deployer.ok_or_else(|| {
            ScriptError::ClientInitialization("client does not have a signer attached".to_string())
        })
    }
}

/// Sets up the client with which to talk to the given network.
///
/// Without a signer the client can only read chain state. The node must report
/// the chain ID the profile names.
pub async fn setup_client(
    network: &NetworkProfile,
    signer: Option<PrivateKeySigner>,
) -> Result<DeployClient, ScriptError> {
    let deployer = signer.as_ref().map(PrivateKeySigner::address);
    let provider = match signer {
        Some(signer) => DynProvider::new(
            ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_http(network.url.clone()),
        ),
        None => DynProvider::new(ProviderBuilder::new().connect_http(network.url.clone())),
    };

    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(format!("{}: {e}", network.url)))?;
    if chain_id != network.chain_id {
        return Err(ScriptError::ChainIdMismatch { expected: network.chain_id, actual: chain_id });
    }

    debug!(network = %network.name, chain_id, ?deployer, "connected to node");
    Ok(DeployClient { provider, chain_id, gas: network.gas, deployer })
}

/// Apply a network's gas policy to a transaction
pub fn apply_gas_policy(tx: TransactionRequest, gas: &GasPolicy) -> TransactionRequest {
    let tx = match gas.gas {
        GasLimit::Auto => tx,
        GasLimit::Fixed(limit) => tx.with_gas_limit(limit),
    };

    match gas.gas_price {
        Some(price) => tx.with_gas_price(u128::from(price)),
        None => tx,
    }
}

/// Send a transaction and block until it is confirmed, failing on revert
async fn send_and_confirm(
    client: &DeployClient,
    tx: TransactionRequest,
) -> Result<TransactionReceipt, String> {
    let tx = apply_gas_policy(tx, &client.gas);
    let pending = client.provider.send_transaction(tx).await.map_err(|e| e.to_string())?;

    let tx_hash = *pending.tx_hash();
    debug!(%tx_hash, "waiting for confirmation");
    let receipt = pending
        .with_required_confirmations(NUM_DEPLOY_CONFIRMATIONS)
        .get_receipt()
        .await
        .map_err(|e| e.to_string())?;

    if !receipt.status() {
        return Err(format!("transaction {tx_hash} reverted"));
    }

    Ok(receipt)
}

/// Deploy the given creation code, returning the address of the new contract
pub async fn deploy_bytecode(client: &DeployClient, code: Bytes) -> Result<Address, ScriptError> {
    let tx = TransactionRequest::default().with_from(client.deployer()?).with_deploy_code(code);
    let receipt = send_and_confirm(client, tx).await.map_err(ScriptError::ContractDeployment)?;

    let address = receipt.contract_address.ok_or_else(|| {
        ScriptError::ContractDeployment(format!(
            "receipt of {} has no contract address",
            receipt.transaction_hash
        ))
    })?;

    info!(%address, tx_hash = %receipt.transaction_hash, "contract deployed");
    Ok(address)
}

/// Call a contract method in a transaction, blocking until it is confirmed
pub async fn send_call(
    client: &DeployClient,
    to: Address,
    calldata: Bytes,
) -> Result<TransactionReceipt, ScriptError> {
    let tx = TransactionRequest::default()
        .with_from(client.deployer()?)
        .with_to(to)
        .with_input(calldata);
    let receipt = send_and_confirm(client, tx).await.map_err(ScriptError::ContractInteraction)?;

    info!(%to, tx_hash = %receipt.transaction_hash, "transaction confirmed");
    Ok(receipt)
}

/// Fail unless there is contract code at the given address
pub async fn ensure_has_code(client: &DeployClient, address: Address) -> Result<(), ScriptError> {
    let code = client
        .provider
        .get_code_at(address)
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    if code.is_empty() {
        return Err(ScriptError::NoCode(address.to_string()));
    }

    Ok(())
}

/// Read an address stored in the low bytes of a storage slot
pub async fn read_address_slot(
    client: &DeployClient,
    address: Address,
    slot: B256,
) -> Result<Address, ScriptError> {
    let value = client
        .provider
        .get_storage_at(address, U256::from_be_bytes(slot.0))
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    Ok(address_from_word(value))
}

/// The address held in the low bytes of a storage word
pub fn address_from_word(word: U256) -> Address {
    let bytes = word.to_be_bytes::<NUM_BYTES_STORAGE_SLOT>();
    Address::from_slice(&bytes[NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..])
}

/// Read the EIP-1967 slots of a proxy.
///
/// Fails if there is no code at the address or the implementation slot is empty.
pub async fn proxy_state(client: &DeployClient, proxy: Address) -> Result<ProxyState, ScriptError> {
    ensure_has_code(client, proxy).await?;

    let implementation = read_address_slot(client, proxy, IMPLEMENTATION_STORAGE_SLOT).await?;
    if implementation.is_zero() {
        return Err(ScriptError::NotAProxy(format!(
            "{proxy} has an empty EIP-1967 implementation slot"
        )));
    }

    // This is the recommended way to get the proxy admin address:
    // https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/ERC1967/ERC1967Utils.sol#L104-L106
    let admin = read_address_slot(client, proxy, PROXY_ADMIN_STORAGE_SLOT).await?;

    Ok(ProxyState { proxy, implementation, admin })
}

/// Read the owner of a `ProxyAdmin`
pub async fn proxy_admin_owner(
    client: &DeployClient,
    admin: Address,
) -> Result<Address, ScriptError> {
    let tx = TransactionRequest::default().with_to(admin).with_input(ownerCall {}.abi_encode());
    let output = client
        .provider
        .call(tx)
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    ownerCall::abi_decode_returns(&output)
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    #[test]
    fn slot_words_decode_to_addresses() {
        let admin = address!("Cf7Ed3AccA5a467e9e704C703E8D87F634fB0Fc9");
        let mut word = [0u8; NUM_BYTES_STORAGE_SLOT];
        word[NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..].copy_from_slice(admin.as_slice());

        assert_eq!(address_from_word(U256::from_be_bytes(word)), admin);
        assert!(address_from_word(U256::ZERO).is_zero());
    }

    #[test]
    fn eip1967_slots_match_their_derivation() {
        use alloy::primitives::keccak256;

        let derive = |label: &str| {
            let slot = U256::from_be_bytes(keccak256(label).0) - U256::from(1);
            B256::from(slot.to_be_bytes::<NUM_BYTES_STORAGE_SLOT>())
        };

        assert_eq!(derive("eip1967.proxy.implementation"), IMPLEMENTATION_STORAGE_SLOT);
        assert_eq!(derive("eip1967.proxy.admin"), PROXY_ADMIN_STORAGE_SLOT);
    }

    #[test]
    fn fixed_gas_policy_is_applied() {
        let policy = GasPolicy { gas: GasLimit::Fixed(3_000_000), gas_price: Some(5) };
        let tx = apply_gas_policy(TransactionRequest::default(), &policy);
        assert_eq!(tx.gas, Some(3_000_000));
        assert_eq!(tx.gas_price, Some(5));

        let tx = apply_gas_policy(TransactionRequest::default(), &GasPolicy::default());
        assert_eq!(tx.gas, None);
        assert_eq!(tx.gas_price, None);
    }
}
