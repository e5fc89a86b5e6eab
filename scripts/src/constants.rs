//! Constants used in the deployment scripts

use alloy::primitives::{b256, B256};

/// The contract deployed and upgraded when none is named on the command line
pub const DEFAULT_CONTRACT_NAME: &str = "MultiSigWalletFactory";

/// The artifact name of the transparent proxy. A compiled artifact of this name in the
/// artifacts directory takes precedence over the bundled creation code
pub const TRANSPARENT_PROXY_ARTIFACT: &str = "TransparentUpgradeableProxy";

/// The artifact name of the plain ERC1967 proxy used for UUPS implementations
pub const ERC1967_PROXY_ARTIFACT: &str = "ERC1967Proxy";

/// The creation code of the transparent proxy, ABI-compatible with
/// https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/transparent/TransparentUpgradeableProxy.sol
///
/// The constructor deploys a `ProxyAdmin` owned by `initialOwner`; see
/// `artifacts/TransparentUpgradeableProxy.asm` for the listing
pub const TRANSPARENT_PROXY_BYTECODE: &str =
    include_str!("../artifacts/TransparentUpgradeableProxy.bin");

/// The creation code of the plain ERC1967 proxy, ABI-compatible with
/// https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/ERC1967/ERC1967Proxy.sol
pub const ERC1967_PROXY_BYTECODE: &str = include_str!("../artifacts/ERC1967Proxy.bin");

/// The name of the initializer called through the proxy on deployment
pub const DEFAULT_INITIALIZER: &str = "initialize";

/// The number of confirmations to wait for on every transaction
pub const NUM_DEPLOY_CONFIRMATIONS: u64 = 1;

/// The storage slot containing the implementation address in an upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#logic-contract-address
pub const IMPLEMENTATION_STORAGE_SLOT: B256 =
    b256!("360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");

/// The storage slot containing the proxy admin contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#admin-address
pub const PROXY_ADMIN_STORAGE_SLOT: B256 =
    b256!("b53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103");

/// The number of bytes stored in a single storage slot
pub const NUM_BYTES_STORAGE_SLOT: usize = 32;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// The extension of a compilation artifact
pub const ARTIFACT_EXTENSION: &str = "json";

/// The suffix of the Hardhat debug files living next to each artifact
pub const DEBUG_ARTIFACT_SUFFIX: &str = ".dbg.json";

/// The artifacts subdirectory holding full solc build info, never a contract artifact
pub const BUILD_INFO_DIR: &str = "build-info";

/// The environment variable holding the deployer's private key on every built-in network
pub const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";

/// The environment variable holding the BscScan API key
pub const BSC_API_KEY_ENV_VAR: &str = "BSC_MAINNET_KEY";

/// The environment variable holding the PolygonScan API key
pub const POLYGON_API_KEY_ENV_VAR: &str = "POLYGON_API_KEY";

/// The environment variable holding the Sepolia Etherscan API key
pub const SEPOLIA_API_KEY_ENV_VAR: &str = "SEPOLIA_API_KEY";

/// The network selected when neither the CLI nor a config file names one
pub const DEFAULT_NETWORK: &str = "sepolia";

/// The Solidity compiler version the contracts are built with
pub const DEFAULT_SOLC_VERSION: &str = "0.8.26";

/// The number of optimizer runs the contracts are built with
pub const DEFAULT_OPTIMIZER_RUNS: u64 = 200;

/// The default path of the compilation artifacts directory
pub const DEFAULT_ARTIFACTS_PATH: &str = "artifacts";

/// The default path of the deployments file
pub const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments.json";

/// The number of times to poll the explorer for a proxy verification result
pub const EXPLORER_POLL_ATTEMPTS: usize = 10;

/// The delay between explorer polls, in milliseconds
pub const EXPLORER_POLL_INTERVAL_MS: u64 = 3_000;

/// The Etherscan V2 API, serving every supported chain selected by a `chainid` parameter
pub const ETHERSCAN_V2_API_URL: &str = "https://api.etherscan.io/v2/api";

/// The `codeformat` of a standard JSON input verification request
pub const STANDARD_JSON_CODE_FORMAT: &str = "solidity-standard-json-input";
