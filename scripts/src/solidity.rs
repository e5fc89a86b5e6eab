//! Definitions of Solidity functions called during deployment and upgrades

use alloy::sol;

sol! {
    /// `ProxyAdmin` entrypoint upgrading a transparent proxy (OpenZeppelin v5)
    function upgradeAndCall(address proxy, address implementation, bytes memory data) external payable;

    /// UUPS entrypoint exposed through the proxy by the current implementation
    function upgradeToAndCall(address newImplementation, bytes memory data) external payable;

    /// The owner of a `ProxyAdmin`
    function owner() external view returns (address);
}
