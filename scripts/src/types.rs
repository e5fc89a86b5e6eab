//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use alloy::primitives::Address;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The possible upgradeable proxy patterns
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyKind {
    /// A `TransparentUpgradeableProxy`, upgraded through its `ProxyAdmin`
    Transparent,
    /// An `ERC1967Proxy` in front of a UUPS implementation, upgraded through the proxy itself
    Uups,
}

impl Display for ProxyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyKind::Transparent => write!(f, "transparent"),
            ProxyKind::Uups => write!(f, "uups"),
        }
    }
}

/// The result of a successful proxy deployment
#[derive(Clone, Debug)]
pub struct DeployOutcome {
    /// The chain the proxy lives on
    pub chain_id: u64,
    /// The address of the proxy, stable across upgrades
    pub proxy: Address,
    /// The address of the implementation behind the proxy
    pub implementation: Address,
    /// The address of the proxy admin, for transparent proxies
    pub admin: Option<Address>,
    /// The proxy pattern used
    pub kind: ProxyKind,
}

/// The result of a successful proxy upgrade
#[derive(Clone, Debug)]
pub struct UpgradeOutcome {
    /// The address of the proxy, unchanged by the upgrade
    pub proxy: Address,
    /// The implementation the proxy pointed at before the upgrade
    pub previous_implementation: Address,
    /// The implementation the proxy points at now
    pub implementation: Address,
}

/// The live state of a deployed proxy
#[derive(Clone, Debug)]
pub struct ProxyState {
    /// The address of the proxy
    pub proxy: Address,
    /// The implementation currently behind the proxy
    pub implementation: Address,
    /// The proxy admin, zero for UUPS proxies
    pub admin: Address,
}

impl ProxyState {
    /// The proxy pattern implied by the admin slot
    pub fn kind(&self) -> ProxyKind {
        if self.admin.is_zero() {
            ProxyKind::Uups
        } else {
            ProxyKind::Transparent
        }
    }
}
