//! Scripts for deploying and upgrading the wallet factory behind an upgradeable proxy.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod deployments;
pub mod errors;
pub mod explorer;
mod solidity;
pub mod types;
pub mod utils;
