//! This module contains RPC-specific data structures
//! used in RPC methods.

pub mod header;

pub use header::*;

pub type RpcHash = vela_consensus_core::Hash;
pub type RpcAccountId = vela_consensus_core::AccountId;
pub type RpcValidatorSet = vela_consensus_core::ValidatorSet;
