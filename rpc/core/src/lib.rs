//! # RPC Core
//!
//! This crate provides the foundational primitives of the Vela node RPC boundary:
//! the [`RpcApi`](api::rpc::RpcApi) capability trait implemented by concrete
//! transport clients, the [`QueryAt`](api::rpc::QueryAt) point-in-time state
//! handle, and the data structures crossing that boundary.
//!

pub mod api;
pub mod error;
pub mod model;

pub use api::rpc::{DynQueryAt, DynRpcApi, HeadsReceiver, QueryAt, RpcApi};
pub use error::{RpcError, RpcResult};
pub use model::*;
