use thiserror::Error;
use vela_consensus_core::Hash;

#[derive(Clone, Debug, Error)]
pub enum RpcError {
    #[error("Not implemented")]
    NotImplemented,

    #[error("Connection to the node is closed")]
    ConnectionClosed,

    #[error("Header {0} is unknown to the node")]
    UnknownBlock(Hash),

    #[error("State for block {0} has been pruned")]
    StatePruned(Hash),

    #[error("{0}")]
    General(String),
}

impl From<String> for RpcError {
    fn from(value: String) -> Self {
        RpcError::General(value)
    }
}

impl From<&str> for RpcError {
    fn from(value: &str) -> Self {
        RpcError::General(value.to_string())
    }
}

pub type RpcResult<T> = std::result::Result<T, crate::RpcError>;
