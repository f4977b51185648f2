use thiserror::Error;
use vela_rpc_core::RpcError;

#[derive(Clone, Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("channel receive error")]
    ChannelRecvError,
}

pub type Result<T> = std::result::Result<T, Error>;
