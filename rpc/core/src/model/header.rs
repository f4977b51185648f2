use serde::{Deserialize, Serialize};
use vela_consensus_core::{Hash, header::Header};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcHeader {
    pub hash: Hash, // Cached hash
    pub version: u16,
    pub parent_hash: Hash,
    pub number: u64,
    pub timestamp: u64, // Timestamp is in milliseconds
    pub slot: u64,
    pub state_root: Hash,
    pub transactions_root: Hash,

    /// The hash this header was anchored to when it was fetched, recorded by
    /// derived accessors right before attaching any state lookup to it
    pub created_at_hash: Option<Hash>,
}

impl RpcHeader {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        version: u16,
        parent_hash: Hash,
        number: u64,
        timestamp: u64,
        slot: u64,
        state_root: Hash,
        transactions_root: Hash,
    ) -> Self {
        let header = Header::new(version, parent_hash, number, timestamp, slot, state_root, transactions_root);
        (&header).into()
    }
}

impl From<&Header> for RpcHeader {
    fn from(header: &Header) -> Self {
        Self {
            hash: header.hash,
            version: header.version,
            parent_hash: header.parent_hash,
            number: header.number,
            timestamp: header.timestamp,
            slot: header.slot,
            state_root: header.state_root,
            transactions_root: header.transactions_root,
            created_at_hash: None,
        }
    }
}

impl From<&RpcHeader> for Header {
    fn from(header: &RpcHeader) -> Self {
        Self {
            hash: header.hash,
            version: header.version,
            parent_hash: header.parent_hash,
            number: header.number,
            timestamp: header.timestamp,
            slot: header.slot,
            state_root: header.state_root,
            transactions_root: header.transactions_root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_conversion() {
        let header = Header::new(1, Hash::from_u64_word(3), 7, 1_715_000_000_000, 14, Hash::ZERO, Hash::from_u64_word(9));
        let rpc_header: RpcHeader = (&header).into();
        assert_eq!(rpc_header.hash, header.hash);
        assert_eq!(rpc_header.created_at_hash, None);

        let roundtrip: Header = (&rpc_header).into();
        assert_eq!(roundtrip, header);
    }

    #[test]
    fn test_rpc_header_serde() {
        let rpc_header = RpcHeader::new(1, Hash::from_u64_word(3), 7, 1_715_000_000_000, 14, Hash::ZERO, Hash::ZERO);
        let encoded = serde_json::to_string(&rpc_header).unwrap();
        assert!(encoded.contains("\"createdAtHash\":null"));
        let decoded: RpcHeader = serde_json::from_str(&encoded).unwrap();
        assert_eq!(rpc_header, decoded);
    }
}
