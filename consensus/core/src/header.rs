use crate::{Hash, hashing::BlockHasher};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub hash: Hash, // Cached hash
    pub version: u16,
    pub parent_hash: Hash,
    pub number: u64,
    pub timestamp: u64, // Timestamp is in milliseconds
    pub slot: u64,
    pub state_root: Hash,
    pub transactions_root: Hash,
}

impl Header {
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
        let mut header =
            Self { hash: Hash::ZERO, version, parent_hash, number, timestamp, slot, state_root, transactions_root };
        header.finalize();
        header
    }

    /// Finalizes the header and recomputes the header hash
    pub fn finalize(&mut self) {
        let mut hasher = BlockHasher::new();
        hasher
            .update(self.version.to_le_bytes())
            .update(self.parent_hash)
            .update(self.number.to_le_bytes())
            .update(self.timestamp.to_le_bytes())
            .update(self.slot.to_le_bytes())
            .update(self.state_root)
            .update(self.transactions_root);
        self.hash = hasher.finalize();
    }

    /// Builds a header with an externally injected hash, skipping the hashing round.
    /// Meant for tests and mocks.
    pub fn from_precomputed_hash(hash: Hash, parent_hash: Hash) -> Self {
        Self {
            hash,
            version: 0,
            parent_hash,
            number: 0,
            timestamp: 0,
            slot: 0,
            state_root: Hash::ZERO,
            transactions_root: Hash::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_hashing() {
        let header = Header::new(1, Hash::from_u64_word(7), 21, 1_715_000_000_000, 84, Hash::ZERO, Hash::ZERO);
        assert_ne!(header.hash, Hash::ZERO);

        let mut modified = header.clone();
        modified.slot += 1;
        modified.finalize();
        assert_ne!(header.hash, modified.hash);

        let mut unchanged = header.clone();
        unchanged.finalize();
        assert_eq!(header.hash, unchanged.hash);
    }

    #[test]
    fn test_from_precomputed_hash() {
        let hash = Hash::from_u64_word(0xA);
        let header = Header::from_precomputed_hash(hash, Hash::ZERO);
        assert_eq!(header.hash, hash);
    }
}
