use crate::Hash;
use blake2b_simd::{Params, State};

/// Domain key separating block-header hashing from any other use of blake2b
const BLOCK_HASH_DOMAIN: &[u8] = b"VelaBlockHash";

/// Keyed blake2b-256 hasher for block headers
#[derive(Clone)]
pub struct BlockHasher(State);

impl BlockHasher {
    pub fn new() -> Self {
        Self(Params::new().hash_length(32).key(BLOCK_HASH_DOMAIN).to_state())
    }

    pub fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self {
        self.0.update(data.as_ref());
        self
    }

    pub fn finalize(self) -> Hash {
        let hash = self.0.finalize();
        Hash::from_bytes(hash.as_bytes().try_into().expect("this hasher outputs 32 bytes"))
    }
}

impl Default for BlockHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hasher_determinism() {
        let mut hasher = BlockHasher::new();
        hasher.update(b"vela").update(42u64.to_le_bytes());
        let first = hasher.finalize();

        let mut hasher = BlockHasher::new();
        hasher.update(b"vela").update(42u64.to_le_bytes());
        assert_eq!(first, hasher.finalize());

        let mut hasher = BlockHasher::new();
        hasher.update(b"vela").update(43u64.to_le_bytes());
        assert_ne!(first, hasher.finalize());
    }
}
