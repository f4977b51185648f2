use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

pub const ACCOUNT_ID_SIZE: usize = 32;

/// Public identity of an on-chain account, notably of block-producing validators
#[derive(PartialEq, Eq, Clone, Copy, Hash, Default, PartialOrd, Ord)]
pub struct AccountId([u8; ACCOUNT_ID_SIZE]);

/// The resolved validator roster as of some block
pub type ValidatorSet = Arc<Vec<AccountId>>;

impl AccountId {
    pub const fn from_bytes(bytes: [u8; ACCOUNT_ID_SIZE]) -> Self {
        AccountId(bytes)
    }

    pub const fn as_bytes(&self) -> [u8; ACCOUNT_ID_SIZE] {
        self.0
    }

    /// Builds an account id with the given `word` occupying the trailing 8 bytes (little-endian).
    /// Meant mostly for tests and simulations.
    pub const fn from_u64_word(word: u64) -> Self {
        let mut bytes = [0u8; ACCOUNT_ID_SIZE];
        let word_bytes = word.to_le_bytes();
        let mut i = 0;
        while i < 8 {
            bytes[ACCOUNT_ID_SIZE - 8 + i] = word_bytes[i];
            i += 1;
        }
        AccountId(bytes)
    }
}

impl AsRef<[u8]> for AccountId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut hex = [0u8; ACCOUNT_ID_SIZE * 2];
        let hex = faster_hex::hex_encode(&self.0, &mut hex).expect("The output is exactly twice the size of the input");
        f.write_str(hex)
    }
}

impl Debug for AccountId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl FromStr for AccountId {
    type Err = faster_hex::Error;

    fn from_str(account_str: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; ACCOUNT_ID_SIZE];
        faster_hex::hex_decode(account_str.as_bytes(), &mut bytes)?;
        Ok(AccountId(bytes))
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let account_str = String::deserialize(deserializer)?;
        AccountId::from_str(&account_str).map_err(serde::de::Error::custom)
    }
}
