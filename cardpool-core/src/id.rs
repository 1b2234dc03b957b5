use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::ops::Deref;

/// Serial identifier of a card asset, allocated sequentially by the registry.
pub type CardId = u64;

// AccountId identifies a party on the ledger: a user, the registry custody
// account, the sale vault or the auction pot. It is a 32 byte identifier,
// resembling a public key. The all-zero id is reserved as the invalid address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId([u8; 32]);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format as a hex string with a prefix of the first 6 bytes
        let prefix = hex::encode(&self.0[0..6]);
        write!(f, "acct:{}", prefix)
    }
}

impl Default for AccountId {
    fn default() -> Self {
        AccountId([0; 32])
    }
}

impl Deref for AccountId {
    type Target = [u8; 32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AccountId {
    pub fn new(id: [u8; 32]) -> Self {
        AccountId(id)
    }

    /// Create an AccountId from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        AccountId(bytes)
    }

    /// Get a reference to the internal bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// The reserved all-zero id, rejected wherever an address is validated.
    pub fn zero() -> Self {
        AccountId([0; 32])
    }

    /// Whether this is the reserved invalid address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 32]
    }

    /// Derive a deterministic AccountId from seed bytes.
    ///
    /// Service accounts (custody, sale vault, auction pot) are derived this
    /// way so they are stable across restarts.
    pub fn derive(seeds: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();

        // Domain separator
        hasher.update(b"CARDPOOL_Account");

        for seed in seeds {
            hasher.update(seed);
        }

        AccountId(hasher.finalize().into())
    }

    /// Create a random AccountId for testing
    pub fn random() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
            .to_le_bytes();
        let nonce = COUNTER.fetch_add(1, Ordering::Relaxed).to_le_bytes();

        Self::derive(&[&now, &nonce])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_id_is_invalid() {
        let zero = AccountId::zero();
        assert!(zero.is_zero());
        assert_eq!(zero, AccountId::default());

        let derived = AccountId::derive(&[b"custody"]);
        assert!(!derived.is_zero());
    }

    #[test]
    fn test_derive_is_deterministic() {
        let a = AccountId::derive(&[b"cardpool", b"custody"]);
        let b = AccountId::derive(&[b"cardpool", b"custody"]);
        assert_eq!(a, b);

        // Different seeds produce different ids
        let c = AccountId::derive(&[b"custody", b"cardpool"]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_random_ids_differ() {
        let a = AccountId::random();
        let b = AccountId::random();
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_prefix() {
        let id = AccountId::new([0xab; 32]);
        assert_eq!(format!("{}", id), "acct:abababababab");
    }
}
