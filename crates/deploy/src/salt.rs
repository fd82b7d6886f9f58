//! Salt derivation for deployment addresses.

use alloy_core::primitives::{Address, B256, keccak256};
use rand::RngCore;

/// Produces a fresh 32-byte salt on every call.
///
/// Each salt is `keccak256(entropy ++ timestamp ++ sender ++ counter)`. The counter
/// makes consecutive salts of one generator distinct. This is best-effort uniqueness,
/// not a security primitive: whoever controls the entropy source can predict salts.
#[derive(Debug, Clone)]
pub struct SaltGenerator {
    entropy: B256,
    sender: Address,
    counter: u64,
}

impl SaltGenerator {
    /// Seed from the OS random number generator.
    pub fn new(sender: Address) -> Self {
        let mut entropy = B256::ZERO;
        rand::rng().fill_bytes(entropy.as_mut_slice());
        Self::with_entropy(sender, entropy)
    }

    /// Seed from an environment-provided value, such as a block's `prevrandao`.
    pub fn with_entropy(sender: Address, entropy: B256) -> Self {
        Self {
            entropy,
            sender,
            counter: 0,
        }
    }

    /// Number of salts produced so far.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn next_salt(&mut self) -> B256 {
        let timestamp = chrono::Utc::now().timestamp().max(0) as u64;
        self.next_at(timestamp)
    }

    fn next_at(&mut self, timestamp: u64) -> B256 {
        let mut preimage = [0u8; 32 + 8 + 20 + 8];
        preimage[..32].copy_from_slice(self.entropy.as_slice());
        preimage[32..40].copy_from_slice(&timestamp.to_be_bytes());
        preimage[40..60].copy_from_slice(self.sender.as_slice());
        preimage[60..].copy_from_slice(&self.counter.to_be_bytes());

        self.counter = self.counter.wrapping_add(1);

        keccak256(preimage)
    }
}

impl Iterator for SaltGenerator {
    type Item = B256;

    fn next(&mut self) -> Option<B256> {
        Some(self.next_salt())
    }
}
