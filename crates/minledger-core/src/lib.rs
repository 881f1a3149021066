use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod constants;
pub mod mine;

pub type Hash = [u8; 32];

pub(crate) fn sha256(bytes: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: u64,
    pub payload: Vec<String>,
    pub previous_hash: Hash,
    pub hash: Hash,
    pub nonce: u64,
}

impl Block {
    /// Build an unmined block: timestamp = now, nonce = 0, hash = initial digest.
    pub fn new(index: u64, payload: Vec<String>, previous_hash: Hash) -> Self {
        let mut block = Self {
            index,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_secs(),
            payload,
            previous_hash,
            hash: [0u8; 32],
            nonce: 0,
        };
        block.hash = block.compute_hash();
        block
    }

    /// Canonical digest preimage: index LE, timestamp LE, payload root,
    /// previous hash, nonce LE. Fixed length, so fields cannot bleed into
    /// one another.
    pub fn hash_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(8 + 8 + 32 + 32 + 8);
        bytes.extend_from_slice(&self.index.to_le_bytes());
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes.extend_from_slice(&payload_root(&self.payload));
        bytes.extend_from_slice(&self.previous_hash);
        bytes.extend_from_slice(&self.nonce.to_le_bytes());
        bytes
    }

    /// Re-derive the digest from the current field values. Never reads or
    /// mutates the stored `hash`.
    pub fn compute_hash(&self) -> Hash {
        sha256(&self.hash_bytes())
    }

    /// Stored hash matches the recomputed digest.
    pub fn is_consistent(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

/// Merkle root over the payload items. Leaves are the SHA-256 of each item's
/// JSON encoding; odd levels duplicate the last node. Empty payload yields a
/// zeroed root.
pub fn payload_root(items: &[String]) -> Hash {
    if items.is_empty() {
        return [0u8; 32];
    }
    let mut level: Vec<Hash> = items
        .iter()
        .map(|item| sha256(&serde_json::to_vec(item).unwrap()))
        .collect();

    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let (a, b) = if pair.len() == 2 {
                (pair[0], pair[1])
            } else {
                (pair[0], pair[0])
            };
            let mut combined = Vec::with_capacity(64);
            combined.extend_from_slice(&a);
            combined.extend_from_slice(&b);
            next.push(sha256(&combined));
        }
        level = next;
    }
    level[0]
}

pub mod pow {
    use super::{Block, Hash};
    use tracing::info;

    /// Mine the block by incrementing nonce until the hash has at least
    /// `difficulty` leading zero hex digits. Unbounded: wall-clock time grows
    /// exponentially with difficulty and there is no way to abort; use
    /// [`mine_bounded`] or [`crate::mine::mine_parallel`] when that matters.
    pub fn mine(mut block: Block, difficulty: u32) -> Block {
        loop {
            let hash = block.compute_hash();
            if count_leading_zero_nibbles(&hash) >= difficulty {
                block.hash = hash;
                info!(
                    "mined block {} with nonce {} and hash {}",
                    block.index,
                    block.nonce,
                    hex::encode(hash)
                );
                return block;
            }
            block.nonce = block.nonce.wrapping_add(1);
        }
    }

    /// Same search with an attempt cap. Returns `None` when the cap is
    /// exhausted without finding a qualifying nonce.
    pub fn mine_bounded(mut block: Block, difficulty: u32, max_attempts: u64) -> Option<Block> {
        for _ in 0..max_attempts {
            let hash = block.compute_hash();
            if count_leading_zero_nibbles(&hash) >= difficulty {
                block.hash = hash;
                info!(
                    "mined block {} with nonce {} and hash {}",
                    block.index,
                    block.nonce,
                    hex::encode(hash)
                );
                return Some(block);
            }
            block.nonce = block.nonce.wrapping_add(1);
        }
        None
    }

    /// Leading zero hex digits of the hash, high nibble first.
    pub fn count_leading_zero_nibbles(hash: &Hash) -> u32 {
        let mut total = 0u32;
        for b in hash {
            if *b == 0 {
                total += 2;
                continue;
            }
            if *b >> 4 == 0 {
                total += 1;
            }
            break;
        }
        total
    }
}

pub mod chain {
    use super::*;
    use crate::constants::{DEFAULT_DIFFICULTY, GENESIS_PAYLOAD, GENESIS_PREVIOUS_HASH};
    use thiserror::Error;
    use tracing::warn;

    #[derive(Debug, Error)]
    pub enum ChainError {
        /// Tip requested on a chain with zero blocks. Construction always
        /// seeds a genesis block, so this is defensive only.
        #[error("chain has no blocks")]
        Empty,
    }

    /// Append-only block sequence with a fixed proof-of-work difficulty.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Chain {
        blocks: Vec<Block>,
        difficulty: u32,
    }

    impl Chain {
        pub fn new() -> Self {
            Self::with_difficulty(DEFAULT_DIFFICULTY)
        }

        pub fn with_difficulty(difficulty: u32) -> Self {
            Self {
                blocks: vec![genesis_block()],
                difficulty,
            }
        }

        /// The last block in the chain.
        pub fn tip(&self) -> Result<&Block, ChainError> {
            self.blocks.last().ok_or(ChainError::Empty)
        }

        /// Mine a block carrying `payload` on top of the current tip and
        /// append it. Blocks until mining finds a qualifying nonce.
        pub fn append(&mut self, payload: Vec<String>) -> Result<&Block, ChainError> {
            let previous_hash = self.tip()?.hash;
            let candidate = Block::new(self.blocks.len() as u64, payload, previous_hash);
            let mined = pow::mine(candidate, self.difficulty);
            self.blocks.push(mined);
            self.blocks.last().ok_or(ChainError::Empty)
        }

        /// Left-to-right integrity scan from index 1: each block's stored
        /// hash must match its recomputed digest, and its previous-hash must
        /// match the predecessor's stored hash. Genesis has no predecessor
        /// and is not independently re-validated.
        pub fn verify(&self) -> bool {
            for pair in self.blocks.windows(2) {
                let (previous, current) = (&pair[0], &pair[1]);
                if !current.is_consistent() {
                    return false;
                }
                if current.previous_hash != previous.hash {
                    return false;
                }
            }
            true
        }

        /// Test/demo helper: overwrite a block's payload without re-hashing,
        /// leaving a state that `verify` must flag. Out-of-range index is a
        /// no-op.
        pub fn tamper_with(&mut self, index: usize, payload: Vec<String>) {
            if let Some(block) = self.blocks.get_mut(index) {
                warn!("block {index} payload overwritten without re-hashing");
                block.payload = payload;
            }
        }

        pub fn blocks(&self) -> &[Block] {
            &self.blocks
        }

        pub fn len(&self) -> usize {
            self.blocks.len()
        }

        pub fn is_empty(&self) -> bool {
            self.blocks.is_empty()
        }

        pub fn difficulty(&self) -> u32 {
            self.difficulty
        }
    }

    impl Default for Chain {
        fn default() -> Self {
            Self::new()
        }
    }

    /// The fixed first block: index 0, placeholder payload, zeroed
    /// previous-hash sentinel. Not mined; difficulty applies from index 1.
    pub fn genesis_block() -> Block {
        Block::new(0, vec![GENESIS_PAYLOAD.to_string()], GENESIS_PREVIOUS_HASH)
    }
}
