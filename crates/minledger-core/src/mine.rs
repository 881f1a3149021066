use crate::pow::count_leading_zero_nibbles;
use crate::{sha256, Block, Hash};
use rayon::prelude::*;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Mines a block by searching nonces in parallel until the header hash has at
/// least `difficulty` leading zero hex digits, first-to-find wins. Each worker
/// hashes a private copy of the preimage; only the winning nonce is kept.
/// Returns the mined Block (with nonce and hash set) and its hash.
pub fn mine_parallel(
    index: u64,
    payload: Vec<String>,
    previous_hash: Hash,
    difficulty: u32,
) -> (Block, Hash) {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs();

    let mut template = Block {
        index,
        timestamp,
        payload,
        previous_hash,
        hash: [0u8; 32],
        nonce: 0,
    };

    // Everything but the trailing nonce bytes is fixed across attempts.
    let preimage = template.hash_bytes();
    let prefix = &preimage[..preimage.len() - 8];

    let found = (0u64..u64::MAX)
        .into_par_iter()
        .find_any(|nonce| {
            let mut bytes = prefix.to_vec();
            bytes.extend_from_slice(&nonce.to_le_bytes());
            count_leading_zero_nibbles(&sha256(&bytes)) >= difficulty
        })
        .expect("nonce space exhausted (practically impossible)");

    template.nonce = found;
    let final_hash = template.compute_hash();
    template.hash = final_hash;

    info!(
        "mined block {} with nonce {} and hash {}",
        index,
        found,
        hex::encode(final_hash)
    );

    (template, final_hash)
}
