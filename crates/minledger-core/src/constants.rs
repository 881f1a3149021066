pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
/// Leading zero hex digits required of a block hash.
pub const DEFAULT_DIFFICULTY: u32 = 2;
pub const GENESIS_PAYLOAD: &str = "Genesis Block";
pub const GENESIS_PREVIOUS_HASH: [u8; 32] = [0u8; 32];
