//! FNV-1a-64. The digest doubles as the dedup key and the integrity checksum
//! for every stored definition, so the constants are part of the file format.

pub const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

pub fn fnv1a(data: &[u8]) -> u64 {
    fnv1a_with(FNV_OFFSET_BASIS, data)
}

/// Fold more bytes into a running digest, for payloads read in batches.
pub fn fnv1a_with(init: u64, data: &[u8]) -> u64 {
    let mut hash = init;
    for &b in data {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
