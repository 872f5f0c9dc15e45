//! https://github.com/ethereum/execution-specs/blob/master/src/ethereum/crypto/hash.py

use tiny_keccak::Hasher;

use crate::ethereum::ethereum_types::numeric::{fmt_hex, U256};

#[derive(Clone, Copy, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct Hash32(pub (crate)[u8; 32]);

impl std::fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buf = [0; 32*2+2];
        f.write_str(fmt_hex(&mut buf, &self.0))
    }
}

impl std::ops::Deref for Hash32 {
    type Target = [u8; 32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Hash32> for U256 {
    fn from(value: Hash32) -> Self {
        U256::from_be_bytes(value.0)
    }
}

/// Computes the keccak256 hash of the input `buffer`.
///
/// Parameters
/// ----------
/// buffer :
///     Input for the hashing function.
///
/// Returns
/// -------
/// hash : `Hash32`
///     Output of the hash function.
pub fn keccak256(buffer: &[u8]) -> Hash32 {
    let mut hasher = tiny_keccak::Keccak::v256();
    hasher.update(buffer);
    let mut output = [0; 32];
    hasher.finalize(&mut output);
    Hash32(output)
}

#[test]
fn test_keccak256_empty() {
    let expected = [
        0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
        0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
    ];
    assert_eq!(*keccak256(b""), expected);
}
