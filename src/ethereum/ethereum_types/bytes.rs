use super::numeric::{fmt_hex, U256};

#[derive(Clone, Copy, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct Bytes32(pub [u8; 32]);

impl std::fmt::Debug for Bytes32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buf = [0; 32*2+2];
        f.write_str(fmt_hex(&mut buf, &self.0))
    }
}

impl From<U256> for Bytes32 {
    fn from(value: U256) -> Self {
        Self(value.to_be_bytes())
    }
}

impl From<Bytes32> for U256 {
    fn from(value: Bytes32) -> Self {
        U256::from_be_bytes(value.0)
    }
}

impl std::ops::Deref for Bytes32 {
    type Target = [u8; 32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Sequence of bytes (octets) of arbitrary length.
#[derive(Clone, Default, PartialEq, PartialOrd, Eq, Ord)]
pub struct Bytes(pub Vec<u8>);

impl<T : AsRef<[u8]>> From<T> for Bytes {
    fn from(value: T) -> Self {
        Bytes(value.as_ref().to_vec())
    }
}

impl std::fmt::Debug for Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buf = vec![0; self.len()*2+2];
        f.write_str(fmt_hex(&mut buf, &self.0))
    }
}

impl std::ops::Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl std::ops::DerefMut for Bytes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
