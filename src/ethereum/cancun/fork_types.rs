use std::ops::Deref;

use crate::ethereum::{ethereum_types::{bytes::Bytes, numeric::{fmt_hex, U256}}, exceptions::Exception, utils::hexadecimal::hex_to_slice};

#[derive(Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// Parses a `0x`-prefixed literal. Short literals are right aligned.
    pub fn from_hex(s: &str) -> Result<Self, Exception> {
        let mut bytes = [0; 20];
        hex_to_slice(&mut bytes, s)?;
        Ok(Self(bytes))
    }

    /// Takes the low 160 bits of a stack word, as CALL does with its operand.
    pub fn from_word(word: U256) -> Self {
        let mut bytes = [0; 20];
        bytes.copy_from_slice(&word.to_be_bytes()[12..]);
        Self(bytes)
    }

    pub fn to_word(&self) -> U256 {
        U256::from_be_slice(&self.0)
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buf = [0; 20*2+2];
        f.write_str(fmt_hex(&mut buf, &self.0))
    }
}

impl Deref for Address {
    type Target = [u8; 20];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Default, Debug, PartialEq, Clone)]
/// State associated with an address.
///
/// Balances and nonces are not modelled here; storage lives beside the
/// account in the state, not inside it.
pub struct Account {
    pub code: Bytes,
}

pub static EMPTY_ACCOUNT : Account = Account{
    code: Bytes(Vec::new()),
};

#[test]
fn test_address_word() {
    let addr = Address::from_hex("0x1000000000000000000000000000000000000001").unwrap();
    assert_eq!(addr.0[0], 0x10);
    assert_eq!(addr.0[19], 0x01);
    assert_eq!(Address::from_word(addr.to_word()), addr);

    let high_bits = U256::from_limbs([!0, 0, 0, 5]);
    assert_eq!(Address::from_word(high_bits), Address::from_hex("0x05").unwrap());
}
