use std::ops::{Add, Sub};

use crate::ethereum::exceptions::Exception;

/// Unsigned 256 bit word, the unit of the EVM stack and of contract storage.
///
/// Limbs are stored most significant first.
#[derive(Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash, Default)]
pub struct U256([u64; 4]);

impl std::fmt::Debug for U256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buf = [0; 32*2+2];
        f.write_str(fmt_hex(&mut buf, &self.to_be_bytes()))
    }
}

impl U256 {
    pub const ZERO : U256 = U256([0; 4]);
    pub const ONE : U256 = U256([0, 0, 0, 1]);

    pub fn from_be_bytes(value: [u8; 32]) -> Self {
        let limb = |i: usize| {
            let mut b = [0; 8];
            b.copy_from_slice(&value[i*8..i*8+8]);
            u64::from_be_bytes(b)
        };
        Self::from_limbs([limb(0), limb(1), limb(2), limb(3)])
    }

    /// Right aligns up to 32 big-endian bytes, as PUSHn and CALLDATALOAD do.
    pub fn from_be_slice(value: &[u8]) -> Self {
        let mut bytes = [0; 32];
        let value = &value[value.len().saturating_sub(32)..];
        bytes[32-value.len()..].copy_from_slice(value);
        Self::from_be_bytes(bytes)
    }

    pub const fn to_limbs(&self) -> [u64; 4] {
        self.0
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let [a, b, c, d] = self.to_limbs();
        let mut res = [0; 32];
        res[0x00..0x08].copy_from_slice(&a.to_be_bytes());
        res[0x08..0x10].copy_from_slice(&b.to_be_bytes());
        res[0x10..0x18].copy_from_slice(&c.to_be_bytes());
        res[0x18..0x20].copy_from_slice(&d.to_be_bytes());
        res
    }

    pub const fn from_limbs(value: [u64; 4]) -> Self {
        Self(value)
    }

    pub fn is_zero(&self) -> bool {
        (self.0[0] | self.0[1] | self.0[2] | self.0[3]) == 0
    }

    pub fn from_bool(b: bool) -> Self {
        if b { Self::ONE } else { Self::ZERO }
    }

    pub fn to_usize(&self) -> Result<usize, Exception> {
        if self.0[0] != 0 || self.0[1] != 0 || self.0[2] != 0 {
            return Err(Exception::NumericOverflow);
        }
        usize::try_from(self.0[3]).map_err(|_| Exception::NumericOverflow)
    }
}

impl From<u32> for U256 {
    fn from(value: u32) -> Self {
        Self::from_limbs([0, 0, 0, value as u64])
    }
}

impl From<u64> for U256 {
    fn from(value: u64) -> Self {
        Self::from_limbs([0, 0, 0, value])
    }
}

impl From<usize> for U256 {
    fn from(value: usize) -> Self {
        Self::from_limbs([0, 0, 0, value as u64])
    }
}

impl Add<U256> for U256 {
    type Output = U256;

    fn add(self, rhs: U256) -> Self::Output {
        let ca = self.to_limbs();
        let cb = rhs.to_limbs();
        let (sum0, cy0) = ca[3].overflowing_add(cb[3]);

        let (sum1, cy1a) = ca[2].overflowing_add(cb[2]);
        let (sum1, cy1b) = sum1.overflowing_add(if cy0 { 1 } else {0} );

        let (sum2, cy2a) = ca[1].overflowing_add(cb[1]);
        let (sum2, cy2b) = sum2.overflowing_add(if cy1a || cy1b { 1 } else {0} );

        let (sum3, _cy3a) = ca[0].overflowing_add(cb[0]);
        let (sum3, _cy3b) = sum3.overflowing_add(if cy2a || cy2b { 1 } else {0} );

        Self::from_limbs([sum3, sum2, sum1, sum0])
    }
}

impl Sub<U256> for U256 {
    type Output = U256;

    fn sub(self, rhs: U256) -> Self::Output {
        let ca = self.to_limbs();
        let cb = rhs.to_limbs();
        let (sum0, cy0) = ca[3].overflowing_sub(cb[3]);

        let (sum1, cy1a) = ca[2].overflowing_sub(cb[2]);
        let (sum1, cy1b) = sum1.overflowing_sub(if cy0 { 1 } else {0} );

        let (sum2, cy2a) = ca[1].overflowing_sub(cb[1]);
        let (sum2, cy2b) = sum2.overflowing_sub(if cy1a || cy1b { 1 } else {0} );

        let (sum3, _cy3a) = ca[0].overflowing_sub(cb[0]);
        let (sum3, _cy3b) = sum3.overflowing_sub(if cy2a || cy2b { 1 } else {0} );

        Self::from_limbs([sum3, sum2, sum1, sum0])
    }
}

/// Writes `0x`-prefixed hex for `bytes` into `buf`, leading zero bytes dropped.
pub fn fmt_hex<'a>(buf: &'a mut [u8], bytes: &[u8]) -> &'a str {
    assert!(buf.len() == bytes.len()*2+2);
    let lz = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let bytes = &bytes[lz..];
    if bytes.is_empty() {
        "0x0"
    } else {
        let hex = b"0123456789abcdef";
        buf[0] = b'0';
        buf[1] = b'x';
        for i in 0..bytes.len() {
            buf[i*2+2] = hex[(bytes[i] >> 4) as usize];
            buf[i*2+3] = hex[(bytes[i] & 0x0f) as usize];
        }
        std::str::from_utf8(&buf[0..bytes.len()*2+2]).unwrap_or("0x?")
    }
}

#[test]
fn test_u256() {
    assert_eq!(U256::from(1_u32) + U256::from(2_u32), U256::from(3_u32));
    assert_eq!(U256::ZERO - U256::ONE, U256::from_limbs([!0, !0, !0, !0]));
    assert_eq!(U256::from_limbs([!0, !0, !0, !0]) + U256::ONE, U256::ZERO);
    assert_eq!(U256::from_limbs([0, 0, 1, 0]) - U256::ONE, U256::from(u64::MAX));

    assert_eq!(U256::from_be_slice(&[0x12, 0x34]), U256::from(0x1234_u32));
    assert_eq!(&U256::from(0x1234_u32).to_be_bytes()[30..], &[0x12, 0x34]);

    assert_eq!(U256::from(7_u32).to_usize().unwrap(), 7);
    assert!(U256::from_limbs([0, 1, 0, 0]).to_usize().is_err());

    assert_eq!(format!("{:?}", U256::from(0x123_u32)), "0x0123");
    assert_eq!(format!("{:?}", U256::ZERO), "0x0");
}
