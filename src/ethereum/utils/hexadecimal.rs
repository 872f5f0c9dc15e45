//! Utility Functions For Hexadecimal Strings
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!
//! Introduction
//! ------------
//!
//! Hexadecimal utility functions, specifically
//! parsing the short hex literals that tests use for addresses and slots.
//! Short literals are right aligned, so `0x01` is slot one.

use crate::ethereum::{ethereum_types::{bytes::Bytes32, numeric::U256}, exceptions::Exception};

fn strip_0x(s: &str) -> &[u8] {
    let s = s.as_bytes();
    if s.len() >= 2 && (&s[0..2] == b"0x" || &s[0..2] == b"0X") {
        &s[2..]
    } else {
        s
    }
}

fn nib(c: u8) -> Result<u8, Exception> {
    if c.is_ascii_digit() {
        Ok(c & 0x0f)
    } else if c.is_ascii_hexdigit() {
        Ok((c+9) & 0x0f)
    } else {
        Err(Exception::EthereumException("bad hex digit"))
    }
}

/// Decodes `s` into the tail of `d`, leaving leading bytes untouched.
pub fn hex_to_slice(d: &mut [u8], s: &str) -> Result<(), Exception> {
    let s = strip_0x(s);
    let num_bytes = (s.len() + 1) / 2;
    let dlen = d.len();
    if num_bytes > dlen {
        return Err(Exception::EthereumException("hex number too long"))
    }
    let d = &mut d[dlen-num_bytes..];
    let (head, rest) = if s.len() % 2 != 0 {
        (Some(s[0]), &s[1..])
    } else {
        (None, s)
    };
    let mut i = 0;
    if let Some(c) = head {
        d[0] = nib(c)?;
        i = 1;
    }
    for c in rest.chunks_exact(2) {
        d[i] = nib(c[0])? * 16 + nib(c[1])?;
        i += 1;
    }
    Ok(())
}

pub fn hex_to_bytes32(s: &str) -> Result<Bytes32, Exception> {
    let mut bytes = [0; 32];
    hex_to_slice(&mut bytes, s)?;
    Ok(Bytes32(bytes))
}

pub fn hex_to_u256(s: &str) -> Result<U256, Exception> {
    let mut bytes = [0; 32];
    hex_to_slice(&mut bytes, s)?;
    Ok(U256::from_be_bytes(bytes))
}

#[test]
fn test_hex() {
    assert_eq!(hex_to_u256("0x01").unwrap(), U256::ONE);
    assert_eq!(hex_to_u256("0x123").unwrap(), U256::from(0x123_u32));
    assert_eq!(hex_to_u256("ff").unwrap(), U256::from(0xff_u32));
    assert_eq!(hex_to_u256("0x").unwrap(), U256::ZERO);

    let slot = hex_to_bytes32("0x04").unwrap();
    assert_eq!(slot.0[31], 4);
    assert!(slot.0[..31].iter().all(|b| *b == 0));

    assert!(hex_to_u256("0xzz").is_err());
    let too_long = format!("0x{}", "11".repeat(33));
    assert!(hex_to_bytes32(&too_long).is_err());
}
