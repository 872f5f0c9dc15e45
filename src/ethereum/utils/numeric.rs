//! Utility Functions For Numeric Operations
//! ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!
//! .. contents:: Table of Contents
//!     :backlinks: none
//!     :local:
//!
//! Introduction
//! ------------
//!
//! Numeric helpers for memory sizing.


/// Converts a unsigned integer to the next closest multiple of 32.
///
/// Parameters
/// ----------
/// value :
///     The value whose ceil32 is to be calculated.
///
/// Returns
/// -------
/// ceil32 : `Option<usize>`
///     The same value if it's a perfect multiple of 32
///     else the smallest multiple of 32 that is greater than `value`.
///     `None` when that multiple does not fit a `usize`.
pub fn ceil32(value: usize) -> Option<usize> {
    let remainder = value % 32;
    if remainder == 0 {
        Some(value)
    } else {
        value.checked_add(32 - remainder)
    }
}

#[test]
fn test_ceil32() {
    assert_eq!(ceil32(0), Some(0));
    assert_eq!(ceil32(1), Some(32));
    assert_eq!(ceil32(32), Some(32));
    assert_eq!(ceil32(33), Some(64));
    assert_eq!(ceil32(usize::MAX), None);
}
