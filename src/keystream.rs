//! Per-license keystream personalization.
//!
//! Every license carries one plaintext "seed character" as its final
//! character. The seed deterministically selects the initialization vector
//! used to encrypt that license: the fixed base IV is rotated by an amount
//! derived from the seed, and the seed itself is stamped into byte 0. The
//! decoder only ever sees the seed character, so the same derivation must be
//! reproducible on both sides.
//!
//! This personalization obfuscates IV selection; it is not a cryptographic
//! guarantee. For any given seed character the same IV family repeats across
//! all licenses.

/// Length of the license IV in bytes. Equal to the record size.
pub const IV_LEN: usize = 15;

/// Derive the per-license IV from the base IV and the seed character.
///
/// The rotation amount is `seed_char - 'A'`; when the seed precedes `'A'` the
/// offset `'A' - '0'` re-bases it into the digit range. The result is reduced
/// modulo [`IV_LEN`] (non-negative), the base IV is rotated left by that many
/// bytes, and byte 0 is overwritten with the seed character itself.
///
/// Pure and deterministic: identical inputs always produce identical IVs.
pub fn personalize_iv(base_iv: &[u8; IV_LEN], seed_char: u8) -> [u8; IV_LEN] {
    let mut n = i32::from(seed_char) - i32::from(b'A');
    if n < 0 {
        n += i32::from(b'A') - i32::from(b'0');
    }
    let n = n.rem_euclid(IV_LEN as i32) as usize;

    let mut iv = *base_iv;
    iv.rotate_left(n);
    iv[0] = seed_char;
    iv
}

/// Rotation amount a seed character maps to, exposed for tests.
#[cfg(test)]
fn rotation(seed_char: u8) -> usize {
    let mut n = i32::from(seed_char) - i32::from(b'A');
    if n < 0 {
        n += i32::from(b'A') - i32::from(b'0');
    }
    n.rem_euclid(IV_LEN as i32) as usize
}
