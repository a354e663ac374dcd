//! Base32 transform shared by the license and identity codecs.
//!
//! The alphabet excludes the visually ambiguous characters `0 O 1 I` so keys
//! survive being read over the phone or typed from a printout. Both payloads
//! in this crate (15-byte ciphertext, 5-byte identity) are whole multiples of
//! 5 bits, so no padding characters are ever emitted or accepted.

use data_encoding::{Encoding, Specification};
use std::sync::OnceLock;

use crate::errors::{LicenseError, LicenseResult};

/// 32-symbol alphabet with `0 O 1 I` removed.
pub const BASE32_SYMBOLS: &str = "23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Separator inserted between visual groups of license text.
pub const GROUP_SEPARATOR: char = '-';

/// Characters per visual group in license text.
pub const GROUP_LEN: usize = 5;

fn base32() -> &'static Encoding {
    static ENCODING: OnceLock<Encoding> = OnceLock::new();
    ENCODING.get_or_init(|| {
        let mut spec = Specification::new();
        spec.symbols.push_str(BASE32_SYMBOLS);
        spec.encoding().expect("base32 alphabet is well-formed")
    })
}

/// Encode bytes to Base32 with no separators or padding.
pub fn encode(data: &[u8]) -> String {
    base32().encode(data)
}

/// Decode Base32 text produced by [`encode`].
///
/// Any character outside the alphabet, or a length that does not map to a
/// whole number of bytes, reports [`LicenseError::BadEncoding`].
pub fn decode(text: &str) -> LicenseResult<Vec<u8>> {
    base32()
        .decode(text.as_bytes())
        .map_err(|_| LicenseError::BadEncoding)
}

/// Encode bytes to Base32 and insert a separator every [`GROUP_LEN`] characters.
pub fn encode_grouped(data: &[u8]) -> String {
    let raw = encode(data);
    let mut grouped = String::with_capacity(raw.len() + raw.len() / GROUP_LEN);
    for (i, ch) in raw.chars().enumerate() {
        if i > 0 && i % GROUP_LEN == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(ch);
    }
    grouped
}

/// Strip group separators and decode.
pub fn decode_grouped(text: &str) -> LicenseResult<Vec<u8>> {
    let stripped: String = text.chars().filter(|&c| c != GROUP_SEPARATOR).collect();
    decode(&stripped)
}
