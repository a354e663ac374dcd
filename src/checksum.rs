//! Checksums used by the license and identity codecs.
//!
//! Two checksums are in play:
//! - CRC-16 (seed `0xFFFF`, reflected polynomial `0xA001`) guards the license
//!   record and the computer-key token. Only the low byte is ever stored.
//! - CRC-32 (IEEE 802.3, reflected polynomial `0xEDB88320`) hashes hardware
//!   serial strings down to the 4-byte identity value.

/// Initial value for the CRC-16 register.
pub const CRC16_SEED: u16 = 0xFFFF;

/// Reflected CRC-16 polynomial.
pub const CRC16_POLY: u16 = 0xA001;

/// Compute the CRC-16 of `data`.
///
/// Each byte is XORed into the low byte of the running register, followed by
/// eight right-shifts with a conditional XOR of the polynomial when the
/// shifted-out bit is set.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = CRC16_SEED;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ CRC16_POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Low byte of the CRC-16, the form stored in wire records.
pub fn crc16_low(data: &[u8]) -> u8 {
    (crc16(data) & 0xff) as u8
}

/// Reflected IEEE 802.3 CRC-32 polynomial.
const CRC32_POLY: u32 = 0xEDB88320;

/// Precomputed CRC-32 lookup table, generated at compile time.
const CRC32_TABLE: [u32; 256] = generate_crc32_table();

const fn generate_crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 == 1 {
                crc = (crc >> 1) ^ CRC32_POLY;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Compute the IEEE 802.3 CRC-32 of `data`.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xff) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    !crc
}
