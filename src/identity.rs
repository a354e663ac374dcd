//! Machine identity hashing and the identity token codec.
//!
//! A machine identity is a 4-byte hash derived from whatever the hardware
//! probe can supply, in priority order: a hardware serial string (hashed with
//! CRC-32), a nonzero machine identifier, or a nonzero network adapter
//! address. The hash plus its CRC-16 check byte (5 bytes, exactly 40 bits)
//! renders as an 8-character Base32 token with no separators or padding.
//!
//! The token is what a license holder reads off their machine and sends to
//! the issuer, where it becomes the `computer_key` field of the license
//! record. Token decoding verifies the embedded check byte, mirroring the
//! license decoder.

use crate::checksum::{crc16_low, crc32};
use crate::encoding;
use crate::errors::{LicenseError, LicenseResult};
use crate::hardware::HardwareProbe;

/// Length of a rendered identity token in characters.
pub const IDENTITY_TOKEN_LEN: usize = 8;

/// Provenance of an identity hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    /// Hash of a hardware serial string.
    HardwareSerial,
    /// Machine identifier used directly.
    MachineId,
    /// Network adapter address used directly.
    AdapterAddress,
}

/// A machine identity: the 4-byte hash and where it came from.
///
/// `kind` is `None` when the probe could supply nothing; the hash is then
/// zero and the token renders empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// Identity binding value carried in license records.
    pub hash: u32,
    /// Provenance tag, carried out-of-band (never encoded into the token).
    pub kind: Option<IdentityKind>,
}

impl Identity {
    /// Render this identity as its printable token.
    pub fn token(&self) -> String {
        if self.kind.is_none() {
            return String::new();
        }
        encode_identity(self.hash)
    }
}

/// Encode a 4-byte identity hash as an 8-character token.
///
/// The hash is followed by the low byte of its CRC-16, giving a 5-byte
/// payload that Base32 renders without padding.
pub fn encode_identity(hash: u32) -> String {
    let mut payload = [0u8; 5];
    payload[..4].copy_from_slice(&hash.to_le_bytes());
    payload[4] = crc16_low(&payload[..4]);
    encoding::encode(&payload)
}

/// Decode an identity token back to its hash, verifying the check byte.
pub fn decode_identity(token: &str) -> LicenseResult<u32> {
    if token.len() != IDENTITY_TOKEN_LEN {
        return Err(LicenseError::ComputerKeyLength);
    }
    let payload = encoding::decode(token)?;
    let hash_bytes: [u8; 4] = payload[..4].try_into().expect("5-byte payload");
    if payload[4] != crc16_low(&hash_bytes) {
        return Err(LicenseError::ComputerKeyChecksum);
    }
    Ok(u32::from_le_bytes(hash_bytes))
}

/// Compute this machine's identity from a hardware probe.
///
/// Sources are tried in priority order: serial string first, then machine
/// id, then adapter address. An empty probe yields a zero hash with no kind.
pub fn compute_identity(probe: &dyn HardwareProbe) -> Identity {
    if let Some(serial) = probe.serial_number() {
        if !serial.is_empty() {
            return Identity {
                hash: crc32(serial.as_bytes()),
                kind: Some(IdentityKind::HardwareSerial),
            };
        }
    }
    if let Some(machine_id) = probe.machine_id() {
        if machine_id != 0 {
            return Identity {
                hash: machine_id,
                kind: Some(IdentityKind::MachineId),
            };
        }
    }
    if let Some(address) = probe.adapter_address() {
        if address != 0 {
            return Identity {
                hash: address,
                kind: Some(IdentityKind::AdapterAddress),
            };
        }
    }
    Identity {
        hash: 0,
        kind: None,
    }
}
