//! License record layout and the text codec.
//!
//! A license is a fixed 15-byte record: a 4-byte computer key binding it to a
//! machine identity, a 2-byte authorization code, a 1-byte expiry month
//! (months since January 2013), a module count, six module-id slots, and a
//! trailing CRC byte over everything before it. The record is encrypted with
//! AES-128 in CFB mode under a per-license IV selected by the seed character,
//! then rendered as 24 Base32 characters in hyphenated groups of five, with
//! the seed character appended as the 29th character.
//!
//! Unused module slots are filled with cryptographically random bytes so the
//! ciphertext does not reveal how many modules a license carries. They are
//! never interpreted: all module matching is bounded by the module count.

use aes::Aes128;
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use chrono::{Datelike, Local};
use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::checksum::crc16_low;
use crate::config::KeyMaterial;
use crate::encoding;
use crate::errors::{LicenseError, LicenseResult};
use crate::keystream::{personalize_iv, IV_LEN};

type RecordEncryptor = cfb_mode::Encryptor<Aes128>;
type RecordDecryptor = cfb_mode::Decryptor<Aes128>;

/// Size of the wire record in bytes.
pub const RECORD_LEN: usize = 15;

/// Number of leading record bytes covered by the checksum.
const CHECK_LEN: usize = RECORD_LEN - 1;

/// Total length of a rendered license: 24 data chars, 4 separators, 1 seed.
pub const LICENSE_TEXT_LEN: usize = 29;

/// Base32 characters carrying record data within the license text.
const DATA_CHARS: usize = 24;

/// Maximum number of module ids a single license can carry.
pub const MAX_MODULES: usize = 6;

/// Year that expiry month 0 maps to.
pub const EPOCH_YEAR: i32 = 2013;

/// AES-128 takes a 16-byte IV; the record-sized IV is extended with this
/// fixed final byte.
const IV_PAD: u8 = 0x9d;

/// Decoded license record. The wire checksum is verified on decode and
/// recomputed on encode, so it is not stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LicenseRecord {
    /// Identity binding value; matches the hash inside an identity token.
    pub computer_key: u32,
    /// Authorization code compared exactly at authentication time.
    pub auth_code: u16,
    /// Months elapsed since January 2013 (255 = April 2034, the latest
    /// representable expiry).
    pub expiry_month: u8,
    /// Number of populated module slots, 1 ..= 6.
    pub module_count: u8,
    /// Module-id slots; entries at index >= `module_count` are padding.
    pub module_ids: [u8; MAX_MODULES],
}

impl LicenseRecord {
    /// Build a record from its fields, leaving unused module slots zeroed.
    /// Padding is randomized when the record is encoded.
    pub fn new(
        computer_key: u32,
        auth_code: u16,
        expiry_month: u8,
        modules: &[u8],
    ) -> LicenseResult<Self> {
        if modules.is_empty() {
            return Err(LicenseError::NoModuleIds);
        }
        if modules.len() > MAX_MODULES {
            return Err(LicenseError::RecordInvalid);
        }
        let mut module_ids = [0u8; MAX_MODULES];
        module_ids[..modules.len()].copy_from_slice(modules);
        Ok(Self {
            computer_key,
            auth_code,
            expiry_month,
            module_count: modules.len() as u8,
            module_ids,
        })
    }

    /// The populated module slots.
    pub fn modules(&self) -> &[u8] {
        &self.module_ids[..usize::from(self.module_count).min(MAX_MODULES)]
    }

    /// Whether this license covers the given module id.
    pub fn covers_module(&self, module_id: u8) -> bool {
        self.modules().contains(&module_id)
    }

    /// Calendar year the license expires in.
    pub fn expiry_year(&self) -> i32 {
        EPOCH_YEAR + i32::from(self.expiry_month / 12)
    }

    /// Zero-based month (0 = January) the license expires in.
    pub fn expiry_month0(&self) -> u32 {
        u32::from(self.expiry_month % 12)
    }

    /// Date validity against an explicit current year and zero-based month.
    ///
    /// A license is valid through the end of its expiry month: later years
    /// are always valid, earlier years never, and within the expiry year the
    /// current month must not have passed the expiry month.
    pub fn is_date_valid_at(&self, year: i32, month0: u32) -> bool {
        let lic_year = self.expiry_year();
        if lic_year > year {
            return true;
        }
        if lic_year < year {
            return false;
        }
        self.expiry_month0() >= month0
    }

    /// Date validity against the local calendar.
    pub fn is_date_valid(&self) -> bool {
        let now = Local::now();
        self.is_date_valid_at(now.year(), now.month0())
    }

    fn to_wire(&self) -> [u8; RECORD_LEN] {
        let mut bytes = [0u8; RECORD_LEN];
        bytes[0..4].copy_from_slice(&self.computer_key.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.auth_code.to_le_bytes());
        bytes[6] = self.expiry_month;
        bytes[7] = self.module_count;
        bytes[8..8 + MAX_MODULES].copy_from_slice(&self.module_ids);
        bytes
    }

    fn from_wire(bytes: &[u8; RECORD_LEN]) -> Self {
        let mut module_ids = [0u8; MAX_MODULES];
        module_ids.copy_from_slice(&bytes[8..8 + MAX_MODULES]);
        Self {
            computer_key: u32::from_le_bytes(bytes[0..4].try_into().expect("4-byte slice")),
            auth_code: u16::from_le_bytes(bytes[4..6].try_into().expect("2-byte slice")),
            expiry_month: bytes[6],
            module_count: bytes[7],
            module_ids,
        }
    }
}

/// Extend the personalized 15-byte IV to the AES block size.
fn cipher_iv(base_iv: &[u8; IV_LEN], seed: u8) -> [u8; 16] {
    let personalized = personalize_iv(base_iv, seed);
    let mut iv = [IV_PAD; 16];
    iv[..IV_LEN].copy_from_slice(&personalized);
    iv
}

/// Encode a record into its 29-character license text.
///
/// Fails with [`LicenseError::RecordInvalid`] when the module count is not
/// in 1 ..= 6 or the seed character is not printable ASCII (any other seed
/// could not render a fixed-width license).
pub fn encode(
    record: &LicenseRecord,
    keys: &KeyMaterial,
    seed_char: char,
) -> LicenseResult<String> {
    let count = usize::from(record.module_count);
    if count < 1 || count > MAX_MODULES {
        return Err(LicenseError::RecordInvalid);
    }
    if !seed_char.is_ascii_graphic() {
        return Err(LicenseError::RecordInvalid);
    }
    let seed = seed_char as u8;

    let mut bytes = record.to_wire();

    // Randomize slots beyond the module count so ciphertexts do not leak
    // structure through repeated plaintext.
    if count < MAX_MODULES {
        let mut rng = OsRng;
        rng.try_fill_bytes(&mut bytes[8 + count..8 + MAX_MODULES])
            .map_err(|_| LicenseError::CryptoFailure)?;
    }

    bytes[RECORD_LEN - 1] = crc16_low(&bytes[..CHECK_LEN]);

    let iv = cipher_iv(&keys.base_iv, seed);
    let encryptor = RecordEncryptor::new_from_slices(&keys.key, &iv)
        .map_err(|_| LicenseError::CryptoFailure)?;
    encryptor.encrypt(&mut bytes);

    let mut text = encoding::encode_grouped(&bytes);
    text.push(seed_char);
    Ok(text)
}

/// Decode a 29-character license text back into its record and seed character.
///
/// The length gate fires before any Base32 or cipher work. Hyphens in the
/// data portion are formatting only and are stripped before decoding.
pub fn decode(text: &str, keys: &KeyMaterial) -> LicenseResult<(LicenseRecord, char)> {
    if text.len() != LICENSE_TEXT_LEN {
        return Err(LicenseError::BadLength);
    }
    if !text.is_ascii() {
        return Err(LicenseError::BadEncoding);
    }

    let bytes = text.as_bytes();
    let seed = bytes[LICENSE_TEXT_LEN - 1];

    let stripped: String = text[..LICENSE_TEXT_LEN - 1]
        .chars()
        .filter(|&c| c != encoding::GROUP_SEPARATOR)
        .collect();
    if stripped.len() != DATA_CHARS {
        return Err(LicenseError::BadEncoding);
    }

    let decoded = encoding::decode(&stripped)?;
    let mut record_bytes: [u8; RECORD_LEN] = decoded
        .try_into()
        .map_err(|_| LicenseError::BadEncoding)?;

    let iv = cipher_iv(&keys.base_iv, seed);
    let decryptor = RecordDecryptor::new_from_slices(&keys.key, &iv)
        .map_err(|_| LicenseError::CryptoFailure)?;
    decryptor.decrypt(&mut record_bytes);

    if record_bytes[RECORD_LEN - 1] != crc16_low(&record_bytes[..CHECK_LEN]) {
        return Err(LicenseError::BadChecksum);
    }

    Ok((LicenseRecord::from_wire(&record_bytes), seed as char))
}

/// Public projection of a license: expiry date and module list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseInfo {
    /// Expiry year.
    pub year: i32,
    /// Expiry month, 1 ..= 12.
    pub month: u32,
    /// Populated module ids.
    pub modules: Vec<u8>,
}

/// Decode a license text and project its public info without storing it.
pub fn inspect(text: &str, keys: &KeyMaterial) -> LicenseResult<LicenseInfo> {
    let (record, _) = decode(text, keys)?;
    Ok(LicenseInfo {
        year: record.expiry_year(),
        month: record.expiry_month0() + 1,
        modules: record.modules().to_vec(),
    })
}
