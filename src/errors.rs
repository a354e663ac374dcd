//! Error types for the license codec, issuer, and store.
//!
//! Every fallible operation in this crate returns one of the discrete kinds
//! below. Cipher-library failures are normalized to [`LicenseError::CryptoFailure`]
//! at the codec boundary; internal error text from the cipher is never exposed.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type LicenseResult<T> = Result<T, LicenseError>;

/// Closed set of error kinds reported by codec, issuer, and store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LicenseError {
    // === Format errors ===
    /// License text length is not exactly 29 characters.
    #[error("license length not equal to 29")]
    BadLength,
    /// License text (hyphens removed) is not valid Base32.
    #[error("license text is not valid base32")]
    BadEncoding,
    /// Record fields are out of range (module count, unprintable seed char).
    #[error("license record is invalid")]
    RecordInvalid,
    /// Computer key token is not 8 characters long.
    #[error("computer key must be 8 chars long")]
    ComputerKeyLength,
    /// Expiry date input is not 6 characters (`YYYYMM`).
    #[error("expiry date must be 6 chars long")]
    ExpiryDateLength,
    /// Expiry date is outside years 2013..=2034 or months 1..=12.
    #[error("expiry date out of range")]
    ExpiryDateRange,
    /// Auth code input is not a 4-character hex value.
    #[error("auth code must be a 4 char hex value")]
    AuthCodeInvalid,
    /// Module id input is not a 2-character hex value.
    #[error("module id must be a 2 char hex value")]
    ModuleIdInvalid,

    // === Integrity errors ===
    /// Recomputed record checksum does not match the stored byte.
    #[error("invalid license checksum")]
    BadChecksum,
    /// Computer key token failed its embedded checksum.
    #[error("computer key checksum error")]
    ComputerKeyChecksum,

    // === Crypto errors ===
    /// The underlying cipher transform failed.
    #[error("cipher transform failed")]
    CryptoFailure,

    // === Policy errors ===
    /// License decodes correctly but its expiry month has elapsed,
    /// or every license covering the queried module has expired.
    #[error("license has expired")]
    Expired,
    /// No stored license covers the queried module.
    #[error("no license found for module")]
    NotFound,
    /// No date-valid license matched both the module and the auth code.
    #[error("no authenticating license found")]
    Unauthenticated,

    // === Usage errors ===
    /// The issue request supplied no module ids.
    #[error("no module ids supplied")]
    NoModuleIds,

    // === Configuration ===
    /// Configuration could not be loaded or validated.
    #[error("configuration error: {0}")]
    Config(String),
}
