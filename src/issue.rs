//! Issuer-side license generation.
//!
//! The issuer works from the external input formats a human operator deals
//! in: the 8-character computer-key token read off the holder's machine, a
//! `YYYYMM` expiry date, a 4-hex-digit auth code, a seed character, and up to
//! six 2-hex-digit module ids. [`generate_license`] validates each field,
//! builds the record, and encodes it. [`LicenseRequest`] round-trips: a
//! decoded record can be projected back into the request form for display.

use std::fmt;

use tracing::info;

use crate::codec::{self, LicenseRecord, EPOCH_YEAR, MAX_MODULES};
use crate::config::KeyMaterial;
use crate::errors::{LicenseError, LicenseResult};
use crate::identity;

/// Last year the expiry encoding can reach (through April; see [`parse_expiry`]).
pub const MAX_YEAR: i32 = 2034;

/// Validated issuer inputs for one license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseRequest {
    /// 8-character identity token naming the target machine.
    pub computer_key: String,
    /// Expiry date as `YYYYMM`, January 2013 through April 2034.
    pub expiry: String,
    /// Authorization code as a 4-character hex value.
    pub auth_code: String,
    /// Seed character embedded as the final license character.
    pub seed_char: char,
    /// Module ids, each a 2-character hex value; 1..=6 entries.
    pub module_ids: Vec<String>,
}

impl LicenseRequest {
    /// Parse and validate the request into a license record.
    pub fn to_record(&self) -> LicenseResult<LicenseRecord> {
        let computer_key = identity::decode_identity(&self.computer_key)?;
        let expiry_month = parse_expiry(&self.expiry)?;
        let auth_code = parse_auth_code(&self.auth_code)?;

        if self.module_ids.is_empty() {
            return Err(LicenseError::NoModuleIds);
        }
        if self.module_ids.len() > MAX_MODULES {
            return Err(LicenseError::RecordInvalid);
        }
        let modules: Vec<u8> = self
            .module_ids
            .iter()
            .map(|id| parse_module_id(id))
            .collect::<LicenseResult<_>>()?;

        LicenseRecord::new(computer_key, auth_code, expiry_month, &modules)
    }

    /// Project a decoded record back into request form.
    ///
    /// The inverse of issuing: useful for displaying what a license grants in
    /// the same notation the issuer consumes.
    pub fn from_record(record: &LicenseRecord, seed_char: char) -> Self {
        Self {
            computer_key: identity::encode_identity(record.computer_key),
            expiry: format!(
                "{:04}{:02}",
                record.expiry_year(),
                record.expiry_month0() + 1
            ),
            auth_code: format!("{:04x}", record.auth_code),
            seed_char,
            module_ids: record
                .modules()
                .iter()
                .map(|id| format!("{id:02x}"))
                .collect(),
        }
    }
}

impl fmt::Display for LicenseRequest {
    /// Renders as `<computerKey> <YYYYMM> <authCode> <seed> {<moduleId>}+`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.computer_key, self.expiry, self.auth_code, self.seed_char
        )?;
        for id in &self.module_ids {
            write!(f, " {id}")?;
        }
        Ok(())
    }
}

/// Generate a license text from issuer inputs.
pub fn generate_license(request: &LicenseRequest, keys: &KeyMaterial) -> LicenseResult<String> {
    let record = request.to_record()?;
    let text = codec::encode(&record, keys, request.seed_char)?;
    info!(
        modules = request.module_ids.len(),
        expiry = %request.expiry,
        "license generated"
    );
    Ok(text)
}

/// Parse a `YYYYMM` expiry date into months since January 2013.
///
/// The wire field is a single byte, so the latest representable expiry is
/// April 2034 (month 255). Later dates within 2034 pass the year bound but
/// not the byte, and are rejected rather than wrapped.
pub fn parse_expiry(expiry: &str) -> LicenseResult<u8> {
    if expiry.len() != 6 {
        return Err(LicenseError::ExpiryDateLength);
    }
    let year: i32 = expiry[..4]
        .parse()
        .map_err(|_| LicenseError::ExpiryDateRange)?;
    let month: u32 = expiry[4..]
        .parse()
        .map_err(|_| LicenseError::ExpiryDateRange)?;
    if !(EPOCH_YEAR..=MAX_YEAR).contains(&year) || !(1..=12).contains(&month) {
        return Err(LicenseError::ExpiryDateRange);
    }
    let months = (year - EPOCH_YEAR) * 12 + (month as i32 - 1);
    u8::try_from(months).map_err(|_| LicenseError::ExpiryDateRange)
}

/// Parse a 4-character hex auth code.
pub fn parse_auth_code(auth_code: &str) -> LicenseResult<u16> {
    if auth_code.len() != 4 {
        return Err(LicenseError::AuthCodeInvalid);
    }
    u16::from_str_radix(auth_code, 16).map_err(|_| LicenseError::AuthCodeInvalid)
}

/// Parse a 2-character hex module id.
pub fn parse_module_id(module_id: &str) -> LicenseResult<u8> {
    if module_id.len() != 2 {
        return Err(LicenseError::ModuleIdInvalid);
    }
    u8::from_str_radix(module_id, 16).map_err(|_| LicenseError::ModuleIdInvalid)
}
