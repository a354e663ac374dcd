//! Layered configuration and the injectable cipher key material.
//!
//! Settings come from three layers, later ones winning: compiled-in defaults,
//! an optional `config.toml`, then `MODKEY_*` environment variables.
//!
//! - `MODKEY_CRYPTO_KEY` - license cipher key, 32 hex chars (16 bytes)
//! - `MODKEY_CRYPTO_IV` - base initialization vector, 30 hex chars (15 bytes)
//! - `MODKEY_LOGGING_ENABLED` - `true`/`false`
//! - `MODKEY_LOG_LEVEL` - trace, debug, info, warn, error
//!
//! The key and base IV default to the compiled-in values, so a bare
//! deployment works with no configuration at all. Hosts that rotate keys
//! inject their own material and hand the resulting [`KeyMaterial`] to the
//! codec, issuer, and store.

use config::Config;
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;

use crate::errors::{LicenseError, LicenseResult};
use crate::keystream::IV_LEN;

/// Cipher key size in bytes (AES-128).
pub const KEY_LEN: usize = 16;

/// Compiled-in license cipher key.
const DEFAULT_KEY: [u8; KEY_LEN] = [
    0x30, 0x17, 0xf0, 0xe3, 0x14, 0xa9, 0xc5, 0x7d, 0x08, 0xf2, 0x99, 0x51, 0x2e, 0x11, 0x8a,
    0xdf,
];

/// Compiled-in base IV for the license record. Same length as the record.
const DEFAULT_BASE_IV: [u8; IV_LEN] = [
    0xf2, 0x9e, 0x7d, 0x85, 0xec, 0x1f, 0x41, 0x79, 0x10, 0x62, 0xa2, 0xc9, 0xdc, 0xe2, 0x8c,
];

static CONFIG: OnceLock<ModkeyConfig> = OnceLock::new();

fn cfg_err(e: impl std::fmt::Display) -> LicenseError {
    LicenseError::Config(e.to_string())
}

/// Top-level settings tree.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModkeyConfig {
    /// Cipher key material, hex-encoded.
    pub crypto: CryptoConfig,
    /// Tracing output controls.
    pub logging: LoggingConfig,
}

/// Hex-encoded key material as it appears in files and env vars.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// License cipher key, 32 hex characters.
    pub key: String,
    /// Base IV, 30 hex characters.
    pub iv: String,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            key: hex::encode(DEFAULT_KEY),
            iv: hex::encode(DEFAULT_BASE_IV),
        }
    }
}

/// Tracing output controls.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit tracing events.
    pub enabled: bool,
    /// Minimum level: trace, debug, info, warn, error.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
        }
    }
}

impl ModkeyConfig {
    /// Assemble the three layers: defaults, then `config.toml` if present,
    /// then `MODKEY_*` environment overrides.
    fn load() -> LicenseResult<Self> {
        let builder = Config::builder()
            .set_default("crypto.key", hex::encode(DEFAULT_KEY))
            .map_err(cfg_err)?
            .set_default("crypto.iv", hex::encode(DEFAULT_BASE_IV))
            .map_err(cfg_err)?
            .set_default("logging.enabled", false)
            .map_err(cfg_err)?
            .set_default("logging.level", "info")
            .map_err(cfg_err)?
            .add_source(config::File::with_name("config").required(false))
            .set_override_option("crypto.key", env::var("MODKEY_CRYPTO_KEY").ok())
            .map_err(cfg_err)?
            .set_override_option("crypto.iv", env::var("MODKEY_CRYPTO_IV").ok())
            .map_err(cfg_err)?
            .set_override_option(
                "logging.enabled",
                env::var("MODKEY_LOGGING_ENABLED")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok()),
            )
            .map_err(cfg_err)?
            .set_override_option("logging.level", env::var("MODKEY_LOG_LEVEL").ok())
            .map_err(cfg_err)?;

        builder
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(cfg_err)
    }

    /// Check the assembled settings before anything consumes them: the key
    /// material must parse, the log level must name a real level.
    pub fn validate(&self) -> LicenseResult<()> {
        KeyMaterial::from_hex(&self.crypto.key, &self.crypto.iv)?;

        let level = self.logging.level.to_lowercase();
        if !matches!(
            level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(LicenseError::Config(format!(
                "logging.level '{level}' is not a recognized level"
            )));
        }

        Ok(())
    }
}

/// Process-wide settings, loaded and validated on first access.
pub fn get_config() -> LicenseResult<&'static ModkeyConfig> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let config = ModkeyConfig::load()?;
    config.validate()?;

    // A racing thread may have set it first; either value came from the
    // same sources.
    let _ = CONFIG.set(config);

    Ok(CONFIG.get().expect("config was just set"))
}

/// The pre-shared cipher key and base IV used by the license codec.
///
/// The algorithm is fixed; the material is injectable so hosts can rotate
/// keys or test with alternates. [`KeyMaterial::default`] yields the
/// compiled-in values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMaterial {
    /// AES-128 key for the license record cipher.
    pub key: [u8; KEY_LEN],
    /// Base IV personalized per license by the keystream module.
    pub base_iv: [u8; IV_LEN],
}

impl Default for KeyMaterial {
    fn default() -> Self {
        Self {
            key: DEFAULT_KEY,
            base_iv: DEFAULT_BASE_IV,
        }
    }
}

impl KeyMaterial {
    /// Build key material from hex-encoded key and IV strings.
    pub fn from_hex(key_hex: &str, iv_hex: &str) -> LicenseResult<Self> {
        let key_bytes = hex::decode(key_hex)
            .map_err(|e| LicenseError::Config(format!("crypto.key is not valid hex: {e}")))?;
        let key: [u8; KEY_LEN] = key_bytes.try_into().map_err(|_| {
            LicenseError::Config(format!("crypto.key must be {} hex chars", KEY_LEN * 2))
        })?;

        let iv_bytes = hex::decode(iv_hex)
            .map_err(|e| LicenseError::Config(format!("crypto.iv is not valid hex: {e}")))?;
        let base_iv: [u8; IV_LEN] = iv_bytes.try_into().map_err(|_| {
            LicenseError::Config(format!("crypto.iv must be {} hex chars", IV_LEN * 2))
        })?;

        Ok(Self { key, base_iv })
    }

    /// Build key material from the global configuration.
    pub fn from_config() -> LicenseResult<Self> {
        let config = get_config()?;
        Self::from_hex(&config.crypto.key, &config.crypto.iv)
    }
}
