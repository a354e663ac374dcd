//! Modkey - offline module licensing with short, transcribable keys
//!
//! A license is a 29-character printable string that packs a machine-identity
//! binding, an expiry month, an authorization code, and up to six module ids
//! into an encrypted, checksummed 15-byte record. The issuer mints the string
//! from a holder's identity token; the holder's runtime feeds it to a
//! [`store::LicenseStore`] and asks "is module X licensed right now".
//!
//! # Example
//!
//! ```rust,ignore
//! use modkey::config::KeyMaterial;
//! use modkey::hardware::SystemProbe;
//! use modkey::identity::compute_identity;
//! use modkey::issue::{generate_license, LicenseRequest};
//! use modkey::store::LicenseStore;
//!
//! // Holder side: read off this machine's identity token.
//! let token = compute_identity(&SystemProbe).token();
//!
//! // Issuer side: mint a license for modules 01 and 02 through June 2030.
//! let keys = KeyMaterial::default();
//! let request = LicenseRequest {
//!     computer_key: token,
//!     expiry: "203006".into(),
//!     auth_code: "fe80".into(),
//!     seed_char: 'Q',
//!     module_ids: vec!["01".into(), "02".into()],
//! };
//! let text = generate_license(&request, &keys)?;
//!
//! // Holder side: store it and gate features on it.
//! let store = LicenseStore::new(keys);
//! store.add_license(&text)?;
//! store.is_module_licensed(0x01)?;
//! # Ok::<(), modkey::errors::LicenseError>(())
//! ```

pub mod checksum;
pub mod codec;
pub mod config;
pub mod encoding;
pub mod errors;
pub mod hardware;
pub mod identity;
pub mod issue;
pub mod keystream;
pub mod store;

pub use codec::{LicenseInfo, LicenseRecord, LICENSE_TEXT_LEN, MAX_MODULES};
pub use config::KeyMaterial;
pub use errors::{LicenseError, LicenseResult};
pub use identity::{Identity, IdentityKind};
pub use issue::{generate_license, LicenseRequest};
pub use store::LicenseStore;
