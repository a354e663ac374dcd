use modkey::codec::{self, LicenseRecord, LICENSE_TEXT_LEN};
use modkey::config::KeyMaterial;
use modkey::encoding::BASE32_SYMBOLS;
use modkey::errors::LicenseError;
use modkey::identity::{decode_identity, encode_identity};
use modkey::issue::{generate_license, LicenseRequest};

/// End-to-end issue flow: identity token in, 29-character license out,
/// decode reproduces every field.
#[test]
fn issue_and_decode_end_to_end() {
    let keys = KeyMaterial::default();
    let computer_key = encode_identity(0x7A3D_91C4);

    let request = LicenseRequest {
        computer_key: computer_key.clone(),
        expiry: "201402".to_string(),
        auth_code: "fe80".to_string(),
        seed_char: '8',
        module_ids: vec!["01".into(), "02".into(), "04".into(), "f0".into()],
    };

    let text = generate_license(&request, &keys).expect("license generates");
    assert_eq!(text.len(), LICENSE_TEXT_LEN);
    assert!(text.ends_with('8'));

    let (record, seed) = codec::decode(&text, &keys).expect("license decodes");
    assert_eq!(seed, '8');
    assert_eq!(record.computer_key, decode_identity(&computer_key).unwrap());
    // February 2014 = 13 months past January 2013.
    assert_eq!(record.expiry_month, 13);
    assert_eq!(record.expiry_year(), 2014);
    assert_eq!(record.expiry_month0(), 1);
    assert_eq!(record.auth_code, 0xfe80);
    assert_eq!(record.modules(), &[0x01, 0x02, 0x04, 0xf0]);
}

/// Fixed-vector regression: a license minted by an earlier build of the
/// issuer. It must clear every format gate; the integrity outcome depends
/// only on the key material.
#[test]
fn known_vector_passes_format_gates() {
    let keys = KeyMaterial::default();
    let text = "SKLJC-GHHT8-4PGNC-AQ47X-NUSD8";
    assert_eq!(text.len(), LICENSE_TEXT_LEN);

    match codec::decode(text, &keys) {
        Ok(_) | Err(LicenseError::BadChecksum) => {}
        Err(other) => panic!("format gate rejected known vector: {other}"),
    }
}

/// Round-trip law across the whole seed alphabet and digits.
#[test]
fn round_trip_over_all_seed_characters() {
    let keys = KeyMaterial::default();
    let record = LicenseRecord::new(0x0102_0304, 0xABCD, 200, &[0x11, 0x22]).unwrap();

    let mut seeds: Vec<char> = BASE32_SYMBOLS.chars().collect();
    seeds.extend(['0', '1', 'I', 'O', '!', '~']);
    for seed in seeds {
        let text = codec::encode(&record, &keys, seed).unwrap();
        assert_eq!(text.len(), LICENSE_TEXT_LEN);
        let (decoded, decoded_seed) = codec::decode(&text, &keys)
            .unwrap_or_else(|e| panic!("seed {seed:?} failed decode: {e}"));
        assert_eq!(decoded_seed, seed);
        assert_eq!(decoded.computer_key, record.computer_key);
        assert_eq!(decoded.auth_code, record.auth_code);
        assert_eq!(decoded.expiry_month, record.expiry_month);
        assert_eq!(decoded.modules(), record.modules());
    }
}

/// Licenses for the same record under different seeds must differ in body,
/// not just in their final character.
#[test]
fn different_seeds_produce_different_ciphertexts() {
    let keys = KeyMaterial::default();
    let record = LicenseRecord::new(5, 5, 100, &[1, 2, 3, 4, 5, 6]).unwrap();
    let a = codec::encode(&record, &keys, 'A').unwrap();
    let b = codec::encode(&record, &keys, 'B').unwrap();
    assert_ne!(a[..LICENSE_TEXT_LEN - 1], b[..LICENSE_TEXT_LEN - 1]);
}

/// Alternate key material produces incompatible licenses.
#[test]
fn licenses_are_bound_to_key_material() {
    let issuing = KeyMaterial::default();
    let other = KeyMaterial::from_hex(
        "000102030405060708090a0b0c0d0e0f",
        "f29e7d85ec1f41791062a2c9dce28c",
    )
    .unwrap();

    let record = LicenseRecord::new(0xBEEF, 0x1234, 150, &[0x0a]).unwrap();
    let text = codec::encode(&record, &issuing, 'M').unwrap();

    match codec::decode(&text, &other) {
        Ok((decoded, _)) => assert_ne!(decoded.computer_key, record.computer_key),
        Err(e) => assert_eq!(e, LicenseError::BadChecksum),
    }
}

/// Public info projection without touching a store.
#[test]
fn inspect_reports_expiry_and_modules() {
    let keys = KeyMaterial::default();
    let request = LicenseRequest {
        computer_key: encode_identity(42),
        expiry: "203012".to_string(),
        auth_code: "0001".to_string(),
        seed_char: 'Z',
        module_ids: vec!["0a".into(), "0b".into()],
    };
    let text = generate_license(&request, &keys).unwrap();

    let info = codec::inspect(&text, &keys).unwrap();
    assert_eq!(info.year, 2030);
    assert_eq!(info.month, 12);
    assert_eq!(info.modules, vec![0x0a, 0x0b]);
}

/// Issue-side field validation surfaces the specific error kind.
#[test]
fn issue_validates_each_field() {
    let keys = KeyMaterial::default();
    let valid = LicenseRequest {
        computer_key: encode_identity(7),
        expiry: "202506".to_string(),
        auth_code: "00ff".to_string(),
        seed_char: 'K',
        module_ids: vec!["01".into()],
    };

    let mut bad = valid.clone();
    bad.computer_key = "SHORT".to_string();
    assert_eq!(
        generate_license(&bad, &keys),
        Err(LicenseError::ComputerKeyLength)
    );

    let mut bad = valid.clone();
    bad.expiry = "20250".to_string();
    assert_eq!(
        generate_license(&bad, &keys),
        Err(LicenseError::ExpiryDateLength)
    );

    let mut bad = valid.clone();
    bad.expiry = "209901".to_string();
    assert_eq!(
        generate_license(&bad, &keys),
        Err(LicenseError::ExpiryDateRange)
    );

    // Clears the year and month bounds but overflows the one-byte expiry
    // field; must be rejected, never wrapped into an already-lapsed month.
    let mut bad = valid.clone();
    bad.expiry = "203412".to_string();
    assert_eq!(
        generate_license(&bad, &keys),
        Err(LicenseError::ExpiryDateRange)
    );

    let mut bad = valid.clone();
    bad.auth_code = "xyzw".to_string();
    assert_eq!(
        generate_license(&bad, &keys),
        Err(LicenseError::AuthCodeInvalid)
    );

    let mut bad = valid.clone();
    bad.module_ids = vec!["001".into()];
    assert_eq!(
        generate_license(&bad, &keys),
        Err(LicenseError::ModuleIdInvalid)
    );

    let mut bad = valid;
    bad.module_ids.clear();
    assert_eq!(generate_license(&bad, &keys), Err(LicenseError::NoModuleIds));
}
