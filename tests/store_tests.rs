use std::sync::Arc;
use std::thread;

use modkey::config::KeyMaterial;
use modkey::errors::LicenseError;
use modkey::identity::encode_identity;
use modkey::issue::{generate_license, LicenseRequest};
use modkey::store::LicenseStore;

fn issue(keys: &KeyMaterial, expiry: &str, auth_code: &str, seed: char, modules: &[&str]) -> String {
    let request = LicenseRequest {
        computer_key: encode_identity(0x5151_2323),
        expiry: expiry.to_string(),
        auth_code: auth_code.to_string(),
        seed_char: seed,
        module_ids: modules.iter().map(|m| m.to_string()).collect(),
    };
    generate_license(&request, keys).expect("license issues")
}

#[test]
fn add_twice_keeps_single_entry() {
    let keys = KeyMaterial::default();
    let store = LicenseStore::new(keys);
    let text = issue(&keys, "203404", "fe80", 'A', &["01"]);

    store.add_license(&text).unwrap();
    store.add_license(&text).unwrap();
    assert_eq!(store.len(), 1);
    assert!(store.is_module_licensed_at(0x01, 2034, 0).is_ok());
}

#[test]
fn distinct_texts_accumulate() {
    let keys = KeyMaterial::default();
    let store = LicenseStore::new(keys);
    store
        .add_license(&issue(&keys, "203404", "fe80", 'A', &["01"]))
        .unwrap();
    store
        .add_license(&issue(&keys, "203404", "fe80", 'B', &["02"]))
        .unwrap();
    assert_eq!(store.len(), 2);
    assert!(store.is_module_licensed_at(0x01, 2034, 0).is_ok());
    assert!(store.is_module_licensed_at(0x02, 2034, 0).is_ok());
}

#[test]
fn module_queries_distinguish_expired_from_missing() {
    let keys = KeyMaterial::default();
    let store = LicenseStore::new(keys);
    store
        .add_license(&issue(&keys, "203306", "fe80", 'C', &["0a", "0b"]))
        .unwrap();

    // Within validity.
    assert!(store.is_module_licensed_at(0x0a, 2033, 5).is_ok());
    // July 2033: the June license has lapsed.
    assert_eq!(
        store.is_module_licensed_at(0x0a, 2033, 6),
        Err(LicenseError::Expired)
    );
    // A module no license mentions.
    assert_eq!(
        store.is_module_licensed_at(0x0c, 2033, 5),
        Err(LicenseError::NotFound)
    );
}

#[test]
fn authentication_matches_exact_code_only() {
    let keys = KeyMaterial::default();
    let store = LicenseStore::new(keys);
    store
        .add_license(&issue(&keys, "203404", "beef", 'D', &["01"]))
        .unwrap();

    assert!(store
        .is_module_authenticated_at(0x01, 0xbeef, 2034, 0)
        .is_ok());
    assert_eq!(
        store.is_module_authenticated_at(0x01, 0xbeee, 2034, 0),
        Err(LicenseError::Unauthenticated)
    );
    assert_eq!(
        store.is_module_authenticated_at(0x02, 0xbeef, 2034, 0),
        Err(LicenseError::Unauthenticated)
    );
}

#[test]
fn malformed_and_expired_texts_never_enter_the_store() {
    let keys = KeyMaterial::default();
    let store = LicenseStore::new(keys);

    assert_eq!(
        store.add_license("way-too-short"),
        Err(LicenseError::BadLength)
    );
    // January 2013 lapsed long ago.
    let stale = issue(&keys, "201301", "fe80", 'E', &["01"]);
    assert_eq!(store.add_license(&stale), Err(LicenseError::Expired));
    assert!(store.is_empty());
}

#[test]
fn concurrent_readers_and_writers() {
    let keys = KeyMaterial::default();
    let store = Arc::new(LicenseStore::new(keys));

    let texts: Vec<String> = ('A'..='H')
        .enumerate()
        .map(|(i, seed)| issue(&keys, "203404", "fe80", seed, &[&format!("{:02x}", i + 1)]))
        .collect();

    let mut handles = Vec::new();
    for text in texts {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            store.add_license(&text).unwrap();
        }));
    }
    for _ in 0..4 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            // Readers run against whatever has landed so far; they must
            // never observe an error other than the policy kinds.
            for id in 1..=8u8 {
                match store.is_module_licensed_at(id, 2034, 0) {
                    Ok(()) | Err(LicenseError::NotFound) | Err(LicenseError::Expired) => {}
                    Err(other) => panic!("unexpected store error: {other}"),
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 8);
    for id in 1..=8u8 {
        assert!(store.is_module_licensed_at(id, 2034, 0).is_ok());
    }
}

#[test]
fn clear_resets_everything() {
    let keys = KeyMaterial::default();
    let store = LicenseStore::new(keys);
    let text = issue(&keys, "203404", "fe80", 'Z', &["01", "02"]);
    store.add_license(&text).unwrap();
    store.clear();

    assert!(store.is_empty());
    assert_eq!(
        store.is_module_licensed_at(0x01, 2034, 0),
        Err(LicenseError::NotFound)
    );
    // The same text can be re-added after a clear.
    store.add_license(&text).unwrap();
    assert_eq!(store.len(), 1);
}
