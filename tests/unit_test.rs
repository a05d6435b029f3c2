use keygen_api::{
    generator::KeyGenerator,
    models::{KeyStatus, ALPHABET, COMBINATION_SPACE},
    KeyGenError, KeyStore, MemoryKeyStore, SqliteKeyStore,
};
use std::collections::HashSet;

fn backends() -> Vec<(&'static str, Box<dyn KeyStore>)> {
    vec![
        ("memory", Box::new(MemoryKeyStore::new())),
        ("sqlite", Box::new(SqliteKeyStore::new().expect("Failed to open sqlite store"))),
    ]
}

fn generators() -> Vec<(&'static str, KeyGenerator)> {
    backends()
        .into_iter()
        .map(|(name, store)| {
            (name, KeyGenerator::new(store).expect("Failed to create generator"))
        })
        .collect()
}

#[test]
fn test_generated_keys_are_well_formed() {
    for (name, kg) in generators() {
        for _ in 0..100 {
            let key = kg.generate().expect("Failed to generate key");
            assert_eq!(key.len(), 4, "{}: key {:?} must be 4 symbols", name, key);
            assert!(
                key.bytes().all(|b| ALPHABET.contains(&b)),
                "{}: key {:?} has symbols outside the alphabet",
                name,
                key
            );
        }
    }
}

#[test]
fn test_consecutive_keys_differ() {
    for (name, kg) in generators() {
        let first = kg.generate().expect("Failed to generate key");
        let second = kg.generate().expect("Failed to generate key");
        assert_ne!(first, second, "{}: consecutive keys must differ", name);
    }
}

#[test]
fn test_many_keys_are_unique() {
    let kg = KeyGenerator::new(Box::new(MemoryKeyStore::new())).unwrap();

    let mut seen = HashSet::new();
    for _ in 0..20_000 {
        let key = kg.generate().expect("Failed to generate key");
        assert!(seen.insert(key), "key issued twice");
    }
    assert_eq!(kg.issued_count(), 20_000);
}

#[test]
fn test_generated_key_is_issued() {
    for (name, kg) in generators() {
        let key = kg.generate().unwrap();
        assert_eq!(kg.status(&key).unwrap(), KeyStatus::Issued, "{}", name);
    }
}

#[test]
fn test_submit() {
    for (name, kg) in generators() {
        let key = kg.generate().unwrap();

        kg.submit(&key).expect("Failed to submit key");
        assert_eq!(kg.status(&key).unwrap(), KeyStatus::Submitted, "{}", name);

        // submit key shorter than 4 symbols
        assert!(matches!(kg.submit("sht"), Err(KeyGenError::InvalidKeyLength)));

        // submit key longer than 4 symbols
        assert!(matches!(kg.submit("longkey"), Err(KeyGenError::InvalidKeyLength)));
    }
}

#[test]
fn test_submit_not_issued_key() {
    for (name, kg) in generators() {
        assert_eq!(kg.status("noti").unwrap(), KeyStatus::NotIssued, "{}", name);
        assert!(matches!(kg.submit("noti"), Err(KeyGenError::NotIssued)));

        // rejected submit does not create a record
        assert_eq!(kg.status("noti").unwrap(), KeyStatus::NotIssued, "{}", name);
    }
}

#[test]
fn test_submit_twice() {
    for (name, kg) in generators() {
        let key = kg.generate().unwrap();

        kg.submit(&key).unwrap();
        assert!(
            matches!(kg.submit(&key), Err(KeyGenError::AlreadySubmitted)),
            "{}: second submit must fail",
            name
        );
        assert_eq!(kg.status(&key).unwrap(), KeyStatus::Submitted);
    }
}

#[test]
fn test_status_rejects_bad_length() {
    for (_, kg) in generators() {
        assert!(matches!(kg.status(""), Err(KeyGenError::InvalidKeyLength)));
        assert!(matches!(kg.status("abc"), Err(KeyGenError::InvalidKeyLength)));
        assert!(matches!(kg.status("abcde"), Err(KeyGenError::InvalidKeyLength)));
    }
}

#[test]
fn test_free_count() {
    for (name, kg) in generators() {
        assert_eq!(kg.free_count(), COMBINATION_SPACE, "{}", name);
        assert_eq!(kg.free_count(), 14_776_336);

        kg.generate().unwrap();
        assert_eq!(kg.free_count(), 14_776_335, "{}", name);

        // submitting does not give capacity back
        let key = kg.generate().unwrap();
        kg.submit(&key).unwrap();
        assert_eq!(kg.free_count(), 14_776_334, "{}", name);

        // neither do rejected calls
        let _ = kg.submit("noti");
        let _ = kg.status("sht");
        assert_eq!(kg.free_count(), 14_776_334, "{}", name);
    }
}

#[test]
fn test_existing_records_count_as_issued() {
    let store = MemoryKeyStore::new();
    store.add(keygen_api::Key::new("abcd").unwrap()).unwrap();

    let kg = KeyGenerator::new(Box::new(store)).unwrap();
    assert_eq!(kg.issued_count(), 1);
    assert_eq!(kg.free_count(), COMBINATION_SPACE - 1);
    assert_eq!(kg.status("abcd").unwrap(), KeyStatus::Issued);
}

#[test]
fn test_save() {
    for (_, kg) in generators() {
        kg.generate().unwrap();
        assert!(kg.save().is_ok());
    }
}
