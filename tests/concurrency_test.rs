use keygen_api::{KeyGenError, KeyGenerator, KeyStatus, KeyStore, MemoryKeyStore, SqliteKeyStore};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 64;

fn concurrent_generate(store: Box<dyn KeyStore>) {
    let kg = Arc::new(KeyGenerator::new(store).expect("Failed to create generator"));
    let before = kg.issued_count();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let kg = Arc::clone(&kg);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                kg.generate().expect("Failed to generate key")
            })
        })
        .collect();

    let keys: HashSet<String> = handles
        .into_iter()
        .map(|h| h.join().expect("generator thread panicked"))
        .collect();

    assert_eq!(keys.len(), THREADS);
    assert_eq!(kg.issued_count() - before, THREADS as u64);
    for key in &keys {
        assert_eq!(kg.status(key).unwrap(), KeyStatus::Issued);
    }
}

#[test]
fn test_concurrent_generate_memory() {
    concurrent_generate(Box::new(MemoryKeyStore::new()));
}

#[test]
fn test_concurrent_generate_sqlite() {
    concurrent_generate(Box::new(SqliteKeyStore::new().expect("Failed to open sqlite store")));
}

#[test]
fn test_concurrent_submit_succeeds_once() {
    let kg = Arc::new(KeyGenerator::new(Box::new(MemoryKeyStore::new())).unwrap());
    let key = kg.generate().unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let kg = Arc::clone(&kg);
            let barrier = Arc::clone(&barrier);
            let key = key.clone();
            thread::spawn(move || {
                barrier.wait();
                kg.submit(&key)
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("submit thread panicked"))
        .collect();

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(KeyGenError::AlreadySubmitted)))
        .count();
    assert_eq!(accepted, 1);
    assert_eq!(rejected, THREADS - 1);
    assert_eq!(kg.status(&key).unwrap(), KeyStatus::Submitted);
}
