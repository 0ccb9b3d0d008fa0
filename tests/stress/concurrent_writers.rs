//! Stress test: many threads writing through one repository must never lose
//! a record, duplicate an id, or admit the same email twice.

use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;

use chirpy::storage::DocumentStore;
use chirpy::{ChirpyError, CredentialManager, HashCost, Repository};

fn open_repo(dir: &tempfile::TempDir) -> Arc<Repository> {
    let credentials = CredentialManager::new(HashCost {
        iterations: 1,
        memory_kib: 1024,
    })
    .unwrap();
    let store = DocumentStore::new(dir.path().join("database.json"));
    Arc::new(Repository::open(store, credentials).unwrap())
}

#[test]
fn stress_concurrent_create_message_no_lost_writes() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;

    let tmp = tempfile::tempdir().unwrap();
    let repo = open_repo(&tmp);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let repo = Arc::clone(&repo);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..PER_THREAD)
                    .map(|i| {
                        repo.create_message(&format!("thread {t} chirp {i}"))
                            .expect("create should succeed")
                            .id
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids = BTreeSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(ids.insert(id), "id {id} handed out twice");
        }
    }

    let total = THREADS * PER_THREAD;
    assert_eq!(ids.len(), total);
    assert_eq!(ids.iter().copied().collect::<Vec<_>>(), (1..=total as u64).collect::<Vec<_>>());

    let listed = repo.list_messages().unwrap();
    assert_eq!(listed.len(), total, "every write must survive");
}

#[test]
fn stress_concurrent_same_email_exactly_one_wins() {
    const THREADS: usize = 8;

    let tmp = tempfile::tempdir().unwrap();
    let repo = open_repo(&tmp);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let repo = Arc::clone(&repo);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                repo.create_account("race@example.com", &format!("pw-{t}"))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(ChirpyError::DuplicateEmail(_))))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(duplicates, THREADS - 1);
    assert_eq!(repo.store().load().unwrap().user_count(), 1);
}

#[test]
fn stress_readers_see_consistent_documents_during_writes() {
    const WRITES: usize = 100;

    let tmp = tempfile::tempdir().unwrap();
    let repo = open_repo(&tmp);

    let writer = {
        let repo = Arc::clone(&repo);
        thread::spawn(move || {
            for i in 0..WRITES {
                repo.create_message(&format!("chirp {i}")).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                let mut last_len = 0;
                for _ in 0..50 {
                    // Never a torn or corrupt read, and never going backwards.
                    let chirps = repo.list_messages().expect("read should succeed");
                    assert!(chirps.len() >= last_len);
                    assert!(chirps.windows(2).all(|w| w[0].id < w[1].id));
                    last_len = chirps.len();
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(repo.list_messages().unwrap().len(), WRITES);
}

#[test]
fn stress_mixed_chirps_and_accounts_use_separate_counters() {
    let tmp = tempfile::tempdir().unwrap();
    let repo = open_repo(&tmp);

    let chirps = {
        let repo = Arc::clone(&repo);
        thread::spawn(move || {
            for i in 0..20 {
                repo.create_message(&format!("chirp {i}")).unwrap();
            }
        })
    };
    let accounts = {
        let repo = Arc::clone(&repo);
        thread::spawn(move || {
            for i in 0..20 {
                repo.create_account(&format!("user{i}@example.com"), "pw")
                    .unwrap();
            }
        })
    };
    chirps.join().unwrap();
    accounts.join().unwrap();

    let counters = repo.counters();
    assert_eq!(counters.last_chirp_id, 20);
    assert_eq!(counters.last_user_id, 20);
    assert_eq!(repo.get_account(20).unwrap().id, 20);
    assert_eq!(repo.get_message(20).unwrap().id, 20);
}
