//! Integration test: full account and chirp lifecycle through the public API.
//!
//! Exercises: open store → create account → login → post chirps → update
//! account with a bearer token → reopen store → verify persisted state.

use chirpy::{Account, Chirpy, ChirpyConfig, ChirpyError, TokenService, MAX_CHIRP_LEN};

fn test_config(dir: &tempfile::TempDir) -> ChirpyConfig {
    ChirpyConfig {
        db_path: dir.path().join("database.json"),
        jwt_secret: "integration-secret".to_string(),
        hash_cost: 1,
        hash_memory_kib: 1024,
        ..ChirpyConfig::default()
    }
}

fn read_raw(chirpy: &Chirpy) -> serde_json::Value {
    let bytes = std::fs::read(&chirpy.config().db_path).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[test]
fn empty_store_first_account_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let chirpy = Chirpy::open(test_config(&dir)).unwrap();

    let account = chirpy
        .repository()
        .create_account("a@x.com", "pw")
        .expect("account creation should succeed");
    assert_eq!(account.id, 1);

    // Returned value carries no password at all.
    let returned = serde_json::to_value(&account).unwrap();
    assert!(returned.get("password").is_none());

    // Persisted value is a hash.
    let raw = read_raw(&chirpy);
    let stored = raw["users"]["1"]["password"].as_str().unwrap();
    assert_ne!(stored, "pw");
    assert!(stored.starts_with("$argon2"));
    assert!(chirpy.repository().credentials().verify(stored, "pw"));
}

#[test]
fn full_workflow_login_post_update() {
    let dir = tempfile::tempdir().unwrap();
    let chirpy = Chirpy::open(test_config(&dir)).unwrap();

    // ── Accounts ──
    let alice = chirpy
        .repository()
        .create_account("alice@example.com", "alice-pw")
        .unwrap();
    let bob = chirpy
        .repository()
        .create_account("bob@example.com", "bob-pw")
        .unwrap();
    assert_eq!((alice.id, bob.id), (1, 2));

    // ── Login ──
    let login = chirpy.login("alice@example.com", "alice-pw", 60).unwrap();
    assert_eq!(login.id, alice.id);
    assert_eq!(chirpy.tokens().verify(&login.token).unwrap(), alice.id);

    let bad = chirpy.login("alice@example.com", "bob-pw", 60).unwrap_err();
    assert!(matches!(bad, ChirpyError::Auth(_)));
    let missing = chirpy.login("carol@example.com", "pw", 60).unwrap_err();
    assert!(matches!(missing, ChirpyError::NotFound(_)));

    // ── Chirps ──
    let longest = "x".repeat(MAX_CHIRP_LEN);
    let bodies = ["first", "second", longest.as_str()];
    for body in bodies {
        let chirp = chirpy.repository().create_message(body).unwrap();
        assert_eq!(chirpy.repository().get_message(chirp.id).unwrap(), chirp);
    }
    let too_long = chirpy
        .repository()
        .create_message(&"x".repeat(MAX_CHIRP_LEN + 1))
        .unwrap_err();
    assert_eq!(too_long.status_code(), 400);
    assert_eq!(chirpy.repository().list_messages().unwrap().len(), 3);

    // ── Update through the bearer header ──
    let updated = chirpy
        .update_account_with_bearer(
            &format!("Bearer {}", login.token),
            "alice@new.example.com",
            "alice-pw-2",
        )
        .unwrap();
    assert_eq!(
        updated,
        Account {
            id: alice.id,
            email: "alice@new.example.com".to_string()
        }
    );

    // Bob's account is untouched.
    assert!(chirpy.login("bob@example.com", "bob-pw", 0).is_ok());

    // ── Reopen and check everything survived ──
    let config = chirpy.config().clone();
    drop(chirpy);
    let reopened = Chirpy::open(config).unwrap();

    let chirps = reopened.repository().list_messages().unwrap();
    assert_eq!(
        chirps.iter().map(|c| c.id).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert!(reopened
        .login("alice@new.example.com", "alice-pw-2", 0)
        .is_ok());
    assert!(reopened
        .repository()
        .find_account_by_email("alice@example.com")
        .unwrap()
        .is_none());

    // The pre-restart token still verifies: tokens are stateless.
    assert_eq!(reopened.tokens().verify(&login.token).unwrap(), alice.id);
}

#[test]
fn duplicate_email_leaves_exactly_one_account() {
    let dir = tempfile::tempdir().unwrap();
    let chirpy = Chirpy::open(test_config(&dir)).unwrap();

    chirpy
        .repository()
        .create_account("dup@x.com", "first")
        .unwrap();
    let err = chirpy
        .repository()
        .create_account("dup@x.com", "second")
        .unwrap_err();
    assert!(matches!(err, ChirpyError::DuplicateEmail(_)));
    assert_eq!(err.status_code(), 409);

    let raw = read_raw(&chirpy);
    let users = raw["users"].as_object().unwrap();
    let matching = users
        .values()
        .filter(|u| u["email"] == "dup@x.com")
        .count();
    assert_eq!(matching, 1);

    // The next account still gets id 2: the rejected insert consumed nothing.
    let next = chirpy
        .repository()
        .create_account("other@x.com", "pw")
        .unwrap();
    assert_eq!(next.id, 2);
}

#[test]
fn token_expires_after_lifetime() {
    let tokens = TokenService::new("integration-secret", 86_400).unwrap();
    let issued_at = 1_700_000_000;
    let token = tokens.issue_at(5, 60, issued_at).unwrap();

    assert_eq!(tokens.verify_at(&token, issued_at + 1).unwrap(), 5);
    assert!(matches!(
        tokens.verify_at(&token, issued_at + 61),
        Err(ChirpyError::Auth(_))
    ));
}

#[test]
fn token_with_real_clock_expires() {
    let tokens = TokenService::new("integration-secret", 86_400).unwrap();
    let token = tokens.issue(9, 1).unwrap();
    assert_eq!(tokens.verify(&token).unwrap(), 9);

    std::thread::sleep(std::time::Duration::from_millis(2_100));
    assert!(matches!(tokens.verify(&token), Err(ChirpyError::Auth(_))));
}

#[test]
fn requested_lifetime_is_clamped() {
    let tokens = TokenService::new("integration-secret", 3_600).unwrap();
    let now = 1_700_000_000;

    for requested in [0, 3_601, u64::MAX] {
        let token = tokens.issue_at(1, requested, now).unwrap();
        // valid right up to the max lifetime, never beyond
        assert!(tokens.verify_at(&token, now + 3_599).is_ok());
        assert!(tokens.verify_at(&token, now + 3_600).is_err());
    }
}

#[test]
fn open_with_empty_secret_fails_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    let config = ChirpyConfig {
        jwt_secret: String::new(),
        ..test_config(&dir)
    };
    let err = Chirpy::open(config).unwrap_err();
    assert!(matches!(err, ChirpyError::Config(_)));
}

#[test]
fn null_collections_are_readable() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    // Layout written by earlier releases on first start.
    std::fs::write(&config.db_path, br#"{"chirps":null,"users":null}"#).unwrap();

    let chirpy = Chirpy::open(config).unwrap();
    assert!(chirpy.repository().list_messages().unwrap().is_empty());
    assert_eq!(chirpy.repository().create_message("hi").unwrap().id, 1);
}
