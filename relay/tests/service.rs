//! Relay service tests, run as an integration test so the
//! `agegate-nullables` doubles share this crate's trait definitions.

use chrono::NaiveDate;

use agegate_certification::{AdultGate, CryptoTokenRegistry, CertificationResultService};
use agegate_crypto::{derive_keys, encrypt, sign, DerivedKeys};
use agegate_nullables::{NullDirectory, RecordingOpener};
use agegate_relay::{codes, ReturnParams, ReturnRelay};
use agegate_types::{CryptoToken, Origin, Timestamp, VerificationKind};
use std::sync::Arc;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 29).unwrap()
}

fn registry_with(id: &str) -> (Arc<CryptoTokenRegistry>, DerivedKeys) {
    let registry = Arc::new(CryptoTokenRegistry::new());
    registry
        .register(CryptoToken {
            token_version_id: id.into(),
            request_timestamp: "20260829103000".into(),
            request_nonce: "relay-test-nonce".into(),
            site_code: "S777".into(),
        })
        .unwrap();
    let keys = derive_keys("20260829103000", "relay-test-nonce", id);
    (registry, keys)
}

fn relay(registry: Arc<CryptoTokenRegistry>, directory: NullDirectory) -> ReturnRelay<NullDirectory> {
    let results = CertificationResultService::new(registry, AdultGate::default(), directory);
    ReturnRelay::new(results, Origin::new("https://app.example.com"))
}

fn result_json(birthdate: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "birthdate": birthdate,
        "mobileno": "01012345678",
        "name": "Hong Gildong",
    }))
    .unwrap()
}

fn params(id: &str, enc: String, tag: String) -> ReturnParams {
    ReturnParams {
        kind: VerificationKind::Signup,
        token_version_id: id.into(),
        enc_data: enc,
        integrity_value: tag,
    }
}

#[test]
fn adult_result_posts_success_to_exact_origin() {
    let (registry, keys) = registry_with("tv-1");
    let enc = encrypt(&result_json("19900315"), &keys);
    let tag = sign(&enc, &keys);

    let relay = relay(registry, NullDirectory::new());
    let opener = RecordingOpener::attached();
    let decision = relay.handle_return(
        &params("tv-1", enc, tag),
        &opener,
        today(),
        Timestamp::new(500),
    );

    assert!(decision.delivered);
    assert!(decision.close_window);
    assert_eq!(decision.envelope.code, codes::SUCCESS);

    let posts = opener.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].1, Origin::new("https://app.example.com"));
    assert!(posts[0].0.contains("\"code\":0"));
}

#[test]
fn tampered_result_relays_integrity_failure() {
    let (registry, keys) = registry_with("tv-1");
    let enc = encrypt(&result_json("19900315"), &keys);
    let tag = sign("a different ciphertext", &keys);

    let relay = relay(registry, NullDirectory::new());
    let opener = RecordingOpener::attached();
    let decision = relay.handle_return(
        &params("tv-1", enc, tag),
        &opener,
        today(),
        Timestamp::new(500),
    );

    assert_eq!(decision.envelope.code, codes::INTEGRITY);
    // The opener still gets told: its session must fail, not hang.
    assert!(decision.delivered);
    assert!(decision.close_window);
}

#[test]
fn underage_result_relays_rejection() {
    let (registry, keys) = registry_with("tv-1");
    let enc = encrypt(&result_json("20070830"), &keys);
    let tag = sign(&enc, &keys);

    let relay = relay(registry, NullDirectory::new());
    let opener = RecordingOpener::attached();
    let decision = relay.handle_return(
        &params("tv-1", enc, tag),
        &opener,
        today(),
        Timestamp::new(500),
    );

    assert_eq!(decision.envelope.code, codes::UNDERAGE);
}

#[test]
fn detached_opener_fails_silently_but_still_closes() {
    let (registry, keys) = registry_with("tv-1");
    let enc = encrypt(&result_json("19900315"), &keys);
    let tag = sign(&enc, &keys);

    let relay = relay(registry, NullDirectory::new());
    let opener = RecordingOpener::detached();
    let decision = relay.handle_return(
        &params("tv-1", enc, tag),
        &opener,
        today(),
        Timestamp::new(500),
    );

    assert!(!decision.delivered);
    assert!(decision.close_window, "popup closes even without an opener");
    assert!(opener.posts().is_empty());
}

#[test]
fn id_recovery_chains_found_ids_into_the_envelope() {
    let (registry, keys) = registry_with("tv-1");
    let enc = encrypt(&result_json("19900315"), &keys);
    let tag = sign(&enc, &keys);

    let directory = NullDirectory::new()
        .with_account("01012345678", "alice")
        .with_account("01012345678", "alice2");
    let relay = relay(registry, directory);
    let opener = RecordingOpener::attached();

    let mut p = params("tv-1", enc, tag);
    p.kind = VerificationKind::IdRecovery;
    let decision = relay.handle_return(&p, &opener, today(), Timestamp::new(500));

    let data = decision.envelope.data.unwrap();
    assert_eq!(data.found_ids, Some(vec!["alice".into(), "alice2".into()]));
}
