//! Token forgery and key lifetime tests for both tokenizers.
//!
//! Run with: `cargo test --features jwt --test security`

#![cfg(feature = "jwt")]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use latchkey::{
    HmacTokenizer, JwtOptions, JwtTokenizer, Rotation, RotationConfig, SessionValues,
    SystemClock, Tokenizer, rotation_callback,
};
use sha2::Sha256;

fn values() -> SessionValues {
    let mut values = SessionValues::fresh("session-under-test", Utc::now() + Duration::hours(1));
    values.insert("role", "member");
    values.insert("user", "42");
    values
}

/// A tokenizer with live keys, plus the rotation that feeds it.
fn wired(tokenizer: Arc<dyn Tokenizer>) -> Rotation {
    Rotation::new(
        RotationConfig::default(),
        Arc::new(SystemClock),
        rotation_callback(tokenizer),
    )
    .unwrap()
}

fn tokenizers() -> Vec<(&'static str, Arc<dyn Tokenizer>)> {
    vec![
        ("hmac", Arc::new(HmacTokenizer::new())),
        ("jwt", Arc::new(JwtTokenizer::new(JwtOptions::default()))),
    ]
}

/// Flips one character at `index` to a different character of the same class.
fn flip(token: &str, index: usize) -> String {
    let mut bytes = token.as_bytes().to_vec();
    bytes[index] = match bytes[index] {
        b'a' => b'b',
        b'0' => b'1',
        b'A' => b'B',
        _ => b'a',
    };
    String::from_utf8(bytes).unwrap()
}

#[test]
fn test_every_single_byte_tamper_is_rejected() {
    for (name, tokenizer) in tokenizers() {
        let _rotation = wired(Arc::clone(&tokenizer));
        let token = tokenizer.encode(&values()).unwrap();
        assert!(tokenizer.decode(&token).is_some(), "{name}: valid token rejected");

        for index in (0..token.len()).filter(|&i| token.as_bytes()[i] != b'.') {
            let forged = flip(&token, index);
            assert!(
                tokenizer.decode(&forged).is_none(),
                "{name}: tampered byte {index} accepted"
            );
        }
    }
}

#[test]
fn test_truncated_and_empty_tokens_are_rejected() {
    for (name, tokenizer) in tokenizers() {
        let _rotation = wired(Arc::clone(&tokenizer));
        let token = tokenizer.encode(&values()).unwrap();

        assert!(tokenizer.decode("").is_none(), "{name}");
        assert!(tokenizer.decode(&token[..token.len() - 1]).is_none(), "{name}");
        assert!(tokenizer.decode(&token[..10]).is_none(), "{name}");
    }
}

#[test]
fn test_token_survives_one_rotation_only() {
    for (name, tokenizer) in tokenizers() {
        let rotation = wired(Arc::clone(&tokenizer));
        let token = tokenizer.encode(&values()).unwrap();

        rotation.rotate(Utc::now()).unwrap();
        let decoded = tokenizer.decode(&token);
        assert_eq!(
            decoded.as_ref().map(SessionValues::id),
            Some("session-under-test"),
            "{name}: token signed by the past key rejected"
        );

        rotation.rotate(Utc::now()).unwrap();
        assert!(
            tokenizer.decode(&token).is_none(),
            "{name}: token outlived its signing key"
        );
    }
}

#[test]
fn test_tokenizers_do_not_share_keys() {
    let first: Arc<dyn Tokenizer> = Arc::new(HmacTokenizer::new());
    let second: Arc<dyn Tokenizer> = Arc::new(HmacTokenizer::new());
    let _first_rotation = wired(Arc::clone(&first));
    let _second_rotation = wired(Arc::clone(&second));

    let token = first.encode(&values()).unwrap();
    assert!(second.decode(&token).is_none());
}

fn jwt_parts(token: &str) -> (String, String) {
    let mut parts = token.split('.');
    let header = parts.next().unwrap().to_owned();
    let payload = parts.next().unwrap().to_owned();
    (header, payload)
}

#[test]
fn test_jwt_alg_none_is_rejected() {
    let tokenizer = Arc::new(JwtTokenizer::new(JwtOptions::default()));
    let rotation = wired(tokenizer.clone());
    let kid = rotation.snapshot().unwrap().present.id().to_owned();

    let token = tokenizer.encode(&values()).unwrap();
    let (_, payload) = jwt_parts(&token);
    let header = URL_SAFE_NO_PAD.encode(format!(r#"{{"alg":"none","typ":"JWT","kid":"{kid}"}}"#));

    assert!(tokenizer.decode(&format!("{header}.{payload}.")).is_none());
}

#[test]
fn test_jwt_public_key_algorithm_with_hmac_signature_is_rejected() {
    let tokenizer = Arc::new(JwtTokenizer::new(JwtOptions::default()));
    let rotation = wired(tokenizer.clone());
    let present = rotation.snapshot().unwrap().present;

    let token = tokenizer.encode(&values()).unwrap();
    let (_, payload) = jwt_parts(&token);
    let header = URL_SAFE_NO_PAD.encode(format!(
        r#"{{"alg":"RS256","typ":"JWT","kid":"{}"}}"#,
        present.id()
    ));

    let mut mac = Hmac::<Sha256>::new_from_slice(present.entropy()).unwrap();
    mac.update(format!("{header}.{payload}").as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    assert!(tokenizer.decode(&format!("{header}.{payload}.{signature}")).is_none());
}

#[test]
fn test_jwt_unknown_kid_is_rejected() {
    let tokenizer = Arc::new(JwtTokenizer::new(JwtOptions::default()));
    let rotation = wired(tokenizer.clone());
    let present = rotation.snapshot().unwrap().present;

    let token = tokenizer.encode(&values()).unwrap();
    let (_, payload) = jwt_parts(&token);
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT","kid":"nobody"}"#);

    // Correctly signed with a live key, but under an ID no generation has.
    let mut mac = Hmac::<Sha256>::new_from_slice(present.entropy()).unwrap();
    mac.update(format!("{header}.{payload}").as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    assert!(tokenizer.decode(&format!("{header}.{payload}.{signature}")).is_none());
}

#[test]
fn test_jwt_expired_token_is_rejected() {
    let tokenizer = Arc::new(JwtTokenizer::new(JwtOptions::default()));
    let _rotation = wired(tokenizer.clone());

    let expired = SessionValues::fresh("stale", Utc::now() - Duration::seconds(30));
    let token = tokenizer.encode(&expired).unwrap();

    assert!(tokenizer.decode(&token).is_none());
}

#[test]
fn test_jwt_issuer_mismatch_is_rejected() {
    let issuer_a = Arc::new(JwtTokenizer::new(JwtOptions::new().with_issuer("service-a")));
    let issuer_b = Arc::new(JwtTokenizer::new(JwtOptions::new().with_issuer("service-b")));
    let rotation = wired(issuer_a.clone());

    let snapshot = rotation.snapshot().unwrap();
    issuer_b
        .rotate(Arc::clone(&snapshot.present), Arc::clone(&snapshot.past))
        .unwrap();

    let token = issuer_a.encode(&values()).unwrap();
    assert!(issuer_a.decode(&token).is_some());
    assert!(issuer_b.decode(&token).is_none());
}
