//! Unit tests for the JWT codec

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use mk_shared::config::JwtConfig;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::account::Authority;
use crate::domain::entities::refresh_record::RefreshRecord;
use crate::domain::entities::token::{AccessClaims, RefreshClaims};
use crate::errors::{CredentialFailure, DomainError, TokenError};
use crate::services::token::{Clock, JwtCodec, ManualClock, TokenCodec};

fn codec_with(secret: &str, algorithm: &str) -> (JwtCodec, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::starting_now());
    let mut config = JwtConfig::new(secret);
    config.algorithm = algorithm.to_string();
    (JwtCodec::new(&config, clock.clone()).unwrap(), clock)
}

fn cause_of(err: DomainError) -> CredentialFailure {
    match err {
        DomainError::Token(TokenError::InvalidCredential { cause }) => cause,
        other => panic!("expected invalid credential, got {:?}", other),
    }
}

#[test]
fn test_default_algorithm_is_hs512() {
    let clock = Arc::new(ManualClock::starting_now());
    let codec = JwtCodec::new(&JwtConfig::new("secret"), clock).unwrap();
    assert_eq!(codec.algorithm(), Algorithm::HS512);
}

#[test]
fn test_rejects_bad_configuration() {
    let clock = Arc::new(ManualClock::starting_now());
    assert!(JwtCodec::new(&JwtConfig::new(""), clock.clone()).is_err());

    let mut config = JwtConfig::new("secret");
    config.algorithm = "RS256".to_string();
    assert!(JwtCodec::new(&config, clock).is_err());
}

#[test]
fn test_access_token_carries_authorities() {
    let (codec, clock) = codec_with("secret", "HS512");
    let owner = Uuid::new_v4();
    let authorities = BTreeSet::from([Authority::RoleUser, Authority::RoleAdmin]);
    let claims = AccessClaims::new(owner, &authorities, clock.now(), Duration::minutes(15));

    let token = codec.sign_access(&claims).unwrap();
    let verified = codec.verify_access(&token).unwrap();

    assert_eq!(verified, claims);
    assert_eq!(verified.parsed_authorities(), authorities);
}

#[test]
fn test_refresh_token_carries_record_id_only() {
    let (codec, clock) = codec_with("secret", "HS256");
    let record = RefreshRecord::issued_at(Uuid::new_v4(), clock.now(), Duration::days(30));

    let token = codec.sign_refresh(&RefreshClaims::for_record(&record)).unwrap();
    let verified = codec.verify_refresh(&token).unwrap();
    assert_eq!(verified.record_id().unwrap(), record.id);

    // A refresh token is not an access token
    let err = codec.verify_access(&token).unwrap_err();
    assert_eq!(cause_of(err), CredentialFailure::Malformed);
}

#[test]
fn test_access_token_is_not_a_refresh_token() {
    let (codec, clock) = codec_with("secret", "HS512");
    let claims = AccessClaims::new(
        Uuid::new_v4(),
        &BTreeSet::from([Authority::RoleUser]),
        clock.now(),
        Duration::minutes(15),
    );
    let token = codec.sign_access(&claims).unwrap();

    let err = codec.verify_refresh(&token).unwrap_err();
    assert_eq!(cause_of(err), CredentialFailure::Malformed);
}

#[test]
fn test_refresh_token_is_not_an_access_token() {
    let (codec, clock) = codec_with("secret", "HS512");
    let record = RefreshRecord::issued_at(Uuid::new_v4(), clock.now(), Duration::days(1));
    let token = codec.sign_refresh(&RefreshClaims::for_record(&record)).unwrap();

    // No `authorities` claim, so it never deserializes as access claims
    let err = codec.verify_access(&token).unwrap_err();
    assert_eq!(cause_of(err), CredentialFailure::Malformed);
}

#[test]
fn test_wrong_secret_is_a_signature_failure() {
    let (signer, clock) = codec_with("secret-a", "HS512");
    let (verifier, _) = codec_with("secret-b", "HS512");
    let record = RefreshRecord::issued_at(Uuid::new_v4(), clock.now(), Duration::days(1));

    let token = signer.sign_refresh(&RefreshClaims::for_record(&record)).unwrap();
    let err = verifier.verify_refresh(&token).unwrap_err();
    assert_eq!(cause_of(err), CredentialFailure::Signature);
}

#[test]
fn test_other_algorithm_is_rejected() {
    let (signer, clock) = codec_with("secret", "HS256");
    let (verifier, _) = codec_with("secret", "HS512");
    let record = RefreshRecord::issued_at(Uuid::new_v4(), clock.now(), Duration::days(1));

    let token = signer.sign_refresh(&RefreshClaims::for_record(&record)).unwrap();
    let err = verifier.verify_refresh(&token).unwrap_err();
    assert_eq!(cause_of(err), CredentialFailure::Signature);
}

#[test]
fn test_garbage_is_malformed() {
    let (codec, _) = codec_with("secret", "HS512");
    for token in ["", "not-a-token", "a.b.c"] {
        let err = codec.verify_refresh(token).unwrap_err();
        assert!(err.is_invalid_credential());
        assert!(!err.is_security_incident());
    }
}

#[test]
fn test_expiry_follows_the_clock_without_leeway() {
    let (codec, clock) = codec_with("secret", "HS512");
    let record = RefreshRecord::issued_at(Uuid::new_v4(), clock.now(), Duration::hours(1));
    let token = codec.sign_refresh(&RefreshClaims::for_record(&record)).unwrap();

    clock.advance(Duration::minutes(59));
    assert!(codec.verify_refresh(&token).is_ok());

    clock.set(record.expires_at);
    let err = codec.verify_refresh(&token).unwrap_err();
    assert_eq!(cause_of(err), CredentialFailure::Expired);
}

#[test]
fn test_token_without_exp_is_malformed() {
    let (codec, _) = codec_with("secret", "HS512");
    let claims = serde_json::json!({
        "sub": Uuid::new_v4().to_string(),
        "iat": Utc::now().timestamp(),
        "jti": Uuid::new_v4().to_string(),
    });
    let token = encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(b"secret"),
    )
    .unwrap();

    let err = codec.verify_refresh(&token).unwrap_err();
    assert_eq!(cause_of(err), CredentialFailure::Malformed);
}
