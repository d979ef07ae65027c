//! End-to-end scenarios for refresh rotation through the auth gateway

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use chrono::Duration;
    use uuid::Uuid;

    use mk_core::domain::entities::account::{Account, AccountStatus};
    use mk_core::domain::value_objects::{RefreshTokenRequest, TokenResponse};
    use mk_core::errors::{CredentialFailure, DomainError, IncidentKind, TokenError};
    use mk_core::repositories::{
        AccountDirectory, CredentialStore, InMemoryAccountDirectory, InMemoryCredentialStore,
    };
    use mk_core::services::{
        AuthGateway, JwtCodec, ManualClock, RotationEngine, RotationEngineConfig, TokenCodec,
    };
    use mk_shared::config::{JwtConfig, ReuseRevocation, RotationConfig};
    use mk_shared::errors::{error_codes, IntoErrorResponse};

    type Gateway = AuthGateway<InMemoryCredentialStore, InMemoryAccountDirectory, JwtCodec>;

    struct World {
        gateway: Gateway,
        store: Arc<InMemoryCredentialStore>,
        accounts: Arc<InMemoryAccountDirectory>,
        codec: Arc<JwtCodec>,
        clock: Arc<ManualClock>,
    }

    fn world(reuse_revocation: ReuseRevocation) -> World {
        let jwt = JwtConfig::new("scenario-secret");
        let rotation = RotationConfig {
            reuse_revocation,
            prune_on_refresh: false,
        };
        let config = RotationEngineConfig::from_config(&jwt, &rotation).unwrap();

        let store = Arc::new(InMemoryCredentialStore::new());
        let accounts = Arc::new(InMemoryAccountDirectory::new());
        let clock = Arc::new(ManualClock::starting_now());
        let codec = Arc::new(JwtCodec::new(&jwt, clock.clone()).unwrap());
        let engine = RotationEngine::new(
            store.clone(),
            accounts.clone(),
            codec.clone(),
            clock.clone(),
            config,
        );

        World {
            gateway: AuthGateway::new(Arc::new(engine)),
            store,
            accounts,
            codec,
            clock,
        }
    }

    fn jti(world: &World, response: &TokenResponse) -> Uuid {
        world
            .codec
            .verify_refresh(&response.refresh_token)
            .unwrap()
            .record_id()
            .unwrap()
    }

    fn request(response: &TokenResponse) -> RefreshTokenRequest {
        RefreshTokenRequest {
            refresh_token: response.refresh_token.clone(),
        }
    }

    fn assert_opaque(err: &DomainError) {
        let response = err.to_error_response();
        assert_eq!(response.error, error_codes::INVALID_CREDENTIAL);
        assert_eq!(response.message, "Invalid credential");
    }

    #[tokio::test]
    async fn scenario_a_repeated_rotation_yields_distinct_ids() {
        let w = world(ReuseRevocation::WholeChain);
        let account = w.accounts.insert(Account::new("buyer@example.com")).await;

        let t1 = w.gateway.authenticate(account.id).await.unwrap();
        let t2 = w.gateway.refresh(&request(&t1)).await.unwrap();
        let t3 = w.gateway.refresh(&request(&t2)).await.unwrap();

        let ids: HashSet<_> = [&t1, &t2, &t3].iter().map(|t| jti(&w, t)).collect();
        assert_eq!(ids.len(), 3);

        let chain = w.store.find_chain(jti(&w, &t3)).await.unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.iter().filter(|r| r.is_head()).count(), 1);
        assert_eq!(t3.expires_in, 900);
    }

    #[tokio::test]
    async fn scenario_b_replay_kills_the_session() {
        let w = world(ReuseRevocation::WholeChain);
        let account = w.accounts.insert(Account::new("buyer@example.com")).await;

        let t1 = w.gateway.authenticate(account.id).await.unwrap();
        let t2 = w.gateway.refresh(&request(&t1)).await.unwrap();

        let replay = w.gateway.refresh(&request(&t1)).await.unwrap_err();
        assert!(replay.is_security_incident());
        assert_opaque(&replay);

        let after = w.gateway.refresh(&request(&t2)).await.unwrap_err();
        assert!(after.is_invalid_credential());
        assert_opaque(&after);
    }

    #[tokio::test]
    async fn scenario_b_in_downstream_mode() {
        let w = world(ReuseRevocation::Downstream);
        let account = w.accounts.insert(Account::new("buyer@example.com")).await;

        let t1 = w.gateway.authenticate(account.id).await.unwrap();
        let t2 = w.gateway.refresh(&request(&t1)).await.unwrap();

        assert!(w.gateway.refresh(&request(&t1)).await.unwrap_err().is_security_incident());
        assert!(w.gateway.refresh(&request(&t2)).await.unwrap_err().is_invalid_credential());

        // The replayed record survives as a superseded tombstone
        let t1_record = w.store.find_by_id(jti(&w, &t1)).await.unwrap().unwrap();
        assert!(!t1_record.is_head());
    }

    #[tokio::test]
    async fn scenario_c_foreign_invalidate_suspends_caller() {
        let w = world(ReuseRevocation::WholeChain);
        let alice = w.accounts.insert(Account::new("alice@example.com")).await;
        let bob = w.accounts.insert(Account::new("bob@example.com")).await;

        let alice_pair = w.gateway.authenticate(alice.id).await.unwrap();
        let bob_pair = w.gateway.authenticate(bob.id).await.unwrap();

        let bearer = format!("Bearer {}", bob_pair.access_token);
        let err = w
            .gateway
            .invalidate(&request(&alice_pair), &bearer)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Token(TokenError::SecurityIncident {
                incident: IncidentKind::OwnerMismatch
            })
        ));
        assert_opaque(&err);

        let bob = w.accounts.find_by_id(bob.id).await.unwrap().unwrap();
        assert_eq!(bob.status, AccountStatus::Suspended);
        assert!(w.store.find_by_id(jti(&w, &alice_pair)).await.unwrap().is_none());

        // Bob's own credentials stop working once he is suspended
        assert!(w.gateway.authorize(&bearer).await.is_err());
        assert!(w.gateway.refresh(&request(&bob_pair)).await.is_err());
    }

    #[tokio::test]
    async fn scenario_d_expired_chain_is_left_for_pruning() {
        let w = world(ReuseRevocation::WholeChain);
        let account = w.accounts.insert(Account::new("buyer@example.com")).await;

        let t1 = w.gateway.authenticate(account.id).await.unwrap();
        w.clock.advance(Duration::days(30) + Duration::seconds(1));

        let err = w.gateway.refresh(&request(&t1)).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Token(TokenError::InvalidCredential {
                cause: CredentialFailure::Expired
            })
        ));
        assert_opaque(&err);
        assert!(w.store.find_by_id(jti(&w, &t1)).await.unwrap().is_some());

        assert_eq!(w.gateway.engine().prune().await.unwrap(), 1);
        assert!(w.store.is_empty().await);
    }

    #[tokio::test]
    async fn concurrent_refresh_has_exactly_one_winner() {
        let w = world(ReuseRevocation::WholeChain);
        let account = w.accounts.insert(Account::new("buyer@example.com")).await;
        let t1 = w.gateway.authenticate(account.id).await.unwrap();
        let presented = request(&t1);

        let (a, b) = tokio::join!(w.gateway.refresh(&presented), w.gateway.refresh(&presented));

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let incidents = results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.is_security_incident()))
            .count();
        assert_eq!(incidents, 1);
    }

    #[tokio::test]
    async fn invalidate_then_anything_fails() {
        let w = world(ReuseRevocation::WholeChain);
        let account = w.accounts.insert(Account::new("buyer@example.com")).await;
        let t1 = w.gateway.authenticate(account.id).await.unwrap();
        let t2 = w.gateway.refresh(&request(&t1)).await.unwrap();

        w.gateway
            .invalidate(&request(&t2), &t2.access_token)
            .await
            .unwrap();

        for token in [&t1, &t2] {
            let err = w.gateway.refresh(&request(token)).await.unwrap_err();
            assert_opaque(&err);
            let err = w
                .gateway
                .invalidate(&request(token), &t2.access_token)
                .await
                .unwrap_err();
            assert_opaque(&err);
        }

        let account = w.accounts.find_by_id(account.id).await.unwrap().unwrap();
        assert!(account.is_active());
    }

    #[tokio::test]
    async fn response_wire_shape() {
        let w = world(ReuseRevocation::WholeChain);
        let account = w.accounts.insert(Account::new("buyer@example.com")).await;

        let response = w.gateway.authenticate(account.id).await.unwrap();
        let json = serde_json::to_value(&response).unwrap();

        assert!(json["accessToken"].is_string());
        assert!(json["refreshToken"].is_string());
        assert_eq!(json["expiresIn"], 900);
        assert_eq!(json["authorities"], serde_json::json!(["ROLE_USER"]));
    }
}
