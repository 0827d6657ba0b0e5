//! Unit tests for token service

use std::sync::Arc;

use ta_shared::config::{ServerTrustConfig, TokenStorage};

use crate::domain::value_objects::{
    CredentialSource, IssuedToken, LoginOutcome, PresentedCredentials, Revocation, TrustedUser,
};
use crate::errors::TokenError;
use crate::repositories::{InMemoryAccountValidator, InMemorySessionStore, SessionStore};
use crate::services::clock::ManualClock;
use crate::services::token::{KeyRing, TokenCodec, TokenService, TokenServiceConfig};

use super::{shared_cluster, token_config, TTL};

struct Fixture {
    clock: Arc<ManualClock>,
    accounts: InMemoryAccountValidator,
    sessions: Arc<InMemorySessionStore>,
    service: TokenService,
}

fn config() -> TokenServiceConfig {
    TokenServiceConfig::new(
        token_config("node1"),
        ServerTrustConfig::new("s3cret").with_safe_hosts(["localhost"]),
    )
}

fn fixture(config: TokenServiceConfig) -> Fixture {
    let clock = Arc::new(ManualClock::new(0));
    let accounts = InMemoryAccountValidator::new(["alice", "bob"]);
    let sessions = Arc::new(InMemorySessionStore::new());
    let key_ring =
        Arc::new(KeyRing::new(&config.token, shared_cluster(), clock.clone()).unwrap());
    let service = TokenService::new(
        config,
        key_ring,
        sessions.clone(),
        Arc::new(accounts.clone()),
        clock.clone(),
    )
    .unwrap();

    Fixture {
        clock,
        accounts,
        sessions,
        service,
    }
}

async fn issue_cookie(fx: &Fixture, user_id: &str) -> String {
    match fx.service.issue(user_id).await.unwrap() {
        IssuedToken::Cookie(token) => token,
        other => panic!("expected a cookie, got {:?}", other),
    }
}

fn with_cookie(token: &str) -> PresentedCredentials {
    PresentedCredentials::new().with_cookie(token, false)
}

#[tokio::test]
async fn test_issue_and_validate_cookie() {
    let fx = fixture(config());
    let token = issue_cookie(&fx, "alice").await;

    assert_eq!(TokenCodec::peek_expiry(&token), Some(TTL));
    assert_eq!(
        fx.service.validate(&with_cookie(&token)).await,
        Some(TrustedUser::new("alice", CredentialSource::Cookie))
    );
}

#[tokio::test]
async fn test_ttl_scenario() {
    let fx = fixture(config());
    let token = issue_cookie(&fx, "alice").await;
    assert!(token.ends_with("1200000@alice@node1"));

    fx.clock.set(1_199_999);
    assert!(fx.service.validate(&with_cookie(&token)).await.is_some());

    fx.clock.set(1_200_001);
    assert!(fx.service.validate(&with_cookie(&token)).await.is_none());

    fx.clock.set(700_000);
    let refreshed = fx.service.refresh(&token, "alice").await.unwrap().unwrap();
    assert_eq!(TokenCodec::peek_expiry(&refreshed), Some(1_900_000));

    fx.clock.set(100_000);
    assert_eq!(fx.service.refresh(&token, "alice").await.unwrap(), None);
}

#[tokio::test]
async fn test_refresh_window_boundary() {
    let fx = fixture(config());
    let token = issue_cookie(&fx, "alice").await;

    // now + TTL/2 == expiry is not yet due
    fx.clock.set(TTL / 2);
    assert_eq!(fx.service.refresh(&token, "alice").await.unwrap(), None);

    fx.clock.set(TTL / 2 + 1);
    assert!(fx.service.refresh(&token, "alice").await.unwrap().is_some());
}

#[tokio::test]
async fn test_authenticate_reissues_aging_cookie() {
    let fx = fixture(config());
    let token = issue_cookie(&fx, "alice").await;

    let fresh = fx.service.authenticate(&with_cookie(&token)).await;
    assert!(fresh.is_authenticated());
    assert!(fresh.refreshed.is_none());

    fx.clock.set(700_000);
    let aging = fx.service.authenticate(&with_cookie(&token)).await;
    assert_eq!(aging.user.map(|u| u.user_id).as_deref(), Some("alice"));
    let refreshed = aging.refreshed.unwrap();
    assert_eq!(
        fx.service.validate(&with_cookie(&refreshed)).await,
        Some(TrustedUser::new("alice", CredentialSource::Cookie))
    );
}

#[tokio::test]
async fn test_invalid_cookies_are_anonymous() {
    let fx = fixture(config());
    let token = issue_cookie(&fx, "alice").await;
    let forged = token.replace("@alice@", "@bob@");

    for value in ["", "garbage", "a@b@c@d", forged.as_str()] {
        let auth = fx.service.authenticate(&with_cookie(value)).await;
        assert!(!auth.is_authenticated(), "{value}");
        assert!(auth.refreshed.is_none());
    }
}

#[tokio::test]
async fn test_stale_cookie_does_not_hide_a_valid_one() {
    let fx = fixture(config());
    let token = issue_cookie(&fx, "alice").await;
    let credentials = PresentedCredentials::new()
        .with_cookie("invalid", false)
        .with_cookie(&token, false);

    assert_eq!(
        fx.service.validate(&credentials).await,
        Some(TrustedUser::new("alice", CredentialSource::Cookie))
    );

    // The refresh follows the cookie that actually proved the user
    fx.clock.set(700_000);
    let auth = fx.service.authenticate(&credentials).await;
    assert_eq!(auth.user.map(|u| u.user_id).as_deref(), Some("alice"));
    assert!(auth.refreshed.is_some());
}

#[tokio::test]
async fn test_vanished_account_is_rejected() {
    let fx = fixture(config());
    let token = issue_cookie(&fx, "alice").await;

    fx.accounts.remove("alice").await;

    assert_eq!(fx.service.validate(&with_cookie(&token)).await, None);
}

#[tokio::test]
async fn test_secure_cookie_only() {
    let mut cfg = config();
    cfg.token.secure_cookie = true;
    let fx = fixture(cfg);
    let token = issue_cookie(&fx, "alice").await;

    assert_eq!(
        fx.service
            .validate(&PresentedCredentials::new().with_cookie(&token, false))
            .await,
        None
    );
    assert!(fx
        .service
        .validate(&PresentedCredentials::new().with_cookie(&token, true))
        .await
        .is_some());
}

#[tokio::test]
async fn test_server_trust_header_wins() {
    let fx = fixture(config());
    let token = issue_cookie(&fx, "alice").await;
    let header = fx.service.server_trust().sign("bob", 42).unwrap();

    let creds = PresentedCredentials::new()
        .with_server_token(header)
        .with_remote_host("127.0.0.1")
        .with_remote_host("localhost")
        .with_cookie(&token, false);

    let auth = fx.service.authenticate(&creds).await;
    assert_eq!(auth.user, Some(TrustedUser::new("bob", CredentialSource::ServerToken)));
    assert!(auth.refreshed.is_none());
}

#[tokio::test]
async fn test_rejected_header_falls_back_to_cookie() {
    let fx = fixture(config());
    let token = issue_cookie(&fx, "alice").await;
    let header = fx.service.server_trust().sign("bob", 42).unwrap();

    let creds = PresentedCredentials::new()
        .with_server_token(header)
        .with_remote_host("10.1.2.3")
        .with_cookie(&token, false);

    assert_eq!(
        fx.service.validate(&creds).await,
        Some(TrustedUser::new("alice", CredentialSource::Cookie))
    );
}

#[tokio::test]
async fn test_validate_server_trust() {
    let fx = fixture(config());
    let header = fx.service.server_trust().sign("alice", 1).unwrap();
    let local = vec!["localhost".to_string()];
    let remote = vec!["10.1.2.3".to_string()];

    assert_eq!(fx.service.validate_server_trust(&header, &local), Ok("alice".to_string()));
    assert!(matches!(
        fx.service.validate_server_trust(&header, &remote),
        Err(TokenError::UntrustedHost { .. })
    ));
    assert_eq!(
        fx.service.validate_server_trust("00;alice;1", &local),
        Err(TokenError::InvalidSignature)
    );
}

#[tokio::test]
async fn test_session_mode() {
    let mut cfg = config();
    cfg.token = cfg.token.with_storage(TokenStorage::Session);
    let fx = fixture(cfg);

    let session_id = match fx.service.issue("alice").await.unwrap() {
        IssuedToken::Session(id) => id,
        other => panic!("expected a session, got {:?}", other),
    };
    assert_eq!(
        fx.sessions.get(&session_id).await.unwrap().as_deref(),
        Some("alice")
    );

    let creds = PresentedCredentials::new().with_session(&session_id);
    let auth = fx.service.authenticate(&creds).await;
    assert_eq!(auth.user, Some(TrustedUser::new("alice", CredentialSource::Session)));
    assert!(auth.refreshed.is_none());

    assert_eq!(
        fx.service.revoke(Some(&session_id)).await.unwrap(),
        Revocation::SessionCleared
    );
    assert_eq!(fx.service.validate(&creds).await, None);
}

#[tokio::test]
async fn test_session_mode_ignores_cookies() {
    let fx_cookie = fixture(config());
    let token = issue_cookie(&fx_cookie, "alice").await;

    let mut cfg = config();
    cfg.token = cfg.token.with_storage(TokenStorage::Session);
    let fx = fixture(cfg);

    assert_eq!(fx.service.validate(&with_cookie(&token)).await, None);
}

#[tokio::test]
async fn test_revoke_cookie_mode() {
    let fx = fixture(config());
    assert_eq!(
        fx.service.revoke(None).await.unwrap(),
        Revocation::ExpireCookie("invalid".to_string())
    );
    assert!(fx.service.validate(&with_cookie("invalid")).await.is_none());
}

#[tokio::test]
async fn test_login() {
    let fx = fixture(config());

    assert_eq!(
        fx.service.login("mallory").await.unwrap(),
        LoginOutcome::UnknownUser
    );

    match fx.service.login("bob").await.unwrap() {
        LoginOutcome::Issued(IssuedToken::Cookie(token)) => {
            assert_eq!(
                fx.service.validate(&with_cookie(&token)).await,
                Some(TrustedUser::new("bob", CredentialSource::Cookie))
            );
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_issue_rejects_unencodable_user() {
    let fx = fixture(config());
    assert!(fx.service.issue("a@b").await.is_err());
}

#[tokio::test]
async fn test_anonymous_request() {
    let fx = fixture(config());
    let auth = fx.service.authenticate(&PresentedCredentials::new()).await;
    assert!(!auth.is_authenticated());
}
