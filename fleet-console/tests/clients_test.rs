//! HTTP clients against a mock identity project and sentiment backend.

use fleet_console::config::{BackendSettings, IdentitySettings};
use fleet_console::services::{BackendClient, GoTrueClient, ProfileClient};
use fleet_core::providers::MockProfileStore;
use fleet_core::{
    AuthError, AuthState, BackendError, FeedbackDraft, FeedbackSubmission, IdentityProvider,
    ProfileStore, ProviderError, Role, RoleResolver, SentimentBackend, SessionEventKind,
    SessionStore, SignUpForm,
};
use secrecy::Secret;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn identity_settings(server: &MockServer) -> IdentitySettings {
    IdentitySettings {
        url: server.uri(),
        api_key: Secret::new("anon-key".to_string()),
        min_password_length: 6,
        profile_table: "profiles".to_string(),
        timeout_secs: 5,
    }
}

fn impatient_identity_settings(server: &MockServer) -> IdentitySettings {
    IdentitySettings {
        timeout_secs: 1,
        ..identity_settings(server)
    }
}

async fn mount_token(server: &MockServer, expires_in: i64) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt-short",
            "token_type": "bearer",
            "expires_in": expires_in,
            "user": { "id": "u-1", "email": "ops@fleet.test" }
        })))
        .mount(server)
        .await;
}

fn backend_client(server: &MockServer) -> BackendClient {
    BackendClient::new(BackendSettings {
        url: server.uri(),
        timeout_secs: 5,
    })
}

fn submission() -> FeedbackSubmission {
    FeedbackSubmission::from_draft(&FeedbackDraft::new("d-1", "t-1", "Rude driver"))
}

// ── GET /drivers ─────────────────────────────────────────────────────

#[tokio::test]
async fn list_drivers_parses_feed_and_drops_blank_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drivers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "driver_id": "d-1", "score": -0.4, "total_count": 12,
                  "last_updated": "2024-05-01T10:00:00", "last_alert_at": null },
                { "driver_id": "  ", "score": 0.2 },
                { "driver_id": "d-2", "score": 0.7 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let drivers = backend_client(&server).list_drivers().await.unwrap();

    let ids: Vec<&str> = drivers.iter().map(|d| d.driver_id.as_str()).collect();
    assert_eq!(ids, vec!["d-1", "d-2"]);
    assert_eq!(drivers[0].total_count, 12);
    assert!(drivers[0].last_updated.is_some());
    assert_eq!(drivers[1].total_count, 0);
}

#[tokio::test]
async fn list_drivers_server_error_is_connectivity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drivers"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = backend_client(&server).list_drivers().await.unwrap_err();

    assert!(matches!(err, BackendError::Connectivity(_)));
}

// ── POST /feedback ───────────────────────────────────────────────────

#[tokio::test]
async fn submit_feedback_sends_idempotency_key() {
    let server = MockServer::start().await;
    let sub = submission();
    Mock::given(method("POST"))
        .and(path("/feedback"))
        .and(body_partial_json(json!({
            "driver_id": "d-1",
            "trip_id": "t-1",
            "text": "Rude driver",
            "external_feedback_id": sub.external_feedback_id.to_string(),
            "entity_type": "driver"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "sentiment_score": -0.9,
            "updated_driver_score": -0.3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = backend_client(&server).submit_feedback(&sub).await.unwrap();

    assert!(ack.success);
    assert_eq!(ack.updated_driver_score, Some(-0.3));
}

#[tokio::test]
async fn submit_feedback_2xx_without_body_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/feedback"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let ack = backend_client(&server)
        .submit_feedback(&submission())
        .await
        .unwrap();

    assert!(ack.success);
}

#[tokio::test]
async fn submit_feedback_detail_becomes_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/feedback"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({
                "detail": [{ "loc": ["body", "trip_id"], "msg": "field required" }]
            })),
        )
        .mount(&server)
        .await;

    let err = backend_client(&server)
        .submit_feedback(&submission())
        .await
        .unwrap_err();

    assert_eq!(err, BackendError::Rejected("field required".into()));
}

#[tokio::test]
async fn submit_feedback_500_without_detail_is_connectivity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/feedback"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let err = backend_client(&server)
        .submit_feedback(&submission())
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::Connectivity(_)));
}

// ── GoTrue ───────────────────────────────────────────────────────────

#[tokio::test]
async fn sign_in_stores_session_and_publishes_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt-abc",
            "token_type": "bearer",
            "expires_in": 3600,
            "user": { "id": "u-1", "email": "ops@fleet.test" }
        })))
        .mount(&server)
        .await;
    let client = GoTrueClient::new(identity_settings(&server));
    let mut events = client.subscribe();

    let session = client.sign_in("ops@fleet.test", "hunter22").await.unwrap();

    assert_eq!(session.user_id, "u-1");
    assert_eq!(client.access_token().as_deref(), Some("jwt-abc"));
    let restored = client.get_session().await.unwrap();
    assert_eq!(restored.map(|s| s.user_id), Some("u-1".to_string()));
    let event = events.next().await.unwrap();
    assert_eq!(event.session.map(|s| s.user_id), Some("u-1".to_string()));
}

#[tokio::test]
async fn sign_in_bad_password_is_invalid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;
    let client = GoTrueClient::new(identity_settings(&server));

    let err = client.sign_in("ops@fleet.test", "nope").await.unwrap_err();

    assert_eq!(
        err,
        AuthError::InvalidCredentials("Invalid login credentials".into())
    );
    assert_eq!(client.get_session().await.unwrap(), None);
}

fn sign_up_form() -> SignUpForm {
    SignUpForm {
        full_name: "Ada Ops".to_string(),
        email: "ada@fleet.test".to_string(),
        password: "hunter22".to_string(),
        confirm: "hunter22".to_string(),
    }
}

#[tokio::test]
async fn sign_up_sends_full_name_as_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .and(body_partial_json(json!({
            "email": "ada@fleet.test",
            "data": { "full_name": "Ada Ops" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "u-9" })))
        .expect(1)
        .mount(&server)
        .await;

    GoTrueClient::new(identity_settings(&server))
        .sign_up(&sign_up_form())
        .await
        .unwrap();
}

#[tokio::test]
async fn sign_up_rate_limit_and_duplicate_are_distinguished() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({ "msg": "Email rate limit exceeded" })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "msg": "User already registered" })),
        )
        .mount(&server)
        .await;
    let client = GoTrueClient::new(identity_settings(&server));

    let first = client.sign_up(&sign_up_form()).await.unwrap_err();
    let second = client.sign_up(&sign_up_form()).await.unwrap_err();

    assert_eq!(first, AuthError::RateLimited);
    assert_eq!(second, AuthError::DuplicateAccount);
}

// ── PostgREST profiles ───────────────────────────────────────────────

#[tokio::test]
async fn profile_lookup_reads_role_column() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", "eq.u-1"))
        .and(query_param("select", "role"))
        .and(header("apikey", "anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "role": "admin" }])))
        .mount(&server)
        .await;
    let settings = identity_settings(&server);
    let profiles = ProfileClient::new(settings.clone(), Arc::new(GoTrueClient::new(settings)));

    let record = profiles.get_role("u-1").await.unwrap();

    assert_eq!(record.role.as_deref(), Some("admin"));
}

#[tokio::test]
async fn profile_lookup_without_row_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    let settings = identity_settings(&server);
    let profiles = ProfileClient::new(settings.clone(), Arc::new(GoTrueClient::new(settings)));

    let err = profiles.get_role("u-404").await.unwrap_err();

    assert!(matches!(err, ProviderError::NotFound));
}

// ── Slow collaborators ───────────────────────────────────────────────

#[tokio::test]
async fn stalled_profile_store_falls_back_to_employee() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "role": "admin" }]))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;
    let settings = impatient_identity_settings(&server);
    let profiles = ProfileClient::new(settings.clone(), Arc::new(GoTrueClient::new(settings)));
    let resolver = RoleResolver::new(Arc::new(profiles));

    let role = tokio::time::timeout(Duration::from_secs(5), resolver.resolve("u-1"))
        .await
        .expect("lookup should give up after the client timeout");

    assert_eq!(role, Role::Employee);
}

#[tokio::test]
async fn stalled_sign_in_is_a_connectivity_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;
    let client = GoTrueClient::new(impatient_identity_settings(&server));

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        client.sign_in("ops@fleet.test", "hunter22"),
    )
    .await
    .expect("sign-in should give up after the client timeout");

    assert!(matches!(result, Err(AuthError::Connectivity(_))));
}

// ── Token expiry ─────────────────────────────────────────────────────

#[tokio::test]
async fn expired_session_is_dropped_and_announced() {
    let server = MockServer::start().await;
    mount_token(&server, 0).await;
    let client = GoTrueClient::new(identity_settings(&server));
    let mut events = client.subscribe();

    client.sign_in("ops@fleet.test", "hunter22").await.unwrap();

    assert_eq!(client.get_session().await.unwrap(), None);
    assert_eq!(client.access_token(), None);
    let first = events.next().await.unwrap();
    let second = events.next().await.unwrap();
    assert_eq!(first.kind, SessionEventKind::SignedIn);
    assert_eq!(second.kind, SessionEventKind::TokenExpired);
    assert_eq!(second.session, None);
}

#[tokio::test]
async fn token_expiry_ends_the_operator_session() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    let identity = Arc::new(GoTrueClient::new(identity_settings(&server)));
    let store = SessionStore::new(
        identity.clone(),
        RoleResolver::new(Arc::new(MockProfileStore::new().with_role("u-1", "admin"))),
    );
    store.initialize().await;

    store.sign_in("ops@fleet.test", "hunter22").await.unwrap();
    assert_eq!(
        store.wait_for_role(Duration::from_secs(2)).await,
        Some(Role::Admin)
    );

    let mut states = store.watch();
    tokio::time::timeout(
        Duration::from_secs(5),
        states.wait_for(|state| *state == AuthState::Anonymous),
    )
    .await
    .expect("session should end when the token expires")
    .unwrap();
    assert_eq!(identity.access_token(), None);
}
