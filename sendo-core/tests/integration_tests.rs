//! Integration tests for sendo-core services
//!
//! These tests drive the full context the way the CLI does: the remote API
//! is scripted at the gateway port, but the session is persisted through the
//! real JSON file store in a temporary directory.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tempfile::TempDir;

use sendo_core::adapters::file_store::JsonFileStore;
use sendo_core::adapters::scripted::{Scripted, ScriptedConfirmer, ScriptedGateway};
use sendo_core::config::Config;
use sendo_core::domain::{Credentials, Pin};
use sendo_core::ports::{KeyValueStore, Method};
use sendo_core::services::session::{LOGIN_KEY, USER_INFO_KEY};
use sendo_core::services::FlowState;
use sendo_core::{Error, SendoContext, SessionState};

const TRANSFER: &str = "/merchant/transfer-funds";
const LIST: &str = "/merchant/transactions/42/all";

// ============================================================================
// Test Helpers
// ============================================================================

fn context(dir: &TempDir, gateway: &Arc<ScriptedGateway>) -> SendoContext {
    let store = Arc::new(JsonFileStore::new(dir.path()));
    SendoContext::with_parts(Config::default(), gateway.clone(), store)
        .expect("Failed to build context")
}

fn script_login(gateway: &ScriptedGateway) {
    gateway
        .on(
            Method::Post,
            "/auth/login",
            Scripted::data(json!({ "accessToken": "tok-1", "deviceId": "dev-1" })),
        )
        .on(
            Method::Get,
            "/users/me",
            Scripted::data(json!({
                "id": 7,
                "firstname": "Awa",
                "lastname": "Ndiaye",
                "merchant": { "id": 42 },
                "wallet": { "id": 1, "currency": "XAF", "matricule": "SND-0001" }
            })),
        )
        .on(
            Method::Get,
            LIST,
            Scripted::data(json!({ "page": 1, "totalPages": 1, "totalItems": 0, "items": [] })),
        )
        .on(
            Method::Get,
            "/wallet/SND-4421",
            Scripted::data(json!({
                "id": 9,
                "matricule": "SND-4421",
                "currency": "XAF",
                "user": { "id": 3, "firstname": "Moussa", "lastname": "Diallo" }
            })),
        );
}

async fn logged_in(dir: &TempDir) -> (Arc<ScriptedGateway>, SendoContext) {
    let gateway = Arc::new(ScriptedGateway::new());
    script_login(&gateway);
    let ctx = context(dir, &gateway);
    ctx.auth
        .login("awa@example.com", "secret")
        .await
        .expect("login should succeed");
    (gateway, ctx)
}

// ============================================================================
// Transfer flow
// ============================================================================

#[tokio::test]
async fn test_non_positive_amount_never_reaches_gateway() {
    let dir = TempDir::new().unwrap();
    let (gateway, ctx) = logged_in(&dir).await;
    let flow = ctx.transfer_flow(Arc::new(ScriptedConfirmer::accepting()));

    flow.verify_destination("SND-4421").await.unwrap();
    for amount in [Decimal::ZERO, Decimal::new(-1500, 0)] {
        assert!(matches!(flow.set_amount(amount), Err(Error::Validation(_))));
        assert!(!flow.can_confirm());
    }
    assert!(flow.confirm().await.is_err());
    assert!(flow.submit_with_pin(Pin::new("1234").unwrap()).await.is_err());
    assert!(gateway.calls_to(Method::Post, TRANSFER).is_empty());
}

#[tokio::test]
async fn test_unknown_wallet_blocks_confirmation() {
    let dir = TempDir::new().unwrap();
    let (gateway, ctx) = logged_in(&dir).await;
    gateway.on(Method::Get, "/wallet/GHOST", Scripted::fail(404, "Wallet not found"));
    let flow = ctx.transfer_flow(Arc::new(ScriptedConfirmer::accepting()));

    flow.set_amount(Decimal::new(1000, 0)).unwrap();
    assert!(flow.verify_destination("GHOST").await.is_err());
    assert!(flow.destination_error().is_some());
    assert!(!flow.can_confirm());
    assert!(flow.confirm().await.is_err());
}

#[tokio::test]
async fn test_cancelled_confirmation_has_no_side_effects() {
    let dir = TempDir::new().unwrap();
    let (gateway, ctx) = logged_in(&dir).await;
    ctx.board.load().await.unwrap();
    let loads_before = ctx.board.snapshot().loads;
    let calls_before = gateway.call_count();

    let confirmer = Arc::new(ScriptedConfirmer::declining());
    let flow = ctx.transfer_flow(confirmer.clone());
    flow.set_amount(Decimal::new(1000, 0)).unwrap();
    flow.verify_destination("SND-4421").await.unwrap();

    assert!(!flow.confirm().await.unwrap());
    assert_eq!(flow.state(), FlowState::Idle);
    assert_eq!(confirmer.prompts().len(), 1);
    // the wallet lookup is the only call made
    assert_eq!(gateway.call_count(), calls_before + 1);
    assert_eq!(ctx.board.snapshot().loads, loads_before);
}

#[tokio::test]
async fn test_successful_transfer_calls_once_and_reloads_board() {
    let dir = TempDir::new().unwrap();
    let (gateway, ctx) = logged_in(&dir).await;
    gateway.on(
        Method::Post,
        TRANSFER,
        Scripted::data(json!({ "transactionId": "TX-77", "amount": 2500, "currency": "XAF" })),
    );
    let flow = ctx.transfer_flow(Arc::new(ScriptedConfirmer::accepting()));

    flow.set_amount(Decimal::new(2500, 0)).unwrap();
    flow.verify_destination("SND-4421").await.unwrap();
    assert!(flow.confirm().await.unwrap());
    let outcome = flow
        .submit_with_pin(Pin::new("4321").unwrap())
        .await
        .unwrap();

    let transfers = gateway.calls_to(Method::Post, TRANSFER);
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].passcode.as_ref().unwrap().expose(), "4321");
    assert_eq!(transfers[0].bearer.as_deref(), Some("tok-1"));
    assert_eq!(transfers[0].json.as_ref().unwrap()["amount"].as_f64(), Some(2500.0));

    assert!(outcome.board_reloaded);
    assert_eq!(ctx.board.snapshot().loads, 1);
    assert_eq!(flow.state(), FlowState::Success);
    assert!(flow.recipient().is_none());
    assert!(!flow.has_pin());
}

#[tokio::test]
async fn test_invalid_pin_is_reported_inline_and_pin_kept() {
    let dir = TempDir::new().unwrap();
    let (gateway, ctx) = logged_in(&dir).await;
    gateway.on(Method::Post, TRANSFER, Scripted::fail(400, "Invalid PIN"));
    let flow = ctx.transfer_flow(Arc::new(ScriptedConfirmer::accepting()));

    flow.set_amount(Decimal::new(2500, 0)).unwrap();
    flow.verify_destination("SND-4421").await.unwrap();
    flow.confirm().await.unwrap();
    let err = flow
        .submit_with_pin(Pin::new("0000").unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidPin(_)));
    assert!(flow.pin_error().is_some());
    assert!(flow.has_pin());
    assert!(ctx.session.is_logged_in());
}

#[tokio::test]
async fn test_clear_pin_on_failure_setting() {
    let dir = TempDir::new().unwrap();
    let gateway = Arc::new(ScriptedGateway::new());
    script_login(&gateway);
    gateway.on(Method::Post, TRANSFER, Scripted::fail(403, "Forbidden"));
    let config = Config {
        clear_pin_on_failure: true,
        ..Config::default()
    };
    let ctx = SendoContext::with_parts(
        config,
        gateway.clone(),
        Arc::new(JsonFileStore::new(dir.path())),
    )
    .unwrap();
    ctx.auth.login("awa@example.com", "secret").await.unwrap();

    let flow = ctx.transfer_flow(Arc::new(ScriptedConfirmer::accepting()));
    flow.set_amount(Decimal::new(2500, 0)).unwrap();
    flow.verify_destination("SND-4421").await.unwrap();
    flow.confirm().await.unwrap();
    assert!(flow.submit_with_pin(Pin::new("0000").unwrap()).await.is_err());
    assert!(!flow.has_pin());
}

#[tokio::test]
async fn test_dismissing_during_submission_resets_flow() {
    let dir = TempDir::new().unwrap();
    let (gateway, ctx) = logged_in(&dir).await;
    gateway.on(Method::Post, TRANSFER, Scripted::Hang);
    let flow = Arc::new(ctx.transfer_flow(Arc::new(ScriptedConfirmer::accepting())));

    flow.set_amount(Decimal::new(2500, 0)).unwrap();
    flow.verify_destination("SND-4421").await.unwrap();
    flow.confirm().await.unwrap();
    flow.enter_pin(Pin::new("1234").unwrap()).unwrap();

    let submission = {
        let flow = Arc::clone(&flow);
        tokio::spawn(async move { flow.submit().await })
    };
    while flow.state() != FlowState::Submitting {
        tokio::task::yield_now().await;
    }
    flow.cancel_handle().expect("submission token").cancel();

    assert!(matches!(submission.await.unwrap(), Err(Error::Cancelled)));
    assert_eq!(ctx.board.snapshot().loads, 0);
    flow.dismiss();
    assert_eq!(flow.state(), FlowState::Idle);
}

// ============================================================================
// Session lifecycle
// ============================================================================

#[tokio::test]
async fn test_login_persists_and_survives_restart() {
    let dir = TempDir::new().unwrap();
    let (gateway, _ctx) = logged_in(&dir).await;

    let store = JsonFileStore::new(dir.path());
    assert!(store.get(LOGIN_KEY).unwrap().is_some());
    assert!(store.get(USER_INFO_KEY).unwrap().is_some());

    let restarted = context(&dir, &gateway);
    let session = restarted.session.current().expect("session rehydrated");
    assert_eq!(session.merchant_id(), Some(42));
}

#[tokio::test]
async fn test_logout_removes_both_entries() {
    let dir = TempDir::new().unwrap();
    let (gateway, ctx) = logged_in(&dir).await;
    gateway.on(Method::Post, "/auth/logout", Scripted::data(serde_json::Value::Null));

    ctx.auth.logout().await.unwrap();

    assert!(matches!(ctx.session.state(), SessionState::Anonymous));
    let store = JsonFileStore::new(dir.path());
    assert!(store.get(LOGIN_KEY).unwrap().is_none());
    assert!(store.get(USER_INFO_KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_unauthorized_anywhere_clears_session() {
    let dir = TempDir::new().unwrap();
    let (gateway, ctx) = logged_in(&dir).await;
    gateway.on(Method::Get, "/admin/roles", Scripted::fail(401, "Unauthorized"));

    assert!(matches!(ctx.admin.roles().await, Err(Error::Unauthorized)));
    assert!(matches!(ctx.session.state(), SessionState::Expired));
    assert!(matches!(ctx.board.load().await, Err(Error::SessionExpired)));

    let restarted = context(&dir, &gateway);
    assert!(matches!(restarted.session.state(), SessionState::Anonymous));
}

#[tokio::test]
async fn test_stale_session_expires_on_load() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path());
    let mut credentials = Credentials::new("old", Some("dev-1".into()));
    credentials.issued_at = Some(Utc::now() - Duration::hours(25));
    store
        .set(LOGIN_KEY, &serde_json::to_string(&credentials).unwrap())
        .unwrap();

    let gateway = Arc::new(ScriptedGateway::new());
    let ctx = context(&dir, &gateway);
    assert!(matches!(ctx.session.state(), SessionState::Expired));
    assert!(store.get(LOGIN_KEY).unwrap().is_none());
    assert!(matches!(ctx.api.me().await, Err(Error::SessionExpired)));
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_session_expires_at_ttl_while_running() {
    let dir = TempDir::new().unwrap();
    let (_gateway, ctx) = logged_in(&dir).await;

    assert!(!ctx.session.check_expiry_at(Utc::now() + Duration::hours(1)));
    assert!(ctx
        .session
        .check_expiry_at(Utc::now() + ctx.config.session_ttl() + Duration::minutes(1)));
    assert!(!ctx.session.is_logged_in());
}
