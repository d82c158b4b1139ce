//! Refresh Cycle Integration Tests
//!
//! Runs full cycles through the HTTP adapters against a mock bridge and
//! reads the result back through the HTTP surface.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use exposure_monitor::application::services::{
    CycleContext, CycleOutcome, MonitorStatus, NoDataReason, Pipeline, PositionFetcher,
    QueryKind, RefreshScheduler,
};
use exposure_monitor::infrastructure::broker::{HttpPositionsClient, HttpSessionAuthenticator};
use exposure_monitor::infrastructure::config::{BridgeSettings, Credentials};
use exposure_monitor::infrastructure::health::{HealthServerState, router};
use exposure_monitor::{InstrumentCatalog, SharedMonitorStatus};

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok",
            "user": {"username": "bridge-ops", "client_code": "SEA"}
        })))
        .mount(server)
        .await;
}

fn query(accounts: &[&str]) -> serde_json::Value {
    json!({"position_account": accounts, "symbol": [], "taker": []})
}

fn scheduler(server: &MockServer, accounts: &[&str]) -> (RefreshScheduler, SharedMonitorStatus) {
    let bridge = BridgeSettings {
        login_url: format!("{}/login", server.uri()),
        positions_url: format!("{}/positions", server.uri()),
        default_client_code: None,
        login_timeout: Duration::from_secs(2),
        fetch_timeout: Duration::from_secs(2),
    };
    let session = HttpSessionAuthenticator::new(
        &bridge,
        Credentials::new("ops".to_string(), "hunter2".to_string()),
    )
    .unwrap();
    let positions = HttpPositionsClient::new(&bridge).unwrap();

    let pipeline = Pipeline::new(
        PositionFetcher::new(Arc::new(session), Arc::new(positions)),
        Arc::new(InstrumentCatalog::default()),
    );
    let status = Arc::new(MonitorStatus::new());
    let context = CycleContext {
        accounts: accounts.iter().map(|a| (*a).to_string()).collect(),
        ..CycleContext::default()
    };
    let scheduler = RefreshScheduler::new(
        pipeline,
        context,
        Duration::from_secs(5),
        Arc::clone(&status),
    );
    (scheduler, status)
}

#[tokio::test]
async fn falls_back_to_wildcard_and_publishes() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/positions"))
        .and(body_json(query(&["CLIENT||1001"])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/positions"))
        .and(body_json(query(&["1001"])))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/positions"))
        .and(body_json(query(&[])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"symbol_val": "EURUSD", "pl": 1000, "notional": 50000,
             "base_exposure": 40000, "quote_exposure": -43000, "taker": "MT5"},
            {"symbol_val": "COFFEE", "pl": 99999},
            {"symbol_val": "XAUUSD", "pl": "500", "net_volume": -2, "avg_price": 2000,
             "base_exposure": -200, "quote_exposure": 400000}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (mut scheduler, status) = scheduler(&server, &["1001"]);
    let outcome = scheduler.run_once().await.unwrap();

    let CycleOutcome::Published(model) = outcome else {
        panic!("expected a published view");
    };
    assert_eq!(model.query_kind, QueryKind::Wildcard);
    assert!(model.query_used.accounts.is_empty());
    assert_eq!(model.client_code, "SEA");
    assert_eq!(model.broker_user, "bridge-ops");
    assert_eq!(model.position_count, 2);
    assert_eq!(model.kpis.pl, dec!(1500));
    assert_eq!(model.kpis.notional, dec!(50000));
    assert!(model.kpis.margin.is_none());
    assert!(model.deltas.is_none());

    let usd = model.buckets.iter().find(|b| b.asset == "USD").unwrap();
    assert_eq!(usd.net_total, dec!(357000));
    assert_eq!(model.buckets[0].asset, "USD");

    assert_eq!(status.snapshot().cycles_run, 1);
}

#[tokio::test]
async fn canonical_hit_stops_the_fallback() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/positions"))
        .and(body_json(query(&["CLIENT||7"])))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"symbol_val": "GBPUSD", "pl": 5}])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/positions"))
        .and(body_json(query(&[])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let (mut scheduler, _) = scheduler(&server, &["CLIENT 7"]);
    let outcome = scheduler.run_once().await.unwrap();

    let CycleOutcome::Published(model) = outcome else {
        panic!("expected a published view");
    };
    assert_eq!(model.query_kind, QueryKind::Canonical);
    assert_eq!(model.query_used.accounts, vec!["CLIENT||7"]);
}

#[tokio::test]
async fn empty_bridge_reports_no_data() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/positions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(3)
        .mount(&server)
        .await;

    let (mut scheduler, status) = scheduler(&server, &["CLIENT||42"]);
    let outcome = scheduler.run_once().await.unwrap();

    match outcome {
        CycleOutcome::NoData { reason, query_used } => {
            assert_eq!(reason, NoDataReason::NoPositions);
            assert!(query_used.is_wildcard());
        }
        CycleOutcome::Published(_) => panic!("expected no data"),
    }
    assert!(status.latest().is_none());
}

#[tokio::test]
async fn published_view_is_served_over_http() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/positions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"symbol_val": "EURUSD", "pl": 1500000}])),
        )
        .mount(&server)
        .await;

    let (mut scheduler, status) = scheduler(&server, &[]);
    scheduler.run_once().await.unwrap();

    let app = router(Arc::new(HealthServerState::new(
        "test".to_string(),
        Arc::clone(&status),
    )));

    let ready = app
        .clone()
        .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/exposure")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["kpis_formatted"]["pl"], "$1.50m");
    assert_eq!(json["query_kind"], "wildcard");
    assert_eq!(json["client_code"], "SEA");
}
