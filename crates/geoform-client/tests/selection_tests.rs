//! # Integration Tests for the Cascading Selection Controller
//!
//! Drives `SelectionController` end to end against a wiremock geo
//! service: cascade ordering, downstream clearing, per-field error
//! isolation, staleness discard for out-of-order responses, and the
//! atomic form reset. Delayed responses simulate slow fetches that
//! complete after the selection has moved on.

use geoform_client::cache::TimedCache;
use geoform_client::client::GeoClient;
use geoform_client::config::GeoServiceConfig;
use geoform_client::metrics::MetricsRecorder;
use geoform_client::selection::SelectionController;
use geoform_core::{CountryCode, DistrictId, StateId};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ok_envelope(data: serde_json::Value) -> serde_json::Value {
    json!({
        "success": true,
        "message": "ok",
        "statusCode": 200,
        "data": data,
    })
}

async fn mount_countries(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/countries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!([
            {"code": 91, "name": "India", "dialCode": 91, "shortName": "IN"},
            {"code": 1, "name": "United States", "dialCode": 1, "shortName": "US"},
        ]))))
        .mount(server)
        .await;
}

async fn mount_states(server: &MockServer, country: u32, states: serde_json::Value, delay_ms: u64) {
    Mock::given(method("GET"))
        .and(path("/states"))
        .and(query_param("countryCode", country.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok_envelope(states))
                .set_delay(Duration::from_millis(delay_ms)),
        )
        .mount(server)
        .await;
}

async fn mount_dial_code(server: &MockServer, country: u32, name: &str, delay_ms: u64) {
    Mock::given(method("GET"))
        .and(path("/stdcode"))
        .and(query_param("countryCode", country.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok_envelope(json!([{
                    "countryCode": country,
                    "countryName": name,
                    "dialCode": country,
                    "shortName": "XX",
                    "logoUri": "https://flags.example.com/x.svg"
                }])))
                .set_delay(Duration::from_millis(delay_ms)),
        )
        .mount(server)
        .await;
}

async fn mount_districts(server: &MockServer, state: u32, districts: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/districts"))
        .and(query_param("stateId", state.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(districts)))
        .mount(server)
        .await;
}

fn india_states() -> serde_json::Value {
    json!([
        {"countryCode": 91, "stateId": 12, "stateName": "Karnataka"},
        {"countryCode": 91, "stateId": 13, "stateName": "Kerala"},
    ])
}

fn us_states() -> serde_json::Value {
    json!([
        {"countryCode": 1, "stateId": 40, "stateName": "California"},
    ])
}

fn controller(server: &MockServer) -> Arc<SelectionController> {
    // Honors RUST_LOG when a test run needs the controller's debug output.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let cache = Arc::new(TimedCache::default());
    let metrics = Arc::new(MetricsRecorder::new());
    let client = GeoClient::new(GeoServiceConfig::new(server.uri()), cache, Arc::clone(&metrics))
        .expect("client build");
    Arc::new(SelectionController::new(client, metrics))
}

fn code(value: u32) -> CountryCode {
    CountryCode::new(value).expect("valid country code")
}

fn state_id(value: u32) -> StateId {
    StateId::new(value).expect("valid state id")
}

fn district_id(value: u32) -> DistrictId {
    DistrictId::new(value).expect("valid district id")
}

// ── Cascade ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn selecting_a_country_loads_states_and_dial_code() {
    let server = MockServer::start().await;
    mount_countries(&server).await;
    mount_states(&server, 91, india_states(), 0).await;
    mount_dial_code(&server, 91, "India", 0).await;

    let ctrl = controller(&server);
    ctrl.load_countries().await;
    ctrl.select_country(Some(code(91))).await;

    let state = ctrl.snapshot();
    assert_eq!(state.selected_country, Some(code(91)));
    assert_eq!(state.states.len(), 2);
    assert_eq!(state.dial_code.as_ref().map(|d| d.dial_code), Some(91));
    assert_eq!(state.loading, Default::default());
    assert!(!state.errors.any());
}

#[tokio::test]
async fn changing_the_country_clears_everything_downstream() {
    let server = MockServer::start().await;
    mount_countries(&server).await;
    mount_states(&server, 91, india_states(), 0).await;
    mount_states(&server, 1, us_states(), 0).await;
    mount_dial_code(&server, 91, "India", 0).await;
    mount_dial_code(&server, 1, "United States", 0).await;
    mount_districts(
        &server,
        12,
        json!([{"countryCode": 91, "stateId": 12, "districtId": 3, "districtName": "Bengaluru Urban"}]),
    )
    .await;

    let ctrl = controller(&server);
    ctrl.load_countries().await;
    ctrl.select_country(Some(code(91))).await;
    ctrl.select_state(Some(state_id(12))).await;
    ctrl.select_district(Some(district_id(3)));

    // Move to another country: state and district follow it down.
    ctrl.select_country(Some(code(1))).await;

    let state = ctrl.snapshot();
    assert_eq!(state.selected_country, Some(code(1)));
    assert!(state.selected_state.is_none());
    assert!(state.selected_district.is_none());
    assert_eq!(state.states.len(), 1);
    assert!(state.districts.is_empty());
    assert_eq!(state.dial_code.as_ref().map(|d| d.dial_code), Some(1));
}

#[tokio::test]
async fn selecting_a_state_loads_districts() {
    let server = MockServer::start().await;
    mount_countries(&server).await;
    mount_states(&server, 91, india_states(), 0).await;
    mount_dial_code(&server, 91, "India", 0).await;
    mount_districts(
        &server,
        13,
        json!([
            {"countryCode": 91, "stateId": 13, "districtId": 7, "districtName": "Ernakulam"},
            {"countryCode": 91, "stateId": 13, "districtId": 8, "districtName": "Thrissur"},
        ]),
    )
    .await;

    let ctrl = controller(&server);
    ctrl.load_countries().await;
    ctrl.select_country(Some(code(91))).await;
    ctrl.select_state(Some(state_id(13))).await;

    let state = ctrl.snapshot();
    assert_eq!(state.selected_state, Some(state_id(13)));
    assert_eq!(state.districts.len(), 2);
    assert!(state.selected_district.is_none());
}

#[tokio::test]
async fn clearing_the_state_drops_districts_without_a_fetch() {
    let server = MockServer::start().await;
    mount_countries(&server).await;
    mount_states(&server, 91, india_states(), 0).await;
    mount_dial_code(&server, 91, "India", 0).await;
    Mock::given(method("GET"))
        .and(path("/districts"))
        .and(query_param("stateId", "12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!([
            {"countryCode": 91, "stateId": 12, "districtId": 3, "districtName": "Bengaluru Urban"},
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let ctrl = controller(&server);
    ctrl.load_countries().await;
    ctrl.select_country(Some(code(91))).await;
    ctrl.select_state(Some(state_id(12))).await;
    assert_eq!(ctrl.snapshot().districts.len(), 1);

    // `None` clears locally; the expect(1) above proves no second call.
    ctrl.select_state(None).await;

    let state = ctrl.snapshot();
    assert!(state.selected_state.is_none());
    assert!(state.districts.is_empty());
}

#[tokio::test]
async fn unknown_ids_are_ignored() {
    let server = MockServer::start().await;
    mount_countries(&server).await;
    mount_states(&server, 91, india_states(), 0).await;
    mount_dial_code(&server, 91, "India", 0).await;

    let ctrl = controller(&server);
    ctrl.load_countries().await;

    // 44 is not in the fetched country list.
    ctrl.select_country(Some(code(44))).await;
    assert!(ctrl.snapshot().selected_country.is_none());

    ctrl.select_country(Some(code(91))).await;

    // 99 is not in the fetched state list.
    ctrl.select_state(Some(state_id(99))).await;
    let state = ctrl.snapshot();
    assert_eq!(state.selected_country, Some(code(91)));
    assert!(state.selected_state.is_none());
}

// ── Staleness ────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_response_for_a_superseded_country_is_discarded() {
    let server = MockServer::start().await;
    mount_countries(&server).await;
    // India answers slowly, the US instantly.
    mount_states(&server, 91, india_states(), 400).await;
    mount_dial_code(&server, 91, "India", 400).await;
    mount_states(&server, 1, us_states(), 0).await;
    mount_dial_code(&server, 1, "United States", 0).await;

    let ctrl = controller(&server);
    ctrl.load_countries().await;

    let slow = {
        let ctrl = Arc::clone(&ctrl);
        tokio::spawn(async move { ctrl.select_country(Some(code(91))).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Supersede the in-flight selection before its responses arrive.
    ctrl.select_country(Some(code(1))).await;
    slow.await.expect("slow selection task");

    let state = ctrl.snapshot();
    assert_eq!(state.selected_country, Some(code(1)));
    assert_eq!(state.states.len(), 1, "slow states must not overwrite");
    assert_eq!(state.dial_code.as_ref().map(|d| d.dial_code), Some(1));
    assert_eq!(state.loading, Default::default());
    assert!(!state.errors.any());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn state_selection_leaves_the_inflight_dial_code_fetch_untouched() {
    let server = MockServer::start().await;
    mount_countries(&server).await;
    // States answer instantly; the dial code for the same country lags.
    mount_states(&server, 91, india_states(), 0).await;
    mount_dial_code(&server, 91, "India", 400).await;
    mount_districts(
        &server,
        12,
        json!([{"countryCode": 91, "stateId": 12, "districtId": 3, "districtName": "Bengaluru Urban"}]),
    )
    .await;

    let ctrl = controller(&server);
    ctrl.load_countries().await;

    let slow = {
        let ctrl = Arc::clone(&ctrl);
        tokio::spawn(async move { ctrl.select_country(Some(code(91))).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Picking a state only invalidates downstream district state; the
    // country's own dial-code fetch is still current and must land.
    ctrl.select_state(Some(state_id(12))).await;
    slow.await.expect("country selection task");

    let state = ctrl.snapshot();
    assert_eq!(state.selected_country, Some(code(91)));
    assert_eq!(state.selected_state, Some(state_id(12)));
    assert_eq!(
        state.dial_code.as_ref().map(|d| d.dial_code),
        Some(91),
        "dial code fetch for the still-current country must land"
    );
    assert_eq!(state.districts.len(), 1);
    assert_eq!(state.loading, Default::default());
    assert!(!state.errors.any());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reset_invalidates_an_in_flight_fetch() {
    let server = MockServer::start().await;
    mount_countries(&server).await;
    mount_states(&server, 91, india_states(), 400).await;
    mount_dial_code(&server, 91, "India", 400).await;

    let ctrl = controller(&server);
    ctrl.load_countries().await;

    let slow = {
        let ctrl = Arc::clone(&ctrl);
        tokio::spawn(async move { ctrl.select_country(Some(code(91))).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    ctrl.reset_form();
    slow.await.expect("slow selection task");

    let state = ctrl.snapshot();
    assert!(state.countries.is_empty());
    assert!(state.states.is_empty());
    assert!(state.selected_country.is_none());
    assert!(state.dial_code.is_none());
    assert_eq!(state.loading, Default::default());
    assert!(!state.errors.any());
}

// ── Error isolation ──────────────────────────────────────────────────────

#[tokio::test]
async fn failed_states_fetch_marks_only_the_states_field() {
    let server = MockServer::start().await;
    mount_countries(&server).await;
    Mock::given(method("GET"))
        .and(path("/states"))
        .and(query_param("countryCode", "91"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    mount_dial_code(&server, 91, "India", 0).await;

    let ctrl = controller(&server);
    ctrl.load_countries().await;
    ctrl.select_country(Some(code(91))).await;

    let state = ctrl.snapshot();
    assert!(state.errors.states.is_some());
    assert!(state.errors.dial_code.is_none());
    assert!(state.states.is_empty());
    // The dial code landed despite the failed sibling fetch.
    assert_eq!(state.dial_code.as_ref().map(|d| d.dial_code), Some(91));
    assert_eq!(state.loading, Default::default());
}

#[tokio::test]
async fn country_load_failure_sets_the_countries_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/countries"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let ctrl = controller(&server);
    ctrl.load_countries().await;

    let state = ctrl.snapshot();
    assert!(state.countries.is_empty());
    assert!(state.errors.countries.is_some());
    assert!(!state.loading.countries);
}

// ── Phone and submission ─────────────────────────────────────────────────

#[tokio::test]
async fn submission_assembles_once_every_field_is_chosen() {
    let server = MockServer::start().await;
    mount_countries(&server).await;
    mount_states(&server, 91, india_states(), 0).await;
    mount_dial_code(&server, 91, "India", 0).await;
    mount_districts(
        &server,
        12,
        json!([{"countryCode": 91, "stateId": 12, "districtId": 3, "districtName": "Bengaluru Urban"}]),
    )
    .await;

    let ctrl = controller(&server);
    ctrl.load_countries().await;
    ctrl.select_country(Some(code(91))).await;
    ctrl.select_state(Some(state_id(12))).await;
    ctrl.select_district(Some(district_id(3)));

    // Digits missing: not submittable yet.
    assert!(ctrl.submission().is_none());

    // Formatting characters are stripped on entry.
    ctrl.set_phone_digits("98765-43210");
    assert_eq!(ctrl.formatted_phone_number(), "+91 9876543210");

    let submission = ctrl.submission().expect("complete form");
    assert_eq!(submission.country, "India");
    assert_eq!(submission.state, "Karnataka");
    assert_eq!(submission.district, "Bengaluru Urban");
    assert_eq!(submission.phone_number, "+91 9876543210");
}

#[tokio::test]
async fn reset_form_returns_the_form_to_its_initial_state() {
    let server = MockServer::start().await;
    mount_countries(&server).await;
    mount_states(&server, 91, india_states(), 0).await;
    mount_dial_code(&server, 91, "India", 0).await;

    let ctrl = controller(&server);
    ctrl.load_countries().await;
    ctrl.select_country(Some(code(91))).await;
    ctrl.set_phone_digits("9876543210");

    ctrl.reset_form();

    let state = ctrl.snapshot();
    assert!(state.countries.is_empty());
    assert!(state.states.is_empty());
    assert!(state.districts.is_empty());
    assert!(state.selected_country.is_none());
    assert!(state.dial_code.is_none());
    assert!(state.phone_digits.is_empty());
    assert_eq!(state.loading, Default::default());
    assert!(!state.errors.any());

    // The response cache survives the form reset.
    let (len, _keys) = ctrl.cache_stats();
    assert!(len > 0);
}
