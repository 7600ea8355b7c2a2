use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wattbook::models::{BillingSettings, Equipment, ImportBundle};
use wattbook::service::DataService;
use wattbook::store::{Collection, RestStore, Store, StoreError};

async fn store_for(server: &MockServer) -> RestStore {
    RestStore::new(&format!("{}/api", server.uri()))
}

// ureq is blocking; keep it off the runtime threads that drive the mock server
async fn blocking<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    tokio::task::spawn_blocking(f).await.unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn get_forwards_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/usage-history"))
        .and(query_param("date", "2026-10-14"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let found = blocking(move || store.get(Collection::UsageHistory, &[("date", "2026-10-14")]))
        .await
        .unwrap();
    assert_eq!(found, Some(json!([])));
}

#[tokio::test(flavor = "multi_thread")]
async fn null_response_is_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/billing-settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Null))
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let found = blocking(move || store.get(Collection::BillingSettings, &[]))
        .await
        .unwrap();
    assert_eq!(found, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn save_posts_json_body() {
    let server = MockServer::start().await;
    let payload = json!([{"id": 1, "name": "Fan", "watts": 75}]);
    Mock::given(method("POST"))
        .and(path("/api/equipment"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let reply = blocking(move || store.save(Collection::Equipment, &payload))
        .await
        .unwrap();
    assert_eq!(reply, json!({"ok": true}));
}

#[tokio::test(flavor = "multi_thread")]
async fn update_and_delete_address_items_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/equipment/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/equipment/5"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    blocking(move || {
        let updated = store
            .update(Collection::Equipment, "5", &json!({"name": "Lamp"}))
            .unwrap();
        assert_eq!(updated, json!({"id": 5}));
        store.delete_item(Collection::Equipment, "5").unwrap();
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/equipment"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let err = blocking(move || store.get(Collection::Equipment, &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Status { code: 503 }), "got {err:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn load_falls_back_to_starter_set_when_api_has_nothing() {
    let server = MockServer::start().await;
    for endpoint in ["equipment", "usage-history", "billing-settings"] {
        Mock::given(method("GET"))
            .and(path(format!("/api/{endpoint}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Null))
            .mount(&server)
            .await;
    }

    let store = store_for(&server).await;
    let snapshot = blocking(move || DataService::new(Box::new(store)).load())
        .await
        .unwrap();
    assert_eq!(snapshot.equipment, Equipment::starter_set());
    assert!(snapshot.usage_history.is_empty());
    assert_eq!(snapshot.billing_settings, BillingSettings::initial());
}

#[tokio::test(flavor = "multi_thread")]
async fn partial_import_failure_names_the_failed_collection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/usage-history"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    for endpoint in ["equipment", "billing-settings"] {
        Mock::given(method("POST"))
            .and(path(format!("/api/{endpoint}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
    }

    let store = store_for(&server).await;
    let err = blocking(move || DataService::new(Box::new(store)).import_all(ImportBundle::default()))
        .await
        .unwrap_err();
    match err {
        StoreError::Incomplete { operation, failed } => {
            assert_eq!(operation, "import");
            assert_eq!(failed, vec![Collection::UsageHistory]);
        }
        other => panic!("unexpected {other:?}"),
    }
}
