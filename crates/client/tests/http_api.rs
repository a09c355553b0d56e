use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use chrono::NaiveDate;
use serde_json::{json, Value};

use wareops_approvals::TicketType;
use wareops_client::api::{NewContainer, WarehouseApi, ZoneUpdate};
use wareops_client::{ClientConfig, ClientError, HttpWarehouseApi};
use wareops_core::{
    ContainerId, DateRange, Dimensions, InventoryId, NomenclatureId, TicketId, UserId, WarehouseId,
    ZoneId,
};
use wareops_stocktake::{CheckStatus, SubmitLine};

const TOKEN: &str = "secret-token";
const USER: UserId = UserId::new(42);

#[derive(Debug, Clone)]
struct Received {
    method: String,
    path: String,
    query: Option<String>,
    authorization: Option<String>,
    body: String,
}

impl Received {
    fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body is not JSON")
    }
}

#[derive(Default)]
struct Recorder {
    replies: Mutex<HashMap<String, (StatusCode, String)>>,
    received: Mutex<Vec<Received>>,
}

async fn record(
    State(recorder): State<Arc<Recorder>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let route = format!("{} {}", method, uri.path());
    recorder.received.lock().unwrap().push(Received {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    recorder
        .replies
        .lock()
        .unwrap()
        .get(&route)
        .cloned()
        .unwrap_or((StatusCode::OK, String::new()))
}

struct TestServer {
    base_url: String,
    recorder: Arc<Recorder>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let recorder = Arc::new(Recorder::default());
        let app = Router::new().fallback(record).with_state(Arc::clone(&recorder));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: format!("http://{addr}"),
            recorder,
            handle,
        }
    }

    fn reply(&self, route: &str, status: StatusCode, body: impl Into<String>) {
        self.recorder
            .replies
            .lock()
            .unwrap()
            .insert(route.to_string(), (status, body.into()));
    }

    fn received(&self) -> Vec<Received> {
        self.recorder.received.lock().unwrap().clone()
    }

    fn api(&self) -> HttpWarehouseApi {
        let config = ClientConfig::new(format!("{}/", self.base_url)).with_timeout(Duration::from_secs(5));
        HttpWarehouseApi::new(&config, TOKEN).unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn january() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    )
    .unwrap()
}

#[tokio::test]
async fn list_zones_unwraps_the_envelope_and_sends_the_token() {
    let server = TestServer::spawn().await;
    server.reply(
        "GET /warehouses/1/zones",
        StatusCode::OK,
        json!({
            "message": "ok",
            "body": [{
                "id": 3,
                "parentId": null,
                "name": "Rack A",
                "width": 2.0,
                "height": 1.0,
                "length": 1.0,
                "capacity": 2.0,
                "canStoreItems": false
            }]
        })
        .to_string(),
    );

    let zones = server.api().list_zones(WarehouseId::new(1)).await.unwrap();
    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0].id, ZoneId::new(3));
    assert_eq!(zones[0].name, "Rack A");

    let received = server.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].method, "GET");
    assert_eq!(received[0].path, "/warehouses/1/zones");
    assert_eq!(received[0].authorization.as_deref(), Some("Bearer secret-token"));
}

#[tokio::test]
async fn list_without_a_body_is_empty() {
    let server = TestServer::spawn().await;
    server.reply("GET /warehouse/container/zone/3", StatusCode::OK, json!({"message": "none"}).to_string());

    let api = server.api();
    assert!(api.list_containers(ZoneId::new(3)).await.unwrap().is_empty());
    assert!(api.zone_items(ZoneId::new(4)).await.unwrap().is_empty());
    assert_eq!(server.received()[1].path, "/inventory/zones/4/items");
}

#[tokio::test]
async fn query_parameters_follow_each_route() {
    let server = TestServer::spawn().await;
    server.reply(
        "POST /inventory-check/start",
        StatusCode::OK,
        json!({"body": {"id": 55, "warehouseId": 1, "status": "IN_PROGRESS", "createdBy": 42}}).to_string(),
    );
    let api = server.api();

    let update = ZoneUpdate {
        id: ZoneId::new(3),
        name: "Rack A".into(),
        can_store_items: true,
        parent_id: None,
        width: None,
        height: None,
        length: None,
    };
    api.update_zone(WarehouseId::new(1), USER, &update).await.unwrap();

    let summary = api.start_stocktake(WarehouseId::new(1), USER).await.unwrap();
    assert_eq!(summary.id, InventoryId::new(55));
    assert_eq!(summary.status, CheckStatus::InProgress);

    assert!(api.tickets(TicketType::WriteOff, january()).await.unwrap().is_empty());
    assert!(api.in_progress_stocktakes(january()).await.unwrap().is_empty());

    let received = server.received();
    assert_eq!(received[0].method, "PUT");
    assert_eq!(received[0].path, "/warehouses/1/zones");
    assert_eq!(received[0].query.as_deref(), Some("userId=42"));
    let body = received[0].json();
    assert_eq!(body["id"], 3);
    assert_eq!(body["canStoreItems"], true);
    assert!(body.get("width").is_none());

    assert_eq!(received[1].method, "POST");
    assert_eq!(received[1].query.as_deref(), Some("warehouseId=1&createdBy=42"));

    assert_eq!(received[2].path, "/tickets/WRITE-OFF");
    assert_eq!(received[2].query.as_deref(), Some("startDate=2024-01-05&endDate=2024-01-31"));
    assert_eq!(received[3].path, "/inventory-check/in-progress");
    assert_eq!(received[3].query.as_deref(), Some("startDate=2024-01-05&endDate=2024-01-31"));
}

#[tokio::test]
async fn approval_bodies_match_the_wire_names() {
    let server = TestServer::spawn().await;
    let api = server.api();

    api.approve_ticket(TicketId::new(5), USER).await.unwrap();
    let reply = api
        .approve_batch(&[TicketId::new(1), TicketId::new(2)], USER)
        .await
        .unwrap();
    // No reply body: every ticket counts as approved.
    assert_eq!(reply.approved_ids, vec![TicketId::new(1), TicketId::new(2)]);
    assert!(!reply.is_partial());
    api.execute_write_off(TicketId::new(8)).await.unwrap();
    api.cancel_ticket(TicketId::new(9)).await.unwrap();

    let received = server.received();
    assert_eq!((received[0].method.as_str(), received[0].path.as_str()), ("PUT", "/ticket/allow"));
    assert_eq!(received[0].json(), json!({"ticketId": 5, "managed_id": 42}));
    assert_eq!(received[1].path, "/ticket/allow/batch");
    assert_eq!(received[1].json(), json!({"ticketIds": [1, 2], "managedId": 42}));
    assert_eq!((received[2].method.as_str(), received[2].path.as_str()), ("PUT", "/ticket/write-off/8"));
    assert_eq!((received[3].method.as_str(), received[3].path.as_str()), ("DELETE", "/ticket/9"));
}

#[tokio::test]
async fn partial_batch_reply_is_reported() {
    let server = TestServer::spawn().await;
    server.reply(
        "PUT /ticket/allow/batch",
        StatusCode::OK,
        json!({"body": {"approvedIds": [1], "rejectedIds": [2]}}).to_string(),
    );

    let reply = server
        .api()
        .approve_batch(&[TicketId::new(1), TicketId::new(2)], USER)
        .await
        .unwrap();
    assert!(reply.is_partial());
    assert_eq!(reply.rejected_ids, vec![TicketId::new(2)]);
}

#[tokio::test]
async fn submission_posts_the_changed_lines() {
    let server = TestServer::spawn().await;
    let lines = vec![SubmitLine {
        nomenclature_id: NomenclatureId::new(101),
        warehouse_zone_id: ZoneId::new(1),
        container_id: Some(ContainerId::new(4)),
        actual_quantity: 8.0,
    }];

    server.api().submit_stocktake(InventoryId::new(9), &lines).await.unwrap();

    let received = server.received();
    assert_eq!(received[0].method, "POST");
    assert_eq!(received[0].path, "/inventory-check/process/9");
    assert_eq!(
        received[0].json(),
        json!([{"nomenclatureId": 101, "warehouseZoneId": 1, "containerId": 4, "actualQuantity": 8.0}])
    );
}

#[tokio::test]
async fn rejections_carry_the_server_message() {
    let server = TestServer::spawn().await;
    server.reply(
        "DELETE /warehouses/zones/3",
        StatusCode::CONFLICT,
        json!({"message": "Zone is not empty"}).to_string(),
    );
    server.reply("DELETE /warehouse/container/4", StatusCode::INTERNAL_SERVER_ERROR, "");
    let api = server.api();

    let err = api.delete_zone(ZoneId::new(3)).await.unwrap_err();
    assert_eq!(
        err,
        ClientError::Server {
            status: 409,
            message: Some("Zone is not empty".into()),
        }
    );
    assert_eq!(err.user_message("Could not delete zone"), "Zone is not empty");

    let err = api.delete_container(ContainerId::new(4)).await.unwrap_err();
    match &err {
        ClientError::Server { status: 500, message: None } => {}
        other => panic!("Expected Server error without message, got {other:?}"),
    }
    assert_eq!(err.user_message("Could not delete container"), "Could not delete container");
}

#[tokio::test]
async fn creation_without_a_record_is_a_decode_error() {
    let server = TestServer::spawn().await;
    server.reply("GET /inventory-check/7", StatusCode::OK, "{not json");
    let api = server.api();

    let container = NewContainer::new(ZoneId::new(3), "C-1", Dimensions::new(0.5, 0.5, 0.5), 1.0);
    match api.create_container(&container).await {
        Err(ClientError::Decode(_)) => {}
        other => panic!("Expected Decode error, got {other:?}"),
    }
    match api.fetch_stocktake(InventoryId::new(7)).await {
        Err(ClientError::Decode(_)) => {}
        other => panic!("Expected Decode error, got {other:?}"),
    }
    assert_eq!(server.received()[0].json()["serialNumber"], "C-1");
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::new(format!("http://{addr}")).with_timeout(Duration::from_secs(2));
    let api = HttpWarehouseApi::new(&config, TOKEN).unwrap();
    match api.list_zones(WarehouseId::new(1)).await {
        Err(ClientError::Network(_)) => {}
        other => panic!("Expected Network error, got {other:?}"),
    }
}
