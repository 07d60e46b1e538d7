use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Form, Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use planner::doc::{ElementKind, PlanStore, SwingDirection};
use planner::geom::Point;
use serde_json::{Value, json};

use super::*;

type Captured = Arc<Mutex<Vec<Value>>>;

/// Serve `router` on an ephemeral port and return a client pointed at it.
async fn spawn(router: Router) -> PlanClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    PlanClient::new(&GatewayConfig::with_base_url(format!("http://{addr}"))).unwrap()
}

fn plan_json() -> Value {
    json!({
        "elements": [
            { "id": 1, "type": "wall", "x1": 0, "y1": 0, "x2": 100, "y2": 0, "thickness": 6 },
            { "id": 2, "type": "door", "wallId": 1, "distanceAlongWall": 20, "length": 10, "swingDirection": 1 }
        ],
        "config": { "gridSize": 10 }
    })
}

fn sample_snapshot() -> PlanSnapshot {
    let mut store = PlanStore::new();
    let wall = store
        .add(|id| Ok(Element::wall(id, Point::new(0.0, 0.0), Point::new(100.0, 0.0), 6.0)))
        .unwrap()
        .id;
    store
        .add(|id| Element::wall_child(id, ElementKind::Door, wall, 20.0, 10.0, SwingDirection::Forward))
        .unwrap();
    store.snapshot()
}

// =============================================================================
// load_plan
// =============================================================================

#[tokio::test]
async fn load_plan_parses_elements_and_config() {
    let router = Router::new().route(
        "/floorplan_editor/{id}",
        get(|Path(id): Path<u64>| async move {
            if id == 7 { (StatusCode::OK, Json(plan_json())) } else { (StatusCode::NOT_FOUND, Json(json!({}))) }
        }),
    );
    let client = spawn(router).await;

    let snapshot = client.load_plan(7).await.unwrap();
    assert_eq!(snapshot.elements.len(), 2);
    assert_eq!(snapshot.elements[1].kind(), ElementKind::Door);
    assert_eq!(snapshot.config, Some(json!({ "gridSize": 10 })));
}

#[tokio::test]
async fn load_plan_non_success_status() {
    let router = Router::new().route("/floorplan_editor/{id}", get(|| async { (StatusCode::NOT_FOUND, "no such plan") }));
    let client = spawn(router).await;

    let err = client.load_plan(3).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(matches!(err, GatewayError::Response { ref body, .. } if body == "no such plan"));
}

#[tokio::test]
async fn load_plan_malformed_body() {
    let router = Router::new().route("/floorplan_editor/{id}", get(|| async { "<html>editor</html>" }));
    let client = spawn(router).await;

    assert!(matches!(client.load_plan(3).await, Err(GatewayError::Parse(_))));
}

#[tokio::test]
async fn load_plan_or_empty_degrades_to_empty_plan() {
    let router = Router::new().route("/floorplan_editor/{id}", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let client = spawn(router).await;

    assert_eq!(client.load_plan_or_empty(3).await, PlanSnapshot::default());
}

#[tokio::test]
async fn unreachable_backend_is_request_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = PlanClient::new(&GatewayConfig::with_base_url(format!("http://{addr}"))).unwrap();

    assert!(matches!(client.load_plan(1).await, Err(GatewayError::Request(_))));
}

// =============================================================================
// save_plan
// =============================================================================

#[tokio::test]
async fn save_plan_posts_elements_and_timestamp() {
    let captured = Captured::default();
    let router = Router::new()
        .route(
            "/save_floorplan/{id}",
            post(|State(seen): State<Captured>, Path(id): Path<u64>, Json(body): Json<Value>| async move {
                seen.lock().unwrap().push(json!({ "id": id, "body": body }));
                Json(json!({ "message": "saved" }))
            }),
        )
        .with_state(captured.clone());
    let client = spawn(router).await;

    let outcome = client.save_plan(3, &sample_snapshot()).await.unwrap();
    assert_eq!(outcome, SaveOutcome::Saved);

    let seen = captured.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["id"], 3);
    let body = &seen[0]["body"];
    assert_eq!(body["elements"].as_array().unwrap().len(), 2);
    assert_eq!(body["elements"][1]["type"], "door");
    assert_eq!(body["elements"][1]["wallId"], 1);
    assert!(body["timestamp"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn save_plan_failure_is_reported() {
    let router = Router::new()
        .route("/save_floorplan/{id}", post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database down") }));
    let client = spawn(router).await;

    let err = client.save_plan(3, &sample_snapshot()).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn slow_save_overtaken_by_newer_save() {
    let router = Router::new().route(
        "/save_floorplan/{id}",
        post(|Path(id): Path<u64>| async move {
            if id == 1 {
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            "ok"
        }),
    );
    let client = spawn(router).await;
    let snapshot = PlanSnapshot::default();

    let (slow, fast) = tokio::join!(client.save_plan(1, &snapshot), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.save_plan(2, &snapshot).await
    });
    assert_eq!(fast.unwrap(), SaveOutcome::Saved);
    assert_eq!(slow.unwrap(), SaveOutcome::Superseded);
}

// =============================================================================
// Per-element endpoints
// =============================================================================

#[tokio::test]
async fn create_element_returns_new_id() {
    let captured = Captured::default();
    let router = Router::new()
        .route(
            "/element",
            post(|State(seen): State<Captured>, Json(body): Json<Value>| async move {
                seen.lock().unwrap().push(body);
                Json(json!({ "new_id": 42 }))
            }),
        )
        .with_state(captured.clone());
    let client = spawn(router).await;

    let store = PlanStore::new();
    let kit = Element::kit(5, Point::new(50.0, 50.0), 20.0);
    let record = ElementRecord::from_element(&store, &kit).unwrap();
    assert_eq!(client.create_element(&record).await.unwrap(), Some(42));
    assert_eq!(captured.lock().unwrap()[0]["element_type"], "emergency-kit");
}

#[tokio::test]
async fn create_element_without_id_in_ack() {
    let router = Router::new().route("/element", post(|| async { Json(json!({ "message": "updated" })) }));
    let client = spawn(router).await;

    let store = PlanStore::new();
    let kit = Element::kit(5, Point::new(50.0, 50.0), 20.0);
    let record = ElementRecord::from_element(&store, &kit).unwrap().with_id(5);
    assert_eq!(client.create_element(&record).await.unwrap(), None);
}

#[tokio::test]
async fn delete_element_sends_element_id() {
    let captured = Captured::default();
    let router = Router::new()
        .route(
            "/element/selected",
            delete(|State(seen): State<Captured>, Json(body): Json<Value>| async move {
                seen.lock().unwrap().push(body);
                StatusCode::OK
            }),
        )
        .with_state(captured.clone());
    let client = spawn(router).await;

    client.delete_element(17).await.unwrap();
    assert_eq!(captured.lock().unwrap()[0], json!({ "element_id": 17 }));
}

#[tokio::test]
async fn save_safety_info_sends_form_field() {
    let router = Router::new().route(
        "/save_safety_info/{plan}/{element}",
        post(|Path((plan, element)): Path<(u64, u64)>, Form(form): Form<HashMap<String, String>>| async move {
            format!("{plan}/{element}:{}", form.get("safety_data").cloned().unwrap_or_default())
        }),
    );
    let client = spawn(router).await;

    let ack = client.save_safety_info(3, 9, &json!({ "hazardLevel": 4 })).await.unwrap();
    assert_eq!(ack, r#"3/9:{"hazardLevel":4}"#);
}

#[tokio::test]
async fn side_panels_return_text() {
    let router = Router::new()
        .route("/machine_info/{element}", get(|Path(element): Path<u64>| async move { format!("<h4>Machine {element}</h4>") }))
        .route(
            "/get_documents/{plan}/{element}",
            get(|Path((plan, element)): Path<(u64, u64)>| async move { format!("<ul>{plan}:{element}</ul>") }),
        );
    let client = spawn(router).await;

    assert_eq!(client.machine_info(4).await.unwrap(), "<h4>Machine 4</h4>");
    assert_eq!(client.documents(3, 4).await.unwrap(), "<ul>3:4</ul>");
}

#[tokio::test]
async fn upload_document_sends_multipart_file() {
    let router = Router::new().route(
        "/upload_document/{plan}/{element}",
        post(|mut multipart: Multipart| async move {
            let field = multipart.next_field().await.unwrap().unwrap();
            let name = field.name().unwrap_or_default().to_owned();
            let file = field.file_name().unwrap_or_default().to_owned();
            let bytes = field.bytes().await.unwrap();
            format!("{name}:{file}:{}", bytes.len())
        }),
    );
    let client = spawn(router).await;

    let ack = client.upload_document(3, 4, "manual.pdf".to_owned(), b"%PDF-".to_vec()).await.unwrap();
    assert_eq!(ack, "document_upload:manual.pdf:5");
}
