//! ApiClient against an in-process axum backend

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use regdash_client::{ApiClient, ClientError};
use regdash_core::{DashError, DataSource, Record};
use serde_json::{json, Value};

type Rows = Arc<Mutex<Vec<Value>>>;

fn not_found(id: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("agente {} no existe", id) })),
    )
}

fn same_id(row: &Value, id: &str) -> bool {
    row["agente_id"].to_string().trim_matches('"') == id
}

async fn list(State(rows): State<Rows>) -> Json<Value> {
    Json(Value::Array(rows.lock().unwrap().clone()))
}

async fn create(State(rows): State<Rows>, Json(mut body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut rows = rows.lock().unwrap();
    let next = rows.len() as i64 + 100;
    body["agente_id"] = json!(next);
    rows.push(body.clone());
    (StatusCode::CREATED, Json(body))
}

async fn update(
    State(rows): State<Rows>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut rows = rows.lock().unwrap();
    let row = rows.iter_mut().find(|r| same_id(r, &id)).ok_or_else(|| not_found(&id))?;
    *row = body.clone();
    Ok(Json(body))
}

async fn remove(
    State(rows): State<Rows>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    let mut rows = rows.lock().unwrap();
    let before = rows.len();
    rows.retain(|r| !same_id(r, &id));
    if rows.len() == before {
        return Err(not_found(&id));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "database offline")
}

async fn wrapped() -> Json<Value> {
    Json(json!({ "data": [{ "id": 1, "nombre": "Ingeniería" }, { "id": 2, "nombre": "Derecho" }] }))
}

async fn message_only() -> Json<Value> {
    Json(json!("ok"))
}

async fn spawn_backend() -> (SocketAddr, Rows) {
    let rows: Rows = Arc::new(Mutex::new(vec![
        json!({ "agente_id": 1, "nombre_agente": "Ana", "telefono_agente": "3001112233" }),
        json!({ "agente_id": 2, "nombre_agente": "Luis", "telefono_agente": "3004445566" }),
    ]));

    let app = Router::new()
        .route("/api/agentes", get(list).post(create))
        .route("/api/agentes/{id}", put(update).delete(remove))
        .route("/api/programas", get(wrapped))
        .route("/api/roto", get(broken))
        .route("/api/silencioso", axum::routing::post(message_only))
        .with_state(rows.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, rows)
}

fn client(addr: SocketAddr) -> ApiClient {
    ApiClient::new(&format!("http://{}/api", addr)).unwrap()
}

#[tokio::test]
async fn fetch_all_builds_a_collection() {
    let (addr, _) = spawn_backend().await;
    let collection = client(addr).fetch_all("agentes", "agente_id").await.unwrap();

    assert_eq!(collection.len(), 2);
    assert_eq!(collection.identity_field(), "agente_id");
    assert!(collection.find("2").is_some());
}

#[tokio::test]
async fn wrapped_list_bodies_are_unwrapped() {
    let (addr, _) = spawn_backend().await;
    let collection = client(addr).fetch_all("programas", "id").await.unwrap();
    assert_eq!(collection.len(), 2);
}

#[tokio::test]
async fn create_returns_the_server_row() {
    let (addr, rows) = spawn_backend().await;
    let draft = Record::new()
        .with("nombre_agente", "Marta")
        .with("telefono_agente", "3007778899");

    let created = client(addr).create("agentes", &draft).await.unwrap();
    assert_eq!(created.identity_key("agente_id").as_deref(), Some("102"));
    assert_eq!(rows.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn write_without_a_row_comes_back_empty() {
    let (addr, _) = spawn_backend().await;
    let record = Record::new().with("x", 1i64);
    let answer = client(addr).create("silencioso", &record).await.unwrap();
    assert!(answer.is_empty());
}

#[tokio::test]
async fn update_and_delete_round() {
    let (addr, rows) = spawn_backend().await;
    let api = client(addr);

    let edited = Record::new()
        .with("agente_id", 1i64)
        .with("nombre_agente", "Ana María")
        .with("telefono_agente", "3001112233");
    let saved = api.update("agentes", "1", &edited).await.unwrap();
    assert_eq!(saved, edited);
    assert_eq!(rows.lock().unwrap()[0]["nombre_agente"], "Ana María");

    api.delete("agentes", "2").await.unwrap();
    let left = api.fetch_all("agentes", "agente_id").await.unwrap();
    assert_eq!(left.len(), 1);
    assert!(left.find("2").is_none());
}

#[tokio::test]
async fn missing_rows_surface_as_http_404() {
    let (addr, _) = spawn_backend().await;
    let err = client(addr).delete("agentes", "77").await.unwrap_err();

    match err {
        DashError::Http { status, body, url } => {
            assert_eq!(status, 404);
            assert_eq!(body, "agente 77 no existe");
            assert!(url.ends_with("/api/agentes/77"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn plain_text_errors_keep_their_body() {
    let (addr, _) = spawn_backend().await;
    let err = client(addr).list("roto").await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Http { status: 500, ref body, .. } if body == "database offline"
    ));
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(addr).fetch_records("agentes").await.unwrap_err();
    assert!(matches!(err, DashError::Transport { .. }));
    assert!(err.is_remote());
}
