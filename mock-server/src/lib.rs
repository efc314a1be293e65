//! In-memory stand-in for the HR backend.
//!
//! Records are stored as raw JSON objects per collection: the server assigns
//! ids, checks a handful of required fields and echoes back what it stored.
//! When built with a token, every route except the password reset requires
//! `Authorization: Bearer <token>`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

pub const HOLIDAYS: &str = "public-holidays";
pub const LEAVE_TYPES: &str = "policyleavetype";
pub const LEAVE_POLICIES: &str = "leave-policy";
pub const WORK_SHIFTS: &str = "work-time";

pub type Record = Map<String, Value>;

#[derive(Debug, Default)]
pub struct Collection {
    next_id: u64,
    records: BTreeMap<u64, Record>,
}

pub type Db = Arc<RwLock<HashMap<&'static str, Collection>>>;

#[derive(Clone, Default)]
pub struct AppState {
    pub db: Db,
    token: Option<Arc<str>>,
}

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

/// Router that accepts anonymous requests.
pub fn app() -> Router {
    router(AppState::default())
}

/// Router that requires `Authorization: Bearer <token>`.
pub fn app_with_token(token: &str) -> Router {
    router(AppState {
        db: Db::default(),
        token: Some(Arc::from(token)),
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/public-holidays/", collection(HOLIDAYS))
        .route("/public-holidays/{id}/", item(HOLIDAYS))
        .route("/policyleavetype/", collection(LEAVE_TYPES))
        .route("/policyleavetype/{id}/", item(LEAVE_TYPES))
        .route("/leave-policy/", collection(LEAVE_POLICIES))
        .route("/leave-policy/{id}/", item(LEAVE_POLICIES))
        .route(
            "/work-time-view/",
            get(|state: State<AppState>, filter: Query<ListFilter>| {
                list_records(state, filter, WORK_SHIFTS)
            }),
        )
        .route(
            "/work-time-policies/",
            post(|state: State<AppState>, body: Json<Record>| {
                create_record(state, body, WORK_SHIFTS)
            }),
        )
        .route("/work-time-view/{id}/", item(WORK_SHIFTS))
        .route("/reset-password/", post(reset_password))
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_router(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, router).await
}

fn collection(name: &'static str) -> MethodRouter<AppState> {
    get(move |state: State<AppState>, filter: Query<ListFilter>| list_records(state, filter, name))
        .post(move |state: State<AppState>, body: Json<Record>| create_record(state, body, name))
}

fn item(name: &'static str) -> MethodRouter<AppState> {
    axum::routing::put(move |state: State<AppState>, id: Path<u64>, body: Json<Record>| {
        update_record(state, id, body, name)
    })
    .delete(move |state: State<AppState>, id: Path<u64>| delete_record(state, id, name))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl ListFilter {
    /// Match against the record's `date` (`YYYY-MM-DD`); records without a
    /// date ignore the filter.
    fn matches(&self, record: &Record) -> bool {
        let Some(date) = record.get("date").and_then(Value::as_str) else {
            return true;
        };
        let mut parts = date.split('-');
        let year = parts.next().and_then(|y| y.parse::<i32>().ok());
        let month = parts.next().and_then(|m| m.parse::<u32>().ok());
        self.year.map_or(true, |y| year == Some(y)) && self.month.map_or(true, |m| month == Some(m))
    }
}

async fn list_records(
    State(state): State<AppState>,
    Query(filter): Query<ListFilter>,
    name: &'static str,
) -> ApiResult<Json<Vec<Record>>> {
    if let Some(month) = filter.month {
        if !(1..=12).contains(&month) {
            return Err(bad_request(json!({ "month": ["Enter a valid month."] })));
        }
    }
    let db = state.db.read().await;
    let records: Vec<Record> = db
        .get(name)
        .map(|c| c.records.values().filter(|r| filter.matches(r)).cloned().collect())
        .unwrap_or_default();
    Ok(Json(records))
}

async fn create_record(
    State(state): State<AppState>,
    Json(mut record): Json<Record>,
    name: &'static str,
) -> ApiResult<(StatusCode, Json<Record>)> {
    validate(name, &record)?;
    let mut db = state.db.write().await;
    let collection = db.entry(name).or_default();
    collection.next_id += 1;
    let id = collection.next_id;
    record.insert("id".to_string(), Value::from(id));
    collection.records.insert(id, record.clone());
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(changes): Json<Record>,
    name: &'static str,
) -> ApiResult<Json<Record>> {
    let mut db = state.db.write().await;
    let stored = db
        .get_mut(name)
        .and_then(|c| c.records.get_mut(&id))
        .ok_or_else(not_found)?;
    let mut merged = stored.clone();
    for (key, value) in changes {
        if key != "id" {
            merged.insert(key, value);
        }
    }
    validate(name, &merged)?;
    *stored = merged.clone();
    Ok(Json(merged))
}

async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    name: &'static str,
) -> StatusCode {
    let mut db = state.db.write().await;
    db.get_mut(name)
        .and_then(|c| c.records.remove(&id))
        .map(|_| StatusCode::NO_CONTENT)
        .unwrap_or(StatusCode::NOT_FOUND)
}

#[derive(Deserialize)]
pub struct PasswordReset {
    pub uid: String,
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

async fn reset_password(Json(input): Json<PasswordReset>) -> ApiResult<Json<Value>> {
    if input.uid.is_empty() || input.token.is_empty() {
        return Err(bad_request(json!({ "token": ["Invalid or expired reset link."] })));
    }
    if input.new_password != input.confirm_password {
        return Err(bad_request(json!({ "confirm_password": ["Passwords do not match."] })));
    }
    Ok(Json(json!({ "detail": "Password has been reset." })))
}

fn required_fields(name: &str) -> &'static [&'static str] {
    match name {
        HOLIDAYS => &["name", "date"],
        LEAVE_TYPES => &["name"],
        LEAVE_POLICIES => &["leave_type", "frequency", "amount"],
        WORK_SHIFTS => &["shift_type", "start_time", "end_time"],
        _ => &[],
    }
}

fn validate(name: &str, record: &Record) -> ApiResult<()> {
    let mut errors = Map::new();
    for field in required_fields(name) {
        let blank = match record.get(*field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        };
        if blank {
            errors.insert(field.to_string(), json!(["This field may not be blank."]));
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(bad_request(Value::Object(errors)))
    }
}

fn bad_request(body: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(body))
}

fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." })))
}

async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(token) = state.token.as_deref() else {
        return next.run(request).await;
    };
    if request.uri().path() == "/reset-password/" {
        return next.run(request).await;
    }
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match presented {
        Some(presented) if presented == token => next.run(request).await,
        Some(_) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Invalid token." })),
        )
            .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Authentication credentials were not provided." })),
        )
            .into_response(),
    }
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let response = next.run(request).await;
    info!(%method, %uri, status = response.status().as_u16(), "handled request");
    response
}
