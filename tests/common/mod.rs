//! In-process stand-in for the NeuroScan backend.
//!
//! Mirrors the real server's contract: raw-token `Authorization`, FastAPI
//! style `{"detail": ...}` error bodies, `{total, items}` report pages and
//! PDF downloads with `Content-Disposition`.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use neuroscan::client::ApiClient;
use neuroscan::session::Session;
use neuroscan::views::AppContext;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const EMAIL: &str = "house@ppth.org";
pub const PASSWORD: &str = "vicodin-123";

/// One request as the backend saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub headers: HeaderMap,
}

impl Recorded {
    pub fn query_param(&self, key: &str) -> Option<String> {
        self.query.as_deref()?.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k == key).then(|| v.to_string())
        })
    }
}

#[derive(Debug, Default)]
struct Backend {
    doctors: Vec<(i64, String, String, String)>,
    tokens: HashMap<String, i64>,
    patients: Vec<Value>,
    reports: Vec<Value>,
    next_id: i64,
    log: Vec<Recorded>,
}

impl Backend {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

type Shared = Arc<Mutex<Backend>>;

pub struct FakeBackend {
    pub base_url: String,
    state: Shared,
}

impl FakeBackend {
    /// Start on an ephemeral port with one registered doctor
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(Backend::default()));
        {
            let mut b = state.lock().unwrap();
            let id = b.next_id();
            b.doctors
                .push((id, EMAIL.into(), "Gregory House".into(), PASSWORD.into()));
        }

        let app = Router::new()
            .route("/health", get(health))
            .route("/auth/register", post(register))
            .route("/auth/login", post(login))
            .route("/stats", get(stats))
            .route("/patients", get(list_patients).post(create_patient))
            .route("/patients/:id", patch(update_patient).delete(delete_patient))
            .route("/reports", get(list_reports))
            .route("/reports/:file", get(download_report))
            .route("/reports/id/:id", delete(delete_report))
            .route("/inference", post(inference))
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn context(&self) -> AppContext {
        AppContext::new(ApiClient::new(self.base_url.clone()), Session::in_memory())
    }

    /// Issue a token without going through the login endpoint
    pub fn issue_token(&self) -> String {
        let mut b = self.state.lock().unwrap();
        let token = "tok-seeded".to_string();
        b.tokens.insert(token.clone(), 1);
        token
    }

    pub fn add_patient(&self, first: &str, last: &str, mrn: &str) -> i64 {
        let mut b = self.state.lock().unwrap();
        let id = b.next_id();
        b.patients.push(json!({
            "id": id, "first_name": first, "last_name": last,
            "dob": "1970-01-01", "mrn": mrn, "notes": null
        }));
        id
    }

    pub fn add_report(&self, patient_id: i64, image: &str) -> (i64, String) {
        let mut b = self.state.lock().unwrap();
        let id = b.next_id();
        let stem = image.rsplit_once('.').map(|(s, _)| s).unwrap_or(image);
        let file = format!("report_patient{}_{}.pdf", patient_id, stem);
        let patient = b
            .patients
            .iter()
            .find(|p| p["id"] == patient_id)
            .cloned();
        b.reports.push(json!({
            "id": id,
            "patient_id": patient_id,
            "patient_name": patient.as_ref().map(|p| format!("{} {}", p["first_name"].as_str().unwrap(), p["last_name"].as_str().unwrap())),
            "mrn": patient.as_ref().map(|p| p["mrn"].clone()),
            "doctor_id": 1,
            "doctor_name": "Gregory House",
            "image_filename": image,
            "result_label": "tumor",
            "probability": 0.9,
            "report_file": file,
            "created_at": "2025-06-01T10:00:00",
        }));
        (id, file)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    pub fn clear_log(&self) {
        self.state.lock().unwrap().log.clear();
    }

    pub fn patient_count(&self) -> usize {
        self.state.lock().unwrap().patients.len()
    }

    pub fn report_count(&self) -> usize {
        self.state.lock().unwrap().reports.len()
    }
}

async fn record(State(state): State<Shared>, req: Request, next: Next) -> Response {
    let headers = req.headers().clone();
    let text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let entry = Recorded {
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        query: req.uri().query().map(str::to_string),
        authorization: text(header::AUTHORIZATION),
        content_type: text(header::CONTENT_TYPE),
        headers: headers.clone(),
    };
    state.lock().unwrap().log.push(entry);
    next.run(req).await
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn authenticate(state: &Shared, headers: &HeaderMap) -> Result<i64, Response> {
    let Some(token) = headers.get(header::AUTHORIZATION) else {
        return Err(detail(StatusCode::UNAUTHORIZED, "Missing token"));
    };
    let token = token.to_str().unwrap_or_default();
    state
        .lock()
        .unwrap()
        .tokens
        .get(token)
        .copied()
        .ok_or_else(|| detail(StatusCode::UNAUTHORIZED, "Invalid token"))
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut b = state.lock().unwrap();
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if b.doctors.iter().any(|d| d.1 == email) {
        return detail(StatusCode::BAD_REQUEST, "Email already registered");
    }
    let id = b.next_id();
    b.doctors.push((
        id,
        email,
        body["full_name"].as_str().unwrap_or_default().to_string(),
        body["password"].as_str().unwrap_or_default().to_string(),
    ));
    Json(json!({ "ok": true, "id": id })).into_response()
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut b = state.lock().unwrap();
    let found = b
        .doctors
        .iter()
        .find(|d| body["email"] == d.1.as_str() && body["password"] == d.3.as_str())
        .cloned();
    match found {
        Some((id, email, full_name, _)) => {
            let token = format!("tok-{}-{}", id, b.tokens.len());
            b.tokens.insert(token.clone(), id);
            Json(json!({
                "token": token,
                "doctor": { "id": id, "full_name": full_name, "email": email }
            }))
            .into_response()
        }
        None => detail(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

async fn stats(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(r) = authenticate(&state, &headers) {
        return r;
    }
    let b = state.lock().unwrap();
    Json(json!({
        "patients": b.patients.len(),
        "reports": b.reports.len(),
        "today_scans": 0,
    }))
    .into_response()
}

async fn list_patients(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(r) = authenticate(&state, &headers) {
        return r;
    }
    Json(Value::Array(state.lock().unwrap().patients.clone())).into_response()
}

async fn create_patient(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(r) = authenticate(&state, &headers) {
        return r;
    }
    let mut b = state.lock().unwrap();
    if b.patients.iter().any(|p| p["mrn"] == body["mrn"]) {
        return detail(StatusCode::BAD_REQUEST, "MRN already exists");
    }
    let id = b.next_id();
    let mut patient = body;
    patient["id"] = json!(id);
    b.patients.push(patient);
    Json(json!({ "id": id })).into_response()
}

async fn update_patient(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(r) = authenticate(&state, &headers) {
        return r;
    }
    let mut b = state.lock().unwrap();
    let Some(patient) = b.patients.iter_mut().find(|p| p["id"] == id) else {
        return detail(StatusCode::NOT_FOUND, "Not found");
    };
    if let Some(fields) = body.as_object() {
        for (k, v) in fields {
            patient[k] = v.clone();
        }
    }
    Json(json!({ "ok": true })).into_response()
}

async fn delete_patient(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(r) = authenticate(&state, &headers) {
        return r;
    }
    let mut b = state.lock().unwrap();
    let before = b.patients.len();
    b.patients.retain(|p| p["id"] != id);
    if b.patients.len() == before {
        return detail(StatusCode::NOT_FOUND, "Not found");
    }
    Json(json!({ "ok": true })).into_response()
}

async fn list_reports(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(r) = authenticate(&state, &headers) {
        return r;
    }
    let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(20);
    let offset: usize = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    let patient_id: Option<i64> = params.get("patient_id").and_then(|v| v.parse().ok());

    let b = state.lock().unwrap();
    // newest first
    let matching: Vec<&Value> = b
        .reports
        .iter()
        .rev()
        .filter(|r| patient_id.map_or(true, |id| r["patient_id"] == id))
        .collect();
    let items: Vec<Value> = matching
        .iter()
        .skip(offset)
        .take(limit)
        .map(|v| (*v).clone())
        .collect();

    Json(json!({ "total": matching.len(), "items": items })).into_response()
}

async fn download_report(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(file): Path<String>,
) -> Response {
    if let Err(r) = authenticate(&state, &headers) {
        return r;
    }
    let exists = state
        .lock()
        .unwrap()
        .reports
        .iter()
        .any(|r| r["report_file"] == file.as_str());
    if !exists {
        return detail(StatusCode::NOT_FOUND, "Report not found");
    }

    let body = Bytes::from(format!("%PDF-1.4 {}", file));
    if file.contains("nodisp") {
        ([(header::CONTENT_TYPE, "application/pdf".to_string())], body).into_response()
    } else {
        (
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file),
                ),
            ],
            body,
        )
            .into_response()
    }
}

async fn delete_report(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(r) = authenticate(&state, &headers) {
        return r;
    }
    let mut b = state.lock().unwrap();
    let before = b.reports.len();
    b.reports.retain(|r| r["id"] != id);
    if b.reports.len() == before {
        return detail(StatusCode::NOT_FOUND, "Report not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn inference(
    State(state): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if let Err(r) = authenticate(&state, &headers) {
        return r;
    }

    let mut patient_id = None;
    let mut file_name = None;
    let mut size = 0;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("patient_id") => {
                patient_id = field.text().await.ok().and_then(|t| t.parse::<i64>().ok());
            }
            Some("file") => {
                file_name = field.file_name().map(str::to_string);
                size = field.bytes().await.map(|b| b.len()).unwrap_or(0);
            }
            _ => {}
        }
    }

    let (Some(patient_id), Some(file_name)) = (patient_id, file_name) else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "field required");
    };
    if size == 0 {
        return detail(StatusCode::BAD_REQUEST, "Empty upload");
    }
    let known = state
        .lock()
        .unwrap()
        .patients
        .iter()
        .any(|p| p["id"] == patient_id);
    if !known {
        return detail(StatusCode::NOT_FOUND, "Patient not found");
    }

    let fake = FakeBackend {
        base_url: String::new(),
        state: state.clone(),
    };
    let (report_id, report_file) = fake.add_report(patient_id, &file_name);

    Json(json!({
        "label": "tumor",
        "probability": 0.934,
        "report_id": report_id,
        "report_file": report_file,
        "overlay_file": null,
    }))
    .into_response()
}
