//! Backend REST API Client
//!
//! Thin wrapper over `reqwest` that knows the backend's two conventions:
//! JSON bodies, and the session token sent verbatim as `Authorization`
//! (no `Bearer` prefix).
//!
//! Every call is a single attempt. There is no retry, backoff or explicit
//! timeout; a failure surfaces as [`ClientError::Api`] for non-2xx replies or
//! as a transport error.

mod download;
mod dto;

pub use download::{filename_from_disposition, suggested_filename, Download};
pub use dto::{
    CreatedPatient, Credentials, Doctor, InferenceResult, LoginResponse, NewPatient, Patient,
    PatientUpdate, Registration, ReportItem, ReportPage, ReportQuery, Stats,
};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

use crate::session::SessionError;

/// Errors surfaced by client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Backend answered with a non-success status; `message` is the body text
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Cannot connect to API at {base_url}")]
    Unavailable { base_url: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Not authenticated")]
    Unauthenticated,
}

impl ClientError {
    /// Text shown to the user: the backend's body unchanged for API errors,
    /// the error description otherwise.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Per-request options merged by [`ApiClient::request`]
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<String>,
    pub headers: HeaderMap,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: HeaderMap::new(),
        }
    }
}

impl RequestOptions {
    pub fn method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn json<T: Serialize>(method: Method, body: &T) -> ClientResult<Self> {
        let body = serde_json::to_string(body).map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(Self {
            method,
            body: Some(body),
            headers: HeaderMap::new(),
        })
    }
}

/// An image selected for inference
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self { file_name, bytes })
    }

    pub fn mime_type(&self) -> &'static str {
        let ext = Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match ext.as_deref() {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("bmp") => "image/bmp",
            Some("webp") => "image/webp",
            Some("tif") | Some("tiff") => "image/tiff",
            _ => "application/octet-stream",
        }
    }
}

/// REST client bound to one backend base URL
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, method: Method, path: &str, token: Option<&str>) -> ClientResult<RequestBuilder> {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, raw_token_header(token)?);
        }
        Ok(builder)
    }

    async fn send(&self, builder: RequestBuilder, method: &Method, path: &str) -> ClientResult<Response> {
        let request_id = uuid::Uuid::new_v4();
        tracing::debug!(request_id = %request_id, method = %method, path, "Sending request");

        let response = builder.send().await.map_err(|e| {
            tracing::debug!(request_id = %request_id, error = %e, "Request failed");
            if e.is_connect() {
                ClientError::Unavailable {
                    base_url: self.base_url.clone(),
                }
            } else {
                ClientError::Transport(e)
            }
        })?;

        tracing::debug!(request_id = %request_id, status = %response.status(), "Response received");
        Ok(response)
    }

    /// Issue a JSON request and return the raw response.
    ///
    /// `Content-Type: application/json` is merged under the caller's headers;
    /// a token, if given, becomes the `Authorization` value as-is. The
    /// response status is not checked.
    pub async fn request(
        &self,
        path: &str,
        options: RequestOptions,
        token: Option<&str>,
    ) -> ClientResult<Response> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in options.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }
        if let Some(token) = token {
            headers.insert(AUTHORIZATION, raw_token_header(token)?);
        }

        let mut builder = self.http.request(options.method.clone(), self.url(path)).headers(headers);
        if let Some(body) = options.body {
            builder = builder.body(body);
        }

        self.send(builder, &options.method, path).await
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
        token: Option<&str>,
    ) -> ClientResult<T> {
        let response = ensure_success(self.request(path, options, token).await?).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn request_ok(&self, path: &str, options: RequestOptions, token: Option<&str>) -> ClientResult<()> {
        ensure_success(self.request(path, options, token).await?).await?;
        Ok(())
    }

    // ============================================
    // Auth
    // ============================================

    pub async fn login(&self, credentials: &Credentials) -> ClientResult<LoginResponse> {
        self.request_json("/auth/login", RequestOptions::json(Method::POST, credentials)?, None)
            .await
    }

    pub async fn register(&self, registration: &Registration) -> ClientResult<()> {
        self.request_ok(
            "/auth/register",
            RequestOptions::json(Method::POST, registration)?,
            None,
        )
        .await
    }

    // ============================================
    // Dashboard
    // ============================================

    pub async fn stats(&self, token: &str) -> ClientResult<Stats> {
        self.request_json("/stats", RequestOptions::default(), Some(token))
            .await
    }

    pub async fn health(&self) -> ClientResult<()> {
        self.request_ok("/health", RequestOptions::default(), None).await
    }

    // ============================================
    // Patients
    // ============================================

    pub async fn list_patients(&self, token: &str) -> ClientResult<Vec<Patient>> {
        self.request_json("/patients", RequestOptions::default(), Some(token))
            .await
    }

    pub async fn create_patient(&self, token: &str, patient: &NewPatient) -> ClientResult<CreatedPatient> {
        self.request_json(
            "/patients",
            RequestOptions::json(Method::POST, patient)?,
            Some(token),
        )
        .await
    }

    pub async fn update_patient(&self, token: &str, id: i64, update: &PatientUpdate) -> ClientResult<()> {
        self.request_ok(
            &format!("/patients/{}", id),
            RequestOptions::json(Method::PATCH, update)?,
            Some(token),
        )
        .await
    }

    pub async fn delete_patient(&self, token: &str, id: i64) -> ClientResult<()> {
        self.request_ok(
            &format!("/patients/{}", id),
            RequestOptions::method(Method::DELETE),
            Some(token),
        )
        .await
    }

    // ============================================
    // Reports
    // ============================================

    pub async fn list_reports(&self, token: &str, query: &ReportQuery) -> ClientResult<ReportPage> {
        self.request_json(
            &format!("/reports?{}", query.to_query_string()),
            RequestOptions::default(),
            Some(token),
        )
        .await
    }

    pub async fn delete_report(&self, token: &str, id: i64) -> ClientResult<()> {
        self.request_ok(
            &format!("/reports/id/{}", id),
            RequestOptions::method(Method::DELETE),
            Some(token),
        )
        .await
    }

    /// Fetch a report PDF with the token attached.
    ///
    /// The filename comes from `Content-Disposition` when present, else
    /// `fallback`, else `report_file`.
    pub async fn download_report(
        &self,
        token: &str,
        report_file: &str,
        fallback: Option<&str>,
    ) -> ClientResult<Download> {
        let path = format!("/reports/{}", urlencoding::encode(report_file));
        let builder = self.authorized(Method::GET, &path, Some(token))?;
        let response = self.send(builder, &Method::GET, &path).await?;

        let response = match ensure_success(response).await {
            Ok(response) => response,
            Err(ClientError::Api { status, message }) => {
                return Err(ClientError::Api {
                    status,
                    message: format!("Failed to download: {}", message),
                })
            }
            Err(e) => return Err(e),
        };

        let disposition = header_str(response.headers(), CONTENT_DISPOSITION);
        let filename = suggested_filename(disposition.as_deref(), fallback, report_file);
        let content_type = header_str(response.headers(), CONTENT_TYPE);
        let bytes = response.bytes().await?.to_vec();

        tracing::debug!(filename = %filename, size = bytes.len(), "Report downloaded");
        Ok(Download {
            filename,
            content_type,
            bytes,
        })
    }

    // ============================================
    // Inference
    // ============================================

    /// Upload an image as multipart form data and run inference.
    ///
    /// Goes around [`ApiClient::request`]: the body is not JSON, so only the
    /// token header is set and `reqwest` supplies the multipart boundary.
    pub async fn run_inference(
        &self,
        token: &str,
        patient_id: i64,
        image: &ImageUpload,
    ) -> ClientResult<InferenceResult> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(image.mime_type())?;
        let form = Form::new()
            .part("file", part)
            .text("patient_id", patient_id.to_string());

        let builder = self
            .authorized(Method::POST, "/inference", Some(token))?
            .multipart(form);
        let response = ensure_success(self.send(builder, &Method::POST, "/inference").await?).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

fn raw_token_header(token: &str) -> ClientResult<HeaderValue> {
    HeaderValue::from_str(token)
        .map_err(|_| ClientError::InvalidInput("session token is not a valid header value".into()))
}

fn header_str(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Turn a non-success response into [`ClientError::Api`] carrying the body
/// text unchanged.
pub async fn ensure_success(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    tracing::debug!(status = %status, "Backend returned error");
    Err(api_error(status, message))
}

fn api_error(status: StatusCode, message: String) -> ClientError {
    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}
