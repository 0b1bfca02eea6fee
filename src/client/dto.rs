//! Request/Response DTOs for the backend REST API

use serde::{Deserialize, Serialize};

// ============================================
// Auth
// ============================================

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub email: String,
    pub full_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub doctor: Option<Doctor>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Doctor {
    pub id: i64,
    pub full_name: String,
    pub email: String,
}

// ============================================
// Patients
// ============================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Patient {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub mrn: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Form body for `POST /patients`. Fields are sent as typed, unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub mrn: String,
    pub notes: String,
}

/// Partial body for `PATCH /patients/:id`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatientUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mrn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PatientUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPatient {
    pub id: i64,
}

// ============================================
// Reports
// ============================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReportItem {
    pub id: i64,
    pub patient_id: i64,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub mrn: Option<String>,
    #[serde(default)]
    pub doctor_id: Option<i64>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    pub image_filename: String,
    pub result_label: String,
    #[serde(default)]
    pub probability: Option<f64>,
    pub report_file: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ReportItem {
    /// Download name used when the server sends no Content-Disposition
    pub fn fallback_filename(&self) -> String {
        format!("report_{}.pdf", self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ReportPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub items: Vec<ReportItem>,
}

/// Query for `GET /reports`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportQuery {
    pub limit: u32,
    pub offset: u64,
    pub patient_id: Option<i64>,
}

impl ReportQuery {
    pub fn to_query_string(&self) -> String {
        let mut qs = format!("limit={}&offset={}", self.limit, self.offset);
        if let Some(id) = self.patient_id {
            qs.push_str(&format!("&patient_id={}", id));
        }
        qs
    }
}

// ============================================
// Inference
// ============================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InferenceResult {
    pub label: String,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub report_id: Option<i64>,
    #[serde(default)]
    pub report_file: Option<String>,
    #[serde(default)]
    pub overlay_file: Option<String>,
}

impl InferenceResult {
    /// Model score, from `probability` or else `confidence`
    pub fn score(&self) -> Option<f64> {
        self.probability.or(self.confidence)
    }

    /// Score as a percentage with one decimal, e.g. `93.4%`
    pub fn score_percent(&self) -> String {
        match self.score() {
            Some(p) => format!("{:.1}%", p * 100.0),
            None => "NaN%".to_string(),
        }
    }

    pub fn fallback_filename(&self) -> String {
        match self.report_id {
            Some(id) => format!("report_{}.pdf", id),
            None => "report_latest.pdf".to_string(),
        }
    }
}

// ============================================
// Dashboard
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Stats {
    pub patients: u64,
    pub reports: u64,
    pub today_scans: u64,
}
