//! Patient list with create and delete

use super::{AppContext, Prompt};
use crate::client::{NewPatient, Patient};

/// Form field names in display order
pub const FORM_FIELDS: [&str; 5] = ["first_name", "last_name", "dob", "mrn", "notes"];

#[derive(Debug, Clone, Default)]
pub struct PatientsView {
    pub patients: Vec<Patient>,
    pub form: NewPatient,
    /// Last list failure, cleared by a successful load
    pub error: Option<String>,
}

impl PatientsView {
    /// Refresh the list. A failed load keeps the current list and records
    /// the error.
    pub async fn load(&mut self, ctx: &AppContext, token: &str) {
        match ctx.client.list_patients(token).await {
            Ok(patients) => {
                self.patients = patients;
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load patients");
                self.error = Some(e.user_message());
            }
        }
    }

    /// Set one form field by name. Unknown names are ignored.
    pub fn set_field(&mut self, field: &str, value: impl Into<String>) {
        let value = value.into();
        match field {
            "first_name" => self.form.first_name = value,
            "last_name" => self.form.last_name = value,
            "dob" => self.form.dob = value,
            "mrn" => self.form.mrn = value,
            "notes" => self.form.notes = value,
            _ => {}
        }
    }

    /// Submit the form as typed. On success the form is cleared and the list
    /// reloaded; on failure the backend's text is alerted unchanged.
    pub async fn create(&mut self, ctx: &AppContext, token: &str, prompt: &dyn Prompt) -> Option<i64> {
        match ctx.client.create_patient(token, &self.form).await {
            Ok(created) => {
                self.form = NewPatient::default();
                self.load(ctx, token).await;
                Some(created.id)
            }
            Err(e) => {
                prompt.alert(&e.user_message());
                None
            }
        }
    }

    pub async fn delete(&mut self, ctx: &AppContext, token: &str, prompt: &dyn Prompt, id: i64) -> bool {
        match ctx.client.delete_patient(token, id).await {
            Ok(()) => {
                self.load(ctx, token).await;
                true
            }
            Err(e) => {
                prompt.alert(&e.user_message());
                false
            }
        }
    }

    pub fn render(&self) -> String {
        if let Some(err) = &self.error {
            return format!("Failed to load patients: {}\n", err);
        }
        if self.patients.is_empty() {
            return "No patients yet.\n".to_string();
        }

        let mut out = String::new();
        for p in &self.patients {
            out.push_str(&format!(
                "{:>5}  {}\n       MRN {} — DOB {}\n",
                p.id,
                p.full_name(),
                p.mrn,
                p.dob
            ));
        }
        out
    }
}
