//! MRI upload and inference

use super::{AppContext, Prompt};
use crate::client::{Download, ImageUpload, InferenceResult, Patient};

#[derive(Debug, Clone, Default)]
pub struct UploadView {
    pub patients: Vec<Patient>,
    pub patient_id: Option<i64>,
    pub image: Option<ImageUpload>,
    pub result: Option<InferenceResult>,
}

impl UploadView {
    /// Load the patient picker. Failures leave it empty.
    pub async fn load_patients(&mut self, ctx: &AppContext, token: &str) {
        match ctx.client.list_patients(token).await {
            Ok(patients) => self.patients = patients,
            Err(e) => tracing::warn!(error = %e, "Failed to load patients"),
        }
    }

    pub fn select_patient(&mut self, id: i64) {
        self.patient_id = Some(id);
    }

    pub fn select_image(&mut self, image: ImageUpload) {
        self.image = Some(image);
    }

    /// Run inference on the selected image. Returns `true` once a result is
    /// held; every failure is alerted instead.
    pub async fn submit(&mut self, ctx: &AppContext, token: &str, prompt: &dyn Prompt) -> bool {
        let (Some(patient_id), Some(image)) = (self.patient_id, self.image.as_ref()) else {
            prompt.alert("Select a file and patient");
            return false;
        };

        tracing::info!(patient_id, file = %image.file_name, "Submitting image for inference");
        match ctx.client.run_inference(token, patient_id, image).await {
            Ok(result) => {
                self.result = Some(result);
                true
            }
            Err(e) => {
                prompt.alert(&e.user_message());
                false
            }
        }
    }

    /// Fetch the report produced by the last inference, if it made one
    pub async fn download_report(
        &self,
        ctx: &AppContext,
        token: &str,
        prompt: &dyn Prompt,
    ) -> Option<Download> {
        let result = self.result.as_ref()?;
        let report_file = result.report_file.as_deref()?;
        let fallback = result.fallback_filename();

        match ctx
            .client
            .download_report(token, report_file, Some(&fallback))
            .await
        {
            Ok(download) => Some(download),
            Err(e) => {
                prompt.alert(&e.user_message());
                None
            }
        }
    }

    pub fn render(&self) -> String {
        match &self.result {
            Some(result) => {
                let mut out = format!("Result: {} (prob {})\n", result.label, result.score_percent());
                if let Some(file) = &result.report_file {
                    out.push_str(&format!("Report: {}\n", file));
                }
                out
            }
            None => String::new(),
        }
    }
}
