//! Reports listing
//!
//! Paginated, optionally filtered by patient. Every change of filter, page or
//! page size issues exactly one list request, and changing the filter or the
//! page size goes back to page 1.
//!
//! Loads are sequenced: [`ReportsView::begin_load`] hands out a ticket and
//! [`ReportsView::finish_load`] applies a response only if its ticket is the
//! most recently issued one. A slow response to a superseded request is
//! dropped, whatever order the responses arrive in.

use super::{AppContext, Prompt};
use crate::client::{
    ClientError, ClientResult, Download, Patient, ReportItem, ReportPage, ReportQuery,
};
use crate::pagination::{total_pages, Pager, PAGE_SIZES};

/// Identifies one issued list request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
    pub query: ReportQuery,
}

#[derive(Debug, Clone, Default)]
pub struct ReportsView {
    pub patients: Vec<Patient>,
    patient_id: Option<i64>,
    pager: Pager,
    items: Vec<ReportItem>,
    total: u64,
    loading: bool,
    error: Option<String>,
    issued: u64,
}

impl ReportsView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at a given page and size, before the first load
    pub fn with_pager(mut self, pager: Pager) -> Self {
        self.pager = pager;
        self
    }

    pub fn with_patient_filter(mut self, patient_id: Option<i64>) -> Self {
        self.patient_id = patient_id;
        self
    }

    pub fn items(&self) -> &[ReportItem] {
        &self.items
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn page(&self) -> u32 {
        self.pager.page()
    }

    pub fn limit(&self) -> u32 {
        self.pager.limit()
    }

    pub fn patient_filter(&self) -> Option<i64> {
        self.patient_id
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.total, self.pager.limit())
    }

    pub fn can_prev(&self) -> bool {
        self.pager.can_prev(self.loading)
    }

    pub fn can_next(&self) -> bool {
        self.pager.can_next(self.total, self.loading)
    }

    pub fn query(&self) -> ReportQuery {
        ReportQuery {
            limit: self.pager.limit(),
            offset: self.pager.offset(),
            patient_id: self.patient_id,
        }
    }

    /// Load the patient filter options. Failures leave it empty.
    pub async fn load_patients(&mut self, ctx: &AppContext, token: &str) {
        match ctx.client.list_patients(token).await {
            Ok(patients) => self.patients = patients,
            Err(e) => tracing::warn!(error = %e, "Failed to load patients"),
        }
    }

    /// Mark a request as issued for the current query
    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued += 1;
        self.loading = true;
        self.error = None;
        LoadTicket {
            seq: self.issued,
            query: self.query(),
        }
    }

    /// Apply a list response. Returns `false` if the ticket was superseded.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: ClientResult<ReportPage>) -> bool {
        if ticket.seq != self.issued {
            tracing::debug!(seq = ticket.seq, latest = self.issued, "Dropping stale reports response");
            return false;
        }

        self.loading = false;
        match result {
            Ok(page) => {
                self.items = page.items;
                self.total = page.total;
            }
            Err(e) => {
                self.error = Some(e.user_message());
                self.items.clear();
                self.total = 0;
            }
        }
        true
    }

    /// Fetch the current page
    pub async fn load(&mut self, ctx: &AppContext, token: &str) {
        let ticket = self.begin_load();
        let result = ctx.client.list_reports(token, &ticket.query).await;
        self.finish_load(ticket, result);
    }

    /// Change the patient filter and reload from page 1. Nothing is requested
    /// when neither the filter nor the page changes.
    pub async fn set_patient_filter(&mut self, ctx: &AppContext, token: &str, patient_id: Option<i64>) -> bool {
        if patient_id == self.patient_id && self.pager.page() == 1 {
            return false;
        }
        self.patient_id = patient_id;
        self.pager.reset();
        self.load(ctx, token).await;
        true
    }

    /// Change the page size and reload from page 1
    pub async fn set_page_size(&mut self, ctx: &AppContext, token: &str, limit: u32) -> ClientResult<bool> {
        if limit == self.pager.limit() && self.pager.page() == 1 {
            return Ok(false);
        }
        if !self.pager.set_limit(limit) {
            return Err(ClientError::InvalidInput(format!(
                "page size must be one of {:?}",
                PAGE_SIZES
            )));
        }
        self.load(ctx, token).await;
        Ok(true)
    }

    pub async fn next_page(&mut self, ctx: &AppContext, token: &str) -> bool {
        if !self.can_next() {
            return false;
        }
        self.pager.next(self.total);
        self.load(ctx, token).await;
        true
    }

    pub async fn prev_page(&mut self, ctx: &AppContext, token: &str) -> bool {
        if !self.can_prev() {
            return false;
        }
        self.pager.prev();
        self.load(ctx, token).await;
        true
    }

    pub async fn download(
        &self,
        ctx: &AppContext,
        token: &str,
        prompt: &dyn Prompt,
        report: &ReportItem,
    ) -> Option<Download> {
        let fallback = report.fallback_filename();
        self.download_file(ctx, token, prompt, &report.report_file, Some(&fallback))
            .await
    }

    /// Fetch a report by file name, alerting on failure
    pub async fn download_file(
        &self,
        ctx: &AppContext,
        token: &str,
        prompt: &dyn Prompt,
        report_file: &str,
        fallback: Option<&str>,
    ) -> Option<Download> {
        match ctx.client.download_report(token, report_file, fallback).await {
            Ok(download) => Some(download),
            Err(e) => {
                prompt.alert(&e.user_message());
                None
            }
        }
    }

    /// Delete after confirmation, then reload the current page
    pub async fn delete(&mut self, ctx: &AppContext, token: &str, prompt: &dyn Prompt, id: i64) -> bool {
        if !prompt.confirm("Delete this report permanently?") {
            return false;
        }

        if let Err(e) = ctx.client.delete_report(token, id).await {
            prompt.alert(&format!("Failed to delete: {}", e.user_message()));
            return false;
        }

        tracing::info!(report_id = id, "Report deleted");
        self.load(ctx, token).await;
        true
    }

    /// `all` followed by each patient as `id=name`; the active choice is starred
    fn filter_choices(&self) -> String {
        let star = |selected: bool| if selected { "*" } else { "" };
        let mut choices = vec![format!("{}all", star(self.patient_id.is_none()))];
        choices.extend(self.patients.iter().map(|p| {
            format!("{}{}={}", star(self.patient_id == Some(p.id)), p.id, p.full_name())
        }));
        choices.join(", ")
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        if let Some(err) = &self.error {
            out.push_str(&format!("Failed to load reports: {}\n\n", err));
        }

        if !self.patients.is_empty() {
            out.push_str(&format!("Patient filter: {}\n\n", self.filter_choices()));
        }

        out.push_str(&format!(
            "{:<6} {:<20} {:<20} {:<12} {:<10} {:<10} {:<24} {}\n",
            "ID", "Created", "Patient", "MRN", "Result", "Confidence", "Image", "Report"
        ));
        out.push_str(&format!("{}\n", "-".repeat(130)));

        for r in &self.items {
            out.push_str(&format!(
                "{:<6} {:<20} {:<20} {:<12} {:<10} {:<10.3} {:<24} {}\n",
                r.id,
                format_created(r.created_at.as_deref()),
                r.patient_name.as_deref().unwrap_or("—"),
                r.mrn.as_deref().unwrap_or("—"),
                capitalize(&r.result_label),
                r.probability.unwrap_or(0.0),
                r.image_filename,
                r.report_file,
            ));
        }

        if self.items.is_empty() && !self.loading {
            out.push_str("No reports yet.\n");
        }

        out.push_str(&format!(
            "\nShowing {} of {} result(s). Page {}/{}.\n",
            self.items.len(),
            self.total,
            self.pager.page(),
            self.total_pages()
        ));
        out
    }
}

/// Creation time in local time, `—` when absent, raw text when unparseable
fn format_created(created_at: Option<&str>) -> String {
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

    let Some(raw) = created_at else {
        return "—".to_string();
    };

    let local = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Local))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        });

    match local {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => raw.to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
