use super::AppContext;
use crate::client::Stats;

/// Headline counters from `GET /stats`
#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    pub stats: Option<Stats>,
    pub error: Option<String>,
}

impl DashboardView {
    pub async fn load(&mut self, ctx: &AppContext, token: &str) {
        match ctx.client.stats(token).await {
            Ok(stats) => {
                self.stats = Some(stats);
                self.error = None;
            }
            Err(e) => self.error = Some(e.user_message()),
        }
    }

    pub fn render(&self) -> String {
        let value = |pick: fn(&Stats) -> u64| {
            self.stats
                .as_ref()
                .map(|s| pick(s).to_string())
                .unwrap_or_else(|| "…".to_string())
        };

        let mut out = format!(
            "{:<16} {}\n{:<16} {}\n{:<16} {}\n",
            "Today's Scans",
            value(|s| s.today_scans),
            "Patients",
            value(|s| s.patients),
            "Total Reports",
            value(|s| s.reports),
        );
        if let Some(err) = &self.error {
            out.push_str(&format!("\nFailed to load stats: {}\n", err));
        }
        out
    }
}
