//! Page Views
//!
//! View models for each page of the application. A view owns its local state
//! (lists, forms, inline errors) and talks to the backend through the
//! [`AppContext`]. Blocking alerts and confirmations go through [`Prompt`],
//! so the same views drive the terminal front-end and the tests.
//!
//! Views that need a session take the token produced by
//! [`RouteGuard`](crate::guard::RouteGuard); none of them read storage
//! themselves.

mod auth;
mod dashboard;
mod patients;
mod reports;
mod upload;

pub use auth::{LoginView, RegisterView};
pub use dashboard::DashboardView;
pub use patients::PatientsView;
pub use reports::{LoadTicket, ReportsView};
pub use upload::UploadView;

use crate::client::ApiClient;
use crate::config::Config;
use crate::session::{FileSessionStore, Session};
use std::sync::{Arc, Mutex};

/// Shown under every inference result
pub const DISCLAIMER: &str = "This application provides AI-assisted decision support and is not a \
substitute for professional clinical judgment. Always consult qualified clinicians before making \
medical decisions.";

/// Everything a view needs to reach the backend
#[derive(Debug, Clone)]
pub struct AppContext {
    pub client: ApiClient,
    pub session: Session,
}

impl AppContext {
    pub fn new(client: ApiClient, session: Session) -> Self {
        Self { client, session }
    }

    pub fn from_config(config: &Config) -> Self {
        let store = FileSessionStore::from_config(&config.session);
        Self {
            client: ApiClient::new(config.api.base_url.clone()),
            session: Session::new(Arc::new(store)),
        }
    }
}

/// Blocking user interaction
pub trait Prompt: Send + Sync {
    fn alert(&self, message: &str);
    fn confirm(&self, message: &str) -> bool;
}

/// Prompt with a fixed answer that records what it was shown
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answer: bool,
    alerts: Mutex<Vec<String>>,
    confirms: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            ..Self::default()
        }
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn confirms(&self) -> Vec<String> {
        self.confirms.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Prompt for ScriptedPrompt {
    fn alert(&self, message: &str) {
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.push(message.to_string());
        }
    }

    fn confirm(&self, message: &str) -> bool {
        if let Ok(mut confirms) = self.confirms.lock() {
            confirms.push(message.to_string());
        }
        self.answer
    }
}
