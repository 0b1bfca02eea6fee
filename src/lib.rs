//! # NeuroScan
//!
//! Client for the NeuroScan MRI workflow backend: doctor login, patient
//! management, MRI upload with AI inference, and PDF report retrieval.
//!
//! ## Modules
//!
//! - [`session`]: Session token persistence and logout
//! - [`client`]: REST client (raw-token auth, JSON bodies, report downloads)
//! - [`guard`]: Authorization check in front of protected views
//! - [`routes`]: Route table and navigation menus
//! - [`pagination`]: Page arithmetic for the reports list
//! - [`views`]: Page view models (login, dashboard, patients, upload, reports)
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use neuroscan::views::{AppContext, LoginView, ReportsView, ScriptedPrompt};
//! use neuroscan::guard::{Access, RouteGuard};
//! use neuroscan::Config;
//!
//! #[tokio::main]
//! async fn main() {
//!     let ctx = AppContext::from_config(&Config::from_env());
//!     let prompt = ScriptedPrompt::answering(true);
//!
//!     LoginView::new("doctor@example.org", "s3cret-pass")
//!         .submit(&ctx, &prompt)
//!         .await;
//!
//!     if let Access::Granted(token) = RouteGuard::check(&ctx.session) {
//!         let mut reports = ReportsView::new();
//!         reports.load(&ctx, &token).await;
//!         print!("{}", reports.render());
//!     }
//! }
//! ```

pub mod client;
pub mod config;
pub mod guard;
pub mod pagination;
pub mod routes;
pub mod session;
pub mod views;

pub use client::{
    ApiClient, ClientError, ClientResult, Download, ImageUpload, InferenceResult, Patient,
    ReportItem, ReportPage, ReportQuery, RequestOptions, Stats,
};

pub use config::{Config, ConfigError, LoggingConfig};

pub use guard::{Access, GuardState, RouteGuard};

pub use routes::Route;

pub use session::{FileSessionStore, MemorySessionStore, Session, SessionError, SessionStore};

pub use views::{AppContext, Prompt};
