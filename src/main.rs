//! NeuroScan CLI
//!
//! Command-line front-end for the NeuroScan backend:
//! - Log in / register / log out
//! - Dashboard counters
//! - Patient management
//! - MRI upload and inference
//! - Report listing, download and deletion

use anyhow::Context;
use clap::{Parser, Subcommand};
use neuroscan::client::PatientUpdate;
use neuroscan::config::{generate_default_config, Config};
use neuroscan::guard::{GuardState, RouteGuard};
use neuroscan::pagination::{Pager, PAGE_SIZES};
use neuroscan::routes::{nav_items, Route};
use neuroscan::views::{
    AppContext, DashboardView, LoginView, PatientsView, Prompt, RegisterView, ReportsView,
    UploadView, DISCLAIMER,
};
use neuroscan::ImageUpload;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "neuroscan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "AI-assisted MRI workflow: patients, inference and reports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend URL (overrides config and NEUROSCAN_API_BASE)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Config file (default: ~/.config/neuroscan/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Create a doctor account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Clear the stored session token
    Logout,

    /// Show session state, navigation and backend reachability
    Status,

    /// Show today's scans, patient and report counts
    Dashboard,

    /// Manage patients
    Patients {
        #[command(subcommand)]
        action: Option<PatientsCommand>,
    },

    /// Upload an MRI image and run detection
    Upload {
        /// Patient ID
        #[arg(short, long)]
        patient: i64,
        /// Image file
        #[arg(short, long)]
        file: PathBuf,
        /// Save the generated report into this directory
        #[arg(short, long)]
        download: Option<PathBuf>,
    },

    /// Browse, download and delete reports
    Reports {
        #[command(subcommand)]
        action: Option<ReportsCommand>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum PatientsCommand {
    /// List patients
    List,
    /// Add a patient
    Add {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Date of birth as the backend expects it
        #[arg(long)]
        dob: String,
        #[arg(long)]
        mrn: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Update selected fields of a patient
    Update {
        id: i64,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        dob: Option<String>,
        #[arg(long)]
        mrn: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a patient
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum ReportsCommand {
    /// List one page of reports
    List {
        /// Only reports for this patient
        #[arg(short, long)]
        patient: Option<i64>,
        /// Page size (10, 20, 50, 100)
        #[arg(short, long, default_value = "10")]
        limit: u32,
        #[arg(long, default_value = "1")]
        page: u32,
    },
    /// Download a report PDF
    Download {
        /// Report file name as listed
        report_file: String,
        /// Report ID, used to name the file if the server suggests none
        #[arg(long)]
        id: Option<i64>,
        /// Target directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Delete a report
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Alerts on stderr, confirmations read from stdin
struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn alert(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn confirm(&self, message: &str) -> bool {
        eprint!("{} [y/N] ", message);
        let _ = std::io::stderr().flush();
        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Answers every confirmation with yes
struct AssumeYes<'a>(&'a dyn Prompt);

impl Prompt for AssumeYes<'_> {
    fn alert(&self, message: &str) {
        self.0.alert(message);
    }

    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("neuroscan={}", config.logging.level)));
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    Ok(config)
}

fn read_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn navigate(route: Route) {
    eprintln!("→ {}", route);
}

/// Exit after a failure the view has already reported
fn fail() -> ! {
    std::process::exit(1)
}

/// Run a protected command, or report the redirect to login
async fn guarded<T, F, Fut>(ctx: &AppContext, render: F) -> T
where
    F: FnOnce(String) -> Fut,
    Fut: std::future::Future<Output = T>,
{
    let outcome = RouteGuard::protect(
        &ctx.session,
        |state| {
            if let Some(message) = state.message() {
                tracing::debug!("{}", message);
            }
            if let GuardState::Redirected(route) = state {
                eprintln!("Not logged in. Run `neuroscan login` first.");
                navigate(*route);
            }
        },
        render,
    )
    .await;

    match outcome {
        Ok(value) => value,
        Err(_) => fail(),
    }
}

fn save_download(download: &neuroscan::Download, dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)?;
    let path = download
        .save_in(dir)
        .with_context(|| format!("failed to save report into {:?}", dir))?;
    println!("Saved {} ({} bytes)", path.display(), download.bytes.len());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&config);

    let ctx = &AppContext::from_config(&config);
    tracing::debug!(base_url = %ctx.client.base_url(), "NeuroScan CLI v{}", env!("CARGO_PKG_VERSION"));

    let prompt: &dyn Prompt = &TerminalPrompt;

    match cli.command {
        Commands::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => read_password()?,
            };
            match LoginView::new(email, password).submit(ctx, prompt).await {
                Some(route) => navigate(route),
                None => fail(),
            }
        }

        Commands::Register {
            email,
            full_name,
            password,
        } => {
            let password = match password {
                Some(p) => p,
                None => read_password()?,
            };
            match RegisterView::new(email, full_name, password)
                .submit(ctx, prompt)
                .await
            {
                Some(route) => navigate(route),
                None => fail(),
            }
        }

        Commands::Logout => {
            let route = ctx.session.logout();
            println!("Logged out");
            navigate(route);
        }

        Commands::Status => {
            let authed = ctx.session.is_authed();
            println!("NeuroScan v{}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("API:     {}", ctx.client.base_url());
            println!("Session: {}", if authed { "logged in" } else { "not logged in" });
            println!();
            println!("Navigation:");
            for route in nav_items(authed) {
                println!("  {:<12} {}", route.label(), route.path());
            }
            println!();
            match ctx.client.health().await {
                Ok(()) => println!("Backend: ok"),
                Err(e) => println!("Backend: {}", e),
            }
        }

        Commands::Dashboard => {
            let view = guarded(ctx, |token| async move {
                let mut view = DashboardView::default();
                view.load(ctx, &token).await;
                view
            })
            .await;
            print!("{}", view.render());
            if view.error.is_some() {
                fail();
            }
        }

        Commands::Patients { action } => {
            let action = action.unwrap_or(PatientsCommand::List);
            guarded(ctx, |token| run_patients(ctx, prompt, token, action)).await?;
        }

        Commands::Upload {
            patient,
            file,
            download,
        } => {
            let image = ImageUpload::from_path(&file)
                .with_context(|| format!("cannot read image {:?}", file))?;

            guarded(ctx, |token| async move {
                let mut view = UploadView::default();
                view.select_patient(patient);
                view.select_image(image);

                if !view.submit(ctx, &token, prompt).await {
                    fail();
                }
                print!("{}", view.render());
                println!();
                println!("Disclaimer: {}", DISCLAIMER);

                if let Some(dir) = download {
                    match view.download_report(ctx, &token, prompt).await {
                        Some(report) => save_download(&report, &dir)?,
                        None if view.result.as_ref().and_then(|r| r.report_file.as_ref()).is_none() => {
                            eprintln!("No report was generated for this scan");
                        }
                        None => fail(),
                    }
                }
                anyhow::Ok(())
            })
            .await?;
        }

        Commands::Reports { action } => {
            let action = action.unwrap_or(ReportsCommand::List {
                patient: None,
                limit: PAGE_SIZES[0],
                page: 1,
            });
            guarded(ctx, |token| run_reports(ctx, prompt, token, action)).await?;
        }

        Commands::Config { output } => {
            let config = generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

async fn run_patients(
    ctx: &AppContext,
    prompt: &dyn Prompt,
    token: String,
    action: PatientsCommand,
) -> anyhow::Result<()> {
    let mut view = PatientsView::default();

    match action {
        PatientsCommand::List => {
            view.load(ctx, &token).await;
        }
        PatientsCommand::Add {
            first_name,
            last_name,
            dob,
            mrn,
            notes,
        } => {
            view.set_field("first_name", first_name);
            view.set_field("last_name", last_name);
            view.set_field("dob", dob);
            view.set_field("mrn", mrn);
            view.set_field("notes", notes);
            match view.create(ctx, &token, prompt).await {
                Some(id) => println!("Created patient {}", id),
                None => fail(),
            }
        }
        PatientsCommand::Update {
            id,
            first_name,
            last_name,
            dob,
            mrn,
            notes,
        } => {
            let update = PatientUpdate {
                first_name,
                last_name,
                dob,
                mrn,
                notes,
            };
            if update.is_empty() {
                anyhow::bail!("nothing to update");
            }
            if let Err(e) = ctx.client.update_patient(&token, id, &update).await {
                prompt.alert(&e.user_message());
                fail();
            }
            println!("Updated patient {}", id);
            view.load(ctx, &token).await;
        }
        PatientsCommand::Delete { id } => {
            if !view.delete(ctx, &token, prompt, id).await {
                fail();
            }
            println!("Deleted patient {}", id);
        }
    }

    print!("{}", view.render());
    if view.error.is_some() {
        fail();
    }
    Ok(())
}

async fn run_reports(
    ctx: &AppContext,
    prompt: &dyn Prompt,
    token: String,
    action: ReportsCommand,
) -> anyhow::Result<()> {
    match action {
        ReportsCommand::List {
            patient,
            limit,
            page,
        } => {
            let pager = Pager::new(page, limit).with_context(|| {
                format!("page size must be one of {:?}", PAGE_SIZES)
            })?;
            let mut view = ReportsView::new()
                .with_pager(pager)
                .with_patient_filter(patient);
            view.load_patients(ctx, &token).await;
            view.load(ctx, &token).await;
            print!("{}", view.render());
            if view.error().is_some() {
                fail();
            }
        }
        ReportsCommand::Download {
            report_file,
            id,
            output,
        } => {
            let fallback = id.map(|id| format!("report_{}.pdf", id));
            let view = ReportsView::new();
            match view
                .download_file(ctx, &token, prompt, &report_file, fallback.as_deref())
                .await
            {
                Some(download) => save_download(&download, &output)?,
                None => fail(),
            }
        }
        ReportsCommand::Delete { id, yes } => {
            let mut view = ReportsView::new();
            let deleted = if yes {
                view.delete(ctx, &token, &AssumeYes(prompt), id).await
            } else {
                view.delete(ctx, &token, prompt, id).await
            };
            if !deleted {
                fail();
            }
            println!("Deleted report {}", id);
            print!("{}", view.render());
        }
    }
    Ok(())
}
