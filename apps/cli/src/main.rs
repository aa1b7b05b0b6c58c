use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use editor_block::{Screen, Shell};
use export_block::ExportFormat;
use fieldnote_shared::{AppConfig, AppState, Notifier, ToastLevel};
use tracing_subscriber::EnvFilter;

mod commands;

pub(crate) type Error = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(author, version, about = "Field visit reports: points, photos, PDF and DOCX export")]
struct Cli {
    #[arg(long, env = "FIELDNOTE_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "FIELDNOTE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// All reports, newest first
    List,
    /// Create a report and print its id
    New {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        area: Option<String>,
    },
    /// Interactive editing with autosave
    Edit { report_id: String },
    Title { report_id: String, title: String },
    Area { report_id: String, area: String },
    /// Append a point and print its id
    AddPoint { report_id: String, text: Option<String> },
    EditPoint { report_id: String, point_id: String, text: String },
    RemovePoint { report_id: String, point_id: String },
    /// Compress and attach image files to a point
    Attach {
        report_id: String,
        point_id: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    RemoveImage { report_id: String, point_id: String, path: String },
    Delete { report_id: String },
    Export {
        report_id: String,
        #[arg(long, value_enum, default_value_t = FormatArg::Pdf)]
        format: FormatArg,
        /// PDF image width as a percentage of the printable width
        #[arg(long, default_value_t = 50)]
        image_width: u8,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub(crate) enum FormatArg {
    Pdf,
    Docx,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Pdf => ExportFormat::Pdf,
            FormatArg::Docx => ExportFormat::Docx,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let (notifier, mut toasts) = Notifier::channel();
    let services = match AppConfig::load() {
        Ok(config) => Ok(AppState::new(config).await.services(notifier)),
        Err(e) => Err(e),
    };

    let mut shell = Shell::start(services);
    if let Screen::NotConfigured { missing } = shell.screen() {
        eprintln!("fieldnote is not configured. Set these variables:");
        for key in missing {
            eprintln!("  {}", key);
        }
        return ExitCode::from(2);
    }

    let result = sign_in(&mut shell, cli.email, cli.password).await;
    let result = match result {
        Ok(()) => {
            let result = commands::run(&mut shell, cli.command).await;
            shell.sign_out().await;
            result
        }
        Err(e) => Err(e),
    };

    while let Ok(toast) = toasts.try_recv() {
        match toast.level {
            ToastLevel::Info => eprintln!("✔ {}", toast.message),
            ToastLevel::Error => eprintln!("✖ {}", toast.message),
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn sign_in(shell: &mut Shell, email: Option<String>, password: Option<String>) -> Result<(), Error> {
    let (Some(email), Some(password)) = (email, password) else {
        return Err("credentials missing: pass --email/--password or set FIELDNOTE_EMAIL/FIELDNOTE_PASSWORD".into());
    };
    shell.sign_in(&email, &password).await?;
    if let Some(principal) = shell.principal() {
        eprintln!("Signed in as {}", principal.display_name());
    }
    Ok(())
}
