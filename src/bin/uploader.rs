use anyhow::Context;
use clap::Parser;
use dropzone_upload::drag::DropZone;
use dropzone_upload::host::{HostContext, UploadConfig};
use dropzone_upload::logging::{init_logging, LogFormat};
use dropzone_upload::session::{SessionObserver, SessionReport};
use dropzone_upload::transport::{AntiForgeryToken, HttpUploadTransport, Identifier, UploadFile};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use url::Url;

/// Upload files into one destination folder as a single batch.
#[derive(Parser, Debug)]
#[command(name = "dropzone-upload", version, about)]
struct Args {
    /// Files to upload
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Admin page URL; the destination and endpoint are derived from it
    #[arg(long, conflicts_with = "endpoint")]
    page_url: Option<Url>,

    /// Upload endpoint URL
    #[arg(long, requires = "destination")]
    endpoint: Option<Url>,

    /// Destination folder, overrides the one in --page-url
    #[arg(long)]
    destination: Option<String>,

    /// Anti-forgery token sent with every file
    #[arg(long, default_value = "")]
    token: String,

    /// TOML file with field names and transport tuning
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "warn")]
    log_level: String,

    /// compact or json
    #[arg(long, default_value = "compact")]
    log_format: LogFormat,
}

/// Writes the live progress text over a single terminal line.
struct StatusLine;

impl SessionObserver for StatusLine {
    fn on_progress(&self, _session_id: &str, text: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "\r\x1b[2K{text}");
        let _ = stdout.flush();
    }

    fn on_all_done(&self, _report: &SessionReport) {
        println!();
    }
}

fn host_context(args: &Args, config: &UploadConfig) -> anyhow::Result<HostContext> {
    let token = AntiForgeryToken::new(args.token.clone());

    let mut context = match (&args.page_url, &args.endpoint) {
        (Some(page_url), _) => HostContext::from_page_url(page_url, token, config)?,
        (None, Some(endpoint)) => HostContext::new(None, token, endpoint.clone()),
        (None, None) => anyhow::bail!("either --page-url or --endpoint is required"),
    };

    if let Some(destination) = &args.destination {
        context.destination = Some(
            Identifier::parse(destination)
                .with_context(|| format!("invalid destination {destination:?}"))?,
        );
    }

    Ok(context)
}

async fn read_files(paths: &[PathBuf]) -> anyhow::Result<Vec<UploadFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = UploadFile::from_path(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        files.push(file);
    }
    Ok(files)
}

fn print_report(report: &SessionReport) {
    println!(
        "Uploaded {} of {} file(s) in {}s",
        report.succeeded.len(),
        report.total,
        report.finished_at - report.started_at
    );
    for failed in &report.failed {
        println!("  ✗ {}: {}", failed.file_name, failed.error);
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let config = match &args.config {
        Some(path) => UploadConfig::load(path)?,
        None => UploadConfig::default(),
    };
    let context = host_context(&args, &config)?;
    if !context.has_destination() {
        anyhow::bail!("no destination folder: pass --destination or a page URL with one");
    }

    let files = read_files(&args.files).await?;
    let transport = Arc::new(HttpUploadTransport::new(config)?);
    let zone = DropZone::new(context, transport).with_observer(Arc::new(StatusLine));

    let Some(handle) = zone.on_files_picked(files).session() else {
        anyhow::bail!("drop zone is inert");
    };
    let report = handle.wait().await?;
    print_report(&report);

    Ok(if report.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_logging(&args.log_level, args.log_format) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
