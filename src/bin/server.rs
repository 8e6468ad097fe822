use clap::Parser;
use dropzone_upload::api::{create_api_server, RestApi, UploadStore};
use dropzone_upload::host::UploadConfig;
use dropzone_upload::logging::{init_logging, LogFormat};
use dropzone_upload::metrics::{start_metrics_server, MetricsConfig};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Receiving side of the upload endpoint.
#[derive(Parser, Debug)]
#[command(name = "dropzone-server", version, about)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Anti-forgery token every upload must carry; omit to accept any
    #[arg(long)]
    token: Option<String>,

    /// Directory to write received files into; omit to keep only the index
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// TOML file with multipart field names
    #[arg(long)]
    config: Option<PathBuf>,

    /// Largest accepted request body in bytes
    #[arg(long, default_value_t = RestApi::DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// Dedicated Prometheus listener in addition to /metrics
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,

    #[arg(long, default_value = "info")]
    log_level: String,

    /// compact or json
    #[arg(long, default_value = "compact")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.log_format)?;

    let config = match &args.config {
        Some(path) => UploadConfig::load(path)?,
        None => UploadConfig::default(),
    };

    let metrics_config = args
        .metrics_addr
        .map(MetricsConfig::with_addr)
        .unwrap_or_default();
    start_metrics_server(metrics_config)?;

    if args.token.is_none() {
        tracing::warn!("No anti-forgery token configured, accepting every upload");
    }
    if let Some(dir) = &args.storage_dir {
        tokio::fs::create_dir_all(dir).await?;
    }

    let store = UploadStore::new(args.storage_dir.clone());
    let api = RestApi::new(store, args.token, config).with_max_upload_bytes(args.max_upload_bytes);
    let app = create_api_server(api);

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    let addr = listener.local_addr()?;

    println!("\n📡 dropzone-server listening on http://{addr}");
    println!("   POST   /upload/                       - Receive one file");
    println!("   GET    /api/v1/folders/:folder/files  - List a folder");
    println!("   GET    /health                        - Health check");
    println!("   GET    /metrics                       - Prometheus metrics\n");

    tracing::info!("Serving uploads on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
