use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use debate_client::{
    decode_saved_result, ClientConfig, ClientSession, DebateTransport, HttpTransport,
    SessionError, TerminalSurface,
};
use debate_presenter::{render_document, StreamingPresenter};
use tracing::info;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(long, env = "DEBATE_CLIENT_CONFIG")]
    config: Option<PathBuf>,

    /// Backend base URL (overrides DEBATE_API_BASE)
    #[arg(long)]
    api_base: Option<String>,

    /// Debug-level logging unless RUST_LOG is set
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the backend is up
    Health,

    /// Upload company documents for the agents to consult
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Run a debate on a decision and stream it to the terminal
    Debate {
        decision: String,

        /// Upload these documents before starting
        #[arg(long = "upload")]
        uploads: Vec<PathBuf>,

        /// Per-message delay in milliseconds (capped by the config)
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Also write the presented debate as an HTML page
        #[arg(long)]
        html: Option<PathBuf>,
    },

    /// Present a saved /simulate response without contacting the backend
    Replay {
        path: PathBuf,

        #[arg(long)]
        delay_ms: Option<u64>,

        #[arg(long)]
        html: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = ClientConfig::load(args.config.as_deref()).context("Failed to load config")?;
    if let Some(api_base) = args.api_base {
        config.api_base = api_base;
    }
    info!(api_base = %config.api_base, "debate client starting");

    let transport = HttpTransport::from_config(&config).context("Failed to build HTTP client")?;

    match args.command {
        Command::Health => {
            if transport.health().await {
                println!("Backend at {} is healthy.", config.api_base);
            } else {
                bail!("Backend at {} is not responding", config.api_base);
            }
        }
        Command::Upload { files } => {
            let mut session = new_session(transport, &config, None);
            upload(&mut session, &files).await?;
        }
        Command::Debate {
            decision,
            uploads,
            delay_ms,
            html,
        } => {
            let mut session = new_session(transport, &config, delay_ms);
            if !uploads.is_empty() {
                upload(&mut session, &uploads).await?;
            }
            let report = match session.start_debate(&decision).await {
                Ok(report) => report,
                Err(SessionError::EmptyDecision) => bail!("Enter a decision first!"),
                Err(e) => return Err(e).context("Debate failed"),
            };
            info!(entries = report.entries, outcome = ?report.outcome, "debate finished");
            if let Some(path) = html {
                export_html(&session, &decision, &path)?;
            }
        }
        Command::Replay {
            path,
            delay_ms,
            html,
        } => {
            let body = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let result = decode_saved_result(&body)
                .with_context(|| format!("Failed to parse {}", path.display()))?;

            let mut session = new_session(transport, &config, delay_ms);
            let report = session.present_result(result).await;
            info!(entries = report.entries, "replay finished");
            if let Some(out) = html {
                export_html(&session, &path.display().to_string(), &out)?;
            }
        }
    }

    Ok(())
}

type TerminalSession = ClientSession<HttpTransport, TerminalSurface<console::Term>>;

fn new_session(
    transport: HttpTransport,
    config: &ClientConfig,
    delay_ms: Option<u64>,
) -> TerminalSession {
    let delay = delay_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.per_message_delay());
    let presenter = StreamingPresenter::with_config(
        TerminalSurface::stdout(config.color),
        config.presenter_config(),
    );
    ClientSession::new(transport, presenter, delay)
}

async fn upload(session: &mut TerminalSession, files: &[PathBuf]) -> Result<()> {
    println!("Uploading...");
    match session.upload(files).await {
        Ok(report) => {
            println!("{}", report.status_line());
            println!("Uploaded: {}", report.uploaded.join(", "));
            Ok(())
        }
        Err(e) => {
            println!("Upload failed.");
            Err(e).context("Upload failed")
        }
    }
}

fn export_html(session: &TerminalSession, title: &str, path: &Path) -> Result<()> {
    let html = session
        .presenter()
        .with_surface(|surface| render_document(title, surface.mirror().blocks()));
    std::fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "HTML export written");
    Ok(())
}
