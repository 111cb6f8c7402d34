//! documind - DocuMind command-line client
//!
//! Drives the document generation wizard against a running documind-api and renders
//! the listing and status views.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use documind_common::config::{load_dotenv, resolve_string, TomlConfig};
use documind_common::DocType;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use documind_ui::client::DEFAULT_API_URL;
use documind_ui::recorder::AudioRecorder;
use documind_ui::wizard::{render_preview, Action, Step};
use documind_ui::{views, DocumindApi, FileRecorder, HttpApiClient, WizardController};

/// Command-line arguments for documind
#[derive(Parser, Debug)]
#[command(name = "documind")]
#[command(about = "Turn notes and voice memos into structured documents")]
#[command(version)]
struct Cli {
    /// documind-api base URL
    #[arg(long, env = "DOCUMIND_API_URL", global = true)]
    api_url: Option<String>,

    /// Config file (default: $DOCUMIND_CONFIG or ~/.config/documind/documind.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, env = "DOCUMIND_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a document from text or a voice memo
    Generate(GenerateArgs),

    /// List stored documents
    Documents {
        /// Only this type (meeting_notes, prd, code_docs, general)
        #[arg(long)]
        doc_type: Option<DocType>,
    },

    /// List open action items from meeting notes
    Tasks,

    /// Show integration status
    Status,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").args(["text", "file", "audio", "record"])))]
struct GenerateArgs {
    /// Raw text (reads stdin when no source is given)
    #[arg(long)]
    text: Option<String>,

    /// Read raw text from a file
    #[arg(long)]
    file: Option<PathBuf>,

    /// Transcribe a recorded voice memo
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Record from the microphone until Enter is pressed
    #[arg(long)]
    record: bool,

    /// Generate the artifact without asking
    #[arg(short, long)]
    yes: bool,

    /// Directory the artifact is saved to
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();
    let toml = TomlConfig::load_or_default(cli.config.as_deref());

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| toml.logging.level.clone());
    // stdout carries the views; logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("documind_ui={level},documind={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let api_url = resolve_string(
        cli.api_url.as_deref(),
        "DOCUMIND_API_URL",
        toml.client.api_url.as_deref(),
    )
    .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let client = HttpApiClient::new(api_url).context("Failed to build HTTP client")?;
    tracing::debug!(api_url = client.base_url(), "Using documind-api");
    let api: Arc<dyn DocumindApi> = Arc::new(client);

    match cli.command {
        Command::Generate(args) => {
            let out = args
                .out
                .clone()
                .or_else(|| toml.client.download_dir.clone())
                .unwrap_or_else(|| PathBuf::from("."));
            generate(api, args, out).await
        }
        Command::Documents { doc_type } => {
            let view = views::load_documents(api.as_ref(), doc_type).await;
            print!("{}", views::render_documents(&view));
            Ok(())
        }
        Command::Tasks => {
            let view = views::load_open_tasks(api.as_ref()).await;
            print!("{}", views::render_tasks(&view));
            Ok(())
        }
        Command::Status => {
            let status = views::load_status(api.as_ref()).await;
            print!("{}", views::render_status(&status));
            Ok(())
        }
    }
}

/// Run one wizard session end to end
async fn generate(api: Arc<dyn DocumindApi>, args: GenerateArgs, out: PathBuf) -> Result<()> {
    let recorder: Option<Box<dyn AudioRecorder>> = match (&args.audio, args.record) {
        (Some(path), _) => Some(Box::new(FileRecorder::new(path))),
        (None, true) => Some(microphone()?),
        (None, false) => None,
    };
    let voice = recorder.is_some();
    let wizard = WizardController::spawn(api, recorder, out);

    if voice {
        let state = wizard.dispatch(Action::StartRecording).await?;
        if let Some(error) = state.error() {
            bail!("{}", error);
        }
        if args.record {
            eprintln!("Recording... press Enter to stop.");
            read_line().await?;
        }
        eprintln!("Transcribing...");
        let state = wizard.dispatch(Action::StopRecording).await?;
        if let Some(error) = state.error() {
            bail!("{}", error);
        }
        println!("Transcript:\n{}\n", state.text());
    } else {
        let text = match (&args.text, &args.file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?,
            (None, None) => {
                let mut text = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut text)
                    .await
                    .context("Failed to read stdin")?;
                text
            }
        };
        wizard.dispatch(Action::SetText(text)).await?;
    }

    eprintln!("Processing...");
    let state = wizard.dispatch(Action::SubmitText).await?;
    let Some(document) = state.document().filter(|_| state.step() == Step::Preview) else {
        bail!("{}", state.error().unwrap_or("Processing failed"));
    };

    println!("{} [{}]", document.title, document.doc_type().label());
    if !document.summary.is_empty() {
        println!("{}", document.summary);
    }
    println!("{}", render_preview(document));

    if !args.yes {
        eprint!("Generate the document? [Y/n] ");
        let answer = read_line().await?;
        if matches!(answer.trim().to_ascii_lowercase().as_str(), "n" | "no") {
            wizard.dispatch(Action::Reset).await?;
            eprintln!("Discarded.");
            return Ok(());
        }
    }

    wizard.dispatch(Action::Confirm).await?;
    let state = wizard.dispatch(Action::RequestDownload).await?;
    match state.downloaded() {
        Some(path) => {
            println!("Saved {}", path.display());
            Ok(())
        }
        None => bail!("{}", state.error().unwrap_or("Download failed")),
    }
}

async fn read_line() -> Result<String> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read stdin")?;
    Ok(line)
}

#[cfg(feature = "microphone")]
fn microphone() -> Result<Box<dyn AudioRecorder>> {
    Ok(Box::new(documind_ui::recorder::MicrophoneRecorder::new()))
}

#[cfg(not(feature = "microphone"))]
fn microphone() -> Result<Box<dyn AudioRecorder>> {
    bail!("documind was built without microphone support; record a memo and pass --audio")
}
