//! `panchayat`: command-line client for the Gram Panchayat portal.
//!
//! # Usage
//!
//! ```
//! panchayat --url http://localhost:8080 --user officer --password secret documents list
//! panchayat --config ~/.config/panchayat/config.toml staff performance
//! ```

mod client;
mod output;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, Submission};
use panchayat_core::document::{DocumentFilter, DocumentStatus, DocumentType};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "panchayat", about = "Command-line client for the Gram Panchayat portal")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<std::path::PathBuf>,

  /// Base URL of the portal server (default: http://localhost:8080).
  #[arg(long, env = "PANCHAYAT_URL", global = true)]
  url: Option<String>,

  /// API username.
  #[arg(long, env = "PANCHAYAT_USER", global = true)]
  user: Option<String>,

  /// API password (plaintext).
  #[arg(long, env = "PANCHAYAT_PASSWORD", global = true, hide_env_values = true)]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Certificate requests.
  #[command(subcommand)]
  Documents(DocumentsCommand),
  /// Public notices.
  #[command(subcommand)]
  Announcements(AnnouncementsCommand),
  /// Staff administration.
  #[command(subcommand)]
  Staff(StaffCommand),
}

#[derive(Subcommand, Debug)]
enum DocumentsCommand {
  /// List requests (your own, or all of them for staff).
  List {
    #[arg(long, value_parser = parse_status)]
    status: Option<DocumentStatus>,
    #[arg(long = "type", value_parser = parse_type)]
    document_type: Option<DocumentType>,
    /// Case-insensitive match on type, purpose and requester name.
    #[arg(long)]
    search: Option<String>,
  },
  /// Show one request in full.
  Show { id: Uuid },
  /// Submit a new request.
  Submit {
    #[arg(long = "type", value_parser = parse_type)]
    document_type: DocumentType,
    #[arg(long)]
    purpose: String,
    #[arg(long)]
    notes: Option<String>,
    /// A form field as `key=value`; repeatable.
    #[arg(long = "detail", value_parser = parse_detail)]
    details: Vec<(String, String)>,
  },
  /// Mark a pending request verified.
  Verify { id: Uuid },
  /// Approve a verified request.
  Approve { id: Uuid },
  /// Reject a pending or verified request.
  Reject {
    id: Uuid,
    #[arg(long)]
    reason: String,
  },
}

#[derive(Subcommand, Debug)]
enum AnnouncementsCommand {
  /// List announcements, newest first.
  List {
    #[arg(long)]
    category: Option<String>,
  },
}

#[derive(Subcommand, Debug)]
enum StaffCommand {
  /// Review counts per staff member.
  Performance,
}

fn parse_status(s: &str) -> Result<DocumentStatus, String> {
  DocumentStatus::parse(s).map_err(|e| e.to_string())
}

fn parse_type(s: &str) -> Result<DocumentType, String> {
  DocumentType::parse(s).map_err(|e| e.to_string())
}

fn parse_detail(s: &str) -> Result<(String, String), String> {
  match s.split_once('=') {
    Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_owned(), v.to_owned())),
    _ => Err(format!("expected key=value, got {s:?}")),
  }
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

fn non_empty(s: &str) -> Option<String> { (!s.is_empty()).then(|| s.to_owned()) }

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| non_empty(&file_cfg.url))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    username: args.user.or_else(|| non_empty(&file_cfg.username)).unwrap_or_default(),
    password: args.password.or_else(|| non_empty(&file_cfg.password)).unwrap_or_default(),
  };

  let client = ApiClient::new(api_config)?;
  let text = run(&client, args.command).await?;
  print!("{text}");
  Ok(())
}

async fn run(client: &ApiClient, command: Command) -> Result<String> {
  Ok(match command {
    Command::Documents(cmd) => match cmd {
      DocumentsCommand::List { status, document_type, search } => {
        let filter = DocumentFilter { status, document_type, search };
        output::documents(&client.list_documents(&filter).await?)
      }
      DocumentsCommand::Show { id } => output::document(&client.get_document(id).await?),
      DocumentsCommand::Submit { document_type, purpose, notes, details } => {
        let form_details: Map<String, Value> =
          details.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
        let submission = Submission {
          document_type,
          purpose,
          additional_notes: notes,
          form_details,
        };
        output::document(&client.submit_document(&submission).await?)
      }
      DocumentsCommand::Verify { id } => output::document(&client.review_document(id, "verify").await?),
      DocumentsCommand::Approve { id } => output::document(&client.review_document(id, "approve").await?),
      DocumentsCommand::Reject { id, reason } => {
        if reason.trim().is_empty() {
          bail!("a rejection reason is required");
        }
        output::document(&client.reject_document(id, &reason).await?)
      }
    },
    Command::Announcements(AnnouncementsCommand::List { category }) => {
      output::announcements(&client.list_announcements(category.as_deref()).await?)
    }
    Command::Staff(StaffCommand::Performance) => output::performance(&client.staff_performance().await?),
  })
}
