//! # Command Line Interface
//!
//! ```text
//! taxport import      --collection <NAME> --username <USER> --password <PASS> [--csv FILE]
//! taxport collections [--domain URL]
//! taxport request     <METHOD> <ENDPOINT> [--body JSON] --collection ... --username ... --password ...
//! ```
//!
//! Connection settings fall back to `TAXPORT_DOMAIN`, `TAXPORT_COLLECTION`,
//! `TAXPORT_USERNAME` and `TAXPORT_PASSWORD`.

use crate::config::{
    DEFAULT_CSV_FILE, DEFAULT_LOG_FILE, DEFAULT_RECORDSET_NAME, ImportConfig, LoginConfig,
};
use crate::import::{ImportPlan, ImportReport, run_import};
use crate::input::read_rows;
use crate::logging::init_file_logging;
use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use taxport_client::{RequestMethod, Scope, SpecifySession};
use taxport_core::resolver::DEFAULT_REMARKS;
use taxport_core::{RecordExt, RecordSetSpec, TreeAnchor};
use tracing::info;

// =============================================================================
// ARGUMENTS
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "taxport", version, about = "Import taxon records from CSV into a Specify collection")]
pub struct Cli {
    /// File receiving the run log.
    #[arg(long, global = true, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import taxa from a CSV file and gather them into a record set.
    Import(ImportArgs),
    /// List the collections available for login.
    Collections(ConnectionArgs),
    /// Send one raw API request and print the response.
    Request(RequestArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    /// Base URL of the Specify server.
    #[arg(long, env = "TAXPORT_DOMAIN", default_value = "http://localhost")]
    pub domain: String,
}

#[derive(Debug, Clone, Args)]
pub struct LoginArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Name of the collection to log in to.
    #[arg(long, env = "TAXPORT_COLLECTION")]
    pub collection: String,

    #[arg(long, env = "TAXPORT_USERNAME")]
    pub username: String,

    #[arg(long, env = "TAXPORT_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Clone, Args)]
pub struct ImportArgs {
    #[command(flatten)]
    pub login: LoginArgs,

    /// CSV file with Order, Family, Genus, Species, isAccepted, Author,
    /// AcceptedGenus, AcceptedSpecies, AcceptedAuthor columns.
    #[arg(long, default_value = DEFAULT_CSV_FILE)]
    pub csv: PathBuf,

    /// Name of the record set created for the imported species.
    #[arg(long, default_value = DEFAULT_RECORDSET_NAME)]
    pub recordset_name: String,

    /// Class taxon every imported Order is placed under.
    #[arg(long, default_value = "Mammalia")]
    pub anchor_class: String,

    /// Phylum the anchor Class is created under when missing.
    #[arg(long, default_value = "Chordata")]
    pub anchor_phylum: String,

    /// Remarks written on every created taxon.
    #[arg(long, default_value = DEFAULT_REMARKS)]
    pub remarks: String,

    /// Print the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct RequestArgs {
    #[command(flatten)]
    pub login: LoginArgs,

    /// GET, PUT, POST or DELETE.
    pub method: String,

    /// Path on the server, e.g. /api/specify/taxon/1/
    pub endpoint: String,

    /// JSON request body.
    #[arg(long)]
    pub body: Option<String>,
}

impl From<LoginArgs> for LoginConfig {
    fn from(args: LoginArgs) -> Self {
        Self {
            domain: args.connection.domain,
            collection: args.collection,
            username: args.username,
            password: args.password,
        }
    }
}

impl ImportArgs {
    /// Resolve into an [`ImportConfig`] logging to `log_file`.
    pub fn into_config(self, log_file: PathBuf) -> ImportConfig {
        ImportConfig {
            login: self.login.into(),
            csv_path: self.csv,
            log_file,
            recordset_name: self.recordset_name,
            anchor: TreeAnchor {
                class_name: self.anchor_class,
                phylum_name: self.anchor_phylum,
            },
            remarks: self.remarks,
            json: self.json,
        }
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Install logging and run the selected command.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    init_file_logging(&cli.log_file)?;

    match cli.command {
        Commands::Import(args) => {
            let config = args.into_config(cli.log_file);
            cmd_import(&config).await.map(|_| ())
        }
        Commands::Collections(args) => cmd_collections(&args.domain).await,
        Commands::Request(args) => cmd_request(args).await,
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Run a full import as described by `config`.
pub async fn cmd_import(config: &ImportConfig) -> anyhow::Result<ImportReport> {
    let rows = read_rows(&config.csv_path)?;
    info!("Read {} rows from {}", rows.len(), config.csv_path.display());

    let mut session = open_session(&config.login).await?;

    let discipline_id = session
        .domain_id(Scope::Discipline)
        .ok_or_else(|| anyhow!("Login did not resolve a discipline"))?;
    let discipline = session
        .fetch_resource("discipline", discipline_id)
        .await
        .context("Failed to fetch discipline")?;

    let collection_id = session
        .domain_id(Scope::Collection)
        .ok_or_else(|| anyhow!("Login did not resolve a collection"))?;
    let user_uri = session
        .specify_user()
        .ok_or_else(|| anyhow!("Login did not return a user"))?
        .resource_uri()?
        .to_string();

    let plan = ImportPlan {
        anchor: &config.anchor,
        remarks: &config.remarks,
        recordset: RecordSetSpec::taxa(&config.recordset_name, collection_id, user_uri),
    };
    let report = run_import(&session, &discipline, &rows, &plan).await?;

    session.logout().await.context("Failed to log out")?;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    println!("Generated logs available at {}", display_path(&config.log_file));
    Ok(report)
}

/// Print the collections offered by the server at `domain`.
pub async fn cmd_collections(domain: &str) -> anyhow::Result<()> {
    let session = SpecifySession::connect(domain)
        .await
        .with_context(|| format!("Failed to connect to {}", domain))?;

    println!("Collections at {}:", domain);
    for (name, id) in session.collections() {
        println!("  {:>6}  {}", id, name);
    }
    Ok(())
}

/// Send one raw request as the configured user.
pub async fn cmd_request(args: RequestArgs) -> anyhow::Result<()> {
    let method: RequestMethod = args.method.parse()?;
    let body: Option<Value> = args
        .body
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .context("Request body is not valid JSON")?;

    let mut session = open_session(&args.login.into()).await?;
    let resp = session
        .send_request(method, &args.endpoint, body.as_ref())
        .await?;

    let status = resp.status();
    let text = resp.text().await?;
    println!("{}", status);
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) if !text.is_empty() => println!("{}", text),
        Err(_) => {}
    }

    session.logout().await.context("Failed to log out")?;
    Ok(())
}

// =============================================================================
// HELPERS
// =============================================================================

/// Connect to the configured server and log in to the named collection.
pub async fn open_session(login: &LoginConfig) -> anyhow::Result<SpecifySession> {
    let mut session = SpecifySession::connect(&login.domain)
        .await
        .with_context(|| format!("Failed to connect to {}", login.domain))?;

    let collection_id = session.collection_id(&login.collection).ok_or_else(|| {
        let available: Vec<&str> = session.collections().keys().map(String::as_str).collect();
        anyhow!(
            "Unknown collection {:?} (available: {})",
            login.collection,
            available.join(", ")
        )
    })?;

    session
        .login(&login.username, &login.password, collection_id)
        .await
        .with_context(|| format!("Failed to log in to {}", login.collection))?;
    info!("Logged in to collection {} ({})", login.collection, collection_id);
    Ok(session)
}

fn print_report(report: &ImportReport) {
    println!("Imported {} rows", report.species_ids.len());
    println!("  created:        {}", report.created);
    println!("  author updated: {}", report.author_updated);
    println!("  synonymized:    {}", report.synonymized);
    println!("  unchanged:      {}", report.unchanged);
    if let Some(uri) = &report.recordset {
        println!("  recordset:      {}", uri);
    }
}

fn display_path(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
