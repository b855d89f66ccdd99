use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tablemeta::identifier::{InMemoryDatabaseDirectory, InMemoryServerDirectory};
use tablemeta::metadata::{InMemoryMetadataStore, MetadataStore, TablesSnapshot};
use tablemeta::planner::GenerateConfigParams;
use tablemeta::{
    BackendSettings, DatabaseId, Document, IdentifierFormat, Interruptor, NameString, ServerId,
    TableConfigBackend, TableId,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tablemeta-tool")]
#[command(about = "Inspect and edit table configurations in a cluster state file")]
struct Cli {
    /// Cluster state file (servers, databases, tables)
    #[arg(long, global = true, default_value = "cluster_state.json")]
    state: PathBuf,

    /// Show server and database references by `name` or `uuid`
    #[arg(long, global = true)]
    format: Option<IdentifierFormat>,

    /// Backend settings file
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every table row
    List,
    /// Print one table row
    Get { id: String },
    /// Create a table; `id` is generated
    Insert {
        /// Row as JSON, or `@path` to read it from a file
        #[arg(long)]
        row: String,
    },
    /// Replace a table row
    Update {
        id: String,
        #[arg(long)]
        row: String,
    },
    /// Delete a table
    Delete { id: String },
    /// Regenerate a table's replica placement
    Reconfigure {
        id: String,
        #[arg(long, default_value_t = 1)]
        shards: usize,
        #[arg(long, default_value_t = 1)]
        replicas: usize,
        #[arg(long)]
        dry_run: bool,
    },
    AddServer { name: String },
    RemoveServer { name: String },
    AddDatabase { name: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NamedEntry<Id> {
    id: Id,
    name: NameString,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ClusterState {
    #[serde(default)]
    servers: Vec<NamedEntry<ServerId>>,
    #[serde(default)]
    databases: Vec<NamedEntry<DatabaseId>>,
    #[serde(default)]
    tables: TablesSnapshot,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut state = load_state(&cli.state)?;

    let mut settings = match &cli.settings {
        Some(path) => BackendSettings::load(path)
            .with_context(|| format!("Failed to load settings from '{}'", path.display()))?,
        None => BackendSettings::default(),
    };
    if let Some(format) = cli.format {
        settings = settings.identifier_format(format);
    }

    match cli.command {
        Command::AddServer { name } => {
            let name = NameString::new(name)?;
            state.servers.push(NamedEntry {
                id: ServerId::generate(),
                name,
            });
            return save_state(&cli.state, &state);
        }
        Command::RemoveServer { name } => {
            let before = state.servers.len();
            state.servers.retain(|entry| entry.name.as_str() != name);
            if state.servers.len() == before {
                bail!("Server `{}` does not exist.", name);
            }
            return save_state(&cli.state, &state);
        }
        Command::AddDatabase { name } => {
            let name = NameString::new(name)?;
            state.databases.push(NamedEntry {
                id: DatabaseId::generate(),
                name,
            });
            return save_state(&cli.state, &state);
        }
        command => {
            let (backend, store) = open_backend(&state, settings).await?;
            let changed = run(&backend, command).await?;
            if changed {
                state.tables = store.fetch_snapshot().await;
                save_state(&cli.state, &state)?;
            }
        }
    }
    Ok(())
}

/// Runs a table command and reports whether the state needs saving.
async fn run(backend: &TableConfigBackend, command: Command) -> Result<bool> {
    let interruptor = Interruptor::new();
    match command {
        Command::List => {
            print_json(&Document::Array(backend.read_all_rows(&interruptor).await?))?;
            Ok(false)
        }
        Command::Get { id } => {
            let row = backend
                .read_row(&json!(id), &interruptor)
                .await?
                .ok_or_else(|| anyhow!("No table with id `{}`.", id))?;
            print_json(&row)?;
            Ok(false)
        }
        Command::Insert { row } => {
            let mut row = parse_row(&row)?;
            let id = TableId::generate();
            let fields = row
                .as_object_mut()
                .ok_or_else(|| anyhow!("A table row must be a JSON object."))?;
            if fields.contains_key("id") {
                bail!("Do not pass `id` when inserting; one is generated.");
            }
            fields.insert("id".to_string(), json!(id.to_string()));

            let mut new_value = Some(row);
            backend
                .write_row(&json!(id.to_string()), true, &mut new_value, &interruptor)
                .await?;
            print_json(&new_value.unwrap_or(Document::Null))?;
            Ok(true)
        }
        Command::Update { id, row } => {
            let mut row = parse_row(&row)?;
            if let Some(fields) = row.as_object_mut() {
                fields.entry("id").or_insert_with(|| json!(id));
            }
            let mut new_value = Some(row);
            backend
                .write_row(&json!(id), false, &mut new_value, &interruptor)
                .await?;
            print_json(&new_value.unwrap_or(Document::Null))?;
            Ok(true)
        }
        Command::Delete { id } => {
            let mut new_value = None;
            backend
                .write_row(&json!(id), false, &mut new_value, &interruptor)
                .await?;
            Ok(true)
        }
        Command::Reconfigure {
            id,
            shards,
            replicas,
            dry_run,
        } => {
            let table_id = id
                .parse::<uuid::Uuid>()
                .map(TableId::from)
                .with_context(|| format!("`{}` is not a table id", id))?;
            let outcome = backend
                .reconfigure(
                    table_id,
                    GenerateConfigParams::new(shards, replicas),
                    dry_run,
                    &interruptor,
                )
                .await?;
            print_json(&outcome.to_document())?;
            Ok(!dry_run)
        }
        Command::AddServer { .. } | Command::RemoveServer { .. } | Command::AddDatabase { .. } => {
            Ok(false)
        }
    }
}

async fn open_backend(
    state: &ClusterState,
    settings: BackendSettings,
) -> Result<(TableConfigBackend, InMemoryMetadataStore)> {
    let servers = Arc::new(InMemoryServerDirectory::new());
    for entry in &state.servers {
        servers.add_server(entry.id, entry.name.clone()).await;
    }
    let databases = Arc::new(InMemoryDatabaseDirectory::new());
    for entry in &state.databases {
        databases.add_database(entry.id, entry.name.clone()).await;
    }
    let store = InMemoryMetadataStore::with_snapshot(state.tables.clone());

    let backend = TableConfigBackend::builder(Arc::new(store.clone()), servers, databases)
        .settings(settings)
        .build()?;
    Ok((backend, store))
}

fn parse_row(raw: &str) -> Result<Document> {
    let text = match raw.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read row from '{}'", path))?,
        None => raw.to_string(),
    };
    serde_json::from_str(&text).context("Row is not valid JSON")
}

fn print_json(document: &Document) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(document)?);
    Ok(())
}

fn load_state(path: &Path) -> Result<ClusterState> {
    if !path.exists() {
        return Ok(ClusterState::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read cluster state '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse cluster state '{}'", path.display()))
}

fn save_state(path: &Path, state: &ClusterState) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory '{}'", dir.display()))?;

    let mut file = tempfile::NamedTempFile::new_in(&dir)
        .with_context(|| format!("Failed to create temp file in '{}'", dir.display()))?;
    serde_json::to_writer_pretty(&mut file, state)?;
    file.write_all(b"\n")?;
    file.persist(path)
        .with_context(|| format!("Failed to write cluster state '{}'", path.display()))?;
    Ok(())
}
