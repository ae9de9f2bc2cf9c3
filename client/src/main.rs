//! ITA CLI - inspect and edit Exastro IT Automation menus
//!
//! ```bash
//! ita info 2100000303                       # Column positions and names
//! ita options 基本コンソール/機器一覧         # Selectable values per column
//! ita fetch 2100000303 --all                # Rows as name-keyed JSON
//! ita edit 2100000303 entries.json          # Run edit entries and submit
//! ita edit 2100000303 entries.json --dry-run
//! ita menus                                 # Names in the menu catalog
//! ita --host ita.example.com info 2100000303
//! ```
//!
//! Connection settings come from `EXASTRO_*` environment variables or a
//! `.env` file; menu names are resolved through the menu catalog.

use clap::{Parser, Subcommand};
use ita_client::api::context;
use ita_client::{parse_entries, wire, ApiConfig, HttpTransport, MenuCatalog, MenuClient};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ita")]
#[command(about = "Inspect and edit Exastro IT Automation menus", long_about = None)]
struct Cli {
    /// Menu catalog file (name to menu id)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Endpoint protocol (overrides EXASTRO_PROTOCOL)
    #[arg(long, global = true)]
    protocol: Option<String>,

    /// Endpoint host (overrides EXASTRO_HOST)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Endpoint port (overrides EXASTRO_PORT)
    #[arg(long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the columns of a menu
    Info {
        /// Menu id or catalog name
        menu: String,
    },

    /// Show the selectable values of a menu
    Options {
        /// Menu id or catalog name
        menu: String,
    },

    /// Fetch rows of a menu
    Fetch {
        /// Menu id or catalog name
        menu: String,

        /// JSON filter file (default: rows that are not retired)
        #[arg(short, long)]
        filter: Option<PathBuf>,

        /// Fetch every row, retired ones included
        #[arg(long, conflicts_with = "filter")]
        all: bool,

        /// Use FILTER_DATAONLY (rows without a header row)
        #[arg(long)]
        data_only: bool,
    },

    /// Run edit entries against a menu
    Edit {
        /// Menu id or catalog name
        menu: String,

        /// JSON file with one entry or an array of entries
        entries: PathBuf,

        /// JSON filter file for the rows selectors run against
        #[arg(short, long)]
        filter: Option<PathBuf>,

        /// Do not fetch rows; selectors match nothing
        #[arg(long, conflicts_with = "filter")]
        no_fetch: bool,

        /// Print the EDIT payload instead of submitting it
        #[arg(long)]
        dry_run: bool,
    },

    /// List the menu catalog
    Menus,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let endpoint = endpoint_overrides(&cli);

    let result = match cli.command {
        Commands::Info { menu } => cmd_info(cli.catalog.as_deref(), &endpoint, &menu).await,

        Commands::Options { menu } => cmd_options(cli.catalog.as_deref(), &endpoint, &menu).await,

        Commands::Fetch {
            menu,
            filter,
            all,
            data_only,
        } => {
            cmd_fetch(
                cli.catalog.as_deref(),
                &endpoint,
                &menu,
                filter.as_deref(),
                all,
                data_only,
            )
            .await
        }

        Commands::Edit {
            menu,
            entries,
            filter,
            no_fetch,
            dry_run,
        } => {
            cmd_edit(
                cli.catalog.as_deref(),
                &endpoint,
                &menu,
                &entries,
                filter.as_deref(),
                no_fetch,
                dry_run,
            )
            .await
        }

        Commands::Menus => cmd_menus(cli.catalog.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Endpoint flags keyed by the environment variables they override.
fn endpoint_overrides(cli: &Cli) -> HashMap<String, String> {
    let mut overrides = HashMap::new();
    if let Some(protocol) = &cli.protocol {
        overrides.insert(context::PROTOCOL.to_string(), protocol.clone());
    }
    if let Some(host) = &cli.host {
        overrides.insert(context::HOST.to_string(), host.clone());
    }
    if let Some(port) = cli.port {
        overrides.insert(context::PORT.to_string(), port.to_string());
    }
    overrides
}

fn http_transport(endpoint: &HashMap<String, String>) -> Result<HttpTransport, Box<dyn std::error::Error>> {
    Ok(HttpTransport::new(ApiConfig::from_env_with(endpoint)?))
}

fn cmd_menus(catalog: Option<&Path>) -> CmdResult {
    let catalog = MenuCatalog::load(catalog)?;
    if catalog.is_empty() {
        eprintln!("⚠️  The menu catalog is empty");
    }
    for (name, menu_id) in catalog.iter() {
        println!("{}  {}", menu_id, name);
    }
    Ok(())
}

async fn cmd_info(catalog: Option<&Path>, endpoint: &HashMap<String, String>, menu: &str) -> CmdResult {
    let catalog = MenuCatalog::load(catalog)?;
    let menu_id = catalog.resolve(menu)?;
    let transport = http_transport(endpoint)?;
    let client = MenuClient::new(&transport, menu_id);

    let indexer = client.indexer().await?;
    eprintln!("📋 Menu {}: {} columns", menu_id, indexer.len());
    for (position, name) in indexer.names().iter().enumerate() {
        println!("{:>4}  {}", position, name);
    }
    Ok(())
}

async fn cmd_options(catalog: Option<&Path>, endpoint: &HashMap<String, String>, menu: &str) -> CmdResult {
    let catalog = MenuCatalog::load(catalog)?;
    let menu_id = catalog.resolve(menu)?;
    let transport = http_transport(endpoint)?;
    let client = MenuClient::new(&transport, menu_id);

    let options = client.options().await?;
    println!("{}", serde_json::to_string_pretty(options)?);
    Ok(())
}

async fn cmd_fetch(
    catalog: Option<&Path>,
    endpoint: &HashMap<String, String>,
    menu: &str,
    filter: Option<&Path>,
    all: bool,
    data_only: bool,
) -> CmdResult {
    let catalog = MenuCatalog::load(catalog)?;
    let menu_id = catalog.resolve(menu)?;
    let transport = http_transport(endpoint)?;
    let client = MenuClient::new(&transport, menu_id);

    let filter = resolve_filter(filter, all)?;
    let table = if data_only {
        client.fetch_data_only(filter.as_ref()).await?
    } else {
        client.fetch_table(filter.as_ref()).await?
    };
    eprintln!("📄 Fetched {} rows from menu {}", table.len(), menu_id);

    let rows: Vec<Value> = table
        .rows()
        .map(|row| {
            let mut object = Map::new();
            object.insert("body".to_string(), Value::Object(row.body().to_named_json()));
            if !row.file().is_empty() {
                object.insert("upload_file".to_string(), Value::Object(row.file().to_named_json()));
            }
            Value::Object(object)
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

async fn cmd_edit(
    catalog: Option<&Path>,
    endpoint: &HashMap<String, String>,
    menu: &str,
    entries_path: &Path,
    filter: Option<&Path>,
    no_fetch: bool,
    dry_run: bool,
) -> CmdResult {
    let catalog = MenuCatalog::load(catalog)?;
    let menu_id = catalog.resolve(menu)?;

    let entries = parse_entries(&fs::read_to_string(entries_path)?)?;
    eprintln!("📝 {} entries from {}", entries.len(), entries_path.display());

    let filter = resolve_filter(filter, no_fetch)?;
    let transport = http_transport(endpoint)?;
    let client = MenuClient::new(&transport, menu_id);

    if dry_run {
        let table = client.prepare_edit(&entries, filter.as_ref()).await?;
        eprintln!("🔍 Dry run: {} rows would be submitted", table.len());
        println!("{}", serde_json::to_string_pretty(&table.to_wire()?)?);
        return Ok(());
    }

    let response = client.edit(&entries, filter.as_ref()).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    eprintln!("✨ Done!");
    Ok(())
}

/// Filter from a file, none when `skip`, otherwise the non-retired filter.
fn resolve_filter(path: Option<&Path>, skip: bool) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(serde_json::from_str(&fs::read_to_string(path)?)?));
    }
    if skip {
        return Ok(None);
    }
    Ok(Some(wire::default_filter()))
}
