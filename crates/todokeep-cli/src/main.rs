//! todokeep CLI, the `tk` command.
//!
//! Issues bearer tokens for the configured login and manages the caller's
//! todo list in the state document, authenticating every store command
//! through the same auth gate a server would use.

use std::io;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use todokeep::{AuthGate, Config, Identity, Record, RecordPatch, RecordStore, TodoError};

/// Environment variable consulted when `--token` is not given.
const ENV_TOKEN: &str = "TODO_TOKEN";

// ── CLI structure ─────────────────────────────────────────────────────────────

/// todokeep CLI: issue tokens and manage per-identity todo lists.
#[derive(Parser, Debug)]
#[command(
    name = "tk",
    about = "todokeep CLI",
    version,
    long_about = "tk: todokeep CLI\n\nIssue signed bearer tokens and manage the todo list of the\nidentity they name. Settings come from TODO_* environment variables\nor a .env file in the working directory."
)]
struct Cli {
    /// State document path (overrides TODO_DATA_FILE)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Bearer token for store commands (default: $TODO_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Exchange the configured username and password for a token
    Login {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,
    },

    /// Verify a token and show its claims
    Verify {
        /// The token to check
        token: String,
    },

    /// List todos, most recent first
    List,

    /// Add a todo
    Add {
        /// Title of the new todo
        title: String,
    },

    /// Change a todo's title or completion flag
    Update {
        /// Id of the todo
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New completion flag (true or false)
        #[arg(long)]
        completed: Option<bool>,
    },

    /// Delete a todo
    Delete {
        /// Id of the todo
        id: String,
    },
}

fn main() {
    let cli = Cli::parse();

    // Values already in the environment win over the .env file.
    if let Err(e) = load_dotenv() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

/// Load `.env` if there is one. Only a missing file is ignored.
fn load_dotenv() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(dotenvy::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(anyhow::Error::new(e).context("failed to load .env")),
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env().context("invalid configuration")?;
    if let Some(path) = cli.data_file.clone() {
        config.data_file = path;
    }
    log::debug!("configuration: {config:?}");

    match &cli.command {
        Commands::Login { username, password } => cmd_login(&config, username, password, &cli),
        Commands::Verify { token } => cmd_verify(&config, token, &cli),
        Commands::List => cmd_list(&config, &cli),
        Commands::Add { title } => cmd_add(&config, title, &cli),
        Commands::Update {
            id,
            title,
            completed,
        } => {
            let patch = RecordPatch {
                title: title.clone(),
                completed: *completed,
            };
            cmd_update(&config, id, &patch, &cli)
        }
        Commands::Delete { id } => cmd_delete(&config, id, &cli),
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn auth_gate(config: &Config) -> Result<AuthGate> {
    AuthGate::from_config(config).map_err(describe)
}

/// Resolve the caller through the auth gate, as a server would for an
/// `Authorization: Bearer` header.
fn authenticate(config: &Config, cli: &Cli) -> Result<Identity> {
    let token = cli
        .token
        .clone()
        .or_else(|| std::env::var(ENV_TOKEN).ok())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| anyhow!("no token given; pass --token or set {ENV_TOKEN}"))?;
    let header = format!("Bearer {token}");
    auth_gate(config)?
        .authenticate(Some(&header))
        .map_err(describe)
}

fn open_store(config: &Config) -> Result<RecordStore> {
    RecordStore::open(&config.data_file)
        .map_err(describe)
        .with_context(|| format!("failed to open {}", config.data_file.display()))
}

/// Attach the stable error code to a core error.
fn describe(e: TodoError) -> anyhow::Error {
    anyhow!("{e} [{}]", e.code())
}

fn print_record(record: &Record, cli: &Cli) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&json!({ "todo": record }))?);
    } else {
        let mark = if record.completed { "x" } else { " " };
        println!("[{mark}] {}  {}", record.id, record.title);
    }
    Ok(())
}

// ── Command implementations ───────────────────────────────────────────────────

/// `tk login --username U --password P`
fn cmd_login(config: &Config, username: &str, password: &str, cli: &Cli) -> Result<()> {
    let issued = auth_gate(config)?
        .login(username, password)
        .map_err(describe)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&issued)?);
    } else {
        println!("{}", issued.token);
        if cli.verbose {
            eprintln!("expires at {} (unix seconds)", issued.expires_at);
        }
    }
    Ok(())
}

/// `tk verify TOKEN`
fn cmd_verify(config: &Config, token: &str, cli: &Cli) -> Result<()> {
    config.validate().map_err(describe)?;

    match todokeep::verify(token, &config.jwt_secret) {
        Ok(claims) => {
            if cli.json {
                let out = json!({ "ok": true, "subject": claims.subject(), "claims": claims });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("Token: valid");
                println!("  Subject: {}", claims.subject().unwrap_or("(none)"));
                if let Some(iat) = claims.issued_at {
                    println!("  Issued:  {iat}");
                }
                if let Some(exp) = claims.expires_at {
                    println!("  Expires: {exp}");
                }
            }
            Ok(())
        }
        Err(e) => {
            if cli.json {
                println!("{}", json!({ "ok": false, "error": e.code() }));
            }
            Err(describe(e))
        }
    }
}

/// `tk list`
fn cmd_list(config: &Config, cli: &Cli) -> Result<()> {
    let identity = authenticate(config, cli)?;
    let records = open_store(config)?
        .list(identity.as_str())
        .map_err(describe)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&json!({ "todos": records }))?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No todos for {identity}");
        return Ok(());
    }
    for record in &records {
        print_record(record, cli)?;
    }
    if cli.verbose {
        let done = records.iter().filter(|r| r.completed).count();
        println!("{} todo(s), {done} completed", records.len());
    }
    Ok(())
}

/// `tk add TITLE`
fn cmd_add(config: &Config, title: &str, cli: &Cli) -> Result<()> {
    let identity = authenticate(config, cli)?;
    let record = open_store(config)?
        .add(identity.as_str(), title)
        .map_err(describe)?;
    print_record(&record, cli)
}

/// `tk update ID [--title T] [--completed BOOL]`
fn cmd_update(config: &Config, id: &str, patch: &RecordPatch, cli: &Cli) -> Result<()> {
    if patch.is_empty() {
        return Err(anyhow!("nothing to update; pass --title and/or --completed"));
    }
    let identity = authenticate(config, cli)?;
    let record = open_store(config)?
        .update(identity.as_str(), id, patch)
        .map_err(describe)?;
    print_record(&record, cli)
}

/// `tk delete ID`
fn cmd_delete(config: &Config, id: &str, cli: &Cli) -> Result<()> {
    let identity = authenticate(config, cli)?;
    let removed = open_store(config)?
        .delete(identity.as_str(), id)
        .map_err(describe)?;

    if cli.json {
        println!("{}", json!({ "deleted": true, "id": removed.id }));
    } else {
        println!("Deleted {}  {}", removed.id, removed.title);
    }
    Ok(())
}
