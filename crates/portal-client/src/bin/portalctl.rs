//! portalctl - command line client for the portal server
//!
//! Signs in, keeps the session token between invocations and shows who the
//! token belongs to.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use portal_client::{ApiClient, FileTokenStorage, Navigator, SessionStore, TokenStorage};

const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        let _ = writeln!(io::stderr(), "Error: {err:?}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[tokio::main]
async fn try_main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let storage: Arc<dyn TokenStorage> = Arc::new(match &cli.state_dir {
        Some(dir) => FileTokenStorage::new(dir),
        None => FileTokenStorage::default_location()?,
    });
    let client = Arc::new(ApiClient::new(&cli.server).context("building HTTP client")?);
    let store = SessionStore::open(client, storage, Arc::new(LoginHint)).await;

    match cli.command {
        Command::Login { email, password } => handle_login(&store, &email, password, cli.json).await,
        Command::Logout => handle_logout(&store).await,
        Command::Whoami => handle_whoami(&store, cli.json).await,
        Command::Accounts => handle_accounts(&store, cli.json).await,
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "portalctl",
    author,
    version,
    about = "Command line client for the portal server - sign in and inspect the session."
)]
struct Cli {
    /// Portal server URL
    #[arg(long, short = 's', default_value = DEFAULT_SERVER_URL, env = "PORTAL_SERVER_URL")]
    server: String,

    /// Directory holding the persisted token (defaults to $XDG_STATE_HOME/portal)
    #[arg(long, value_name = "PATH", env = "PORTAL_STATE_DIR", global = true)]
    state_dir: Option<PathBuf>,

    /// Output machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase logging verbosity (stackable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and persist the session token
    Login {
        /// Account email
        #[arg(long, short)]
        email: String,
        /// Password. Read from stdin when omitted.
        #[arg(long, short)]
        password: Option<String>,
    },
    /// Sign out and forget the session token
    Logout,
    /// Show the signed-in identity
    Whoami,
    /// List the server's test accounts, if it exposes them
    Accounts,
}

/// Tells the user to sign in again once the session is gone.
struct LoginHint;

impl Navigator for LoginHint {
    fn to_login(&self) {
        let _ = writeln!(io::stderr(), "Session ended. Sign in with `portalctl login`.");
    }
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("portal_client={level},portalctl={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .ok();
}

async fn handle_login(
    store: &SessionStore,
    email: &str,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => {
            let mut line = String::new();
            io::stdin()
                .lock()
                .read_line(&mut line)
                .context("reading password from stdin")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    let user = store
        .login(email, &password)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!(
            "Signed in as {} ({}), home {}",
            user.display_name(),
            user.role,
            user.role.home_route()
        );
    }
    Ok(())
}

async fn handle_logout(store: &SessionStore) -> Result<()> {
    store.logout().await;
    Ok(())
}

async fn handle_whoami(store: &SessionStore, json: bool) -> Result<()> {
    let Some(user) = store.restore().await else {
        return Err(anyhow!("not signed in"));
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!("{} <{}>", user.display_name(), user.email);
        println!("role: {}", user.role);
    }
    Ok(())
}

async fn handle_accounts(store: &SessionStore, json: bool) -> Result<()> {
    let accounts = store.test_accounts().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&accounts)?);
        return Ok(());
    }

    if accounts.is_empty() {
        println!("No test accounts available");
        return Ok(());
    }

    for account in accounts {
        let role = account.role.to_string();
        match account.password {
            Some(password) => println!("{role:<8} {} / {password}", account.email),
            None => println!("{role:<8} {}", account.email),
        }
    }
    Ok(())
}
