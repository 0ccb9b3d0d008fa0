//! Chirpy CLI: the `chirpy` command.
//!
//! Thin glue over the `chirpy` core: each subcommand decodes its arguments,
//! calls exactly one core operation, and prints the result as JSON.

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use zeroize::Zeroize;

use chirpy::{Chirpy, ChirpyConfig, ChirpyError};

/// Words replaced by `****` in posted chirps.
const PROFANITIES: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];

// ── Glue helpers ──────────────────────────────────────────────────────────────

/// Replace whole space-separated profane words, ignoring case.
fn clean_body(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            if PROFANITIES.contains(&word.to_lowercase().as_str()) {
                "****"
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Use the password given on the command line, or read one line from stdin.
fn read_password(given: Option<String>, prompt: &str) -> Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    eprint!("{prompt}");
    let mut password = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut password)
        .context("failed to read password")?;
    let trimmed = password.trim_end_matches(['\r', '\n']).to_string();
    password.zeroize();
    Ok(trimmed)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{json}");
    Ok(())
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// Chirpy CLI: post chirps, manage accounts, and issue tokens against a
/// local Chirpy database.
#[derive(Parser, Debug)]
#[command(
    name = "chirpy",
    about = "Chirpy CLI",
    version,
    long_about = "chirpy: Chirpy CLI\n\nPost and read chirps, create and update accounts, log in,\nand verify bearer tokens against a local JSON database.\n\nThe signing secret is read from JWT_SECRET or the config file."
)]
struct Cli {
    /// Database file (overrides config file and CHIRPY_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Delete the database before running the command
    #[arg(long, global = true)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Post and read chirps
    Chirp {
        #[command(subcommand)]
        subcommand: ChirpCommands,
    },

    /// Create and update accounts
    User {
        #[command(subcommand)]
        subcommand: UserCommands,
    },

    /// Log in and print a bearer token
    Login {
        #[arg(long)]
        email: String,

        /// Password (read from stdin if omitted)
        #[arg(long)]
        password: Option<String>,

        /// Requested token lifetime in seconds (0 = maximum)
        #[arg(long, default_value_t = 0)]
        expires_in: u64,
    },

    /// Inspect bearer tokens
    Token {
        #[command(subcommand)]
        subcommand: TokenCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ChirpCommands {
    /// Post a new chirp (max 140 bytes)
    Post {
        /// Chirp text
        body: String,
    },

    /// List all chirps
    List,

    /// Show one chirp
    Get {
        /// Chirp id
        id: u64,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommands {
    /// Create an account
    Create {
        #[arg(long)]
        email: String,

        /// Password (read from stdin if omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Replace the email and password of the account a token was issued for
    Update {
        /// Bearer token from `chirpy login`
        #[arg(long)]
        token: String,

        #[arg(long)]
        email: String,

        /// New password (read from stdin if omitted)
        #[arg(long)]
        password: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommands {
    /// Verify a token and print the account id it belongs to
    Verify {
        token: String,
    },
}

// ── Main entry point ──────────────────────────────────────────────────────────

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        if let Some(core) = err.downcast_ref::<ChirpyError>() {
            eprintln!("status: {}", core.status_code());
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = ChirpyConfig::load(cli.config.as_deref()).context("failed to load config")?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    config.validate()?;

    if cli.debug {
        chirpy::DocumentStore::new(&config.db_path)
            .reset()
            .context("failed to reset database")?;
    }

    let chirpy = Chirpy::open(config)?;
    if cli.verbose {
        eprintln!("database: {}", chirpy.config().db_path.display());
        let counters = chirpy.repository().counters();
        eprintln!(
            "last ids: chirp {}, user {}",
            counters.last_chirp_id, counters.last_user_id
        );
    }

    match cli.command {
        Commands::Chirp { subcommand } => match subcommand {
            ChirpCommands::Post { body } => cmd_chirp_post(&chirpy, &body),
            ChirpCommands::List => cmd_chirp_list(&chirpy),
            ChirpCommands::Get { id } => cmd_chirp_get(&chirpy, id),
        },
        Commands::User { subcommand } => match subcommand {
            UserCommands::Create { email, password } => cmd_user_create(&chirpy, &email, password),
            UserCommands::Update {
                token,
                email,
                password,
            } => cmd_user_update(&chirpy, &token, &email, password),
        },
        Commands::Login {
            email,
            password,
            expires_in,
        } => cmd_login(&chirpy, &email, password, expires_in),
        Commands::Token { subcommand } => match subcommand {
            TokenCommands::Verify { token } => cmd_token_verify(&chirpy, &token),
        },
    }
}

// ── Command implementations ───────────────────────────────────────────────────

/// `chirpy chirp post BODY`
fn cmd_chirp_post(chirpy: &Chirpy, body: &str) -> Result<()> {
    // The limit applies to what the user typed, not the filtered text.
    chirpy::model::validate_body(body)?;
    let cleaned = clean_body(body);
    log::debug!("clean chirp: {cleaned}");
    let chirp = chirpy.repository().create_message(&cleaned)?;
    print_json(&chirp)
}

/// `chirpy chirp list`
fn cmd_chirp_list(chirpy: &Chirpy) -> Result<()> {
    let chirps = chirpy.repository().list_messages()?;
    print_json(&chirps)
}

/// `chirpy chirp get ID`
fn cmd_chirp_get(chirpy: &Chirpy, id: u64) -> Result<()> {
    let chirp = chirpy.repository().get_message(id)?;
    print_json(&chirp)
}

/// `chirpy user create --email EMAIL [--password PW]`
fn cmd_user_create(chirpy: &Chirpy, email: &str, password: Option<String>) -> Result<()> {
    let mut password = read_password(password, "Password: ")?;
    let result = chirpy.repository().create_account(email, &password);
    password.zeroize();
    print_json(&result?)
}

/// `chirpy user update --token TOKEN --email EMAIL [--password PW]`
fn cmd_user_update(
    chirpy: &Chirpy,
    token: &str,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let mut password = read_password(password, "New password: ")?;
    let result = chirpy.update_account_with_bearer(&format!("Bearer {token}"), email, &password);
    password.zeroize();
    print_json(&result?)
}

/// `chirpy login --email EMAIL [--password PW] [--expires-in SECS]`
fn cmd_login(
    chirpy: &Chirpy,
    email: &str,
    password: Option<String>,
    expires_in: u64,
) -> Result<()> {
    let mut password = read_password(password, "Password: ")?;
    let result = chirpy.login(email, &password, expires_in);
    password.zeroize();
    print_json(&result?)
}

/// `chirpy token verify TOKEN`
fn cmd_token_verify(chirpy: &Chirpy, token: &str) -> Result<()> {
    let claims = chirpy.tokens().claims(token).context("token rejected")?;
    let account_id = claims.subject()?;

    #[derive(Serialize)]
    struct TokenInfo {
        account_id: u64,
        issued_at: String,
        expires_at: String,
    }

    print_json(&TokenInfo {
        account_id,
        issued_at: chirpy::time::secs_to_rfc3339(claims.iat),
        expires_at: chirpy::time::secs_to_rfc3339(claims.exp),
    })
}
