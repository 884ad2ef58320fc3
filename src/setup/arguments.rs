use crate::CardFilter;
use crate::auth::Credentials;

use clap::{Parser, Subcommand};
use log::{debug, warn};
use std::fmt;

pub const DEFAULT_SECRET_KEY: &str = "development key";
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "default";

#[derive(Parser, Debug)]
#[command(version, about, long_about)]
struct Args {
    /// Path to the SQLite database holding the `cards` table
    #[arg(long, env = "FLASHCARDS_DATABASE", default_value = "flashcards.db")]
    database: String,
    #[arg(long, env = "FLASHCARDS_HOST", default_value = "0.0.0.0")]
    host: String,
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,
    /// Key used to sign session cookies
    #[arg(long, env = "SECRET_KEY", default_value = DEFAULT_SECRET_KEY, hide_env_values = true)]
    secret_key: String,
    #[arg(short, long, env = "FLASHCARDS_USERNAME", default_value = DEFAULT_USERNAME)]
    username: String,
    #[arg(long, env = "FLASHCARDS_PASSWORD", default_value = DEFAULT_PASSWORD, hide_env_values = true)]
    password: String,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the web server (default)
    Serve,
    /// Print cards as a table
    List {
        /// One of: all, general, code, known, unknown
        #[arg(short, long, default_value = "all")]
        filter: CardFilter,
    },
    /// Add a card from the terminal
    Add {
        /// 1 = general, 2 = code
        #[arg(short = 't', long = "type", default_value_t = 1)]
        card_type: i64,
        #[arg(long)]
        front: String,
        #[arg(long)]
        back: String,
    },
}

/// Process-wide settings, read once at startup and never mutated afterwards
#[derive(Clone)]
pub struct Config {
    pub database: String,
    pub host: String,
    pub port: u16,
    pub secret_key: String,
    pub credentials: Credentials,
}

impl Config {
    /// Address the server binds to, e.g. `0.0.0.0:5000`
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Never print the secret key
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database", &self.database)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secret_key", &"<redacted>")
            .field("credentials", &self.credentials)
            .finish()
    }
}

/// Loads variables from a `.env` file, if there is one. Already exported
/// variables win over the file.
pub fn load_env() {
    if let Ok(path) = dotenv::dotenv() {
        debug!("Loaded environment from {}", path.display());
    }
}

/// Parses command-line arguments (falling back to environment variables and
/// defaults) into the immutable `Config` and the subcommand to run.
///
/// Warns when the server would run with the default secret key or password.
#[must_use]
pub fn handle_args() -> (Config, Command) {
    let args = Args::parse();

    if args.secret_key == DEFAULT_SECRET_KEY {
        warn!("SECRET_KEY not set, session cookies are signed with the default key");
    }
    if args.password == DEFAULT_PASSWORD {
        warn!("FLASHCARDS_PASSWORD not set, using the default admin password");
    }

    let config = Config {
        database: args.database,
        host: args.host,
        port: args.port,
        secret_key: args.secret_key,
        credentials: Credentials::new(&args.username, &args.password),
    };
    debug!("Loaded {config:?}");

    (config, args.command.unwrap_or(Command::Serve))
}
