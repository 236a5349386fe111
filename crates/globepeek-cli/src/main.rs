mod commands;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use globepeek_cli::output::OutputFormat;
use globepeek_cli::session_file::{default_session_path, SessionFile};
use globepeek_lib::{ApiClients, ApiConfig, SessionStore, Theme, ThemeStore};

use commands::account::{self, ProfileCommand};
use commands::countries::{self, ListArgs};
use commands::favorites::{self, FavoritesCommand};
use commands::Context;

#[derive(Parser, Debug)]
#[command(name = "globepeek", author, version, about = "Explore the world's countries from the terminal")]
struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Colour theme for text output (light or dark).
    #[arg(long, global = true, env = "GLOBEPEEK_THEME", default_value_t = Theme::Light)]
    theme: Theme,

    /// Where the signed-in session is stored.
    #[arg(long, global = true, env = "GLOBEPEEK_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Browse the country directory with optional filters.
    Countries(ListArgs),
    /// Country names containing the given text.
    Suggest { query: String },
    /// Country detail: facts, weather, neighbours, photos, video and sights.
    Show { name: String },
    /// Hero image, featured countries and video of the landing page.
    Landing,
    /// Create an account.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "GLOBEPEEK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "GLOBEPEEK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Print the URL that starts an OAuth sign-in.
    OauthUrl {
        /// Provider name, e.g. google or github.
        provider: String,
        #[arg(long)]
        redirect_to: Option<String>,
    },
    /// Sign out and forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Set a new password for the signed-in user.
    ChangePassword {
        #[arg(long, env = "GLOBEPEEK_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// View or edit the profile.
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Manage favorite countries.
    #[command(subcommand)]
    Favorites(FavoritesCommand),
    /// Subscribe an address to the newsletter.
    Subscribe { email: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let ctx = build_context(&cli)?;

    match cli.command {
        Command::Countries(args) => countries::list(&ctx, args).await,
        Command::Suggest { query } => countries::suggest(&ctx, &query).await,
        Command::Show { name } => countries::show(&ctx, &name).await,
        Command::Landing => countries::landing(&ctx).await,
        Command::Register { email, password } => account::register(&ctx, &email, &password).await,
        Command::Login { email, password } => account::login(&ctx, &email, &password).await,
        Command::OauthUrl {
            provider,
            redirect_to,
        } => account::oauth_url(&ctx, &provider, redirect_to.as_deref()),
        Command::Logout => account::logout(&ctx).await,
        Command::Whoami => account::whoami(&ctx).await,
        Command::ChangePassword { password } => account::change_password(&ctx, &password).await,
        Command::Profile(command) => account::profile(&ctx, command).await,
        Command::Favorites(command) => favorites::run(&ctx, command).await,
        Command::Subscribe { email } => account::subscribe(&ctx, &email).await,
    }
}

fn build_context(cli: &Cli) -> Result<Context> {
    let config = ApiConfig::from_env();
    let clients = ApiClients::new(&config).context("invalid GLOBEPEEK_* configuration")?;

    let path = match &cli.session_file {
        Some(path) => path.clone(),
        None => default_session_path()?,
    };
    let session_file = SessionFile::new(path);
    let session = SessionStore::new(session_file.load()?);

    Ok(Context {
        clients,
        session,
        theme: ThemeStore::new(cli.theme),
        session_file,
        format: cli.format,
    })
}

/// Logs go to stderr so stdout stays parseable.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
