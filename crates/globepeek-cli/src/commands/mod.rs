// Handlers for the CLI subcommands.
//
// main.rs parses arguments, builds the Context once and dispatches here. Each
// module covers one area: browsing countries, the account, favorites.

pub mod account;
pub mod countries;
pub mod favorites;

use anyhow::{Context as _, Result};
use serde::Serialize;

use globepeek_cli::output::{print_json, OutputFormat};
use globepeek_cli::session_file::SessionFile;
use globepeek_cli::terminal::ColorPalette;
use globepeek_lib::{ApiClients, Error as LibError, Session, SessionStore, ThemeStore};

/// Everything a command needs, built once in `main`.
pub struct Context {
    pub clients: ApiClients,
    pub session: SessionStore,
    pub theme: ThemeStore,
    pub session_file: SessionFile,
    pub format: OutputFormat,
}

impl Context {
    pub fn palette(&self) -> ColorPalette {
        ColorPalette::detect(self.theme.current())
    }

    /// The stored session, or an error telling the user to sign in.
    pub fn require_session(&self) -> Result<Session> {
        self.session
            .current()
            .ok_or(LibError::Unauthenticated)
            .context("run `globepeek login` first")
    }

    /// Persist `session` and make it current.
    pub fn sign_in(&self, session: Session) -> Result<()> {
        self.session_file.save(&session)?;
        self.session.sign_in(session);
        Ok(())
    }

    pub fn sign_out(&self) -> Result<()> {
        self.session_file.clear()?;
        self.session.sign_out();
        Ok(())
    }

    /// Print `value` as JSON, or the text built by `text`.
    pub fn emit<T, F>(&self, value: &T, text: F) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&ColorPalette) -> String,
    {
        match self.format {
            OutputFormat::Json => print_json(value).context("failed to write output")?,
            OutputFormat::Text => println!("{}", text(&self.palette())),
        }
        Ok(())
    }
}
