//! `favorites list|add|remove|toggle` for the signed-in user.

use anyhow::{Context as _, Result};
use serde::Serialize;

use globepeek_cli::output::format_favorites;
use globepeek_lib::{add_favorite, remove_favorite, resolve_favorites, toggle_favorite};

use super::Context;

#[derive(Debug, clap::Subcommand)]
pub enum FavoritesCommand {
    /// List favorites with their country records.
    List,
    /// Mark a country as favorite.
    Add { name: String },
    /// Remove a country from the favorites.
    Remove { name: String },
    /// Add the country if absent, remove it otherwise.
    Toggle { name: String },
}

#[derive(Debug, Serialize)]
struct FavoriteState<'a> {
    country_name: &'a str,
    favorite: bool,
}

pub async fn run(ctx: &Context, command: FavoritesCommand) -> Result<()> {
    let session = ctx.require_session()?;
    let supabase = &ctx.clients.supabase;

    let (name, favorite, changed) = match &command {
        FavoritesCommand::List => {
            let outcome = resolve_favorites(supabase, &ctx.clients, &session)
                .await
                .context("failed to load favorites")?;
            return ctx.emit(&outcome, |p| format_favorites(&outcome, p));
        }
        FavoritesCommand::Add { name } => {
            let added = add_favorite(supabase, &session, name)
                .await
                .with_context(|| format!("failed to add {name} to favorites"))?;
            (name, true, added)
        }
        FavoritesCommand::Remove { name } => {
            remove_favorite(supabase, &session, name)
                .await
                .with_context(|| format!("failed to remove {name} from favorites"))?;
            (name, false, true)
        }
        FavoritesCommand::Toggle { name } => {
            let favorite = toggle_favorite(supabase, &session, name)
                .await
                .with_context(|| format!("failed to toggle {name}"))?;
            (name, favorite, true)
        }
    };

    let name = name.trim();
    let state = FavoriteState {
        country_name: name,
        favorite,
    };
    ctx.emit(&state, |p| match (favorite, changed) {
        (true, true) => format!("{}{name} added to favorites.{}", p.ok, p.reset),
        (true, false) => format!("{name} is already a favorite."),
        (false, _) => format!("{name} removed from favorites."),
    })
}
