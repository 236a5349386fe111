//! Favorite countries: row operations and aggregation into country records.
//!
//! Rows only store the country *name* the user clicked. Turning them back
//! into records means one name lookup per row; the lookups run concurrently
//! and a failed one is reported without discarding the rest.

use std::collections::HashMap;
use std::future::Future;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clients::CountrySource;
use crate::country::{Country, NameMatch};
use crate::error::{Error, Result};
use crate::session::Session;

/// A row of the `favorites` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRow {
    #[serde(default)]
    pub user_id: String,
    pub country_name: String,
}

/// A favorite whose lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FavoriteFailure {
    pub country_name: String,
    pub error: String,
}

/// Result of resolving a user's favorites.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FavoritesOutcome {
    /// Resolved records, unique by code, in order of first appearance.
    pub countries: Vec<Country>,
    /// Rows that could not be resolved.
    pub failures: Vec<FavoriteFailure>,
}

/// Storage for favorite rows, scoped to the session's user.
pub trait FavoriteRows {
    fn list(&self, session: &Session) -> impl Future<Output = Result<Vec<FavoriteRow>>> + Send;

    fn contains(&self, session: &Session, name: &str) -> impl Future<Output = Result<bool>> + Send;

    fn insert(&self, session: &Session, name: &str) -> impl Future<Output = Result<()>> + Send;

    fn delete(&self, session: &Session, name: &str) -> impl Future<Output = Result<()>> + Send;
}

fn country_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::invalid_input("country name must not be empty"));
    }
    Ok(name)
}

pub async fn list_favorites<R: FavoriteRows>(rows: &R, session: &Session) -> Result<Vec<FavoriteRow>> {
    rows.list(session).await
}

pub async fn is_favorite<R: FavoriteRows>(rows: &R, session: &Session, name: &str) -> Result<bool> {
    rows.contains(session, country_name(name)?).await
}

/// Add a favorite. Adding one that already exists is a no-op; returns whether
/// a row was inserted.
pub async fn add_favorite<R: FavoriteRows>(rows: &R, session: &Session, name: &str) -> Result<bool> {
    let name = country_name(name)?;
    if rows.contains(session, name).await? {
        debug!(country = name, "already a favorite");
        return Ok(false);
    }
    rows.insert(session, name).await?;
    Ok(true)
}

pub async fn remove_favorite<R: FavoriteRows>(rows: &R, session: &Session, name: &str) -> Result<()> {
    rows.delete(session, country_name(name)?).await
}

/// Flip the favorite state of `name`; returns the new state.
pub async fn toggle_favorite<R: FavoriteRows>(rows: &R, session: &Session, name: &str) -> Result<bool> {
    let name = country_name(name)?;
    if rows.contains(session, name).await? {
        rows.delete(session, name).await?;
        Ok(false)
    } else {
        rows.insert(session, name).await?;
        Ok(true)
    }
}

/// Resolve favorite rows into country records.
///
/// Every name is looked up concurrently and all matches are kept. The results
/// are flattened in row order and deduplicated by code: a later record for a
/// code replaces the earlier one but keeps its position.
pub async fn aggregate_favorites<S: CountrySource>(source: &S, rows: &[FavoriteRow]) -> FavoritesOutcome {
    let lookups = rows.iter().map(|row| async move {
        let name = row.country_name.as_str();
        let result = source
            .countries_by_name(name)
            .await
            .map(|matches| NameMatch::All.select(name, matches));
        (name, result)
    });

    let mut outcome = FavoritesOutcome::default();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (name, result) in join_all(lookups).await {
        match result {
            Ok(matches) => {
                for country in matches {
                    match positions.get(country.code.as_str()) {
                        Some(&index) => outcome.countries[index] = country,
                        None => {
                            positions.insert(country.code.to_string(), outcome.countries.len());
                            outcome.countries.push(country);
                        }
                    }
                }
            }
            Err(e) => {
                warn!(country = name, error = %e, "favorite lookup failed");
                outcome.failures.push(FavoriteFailure {
                    country_name: name.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    debug!(
        rows = rows.len(),
        resolved = outcome.countries.len(),
        failed = outcome.failures.len(),
        "favorites aggregated"
    );
    outcome
}

/// List the session user's favorites and resolve them.
pub async fn resolve_favorites<R, S>(rows: &R, source: &S, session: &Session) -> Result<FavoritesOutcome>
where
    R: FavoriteRows,
    S: CountrySource,
{
    let rows = rows.list(session).await?;
    Ok(aggregate_favorites(source, &rows).await)
}
