//! Globe Peek library entry points.
//!
//! This crate holds everything the country explorer does independently of
//! how it is presented: typed clients for the upstream APIs, the directory
//! filter and pagination rules, favorites aggregation, the concurrent detail
//! page loader, and the session store with its auth gate. The CLI and the
//! HTTP service should only depend on what is exported here instead of
//! reimplementing behavior.
//!

#![deny(warnings)]

pub mod clients;
pub mod config;
pub mod country;
pub mod detail;
pub mod directory;
pub mod error;
pub mod favorites;
pub mod landing;
pub mod profile;
pub mod routes;
pub mod session;
pub mod theme;

#[cfg(test)]
mod test_helpers;

pub use clients::supabase::SignUpOutcome;
pub use clients::{
    ApiClients, CountryImage, CountrySource, Destination, MediaSource, SupabaseClient, Video,
    Weather,
};
pub use config::ApiConfig;
pub use country::{Country, CountryCode, NameMatch};
pub use detail::{
    fetch_detail, load_detail, DetailEvent, DetailPage, Navigator, Section, SectionUpdate,
};
pub use directory::{Directory, DirectoryFilter, DirectoryPage, PageItem};
pub use error::{Error, Result};
pub use favorites::{
    add_favorite, aggregate_favorites, is_favorite, list_favorites, remove_favorite,
    resolve_favorites, toggle_favorite, FavoriteRow, FavoriteRows, FavoritesOutcome,
};
pub use landing::{load_landing, LandingPage};
pub use profile::{Profile, ProfileUpdate};
pub use routes::{navigate, ClientRoute};
pub use session::{AuthGate, GateDecision, GateState, Session, SessionEvent, SessionStore, User};
pub use theme::{Theme, ThemeStore};
