//! Country detail page: concurrent section loading with per-section status.
//!
//! Opening a country starts three independent fetches (the country record,
//! images, the showcase video). Once the record arrives, three more start
//! from it (weather at the capital, border country names, nearby
//! destinations) while the first batch may still be running. Every fetch
//! reports into its own [`Section`]; one failing never blocks or hides the
//! others.
//!
//! Progress is published as [`DetailEvent`]s on a bounded channel. Events
//! carry the navigation generation they were started under, and
//! [`DetailPage::apply`] drops those from a superseded navigation.

use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::join_all;
use futures::join;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::clients::video::showcase_query;
use crate::clients::{CountryImage, CountrySource, Destination, MediaSource, Video, Weather};
use crate::country::{Country, CountryCode, NameMatch};
use crate::error::{Error, Result};

/// Gallery size on the detail page.
pub const DETAIL_IMAGE_COUNT: u32 = 5;

/// Capacity of the section update channel. Small: there are six sections.
pub const EVENT_BUFFER: usize = 8;

/// Load status of one part of a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Section<T> {
    Loading,
    Ready(T),
    /// The fetch succeeded but there is nothing to show.
    Empty,
    Failed(String),
}

impl<T> Section<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Section::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Section::Failed(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(value) => Some(value),
            _ => None,
        }
    }

    fn failed(section: &'static str, error: &Error) -> Self {
        warn!(section, error = %error, "detail section failed");
        Section::Failed(error.to_string())
    }

    pub(crate) fn from_result(section: &'static str, result: Result<T>) -> Self {
        match result {
            Ok(value) => Section::Ready(value),
            Err(e) => Self::failed(section, &e),
        }
    }

    pub(crate) fn from_option(section: &'static str, result: Result<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => Section::Ready(value),
            Ok(None) => Section::Empty,
            Err(e) => Self::failed(section, &e),
        }
    }
}

impl<T> Section<Vec<T>> {
    pub(crate) fn from_list(section: &'static str, result: Result<Vec<T>>) -> Self {
        match result {
            Ok(items) if items.is_empty() => Section::Empty,
            Ok(items) => Section::Ready(items),
            Err(e) => Self::failed(section, &e),
        }
    }
}

/// A neighbouring country, resolved from a border code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BorderCountry {
    pub code: CountryCode,
    pub name: String,
}

/// One section's new state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "section", content = "result", rename_all = "snake_case")]
pub enum SectionUpdate {
    Country(Section<Country>),
    Images(Section<Vec<CountryImage>>),
    Video(Section<Video>),
    Weather(Section<Weather>),
    Borders(Section<Vec<BorderCountry>>),
    Destinations(Section<Vec<Destination>>),
}

impl SectionUpdate {
    pub fn name(&self) -> &'static str {
        match self {
            SectionUpdate::Country(_) => "country",
            SectionUpdate::Images(_) => "images",
            SectionUpdate::Video(_) => "video",
            SectionUpdate::Weather(_) => "weather",
            SectionUpdate::Borders(_) => "borders",
            SectionUpdate::Destinations(_) => "destinations",
        }
    }
}

/// A section update tagged with the navigation it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailEvent {
    pub generation: u64,
    pub update: SectionUpdate,
}

/// Hands out navigation generations. Starting a new navigation makes every
/// earlier generation stale.
#[derive(Debug, Default)]
pub struct Navigator {
    generation: AtomicU64,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a navigation and return its generation.
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

/// Everything the detail view shows for one country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailPage {
    /// The name the page was opened with.
    pub name: String,
    #[serde(skip)]
    pub generation: u64,
    pub country: Section<Country>,
    pub images: Section<Vec<CountryImage>>,
    pub video: Section<Video>,
    pub weather: Section<Weather>,
    pub borders: Section<Vec<BorderCountry>>,
    pub destinations: Section<Vec<Destination>>,
}

impl DetailPage {
    /// A page with every section loading.
    pub fn new(name: &str, generation: u64) -> Self {
        Self {
            name: name.to_string(),
            generation,
            country: Section::Loading,
            images: Section::Loading,
            video: Section::Loading,
            weather: Section::Loading,
            borders: Section::Loading,
            destinations: Section::Loading,
        }
    }

    /// Apply an update. Events from another generation are ignored; returns
    /// whether the page changed.
    pub fn apply(&mut self, event: DetailEvent) -> bool {
        if event.generation != self.generation {
            debug!(
                page = self.generation,
                event = event.generation,
                "dropping stale detail event"
            );
            return false;
        }
        match event.update {
            SectionUpdate::Country(s) => self.country = s,
            SectionUpdate::Images(s) => self.images = s,
            SectionUpdate::Video(s) => self.video = s,
            SectionUpdate::Weather(s) => self.weather = s,
            SectionUpdate::Borders(s) => self.borders = s,
            SectionUpdate::Destinations(s) => self.destinations = s,
        }
        true
    }

    /// True once no section is still loading.
    pub fn is_complete(&self) -> bool {
        !(self.country.is_loading()
            || self.images.is_loading()
            || self.video.is_loading()
            || self.weather.is_loading()
            || self.borders.is_loading()
            || self.destinations.is_loading())
    }

    /// The record lookup found no such country.
    pub fn is_not_found(&self) -> bool {
        matches!(self.country, Section::Empty)
    }
}

async fn emit(tx: &mpsc::Sender<DetailEvent>, generation: u64, update: SectionUpdate) {
    let section = update.name();
    if tx.send(DetailEvent { generation, update }).await.is_err() {
        debug!(section, generation, "detail receiver gone, dropping update");
    }
}

/// Look a country up by name for the detail page: exact name match if the
/// upstream returned one, otherwise its first result.
pub async fn lookup_country<C: CountrySource>(countries: &C, name: &str) -> Result<Option<Country>> {
    match countries.countries_by_name(name).await {
        Ok(matches) => Ok(NameMatch::PreferExact.select(name, matches).into_iter().next()),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Resolve border codes to names concurrently. Codes that fail to resolve
/// are skipped; the section only fails if every lookup did.
async fn resolve_borders<C: CountrySource>(countries: &C, codes: &[CountryCode]) -> Result<Vec<BorderCountry>> {
    let lookups = codes.iter().map(|code| countries.country_by_code(code));
    let mut resolved = Vec::with_capacity(codes.len());
    let mut last_error = None;

    for (code, result) in codes.iter().zip(join_all(lookups).await) {
        match result {
            Ok(country) => resolved.push(BorderCountry {
                code: country.code,
                name: country.name,
            }),
            Err(e) => {
                warn!(code = %code, error = %e, "border lookup failed");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if resolved.is_empty() => Err(e),
        _ => Ok(resolved),
    }
}

/// Fetch every section of the detail page for `name`, publishing each as it
/// completes. Returns when all sections have been sent. Nothing is spawned:
/// dropping the future cancels every fetch still in flight.
pub async fn load_detail<C, M>(
    countries: &C,
    media: &M,
    name: &str,
    generation: u64,
    tx: mpsc::Sender<DetailEvent>,
) where
    C: CountrySource,
    M: MediaSource,
{
    let tx = &tx;
    let name = name.trim();

    let images = async {
        let section = Section::from_list("images", media.images(name, DETAIL_IMAGE_COUNT).await);
        emit(tx, generation, SectionUpdate::Images(section)).await;
    };

    let video = async {
        let section = Section::from_option("video", media.video(&showcase_query(name)).await);
        emit(tx, generation, SectionUpdate::Video(section)).await;
    };

    let record = async {
        let country = match lookup_country(countries, name).await {
            Ok(Some(country)) => country,
            outcome => {
                let section = match outcome {
                    Err(e) => Section::failed("country", &e),
                    _ => Section::Empty,
                };
                emit(tx, generation, SectionUpdate::Country(section)).await;
                // Nothing to derive the dependent sections from.
                emit(tx, generation, SectionUpdate::Weather(Section::Empty)).await;
                emit(tx, generation, SectionUpdate::Borders(Section::Empty)).await;
                emit(tx, generation, SectionUpdate::Destinations(Section::Empty)).await;
                return;
            }
        };
        debug!(code = %country.code, "detail record resolved");

        let weather = async {
            let section = match country.primary_capital() {
                Some(capital) => Section::from_result("weather", media.weather(capital).await),
                None => Section::Empty,
            };
            emit(tx, generation, SectionUpdate::Weather(section)).await;
        };

        let borders = async {
            let section = if country.borders.is_empty() {
                Section::Empty
            } else {
                Section::from_list("borders", resolve_borders(countries, &country.borders).await)
            };
            emit(tx, generation, SectionUpdate::Borders(section)).await;
        };

        let destinations = async {
            let section = match country.latlng {
                Some(at) => {
                    Section::from_list("destinations", media.destinations(at.lat, at.lng).await)
                }
                None => Section::Empty,
            };
            emit(tx, generation, SectionUpdate::Destinations(section)).await;
        };

        emit(tx, generation, SectionUpdate::Country(Section::Ready(country.clone()))).await;
        join!(weather, borders, destinations);
    };

    join!(images, video, record);
}

/// Load the whole detail page and return it once every section settled.
pub async fn fetch_detail<C, M>(countries: &C, media: &M, name: &str) -> DetailPage
where
    C: CountrySource,
    M: MediaSource,
{
    const GENERATION: u64 = 1;

    let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
    let mut page = DetailPage::new(name.trim(), GENERATION);

    let apply = async {
        while let Some(event) = rx.recv().await {
            page.apply(event);
        }
    };
    join!(load_detail(countries, media, name, GENERATION, tx), apply);

    page
}
