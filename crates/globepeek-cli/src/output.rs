//! Rendering of command results.
//!
//! Every command prints either JSON (one document, or one line per event for
//! streamed output) or human-readable text. The `format_*` functions build
//! the text form so it can be tested without capturing stdout.

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;

use globepeek_lib::clients::places::INITIAL_DESTINATIONS;
use globepeek_lib::detail::BorderCountry;
use globepeek_lib::{
    Country, CountryImage, Destination, FavoritesOutcome, LandingPage, PageItem, Profile,
    Section, SectionUpdate, User, Video, Weather,
};

use crate::terminal::{format_with_separators, ColorPalette};

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Write `value` as pretty JSON followed by a newline.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).map_err(io::Error::other)?;
    stdout.write_all(b"\n")
}

/// Write `value` as a single JSON line, for streamed events.
pub fn print_json_line<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value).map_err(io::Error::other)?;
    stdout.write_all(b"\n")?;
    stdout.flush()
}

/// One directory row: name, code, region, population and capital.
pub fn format_country_line(country: &Country, p: &ColorPalette) -> String {
    let capital = country.primary_capital().unwrap_or("-");
    format!(
        "{}{}{} {}({}){} {} | pop {} | capital {}",
        p.heading,
        country.name,
        p.reset,
        p.muted,
        country.code,
        p.reset,
        if country.region.is_empty() { "-" } else { country.region.as_str() },
        format_with_separators(country.population),
        capital
    )
}

/// The pagination control, with the current page in brackets.
pub fn format_pagination(items: &[PageItem], current: usize) -> String {
    items
        .iter()
        .map(|item| match item {
            PageItem::Page(n) if *n == current => format!("[{n}]"),
            PageItem::Page(n) => n.to_string(),
            PageItem::Ellipsis => "...".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A directory page: a header line, one row per country and the page control.
pub fn format_directory(
    countries: &[Country],
    page: usize,
    total_pages: usize,
    total_matches: usize,
    pagination: &[PageItem],
    p: &ColorPalette,
) -> String {
    if total_matches == 0 {
        return format!("{}No countries match.{}", p.warn, p.reset);
    }
    let mut lines = vec![format!(
        "{total_matches} countries (page {page} of {total_pages})"
    )];
    lines.extend(
        countries
            .iter()
            .map(|c| format!("  {}", format_country_line(c, p))),
    );
    lines.push(format!("Pages: {}", format_pagination(pagination, page)));
    lines.join("\n")
}

/// Full country record, as shown at the top of the detail view.
pub fn format_country_facts(country: &Country, p: &ColorPalette) -> String {
    let join = |values: Vec<&str>| {
        if values.is_empty() {
            "-".to_string()
        } else {
            values.join(", ")
        }
    };
    let mut lines = vec![
        format!(
            "{}{}{} {}({}){}",
            p.heading, country.name, p.reset, p.muted, country.code, p.reset
        ),
        format!("  Official name: {}", country.official_name),
        format!(
            "  Region:        {}{}",
            country.region,
            country
                .subregion
                .as_deref()
                .map(|s| format!(" / {s}"))
                .unwrap_or_default()
        ),
        format!("  Capital:       {}", join(country.capital.iter().map(String::as_str).collect())),
        format!("  Population:    {}", format_with_separators(country.population)),
        format!(
            "  Languages:     {}",
            join(country.languages.values().map(String::as_str).collect())
        ),
        format!(
            "  Currencies:    {}",
            join(country.currencies.values().map(|c| c.name.as_str()).collect())
        ),
    ];
    if let Some(area) = country.area {
        lines.push(format!("  Area:          {area:.0} km²"));
    }
    if let Some(flag) = country.flags.png.as_deref().or(country.flags.svg.as_deref()) {
        lines.push(format!("  Flag:          {}{flag}{}", p.accent, p.reset));
    }
    lines.join("\n")
}

fn format_weather(weather: &Weather) -> String {
    format!(
        "  {:.1}°C (feels like {:.1}°C), {}, humidity {:.0}%, wind {:.1} m/s",
        weather.temperature,
        weather.feels_like,
        weather.description,
        weather.humidity,
        weather.wind_speed
    )
}

fn format_images(images: &[CountryImage], p: &ColorPalette) -> String {
    images
        .iter()
        .map(|img| {
            format!(
                "  - {}{}{}{}",
                p.accent,
                img.regular_url,
                p.reset,
                img.alt_description
                    .as_deref()
                    .map(|alt| format!(" ({alt})"))
                    .unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_video(video: &Video, p: &ColorPalette) -> String {
    format!(
        "  {} by {}: {}{}{}",
        video.title,
        video.channel_title,
        p.accent,
        video.embed_url(),
        p.reset
    )
}

fn format_borders(borders: &[BorderCountry]) -> String {
    let names: Vec<String> = borders
        .iter()
        .map(|b| format!("{} ({})", b.name, b.code))
        .collect();
    format!("  {}", names.join(", "))
}

/// The first [`INITIAL_DESTINATIONS`] entries, then a count of the rest.
fn format_destinations(destinations: &[Destination]) -> String {
    let mut lines: Vec<String> = destinations
        .iter()
        .take(INITIAL_DESTINATIONS)
        .map(|d| match d.formatted_address.as_deref() {
            Some(address) => format!("  - {} ({address})", d.name),
            None => format!("  - {}", d.name),
        })
        .collect();
    let hidden = destinations.len().saturating_sub(INITIAL_DESTINATIONS);
    if hidden > 0 {
        lines.push(format!("  ... and {hidden} more"));
    }
    lines.join("\n")
}

fn format_section<T>(
    title: &str,
    section: &Section<T>,
    p: &ColorPalette,
    body: impl FnOnce(&T) -> String,
) -> String {
    let title = format!("{}{title}{}", p.heading, p.reset);
    match section {
        Section::Loading => format!("{title}: {}loading{}", p.muted, p.reset),
        Section::Empty => format!("{title}: {}none{}", p.muted, p.reset),
        Section::Failed(message) => {
            format!("{title}: {}unavailable ({message}){}", p.error, p.reset)
        }
        Section::Ready(value) => format!("{title}\n{}", body(value)),
    }
}

/// One detail section as it arrives.
pub fn format_section_update(update: &SectionUpdate, p: &ColorPalette) -> String {
    match update {
        SectionUpdate::Country(s) => match s {
            Section::Ready(country) => format_country_facts(country, p),
            other => format_section("Country", other, p, |_| String::new()),
        },
        SectionUpdate::Images(s) => format_section("Images", s, p, |v| format_images(v, p)),
        SectionUpdate::Video(s) => format_section("Video", s, p, |v| format_video(v, p)),
        SectionUpdate::Weather(s) => format_section("Weather at the capital", s, p, format_weather),
        SectionUpdate::Borders(s) => {
            format_section("Bordering countries", s, p, |v| format_borders(v))
        }
        SectionUpdate::Destinations(s) => {
            format_section("Top destinations", s, p, |v| format_destinations(v))
        }
    }
}

pub fn format_landing(page: &LandingPage, p: &ColorPalette) -> String {
    let hero = format_section("Hero", &page.hero, p, |img| format_images(std::slice::from_ref(img), p));
    let featured = format_section("Featured countries", &page.featured, p, |featured| {
        featured
            .iter()
            .map(|f| format!("  {}", format_country_line(&f.country, p)))
            .collect::<Vec<_>>()
            .join("\n")
    });
    let video = format_section("Video", &page.video, p, |v| format_video(v, p));
    [hero, featured, video].join("\n")
}

pub fn format_favorites(outcome: &FavoritesOutcome, p: &ColorPalette) -> String {
    let mut lines = Vec::new();
    if outcome.countries.is_empty() {
        lines.push(format!("{}No favorites yet.{}", p.muted, p.reset));
    }
    lines.extend(
        outcome
            .countries
            .iter()
            .map(|c| format!("  {}", format_country_line(c, p))),
    );
    lines.extend(outcome.failures.iter().map(|f| {
        format!(
            "  {}{}: could not be loaded ({}){}",
            p.warn, f.country_name, f.error, p.reset
        )
    }));
    lines.join("\n")
}

pub fn format_user(user: &User) -> String {
    match user.email.as_deref() {
        Some(email) => format!("{email} (id {})", user.id),
        None => format!("id {}", user.id),
    }
}

pub fn format_profile(profile: &Profile) -> String {
    let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    [
        format!("Full name: {}", show(&profile.full_name)),
        format!("Country:   {}", show(&profile.country)),
        format!("Avatar:    {}", show(&profile.avatar_url)),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::CountryBuilder;
    use globepeek_lib::favorites::FavoriteFailure;
    use globepeek_lib::CountryCode;

    const P: ColorPalette = ColorPalette::plain();

    #[test]
    fn country_line_has_population_separators() {
        let country = CountryBuilder::new("France", "FRA")
            .capital("Paris")
            .population(67_391_582)
            .build();
        assert_eq!(
            format_country_line(&country, &P),
            "France (FRA) Europe | pop 67,391,582 | capital Paris"
        );
    }

    #[test]
    fn country_line_without_capital() {
        let country = CountryBuilder::new("Antarctica", "ATA").region("").build();
        assert!(format_country_line(&country, &P).contains("capital -"));
    }

    #[test]
    fn pagination_marks_current_page() {
        let items = [
            PageItem::Page(1),
            PageItem::Ellipsis,
            PageItem::Page(4),
            PageItem::Page(5),
        ];
        assert_eq!(format_pagination(&items, 4), "1 ... [4] 5");
    }

    #[test]
    fn empty_directory_message() {
        assert_eq!(format_directory(&[], 1, 0, 0, &[], &P), "No countries match.");
    }

    #[test]
    fn directory_lists_rows_and_pages() {
        let countries = vec![
            CountryBuilder::new("France", "FRA").build(),
            CountryBuilder::new("Spain", "ESP").build(),
        ];
        let text = format_directory(&countries, 1, 1, 2, &[PageItem::Page(1)], &P);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "2 countries (page 1 of 1)");
        assert!(lines[1].starts_with("  France (FRA)"));
        assert_eq!(lines[3], "Pages: [1]");
    }

    #[test]
    fn failed_section_names_the_error() {
        let update = SectionUpdate::Weather(Section::Failed("openweather returned HTTP 404".into()));
        assert_eq!(
            format_section_update(&update, &P),
            "Weather at the capital: unavailable (openweather returned HTTP 404)"
        );
    }

    #[test]
    fn borders_section_lists_names_with_codes() {
        let update = SectionUpdate::Borders(Section::Ready(vec![
            BorderCountry {
                code: CountryCode::new("ESP").unwrap(),
                name: "Spain".into(),
            },
            BorderCountry {
                code: CountryCode::new("BEL").unwrap(),
                name: "Belgium".into(),
            },
        ]));
        assert_eq!(
            format_section_update(&update, &P),
            "Bordering countries\n  Spain (ESP), Belgium (BEL)"
        );
    }

    #[test]
    fn country_section_prints_facts() {
        let country = CountryBuilder::new("Spain", "ESP")
            .capital("Madrid")
            .language("spa", "Spanish")
            .build();
        let text = format_section_update(&SectionUpdate::Country(Section::Ready(country)), &P);
        assert!(text.starts_with("Spain (ESP)"));
        assert!(text.contains("Capital:       Madrid"));
        assert!(text.contains("Languages:     Spanish"));
    }

    #[test]
    fn favorites_show_failures() {
        let outcome = FavoritesOutcome {
            countries: vec![CountryBuilder::new("India", "IND").build()],
            failures: vec![FavoriteFailure {
                country_name: "Atlantis".into(),
                error: "not found".into(),
            }],
        };
        let text = format_favorites(&outcome, &P);
        assert!(text.contains("India (IND)"));
        assert!(text.contains("Atlantis: could not be loaded (not found)"));
    }

    #[test]
    fn profile_placeholders() {
        let profile = Profile::blank("u1");
        assert_eq!(
            format_profile(&profile),
            "Full name: -\nCountry:   -\nAvatar:    -"
        );
    }

    #[test]
    fn user_with_and_without_email() {
        let mut user = User {
            id: "u1".into(),
            email: Some("a@b.co".into()),
            created_at: None,
        };
        assert_eq!(format_user(&user), "a@b.co (id u1)");
        user.email = None;
        assert_eq!(format_user(&user), "id u1");
    }

    #[test]
    fn destinations_beyond_the_first_page_are_counted() {
        let destinations: Vec<Destination> = (1..=8)
            .map(|i| Destination {
                name: format!("Sight {i}"),
                formatted_address: None,
                categories: vec!["tourism".to_string()],
                lat: None,
                lon: None,
            })
            .collect();
        let text = format_destinations(&destinations);
        assert!(text.contains("Sight 6"));
        assert!(!text.contains("Sight 7"));
        assert!(text.ends_with("... and 2 more"));

        let short = format_destinations(&destinations[..2]);
        assert_eq!(short, "  - Sight 1\n  - Sight 2");
    }
}
