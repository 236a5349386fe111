//! Browsing: `countries`, `suggest`, `show` and `landing`.

use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use tokio::sync::mpsc;

use globepeek_cli::output::{
    format_directory, format_landing, format_section_update, print_json_line, OutputFormat,
};
use globepeek_lib::detail::EVENT_BUFFER;
use globepeek_lib::directory::{page_of, SUGGESTION_LIMIT};
use globepeek_lib::{
    load_detail, load_landing, Country, DetailEvent, DetailPage, Directory, DirectoryFilter,
    Error as LibError, Navigator, PageItem,
};

use super::Context;

/// How many "did you mean" names `show` offers for an unknown country.
const NOT_FOUND_SUGGESTIONS: usize = 3;

#[derive(Debug, clap::Args)]
pub struct ListArgs {
    /// Case-insensitive substring of the country name.
    #[arg(long, short = 'q', default_value = "")]
    pub query: String,
    /// Only countries in this region (e.g. Europe).
    #[arg(long)]
    pub region: Option<String>,
    /// Only countries where this language is spoken (e.g. Spanish).
    #[arg(long)]
    pub language: Option<String>,
    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    pub page: usize,
}

#[derive(Debug, Serialize)]
struct DirectoryView<'a> {
    page: usize,
    total_pages: usize,
    total_matches: usize,
    countries: &'a [Country],
    pagination: &'a [PageItem],
    regions: Vec<String>,
    languages: Vec<String>,
}

async fn load_directory(ctx: &Context) -> Result<Directory> {
    let countries = ctx
        .clients
        .countries
        .all()
        .await
        .context("failed to load the country list")?;
    Ok(Directory::new(countries))
}

pub async fn list(ctx: &Context, args: ListArgs) -> Result<()> {
    if args.page == 0 {
        bail!("--page starts at 1");
    }
    let directory = load_directory(ctx).await?;

    let mut filter = DirectoryFilter::new(args.query);
    if let Some(region) = args.region {
        filter = filter.with_region(region);
    }
    if let Some(language) = args.language {
        filter = filter.with_language(language);
    }
    let filtered = directory.filter(&filter);
    let page = page_of(&filtered, args.page);
    tracing::debug!(matches = page.total_matches, page = page.page, "directory filtered");

    let view = DirectoryView {
        page: page.page,
        total_pages: page.total_pages,
        total_matches: page.total_matches,
        countries: page.countries,
        pagination: &page.pagination,
        regions: directory.regions(),
        languages: directory.languages(),
    };
    ctx.emit(&view, |p| {
        format_directory(
            view.countries,
            view.page,
            view.total_pages,
            view.total_matches,
            view.pagination,
            p,
        )
    })
}

pub async fn suggest(ctx: &Context, query: &str) -> Result<()> {
    let suggestions = if query.trim().is_empty() {
        Vec::new()
    } else {
        load_directory(ctx).await?.suggestions(query, SUGGESTION_LIMIT)
    };
    ctx.emit(&suggestions, |_| suggestions.join("\n"))
}

/// Print each detail section as it arrives. Fails when the country does not
/// exist, after offering similar names.
pub async fn show(ctx: &Context, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("country name must not be empty");
    }

    let navigator = Navigator::new();
    let generation = navigator.begin();
    let mut page = DetailPage::new(name, generation);
    let (tx, mut rx) = mpsc::channel::<DetailEvent>(EVENT_BUFFER);
    let palette = ctx.palette();

    let render = async {
        while let Some(event) = rx.recv().await {
            let update = event.update.clone();
            if !page.apply(event) {
                continue;
            }
            match ctx.format {
                OutputFormat::Json => print_json_line(&update).context("failed to write output")?,
                OutputFormat::Text => println!("{}\n", format_section_update(&update, &palette)),
            }
        }
        anyhow::Ok(())
    };
    let clients = &ctx.clients;
    let ((), rendered) = tokio::join!(load_detail(clients, clients, name, generation, tx), render);
    rendered?;

    if page.is_not_found() {
        let suggestions = match clients.countries.all().await {
            Ok(all) => Directory::new(all).fuzzy_matches(name, NOT_FOUND_SUGGESTIONS),
            Err(e) => {
                tracing::warn!(error = %e, "could not load suggestions");
                Vec::new()
            }
        };
        return Err(LibError::CountryNotFound {
            name: name.to_string(),
            suggestions,
        }
        .into());
    }
    Ok(())
}

pub async fn landing(ctx: &Context) -> Result<()> {
    let page = load_landing(&ctx.clients, &ctx.clients).await;
    ctx.emit(&page, |p| format_landing(&page, p))
}
