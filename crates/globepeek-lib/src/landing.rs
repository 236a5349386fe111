//! Landing page content.

use futures::future::join_all;
use futures::join;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::clients::{CountryImage, CountrySource, MediaSource, Video};
use crate::country::Country;
use crate::detail::Section;

/// Search used for the hero banner.
pub const HERO_QUERY: &str = "world";

/// Country whose video is featured on the landing page.
pub const FEATURED_VIDEO_COUNTRY: &str = "Italy";

/// How many countries are featured.
pub const FEATURED_COUNT: usize = 4;

/// A featured country with one representative photo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeaturedCountry {
    pub country: Country,
    pub image: Option<CountryImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandingPage {
    pub hero: Section<CountryImage>,
    pub featured: Section<Vec<FeaturedCountry>>,
    pub video: Section<Video>,
}

fn featured_image_query(country: &Country) -> String {
    format!("Scenic tourist attractions in {}", country.name)
}

/// Pick `count` distinct countries at random.
pub fn pick_featured<R: Rng + ?Sized>(mut countries: Vec<Country>, count: usize, rng: &mut R) -> Vec<Country> {
    countries.shuffle(rng);
    countries.truncate(count);
    countries
}

/// Load the landing page. The hero, the featured countries and the video are
/// fetched concurrently; a featured country whose photo fails is still shown.
pub async fn load_landing<C, M>(countries: &C, media: &M) -> LandingPage
where
    C: CountrySource,
    M: MediaSource,
{
    let hero = async {
        let first = media
            .images(HERO_QUERY, 1)
            .await
            .map(|images| images.into_iter().next());
        Section::from_option("hero", first)
    };

    let featured = async {
        let all = match countries.all_countries().await {
            Ok(all) => all,
            Err(e) => return Section::from_list("featured", Err(e)),
        };
        // ThreadRng is not Send; keep it out of the await below.
        let picked = pick_featured(all, FEATURED_COUNT, &mut rand::rng());

        let with_images = picked.into_iter().map(|country| async move {
            let image = match media.images(&featured_image_query(&country), 1).await {
                Ok(images) => images.into_iter().next(),
                Err(e) => {
                    tracing::warn!(country = %country.name, error = %e, "featured image failed");
                    None
                }
            };
            FeaturedCountry { country, image }
        });
        Section::from_list("featured", Ok(join_all(with_images).await))
    };

    let video = async {
        Section::from_option(
            "video",
            media
                .video(&crate::clients::video::showcase_query(FEATURED_VIDEO_COUNTRY))
                .await,
        )
    };

    let (hero, featured, video) = join!(hero, featured, video);
    LandingPage {
        hero,
        featured,
        video,
    }
}
