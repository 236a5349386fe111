//! Country directory: search, filters, and pagination over the full list.
//!
//! The directory is fetched once and every query is answered locally, so
//! filtering can be recomputed on each keystroke without touching the
//! network. Source order is preserved throughout; nothing is re-sorted.

use serde::{Deserialize, Serialize};

use crate::country::Country;

/// Number of countries shown per directory page.
pub const PAGE_SIZE: usize = 20;

/// Number of numbered page buttons around the current page.
pub const MAX_VISIBLE_PAGES: usize = 5;

/// Number of search-as-you-type suggestions.
pub const SUGGESTION_LIMIT: usize = 5;

const FUZZY_THRESHOLD: f64 = 0.8;

/// Active predicates for a directory query. Empty or absent values are
/// inactive and match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryFilter {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl DirectoryFilter {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Whether `country` satisfies every active predicate.
    pub fn matches(&self, country: &Country) -> bool {
        let query = self.query.trim().to_lowercase();
        let name_ok = query.is_empty() || country.name.to_lowercase().contains(&query);
        let region_ok = active(&self.region).is_none_or(|r| country.region == r);
        let language_ok = active(&self.language).is_none_or(|l| country.speaks(l));
        name_ok && region_ok && language_ok
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// One entry of the pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "page", rename_all = "snake_case")]
pub enum PageItem {
    Page(usize),
    Ellipsis,
}

/// A single page of filtered directory results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryPage<'a> {
    pub page: usize,
    pub total_pages: usize,
    pub total_matches: usize,
    pub countries: &'a [Country],
    pub pagination: Vec<PageItem>,
}

/// Number of pages needed for `len` items.
pub fn total_pages(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE)
}

/// The `PAGE_SIZE` slice for 1-based page `page`; empty when out of range.
pub fn page_slice(countries: &[Country], page: usize) -> &[Country] {
    if page == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(PAGE_SIZE);
    if start >= countries.len() {
        return &[];
    }
    let end = (start + PAGE_SIZE).min(countries.len());
    &countries[start..end]
}

/// Sliding window of page numbers around `current` with ellipses.
///
/// The first and last page are always present exactly once. Page numbers are
/// strictly increasing and an ellipsis only stands in for at least one
/// skipped page.
pub fn pagination_range(current: usize, total: usize, max_visible: usize) -> Vec<PageItem> {
    if total == 0 {
        return Vec::new();
    }
    if total == 1 {
        return vec![PageItem::Page(1)];
    }

    let current = current.clamp(1, total);
    let delta = max_visible / 2;
    let mut start = current.saturating_sub(delta).max(2);
    let mut end = (current + delta).min(total - 1);

    if current <= delta {
        end = max_visible.min(total - 1);
    }
    if current + delta >= total {
        start = (total + 1).saturating_sub(max_visible).max(2);
    }

    let mut range = Vec::with_capacity(max_visible + 4);
    range.push(PageItem::Page(1));
    if start > 2 {
        range.push(PageItem::Ellipsis);
    }
    range.extend((start..=end).map(PageItem::Page));
    if end < total - 1 {
        range.push(PageItem::Ellipsis);
    }
    range.push(PageItem::Page(total));
    range
}

/// The full country list plus the derived option lists.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    countries: Vec<Country>,
}

impl Directory {
    pub fn new(countries: Vec<Country>) -> Self {
        Self { countries }
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// Countries matching every active predicate, in source order.
    pub fn filter(&self, filter: &DirectoryFilter) -> Vec<Country> {
        self.countries
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect()
    }

    /// Distinct non-empty regions in first-seen order.
    pub fn regions(&self) -> Vec<String> {
        distinct(self.countries.iter().map(|c| c.region.as_str()))
    }

    /// Distinct language names in first-seen order.
    pub fn languages(&self) -> Vec<String> {
        distinct(
            self.countries
                .iter()
                .flat_map(|c| c.languages.values().map(String::as_str)),
        )
    }

    /// Up to `limit` common names containing `query`, case-insensitively.
    pub fn suggestions(&self, query: &str, limit: usize) -> Vec<String> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.countries
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&query))
            .map(|c| c.name.clone())
            .take(limit)
            .collect()
    }

    /// Names similar to `name`, best first, for "did you mean" hints.
    pub fn fuzzy_matches(&self, name: &str, limit: usize) -> Vec<String> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let mut scored: Vec<(f64, &str)> = self
            .countries
            .iter()
            .map(|c| {
                let score = strsim::jaro_winkler(&needle, &c.name.to_lowercase());
                (score, c.name.as_str())
            })
            .filter(|(score, _)| *score >= FUZZY_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, name)| name.to_string())
            .collect()
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

/// Filter and paginate in one step; the result borrows `filtered`.
///
/// `page` is clamped into `1..=total_pages` so navigation controls never land
/// on an empty page while matches exist.
pub fn page_of(filtered: &[Country], page: usize) -> DirectoryPage<'_> {
    let total = total_pages(filtered.len());
    let page = page.clamp(1, total.max(1));
    DirectoryPage {
        page,
        total_pages: total,
        total_matches: filtered.len(),
        countries: page_slice(filtered, page),
        pagination: pagination_range(page, total, MAX_VISIBLE_PAGES),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country::fixtures::country;
    use std::collections::HashSet;

    fn numbered(n: usize) -> Vec<Country> {
        (0..n)
            .map(|i| {
                let code: String = [b'A' + (i / 26 % 26) as u8, b'A' + (i % 26) as u8, b'X']
                    .iter()
                    .map(|&b| b as char)
                    .collect();
                country(&code, &format!("Country {i:02}"), "Europe", &["English"])
            })
            .collect()
    }

    fn sample() -> Directory {
        Directory::new(vec![
            country("FRA", "France", "Europe", &["French"]),
            country("BEL", "Belgium", "Europe", &["Dutch", "French", "German"]),
            country("CAN", "Canada", "Americas", &["English", "French"]),
            country("JPN", "Japan", "Asia", &["Japanese"]),
            country("IRL", "Ireland", "Europe", &["English", "Irish"]),
        ])
    }

    fn pages(items: &[PageItem]) -> Vec<usize> {
        items
            .iter()
            .filter_map(|i| match i {
                PageItem::Page(p) => Some(*p),
                PageItem::Ellipsis => None,
            })
            .collect()
    }

    #[test]
    fn empty_filter_matches_all() {
        let dir = sample();
        assert_eq!(dir.filter(&DirectoryFilter::default()).len(), 5);
    }

    #[test]
    fn name_filter_is_case_insensitive_substring() {
        let dir = sample();
        let names: Vec<_> = dir
            .filter(&DirectoryFilter::new("AN"))
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["France", "Canada", "Japan", "Ireland"]);
    }

    #[test]
    fn filters_intersect() {
        let dir = sample();
        for query in ["", "a", "an", "x"] {
            for region in [None, Some("Europe"), Some("Asia")] {
                for language in [None, Some("French"), Some("English")] {
                    let mut filter = DirectoryFilter::new(query);
                    filter.region = region.map(str::to_string);
                    filter.language = language.map(str::to_string);

                    let got: HashSet<_> =
                        dir.filter(&filter).into_iter().map(|c| c.code).collect();
                    let by_name: HashSet<_> = dir
                        .filter(&DirectoryFilter::new(query))
                        .into_iter()
                        .map(|c| c.code)
                        .collect();
                    let by_region: HashSet<_> = dir
                        .countries()
                        .iter()
                        .filter(|c| region.is_none_or(|r| c.region == r))
                        .map(|c| c.code.clone())
                        .collect();
                    let by_language: HashSet<_> = dir
                        .countries()
                        .iter()
                        .filter(|c| language.is_none_or(|l| c.speaks(l)))
                        .map(|c| c.code.clone())
                        .collect();
                    let expected: HashSet<_> = by_name
                        .intersection(&by_region)
                        .cloned()
                        .collect::<HashSet<_>>()
                        .intersection(&by_language)
                        .cloned()
                        .collect();
                    assert_eq!(got, expected, "{query:?} {region:?} {language:?}");
                }
            }
        }
    }

    #[test]
    fn blank_region_is_inactive() {
        let dir = sample();
        let filter = DirectoryFilter::default().with_region("  ");
        assert_eq!(dir.filter(&filter).len(), 5);
    }

    #[test]
    fn forty_five_countries_make_three_pages() {
        let all = numbered(45);
        assert_eq!(total_pages(all.len()), 3);

        let first = page_slice(&all, 1);
        assert_eq!(first.len(), 20);
        assert_eq!(first[0].name, "Country 00");
        assert_eq!(first[19].name, "Country 19");

        let last = page_slice(&all, 3);
        assert_eq!(last.len(), 5);
        assert_eq!(last[0].name, "Country 40");
        assert_eq!(last[4].name, "Country 44");

        assert!(page_slice(&all, 0).is_empty());
        assert!(page_slice(&all, 4).is_empty());
    }

    #[test]
    fn every_page_matches_slice_bounds() {
        let all = numbered(61);
        for p in 1..=total_pages(all.len()) {
            let start = (p - 1) * PAGE_SIZE;
            let end = (p * PAGE_SIZE).min(all.len());
            assert_eq!(page_slice(&all, p), &all[start..end]);
        }
    }

    #[test]
    fn pagination_range_edges() {
        assert!(pagination_range(1, 0, 5).is_empty());
        assert_eq!(pagination_range(1, 1, 5), vec![PageItem::Page(1)]);
        assert_eq!(
            pagination_range(1, 3, 5),
            vec![PageItem::Page(1), PageItem::Page(2), PageItem::Page(3)]
        );
    }

    #[test]
    fn pagination_range_windows() {
        use PageItem::{Ellipsis, Page};

        assert_eq!(
            pagination_range(1, 10, 5),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Ellipsis, Page(10)]
        );
        assert_eq!(
            pagination_range(5, 10, 5),
            vec![Page(1), Ellipsis, Page(3), Page(4), Page(5), Page(6), Page(7), Ellipsis, Page(10)]
        );
        assert_eq!(
            pagination_range(10, 10, 5),
            vec![Page(1), Ellipsis, Page(6), Page(7), Page(8), Page(9), Page(10)]
        );
    }

    #[test]
    fn pagination_range_invariants() {
        for total in 1..=25 {
            for current in 0..=total + 1 {
                let items = pagination_range(current, total, MAX_VISIBLE_PAGES);
                let numbers = pages(&items);

                assert_eq!(numbers.first(), Some(&1));
                assert_eq!(numbers.last(), Some(&total));
                assert_eq!(numbers.iter().filter(|&&p| p == 1).count(), 1);
                assert_eq!(numbers.iter().filter(|&&p| p == total).count(), 1);
                assert!(numbers.windows(2).all(|w| w[0] < w[1]), "{numbers:?}");

                for pair in items.windows(3) {
                    if let [PageItem::Page(a), PageItem::Ellipsis, PageItem::Page(b)] = pair {
                        assert!(b - a > 1, "ellipsis hides nothing in {items:?}");
                    }
                }
                if (1..=total).contains(&current) {
                    assert!(numbers.contains(&current));
                }
            }
        }
    }

    #[test]
    fn page_of_clamps_out_of_range_pages() {
        let all = numbered(45);
        let page = page_of(&all, 9);
        assert_eq!(page.page, 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_matches, 45);
        assert_eq!(page.countries.len(), 5);

        let empty = page_of(&[], 2);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.total_pages, 0);
        assert!(empty.countries.is_empty());
        assert!(empty.pagination.is_empty());
    }

    #[test]
    fn option_lists_are_distinct_in_first_seen_order() {
        let dir = sample();
        assert_eq!(dir.regions(), vec!["Europe", "Americas", "Asia"]);
        assert_eq!(
            dir.languages(),
            vec!["French", "Dutch", "German", "English", "Japanese", "Irish"]
        );
    }

    #[test]
    fn suggestions_are_limited_and_match_query() {
        let dir = Directory::new(numbered(30));
        let suggestions = dir.suggestions("country", SUGGESTION_LIMIT);
        assert_eq!(suggestions.len(), 5);
        assert!(suggestions
            .iter()
            .all(|s| s.to_lowercase().contains("country")));
        assert!(dir.suggestions("", SUGGESTION_LIMIT).is_empty());
        assert!(dir.suggestions("zzz", SUGGESTION_LIMIT).is_empty());
    }

    #[test]
    fn fuzzy_matches_suggest_close_names() {
        let dir = sample();
        let hits = dir.fuzzy_matches("Frnace", 3);
        assert_eq!(hits.first().map(String::as_str), Some("France"));
        assert!(dir.fuzzy_matches("Qwxyz", 3).is_empty());
        assert!(dir.fuzzy_matches("Irland", 1).len() <= 1);
    }
}
