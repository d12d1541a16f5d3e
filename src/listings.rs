//! In-memory search over the listing catalogue: filter, then paginate, then
//! build the compact page-number strip shown under the results.

use serde::Deserialize;

use crate::models::{Listing, ListingPage, PageMarker};

pub const DEFAULT_MIN_PRICE: f64 = 0.0;
pub const DEFAULT_MAX_PRICE: f64 = 50_000.0;
pub const DEFAULT_PER_PAGE: usize = 8;

/// Strips longer than this collapse into ellipses.
const MAX_VISIBLE_PAGES: usize = 5;

/// ListingQuery
///
/// Query parameters for GET /api/listings/search. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListingQuery {
    /// Case-insensitive substring of the listing location.
    pub location: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// `any` or an exact bedroom count.
    pub bedrooms: Option<String>,
    /// 1-based page number.
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl ListingQuery {
    fn matches(&self, listing: &Listing) -> bool {
        let location_match = match self.location.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => listing
                .location
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        };

        let min = self.min_price.unwrap_or(DEFAULT_MIN_PRICE);
        let max = self.max_price.unwrap_or(DEFAULT_MAX_PRICE);
        let price_match = listing.rent_amount >= min && listing.rent_amount <= max;

        let bedrooms_match = match self.bedrooms.as_deref() {
            None | Some("") | Some("any") => true,
            Some(count) => listing.bedrooms.to_string() == count,
        };

        location_match && price_match && bedrooms_match
    }

    fn per_page(&self) -> usize {
        match self.per_page {
            Some(0) | None => DEFAULT_PER_PAGE,
            Some(n) => n,
        }
    }
}

pub fn filter_listings(listings: &[Listing], query: &ListingQuery) -> Vec<Listing> {
    listings
        .iter()
        .filter(|listing| query.matches(listing))
        .cloned()
        .collect()
}

/// page_numbers
///
/// All pages when there are few of them, otherwise the first and last page around
/// a window on the current page, with `Ellipsis` marking the gaps.
pub fn page_numbers(current: usize, total: usize) -> Vec<PageMarker> {
    if total <= MAX_VISIBLE_PAGES {
        return (1..=total).map(PageMarker::Page).collect();
    }

    let mut strip = Vec::with_capacity(MAX_VISIBLE_PAGES + 2);
    if current <= 3 {
        strip.extend((1..=4).map(PageMarker::Page));
        strip.push(PageMarker::Ellipsis);
        strip.push(PageMarker::Page(total));
    } else if current >= total - 2 {
        strip.push(PageMarker::Page(1));
        strip.push(PageMarker::Ellipsis);
        strip.extend((total - 3..=total).map(PageMarker::Page));
    } else {
        strip.push(PageMarker::Page(1));
        strip.push(PageMarker::Ellipsis);
        strip.extend((current - 1..=current + 1).map(PageMarker::Page));
        strip.push(PageMarker::Ellipsis);
        strip.push(PageMarker::Page(total));
    }
    strip
}

/// search
///
/// Applies the query to the full catalogue and cuts out the requested page.
/// A page past the end comes back empty rather than clamped.
pub fn search(listings: &[Listing], query: &ListingQuery) -> ListingPage {
    let filtered = filter_listings(listings, query);
    let per_page = query.per_page();
    let page = query.page.unwrap_or(1).max(1);

    let total_items = filtered.len();
    let total_pages = total_items.div_ceil(per_page);

    let items = filtered
        .into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .collect();

    ListingPage {
        items,
        page,
        total_pages,
        total_items,
        page_numbers: page_numbers(page, total_pages),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageMarker::{Ellipsis, Page};

    fn listing(id: &str, location: &str, rent: f64, bedrooms: u32) -> Listing {
        Listing {
            id: id.to_string(),
            location: location.to_string(),
            rent_amount: rent,
            bedrooms,
            ..Listing::default()
        }
    }

    fn catalogue() -> Vec<Listing> {
        vec![
            listing("1", "Dhanmondi, Dhaka", 18_000.0, 2),
            listing("2", "Gulshan, Dhaka", 45_000.0, 3),
            listing("3", "Agrabad, Chattogram", 12_000.0, 1),
            listing("4", "Mirpur, Dhaka", 60_000.0, 4),
        ]
    }

    #[test]
    fn location_filter_is_case_insensitive() {
        let query = ListingQuery {
            location: Some("dhaka".into()),
            ..Default::default()
        };
        let ids: Vec<_> = filter_listings(&catalogue(), &query)
            .into_iter()
            .map(|l| l.id)
            .collect();
        // Mirpur is above the default price ceiling.
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let query = ListingQuery {
            min_price: Some(12_000.0),
            max_price: Some(18_000.0),
            ..Default::default()
        };
        assert_eq!(filter_listings(&catalogue(), &query).len(), 2);
    }

    #[test]
    fn bedrooms_any_and_exact() {
        let any = ListingQuery {
            bedrooms: Some("any".into()),
            max_price: Some(100_000.0),
            ..Default::default()
        };
        assert_eq!(filter_listings(&catalogue(), &any).len(), 4);

        let three = ListingQuery {
            bedrooms: Some("3".into()),
            ..Default::default()
        };
        let found = filter_listings(&catalogue(), &three);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "2");
    }

    #[test]
    fn short_strip_lists_every_page() {
        assert_eq!(page_numbers(1, 0), vec![]);
        assert_eq!(page_numbers(2, 3), vec![Page(1), Page(2), Page(3)]);
        assert_eq!(page_numbers(5, 5).len(), 5);
    }

    #[test]
    fn long_strip_windows_around_current_page() {
        assert_eq!(
            page_numbers(2, 10),
            vec![Page(1), Page(2), Page(3), Page(4), Ellipsis, Page(10)]
        );
        assert_eq!(
            page_numbers(9, 10),
            vec![Page(1), Ellipsis, Page(7), Page(8), Page(9), Page(10)]
        );
        assert_eq!(
            page_numbers(5, 10),
            vec![Page(1), Ellipsis, Page(4), Page(5), Page(6), Ellipsis, Page(10)]
        );
    }

    #[test]
    fn search_paginates_filtered_results() {
        let listings: Vec<_> = (1..=20)
            .map(|i| listing(&i.to_string(), "Uttara", 10_000.0, 2))
            .collect();
        let query = ListingQuery {
            page: Some(3),
            ..Default::default()
        };
        let page = search(&listings, &query);
        assert_eq!(page.total_items, 20);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 4);
        assert_eq!(page.items[0].id, "17");
    }

    #[test]
    fn page_past_the_end_is_empty_and_zero_per_page_uses_default() {
        let query = ListingQuery {
            page: Some(9),
            per_page: Some(0),
            max_price: Some(100_000.0),
            ..Default::default()
        };
        let page = search(&catalogue(), &query);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 9);
    }
}
