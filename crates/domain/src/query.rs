//! Listing helpers: pagination, ordering and text matching.

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

/// Sort direction; `-1`/`desc` or `1`/`asc` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse the wire representation; anything negative means descending.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            other => other
                .parse::<i64>()
                .ok()
                .map(|n| if n < 0 { Self::Desc } else { Self::Asc }),
        }
    }

    /// Apply this direction to an ascending comparison.
    #[must_use]
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// Which slice of a result set to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
    pub order: SortOrder,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
            order: SortOrder::Desc,
        }
    }
}

impl PageRequest {
    /// Build a request, clamping `page` to at least 1 and `limit` to `1..=100`.
    #[must_use]
    pub fn new(page: Option<u32>, limit: Option<u32>, order: Option<SortOrder>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            order: order.unwrap_or_default(),
        }
    }

    fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    /// Slice an already filtered and sorted result set.
    #[must_use]
    pub fn slice(items: Vec<T>, request: &PageRequest) -> Self {
        let total = items.len();
        let data = items
            .into_iter()
            .skip(request.offset())
            .take(request.limit as usize)
            .collect();
        Self {
            data,
            total,
            page: request.page,
            limit: request.limit,
        }
    }
}

/// Sort `items` by `compare` in the requested direction, then paginate.
pub fn paginate<T>(
    mut items: Vec<T>,
    request: &PageRequest,
    compare: impl Fn(&T, &T) -> Ordering,
) -> Page<T> {
    items.sort_by(|a, b| request.order.apply(compare(a, b)));
    Page::slice(items, request)
}

/// Compare optional floats, `None` sorting first.
#[must_use]
pub fn cmp_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Case-insensitive pattern used by `q`-style search filters.
#[derive(Debug, Clone)]
pub struct TextPattern(Regex);

impl TextPattern {
    /// Compile a user-supplied pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPattern`] naming `field` when the
    /// pattern does not compile.
    pub fn new(raw: &str, field: &'static str) -> Result<Self, ValidationError> {
        RegexBuilder::new(raw)
            .case_insensitive(true)
            .size_limit(1 << 20)
            .build()
            .map(Self)
            .map_err(|_| ValidationError::InvalidPattern(field))
    }

    /// Compile an optional pattern, blank meaning "no filter".
    ///
    /// # Errors
    ///
    /// See [`TextPattern::new`].
    pub fn optional(raw: Option<&str>, field: &'static str) -> Result<Option<Self>, ValidationError> {
        raw.map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Self::new(s, field))
            .transpose()
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    /// Whether any of `texts` matches.
    pub fn any<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> bool {
        texts.into_iter().any(|text| self.is_match(text))
    }
}

/// Case-insensitive equality used by exact filters (city, state, …).
#[must_use]
pub fn eq_ignore_case(expected: &str, actual: Option<&str>) -> bool {
    actual.is_some_and(|actual| actual.trim().to_lowercase() == expected.trim().to_lowercase())
}

/// Wire-level list parameters shared by every listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub order: Option<String>,
}

impl ListParams {
    #[must_use]
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page,
            self.limit,
            self.order.as_deref().and_then(SortOrder::parse),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_numeric_and_named_orders() {
        assert_eq!(SortOrder::parse("-1"), Some(SortOrder::Desc));
        assert_eq!(SortOrder::parse("1"), Some(SortOrder::Asc));
        assert_eq!(SortOrder::parse("ASC"), Some(SortOrder::Asc));
        assert_eq!(SortOrder::parse("sideways"), None);
    }

    #[test]
    fn should_clamp_page_and_limit() {
        let req = PageRequest::new(Some(0), Some(1000), None);
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 100);
        assert_eq!(req.order, SortOrder::Desc);
    }

    #[test]
    fn should_slice_requested_page_and_keep_total() {
        let req = PageRequest::new(Some(2), Some(2), Some(SortOrder::Asc));
        let page = paginate(vec![5, 1, 4, 2, 3], &req, Ord::cmp);
        assert_eq!(page.data, vec![3, 4]);
        assert_eq!(page.total, 5);
        assert_eq!(page.page, 2);
    }

    #[test]
    fn should_sort_descending_by_default() {
        let page = paginate(vec![1, 3, 2], &PageRequest::default(), Ord::cmp);
        assert_eq!(page.data, vec![3, 2, 1]);
    }

    #[test]
    fn should_return_empty_page_past_the_end() {
        let req = PageRequest::new(Some(9), Some(10), None);
        let page = Page::slice(vec![1, 2, 3], &req);
        assert!(page.data.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn should_match_case_insensitively() {
        let pattern = TextPattern::new("piano", "q").unwrap();
        assert!(pattern.is_match("Aulas de PIANO"));
        assert!(pattern.any(["violin", "Piano bar"]));
        assert!(!pattern.any(["violin", "drums"]));
    }

    #[test]
    fn should_reject_invalid_pattern() {
        let result = TextPattern::new("(unclosed", "q");
        assert_eq!(result.unwrap_err(), ValidationError::InvalidPattern("q"));
    }

    #[test]
    fn should_skip_blank_optional_pattern() {
        assert!(TextPattern::optional(Some("  "), "q").unwrap().is_none());
        assert!(TextPattern::optional(None, "q").unwrap().is_none());
    }

    #[test]
    fn should_compare_missing_numbers_first() {
        assert_eq!(cmp_f64(None, Some(1.0)), Ordering::Less);
        assert_eq!(cmp_f64(Some(2.0), Some(1.0)), Ordering::Greater);
    }

    #[test]
    fn should_compare_exact_filters_ignoring_case() {
        assert!(eq_ignore_case("são paulo", Some("São Paulo")));
        assert!(!eq_ignore_case("Rio", None));
    }
}
