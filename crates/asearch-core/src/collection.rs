//! Collection engine: the filtered, sorted and paginated view over a result set.
//!
//! The engine never reorders or copies the underlying records. A
//! [`Projection`] borrows from the result set it was computed over.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::types::DisplayResult;

/// A sortable column of the result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldId {
    #[default]
    Rank,
    Description,
    Price,
    Rating,
    NumberOfReviews,
}

impl FieldId {
    pub const ALL: [FieldId; 5] = [
        FieldId::Rank,
        FieldId::Description,
        FieldId::Price,
        FieldId::Rating,
        FieldId::NumberOfReviews,
    ];

    /// Canonical name accepted by [`FromStr`] and shown to users.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FieldId::Rank => "rank",
            FieldId::Description => "description",
            FieldId::Price => "price",
            FieldId::Rating => "rating",
            FieldId::NumberOfReviews => "reviews",
        }
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rank" | "num" | "#" => Ok(FieldId::Rank),
            "description" | "item" => Ok(FieldId::Description),
            "price" | "price_value" => Ok(FieldId::Price),
            "rating" => Ok(FieldId::Rating),
            "reviews" | "number_of_reviews" => Ok(FieldId::NumberOfReviews),
            other => Err(format!(
                "unknown sort field '{other}'; expected one of: rank, description, price, rating, reviews"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Current sort column and direction. Defaults to ascending by rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    pub field: FieldId,
    pub direction: SortDirection,
}

impl SortState {
    /// Applies a column selection the way a table header click does:
    /// re-selecting the current field flips the direction, a new field
    /// starts ascending.
    pub fn select(&mut self, field: FieldId) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field;
            self.direction = SortDirection::Ascending;
        }
    }
}

/// User-configured view settings: filter text, sort, and current page.
///
/// The loading flag lives with the fetch orchestrator, which owns the
/// result set this view is projected over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub filter_text: String,
    pub sort: SortState,
    pub page: PageRequest,
}

impl ViewState {
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            filter_text: String::new(),
            sort: SortState::default(),
            page: PageRequest::first(page_size),
        }
    }

    /// Projects `results` through this view's filter and sort, then cuts the
    /// requested page.
    #[must_use]
    pub fn render<'a>(&self, results: &'a [DisplayResult]) -> Page<'a> {
        let projection = project(
            results,
            &self.filter_text,
            self.sort.field,
            self.sort.direction,
        );
        paginate(projection, self.page)
    }
}

/// Filtered and sorted rows plus the number of rows that matched the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection<'a> {
    pub visible: Vec<&'a DisplayResult>,
    pub match_count: usize,
}

/// Filters `results` by `filter_text` and sorts the matches.
///
/// Filtering is a case-insensitive substring match on description, asin and
/// price text; an empty filter keeps everything. Numeric columns sort with
/// missing values last in either direction. Equal keys keep their input order.
#[must_use]
pub fn project<'a>(
    results: &'a [DisplayResult],
    filter_text: &str,
    sort_field: FieldId,
    sort_direction: SortDirection,
) -> Projection<'a> {
    let needle = filter_text.to_lowercase();

    let mut matched: Vec<(usize, &DisplayResult)> = results
        .iter()
        .enumerate()
        .filter(|(_, result)| needle.is_empty() || matches_filter(result, &needle))
        .collect();

    matched.sort_by(|(index_a, a), (index_b, b)| {
        compare_field(a, b, sort_field, sort_direction).then(index_a.cmp(index_b))
    });

    Projection {
        match_count: matched.len(),
        visible: matched.into_iter().map(|(_, result)| result).collect(),
    }
}

fn matches_filter(result: &DisplayResult, needle: &str) -> bool {
    let raw = result.raw();
    raw.description.to_lowercase().contains(needle)
        || raw.asin.to_lowercase().contains(needle)
        || raw
            .price
            .as_deref()
            .is_some_and(|price| price.to_lowercase().contains(needle))
}

fn compare_field(
    a: &DisplayResult,
    b: &DisplayResult,
    field: FieldId,
    direction: SortDirection,
) -> Ordering {
    match field {
        FieldId::Rank => directed(a.rank().cmp(&b.rank()), direction),
        FieldId::Description => directed(a.description().cmp(b.description()), direction),
        FieldId::Price => compare_present_first(a.price_value(), b.price_value(), direction, Ord::cmp),
        FieldId::Rating => {
            compare_present_first(a.raw().rating, b.raw().rating, direction, f64::total_cmp)
        }
        FieldId::NumberOfReviews => compare_present_first(
            a.raw().number_of_reviews,
            b.raw().number_of_reviews,
            direction,
            Ord::cmp,
        ),
    }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

/// Orders present values by `cmp` in `direction`; absent values always sort last.
fn compare_present_first<T>(
    a: Option<T>,
    b: Option<T>,
    direction: SortDirection,
    cmp: impl Fn(&T, &T) -> Ordering,
) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => directed(cmp(&x, &y), direction),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// A requested page: 1-based index and rows per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub index: usize,
    pub size: usize,
}

impl PageRequest {
    #[must_use]
    pub fn first(size: usize) -> Self {
        Self { index: 1, size }
    }
}

/// One page of a [`Projection`].
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    pub rows: Vec<&'a DisplayResult>,
    /// The page actually shown, after clamping to `1..=page_count`.
    pub index: usize,
    /// Always at least 1, even for an empty projection.
    pub page_count: usize,
    pub match_count: usize,
}

/// Cuts one page out of a projection.
///
/// A page size of 0 means "everything on one page". Page indexes past the
/// end clamp to the last page; index 0 is treated as the first page.
#[must_use]
pub fn paginate(projection: Projection<'_>, request: PageRequest) -> Page<'_> {
    let Projection {
        visible,
        match_count,
    } = projection;

    if request.size == 0 {
        return Page {
            rows: visible,
            index: 1,
            page_count: 1,
            match_count,
        };
    }

    let page_count = match_count.div_ceil(request.size).max(1);
    let index = request.index.clamp(1, page_count);
    let rows = visible
        .into_iter()
        .skip((index - 1) * request.size)
        .take(request.size)
        .collect();

    Page {
        rows,
        index,
        page_count,
        match_count,
    }
}

/// Count text shown next to the filter box: `"1 match"` / `"3 matches"`.
#[must_use]
pub fn match_count_label(count: usize) -> String {
    if count == 1 {
        "1 match".to_owned()
    } else {
        format!("{count} matches")
    }
}

#[cfg(test)]
#[path = "collection_test.rs"]
mod tests;
