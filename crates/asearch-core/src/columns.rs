//! Declarative column definitions for the result table.
//!
//! Front ends iterate [`COLUMNS`] to lay out headers and cells; the
//! `sort_field` of a column is what a header click hands to
//! [`SortState::select`](crate::SortState::select). The item column also
//! carries the product page URL through [`Column::href`].

use crate::collection::FieldId;
use crate::types::DisplayResult;

/// Identity of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnId {
    /// Product thumbnail. Front ends that cannot draw images skip it.
    Img,
    Num,
    Item,
    Price,
    Rating,
    NumberOfReviews,
}

impl ColumnId {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnId::Img => "img",
            ColumnId::Num => "num",
            ColumnId::Item => "item",
            ColumnId::Price => "price",
            ColumnId::Rating => "rating",
            ColumnId::NumberOfReviews => "number_of_reviews",
        }
    }
}

impl std::fmt::Display for ColumnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub id: ColumnId,
    pub header: &'static str,
    pub sort_field: Option<FieldId>,
}

pub const COLUMNS: [Column; 6] = [
    Column {
        id: ColumnId::Img,
        header: "",
        sort_field: None,
    },
    Column {
        id: ColumnId::Num,
        header: "#",
        sort_field: Some(FieldId::Rank),
    },
    Column {
        id: ColumnId::Item,
        header: "Item",
        sort_field: Some(FieldId::Description),
    },
    Column {
        id: ColumnId::Price,
        header: "Price",
        sort_field: Some(FieldId::Price),
    },
    Column {
        id: ColumnId::Rating,
        header: "Rating",
        sort_field: Some(FieldId::Rating),
    },
    Column {
        id: ColumnId::NumberOfReviews,
        header: "Number of Reviews",
        sort_field: Some(FieldId::NumberOfReviews),
    },
];

impl Column {
    /// Cell text for `row`. The price cell shows the API's formatted string,
    /// not the parsed value; the image cell is the thumbnail URL. Missing
    /// values render as an em dash.
    #[must_use]
    pub fn cell(&self, row: &DisplayResult) -> String {
        let raw = row.raw();
        match self.id {
            ColumnId::Img => non_empty(&raw.img).map_or_else(missing, str::to_owned),
            ColumnId::Num => row.rank().to_string(),
            ColumnId::Item => raw.description.clone(),
            ColumnId::Price => raw.price.clone().unwrap_or_else(missing),
            ColumnId::Rating => raw.rating.map_or_else(missing, |r| r.to_string()),
            ColumnId::NumberOfReviews => raw.number_of_reviews.map_or_else(missing, |n| n.to_string()),
        }
    }

    /// Link target of the cell, if the cell is a link. Only the item column
    /// links anywhere: to the product page.
    #[must_use]
    pub fn href<'a>(&self, row: &'a DisplayResult) -> Option<&'a str> {
        match self.id {
            ColumnId::Item => non_empty(&row.raw().link),
            _ => None,
        }
    }

    /// True for the thumbnail column.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.id == ColumnId::Img
    }
}

fn non_empty(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn missing() -> String {
    "\u{2014}".to_owned()
}
