//! Record shapes exchanged with the search API and handed to the table.
//!
//! ## Observed shape of `/api/search` records
//!
//! ### `price`
//! Usually a currency-formatted string (`"$12.99"`). Absent or `null` when the
//! listing has no price. Older backends emitted a bare JSON number instead;
//! both are accepted and kept as text.
//!
//! ### `rating` / `number_of_reviews`
//! Numbers, but may be missing on new listings. Backends that went through a
//! dataframe sometimes send `number_of_reviews` as a float (`12.0`). Anything
//! that is not a usable number becomes `None` rather than failing the record.
//!
//! ### `asin`
//! The only field a record cannot do without. Decoding fails when it is
//! missing, which the derivation stage turns into a per-record rejection.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single search result as returned by `/api/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    /// Marketplace identifier, unique within one response.
    pub asin: String,

    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,

    /// Product page URL.
    #[serde(default, deserialize_with = "lenient::text")]
    pub link: String,

    /// Thumbnail URL.
    #[serde(default, deserialize_with = "lenient::text")]
    pub img: String,

    /// Currency-formatted price, e.g. `"$9.99"`. `None` means price unavailable.
    #[serde(default, deserialize_with = "lenient::price")]
    pub price: Option<String>,

    #[serde(default, deserialize_with = "lenient::rating")]
    pub rating: Option<f64>,

    #[serde(default, deserialize_with = "lenient::count")]
    pub number_of_reviews: Option<u64>,
}

/// A [`RawResult`] plus the presentation fields computed by the derivation stage.
///
/// Built once per fetch and never modified afterwards; fields are read
/// through accessors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayResult {
    #[serde(flatten)]
    raw: RawResult,
    rank: usize,
    price_value: Option<Decimal>,
}

impl DisplayResult {
    pub(crate) fn new(raw: RawResult, rank: usize, price_value: Option<Decimal>) -> Self {
        Self {
            raw,
            rank,
            price_value,
        }
    }

    #[must_use]
    pub fn raw(&self) -> &RawResult {
        &self.raw
    }

    /// 1-based position in the API's relevance order.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Parsed price, or `None` when the price is absent or unparsable.
    #[must_use]
    pub fn price_value(&self) -> Option<Decimal> {
        self.price_value
    }

    #[must_use]
    pub fn asin(&self) -> &str {
        &self.raw.asin
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.raw.description
    }
}

/// Opaque marketplace code passed through to the search API (`"CA"`, `"US"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionCode(String);

impl RegionCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RegionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for RegionCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// A selectable region: display label plus the code sent as `ctry`.
///
/// Serialized as `{"label": ..., "value": ...}`, which is also the persisted
/// preference format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub label: String,
    pub value: RegionCode,
}

impl Region {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: RegionCode::new(value),
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label, self.value)
    }
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub(super) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        })
    }

    pub(super) fn price<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    pub(super) fn rating<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|r| r.is_finite()))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub(super) fn count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            }),
            Some(Value::String(s)) => s.trim().replace(',', "").parse::<u64>().ok(),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn raw_result_decodes_full_record() {
        let raw: RawResult = serde_json::from_value(json!({
            "asin": "B000123",
            "description": "Widget",
            "link": "https://www.amazon.ca/dp/B000123",
            "img": "https://m.media-amazon.com/images/I/widget.jpg",
            "price": "$9.99",
            "rating": 4.5,
            "number_of_reviews": 1200
        }))
        .unwrap();

        assert_eq!(raw.asin, "B000123");
        assert_eq!(raw.price.as_deref(), Some("$9.99"));
        assert_eq!(raw.rating, Some(4.5));
        assert_eq!(raw.number_of_reviews, Some(1200));
    }

    #[test]
    fn raw_result_missing_optional_fields_default() {
        let raw: RawResult = serde_json::from_value(json!({ "asin": "B1" })).unwrap();
        assert_eq!(raw.description, "");
        assert!(raw.price.is_none());
        assert!(raw.rating.is_none());
        assert!(raw.number_of_reviews.is_none());
    }

    #[test]
    fn raw_result_null_fields_default() {
        let raw: RawResult = serde_json::from_value(json!({
            "asin": "B1",
            "description": null,
            "price": null,
            "rating": null,
            "number_of_reviews": null
        }))
        .unwrap();
        assert_eq!(raw.description, "");
        assert!(raw.price.is_none());
        assert!(raw.rating.is_none());
    }

    #[test]
    fn raw_result_numeric_price_kept_as_text() {
        let raw: RawResult =
            serde_json::from_value(json!({ "asin": "B1", "price": 12.5 })).unwrap();
        assert_eq!(raw.price.as_deref(), Some("12.5"));
    }

    #[test]
    fn raw_result_float_review_count_accepted() {
        let raw: RawResult =
            serde_json::from_value(json!({ "asin": "B1", "number_of_reviews": 31.0 })).unwrap();
        assert_eq!(raw.number_of_reviews, Some(31));
    }

    #[test]
    fn raw_result_garbage_numeric_fields_become_none() {
        let raw: RawResult = serde_json::from_value(json!({
            "asin": "B1",
            "rating": "n/a",
            "number_of_reviews": -3
        }))
        .unwrap();
        assert!(raw.rating.is_none());
        assert!(raw.number_of_reviews.is_none());
    }

    #[test]
    fn raw_result_requires_asin() {
        let result = serde_json::from_value::<RawResult>(json!({ "description": "no id" }));
        assert!(result.is_err());
    }

    #[test]
    fn region_serializes_as_label_value_pair() {
        let region = Region::new("🇨🇦 Canada", "CA");
        let value = serde_json::to_value(&region).unwrap();
        assert_eq!(value, json!({ "label": "🇨🇦 Canada", "value": "CA" }));
    }
}
