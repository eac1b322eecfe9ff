//! Derivation stage: turns raw API records into [`DisplayResult`]s.
//!
//! Derivation is a pure transform. Every output record is complete when it
//! is created; nothing downstream ever observes a half-derived record.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::types::{DisplayResult, RawResult};

/// Output of [`derive_values`]: the usable records plus the ones that were dropped.
#[derive(Debug, Default)]
pub struct Derived {
    pub results: Vec<DisplayResult>,
    pub rejected: Vec<RejectedRecord>,
}

/// A record that could not be turned into a [`DisplayResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    /// 1-based position of the record in the API response.
    pub position: usize,
    pub reason: String,
}

/// Derives display records from already-decoded raw records.
///
/// `rank` is the 1-based input position, so the API's relevance order
/// survives any later re-sorting of the table.
#[must_use]
pub fn derive(raw: &[RawResult]) -> Vec<DisplayResult> {
    raw.iter()
        .enumerate()
        .map(|(index, record)| derive_one(index + 1, record.clone()))
        .collect()
}

/// Decodes and derives a JSON batch one record at a time.
///
/// A record without a usable `asin` is rejected on its own; the rest of the
/// batch is still derived. Surviving records keep their original position as
/// `rank`, so a rejection leaves a gap rather than shifting later ranks.
#[must_use]
pub fn derive_values(values: Vec<Value>) -> Derived {
    let mut derived = Derived::default();

    for (index, value) in values.into_iter().enumerate() {
        let position = index + 1;
        match serde_json::from_value::<RawResult>(value) {
            Ok(raw) if raw.asin.trim().is_empty() => {
                derived.rejected.push(RejectedRecord {
                    position,
                    reason: "empty asin".to_owned(),
                });
            }
            Ok(raw) => derived.results.push(derive_one(position, raw)),
            Err(e) => derived.rejected.push(RejectedRecord {
                position,
                reason: e.to_string(),
            }),
        }
    }

    for rejected in &derived.rejected {
        tracing::warn!(
            position = rejected.position,
            reason = %rejected.reason,
            "skipping malformed search result"
        );
    }

    derived
}

fn derive_one(rank: usize, raw: RawResult) -> DisplayResult {
    let price_value = raw.price.as_deref().and_then(parse_price);
    DisplayResult::new(raw, rank, price_value)
}

/// Parses a currency-formatted price such as `"$12.34"` or `"€1,299.00"`.
///
/// A single leading currency symbol is stripped. `,` is accepted only as a
/// thousands separator between three-digit groups of the integer part. Returns `None` for anything that is not a plain decimal after
/// that, so an unknown price is never confused with a price of zero.
#[must_use]
pub fn parse_price(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    let mut chars = trimmed.chars();
    let amount = match chars.next() {
        Some(c) if is_currency_symbol(c) => chars.as_str().trim_start(),
        Some(_) => trimmed,
        None => return None,
    };

    if amount.is_empty()
        || !amount
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
    {
        return None;
    }

    if amount.contains(',') && !grouped_correctly(amount) {
        return None;
    }

    let digits: String = amount.chars().filter(|&c| c != ',').collect();
    Decimal::from_str(&digits).ok()
}

/// `,` may only separate groups of three digits in the integer part:
/// `1,299.99` and `12,345,678` pass, `,5`, `1,,2` and `12,34` do not.
fn grouped_correctly(amount: &str) -> bool {
    let unsigned = amount.strip_prefix('-').unwrap_or(amount);
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if fraction.contains(',') {
        return false;
    }

    let mut groups = integer.split(',');
    let leading_ok = groups
        .next()
        .is_some_and(|g| (1..=3).contains(&g.len()) && g.bytes().all(|b| b.is_ascii_digit()));
    leading_ok && groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

fn is_currency_symbol(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace() && !matches!(c, '.' | ',' | '-' | '+')
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw(asin: &str, price: Option<&str>) -> RawResult {
        RawResult {
            asin: asin.to_owned(),
            description: format!("item {asin}"),
            link: String::new(),
            img: String::new(),
            price: price.map(str::to_owned),
            rating: None,
            number_of_reviews: None,
        }
    }

    #[test]
    fn derive_assigns_ranks_in_input_order() {
        let input = vec![raw("C", None), raw("A", None), raw("B", None)];
        let derived = derive(&input);

        assert_eq!(derived.len(), 3);
        let ranks: Vec<usize> = derived.iter().map(DisplayResult::rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        let asins: Vec<&str> = derived.iter().map(DisplayResult::asin).collect();
        assert_eq!(asins, vec!["C", "A", "B"]);
    }

    #[test]
    fn derive_empty_input_is_empty() {
        assert!(derive(&[]).is_empty());
    }

    #[test]
    fn derive_parses_price_value() {
        let derived = derive(&[raw("X1", Some("$9.99"))]);
        assert_eq!(derived[0].price_value(), Some(Decimal::new(999, 2)));
    }

    #[test]
    fn derive_absent_price_is_none_not_zero() {
        let derived = derive(&[raw("X1", None)]);
        assert_eq!(derived[0].price_value(), None);
    }

    #[test]
    fn parse_price_dollar_amount() {
        assert_eq!(parse_price("$12.34"), Some(Decimal::new(1234, 2)));
    }

    #[test]
    fn parse_price_zero_is_a_real_price() {
        assert_eq!(parse_price("$0.00"), Some(Decimal::ZERO));
    }

    #[test]
    fn parse_price_without_symbol() {
        assert_eq!(parse_price("12.5"), Some(Decimal::new(125, 1)));
    }

    #[test]
    fn parse_price_other_currency_symbols() {
        assert_eq!(parse_price("€3.50"), Some(Decimal::new(350, 2)));
        assert_eq!(parse_price("£ 10"), Some(Decimal::new(10, 0)));
    }

    #[test]
    fn parse_price_thousands_separator() {
        assert_eq!(parse_price("$1,299.99"), Some(Decimal::new(129_999, 2)));
    }

    #[test]
    fn parse_price_large_grouped_amount() {
        assert_eq!(parse_price("$12,345,678"), Some(Decimal::new(12_345_678, 0)));
        assert_eq!(parse_price("-1,000.5"), Some(Decimal::new(-10_005, 1)));
    }

    #[test]
    fn parse_price_misplaced_commas_are_none() {
        for text in ["$,5", "$1,,,", "$12,34", "1,2345", "$1,000,", "$1.2,50", "$,"] {
            assert_eq!(parse_price(text), None, "{text:?} should not parse");
        }
    }

    #[test]
    fn parse_price_malformed_is_none() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("$"), None);
        assert_eq!(parse_price("free"), None);
        assert_eq!(parse_price("$$5"), None);
        assert_eq!(parse_price("$NaN"), None);
        assert_eq!(parse_price("$inf"), None);
        assert_eq!(parse_price("$1.2.3"), None);
        assert_eq!(parse_price("CDN$ 5.00"), None);
    }

    #[test]
    fn derive_values_matches_concrete_scenario() {
        let derived = derive_values(vec![json!({
            "asin": "X1",
            "description": "Widget",
            "price": "$9.99",
            "rating": 4,
            "number_of_reviews": 10
        })]);

        assert!(derived.rejected.is_empty());
        assert_eq!(derived.results.len(), 1);
        let result = &derived.results[0];
        assert_eq!(result.rank(), 1);
        assert_eq!(result.price_value(), Some(Decimal::new(999, 2)));
        assert_eq!(result.raw().rating, Some(4.0));
        assert_eq!(result.raw().number_of_reviews, Some(10));
    }

    #[test]
    fn derive_values_rejects_only_the_record_without_asin() {
        let derived = derive_values(vec![
            json!({ "asin": "A", "description": "first" }),
            json!({ "description": "missing id" }),
            json!({ "asin": "", "description": "blank id" }),
            json!({ "asin": "D", "description": "fourth" }),
        ]);

        let asins: Vec<&str> = derived.results.iter().map(DisplayResult::asin).collect();
        assert_eq!(asins, vec!["A", "D"]);
        let ranks: Vec<usize> = derived.results.iter().map(DisplayResult::rank).collect();
        assert_eq!(ranks, vec![1, 4], "ranks keep the original API position");

        let positions: Vec<usize> = derived.rejected.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![2, 3]);
    }

    #[test]
    fn derive_values_non_object_entries_are_rejected() {
        let derived = derive_values(vec![json!("oops"), json!({ "asin": "B" })]);
        assert_eq!(derived.results.len(), 1);
        assert_eq!(derived.results[0].rank(), 2);
        assert_eq!(derived.rejected.len(), 1);
    }
}
