#![warn(missing_docs, clippy::missing_docs_in_private_items)]

//! Shopping result normalization and ranking for [Pricewise](../pricewise/index.html).
//!
//! Upstream shopping results arrive as loosely typed records. This crate
//! defines an explicit schema for them ([`RawResult`]), and a single ranking
//! pass ([`rank`]) that turns them into clean, filtered [`RankedResult`]s
//! ordered by value for money.

mod domain;

pub use crate::domain::LenientNumber;

use crate::domain::lenient_text;

use serde::{Deserialize, Serialize};

/// A shopping result as reported by the upstream provider.
///
/// Every field is optional, and every field is parsed tolerantly. A malformed
/// title or price never causes the whole record (or response) to be rejected.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RawResult {
    /// The product title.
    #[serde(deserialize_with = "lenient_text")]
    pub title: Option<String>,

    /// The merchant selling the product.
    #[serde(deserialize_with = "lenient_text")]
    pub source: Option<String>,

    /// The numeric price, as extracted by the provider.
    pub extracted_price: LenientNumber,

    /// The product rating, usually between 0 and 5.
    pub rating: LenientNumber,

    /// A link to the product page.
    #[serde(deserialize_with = "lenient_text")]
    pub product_link: Option<String>,

    /// A link to a thumbnail image of the product.
    #[serde(deserialize_with = "lenient_text")]
    pub thumbnail: Option<String>,
}

/// A normalized shopping result that passed the request's filters.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RankedResult {
    /// The product title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The merchant selling the product.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// The price. Always greater than zero.
    pub price: f64,

    /// The rating.
    pub rating: f64,

    /// A link to the product page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// A link to a thumbnail image of the product.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    /// Rating per unit of price. Higher is better value.
    pub value_score: f64,
}

/// Bounds that a result must satisfy to be ranked.
///
/// Incoherent bounds, such as a `min_price` above `max_price`, are not an
/// error. They simply admit nothing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterCriteria {
    /// The lowest acceptable price, inclusive.
    pub min_price: f64,

    /// The highest acceptable price, inclusive.
    pub max_price: f64,

    /// The lowest acceptable rating, inclusive.
    pub min_rating: f64,
}

impl FilterCriteria {
    /// Criteria that only bound the price from above.
    #[must_use]
    pub fn with_max_price(max_price: f64) -> Self {
        Self {
            min_price: 0.0,
            max_price,
            min_rating: 0.0,
        }
    }

    /// Whether a result with this price and rating should be kept.
    ///
    /// Free (or negatively priced) items are never admitted, since they have
    /// no meaningful value score.
    #[must_use]
    pub fn admits(&self, price: f64, rating: f64) -> bool {
        price > 0.0
            && price >= self.min_price
            && price <= self.max_price
            && rating >= self.min_rating
    }
}

/// Normalize, filter, and rank raw shopping results.
///
/// Results whose price or rating can't be read are treated as having a value
/// of zero. A zero price always excludes the result. The output is ordered by
/// [`RankedResult::value_score`], highest first. Results with equal scores
/// currently keep their upstream order, but callers should not depend on it.
pub fn rank<I>(raw_results: I, criteria: &FilterCriteria) -> Vec<RankedResult>
where
    I: IntoIterator<Item = RawResult>,
{
    let mut ranked: Vec<RankedResult> = raw_results
        .into_iter()
        .filter_map(|raw| {
            let price = raw.extracted_price.value();
            let rating = raw.rating.value();
            criteria.admits(price, rating).then(|| RankedResult {
                name: raw.title,
                source: raw.source,
                price,
                rating,
                link: raw.product_link,
                thumbnail: raw.thumbnail,
                value_score: rating / price,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.value_score.total_cmp(&a.value_score));
    ranked
}

#[cfg(test)]
mod tests {
    use super::{rank, FilterCriteria, LenientNumber, RankedResult, RawResult};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn raw_results(value: serde_json::Value) -> Vec<RawResult> {
        serde_json::from_value(value).expect("raw results should always deserialize")
    }

    fn names(results: &[RankedResult]) -> Vec<&str> {
        results
            .iter()
            .map(|r| r.name.as_deref().unwrap_or_default())
            .collect()
    }

    #[test]
    fn ranks_by_value_for_money() {
        let raw = raw_results(json!([
            { "title": "A", "extracted_price": "10", "rating": "4" },
            { "title": "B", "extracted_price": "20", "rating": "5" },
        ]));

        let ranked = rank(raw, &FilterCriteria::with_max_price(100.0));

        assert_eq!(names(&ranked), vec!["A", "B"]);
        assert_eq!(ranked[0].value_score, 0.4);
        assert_eq!(ranked[1].value_score, 0.25);
    }

    #[test]
    fn copies_fields_from_the_raw_result() {
        let raw = raw_results(json!([{
            "title": "USB cable",
            "source": "Example Store",
            "extracted_price": 250,
            "rating": 4.5,
            "product_link": "https://example.com/cable",
            "thumbnail": "https://example.com/cable.png",
            "delivery": "Free delivery",
        }]));

        let ranked = rank(raw, &FilterCriteria::with_max_price(1000.0));

        assert_eq!(
            ranked,
            vec![RankedResult {
                name: Some("USB cable".to_string()),
                source: Some("Example Store".to_string()),
                price: 250.0,
                rating: 4.5,
                link: Some("https://example.com/cable".to_string()),
                thumbnail: Some("https://example.com/cable.png".to_string()),
                value_score: 4.5 / 250.0,
            }]
        );
    }

    #[test]
    fn missing_or_malformed_prices_are_excluded() {
        let raw = raw_results(json!([
            { "title": "no price", "rating": 5 },
            { "title": "bad price", "extracted_price": "call for price", "rating": 5 },
            { "title": "null price", "extracted_price": null, "rating": 5 },
            { "title": "free", "extracted_price": 0, "rating": 5 },
            { "title": "ok", "extracted_price": 10, "rating": 1 },
        ]));

        let ranked = rank(raw, &FilterCriteria::with_max_price(100.0));

        assert_eq!(names(&ranked), vec!["ok"]);
    }

    #[test]
    fn malformed_ratings_are_zero() {
        let raw = raw_results(json!([
            { "title": "unrated", "extracted_price": 10 },
            { "title": "rated", "extracted_price": 10, "rating": "3.5" },
        ]));

        let everything = rank(raw.clone(), &FilterCriteria::with_max_price(100.0));
        assert_eq!(names(&everything), vec!["rated", "unrated"]);
        assert_eq!(everything[1].rating, 0.0);
        assert_eq!(everything[1].value_score, 0.0);

        let criteria = FilterCriteria {
            min_rating: 1.0,
            ..FilterCriteria::with_max_price(100.0)
        };
        assert_eq!(names(&rank(raw, &criteria)), vec!["rated"]);
    }

    #[test]
    fn non_string_text_fields_do_not_reject_the_batch() {
        let raw = raw_results(json!([
            { "title": 7, "source": false, "extracted_price": 10, "rating": 4 },
            { "title": "B", "product_link": { "href": "x" }, "thumbnail": null,
              "extracted_price": 20, "rating": 5 },
        ]));

        let ranked = rank(raw, &FilterCriteria::with_max_price(100.0));

        assert_eq!(names(&ranked), vec!["7", "B"]);
        assert_eq!(ranked[0].source.as_deref(), Some("false"));
        assert_eq!(ranked[1].link, None);
        assert_eq!(ranked[1].thumbnail, None);
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let raw = raw_results(json!([
            { "title": "too cheap", "extracted_price": 9.99, "rating": 5 },
            { "title": "low", "extracted_price": 10, "rating": 4 },
            { "title": "high", "extracted_price": 50, "rating": 4 },
            { "title": "too expensive", "extracted_price": 50.01, "rating": 5 },
        ]));
        let criteria = FilterCriteria {
            min_price: 10.0,
            max_price: 50.0,
            min_rating: 0.0,
        };

        assert_eq!(names(&rank(raw, &criteria)), vec!["low", "high"]);
    }

    #[test]
    fn min_rating_above_every_candidate_gives_nothing() {
        let raw = raw_results(json!([
            { "title": "A", "extracted_price": 10, "rating": 4.9 },
            { "title": "B", "extracted_price": 20, "rating": 5 },
        ]));
        let criteria = FilterCriteria {
            min_rating: 5.1,
            ..FilterCriteria::with_max_price(100.0)
        };

        assert_eq!(rank(raw, &criteria), vec![]);
    }

    #[test]
    fn incoherent_bounds_give_nothing() {
        let raw = raw_results(json!([{ "title": "A", "extracted_price": 10, "rating": 4 }]));
        let criteria = FilterCriteria {
            min_price: 20.0,
            max_price: 5.0,
            min_rating: 0.0,
        };

        assert_eq!(rank(raw, &criteria), vec![]);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert_eq!(rank(vec![], &FilterCriteria::with_max_price(100.0)), vec![]);
    }

    #[test]
    fn absent_strings_are_not_serialized() {
        let ranked = rank(
            raw_results(json!([{ "extracted_price": 2, "rating": 1 }])),
            &FilterCriteria::with_max_price(100.0),
        );

        assert_eq!(
            serde_json::to_value(&ranked).expect("ranked results serialize"),
            json!([{ "price": 2.0, "rating": 1.0, "value_score": 0.5 }])
        );
    }

    fn arb_raw_result() -> impl Strategy<Value = RawResult> {
        (
            prop_oneof![Just(0.0), -10.0..1000.0_f64],
            0.0..5.0_f64,
            "[a-z]{1,8}",
        )
            .prop_map(|(price, rating, title)| RawResult {
                title: Some(title),
                extracted_price: LenientNumber::from(price),
                rating: LenientNumber::from(rating),
                ..RawResult::default()
            })
    }

    fn arb_criteria() -> impl Strategy<Value = FilterCriteria> {
        (0.0..500.0_f64, 0.0..1000.0_f64, 0.0..5.0_f64).prop_map(
            |(min_price, max_price, min_rating)| FilterCriteria {
                min_price,
                max_price,
                min_rating,
            },
        )
    }

    proptest! {
        #[test]
        fn every_result_satisfies_the_criteria(
            raw in prop::collection::vec(arb_raw_result(), 0..50),
            criteria in arb_criteria(),
        ) {
            for result in rank(raw, &criteria) {
                prop_assert!(result.price > 0.0);
                prop_assert!(result.price >= criteria.min_price);
                prop_assert!(result.price <= criteria.max_price);
                prop_assert!(result.rating >= criteria.min_rating);
                prop_assert_eq!(result.value_score, result.rating / result.price);
            }
        }

        #[test]
        fn results_are_ordered_by_descending_value(
            raw in prop::collection::vec(arb_raw_result(), 0..50),
            criteria in arb_criteria(),
        ) {
            let ranked = rank(raw, &criteria);
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].value_score >= pair[1].value_score);
            }
        }

        #[test]
        fn ranking_is_repeatable(
            raw in prop::collection::vec(arb_raw_result(), 0..50),
            criteria in arb_criteria(),
        ) {
            prop_assert_eq!(rank(raw.clone(), &criteria), rank(raw, &criteria));
        }
    }
}
